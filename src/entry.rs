//! Remote listing entries and the naming rules shared by browsing and sync.

use serde::{Deserialize, Serialize};

/// Suffix of the synthetic marker files the backend uses to keep empty
/// folders visible. They are never shown, traversed or downloaded.
pub const SENTINEL_SUFFIX: &str = ".init";

/// One item of a listing response.
///
/// Names are full remote keys (`math/algebra/intro.pdf`). A trailing `/`
/// marks a folder; only files carry a download `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Entry {
    /// Creates a folder entry. A missing trailing slash is not added.
    #[must_use]
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    /// Creates a file entry with its download URL.
    #[must_use]
    pub fn file(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.name.ends_with('/')
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.name.ends_with(SENTINEL_SUFFIX)
    }

    /// Label relative to the browsed `prefix`: folders lose their slashes,
    /// files keep any nested path below the prefix.
    #[must_use]
    pub fn label(&self, prefix: &str) -> String {
        let relative = self.name.strip_prefix(prefix).unwrap_or(&self.name);
        if self.is_folder() {
            relative.trim_matches('/').to_string()
        } else {
            relative.to_string()
        }
    }
}

/// Entries shown or walked below `prefix`: sentinels are dropped, and so is
/// a folder entry echoing `prefix` itself.
#[must_use]
pub fn children_of(entries: Vec<Entry>, prefix: &str) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(|e| !e.is_sentinel() && !(e.is_folder() && e.name == prefix))
        .collect()
}

/// Folder prefixes of a root listing, in server order.
#[must_use]
pub fn root_folders(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.is_folder() && !e.is_sentinel())
        .map(|e| e.name.clone())
        .collect()
}

/// Parent of a folder prefix: `a/b/` -> `a/`, `a/` -> `` (root).
#[must_use]
pub fn parent_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, _)) => format!("{parent}/"),
        None => String::new(),
    }
}
