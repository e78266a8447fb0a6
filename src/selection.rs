//! Persistence of the folder prefixes selected for offline sync.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// JSON file holding the selected prefixes as a plain array of strings.
///
/// Membership is exact string equality; prefixes are stored verbatim.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the selection. A missing file is an empty selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of
    /// strings.
    pub fn load(&self) -> Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrites the selection (write tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, selection: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_string(selection)?)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Adds or removes `folder` and persists the result, which is returned.
    ///
    /// # Errors
    ///
    /// Propagates [`load`](Self::load) and [`save`](Self::save) errors.
    pub fn toggle(&self, folder: &str, selected: bool) -> Result<Vec<String>> {
        let mut selection = self.load()?;
        if selected {
            if !selection.iter().any(|s| s == folder) {
                selection.push(folder.to_string());
            }
        } else {
            selection.retain(|s| s != folder);
        }
        self.save(&selection)?;
        log::info!(
            "{} '{folder}' ({} folder(s) selected)",
            if selected { "Selected" } else { "Unselected" },
            selection.len()
        );
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::TempDir;

    fn store() -> (TempDir, SelectionStore) {
        let dir = TempDir::new().unwrap();
        let store = SelectionStore::new(dir.path().join("selected.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_is_empty_selection() {
        let (_dir, store) = store();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store) = store();
        store.save(&["x/".to_string()]).unwrap();
        assert_eq!(store.load().unwrap(), vec!["x/".to_string()]);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), r#"["x/"]"#);
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = SelectionStore::new(dir.path().join("a/b/selected.json"));
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let (_dir, store) = store();
        std::fs::write(store.path(), r#"{"math/": true}"#).unwrap();
        assert!(matches!(store.load(), Err(Error::Selection(_))));
    }

    #[test]
    fn toggle_adds_once_and_removes() {
        let (_dir, store) = store();
        store.toggle("math/", true).unwrap();
        store.toggle("science/", true).unwrap();
        let selection = store.toggle("math/", true).unwrap();
        assert_eq!(selection, vec!["math/", "science/"]);

        let selection = store.toggle("math/", false).unwrap();
        assert_eq!(selection, vec!["science/"]);
        assert_eq!(store.load().unwrap(), vec!["science/"]);
    }

    #[test]
    fn membership_is_exact_string_match() {
        let (_dir, store) = store();
        store.toggle("math/", true).unwrap();
        let selection = store.toggle("math", true).unwrap();
        assert_eq!(selection, vec!["math/", "math"]);
    }
}
