//! The on-disk mirror: remote name mapping and maintenance.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Suffix of in-flight download files. Remote names ending in it are
/// refused, so a temp file never shares a path with a mirrored file.
pub const PART_SUFFIX: &str = ".edu-part";

/// Returns true for file names carrying [`PART_SUFFIX`].
#[must_use]
pub fn is_part_file(name: &OsStr) -> bool {
    name.to_string_lossy().ends_with(PART_SUFFIX)
}

/// Whether a remote file can be handed to the OS for opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// The local copy exists and is non-empty.
    Ready(PathBuf),
    /// No local copy yet, or an empty one.
    NotYet(PathBuf),
}

/// Local directory tree mirroring the selected remote folders.
#[derive(Debug, Clone)]
pub struct LocalMirror {
    root: PathBuf,
}

impl LocalMirror {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the mirror root if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Maps a remote name (`a/b/c.pdf` or `a/b/`) to its local path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsafePath`] if a segment would climb out of the
    /// root or carries a drive/root prefix, and [`Error::ReservedName`] if a
    /// segment ends in [`PART_SUFFIX`].
    pub fn local_path(&self, remote_name: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in remote_name.split('/').filter(|s| !s.is_empty()) {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(part)), None) if is_part_file(part) => {
                    return Err(Error::ReservedName {
                        name: remote_name.to_string(),
                        suffix: PART_SUFFIX,
                    });
                }
                (Some(Component::Normal(part)), None) => path.push(part),
                (Some(Component::CurDir), None) => {}
                _ => {
                    return Err(Error::UnsafePath {
                        name: remote_name.to_string(),
                    });
                }
            }
        }
        Ok(path)
    }

    /// Returns true if at least one finished download exists anywhere below
    /// the root. Directories and leftover temp files do not count.
    #[must_use]
    pub fn has_downloads(&self) -> bool {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .any(|entry| entry.file_type().is_file() && !is_part_file(entry.file_name()))
    }

    /// Deletes the whole mirror and recreates an empty root.
    ///
    /// The selection is left alone, so the next pass downloads every
    /// selected folder again.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be removed or the root recreated.
    pub fn clear_downloads(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.root) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        std::fs::create_dir_all(&self.root)?;
        log::info!("Cleared local mirror at {}", self.root.display());
        Ok(())
    }

    /// Resolves a remote file for opening. Zero-length copies count as not
    /// yet available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsafePath`] for names that escape the root.
    pub fn availability(&self, remote_name: &str) -> Result<Availability> {
        let path = self.local_path(remote_name)?;
        let ready = std::fs::metadata(&path).is_ok_and(|m| m.is_file() && m.len() > 0);
        Ok(if ready {
            Availability::Ready(path)
        } else {
            Availability::NotYet(path)
        })
    }
}
