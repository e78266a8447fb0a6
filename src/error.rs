//! Error types for the edu-offline library.

use thiserror::Error;

/// Errors that can occur while listing, syncing or maintaining the mirror.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request error (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status code.
    #[error("{url} answered {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The selection file exists but is not a JSON array of strings.
    #[error("Selection file is malformed: {0}")]
    Selection(#[from] serde_json::Error),

    /// Configuration could not be read or written.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote name that would resolve outside the mirror root.
    #[error("Refusing unsafe remote path: {name}")]
    UnsafePath {
        /// Remote entry name as returned by the listing.
        name: String,
    },

    /// A remote name ending in the suffix reserved for in-flight downloads.
    #[error("Remote name uses the reserved {suffix} suffix: {name}")]
    ReservedName {
        /// Remote entry name as returned by the listing.
        name: String,
        /// The reserved suffix.
        suffix: &'static str,
    },
}

/// A specialized `Result` type for edu-offline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_url_and_code() {
        let err = Error::Status {
            url: "http://host/api/files".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "http://host/api/files answered 503");
    }

    #[test]
    fn selection_error_wraps_json_error() {
        let json_err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::Selection(_)));
        assert!(err.to_string().starts_with("Selection file is malformed"));
    }
}
