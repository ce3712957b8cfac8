//! Error types for the importer
//!
//! Skipped rows are not errors and never show up here.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while importing a CSV file
#[derive(Error, Debug)]
pub enum ImportError {
    /// The source file could not be opened or read
    #[error("Failed to read {path}: {source}")]
    InputAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was readable but its content is not decodable CSV
    #[error("Malformed CSV in {path}: {source}")]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The store rejected a lookup or a bulk insert
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// The import was committed but the source file could not be removed
    #[error("Failed to remove {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImportError {
    /// True when the caller supplied bad input (as opposed to a store failure)
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InputAccess { .. } | Self::MalformedInput { .. })
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_access_display() {
        let err = ImportError::InputAccess {
            path: PathBuf::from("missing.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "Failed to read missing.csv: not found");
        assert!(err.is_input_error());
    }

    #[test]
    fn test_persistence_from_rusqlite() {
        let err: ImportError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, ImportError::Persistence(_)));
        assert!(!err.is_input_error());
    }
}
