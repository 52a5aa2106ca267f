//! Error handling for Padboard
//!
//! Manager layers never let these escape to the UI; they are converted to
//! status messages at the boundary. The store and the CLI propagate them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Padboard operations
pub type Result<T> = std::result::Result<T, PadboardError>;

/// Main error type for Padboard operations
#[derive(Error, Debug)]
pub enum PadboardError {
    // Preset Errors
    #[error("Preset not found: {id}")]
    PresetNotFound { id: String },

    #[error("Invalid preset name: {name:?}")]
    InvalidPresetName { name: String },

    #[error("Preset id already exists: {id}")]
    DuplicatePresetId { id: String },

    #[error("Invalid layout customization: {reason}")]
    InvalidCustomization { reason: String },

    // Wire Format Errors
    #[error("Unsupported preset format: {format} v{version}")]
    UnsupportedPresetFormat { format: String, version: u32 },

    #[error("Preset checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    // Storage Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory creation failed: {path}: {source}")]
    DirectoryCreateError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Preference store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PadboardError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            PadboardError::PresetNotFound { .. } => "PRESET_NOT_FOUND",
            PadboardError::InvalidPresetName { .. } => "INVALID_PRESET_NAME",
            PadboardError::DuplicatePresetId { .. } => "DUPLICATE_PRESET_ID",
            PadboardError::InvalidCustomization { .. } => "INVALID_CUSTOMIZATION",
            PadboardError::UnsupportedPresetFormat { .. } => "UNSUPPORTED_PRESET_FORMAT",
            PadboardError::ChecksumMismatch { .. } => "CHECKSUM_MISMATCH",
            PadboardError::FileReadError { .. } => "FILE_READ_ERROR",
            PadboardError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            PadboardError::DirectoryCreateError { .. } => "DIRECTORY_CREATE_ERROR",
            PadboardError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            PadboardError::Io(_) => "IO_ERROR",
            PadboardError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Returns true if retrying the same operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PadboardError::FileWriteError { .. }
                | PadboardError::DirectoryCreateError { .. }
                | PadboardError::StoreUnavailable { .. }
                | PadboardError::Io(_)
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            PadboardError::PresetNotFound { .. } => {
                Some("The preset may have been deleted. Refresh the preset list.")
            }
            PadboardError::InvalidPresetName { .. } => Some("Give the preset a non-empty name."),
            PadboardError::ChecksumMismatch { .. } => {
                Some("The exported text was modified or truncated. Export it again.")
            }
            PadboardError::UnsupportedPresetFormat { .. } => {
                Some("This preset was exported by a newer version of Padboard.")
            }
            PadboardError::FileWriteError { .. } | PadboardError::DirectoryCreateError { .. } => {
                Some("Check that the preference directory is writable.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = PadboardError::PresetNotFound {
            id: "preset_1".to_string(),
        };
        assert_eq!(err.error_code(), "PRESET_NOT_FOUND");
        assert_eq!(err.to_string(), "Preset not found: preset_1");
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = PadboardError::ChecksumMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert!(err.recovery_suggestion().is_some());
        assert!(!err.is_recoverable());

        let err = PadboardError::StoreUnavailable {
            reason: "locked".to_string(),
        };
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: PadboardError = json_err.into();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
