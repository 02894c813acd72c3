//! Unified error types for growtrack.
//!
//! Mutations propagate errors to the caller. Read paths that feed display
//! (config loading, scan history, catalog files) may instead log a warning
//! and fall back to a safe default through [`FailOpen`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for growtrack operations.
#[derive(Error, Debug)]
pub enum GrowError {
    /// I/O errors from journal or history file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// A record addressed by id does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A record with the same id already exists.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// Caller supplied an unusable value.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Lifecycle transition not allowed from the plant's current phase.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Model loading, preprocessing or classifier errors.
    #[error("inference error: {message}")]
    Inference { message: String },
}

/// A specialized Result type for growtrack operations.
pub type Result<T> = std::result::Result<T, GrowError>;

impl GrowError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a not-found error for the given record kind.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a duplicate id error for the given record kind.
    pub fn duplicate(kind: &'static str, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind,
            id: id.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an inference error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    /// Whether the error means the addressed record is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<io::Error> for GrowError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for GrowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Recover from a failed read by logging it and substituting a value.
///
/// Used where a damaged optional file (a catalog override, a manifest)
/// should not stop the journal from opening.
pub trait FailOpen<T> {
    /// The value on success, `T::default()` on error.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// The value on success, `fallback` on error.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        self.unwrap_or_else(|err| {
            tracing::warn!(context, error = %err, "continuing with defaults");
            T::default()
        })
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        self.unwrap_or_else(|err| {
            tracing::warn!(context, error = %err, "continuing with fallback");
            fallback
        })
    }
}

/// Exit codes for the growtrack CLI.
pub mod exit_codes {
    /// Command succeeded.
    pub const OK: i32 = 0;

    /// Command ran but reported a failure (unknown id, invalid input).
    pub const ERROR: i32 = 1;

    /// Process panicked.
    pub const CRASH: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = GrowError::storage(
            "/tmp/plants/abc.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/plants/abc.json"));
    }

    #[test]
    fn test_not_found_display() {
        let err = GrowError::not_found("plant", "p-1");
        assert_eq!(err.to_string(), "plant not found: p-1");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_duplicate_display() {
        let err = GrowError::duplicate("growbox", "box-1");
        assert_eq!(err.to_string(), "duplicate growbox id: box-1");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_invalid_input_display() {
        let err = GrowError::invalid_input("power level must be 0-100");
        assert_eq!(
            err.to_string(),
            "invalid input: power level must be 0-100"
        );
    }

    #[test]
    fn test_invalid_state_display() {
        let err = GrowError::invalid_state("plant is not harvested");
        assert_eq!(err.to_string(), "invalid state: plant is not harvested");
    }

    #[test]
    fn test_config_and_inference_display() {
        assert_eq!(
            GrowError::config("invalid TOML").to_string(),
            "config error: invalid TOML"
        );
        assert_eq!(
            GrowError::inference("no labels").to_string(),
            "inference error: no labels"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: GrowError = io_err.into();
        assert!(matches!(err, GrowError::Storage { .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: GrowError = json_err.into();
        assert!(matches!(err, GrowError::Serde { .. }));
    }

    #[test]
    fn test_fail_open_default() {
        let result: Result<Vec<String>> = Err(GrowError::serde("test"));
        assert!(result.fail_open_default("test context").is_empty());
    }

    #[test]
    fn test_fail_open_with() {
        let result: Result<i32> = Err(GrowError::inference("test"));
        assert_eq!(result.fail_open_with("test context", 42), 42);
    }

    #[test]
    fn test_fail_open_success() {
        let result: Result<i32> = Ok(100);
        assert_eq!(result.fail_open_default("test context"), 100);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::OK, 0);
        assert_eq!(exit_codes::ERROR, 1);
        assert_eq!(exit_codes::CRASH, 3);
    }
}
