//! Error taxonomy for the migration engine
//!
//! Two tiers: [`MigrateError`] is fatal and aborts before any file is touched;
//! [`TransformError`] is per-file, recorded as a warning, and never aborts a run.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal migration errors
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Unsupported version: {0}")]
    InvalidVersion(String),

    #[error("No migration path from {from} to {to}")]
    NoPathFound { from: String, to: String },

    #[error("Could not detect the project's bevy version, pass --from-version")]
    VersionUndetected,

    #[error("Declared version {declared} disagrees with detected {detected} (use --force to override)")]
    VersionMismatch { declared: String, detected: String },

    #[error("Not a Rust project (no Cargo.toml): {0}")]
    NotAProject(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(#[from] globset::Error),

    #[error("Invalid rule set: {0}")]
    RuleSet(#[from] serde_yaml::Error),

    #[error("Backup failed: {0}")]
    Snapshot(String),

    #[error("Failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-file transformation errors
///
/// These are isolated: the affected file is carried forward unmodified for the
/// current unit and the error surfaces in the report warnings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("timed out after {0}s while matching rule '{1}'")]
    Timeout(u64, String),

    #[error("rule '{0}' references unknown callback '{1}'")]
    UnknownCallback(String, String),

    #[error("rule '{0}' has an unusable pattern: {1}")]
    Pattern(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_path_message() {
        let err = MigrateError::NoPathFound {
            from: "0.14".to_string(),
            to: "0.12".to_string(),
        };
        assert_eq!(err.to_string(), "No migration path from 0.14 to 0.12");
    }

    #[test]
    fn test_invalid_version_message() {
        let err = MigrateError::InvalidVersion("0.99".to_string());
        assert!(err.to_string().contains("0.99"));
    }

    #[test]
    fn test_transform_error_is_cloneable() {
        let err = TransformError::Timeout(30, "rule-a".to_string());
        let clone = err.clone();
        assert_eq!(err, clone);
    }
}
