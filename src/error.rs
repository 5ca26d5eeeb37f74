//! Error types for pipedb
//!
//! All modules use `PipedbResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipedb operations
pub type PipedbResult<T> = Result<T, PipedbError>;

/// All errors that can occur in pipedb
#[derive(Error, Debug)]
pub enum PipedbError {
    // Lock errors
    #[error("Workflow instance is locked by another run: {}", path.display())]
    LockConflict { path: PathBuf },

    // Input validation errors
    #[error("At least one chunk is required when splitting on axes [{axes}]")]
    EmptyChunks { axes: String },

    #[error("Chunk #{index} has {found} value(s) but axes [{axes}] need {expected}")]
    ChunkArity {
        axes: String,
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Axis level {level} is out of range for axes [{axes}]")]
    InvalidLevel { axes: String, level: usize },

    // Resource errors
    #[error("Alias cycle detected while resolving {0}")]
    AliasCycle(String),

    // Storage errors
    #[error("Input missing from storage: {0}")]
    InputMissing(String),

    #[error("Corrupt input {name}: {reason}")]
    CorruptInput { name: String, reason: String },

    #[error("Remote name '{0}' has no object part after the container")]
    InvalidRemoteName(String),

    // Configuration errors
    #[error("Invalid configuration at {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {}: {source}", path.display())]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl PipedbError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the error came from bad caller input rather than the environment
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyChunks { .. } | Self::ChunkArity { .. } | Self::InvalidLevel { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::LockConflict { path } => Some(format!(
                "If no other run is active, remove the stale lock with `pipedb unlock` or `rm -r {}`",
                path.display()
            )),
            Self::AliasCycle(_) => Some("Aliases must not redirect back to themselves".to_string()),
            Self::CorruptInput { .. } => {
                Some("Re-run the producing job to push a fresh copy".to_string())
            }
            Self::ConfigInvalid { path, .. } => Some(format!(
                "Fix or remove {} to fall back to defaults",
                path.display()
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_conflict_names_path() {
        let err = PipedbError::LockConflict {
            path: PathBuf::from("/work/locks/run1/_lock"),
        };
        assert!(err.to_string().contains("/work/locks/run1/_lock"));
        assert!(err.hint().unwrap().contains("pipedb unlock"));
    }

    #[test]
    fn arity_error_names_offender() {
        let err = PipedbError::ChunkArity {
            axes: "sample, region".to_string(),
            index: 3,
            expected: 2,
            found: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("#3"));
        assert!(msg.contains("sample, region"));
        assert!(err.is_validation());
    }

    #[test]
    fn io_is_not_validation() {
        let err = PipedbError::io(
            "reading chunks",
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        );
        assert!(!err.is_validation());
        assert!(err.hint().is_none());
    }
}
