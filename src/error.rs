//! Error types for confmon.

use crate::formats::FormatTag;
use std::path::PathBuf;

/// Result type alias for confmon operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when registering, loading, monitoring or updating
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration file could not be read or written.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// The file that was being accessed
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Content could not be parsed, or a value could not be serialized.
    #[error("Failed to process {format} configuration: {message}")]
    Format {
        /// Format of the content
        format: FormatTag,
        /// Description of the parse or encode failure
        message: String,
    },

    /// No configuration is registered under the given name.
    #[error("Configuration '{0}' not found")]
    NotFound(String),

    /// A configuration with the given name is already registered.
    #[error("Configuration '{0}' already exists")]
    AlreadyExists(String),

    /// A value did not have the expected shape or type.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// The format tag does not map to any known reader.
    #[error("Unsupported configuration format: '{0}'")]
    UnsupportedFormat(String),

    /// The format is known but its cargo feature is disabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(&'static str),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(format: FormatTag, message: impl ToString) -> Self {
        Self::Format {
            format,
            message: message.to_string(),
        }
    }

    /// Whether a background poller should retry after this error.
    ///
    /// IO and parse failures are expected while a file is being rewritten;
    /// everything else points at a programming or registration mistake.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Format { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let io = ConfigError::io(
            "/tmp/app.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(io.is_transient());
        assert!(ConfigError::format(FormatTag::Json, "bad token").is_transient());
        assert!(!ConfigError::NotFound("app".into()).is_transient());
        assert!(!ConfigError::TypeMismatch("not a map".into()).is_transient());
    }

    #[test]
    fn test_display_names_path() {
        let err = ConfigError::io(
            "/etc/app.yaml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/etc/app.yaml"));
        assert!(msg.contains("denied"));
    }
}
