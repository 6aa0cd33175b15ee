use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Error produced by rule parsing, compilation, and provider operations.
///
/// The enum is `Clone` so a provider can cache a per-directory load failure
/// and return the identical error on every subsequent call for that
/// directory; I/O causes are kept behind [`Arc`] for that reason and remain
/// reachable through [`std::error::Error::source`], with
/// [`RuleError::io_cause`] as a typed shortcut.
#[derive(Clone, Debug, Error)]
pub enum RuleError {
    /// Pattern is empty after normalization or its regex body was rejected.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// Original pattern text of the offending rule.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// Provider rules file name is absolute, separator-bearing, `.` or `..`.
    #[error("invalid rules file name {name:?}")]
    InvalidRulesFileName {
        /// The rejected file name.
        name: String,
    },

    /// Batch directory entry name is not a single clean path component.
    #[error("invalid directory entry name {name:?}")]
    InvalidEntryName {
        /// The rejected entry name.
        name: String,
    },

    /// Provider-relative path is empty, absolute, or traverses with `..`.
    #[error("path {path:?} is outside the provider root")]
    PathOutsideRoot {
        /// The rejected input path.
        path: String,
    },

    /// Symlink-resolved rules file escapes the resolved provider root.
    #[error("rules file {} resolves outside the provider root", .path.display())]
    RulesPathOutsideRoot {
        /// Location of the offending rules file inside the root.
        path: PathBuf,
    },

    /// Filesystem operation failed for the given path.
    #[error("failed to read {}: {error}", .path.display())]
    Io {
        /// Path the operation was performed on.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        error: Arc<io::Error>,
    },

    /// Reading from a rules byte stream failed.
    #[error("failed to read rules stream: {error}")]
    Parse {
        /// Underlying I/O failure.
        #[source]
        error: Arc<io::Error>,
    },
}

impl RuleError {
    /// Returns the underlying I/O failure when the error wraps one.
    #[must_use]
    pub fn io_cause(&self) -> Option<&io::Error> {
        match self {
            Self::Io { error, .. } | Self::Parse { error } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invalid_pattern_mentions_pattern_and_reason() {
        let error = RuleError::InvalidPattern {
            pattern: "///".into(),
            reason: "empty after normalization".into(),
        };
        let rendered = error.to_string();
        assert!(rendered.contains("///"));
        assert!(rendered.contains("empty after normalization"));
    }

    #[test]
    fn io_error_preserves_cause() {
        let error = RuleError::Io {
            path: PathBuf::from("/tmp/.rules"),
            error: Arc::new(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        };
        assert_eq!(
            error.io_cause().map(io::Error::kind),
            Some(io::ErrorKind::PermissionDenied)
        );
        assert!(error.to_string().contains("/tmp/.rules"));
        assert_eq!(
            error.source().map(|source| source.to_string()),
            Some("denied".to_string())
        );
    }

    #[test]
    fn parse_error_exposes_source_chain() {
        let error = RuleError::Parse {
            error: Arc::new(io::Error::new(io::ErrorKind::BrokenPipe, "stream torn down")),
        };
        assert!(error.source().is_some());
    }

    #[test]
    fn cached_errors_clone_equivalently() {
        let error = RuleError::PathOutsideRoot {
            path: "../escape".into(),
        };
        assert_eq!(error.clone().to_string(), error.to_string());
    }
}
