//! Error types for Strandly.
//!
//! Library crates return [`StrandlyError`]; the CLI reports it through
//! `color-eyre`. CMS failures keep the endpoint and the last HTTP status so
//! callers can tell an outage from a permissions problem.

use std::path::PathBuf;

/// Top-level error type for all Strandly operations.
#[derive(Debug, thiserror::Error)]
pub enum StrandlyError {
    /// A config value that would break requests later.
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    /// A config file that is not valid TOML for the schema.
    #[error("cannot read config {path:?}: {message}")]
    ConfigSyntax { path: PathBuf, message: String },

    /// `config init` found a file at the target path.
    #[error("config file {path:?} already exists")]
    ConfigExists { path: PathBuf },

    /// No home directory to hold `~/.strandly`.
    #[error("no home directory found; pass --config or set STRANDLY_CONFIG")]
    NoHomeDir,

    /// The CMS did not deliver the requested collection.
    #[error("CMS request for {endpoint} failed ({}): {message}", status_label(.status))]
    Cms {
        endpoint: String,
        /// Last HTTP status seen; `None` when no channel got a response.
        status: Option<u16>,
        message: String,
    },

    /// The HTTP client could not be built.
    #[error("cannot build HTTP client: {0}")]
    HttpClient(String),

    /// The CMS origin cannot anchor asset URLs.
    #[error("CMS URL {url:?} cannot address assets: {reason}")]
    AssetOrigin { url: String, reason: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StrandlyError>;

impl StrandlyError {
    pub fn setting(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key,
            reason: reason.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status of a CMS failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Cms { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the CMS refused the credentials (401/403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cms_error_reports_endpoint_and_status() {
        let err = StrandlyError::Cms {
            endpoint: "/items/posts".into(),
            status: Some(503),
            message: "Service Unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "CMS request for /items/posts failed (HTTP 503): Service Unavailable"
        );
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn unreachable_cms_has_no_status() {
        let err = StrandlyError::Cms {
            endpoint: "/items/post_tags".into(),
            status: None,
            message: "connection refused".into(),
        };
        assert!(err.to_string().contains("(no response)"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn forbidden_is_auth_failure() {
        let err = StrandlyError::Cms {
            endpoint: "/items/posts".into(),
            status: Some(403),
            message: "You don't have permission to access this.".into(),
        };
        assert!(err.is_auth_failure());
        assert!(!StrandlyError::NoHomeDir.is_auth_failure());
    }

    #[test]
    fn setting_error_names_the_key() {
        let err = StrandlyError::setting("blog.page_size", "must be at least 1");
        assert_eq!(err.to_string(), "invalid setting `blog.page_size`: must be at least 1");
    }
}
