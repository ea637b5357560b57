//! Fetch errors for CMS channels.

use strandly_shared::StrandlyError;

/// A single failed request against one channel.
///
/// `status` is `None` when the request never produced an HTTP response
/// (connection refused, timeout, TLS failure).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{endpoint} via {url}: {details} ({})", status_label(.status))]
pub struct FetchError {
    pub status: Option<u16>,
    pub endpoint: String,
    pub url: String,
    pub details: String,
}

impl FetchError {
    /// A failure before any HTTP status was received.
    pub fn transport(endpoint: &str, url: &str, details: impl Into<String>) -> Self {
        Self {
            status: None,
            endpoint: endpoint.to_string(),
            url: url.to_string(),
            details: details.into(),
        }
    }

    /// A failure after the upstream answered with `status`.
    pub fn http(endpoint: &str, url: &str, status: u16, details: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            endpoint: endpoint.to_string(),
            url: url.to_string(),
            details: details.into(),
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    }
}

/// Errors surfaced by the content layer to its callers.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Every configured channel failed.
    #[error("all {} channel(s) failed for {endpoint}", .attempts.len())]
    Exhausted {
        endpoint: String,
        /// `(channel name, failure)` in attempt order.
        attempts: Vec<(String, FetchError)>,
    },

    /// A single-channel fetch failed (used by callers that bypass the chain).
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<ContentError> for StrandlyError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Client(msg) => StrandlyError::HttpClient(msg),
            ContentError::Fetch(fetch) => fetch.into(),
            ContentError::Exhausted { endpoint, attempts } => {
                let status = attempts.iter().rev().find_map(|(_, e)| e.status);
                let message = if attempts.is_empty() {
                    "no fetch channels configured".to_string()
                } else {
                    attempts
                        .iter()
                        .map(|(channel, e)| format!("{channel}: {}", e.details))
                        .collect::<Vec<_>>()
                        .join("; ")
                };
                StrandlyError::Cms {
                    endpoint,
                    status,
                    message,
                }
            }
        }
    }
}

impl From<FetchError> for StrandlyError {
    fn from(err: FetchError) -> Self {
        StrandlyError::Cms {
            endpoint: err.endpoint,
            status: err.status,
            message: err.details,
        }
    }
}
