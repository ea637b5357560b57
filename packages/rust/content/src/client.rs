//! Authenticated reader for CMS collections.
//!
//! A [`ContentClient`] is built once from explicit configuration and reused.
//! It attaches the bearer credential only when it was given one: clients that
//! talk to the same-origin proxy are built without it, because the proxy
//! injects the token server-side.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, instrument};

use strandly_shared::Envelope;

use crate::error::{ContentError, FetchError};

/// User-Agent string for CMS requests.
const USER_AGENT: &str = concat!("Strandly/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// Message used when an error response carries no readable message.
pub const GENERIC_FAILURE: &str = "Failed to fetch data from CMS";

/// Build a reqwest client with appropriate settings.
pub fn build_http_client(timeout_secs: u64) -> Result<Client, ContentError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ContentError::Client(e.to_string()))
}

/// Client for relaying requests: redirects are returned, not followed.
pub fn build_passthrough_client(timeout_secs: u64) -> Result<Client, ContentError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ContentError::Client(e.to_string()))
}

/// Reads `{data, meta}` envelopes from a CMS base URL.
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: Client,
    base_url: String,
    credential: Option<String>,
}

impl ContentClient {
    /// Create a client for `base_url`. `credential` is sent as a bearer token when set.
    pub fn new(http: Client, base_url: impl Into<String>, credential: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        }
    }

    /// The base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry an `Authorization` header.
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Full URL for an endpoint path such as `/items/posts?limit=5`.
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }

    /// Fetch a collection envelope from `endpoint` relative to the base URL.
    #[instrument(skip(self), fields(base = %self.base_url))]
    pub async fn fetch_collection(&self, endpoint: &str) -> Result<Envelope, FetchError> {
        let url = self.url_for(endpoint);
        self.fetch_url(endpoint, &url).await
    }

    /// Fetch an envelope from an explicit `url`, reporting errors against `endpoint`.
    pub async fn fetch_url(&self, endpoint: &str, url: &str) -> Result<Envelope, FetchError> {
        debug!(%url, authenticated = self.has_credential(), "fetching collection");

        let mut request = self.http.get(url).header(ACCEPT, "application/json");
        if let Some(token) = &self.credential {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::transport(endpoint, url, e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            FetchError::http(endpoint, url, status.as_u16(), format!("failed to read body: {e}"))
        })?;

        if !status.is_success() {
            let details = error_message(&body).unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(FetchError::http(endpoint, url, status.as_u16(), details));
        }

        serde_json::from_str::<Envelope>(&body).map_err(|e| {
            FetchError::http(endpoint, url, status.as_u16(), format!("malformed envelope: {e}"))
        })
    }
}

/// `{ "errors": [{ "message": "..." }] }`
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: Option<String>,
}

/// First non-empty message from a CMS error body, if the body decodes.
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .errors
        .into_iter()
        .filter_map(|e| e.message)
        .find(|m| !m.trim().is_empty())
}
