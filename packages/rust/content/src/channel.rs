//! Fetch channels: one concrete path to CMS data each.
//!
//! Channels are tried in order by [`crate::resilient::first_success`]; a
//! channel only reports success or failure and never retries on its own.

use async_trait::async_trait;

use strandly_shared::Envelope;

use crate::client::ContentClient;
use crate::error::FetchError;
use crate::fallback;

/// Placeholder replaced by the encoded CMS URL in relay templates.
pub const RELAY_PLACEHOLDER: &str = "{url}";

/// One way of obtaining a collection envelope.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Try to fetch `endpoint` through this channel.
    async fn attempt(&self, endpoint: &str) -> Result<Envelope, FetchError>;

    /// Human-readable channel name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Same-origin proxy
// ---------------------------------------------------------------------------

/// The site's own `/api` reverse proxy. Never carries the credential.
pub struct ProxyChannel {
    client: ContentClient,
}

impl ProxyChannel {
    pub fn new(http: reqwest::Client, proxy_base: impl Into<String>) -> Self {
        Self {
            client: ContentClient::new(http, proxy_base, None),
        }
    }
}

#[async_trait]
impl Channel for ProxyChannel {
    async fn attempt(&self, endpoint: &str) -> Result<Envelope, FetchError> {
        self.client.fetch_collection(endpoint).await
    }

    fn name(&self) -> &str {
        "proxy"
    }
}

// ---------------------------------------------------------------------------
// Direct
// ---------------------------------------------------------------------------

/// Cross-origin call straight to the CMS with the bearer token.
pub struct DirectChannel {
    client: ContentClient,
}

impl DirectChannel {
    pub fn new(http: reqwest::Client, cms_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: ContentClient::new(http, cms_url, token),
        }
    }
}

#[async_trait]
impl Channel for DirectChannel {
    async fn attempt(&self, endpoint: &str) -> Result<Envelope, FetchError> {
        self.client.fetch_collection(endpoint).await
    }

    fn name(&self) -> &str {
        "direct"
    }
}

// ---------------------------------------------------------------------------
// Public CORS relay
// ---------------------------------------------------------------------------

/// A public relay that fetches the CMS URL on our behalf.
///
/// The relay sees the full request URL, so it never receives the credential.
pub struct RelayChannel {
    client: ContentClient,
    template: String,
    name: String,
}

impl RelayChannel {
    /// `template` must contain `{url}`, e.g. `https://relay.example/raw?url={url}`.
    pub fn new(http: reqwest::Client, cms_url: impl Into<String>, template: impl Into<String>) -> Self {
        let template = template.into();
        let name = url::Url::parse(&template.replace(RELAY_PLACEHOLDER, ""))
            .ok()
            .and_then(|u| u.host_str().map(|h| format!("relay:{h}")))
            .unwrap_or_else(|| "relay".to_string());

        Self {
            client: ContentClient::new(http, cms_url, None),
            template,
            name,
        }
    }

    /// The relay URL wrapping the direct CMS URL for `endpoint`.
    pub fn relay_url(&self, endpoint: &str) -> String {
        let target = self.client.url_for(endpoint);
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        self.template.replace(RELAY_PLACEHOLDER, &encoded)
    }
}

#[async_trait]
impl Channel for RelayChannel {
    async fn attempt(&self, endpoint: &str) -> Result<Envelope, FetchError> {
        let url = self.relay_url(endpoint);
        self.client.fetch_url(endpoint, &url).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Static
// ---------------------------------------------------------------------------

/// The bundled dataset. Always succeeds.
pub struct StaticChannel;

#[async_trait]
impl Channel for StaticChannel {
    async fn attempt(&self, endpoint: &str) -> Result<Envelope, FetchError> {
        Ok(fallback::dataset_for(endpoint))
    }

    fn name(&self) -> &str {
        "static"
    }
}
