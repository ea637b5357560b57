//! Ordered channel chain: the first channel to succeed wins.
//!
//! Channels are attempted strictly one after another. A failure (transport
//! error, non-2xx, malformed JSON) moves on to the next channel; there is no
//! retry and no backoff. With the static channel at the end of the chain a
//! fetch never fails for the caller.

use tracing::{info, instrument, warn};

use strandly_shared::{AppConfig, Envelope};

use crate::channel::{Channel, DirectChannel, ProxyChannel, RelayChannel, StaticChannel};
use crate::client::build_http_client;
use crate::error::{ContentError, FetchError};

/// A successful fetch and the channel that produced it.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub envelope: Envelope,
    pub channel: String,
}

/// Try `channels` in order and return the first envelope obtained.
#[instrument(skip(channels), fields(channels = channels.len()))]
pub async fn first_success(
    channels: &[Box<dyn Channel>],
    endpoint: &str,
) -> Result<Fetched, ContentError> {
    let mut attempts: Vec<(String, FetchError)> = Vec::new();

    for channel in channels {
        match channel.attempt(endpoint).await {
            Ok(envelope) => {
                info!(
                    channel = channel.name(),
                    items = envelope.data.len(),
                    failed_before = attempts.len(),
                    "channel succeeded"
                );
                return Ok(Fetched {
                    envelope,
                    channel: channel.name().to_string(),
                });
            }
            Err(e) => {
                warn!(channel = channel.name(), error = %e, "channel failed, trying next");
                attempts.push((channel.name().to_string(), e));
            }
        }
    }

    Err(ContentError::Exhausted {
        endpoint: endpoint.to_string(),
        attempts,
    })
}

/// The configured channel chain.
pub struct ResilientFetcher {
    channels: Vec<Box<dyn Channel>>,
}

impl ResilientFetcher {
    /// Use an explicit, ordered list of channels.
    pub fn new(channels: Vec<Box<dyn Channel>>) -> Self {
        Self { channels }
    }

    /// Build the chain described by `[channels]`:
    /// proxy → direct → relays → static, skipping disabled entries.
    pub fn from_config(config: &AppConfig) -> Result<Self, ContentError> {
        let http = build_http_client(config.cms.timeout_secs)?;
        let mut channels: Vec<Box<dyn Channel>> = Vec::new();

        if let Some(proxy_base) = &config.channels.proxy_base {
            channels.push(Box::new(ProxyChannel::new(http.clone(), proxy_base.clone())));
        }

        if config.channels.direct {
            channels.push(Box::new(DirectChannel::new(
                http.clone(),
                config.cms.url.clone(),
                config.cms_token(),
            )));
        }

        for template in &config.channels.relays {
            channels.push(Box::new(RelayChannel::new(
                http.clone(),
                config.cms.url.clone(),
                template.clone(),
            )));
        }

        if config.channels.static_fallback {
            channels.push(Box::new(StaticChannel));
        }

        Ok(Self::new(channels))
    }

    /// Channel names in attempt order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Fetch `endpoint` through the chain.
    pub async fn fetch(&self, endpoint: &str) -> Result<Fetched, ContentError> {
        first_success(&self.channels, endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Test channel with a fixed outcome and a call counter.
    struct Scripted {
        name: &'static str,
        ok: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(name: &'static str, ok: bool) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    ok,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl Channel for Scripted {
        async fn attempt(&self, endpoint: &str) -> Result<Envelope, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.ok {
                let mut env = Envelope::empty();
                env.data.push(serde_json::json!({ "from": self.name }));
                Ok(env)
            } else {
                Err(FetchError::transport(endpoint, self.name, "scripted failure"))
            }
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn second_channel_wins_and_third_is_not_attempted() {
        let (first, first_calls) = Scripted::new("first", false);
        let (second, second_calls) = Scripted::new("second", true);
        let (third, third_calls) = Scripted::new("third", true);

        let fetcher = ResilientFetcher::new(vec![
            Box::new(first),
            Box::new(second),
            Box::new(third),
        ]);
        let fetched = fetcher.fetch("/items/posts").await.unwrap();

        assert_eq!(fetched.channel, "second");
        assert_eq!(fetched.envelope.data[0]["from"], "second");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn static_dataset_used_when_network_channels_fail() {
        let (first, _) = Scripted::new("proxy", false);
        let (second, _) = Scripted::new("direct", false);

        let fetcher =
            ResilientFetcher::new(vec![Box::new(first), Box::new(second), Box::new(StaticChannel)]);
        let fetched = fetcher
            .fetch("/items/posts?filter[titles][_nnull]=true&fields=id,titles,slugs,tags.post_tags_id.name")
            .await
            .unwrap();

        assert_eq!(fetched.channel, "static");
        assert_eq!(fetched.envelope.data.len(), 2);
        assert!(fetched.envelope.data[0].get("slugs").is_some());
    }

    #[tokio::test]
    async fn static_unknown_resource_is_empty_not_error() {
        let (first, _) = Scripted::new("direct", false);
        let fetcher = ResilientFetcher::new(vec![Box::new(first), Box::new(StaticChannel)]);
        let fetched = fetcher.fetch("/items/waitlist").await.unwrap();
        assert!(fetched.envelope.data.is_empty());
        assert_eq!(fetched.envelope.total_count(), 0);
    }

    #[tokio::test]
    async fn exhaustion_lists_every_attempt() {
        let (first, _) = Scripted::new("proxy", false);
        let (second, _) = Scripted::new("direct", false);
        let fetcher = ResilientFetcher::new(vec![Box::new(first), Box::new(second)]);

        match fetcher.fetch("/items/posts").await {
            Err(ContentError::Exhausted { endpoint, attempts }) => {
                assert_eq!(endpoint, "/items/posts");
                let names: Vec<&str> = attempts.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["proxy", "direct"]);
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_chain_is_exhausted() {
        let fetcher = ResilientFetcher::new(Vec::new());
        assert!(matches!(
            fetcher.fetch("/items/posts").await,
            Err(ContentError::Exhausted { .. })
        ));
    }

    #[test]
    fn from_config_orders_channels() {
        let mut config = AppConfig::default();
        config.channels.proxy_base = Some("http://localhost:3000/api".into());
        config.channels.relays = vec!["https://relay.example.com/raw?url={url}".into()];

        let fetcher = ResilientFetcher::from_config(&config).unwrap();
        assert_eq!(
            fetcher.channel_names(),
            vec!["proxy", "direct", "relay:relay.example.com", "static"]
        );

        config.channels.direct = false;
        config.channels.static_fallback = false;
        config.channels.relays.clear();
        let fetcher = ResilientFetcher::from_config(&config).unwrap();
        assert_eq!(fetcher.channel_names(), vec!["proxy"]);
    }

    #[tokio::test]
    async fn proxy_failure_falls_back_to_direct_cms() {
        let proxy = MockServer::start().await;
        let cms = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/items/posts"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&proxy)
            .await;

        Mock::given(method("GET"))
            .and(path("/items/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": 1}, {"id": 2}, {"id": 3}]
            })))
            .expect(1)
            .mount(&cms)
            .await;

        let mut config = AppConfig::default();
        config.cms.url = cms.uri();
        config.channels.proxy_base = Some(format!("{}/api", proxy.uri()));

        let fetcher = ResilientFetcher::from_config(&config).unwrap();
        let fetched = fetcher.fetch("/items/posts").await.unwrap();

        assert_eq!(fetched.channel, "direct");
        assert_eq!(fetched.envelope.data.len(), 3);
    }
}
