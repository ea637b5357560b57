//! CMS content access for Strandly.
//!
//! This crate provides:
//! - [`client`]: the authenticated CMS collection reader ([`ContentClient`])
//! - [`channel`]: fetch channels (proxy, direct, relay, static)
//! - [`resilient`]: the ordered "first success wins" channel chain
//! - [`fallback`]: bundled datasets used when every network channel fails
//! - [`assets`]: CMS asset URL and `srcset` construction
//! - [`latest`]: latest-wins guard for superseded requests

pub mod assets;
pub mod channel;
pub mod client;
pub mod error;
pub mod fallback;
pub mod latest;
pub mod resilient;

pub use assets::{AssetFit, AssetFormat, AssetTransform, AssetUrlBuilder};
pub use channel::{Channel, DirectChannel, ProxyChannel, RelayChannel, StaticChannel};
pub use client::{ContentClient, build_http_client, build_passthrough_client};
pub use error::{ContentError, FetchError};
pub use latest::LatestOnly;
pub use resilient::{Fetched, ResilientFetcher, first_success};
