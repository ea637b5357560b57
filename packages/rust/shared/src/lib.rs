//! Shared types, error model, and configuration for Strandly.
//!
//! This crate is the foundation depended on by all other Strandly crates.
//! It provides:
//! - [`StrandlyError`]: the unified error type
//! - Canonical content types ([`Post`], [`Tag`], [`Author`], [`TagRef`], [`Envelope`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BlogConfig, ChannelsConfig, CmsConfig, ConfigSource, ServerConfig, SitemapConfig,
    default_config_toml, init_config, load_config_from, read_secret, resolve_config,
    user_config_path,
};
pub use error::{Result, StrandlyError};
pub use types::{Author, Envelope, Post, Tag, TagRef, parse_timestamp};
