//! Application configuration for Strandly.
//!
//! User config lives at `~/.strandly/strandly.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets (CMS tokens) are never stored in the file, only the names of the
//! environment variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, StrandlyError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "strandly.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".strandly";

const CONFIG_HEADER: &str = "# Strandly configuration.\n\
# Tokens are never stored here: [cms] names the environment variables that hold them.";

// ---------------------------------------------------------------------------
// Config structs (matching strandly.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Headless CMS connection.
    #[serde(default)]
    pub cms: CmsConfig,

    /// Fetch channel chain.
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Reverse proxy / static server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Sitemap generation.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// Blog list presentation.
    #[serde(default)]
    pub blog: BlogConfig,
}

/// `[cms]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// CMS origin, e.g. `https://strandly.onrender.com`.
    #[serde(default = "default_cms_url")]
    pub url: String,

    /// Name of the env var holding the CMS bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Name of the env var holding the token appended to asset URLs.
    #[serde(default = "default_asset_token_env")]
    pub asset_token_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            url: default_cms_url(),
            token_env: default_token_env(),
            asset_token_env: default_asset_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_cms_url() -> String {
    "https://strandly.onrender.com".into()
}
fn default_token_env() -> String {
    "STRANDLY_CMS_TOKEN".into()
}
fn default_asset_token_env() -> String {
    "STRANDLY_ASSET_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[channels]` section: which fetch channels are tried, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Base URL of the same-origin reverse proxy (e.g. `http://localhost:3000/api`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_base: Option<String>,

    /// Whether to call the CMS directly with the bearer token.
    #[serde(default = "default_true")]
    pub direct: bool,

    /// Public CORS relay templates; `{url}` is replaced by the encoded CMS URL.
    #[serde(default)]
    pub relays: Vec<String>,

    /// Whether the bundled dataset is used as the last resort.
    #[serde(default = "default_true")]
    pub static_fallback: bool,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            proxy_base: None,
            direct: true,
            relays: Vec::new(),
            static_fallback: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the built front end (`index.html` and assets).
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Path prefix that is stripped before forwarding to the CMS.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            api_prefix: default_api_prefix(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_static_dir() -> String {
    "dist".into()
}
fn default_api_prefix() -> String {
    "/api".into()
}

/// `[sitemap]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Public site origin used in `<loc>` entries.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Output path for `sitemap.xml`.
    #[serde(default = "default_sitemap_output")]
    pub output: String,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            output: default_sitemap_output(),
        }
    }
}

fn default_site_url() -> String {
    "https://www.strandly.eu".into()
}
fn default_sitemap_output() -> String {
    "public/sitemap.xml".into()
}

/// `[blog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    /// Posts per list page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    9
}

impl AppConfig {
    /// Check the values that would otherwise fail deep inside a request.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.cms.url)
            .map_err(|e| StrandlyError::setting("cms.url", format!("'{}': {e}", self.cms.url)))?;

        if let Some(base) = &self.channels.proxy_base {
            Url::parse(base).map_err(|e| {
                StrandlyError::setting("channels.proxy_base", format!("'{base}': {e}"))
            })?;
        }

        for relay in &self.channels.relays {
            if !relay.contains("{url}") {
                return Err(StrandlyError::setting(
                    "channels.relays",
                    format!("template '{relay}' has no {{url}} placeholder"),
                ));
            }
        }

        if self.blog.page_size == 0 {
            return Err(StrandlyError::setting("blog.page_size", "must be at least 1"));
        }

        if !self.server.api_prefix.starts_with('/') {
            return Err(StrandlyError::setting(
                "server.api_prefix",
                format!("'{}' must start with '/'", self.server.api_prefix),
            ));
        }

        Ok(())
    }

    /// The CMS bearer token, if its env var is set and non-empty.
    pub fn cms_token(&self) -> Option<String> {
        read_secret(&self.cms.token_env)
    }

    /// The asset access token, if its env var is set and non-empty.
    pub fn asset_token(&self) -> Option<String> {
        read_secret(&self.cms.asset_token_env)
    }
}

/// Read a secret from the named env var; empty values count as unset.
pub fn read_secret(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` or `STRANDLY_CONFIG`; the file must exist.
    Explicit(PathBuf),
    /// `~/.strandly/strandly.toml`.
    UserFile(PathBuf),
    /// No file: built-in defaults.
    Defaults,
}

impl ConfigSource {
    /// The file backing this source, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::UserFile(path) => Some(path),
            Self::Defaults => None,
        }
    }
}

/// `~/.strandly/strandly.toml`, or `None` without a home directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Resolve the effective configuration.
///
/// An explicit path must load. Otherwise the user file is used when present,
/// and built-in defaults when it is not.
pub fn resolve_config(explicit: Option<&Path>) -> Result<(AppConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = load_config_from(path)?;
        return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
    }

    match user_config_path() {
        Some(path) if path.is_file() => {
            let config = load_config_from(&path)?;
            Ok((config, ConfigSource::UserFile(path)))
        }
        other => {
            tracing::debug!(candidate = ?other, "no config file, using defaults");
            Ok((AppConfig::default(), ConfigSource::Defaults))
        }
    }
}

/// Load and validate a config file.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StrandlyError::io(path, e))?;
    let config: AppConfig = toml::from_str(&content).map_err(|e| StrandlyError::ConfigSyntax {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// The default config as TOML, headed by a note on where secrets live.
pub fn default_config_toml() -> Result<String> {
    let body = toml::to_string_pretty(&AppConfig::default()).map_err(|e| {
        StrandlyError::ConfigSyntax {
            path: PathBuf::from(CONFIG_FILE_NAME),
            message: e.to_string(),
        }
    })?;
    Ok(format!("{CONFIG_HEADER}\n\n{body}"))
}

/// Write the default config to `target` (or the user path), never overwriting.
pub fn init_config(target: Option<&Path>) -> Result<PathBuf> {
    let path = match target {
        Some(path) => path.to_path_buf(),
        None => user_config_path().ok_or(StrandlyError::NoHomeDir)?,
    };
    if path.exists() {
        return Err(StrandlyError::ConfigExists { path });
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| StrandlyError::io(dir, e))?;
    }
    std::fs::write(&path, default_config_toml()?).map_err(|e| StrandlyError::io(&path, e))?;
    tracing::info!(?path, "wrote default config");

    Ok(path)
}
