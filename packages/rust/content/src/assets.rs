//! CMS asset URL construction.
//!
//! Posts reference images by opaque asset id. Display URLs point at the CMS
//! `/assets/{id}` endpoint with transform parameters. An access token is
//! appended only for assets served by the configured CMS origin, never for
//! third-party URLs.

use url::Url;

use strandly_shared::{AppConfig, Result, StrandlyError};

/// How the CMS fits the image into the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFit {
    Cover,
    Contain,
    Inside,
    Outside,
}

impl AssetFit {
    fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Inside => "inside",
            Self::Outside => "outside",
        }
    }
}

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Auto,
    Webp,
    Avif,
    Jpg,
    Png,
}

impl AssetFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Transform parameters; unset fields are not emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetTransform {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
    pub fit: Option<AssetFit>,
    pub format: Option<AssetFormat>,
}

impl AssetTransform {
    /// Hero images on the blog list and detail pages.
    pub fn hero() -> Self {
        Self {
            width: Some(1200),
            height: None,
            quality: Some(80),
            fit: Some(AssetFit::Cover),
            format: Some(AssetFormat::Webp),
        }
    }

    fn with_width(&self, width: u32) -> Self {
        Self {
            width: Some(width),
            ..self.clone()
        }
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(w) = self.width {
            pairs.push(("width", w.to_string()));
        }
        if let Some(h) = self.height {
            pairs.push(("height", h.to_string()));
        }
        if let Some(q) = self.quality {
            pairs.push(("quality", q.min(100).to_string()));
        }
        if let Some(fit) = self.fit {
            pairs.push(("fit", fit.as_str().to_string()));
        }
        if let Some(format) = self.format {
            pairs.push(("format", format.as_str().to_string()));
        }
        pairs
    }
}

/// Builds display URLs for CMS assets.
#[derive(Debug, Clone)]
pub struct AssetUrlBuilder {
    cms: Url,
    token: Option<String>,
}

impl AssetUrlBuilder {
    pub fn new(cms_url: &str, token: Option<String>) -> Result<Self> {
        let origin_error = |reason: String| StrandlyError::AssetOrigin {
            url: cms_url.to_string(),
            reason,
        };
        let cms = Url::parse(cms_url).map_err(|e| origin_error(e.to_string()))?;
        if cms.cannot_be_a_base() {
            return Err(origin_error("not a base URL".to_string()));
        }
        Ok(Self { cms, token })
    }

    /// Builder using `[cms]` settings and the asset token env var.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.cms.url, config.asset_token())
    }

    /// Whether `asset_ref` is served by the CMS (and so accepts transforms).
    pub fn is_managed(&self, asset_ref: &str) -> bool {
        let trimmed = asset_ref.trim();
        if trimmed.is_empty() {
            return false;
        }
        match Url::parse(trimmed) {
            Ok(abs) => abs.origin() == self.cms.origin(),
            Err(_) => !trimmed.starts_with('/'),
        }
    }

    /// Display URL for `asset_ref`.
    ///
    /// Opaque ids and absolute CMS URLs get transform parameters (and the
    /// token, if any). Other absolute URLs and site-relative paths are
    /// returned unchanged.
    pub fn url(&self, asset_ref: &str, transform: &AssetTransform) -> String {
        let trimmed = asset_ref.trim();
        if !self.is_managed(trimmed) {
            return trimmed.to_string();
        }

        let base = match Url::parse(trimmed) {
            Ok(abs) => abs,
            Err(_) => {
                let mut url = self.cms.clone();
                match url.path_segments_mut() {
                    Ok(mut segments) => {
                        segments.pop_if_empty().push("assets").push(trimmed);
                    }
                    Err(()) => return trimmed.to_string(),
                }
                url
            }
        };

        self.decorate(base, transform)
    }

    /// `srcset` value with one candidate per width; empty for unmanaged assets.
    pub fn srcset(&self, asset_ref: &str, widths: &[u32], transform: &AssetTransform) -> String {
        if !self.is_managed(asset_ref) {
            return String::new();
        }
        widths
            .iter()
            .map(|&w| format!("{} {w}w", self.url(asset_ref, &transform.with_width(w))))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn decorate(&self, mut url: Url, transform: &AssetTransform) -> String {
        let mut pairs = transform.pairs();
        if let Some(token) = &self.token {
            pairs.push(("access_token", token.clone()));
        }

        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
        }

        url.to_string()
    }
}
