//! Sitemap generation from the CMS.

use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, instrument, warn};

use strandly_blog::resolve_locale;
use strandly_content::{ContentClient, build_http_client};
use strandly_shared::{AppConfig, Envelope, Result, StrandlyError, parse_timestamp};

use crate::render::{STATIC_ROUTES, SitemapEntry, render_sitemap};

/// Published, titled posts; only the fields the sitemap needs.
pub const SITEMAP_POSTS_ENDPOINT: &str =
    "/items/posts?fields=slugs,published_at&filter[status][_eq]=published&filter[titles][_nnull]=true";

/// Static routes followed by one entry per distinct post slug.
///
/// Post `lastmod` is the publication date when it parses, else `today`.
pub fn collect_entries(envelope: &Envelope, today: NaiveDate) -> Vec<SitemapEntry> {
    let mut entries: Vec<SitemapEntry> = STATIC_ROUTES
        .iter()
        .map(|route| SitemapEntry::page(*route, today))
        .collect();

    let mut seen: Vec<String> = Vec::new();
    for raw in &envelope.data {
        let slug = raw.get("slugs").map(resolve_locale).unwrap_or_default();
        let slug = slug.trim();
        if slug.is_empty() || seen.iter().any(|s| s == slug) {
            continue;
        }
        seen.push(slug.to_string());

        let lastmod = published_date(raw).unwrap_or(today);
        entries.push(SitemapEntry::post(slug, lastmod));
    }

    entries
}

/// Fetch published posts directly from the CMS and render the sitemap.
///
/// No static fallback: a sitemap must never list placeholder posts.
#[instrument(skip(config), fields(cms = %config.cms.url))]
pub async fn generate(config: &AppConfig, today: NaiveDate) -> Result<String> {
    let http = build_http_client(config.cms.timeout_secs)?;
    let client = ContentClient::new(http, config.cms.url.clone(), config.cms_token());
    if !client.has_credential() {
        warn!(var = %config.cms.token_env, "no CMS token set, requesting posts anonymously");
    }

    let envelope = client.fetch_collection(SITEMAP_POSTS_ENDPOINT).await?;
    let entries = collect_entries(&envelope, today);
    info!(
        urls = entries.len(),
        posts = entries.len() - STATIC_ROUTES.len(),
        "sitemap entries collected"
    );

    Ok(render_sitemap(&config.sitemap.site_url, &entries))
}

/// Write `xml` to `path`, creating parent directories.
pub fn write_sitemap(path: &Path, xml: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StrandlyError::io(parent, e))?;
    }
    std::fs::write(path, xml).map_err(|e| StrandlyError::io(path, e))?;
    info!(path = %path.display(), bytes = xml.len(), "sitemap written");
    Ok(())
}

fn published_date(raw: &Value) -> Option<NaiveDate> {
    let text = raw.get("published_at")?.as_str()?;
    parse_timestamp(text).map(|dt| dt.date_naive())
}
