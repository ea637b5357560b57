//! XML rendering of sitemap entries.

use chrono::NaiveDate;
use url::Url;

/// Site routes listed in every sitemap.
pub const STATIC_ROUTES: &[&str] = &[
    "/",
    "/impressum",
    "/privacy-policy",
    "/terms-of-service",
    "/cookie-policy",
    "/about-us",
    "/learn-more",
    "/blog",
];

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const URLSET_OPEN: &str = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#;

/// `<changefreq>` values used by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    /// Site-relative path starting with `/`.
    pub path: String,
    pub lastmod: NaiveDate,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

impl SitemapEntry {
    /// A static page: monthly, priority 0.8.
    pub fn page(path: impl Into<String>, lastmod: NaiveDate) -> Self {
        Self {
            path: path.into(),
            lastmod,
            changefreq: ChangeFreq::Monthly,
            priority: 0.8,
        }
    }

    /// A blog post at `/blog/{slug}`: weekly, priority 0.9.
    ///
    /// The slug is percent-encoded as a single path segment.
    pub fn post(slug: &str, lastmod: NaiveDate) -> Self {
        Self {
            path: format!("/blog/{}", encode_segment(slug)),
            lastmod,
            changefreq: ChangeFreq::Weekly,
            priority: 0.9,
        }
    }
}

fn encode_segment(segment: &str) -> String {
    let Ok(mut url) = Url::parse("http://segment.invalid/") else {
        return segment.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(segment);
    }
    url.path().trim_start_matches('/').to_string()
}

/// Render a complete sitemap document for `site_url`.
pub fn render_sitemap(site_url: &str, entries: &[SitemapEntry]) -> String {
    let site = site_url.trim_end_matches('/');
    let mut xml = String::with_capacity(128 + entries.len() * 160);

    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(URLSET_OPEN);
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}</loc>\n",
            escape_xml(&format!("{site}{}", entry.path))
        ));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            entry.lastmod.format("%Y-%m-%d")
        ));
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.changefreq.as_str()
        ));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
