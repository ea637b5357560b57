//! Core domain types for Strandly content.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The CMS response envelope: `{ "data": [...], "meta": {...} }`.
///
/// Items stay as raw JSON; the normalizer turns them into [`Post`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Raw collection items.
    pub data: Vec<Value>,
    /// Collection metadata (`total_count`, `filter_count`, ...).
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Envelope {
    /// An envelope with no items and `total_count: 0`.
    pub fn empty() -> Self {
        let mut meta = Map::new();
        meta.insert("total_count".into(), Value::from(0));
        Self {
            data: Vec::new(),
            meta,
        }
    }

    /// `meta.total_count` if present, else the number of items.
    pub fn total_count(&self) -> usize {
        self.meta
            .get("total_count")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(self.data.len())
    }
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A canonical, locale-resolved blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Opaque CMS identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// URL-safe identifier used in `/blog/{slug}`.
    pub slug: String,
    /// Markdown/HTML body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Short description (explicit or derived from the body).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// CMS asset id of the hero image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,
    /// Tag references as delivered by the CMS, malformed ones included.
    #[serde(default)]
    pub tags: Vec<TagRef>,
    /// Author display names.
    pub author: Author,
    /// Category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// ISO-8601 publication timestamp.
    pub published_at: String,
    /// Estimated reading time, always at least 1.
    pub reading_time_minutes: u32,
}

impl Post {
    /// Names of the well-formed tag references, in order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().filter_map(TagRef::name)
    }

    /// Parsed publication instant; see [`parse_timestamp`].
    pub fn published_instant(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.published_at)
    }

    /// Whether the post can be listed and linked (non-empty title and slug).
    pub fn is_listable(&self) -> bool {
        !self.title.trim().is_empty() && !self.slug.trim().is_empty()
    }
}

/// Parse a CMS timestamp.
///
/// Accepts RFC 3339, ISO 8601 without an offset (`dateTime` fields) and
/// bare dates. Values without an offset are read as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A reference from a post to a tag entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    /// Tag name; `None` when the CMS sent a partial relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TagRef {
    /// The trimmed tag name, if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Post author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            id: "0".into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }
}

impl Author {
    /// "First Last", collapsing missing parts.
    pub fn display_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// A tag row from the `post_tags` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
}
