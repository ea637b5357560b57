//! Raw CMS records → canonical [`Post`]s.
//!
//! Every function here is total: missing, null or wrong-typed fields degrade
//! to defaults instead of failing. Locale-keyed fields are resolved here and
//! nowhere else.

use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;

use strandly_shared::{Author, Envelope, Post, Tag, TagRef};

/// Locale preferred when a field is a locale map.
pub const PREFERRED_LOCALE: &str = "en";

/// Reading speed used for `reading_time_minutes`.
pub const WORDS_PER_MINUTE: usize = 200;

/// Maximum length (in chars) of a summary derived from the body.
pub const SUMMARY_CHARS: usize = 160;

/// Author id used when the CMS omits it.
const UNKNOWN_AUTHOR_ID: &str = "0";

/// Resolve a possibly locale-keyed value to a display string.
///
/// A string is used as is. A map yields its `"en"` entry when that is a
/// string, else its first string value. Anything else yields `""`.
pub fn resolve_locale(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get(PREFERRED_LOCALE)
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(Value::as_str))
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Normalize one raw post record.
pub fn normalize(raw: &Value) -> Post {
    let title = text_field(raw, &["titles", "title"]).unwrap_or_default();
    let slug = text_field(raw, &["slugs", "slug"]).unwrap_or_default();
    let body = text_field(raw, &["content", "body"]);
    let summary = text_field(raw, &["meta_description", "summary"])
        .or_else(|| body.as_deref().and_then(summarize));

    let tags = match raw.get("tags") {
        Some(Value::Array(items)) => items.iter().map(tag_ref).collect(),
        _ => Vec::new(),
    };

    let published_at = field(raw, &["published_at"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    let reading_time_minutes = reading_time(body.as_deref());

    Post {
        id: raw.get("id").and_then(id_string).unwrap_or_default(),
        title,
        slug,
        body,
        summary,
        hero_image: field(raw, &["featured_image", "hero_image"]).and_then(asset_ref),
        tags,
        author: author(raw.get("author")),
        category: raw.get("category").and_then(category_name),
        published_at,
        reading_time_minutes,
    }
}

/// Normalize every item of an envelope, in order.
pub fn normalize_all(envelope: &Envelope) -> Vec<Post> {
    envelope.data.iter().map(normalize).collect()
}

/// Normalize a `post_tags` row; rows without a numeric id or a name are dropped.
pub fn normalize_tag(raw: &Value) -> Option<Tag> {
    let id = match raw.get("id")? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    let name = resolve_locale(raw.get("name")?);
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(Tag {
        id,
        name: name.to_string(),
    })
}

/// Remove markup tags, leaving text separated by spaces.
pub fn strip_tags(html: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    TAG_RE.replace_all(html, " ").into_owned()
}

/// `ceil(words / 200)`, at least 1.
pub fn reading_time(body: Option<&str>) -> u32 {
    let words = body
        .map(|b| strip_tags(b).split_whitespace().count())
        .unwrap_or(0);
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First present, non-null field among `names`.
fn field<'a>(raw: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| raw.get(name))
        .find(|v| !v.is_null())
}

/// First field among `names` that resolves to non-blank text.
fn text_field(raw: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| raw.get(name))
        .map(resolve_locale)
        .find(|text| !text.trim().is_empty())
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Truthy asset reference: non-empty string, non-zero number, or a file object's id.
fn asset_ref(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Object(map) => map.get("id").and_then(id_string),
        _ => None,
    }
}

fn tag_ref(entry: &Value) -> TagRef {
    let name_value = match entry {
        Value::Object(map) => match map.get("post_tags_id") {
            Some(Value::Object(tag)) => tag.get("name"),
            Some(_) => None,
            None => map.get("name"),
        },
        Value::String(_) => Some(entry),
        _ => None,
    };

    TagRef {
        name: name_value
            .map(resolve_locale)
            .filter(|n| !n.trim().is_empty()),
    }
}

fn author(value: Option<&Value>) -> Author {
    let Some(Value::Object(map)) = value else {
        return Author::default();
    };
    let text = |key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Author {
        id: map
            .get("id")
            .and_then(id_string)
            .unwrap_or_else(|| UNKNOWN_AUTHOR_ID.to_string()),
        first_name: text("first_name"),
        last_name: text("last_name"),
    }
}

fn category_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::Object(map) => map.get("name").map(resolve_locale)?,
        Value::String(s) => s.clone(),
        _ => return None,
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Tag-stripped, whitespace-collapsed body prefix.
fn summarize(body: &str) -> Option<String> {
    let text = strip_tags(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= SUMMARY_CHARS {
        return Some(text);
    }

    let cut: String = text.chars().take(SUMMARY_CHARS).collect();
    let cut = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    Some(format!("{}…", cut.trim_end()))
}
