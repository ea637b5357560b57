//! Blog content: normalization, list derivation, and post detail rendering.
//!
//! This crate provides:
//! - [`normalize`]: raw CMS records → canonical [`Post`]s (the only locale resolver)
//! - [`list`]: filter / sort / paginate derivation of the blog list view
//! - [`render`]: Markdown → sanitized HTML
//! - [`detail`]: slug lookup with a distinct not-found outcome
//! - [`service`]: [`BlogService`], tying the above to the resilient fetcher
//!
//! [`Post`]: strandly_shared::Post

pub mod detail;
pub mod list;
pub mod normalize;
pub mod render;
pub mod service;

pub use detail::{Detail, PostDetail, resolve_by_slug};
pub use list::{
    ALL_CATEGORIES, BlogView, DEFAULT_PAGE_SIZE, SortOrder, ViewQuery, categories, derive_view,
    tag_universe,
};
pub use normalize::{normalize, normalize_all, normalize_tag, resolve_locale};
pub use render::{markdown_to_html, render_body, sanitize_html};
pub use service::BlogService;
