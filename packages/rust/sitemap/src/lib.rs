//! `sitemap.xml` generation for the public site.
//!
//! [`render`] turns entries into XML; [`generate`] builds the entry list from
//! the static routes plus every published post fetched from the CMS.

pub mod generate;
pub mod render;

pub use generate::{SITEMAP_POSTS_ENDPOINT, collect_entries, generate, write_sitemap};
pub use render::{ChangeFreq, STATIC_ROUTES, SitemapEntry, render_sitemap};
