//! Blog queries against the CMS through the resilient channel chain.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use strandly_content::{LatestOnly, ResilientFetcher};
use strandly_shared::{AppConfig, Post, Result, Tag};

use crate::detail::{Detail, resolve_by_slug};
use crate::list::{BlogView, ViewQuery, derive_view};
use crate::normalize::{normalize_all, normalize_tag};

/// Published posts with a title, with the fields the list page needs.
pub const POSTS_ENDPOINT: &str = "/items/posts?filter[titles][_nnull]=true&fields=id,titles,slugs,content,featured_image,tags.post_tags_id.name,meta_description,author.first_name,author.last_name,published_at,category.name";

/// Tag collection.
pub const TAGS_ENDPOINT: &str = "/items/post_tags";

/// Detail query for one slug (CMS-side filter, resolved again locally).
pub fn post_by_slug_endpoint(slug: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(slug.as_bytes()).collect();
    format!(
        "/items/posts?filter[slugs][_eq]={encoded}&fields=*,author.first_name,author.last_name,category.name,tags.post_tags_id.name,titles"
    )
}

/// Blog data access: fetch, normalize, derive.
pub struct BlogService {
    fetcher: ResilientFetcher,
    page_size: usize,
    latest: LatestOnly,
}

impl BlogService {
    pub fn new(fetcher: ResilientFetcher, page_size: usize) -> Self {
        Self {
            fetcher,
            page_size: page_size.max(1),
            latest: LatestOnly::new(),
        }
    }

    /// Service using the configured channel chain and page size.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = ResilientFetcher::from_config(config)?;
        Ok(Self::new(fetcher, config.blog.page_size))
    }

    /// A default query carrying the configured page size.
    pub fn query(&self) -> ViewQuery {
        ViewQuery {
            page_size: self.page_size,
            ..Default::default()
        }
    }

    /// All posts, normalized, in CMS order.
    #[instrument(skip(self))]
    pub async fn posts(&self) -> Result<Vec<Post>> {
        let fetched = self.fetcher.fetch(POSTS_ENDPOINT).await?;
        let posts = normalize_all(&fetched.envelope);
        info!(count = posts.len(), channel = %fetched.channel, "loaded posts");
        Ok(posts)
    }

    /// All well-formed tags.
    #[instrument(skip(self))]
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        let fetched = self.fetcher.fetch(TAGS_ENDPOINT).await?;
        let tags: Vec<Tag> = fetched.envelope.data.iter().filter_map(normalize_tag).collect();
        debug!(count = tags.len(), channel = %fetched.channel, "loaded tags");
        Ok(tags)
    }

    /// Fetch posts and derive one page of the list view.
    pub async fn view(&self, query: &ViewQuery) -> Result<BlogView> {
        let posts = self.posts().await?;
        Ok(derive_view(&posts, query))
    }

    /// Like [`view`](Self::view), but a newer call supersedes this one.
    ///
    /// Returns `None` when superseded, so a stale result never replaces a
    /// newer one.
    pub async fn view_latest(self: &Arc<Self>, query: ViewQuery) -> Option<Result<BlogView>> {
        let service = Arc::clone(self);
        self.latest
            .run(async move { service.view(&query).await })
            .await
    }

    /// Resolve one post by slug.
    ///
    /// Channel exhaustion is an error; no matching post is `Ok(Detail::NotFound)`.
    #[instrument(skip(self))]
    pub async fn post_by_slug(&self, slug: &str) -> Result<Detail> {
        let fetched = self.fetcher.fetch(&post_by_slug_endpoint(slug)).await?;
        let posts = normalize_all(&fetched.envelope);
        let detail = resolve_by_slug(&posts, slug);
        debug!(found = detail.is_found(), channel = %fetched.channel, "resolved slug");
        Ok(detail)
    }
}
