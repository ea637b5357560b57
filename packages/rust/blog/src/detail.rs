//! Single-post lookup by slug.

use serde::Serialize;

use strandly_shared::Post;

use crate::render::render_body;

/// A resolved post with its rendered body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub post: Post,
    /// Sanitized HTML; empty when the post has no body.
    pub html: String,
}

/// Outcome of a slug lookup. Not-found is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    Found(PostDetail),
    NotFound,
}

impl Detail {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_found(self) -> Option<PostDetail> {
        match self {
            Self::Found(detail) => Some(detail),
            Self::NotFound => None,
        }
    }
}

/// First post whose slug equals `slug` exactly (case-sensitive).
pub fn resolve_by_slug(posts: &[Post], slug: &str) -> Detail {
    if slug.is_empty() {
        return Detail::NotFound;
    }

    match posts.iter().find(|p| p.slug == slug) {
        Some(post) => Detail::Found(PostDetail {
            html: post.body.as_deref().map(render_body).unwrap_or_default(),
            post: post.clone(),
        }),
        None => Detail::NotFound,
    }
}
