//! Derived blog list view: filter, sort, paginate.
//!
//! [`derive_view`] is a pure function of the canonical posts and a
//! [`ViewQuery`]; the same inputs always yield the same [`BlogView`].

use std::cmp::Ordering;
use std::convert::Infallible;
use std::str::FromStr;

use serde::Serialize;

use strandly_shared::Post;

/// Category key that disables the category filter.
pub const ALL_CATEGORIES: &str = "all";

/// Posts per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Sort order of the list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recent first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Alphabetical by title.
    Title,
    /// Input order.
    Unsorted,
}

impl SortOrder {
    /// Parse a sort key; unrecognized keys leave the order untouched.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "newest" => Self::Newest,
            "oldest" => Self::Oldest,
            "title" => Self::Title,
            _ => Self::Unsorted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Title => "title",
            Self::Unsorted => "unsorted",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_key(s))
    }
}

/// User-controlled list state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    /// Free-text search; empty matches everything.
    pub query: String,
    /// Category name or [`ALL_CATEGORIES`].
    pub category: String,
    /// Selected tag names (OR semantics); empty disables the tag filter.
    pub tags: Vec<String>,
    pub sort: SortOrder,
    /// 1-based page number; out-of-range values are clamped.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: ALL_CATEGORIES.to_string(),
            tags: Vec::new(),
            sort: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewQuery {
    /// Whether `post` passes the text filter.
    pub fn matches_text(&self, post: &Post) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        let contains = |field: &str| field.to_lowercase().contains(&needle);

        contains(&post.title)
            || post.summary.as_deref().is_some_and(contains)
            || post.body.as_deref().is_some_and(contains)
    }

    /// Whether `post` passes the category filter.
    pub fn matches_category(&self, post: &Post) -> bool {
        self.category == ALL_CATEGORIES || post.category.as_deref() == Some(self.category.as_str())
    }

    /// Whether `post` carries at least one selected tag.
    pub fn matches_tags(&self, post: &Post) -> bool {
        self.tags.is_empty()
            || post
                .tag_names()
                .any(|name| self.tags.iter().any(|selected| selected == name))
    }

    /// All three filters.
    pub fn matches(&self, post: &Post) -> bool {
        self.matches_text(post) && self.matches_category(post) && self.matches_tags(post)
    }
}

/// One page of the derived list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogView {
    pub items: Vec<Post>,
    /// The page actually shown, after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total_matching: usize,
}

impl BlogView {
    /// No post matched; the caller shows its "no results" state.
    pub fn is_empty(&self) -> bool {
        self.total_matching == 0
    }
}

/// Compute the list view for `query`.
pub fn derive_view(posts: &[Post], query: &ViewQuery) -> BlogView {
    let mut matching: Vec<&Post> = posts
        .iter()
        .filter(|p| p.is_listable())
        .filter(|p| query.matches(p))
        .collect();

    sort_posts(&mut matching, query.sort);

    let page_size = query.page_size.max(1);
    let total_matching = matching.len();
    let total_pages = total_matching.div_ceil(page_size);
    let page = query.page.clamp(1, total_pages.max(1));

    let items = matching
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    BlogView {
        items,
        page,
        total_pages,
        total_matching,
    }
}

/// `"all"` followed by the distinct category names, in first-seen order.
pub fn categories(posts: &[Post]) -> Vec<String> {
    let mut out = vec![ALL_CATEGORIES.to_string()];
    for name in posts
        .iter()
        .filter(|p| p.is_listable())
        .filter_map(|p| p.category.as_deref())
    {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Distinct tag names used by listable posts, in first-seen order.
pub fn tag_universe(posts: &[Post]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in posts
        .iter()
        .filter(|p| p.is_listable())
        .flat_map(|p| p.tag_names())
    {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Case-folded comparison with a raw tiebreak.
///
/// Folding is Unicode lowercase, not locale collation: accented initials
/// such as "Élan" sort after "z".
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    let fold = |s: &str| s.trim().to_lowercase();
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

fn sort_posts(posts: &mut [&Post], order: SortOrder) {
    match order {
        SortOrder::Newest => posts.sort_by(|a, b| sort_instant(b).cmp(&sort_instant(a))),
        SortOrder::Oldest => posts.sort_by_key(|p| sort_instant(p)),
        SortOrder::Title => posts.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortOrder::Unsorted => {}
    }
}

/// Publication instant in millis; unparseable timestamps sort earliest.
fn sort_instant(post: &Post) -> i64 {
    post.published_instant()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(i64::MIN)
}
