//! Bundled datasets served when every network channel has failed.
//!
//! The shapes match what the CMS returns for the blog queries, including
//! locale-keyed fields, so they run through the same normalizer.

use serde_json::json;

use strandly_shared::Envelope;

/// Collection name of the tag endpoint.
pub const TAGS_COLLECTION: &str = "post_tags";

/// Collection name of the post endpoint.
pub const POSTS_COLLECTION: &str = "posts";

/// Select the bundled dataset for an endpoint; unknown resources get an empty envelope.
///
/// Only the collection path segment decides, never the query string: post
/// queries name `tags.post_tags_id` in their field list.
pub fn dataset_for(endpoint: &str) -> Envelope {
    match collection_of(endpoint) {
        Some(TAGS_COLLECTION) => fallback_tags(),
        Some(POSTS_COLLECTION) => fallback_posts(),
        _ => Envelope::empty(),
    }
}

/// `posts` for `/items/posts?...`, `post_tags` for `/items/post_tags`.
fn collection_of(endpoint: &str) -> Option<&str> {
    let path = endpoint.split(['?', '#']).next().unwrap_or(endpoint);
    let rest = path.trim_start_matches('/').strip_prefix("items/")?;
    rest.split('/').next().filter(|c| !c.is_empty())
}

/// Placeholder posts.
pub fn fallback_posts() -> Envelope {
    to_envelope(json!({
        "data": [
            {
                "id": 1,
                "titles": {
                    "en": "Welcome to Strandly: your Afro hair journey starts here",
                    "de": "Willkommen bei Strandly: Ihre Afro-Haar-Reise beginnt hier",
                    "fr": "Bienvenue chez Strandly : votre parcours capillaire afro commence ici"
                },
                "slugs": {
                    "en": "welcome-to-strandly",
                    "de": "willkommen-bei-strandly",
                    "fr": "bienvenue-chez-strandly"
                },
                "content": {
                    "en": "Discover the beauty of Afro hair with Strandly. We connect you with professional stylists across Europe who understand your hair texture.",
                    "de": "Entdecken Sie die Schönheit von Afro-Haar mit Strandly. Wir verbinden Sie mit professionellen Stylisten in ganz Europa."
                },
                "featured_image": "/placeholder.svg",
                "meta_description": {
                    "en": "Join Strandly and find professional Afro hair stylists across Europe."
                },
                "author": { "first_name": "Strandly", "last_name": "Team" },
                "published_at": "2024-01-01T00:00:00Z",
                "category": { "name": "Welcome" },
                "tags": []
            },
            {
                "id": 2,
                "titles": {
                    "en": "The art of Afro hair styling in Europe",
                    "de": "Die Kunst des Afro-Haar-Stylings in Europa"
                },
                "slugs": {
                    "en": "art-of-afro-hair-styling-europe",
                    "de": "kunst-afro-haar-styling-europa"
                },
                "content": {
                    "en": "From London to Berlin and Paris to Amsterdam, see how our stylists bring out the best in natural hair."
                },
                "featured_image": "/placeholder.svg",
                "meta_description": {
                    "en": "Afro hair styling traditions across Europe and the stylists who carry them on."
                },
                "author": { "first_name": "Strandly", "last_name": "Team" },
                "published_at": "2024-01-02T00:00:00Z",
                "category": { "name": "Styling" },
                "tags": []
            }
        ],
        "meta": { "total_count": 2 }
    }))
}

/// Placeholder tags.
pub fn fallback_tags() -> Envelope {
    to_envelope(json!({
        "data": [
            { "id": 1, "name": "Hair Care" },
            { "id": 2, "name": "Styling" },
            { "id": 3, "name": "Natural Hair" },
            { "id": 4, "name": "Professional Tips" }
        ],
        "meta": { "total_count": 4 }
    }))
}

fn to_envelope(value: serde_json::Value) -> Envelope {
    serde_json::from_value(value).unwrap_or_else(|_| Envelope::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Same shapes as the blog list and detail queries.
    const POSTS_QUERY: &str = "/items/posts?filter[titles][_nnull]=true&fields=id,titles,slugs,content,featured_image,tags.post_tags_id.name,meta_description,author.first_name,author.last_name,published_at,category.name";
    const SLUG_QUERY: &str = "/items/posts?filter[slugs][_eq]=welcome-to-strandly&fields=*,author.first_name,author.last_name,category.name,tags.post_tags_id.name,titles";

    #[test]
    fn posts_endpoint_selects_posts() {
        let env = dataset_for(POSTS_QUERY);
        assert_eq!(env.data.len(), 2);
        assert_eq!(env.total_count(), 2);
        assert!(env.data[0].get("titles").is_some());
    }

    #[test]
    fn slug_query_naming_tag_fields_still_selects_posts() {
        let env = dataset_for(SLUG_QUERY);
        assert_eq!(env.data.len(), 2);
        assert!(env.data.iter().all(|row| row.get("slugs").is_some()));
    }

    #[test]
    fn tags_endpoint_selects_tags() {
        let env = dataset_for("/items/post_tags");
        assert_eq!(env.data.len(), 4);
        assert_eq!(env.data[0]["name"], "Hair Care");

        let env = dataset_for("/items/post_tags?fields=id,name");
        assert_eq!(env.data.len(), 4);
    }

    #[test]
    fn collection_is_the_first_segment_after_items() {
        assert_eq!(collection_of("/items/posts/7?fields=*"), Some("posts"));
        assert_eq!(collection_of("items/post_tags"), Some("post_tags"));
        assert_eq!(collection_of("/files/abc"), None);
        assert_eq!(collection_of("/items/"), None);
    }

    #[test]
    fn unknown_endpoint_is_empty() {
        let env = dataset_for("/items/waitlist");
        assert!(env.data.is_empty());
        assert_eq!(env.total_count(), 0);

        assert!(dataset_for("/server/info?q=posts").data.is_empty());
    }
}
