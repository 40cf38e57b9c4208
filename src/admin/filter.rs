//! In-memory search over already-loaded records.

use crate::models::{Bird, Entity};

/// Pseudo-tag that disables tag filtering in the gallery.
pub const ALL_TAGS: &str = "All";

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Records whose admin search fields contain `query`, ignoring case. A blank
/// query keeps everything.
pub fn filter_records<'a, E: Entity>(items: &'a [E], query: &str) -> Vec<&'a E> {
    let needle = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| {
            needle.is_empty()
                || item
                    .search_fields()
                    .into_iter()
                    .any(|field| contains_folded(field, &needle))
        })
        .collect()
}

/// Gallery view: the name fields must contain `query` and, unless `tag` is
/// absent or [`ALL_TAGS`], the bird must carry exactly that tag.
pub fn gallery_filter<'a>(birds: &'a [Bird], query: &str, tag: Option<&str>) -> Vec<&'a Bird> {
    let needle = query.trim().to_lowercase();
    let tag = tag.filter(|tag| *tag != ALL_TAGS);
    birds
        .iter()
        .filter(|bird| {
            [&bird.english_name, &bird.local_name, &bird.scientific_name]
                .into_iter()
                .any(|name| contains_folded(name, &needle))
        })
        .filter(|bird| tag.map_or(true, |tag| bird.tags.iter().any(|t| t == tag)))
        .collect()
}

/// Tag choices for the gallery: [`ALL_TAGS`] followed by every tag in the
/// order it first appears.
pub fn collect_tags(birds: &[Bird]) -> Vec<String> {
    let mut tags = vec![ALL_TAGS.to_string()];
    for tag in birds.iter().flat_map(|bird| &bird.tags) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}
