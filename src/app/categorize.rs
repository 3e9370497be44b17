//! Category buckets over a listing pass
//!
//! Pure, derived state: rebuilt wholesale on every pass, never persisted.

use std::collections::{BTreeMap, BTreeSet};

use crate::app::models::Asset;
use crate::constants::ident;

/// Category for an identifier from its path structure
///
/// First path segment when the identifier contains a separator, else the
/// fixed uncategorized bucket.
pub fn category_for_identifier(identifier: &str) -> String {
    match identifier.split_once('/') {
        Some((first, _)) if !first.is_empty() => first.to_string(),
        _ => ident::UNCATEGORIZED.to_string(),
    }
}

/// Partition assets into named buckets
///
/// Every asset lands in the bucket its lister assigned (path segment for
/// WebDAV listings, heading for page listings) and in the `all` bucket.
/// Deterministic for a given asset sequence.
pub fn categorize(assets: &[Asset]) -> BTreeMap<String, BTreeSet<String>> {
    let mut buckets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    buckets.insert(ident::ALL_BUCKET.to_string(), BTreeSet::new());

    for asset in assets {
        buckets
            .get_mut(ident::ALL_BUCKET)
            .expect("all bucket inserted above")
            .insert(asset.identifier.clone());
        buckets
            .entry(asset.category.clone())
            .or_default()
            .insert(asset.identifier.clone());
    }

    buckets
}
