//! Filtered and sorted views over a tier's displayed list

use crate::domain::TaxonomyNode;

/// Case-insensitive substring filter on node text, then a stable ascending sort by text.
///
/// Returns references into `nodes`; the list itself is never reordered.
pub fn filter_and_sort<'a>(nodes: &'a [TaxonomyNode], filter: &str) -> Vec<&'a TaxonomyNode> {
    let needle = filter.to_lowercase();
    let mut view: Vec<&TaxonomyNode> = nodes
        .iter()
        .filter(|n| needle.is_empty() || n.text.to_lowercase().contains(&needle))
        .collect();
    view.sort_by(|a, b| a.text.cmp(&b.text));
    view
}
