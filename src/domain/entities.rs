//! Domain entities: taxonomy nodes, selected paths and the selected set

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A single subject in the taxonomy.
///
/// Identity is the `id`; two nodes fetched into different lists are the same
/// subject when their ids match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub id: String,
    pub text: String,
}

impl TaxonomyNode {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Same subject, compared by id only.
    pub fn is_same(&self, other: &TaxonomyNode) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for TaxonomyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Compare two optional nodes by id. Two `None`s are the same.
pub fn same_node(a: Option<&TaxonomyNode>, b: Option<&TaxonomyNode>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.is_same(b),
        (None, None) => true,
        _ => false,
    }
}

/// Ordered list of nodes from tier 1 downwards.
/// Element `i` is a child of element `i - 1` in the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonomyPath(Vec<TaxonomyNode>);

impl TaxonomyPath {
    pub fn new(nodes: Vec<TaxonomyNode>) -> Self {
        Self(nodes)
    }

    pub fn nodes(&self) -> &[TaxonomyNode] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Node at 1-based `tier`.
    pub fn at_tier(&self, tier: usize) -> Option<&TaxonomyNode> {
        tier.checked_sub(1).and_then(|i| self.0.get(i))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|n| n.id.as_str()).collect()
    }

    /// True if the first `prefix.len()` nodes match `prefix` by id.
    /// A path starts with itself; an empty prefix matches everything.
    pub fn starts_with(&self, prefix: &[TaxonomyNode]) -> bool {
        prefix.len() <= self.0.len() && self.0.iter().zip(prefix).all(|(a, b)| a.is_same(b))
    }

    /// Same length and same ids, element-wise.
    pub fn is_exactly(&self, nodes: &[TaxonomyNode]) -> bool {
        self.0.len() == nodes.len() && self.starts_with(nodes)
    }

    /// `self` is a prefix of `other` and shorter than it.
    pub fn is_strict_prefix_of(&self, other: &TaxonomyPath) -> bool {
        self.0.len() < other.0.len() && other.starts_with(&self.0)
    }

    pub fn extend_from(&mut self, suffix: &[TaxonomyNode]) {
        self.0.extend_from_slice(suffix);
    }

    pub fn pop(&mut self) -> Option<TaxonomyNode> {
        self.0.pop()
    }
}

impl From<Vec<TaxonomyNode>> for TaxonomyPath {
    fn from(nodes: Vec<TaxonomyNode>) -> Self {
        Self(nodes)
    }
}

impl fmt::Display for TaxonomyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().map(|n| n.text.as_str()).join(" > "))
    }
}

/// What a merge did to the selected set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// A deeper selection already covers the candidate; nothing changed.
    Subsumed,
    /// The existing entry at `index` was extended to the candidate.
    Extended { index: usize },
    /// The candidate was appended as a new entry at `index`.
    Appended { index: usize },
}

/// Insertion-ordered set of selected paths.
///
/// No path in the set is a strict prefix of another one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectedSet(Vec<TaxonomyPath>);

impl SelectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> &[TaxonomyPath] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaxonomyPath> {
        self.0.iter()
    }

    /// Index of the entry equal (by ids) to `path`.
    pub fn position(&self, path: &TaxonomyPath) -> Option<usize> {
        self.0.iter().position(|p| p.is_exactly(path.nodes()))
    }

    /// Index of the entry whose ids are exactly `ids`.
    pub fn position_of_ids(&self, ids: &[&str]) -> Option<usize> {
        self.0.iter().position(|p| p.ids() == ids)
    }

    /// True if no entry is a strict prefix of another and none are duplicates.
    pub fn is_prefix_free(&self) -> bool {
        self.0.iter().enumerate().all(|(i, a)| {
            self.0
                .iter()
                .enumerate()
                .all(|(j, b)| i == j || !(a.is_strict_prefix_of(b) || a.is_exactly(b.nodes())))
        })
    }

    /// Merge a freshly built candidate path into the set.
    ///
    /// With `check_subsumed`, an entry that already extends the candidate wins and
    /// the set is left alone. Otherwise the shortest entry equal to a prefix of the
    /// candidate is extended in place, or the candidate is appended.
    pub fn merge(&mut self, candidate: TaxonomyPath, check_subsumed: bool) -> Merge {
        if check_subsumed && self.0.iter().any(|p| p.starts_with(candidate.nodes())) {
            return Merge::Subsumed;
        }

        for end in 1..=candidate.len() {
            let prefix = &candidate.nodes()[..end];
            if let Some(index) = self.0.iter().position(|p| p.is_exactly(prefix)) {
                self.0[index].extend_from(&candidate.nodes()[end..]);
                return Merge::Extended { index };
            }
        }

        self.0.push(candidate);
        Merge::Appended {
            index: self.0.len() - 1,
        }
    }

    pub(crate) fn remove(&mut self, index: usize) -> TaxonomyPath {
        self.0.remove(index)
    }

    /// Drop the last node of the entry at `index`, returning it.
    pub(crate) fn truncate_entry(&mut self, index: usize) -> Option<TaxonomyNode> {
        self.0.get_mut(index).and_then(TaxonomyPath::pop)
    }
}

impl From<Vec<TaxonomyPath>> for SelectedSet {
    fn from(paths: Vec<TaxonomyPath>) -> Self {
        Self(paths)
    }
}

impl<'a> IntoIterator for &'a SelectedSet {
    type Item = &'a TaxonomyPath;
    type IntoIter = std::slice::Iter<'a, TaxonomyPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
