//! Arena-backed taxonomy tree.
//!
//! Built once from a [`TaxonomyDocument`] and queried by parent id, the way a remote
//! taxonomy endpoint is queried with a `parents` filter.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use termtree::Tree;
use tracing::instrument;

use crate::domain::error::DomainError;
use crate::domain::TaxonomyNode;

/// Serialized taxonomy: nested subjects, tier 1 at the top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyDocument {
    #[serde(default, rename = "subject")]
    pub subjects: Vec<SubjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEntry {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SubjectEntry>,
}

/// Tree node in the arena.
#[derive(Debug)]
pub struct TaxonomyEntry {
    pub node: TaxonomyNode,
    /// 1-based tier of this node
    pub tier: usize,
    pub parent: Option<Index>,
    pub children: Vec<Index>,
}

/// Forest of taxonomy subjects with O(1) lookup by id.
#[derive(Debug, Default)]
pub struct TaxonomyArena {
    arena: Arena<TaxonomyEntry>,
    roots: Vec<Index>,
    by_id: HashMap<String, Index>,
}

impl TaxonomyArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena from a document. Ids must be unique across the whole taxonomy.
    pub fn from_document(doc: &TaxonomyDocument) -> Result<Self, DomainError> {
        let mut arena = Self::new();
        let mut stack: Vec<(&SubjectEntry, Option<Index>)> =
            doc.subjects.iter().rev().map(|s| (s, None)).collect();

        while let Some((entry, parent)) = stack.pop() {
            let idx = arena.insert_node(TaxonomyNode::new(&entry.id, &entry.text), parent)?;
            for child in entry.children.iter().rev() {
                stack.push((child, Some(idx)));
            }
        }
        Ok(arena)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(
        &mut self,
        node: TaxonomyNode,
        parent: Option<Index>,
    ) -> Result<Index, DomainError> {
        if self.by_id.contains_key(&node.id) {
            return Err(DomainError::DuplicateNode(node.id));
        }
        let tier = match parent {
            Some(p) => self.arena.get(p).map(|e| e.tier + 1).unwrap_or(1),
            None => 1,
        };
        let id = node.id.clone();
        let idx = self.arena.insert(TaxonomyEntry {
            node,
            tier,
            parent,
            children: Vec::new(),
        });

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(idx),
            None => self.roots.push(idx),
        }
        self.by_id.insert(id, idx);
        Ok(idx)
    }

    pub fn get(&self, idx: Index) -> Option<&TaxonomyEntry> {
        self.arena.get(idx)
    }

    pub fn find(&self, id: &str) -> Option<&TaxonomyEntry> {
        self.by_id.get(id).and_then(|&idx| self.arena.get(idx))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Tier-1 subjects in document order.
    pub fn roots(&self) -> Vec<&TaxonomyNode> {
        self.nodes_at(&self.roots)
    }

    /// Children of the subject `id`, in document order.
    pub fn children_of(&self, id: &str) -> Result<Vec<&TaxonomyNode>, DomainError> {
        let entry = self
            .find(id)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()))?;
        Ok(self.nodes_at(&entry.children))
    }

    /// Number of tiers in the deepest branch.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.arena.iter().map(|(_, e)| e.tier).max().unwrap_or(0)
    }

    /// Render the forest as a tree under a single label.
    pub fn to_tree(&self, label: &str) -> Tree<String> {
        fn build(arena: &TaxonomyArena, idx: Index) -> Option<Tree<String>> {
            let entry = arena.get(idx)?;
            let leaves: Vec<_> = entry
                .children
                .iter()
                .filter_map(|&child| build(arena, child))
                .collect();
            Some(Tree::new(format!("{} [{}]", entry.node.text, entry.node.id)).with_leaves(leaves))
        }

        let leaves: Vec<_> = self.roots.iter().filter_map(|&r| build(self, r)).collect();
        Tree::new(label.to_string()).with_leaves(leaves)
    }

    fn nodes_at(&self, indices: &[Index]) -> Vec<&TaxonomyNode> {
        indices
            .iter()
            .filter_map(|&idx| self.arena.get(idx).map(|e| &e.node))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> TaxonomyDocument {
        toml::from_str(
            r#"
[[subject]]
id = "bio"
text = "Biology"

  [[subject.children]]
  id = "gen"
  text = "Genetics"

    [[subject.children.children]]
    id = "epi"
    text = "Epigenetics"

[[subject]]
id = "phy"
text = "Physics"
"#,
        )
        .unwrap()
    }

    #[test]
    fn given_nested_document_when_building_then_tiers_and_children_match() {
        let arena = TaxonomyArena::from_document(&doc()).unwrap();
        assert_eq!(arena.len(), 4);
        assert_eq!(arena.depth(), 3);
        let roots: Vec<_> = arena.roots().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(roots, vec!["bio", "phy"]);
        let children: Vec<_> = arena
            .children_of("gen")
            .unwrap()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(children, vec!["epi"]);
        assert_eq!(arena.find("epi").unwrap().tier, 3);
        assert!(arena.children_of("phy").unwrap().is_empty());
    }

    #[test]
    fn given_duplicate_id_when_building_then_error() {
        let mut doc = doc();
        doc.subjects.push(SubjectEntry {
            id: "gen".into(),
            text: "Again".into(),
            children: vec![],
        });
        assert_eq!(
            TaxonomyArena::from_document(&doc).unwrap_err(),
            DomainError::DuplicateNode("gen".into())
        );
    }

    #[test]
    fn given_unknown_parent_when_querying_then_error() {
        let arena = TaxonomyArena::from_document(&doc()).unwrap();
        assert!(matches!(
            arena.children_of("nope"),
            Err(DomainError::UnknownNode(_))
        ));
    }

    #[test]
    fn given_arena_when_rendering_then_tree_contains_all_subjects() {
        let arena = TaxonomyArena::from_document(&doc()).unwrap();
        let rendered = arena.to_tree("taxonomy").to_string();
        assert!(rendered.starts_with("taxonomy"));
        assert!(rendered.contains("Epigenetics [epi]"));
        assert!(rendered.contains("Physics [phy]"));
    }
}
