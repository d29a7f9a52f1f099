//! Selection engine: per-tier browse state and the committed selected set.
//!
//! The engine never performs I/O. Selecting a node above the deepest tier yields a
//! [`FetchTicket`]; the caller fetches the children and hands them back through
//! [`SelectionState::receive`]. Every clear of a tier bumps that tier's generation,
//! so a response for a superseded request is dropped instead of overwriting newer
//! browse state.

use tracing::{debug, trace};

use crate::domain::entities::same_node;
use crate::domain::error::DomainError;
use crate::domain::view::filter_and_sort;
use crate::domain::{Merge, SelectedSet, TaxonomyNode, TaxonomyPath};

/// Default number of taxonomy tiers.
pub const DEFAULT_DEPTH: usize = 3;

/// Identifies one outstanding children request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    tier: usize,
    parent_id: Option<String>,
    generation: u64,
}

impl FetchTicket {
    /// Tier the fetched list will be shown at (1-based).
    pub fn tier(&self) -> usize {
        self.tier
    }

    /// Tier of the parent, 0 for the roots.
    pub fn parent_tier(&self) -> usize {
        self.tier - 1
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The node was already highlighted at that tier.
    Unchanged,
    Updated {
        merge: Merge,
        fetch: Option<FetchTicket>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeselectKind {
    Removed,
    Truncated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deselection {
    pub kind: DeselectKind,
    /// First tier whose browse state was cleared; `depth + 1` clears nothing.
    pub wipe_from: usize,
}

/// Browse state and selected paths for one picker.
#[derive(Debug, Clone)]
pub struct SelectionState {
    depth: usize,
    displayed: Vec<Option<Vec<TaxonomyNode>>>,
    highlighted: Vec<Option<TaxonomyNode>>,
    generations: Vec<u64>,
    filters: Vec<String>,
    selected: SelectedSet,
}

impl SelectionState {
    pub fn new(depth: usize, initial: SelectedSet) -> Result<Self, DomainError> {
        if depth == 0 {
            return Err(DomainError::InvalidDepth);
        }
        if let Some(p) = initial.iter().find(|p| p.is_empty() || p.len() > depth) {
            return Err(DomainError::InvalidSelection(format!(
                "path of length {} with depth {}",
                p.len(),
                depth
            )));
        }
        if !initial.is_prefix_free() {
            return Err(DomainError::InvalidSelection(
                "paths must not be prefixes of each other".to_string(),
            ));
        }

        Ok(Self {
            depth,
            displayed: vec![None; depth],
            highlighted: vec![None; depth],
            generations: vec![0; depth],
            filters: vec![String::new(); depth],
            selected: initial,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn selected(&self) -> &SelectedSet {
        &self.selected
    }

    pub fn displayed(&self, tier: usize) -> Option<&[TaxonomyNode]> {
        self.slot(tier)
            .and_then(|i| self.displayed[i].as_deref())
    }

    pub fn highlighted(&self, tier: usize) -> Option<&TaxonomyNode> {
        self.slot(tier).and_then(|i| self.highlighted[i].as_ref())
    }

    pub fn filter(&self, tier: usize) -> &str {
        self.slot(tier).map(|i| self.filters[i].as_str()).unwrap_or("")
    }

    pub fn set_filter(&mut self, tier: usize, text: impl Into<String>) -> Result<(), DomainError> {
        let i = self.check_tier(tier)?;
        self.filters[i] = text.into();
        Ok(())
    }

    /// Filtered and sorted view of a tier; empty when nothing is displayed.
    pub fn view(&self, tier: usize) -> Vec<&TaxonomyNode> {
        self.displayed(tier)
            .map(|nodes| filter_and_sort(nodes, self.filter(tier)))
            .unwrap_or_default()
    }

    /// Ticket for the tier-1 list.
    pub fn request_roots(&mut self) -> FetchTicket {
        self.issue(1, None)
    }

    /// Apply a fetched list if `ticket` is still current for its tier.
    pub fn receive(&mut self, ticket: &FetchTicket, nodes: Vec<TaxonomyNode>) -> bool {
        let Some(i) = self.slot(ticket.tier) else {
            return false;
        };
        if self.generations[i] != ticket.generation {
            debug!(
                tier = ticket.tier,
                parent = ?ticket.parent_id,
                "dropping stale children response"
            );
            return false;
        }
        trace!(tier = ticket.tier, count = nodes.len(), "children received");
        self.displayed[i] = Some(nodes);
        true
    }

    /// Highlight `node` at `tier` and merge the resulting path into the selected set.
    ///
    /// `node` must be part of the tier's displayed list and every shallower tier must
    /// be highlighted. On error nothing changes.
    pub fn select(&mut self, node: &TaxonomyNode, tier: usize) -> Result<SelectOutcome, DomainError> {
        let i = self.check_tier(tier)?;
        let listed = self
            .displayed(tier)
            .and_then(|nodes| nodes.iter().find(|n| n.is_same(node)))
            .cloned()
            .ok_or_else(|| DomainError::NodeNotDisplayed {
                id: node.id.clone(),
                tier,
            })?;

        if same_node(self.highlighted[i].as_ref(), Some(&listed)) {
            return Ok(SelectOutcome::Unchanged);
        }

        let mut nodes = self.highlighted[..i]
            .iter()
            .map(|h| h.clone().ok_or(DomainError::IncompletePath { tier }))
            .collect::<Result<Vec<_>, _>>()?;
        nodes.push(listed.clone());
        let candidate = TaxonomyPath::new(nodes);

        self.highlighted[i] = Some(listed.clone());
        let merge = self.selected.merge(candidate, tier < self.depth);
        debug!(tier, id = %listed.id, ?merge, "selected");

        if tier == self.depth {
            return Ok(SelectOutcome::Updated { merge, fetch: None });
        }

        self.clear_from(tier + 1);
        let fetch = self.issue(tier + 1, Some(listed.id));
        Ok(SelectOutcome::Updated {
            merge,
            fetch: Some(fetch),
        })
    }

    /// Remove or shorten a selected path. `None` when the path is not selected.
    pub fn deselect(&mut self, path: &TaxonomyPath) -> Option<Deselection> {
        let index = self.selected.position(path)?;
        let len = path.len();
        let mut wipe_from = self.depth + 1;

        let kind = if len == 1 {
            self.selected.remove(index);
            if same_node(self.highlighted(1), path.at_tier(1)) {
                wipe_from = 2;
            }
            DeselectKind::Removed
        } else {
            let parent = &path.nodes()[..len - 1];
            let has_sibling = self
                .selected
                .iter()
                .enumerate()
                .any(|(j, p)| j != index && p.starts_with(parent));

            if has_sibling {
                self.selected.remove(index);
                // Tier 1 holds the roots and is never wiped here.
                if let Some(tier) =
                    (2..=self.depth).find(|&t| !same_node(self.highlighted(t), path.at_tier(t)))
                {
                    wipe_from = tier;
                }
                DeselectKind::Removed
            } else {
                let dropped = self.selected.truncate_entry(index);
                if dropped.is_some() && same_node(self.highlighted(len), dropped.as_ref()) {
                    wipe_from = len + 1;
                }
                DeselectKind::Truncated
            }
        };

        debug!(%path, ?kind, wipe_from, "deselected");
        self.clear_from(wipe_from);
        Some(Deselection { kind, wipe_from })
    }

    /// Null out displayed lists and highlights from `tier` down to the deepest tier.
    fn clear_from(&mut self, tier: usize) {
        for t in tier.max(1)..=self.depth {
            let i = t - 1;
            self.displayed[i] = None;
            self.highlighted[i] = None;
            self.generations[i] += 1;
        }
    }

    fn issue(&mut self, tier: usize, parent_id: Option<String>) -> FetchTicket {
        let i = tier - 1;
        self.generations[i] += 1;
        FetchTicket {
            tier,
            parent_id,
            generation: self.generations[i],
        }
    }

    fn slot(&self, tier: usize) -> Option<usize> {
        (1..=self.depth).contains(&tier).then(|| tier - 1)
    }

    fn check_tier(&self, tier: usize) -> Result<usize, DomainError> {
        self.slot(tier).ok_or(DomainError::TierOutOfRange {
            tier,
            depth: self.depth,
        })
    }
}
