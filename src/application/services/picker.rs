//! Subject picker service
//!
//! Wraps a [`SelectionState`] with its collaborators: the taxonomy source that feeds
//! the tier lists, the save sink that receives the selected set after each change,
//! and the analytics sink that records user actions.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{
    Deselection, DomainError, FetchTicket, SelectOutcome, SelectedSet, SelectionState,
    TaxonomyNode, TaxonomyPath, DEFAULT_DEPTH,
};
use crate::infrastructure::traits::{AnalyticsEvent, AnalyticsSink, SaveSink, TaxonomySource};

/// Host-supplied picker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOptions {
    pub depth: usize,
    /// Editing an existing item rather than submitting a new one (analytics label only)
    pub edit_mode: bool,
    pub label_prefix: String,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            edit_mode: false,
            label_prefix: "Preprints".to_string(),
        }
    }
}

/// Result of a children request, tagged with the ticket it answers.
pub struct FetchResponse {
    pub ticket: FetchTicket,
    pub result: io::Result<Vec<TaxonomyNode>>,
}

/// Detached children request; owns everything it needs and may be spawned.
pub type FetchTask = Pin<Box<dyn Future<Output = FetchResponse> + Send>>;

/// State change of a select together with its save result.
#[derive(Debug)]
pub struct SelectStep {
    pub outcome: SelectOutcome,
    pub saved: ApplicationResult<()>,
}

impl SelectStep {
    /// Children request the select left outstanding.
    pub fn ticket(&self) -> Option<&FetchTicket> {
        match &self.outcome {
            SelectOutcome::Updated { fetch, .. } => fetch.as_ref(),
            SelectOutcome::Unchanged => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum UserAction {
    Add,
    Remove,
}

pub struct PickerService {
    state: SelectionState,
    options: PickerOptions,
    source: Arc<dyn TaxonomySource>,
    save: Arc<dyn SaveSink>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl PickerService {
    /// Create a picker seeded with `initial`. Nothing is fetched yet.
    pub fn new(
        options: PickerOptions,
        initial: SelectedSet,
        source: Arc<dyn TaxonomySource>,
        save: Arc<dyn SaveSink>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> ApplicationResult<Self> {
        let state = SelectionState::new(options.depth, initial)?;
        Ok(Self {
            state,
            options,
            source,
            save,
            analytics,
        })
    }

    /// Create a picker and load the tier-1 subjects.
    pub async fn open(
        options: PickerOptions,
        initial: SelectedSet,
        source: Arc<dyn TaxonomySource>,
        save: Arc<dyn SaveSink>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> ApplicationResult<Self> {
        let mut picker = Self::new(options, initial, source, save, analytics)?;
        picker.load_roots().await;
        Ok(picker)
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected(&self) -> &SelectedSet {
        self.state.selected()
    }

    pub fn options(&self) -> &PickerOptions {
        &self.options
    }

    pub fn set_filter(&mut self, tier: usize, text: impl Into<String>) -> ApplicationResult<()> {
        Ok(self.state.set_filter(tier, text)?)
    }

    /// (Re)load the tier-1 list. Returns whether a list was applied.
    pub async fn load_roots(&mut self) -> bool {
        let ticket = self.state.request_roots();
        self.run_fetch(ticket).await
    }

    /// Select `node` at `tier`, save, then load the next tier's children.
    ///
    /// The children are loaded even when the save fails; the save error is
    /// returned afterwards.
    #[instrument(skip(self, node), fields(node = %node.id))]
    pub async fn select(
        &mut self,
        node: &TaxonomyNode,
        tier: usize,
    ) -> ApplicationResult<SelectOutcome> {
        let step = self.begin_select(node, tier)?;
        if let Some(ticket) = step.ticket().cloned() {
            self.run_fetch(ticket).await;
        }
        step.saved?;
        Ok(step.outcome)
    }

    /// Synchronous half of [`select`](Self::select): state change and save.
    ///
    /// Fails only when the state rejects the selection. The returned ticket, if
    /// any, is still outstanding whatever the save result; pass it to
    /// [`fetch_task`](Self::fetch_task) and hand the response to
    /// [`deliver`](Self::deliver).
    pub fn begin_select(
        &mut self,
        node: &TaxonomyNode,
        tier: usize,
    ) -> ApplicationResult<SelectStep> {
        self.track(UserAction::Add);
        let outcome = self.state.select(node, tier)?;
        let saved = match outcome {
            SelectOutcome::Updated { .. } => self.persist(),
            SelectOutcome::Unchanged => Ok(()),
        };
        if let Err(e) = &saved {
            warn!("selection changed but not saved: {}", e);
        }
        Ok(SelectStep { outcome, saved })
    }

    /// Remove or shorten a selected path and save. Unknown paths are a no-op.
    #[instrument(skip(self, path), fields(path = %path))]
    pub fn deselect(&mut self, path: &TaxonomyPath) -> ApplicationResult<Option<Deselection>> {
        self.track(UserAction::Remove);
        let deselection = self.state.deselect(path);
        match deselection {
            Some(_) => self.persist()?,
            None => debug!("path not selected, ignoring"),
        }
        Ok(deselection)
    }

    /// Select a chain of subject ids, tier 1 first.
    pub async fn select_ids(&mut self, ids: &[&str]) -> ApplicationResult<()> {
        for (i, id) in ids.iter().enumerate() {
            let tier = i + 1;
            let node = self
                .state
                .displayed(tier)
                .and_then(|nodes| nodes.iter().find(|n| n.id == *id))
                .cloned()
                .ok_or_else(|| DomainError::NodeNotDisplayed {
                    id: id.to_string(),
                    tier,
                })?;
            self.select(&node, tier).await?;
        }
        Ok(())
    }

    /// Deselect the selected path whose ids are exactly `ids`.
    pub fn deselect_ids(&mut self, ids: &[&str]) -> ApplicationResult<Option<Deselection>> {
        let path = self
            .selected()
            .position_of_ids(ids)
            .map(|i| self.selected().paths()[i].clone());
        match path {
            Some(path) => self.deselect(&path),
            None => {
                debug!(?ids, "no selected path with these ids");
                Ok(None)
            }
        }
    }

    /// Detached request for the children a ticket asks for.
    pub fn fetch_task(&self, ticket: FetchTicket) -> FetchTask {
        let source = Arc::clone(&self.source);
        Box::pin(async move {
            let result = source
                .fetch_children(ticket.parent_id(), ticket.parent_tier())
                .await;
            FetchResponse { ticket, result }
        })
    }

    /// Apply a children response. Stale or failed responses leave the tier as is.
    pub fn deliver(&mut self, response: FetchResponse) -> bool {
        let FetchResponse { ticket, result } = response;
        match result {
            Ok(nodes) => self.state.receive(&ticket, nodes),
            Err(e) => {
                warn!(
                    tier = ticket.tier(),
                    parent = ?ticket.parent_id(),
                    "cannot load subjects: {}",
                    e
                );
                false
            }
        }
    }

    async fn run_fetch(&mut self, ticket: FetchTicket) -> bool {
        let response = self.fetch_task(ticket).await;
        self.deliver(response)
    }

    fn persist(&self) -> ApplicationResult<()> {
        self.save
            .save(self.state.selected())
            .with_context("save selection")
    }

    fn track(&self, action: UserAction) {
        let mode = if self.options.edit_mode { "Edit" } else { "Submit" };
        let verb = match action {
            UserAction::Add => "Add",
            UserAction::Remove => "Remove",
        };
        self.analytics.track(&AnalyticsEvent {
            category: "button".to_string(),
            action: "click".to_string(),
            label: format!("{} - {} - Discipline {}", self.options.label_prefix, mode, verb),
        });
    }
}
