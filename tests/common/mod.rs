//! Shared fixtures: a small three-tier taxonomy and recording collaborators.
#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use taxpick::domain::{SelectedSet, TaxonomyNode, TaxonomyPath};
use taxpick::infrastructure::traits::{AnalyticsEvent, AnalyticsSink, SaveSink, TaxonomySource};

/// agriculture
///   botany
///     cell biology, dendrology
///   entomology
///     forensic entomology
/// physics
///   optics
///     lasers
pub const TAXONOMY_TOML: &str = r#"
[[subject]]
id = "a"
text = "Agriculture"

  [[subject.children]]
  id = "b"
  text = "Botany"

    [[subject.children.children]]
    id = "c"
    text = "Cell Biology"

    [[subject.children.children]]
    id = "d"
    text = "Dendrology"

  [[subject.children]]
  id = "e"
  text = "Entomology"

    [[subject.children.children]]
    id = "f"
    text = "Forensic Entomology"

[[subject]]
id = "x"
text = "Physics"

  [[subject.children]]
  id = "y"
  text = "Optics"

    [[subject.children.children]]
    id = "z"
    text = "Lasers"
"#;

pub fn n(id: &str) -> TaxonomyNode {
    let text = match id {
        "a" => "Agriculture",
        "b" => "Botany",
        "c" => "Cell Biology",
        "d" => "Dendrology",
        "e" => "Entomology",
        "f" => "Forensic Entomology",
        "x" => "Physics",
        "y" => "Optics",
        "z" => "Lasers",
        other => other,
    };
    TaxonomyNode::new(id, text)
}

pub fn path(ids: &[&str]) -> TaxonomyPath {
    TaxonomyPath::new(ids.iter().map(|id| n(id)).collect())
}

pub fn set(paths: &[&[&str]]) -> SelectedSet {
    SelectedSet::from(paths.iter().map(|p| path(p)).collect::<Vec<_>>())
}

/// Children of `parent` in the fixture taxonomy.
pub fn children(parent: Option<&str>) -> Vec<TaxonomyNode> {
    let ids: &[&str] = match parent {
        None => &["a", "x"],
        Some("a") => &["b", "e"],
        Some("b") => &["c", "d"],
        Some("e") => &["f"],
        Some("x") => &["y"],
        Some("y") => &["z"],
        Some(_) => &[],
    };
    ids.iter().map(|id| n(id)).collect()
}

/// In-memory source over the fixture taxonomy.
#[derive(Default)]
pub struct MemorySource {
    calls: AtomicUsize,
    failing: HashSet<String>,
    requests: Mutex<Vec<(Option<String>, usize)>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that fails every request for the given parents.
    pub fn failing_for(parents: &[&str]) -> Self {
        Self {
            failing: parents.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(Option<String>, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaxonomySource for MemorySource {
    async fn fetch_children(
        &self,
        parent_id: Option<&str>,
        tier: usize,
    ) -> io::Result<Vec<TaxonomyNode>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((parent_id.map(str::to_string), tier));
        if parent_id.is_some_and(|p| self.failing.contains(p)) {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "backend down"));
        }
        Ok(children(parent_id))
    }
}

/// Save sink that keeps every saved snapshot.
#[derive(Default)]
pub struct RecordingSink {
    saves: Mutex<Vec<SelectedSet>>,
}

impl RecordingSink {
    pub fn saves(&self) -> Vec<SelectedSet> {
        self.saves.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

impl SaveSink for RecordingSink {
    fn save(&self, selected: &SelectedSet) -> io::Result<()> {
        self.saves.lock().unwrap().push(selected.clone());
        Ok(())
    }
}

/// Analytics sink that keeps every event.
#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingAnalytics {
    pub fn labels(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.label.clone())
            .collect()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn track(&self, event: &AnalyticsEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Ids of a node list, for compact assertions.
pub fn ids(nodes: Option<&[TaxonomyNode]>) -> Option<Vec<String>> {
    nodes.map(|ns| ns.iter().map(|n| n.id.clone()).collect())
}

/// Save sink whose every save fails, counting the attempts.
#[derive(Default)]
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SaveSink for FailingSink {
    fn save(&self, _selected: &SelectedSet) -> io::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }
}
