//! Interactive browse loop over a picker
//!
//! Each round shows every displayed tier (filtered and sorted) plus one removal entry
//! per selected path, and applies whatever the user picks.

use tracing::{debug, info, warn};

use crate::application::services::PickerService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{TaxonomyNode, TaxonomyPath};
use crate::infrastructure::traits::{SelectionItem, Selector};

const PROMPT: &str = "subject> ";

/// What a menu entry does when chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Select { tier: usize, node: TaxonomyNode },
    Deselect(TaxonomyPath),
    Done,
}

pub struct PickerSession<'a> {
    picker: &'a mut PickerService,
    selector: &'a dyn Selector,
}

impl<'a> PickerSession<'a> {
    pub fn new(picker: &'a mut PickerService, selector: &'a dyn Selector) -> Self {
        Self { picker, selector }
    }

    /// Current menu. Item values are indices into the returned list.
    pub fn menu(&self) -> Vec<(SelectionItem, MenuAction)> {
        let state = self.picker.state();
        let mut entries = Vec::new();

        for tier in 1..=state.depth() {
            let current = state.highlighted(tier);
            for node in state.view(tier) {
                let marker = if current.is_some_and(|h| h.is_same(node)) {
                    '>'
                } else {
                    ' '
                };
                entries.push((
                    format!(
                        "{}{} {} ({})",
                        "  ".repeat(tier - 1),
                        marker,
                        node.text,
                        node.id
                    ),
                    MenuAction::Select {
                        tier,
                        node: node.clone(),
                    },
                ));
            }
        }

        for path in state.selected() {
            entries.push((
                format!("remove: {}", path),
                MenuAction::Deselect(path.clone()),
            ));
        }
        entries.push(("done".to_string(), MenuAction::Done));

        entries
            .into_iter()
            .enumerate()
            .map(|(i, (display, action))| {
                (
                    SelectionItem {
                        display,
                        value: i.to_string(),
                    },
                    action,
                )
            })
            .collect()
    }

    /// Run until the user picks "done" or cancels. Returns the number of applied actions.
    pub async fn run(&mut self) -> ApplicationResult<usize> {
        let mut applied = 0;
        loop {
            let menu = self.menu();
            let items: Vec<SelectionItem> = menu.iter().map(|(item, _)| item.clone()).collect();
            let chosen = self
                .selector
                .select_one(&items, PROMPT)
                .map_err(ApplicationError::Selector)?;

            let Some(chosen) = chosen else {
                debug!("selection cancelled");
                break;
            };
            let Some((_, action)) = menu.into_iter().find(|(item, _)| item.value == chosen.value)
            else {
                return Err(ApplicationError::Selector(format!(
                    "unknown menu entry: {}",
                    chosen.display
                )));
            };

            let result = match action {
                MenuAction::Done => break,
                MenuAction::Select { tier, node } => {
                    self.picker.select(&node, tier).await.map(|_| ())
                }
                MenuAction::Deselect(path) => self.picker.deselect(&path).map(|_| ()),
            };
            match result {
                Ok(()) => {}
                // The state already changed; keep browsing and save on the next change.
                Err(e @ ApplicationError::OperationFailed { .. }) => {
                    warn!("{}", e);
                }
                Err(e) => return Err(e),
            }
            applied += 1;
        }

        info!(
            "session finished: {} actions, {} selected",
            applied,
            self.picker.selected().len()
        );
        Ok(applied)
    }
}
