//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod selection;
pub mod view;

pub use arena::{SubjectEntry, TaxonomyArena, TaxonomyDocument};
pub use entities::*;
pub use error::DomainError;
pub use selection::{
    DeselectKind, Deselection, FetchTicket, SelectOutcome, SelectionState, DEFAULT_DEPTH,
};
pub use view::filter_and_sort;
