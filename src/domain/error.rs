//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent selection and taxonomy rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("tier {tier} out of range (depth {depth})")]
    TierOutOfRange { tier: usize, depth: usize },

    #[error("taxonomy depth must be at least 1")]
    InvalidDepth,

    #[error("node {id} is not displayed at tier {tier}")]
    NodeNotDisplayed { id: String, tier: usize },

    #[error("no node highlighted above tier {tier}")]
    IncompletePath { tier: usize },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("duplicate taxonomy node: {0}")]
    DuplicateNode(String),

    #[error("unknown taxonomy node: {0}")]
    UnknownNode(String),
}
