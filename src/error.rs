//! Crate-wide error type.
//!
//! Every variant is a contract violation by the caller, not a transient
//! condition. Nothing here is retryable; the solver treats any of these
//! during traversal as fatal for the training run.

use thiserror::Error;

use crate::hand::Action;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OclError {
    /// Deck size, raise cap, or ante out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Cards were already dealt to this hand.
    #[error("cards already dealt")]
    AlreadyDealt,

    /// An action was requested before any cards were dealt.
    #[error("cards have not been dealt yet")]
    CardsNotDealt,

    /// An action was requested on a terminal hand.
    #[error("hand is already over")]
    HandAlreadyOver,

    /// The requested action is not in the legal set for the current state.
    #[error("illegal action {action}, valid: {valid:?}")]
    IllegalAction { action: Action, valid: Vec<Action> },
}

pub type OclResult<T> = Result<T, OclError>;
