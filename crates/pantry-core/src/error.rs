//! Errors shared by the ledger and the consumption transaction.
//!
//! Operations on ids that no longer exist are not errors at all; they are
//! reported as no-ops by the individual operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PantryError {
    /// Rejected at the boundary, before any state change.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The store raised an error.
    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl PantryError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
