//! Meal-planning wizard.
//!
//! Walks every `(day, meal slot)` step of a [`WizardConfig`], asking the
//! suggestion service for candidates at each step and recording the user's
//! pick. The session is an explicit value passed to each transition; nothing
//! is persisted and nothing is consumed until a finished plan entry is cooked.

pub mod session;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consumption::{ConsumptionReceipt, ConsumptionTransaction};
use crate::error::PantryError;
use crate::ledger::InventoryLedger;
use crate::suggest::{RecipeSuggestionService, SuggestError};

pub use session::{PlanEntry, WizardConfig, WizardSession, WizardState, WizardStep, step_label};

#[derive(Debug, Error)]
pub enum WizardError {
    /// Rejected before the session changed.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cannot {action} while the wizard is {from}")]
    InvalidTransition {
        from: WizardState,
        action: &'static str,
    },

    /// The suggestion service failed. The session is now in `Error` and can
    /// be retried.
    #[error("recipe suggestion failed: {0}")]
    Collaborator(#[from] SuggestError),

    #[error("store error: {0:#}")]
    Store(anyhow::Error),
}

impl From<PantryError> for WizardError {
    fn from(err: PantryError) -> Self {
        match err {
            PantryError::Validation(msg) => Self::Validation(msg),
            PantryError::Store(e) => Self::Store(e),
        }
    }
}

fn invalid(session: &WizardSession, action: &'static str) -> WizardError {
    WizardError::InvalidTransition {
        from: session.state().clone(),
        action,
    }
}

/// The wizard state machine.
///
/// Enforces the transition graph:
///
/// ```text
/// configuring        -> generating_options   (start)
/// generating_options -> awaiting_selection   (options received)
/// generating_options -> error                (suggestion failed)
/// awaiting_selection -> generating_options   (select, more steps left;
///                                             or re-request after zero options)
/// awaiting_selection -> complete             (select, last step)
/// error              -> generating_options   (retry)
/// *                  -> configuring          (reset)
/// ```
#[derive(Clone)]
pub struct WizardStateMachine {
    ledger: InventoryLedger,
    suggester: Arc<dyn RecipeSuggestionService>,
}

impl std::fmt::Debug for WizardStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardStateMachine").finish_non_exhaustive()
    }
}

impl WizardStateMachine {
    pub fn new(ledger: InventoryLedger, suggester: Arc<dyn RecipeSuggestionService>) -> Self {
        Self { ledger, suggester }
    }

    /// Check whether `from -> to` is an edge in the state graph.
    pub fn is_valid_transition(from: &WizardState, to: &WizardState) -> bool {
        use WizardState::*;
        matches!(
            (from, to),
            (Configuring, GeneratingOptions)
                | (GeneratingOptions, AwaitingSelection)
                | (GeneratingOptions, Error { .. })
                | (AwaitingSelection, GeneratingOptions)
                | (AwaitingSelection, Complete)
                | (Error { .. }, GeneratingOptions)
                | (_, Configuring)
        )
    }

    /// Begin planning: `configuring -> generating_options`.
    ///
    /// Fails with `Validation` on a bad config or an empty pantry, leaving
    /// the session in `Configuring`.
    pub async fn start(&self, session: &mut WizardSession) -> Result<(), WizardError> {
        if session.state() != &WizardState::Configuring {
            return Err(invalid(session, "start"));
        }
        session.config().validate()?;

        let snapshot = self.ledger.list_for(session.owner_id()).await?;
        if snapshot.is_empty() {
            return Err(WizardError::Validation(format!(
                "pantry for {:?} is empty; add or seed items before planning",
                session.owner_id()
            )));
        }

        session.clear();
        session.set_state(WizardState::GeneratingOptions);
        info!(
            owner = session.owner_id(),
            steps = session.total_steps(),
            items = snapshot.len(),
            "wizard started"
        );
        Ok(())
    }

    /// Ask for candidates for the current step.
    ///
    /// Valid in `GeneratingOptions`, or in `AwaitingSelection` when the last
    /// request came back empty. Each call reads a fresh inventory snapshot.
    /// Zero candidates is a success; the caller may call again.
    pub async fn generate_options(&self, session: &mut WizardSession) -> Result<(), WizardError> {
        let rerequest = match session.state() {
            WizardState::GeneratingOptions => false,
            WizardState::AwaitingSelection if session.pending_options().is_empty() => true,
            _ => return Err(invalid(session, "generate options")),
        };
        let Some(step) = session.current_step() else {
            return Err(invalid(session, "generate options"));
        };
        if rerequest {
            session.set_state(WizardState::GeneratingOptions);
        }

        let owner = session.owner_id().to_owned();
        let snapshot = match self.ledger.list_for(&owner).await {
            Ok(items) => items,
            Err(e) => {
                session.set_state(WizardState::Error {
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let constraints = session.config().constraints();
        debug!(owner = %owner, step = %step.label, items = snapshot.len(), "requesting options");

        match self
            .suggester
            .suggest(&owner, &snapshot, &constraints, Some(&step.label))
            .await
        {
            Ok(candidates) => {
                info!(owner = %owner, step = %step.label, count = candidates.len(), "options ready");
                session.set_pending_options(candidates);
                session.set_state(WizardState::AwaitingSelection);
                Ok(())
            }
            Err(e) => {
                warn!(owner = %owner, step = %step.label, error = %e, "suggestion failed");
                session.set_pending_options(Vec::new());
                session.set_state(WizardState::Error {
                    reason: e.to_string(),
                });
                Err(WizardError::Collaborator(e))
            }
        }
    }

    /// Record candidate `candidate_index` as the current step's choice.
    ///
    /// Moves to `Complete` after the last step, otherwise back to
    /// `GeneratingOptions`. Never touches the ledger.
    pub fn select<'s>(
        &self,
        session: &'s mut WizardSession,
        candidate_index: usize,
    ) -> Result<&'s PlanEntry, WizardError> {
        if session.state() != &WizardState::AwaitingSelection {
            return Err(invalid(session, "select"));
        }
        let count = session.pending_options().len();
        if candidate_index >= count {
            return Err(WizardError::Validation(format!(
                "candidate {candidate_index} is out of range ({count} available)"
            )));
        }
        let Some(step) = session.current_step() else {
            return Err(invalid(session, "select"));
        };
        let Some(recipe) = session.take_pending_option(candidate_index) else {
            return Err(invalid(session, "select"));
        };

        info!(owner = session.owner_id(), step = %step.label, recipe = %recipe.title, "option selected");
        session.push_plan_entry(PlanEntry {
            step_index: step.index,
            label: step.label,
            recipe,
        });

        let next = if session.current_step_index() == session.total_steps() {
            WizardState::Complete
        } else {
            WizardState::GeneratingOptions
        };
        session.set_state(next);

        match session.plan().last() {
            Some(entry) => Ok(entry),
            None => Err(invalid(session, "select")),
        }
    }

    /// Leave `Error` for another attempt at the same step.
    pub fn retry(&self, session: &mut WizardSession) -> Result<(), WizardError> {
        if !matches!(session.state(), WizardState::Error { .. }) {
            return Err(invalid(session, "retry"));
        }
        session.set_state(WizardState::GeneratingOptions);
        debug!(owner = session.owner_id(), step = session.current_step_index(), "wizard retry");
        Ok(())
    }

    /// Discard all progress. Owner and config are kept.
    pub fn reset(&self, session: &mut WizardSession) {
        session.clear();
        debug!(owner = session.owner_id(), "wizard reset");
    }

    /// Cook the plan entry for `step_index` through the consumption
    /// transaction. Only a finished plan can be cooked; each call is a
    /// separate meal.
    pub async fn cook_entry(
        &self,
        session: &WizardSession,
        step_index: usize,
    ) -> Result<ConsumptionReceipt, WizardError> {
        if !session.is_complete() {
            return Err(invalid(session, "cook"));
        }
        let Some(entry) = session.plan().iter().find(|e| e.step_index == step_index) else {
            return Err(WizardError::Validation(format!(
                "no plan entry for step {step_index}"
            )));
        };
        let receipt = ConsumptionTransaction::new(&self.ledger)
            .cook(session.owner_id(), &entry.recipe)
            .await?;
        Ok(receipt)
    }
}
