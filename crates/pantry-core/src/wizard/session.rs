//! Wizard value types: configuration, derived steps, and the session.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::suggest::{RecipeCandidate, SuggestionConstraints};

use super::{WizardError, WizardStateMachine};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WizardState {
    Configuring,
    GeneratingOptions,
    AwaitingSelection,
    Complete,
    /// The suggestion request for the current step failed.
    Error { reason: String },
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Configuring => "configuring",
            Self::GeneratingOptions => "generating_options",
            Self::AwaitingSelection => "awaiting_selection",
            Self::Complete => "complete",
            Self::Error { .. } => "error",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn default_candidates_per_step() -> usize {
    3
}

/// Shape of a planning session. Fixed once the session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    pub day_count: usize,
    /// Ordered meal slot labels, e.g. `["Lunch", "Dinner"]`.
    pub meal_slots: Vec<String>,
    #[serde(default = "default_candidates_per_step")]
    pub candidates_per_step: usize,
    #[serde(default)]
    pub preferences: Option<String>,
}

impl WizardConfig {
    pub fn new<S: Into<String>>(day_count: usize, meal_slots: impl IntoIterator<Item = S>) -> Self {
        Self {
            day_count,
            meal_slots: meal_slots.into_iter().map(Into::into).collect(),
            candidates_per_step: default_candidates_per_step(),
            preferences: None,
        }
    }

    pub fn with_candidates_per_step(mut self, count: usize) -> Self {
        self.candidates_per_step = count;
        self
    }

    pub fn with_preferences(mut self, preferences: impl Into<String>) -> Self {
        self.preferences = Some(preferences.into());
        self
    }

    /// `day_count × len(meal_slots)`. Exact for any config that passes
    /// [`Self::validate`].
    pub fn total_steps(&self) -> usize {
        self.day_count.saturating_mul(self.meal_slots.len())
    }

    /// The step at `index`, or `None` past the end.
    pub fn step(&self, index: usize) -> Option<WizardStep> {
        if index >= self.total_steps() {
            return None;
        }
        let slots = self.meal_slots.len();
        let day_index = index / slots;
        let slot_index = index % slots;
        Some(WizardStep {
            index,
            day_index,
            slot_index,
            label: step_label(day_index, &self.meal_slots[slot_index]),
        })
    }

    pub fn constraints(&self) -> SuggestionConstraints {
        SuggestionConstraints {
            candidate_count: self.candidates_per_step,
            preferences: self.preferences.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), WizardError> {
        if self.meal_slots.is_empty() {
            return Err(WizardError::Validation(
                "at least one meal slot is required".into(),
            ));
        }
        if self.day_count == 0 {
            return Err(WizardError::Validation("day count must be at least 1".into()));
        }
        if self.day_count.checked_mul(self.meal_slots.len()).is_none() {
            return Err(WizardError::Validation(format!(
                "{} days of {} meals is too many steps",
                self.day_count,
                self.meal_slots.len()
            )));
        }
        if self.candidates_per_step == 0 {
            return Err(WizardError::Validation(
                "candidates per step must be at least 1".into(),
            ));
        }
        let mut seen = HashSet::new();
        for slot in &self.meal_slots {
            let slot = slot.trim();
            if slot.is_empty() {
                return Err(WizardError::Validation("meal slot labels must not be blank".into()));
            }
            if !seen.insert(slot) {
                return Err(WizardError::Validation(format!("duplicate meal slot {slot:?}")));
            }
        }
        Ok(())
    }
}

/// `"Day {n} – {slot}"`, days counted from 1.
pub fn step_label(day_index: usize, meal_slot: &str) -> String {
    format!("Day {} \u{2013} {}", day_index + 1, meal_slot.trim())
}

/// One `(day, meal slot)` position, derived from the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardStep {
    /// `day_index * len(meal_slots) + slot_index`.
    pub index: usize,
    pub day_index: usize,
    pub slot_index: usize,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A recipe chosen for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub step_index: usize,
    pub label: String,
    pub recipe: RecipeCandidate,
}

/// In-progress state of one planning flow.
///
/// Nothing here is persisted. Fields are read-only outside the crate; every
/// change goes through [`WizardStateMachine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    owner_id: String,
    config: WizardConfig,
    state: WizardState,
    current_step_index: usize,
    pending_options: Vec<RecipeCandidate>,
    plan: Vec<PlanEntry>,
}

impl WizardSession {
    /// A fresh session in `Configuring`.
    pub fn new(owner_id: impl Into<String>, config: WizardConfig) -> Self {
        Self {
            owner_id: owner_id.into(),
            config,
            state: WizardState::Configuring,
            current_step_index: 0,
            pending_options: Vec::new(),
            plan: Vec::new(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn total_steps(&self) -> usize {
        self.config.total_steps()
    }

    /// The step awaiting a decision, or `None` once complete.
    pub fn current_step(&self) -> Option<WizardStep> {
        self.config.step(self.current_step_index)
    }

    pub fn pending_options(&self) -> &[RecipeCandidate] {
        &self.pending_options
    }

    pub fn plan(&self) -> &[PlanEntry] {
        &self.plan
    }

    pub fn is_complete(&self) -> bool {
        self.state == WizardState::Complete
    }

    pub fn error_reason(&self) -> Option<&str> {
        match &self.state {
            WizardState::Error { reason } => Some(reason),
            _ => None,
        }
    }

    // -- mutators used by the state machine --

    pub(crate) fn set_state(&mut self, to: WizardState) {
        debug_assert!(
            WizardStateMachine::is_valid_transition(&self.state, &to),
            "invalid wizard transition {} -> {}",
            self.state,
            to
        );
        self.state = to;
    }

    pub(crate) fn set_pending_options(&mut self, options: Vec<RecipeCandidate>) {
        self.pending_options = options;
    }

    pub(crate) fn take_pending_option(&mut self, index: usize) -> Option<RecipeCandidate> {
        if index >= self.pending_options.len() {
            return None;
        }
        let chosen = self.pending_options.swap_remove(index);
        self.pending_options.clear();
        Some(chosen)
    }

    pub(crate) fn push_plan_entry(&mut self, entry: PlanEntry) {
        self.plan.push(entry);
        self.current_step_index += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.state = WizardState::Configuring;
        self.current_step_index = 0;
        self.pending_options.clear();
        self.plan.clear();
    }
}
