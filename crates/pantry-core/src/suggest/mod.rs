//! Recipe suggestion: the collaborator that proposes recipes from an
//! inventory snapshot.
//!
//! ```text
//! WizardStateMachine
//!     |
//!     v
//! Arc<dyn RecipeSuggestionService>
//!     `-- CommandSuggester --stdin prompt--> external command --stdout JSON-->
//!                                parse_candidates --> Vec<RecipeCandidate>
//! ```

pub mod command;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pantry_db::models::InventoryItem;

pub use command::CommandSuggester;
pub use prompt::{build_suggestion_prompt, parse_candidates};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How much of one ingredient a recipe needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientUsage {
    /// Inventory id, or `None` for an ingredient the pantry does not track.
    #[serde(default)]
    pub item_id: Option<i64>,
    /// Grams or millilitres.
    #[serde(alias = "quantity", alias = "grams")]
    pub quantity_needed: f64,
    /// Display name; mostly useful for untracked ingredients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A proposed recipe, not yet part of any plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCandidate {
    pub title: String,
    /// Typically kcal. Absent when the source gave none.
    #[serde(default, alias = "kcal", alias = "calories")]
    pub estimated_magnitude: Option<f64>,
    #[serde(default, alias = "ingredients")]
    pub ingredient_usage: Vec<IngredientUsage>,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Constraints forwarded with every suggestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionConstraints {
    /// How many candidates to ask for. Fewer may come back.
    pub candidate_count: usize,
    /// Free-text dietary preferences.
    pub preferences: Option<String>,
}

impl Default for SuggestionConstraints {
    fn default() -> Self {
        Self {
            candidate_count: 3,
            preferences: None,
        }
    }
}

/// Why a suggestion request failed. Every variant is recoverable by retrying.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("failed to launch suggestion command {command:?}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("suggestion command timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("suggestion command exited with {}: {stderr}", describe_exit(.exit_code))]
    CommandFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("malformed suggestion output: {0}")]
    Malformed(String),

    #[error("suggestion I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Proposes recipes built from an owner's current inventory.
///
/// Implementations own their latency and timeout policy; callers block
/// until a result or failure comes back.
#[async_trait]
pub trait RecipeSuggestionService: Send + Sync {
    async fn suggest(
        &self,
        owner_id: &str,
        snapshot: &[InventoryItem],
        constraints: &SuggestionConstraints,
        step_label: Option<&str>,
    ) -> Result<Vec<RecipeCandidate>, SuggestError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn RecipeSuggestionService) {}
};
