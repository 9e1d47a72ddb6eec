//! Pantry core: the inventory ledger, the consumption transaction, and the
//! meal-planning wizard, written against two collaborator seams
//! ([`store::PersistentStore`] and [`suggest::RecipeSuggestionService`]).

pub mod consumption;
pub mod error;
pub mod ledger;
pub mod presets;
pub mod store;
pub mod suggest;
pub mod wizard;

pub use consumption::{ConsumptionReceipt, ConsumptionTransaction, Usage, UsageOutcome};
pub use error::PantryError;
pub use ledger::{EditedRow, InventoryLedger, ReconcileReport};
pub use store::{MemoryStore, PersistentStore, PgStore};
pub use suggest::{
    CommandSuggester, IngredientUsage, RecipeCandidate, RecipeSuggestionService, SuggestError,
    SuggestionConstraints,
};
pub use wizard::{PlanEntry, WizardConfig, WizardError, WizardSession, WizardState, WizardStateMachine};
