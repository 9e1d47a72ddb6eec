//! `pantry plan`: the interactive meal-planning wizard.
//!
//! Reads choices line by line from `input` and writes prompts to `output`,
//! so the whole dialogue can be driven from a test.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use pantry_core::{
    InventoryLedger, RecipeCandidate, RecipeSuggestionService, WizardConfig, WizardSession,
    WizardState, WizardStateMachine,
};

use crate::consumption_cmds::describe_outcome;
use crate::item_cmds::format_quantity;

/// Flags of `pantry plan`.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub days: usize,
    pub slots: Vec<String>,
    pub count: usize,
    pub preferences: Option<String>,
}

impl PlanOptions {
    fn wizard_config(&self) -> WizardConfig {
        let slots = self.slots.iter().map(|s| s.trim().to_string());
        let config = WizardConfig::new(self.days, slots).with_candidates_per_step(self.count);
        match self.preferences.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => config.with_preferences(p),
            _ => config,
        }
    }
}

/// Run the wizard to completion, then offer to cook entries from the plan.
pub async fn run_plan<R: BufRead, W: Write>(
    ledger: &InventoryLedger,
    suggester: Arc<dyn RecipeSuggestionService>,
    owner: &str,
    options: PlanOptions,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let wizard = WizardStateMachine::new(ledger.clone(), suggester);
    let mut session = WizardSession::new(owner, options.wizard_config());
    wizard.start(&mut session).await?;

    writeln!(
        output,
        "Planning {} meal(s) for {owner}. Answer q at any prompt to stop.",
        session.total_steps()
    )?;

    if !drive(&wizard, &mut session, input, output).await? {
        writeln!(output, "Planning abandoned; nothing was cooked.")?;
        return Ok(());
    }

    print_plan(&session, output)?;
    cook_entries(&wizard, &session, input, output).await
}

/// Walk the session until it is complete. Returns `false` if the user quit.
async fn drive<R: BufRead, W: Write>(
    wizard: &WizardStateMachine,
    session: &mut WizardSession,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    loop {
        match session.state().clone() {
            WizardState::Configuring => wizard.start(session).await?,
            WizardState::GeneratingOptions => request_options(wizard, session, output).await?,
            WizardState::AwaitingSelection if session.pending_options().is_empty() => {
                writeln!(output, "No suggestions came back for this meal.")?;
                match prompt(input, output, "[r]etry, [s]tart over, [q]uit: ")?.as_deref() {
                    None | Some("q") => return Ok(false),
                    Some("s") => wizard.reset(session),
                    _ => request_options(wizard, session, output).await?,
                }
            }
            WizardState::AwaitingSelection => {
                print_options(session.pending_options(), output)?;
                let count = session.pending_options().len();
                let msg = format!("Pick 1-{count}, [s]tart over, [q]uit: ");
                match prompt(input, output, &msg)?.as_deref() {
                    None | Some("q") => return Ok(false),
                    Some("s") => wizard.reset(session),
                    Some(answer) => match parse_choice(answer, count) {
                        Some(index) => {
                            let entry = wizard.select(session, index)?;
                            writeln!(output, "  {} -> {}", entry.label, entry.recipe.title)?;
                        }
                        None => writeln!(output, "Enter a number between 1 and {count}.")?,
                    },
                }
            }
            WizardState::Error { reason } => {
                writeln!(output, "Suggestion failed: {reason}")?;
                match prompt(input, output, "[r]etry, [s]tart over, [q]uit: ")?.as_deref() {
                    None | Some("q") => return Ok(false),
                    Some("s") => wizard.reset(session),
                    _ => wizard.retry(session)?,
                }
            }
            WizardState::Complete => return Ok(true),
        }
    }
}

/// Ask for the current step's candidates. A collaborator failure leaves the
/// session in `Error` and is handled by the caller's loop.
async fn request_options<W: Write>(
    wizard: &WizardStateMachine,
    session: &mut WizardSession,
    output: &mut W,
) -> Result<()> {
    if let Some(step) = session.current_step() {
        writeln!(output)?;
        writeln!(
            output,
            "[{}/{}] {}: asking for suggestions...",
            step.index + 1,
            session.total_steps(),
            step.label
        )?;
        output.flush()?;
    }
    if let Err(e) = wizard.generate_options(session).await {
        if !matches!(session.state(), WizardState::Error { .. }) {
            return Err(e.into());
        }
        warn!(owner = session.owner_id(), error = %e, "suggestion step failed");
    } else {
        debug!(
            owner = session.owner_id(),
            candidates = session.pending_options().len(),
            "options ready"
        );
    }
    Ok(())
}

/// Offer to cook finished plan entries until the user is done.
async fn cook_entries<R: BufRead, W: Write>(
    wizard: &WizardStateMachine,
    session: &WizardSession,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let count = session.plan().len();
    loop {
        let msg = format!("Cook a meal now? Enter 1-{count}, or press Enter to finish: ");
        let answer = match prompt(input, output, &msg)? {
            None => return Ok(()),
            Some(a) if a.is_empty() || a == "q" => return Ok(()),
            Some(a) => a,
        };
        let Some(index) = parse_choice(&answer, count) else {
            writeln!(output, "Enter a number between 1 and {count}.")?;
            continue;
        };
        let entry = &session.plan()[index];
        let receipt = wizard.cook_entry(session, entry.step_index).await?;
        writeln!(output, "Cooked {} ({}).", receipt.entry.label, entry.label)?;
        for outcome in &receipt.outcomes {
            writeln!(output, "  {}", describe_outcome(outcome))?;
        }
    }
}

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

/// Print `message`, read one trimmed lowercase line. `None` on EOF.
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<Option<String>> {
    write!(output, "{message}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_lowercase()))
}

/// 1-based answer to a 0-based index.
fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    match answer.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(n - 1),
        _ => None,
    }
}

fn describe_magnitude(m: Option<f64>) -> String {
    m.map(|kcal| format!(" (~{kcal:.0} kcal)")).unwrap_or_default()
}

fn print_options<W: Write>(options: &[RecipeCandidate], output: &mut W) -> Result<()> {
    for (n, recipe) in options.iter().enumerate() {
        writeln!(
            output,
            "  {}) {}{}",
            n + 1,
            recipe.title,
            describe_magnitude(recipe.estimated_magnitude)
        )?;
        let uses: Vec<String> = recipe
            .ingredient_usage
            .iter()
            .map(|u| {
                let what = match (u.item_id, u.name.as_deref()) {
                    (Some(id), _) => format!("#{id}"),
                    (None, Some(name)) => name.to_string(),
                    (None, None) => "?".to_string(),
                };
                format!("{what} {} g", format_quantity(u.quantity_needed))
            })
            .collect();
        if !uses.is_empty() {
            writeln!(output, "     uses: {}", uses.join(", "))?;
        }
    }
    Ok(())
}

fn print_plan<W: Write>(session: &WizardSession, output: &mut W) -> Result<()> {
    writeln!(output)?;
    writeln!(output, "Meal plan:")?;
    for (n, entry) in session.plan().iter().enumerate() {
        writeln!(
            output,
            "  {}. {}: {}{}",
            n + 1,
            entry.label,
            entry.recipe.title,
            describe_magnitude(entry.recipe.estimated_magnitude)
        )?;
    }
    writeln!(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use pantry_core::{
        ConsumptionTransaction, IngredientUsage, MemoryStore, SuggestError, SuggestionConstraints,
    };
    use pantry_db::models::{Category, InventoryItem, NewItem};

    use super::*;

    /// Replies from a script; once empty, two recipes that each use 100 g
    /// of the first item in the snapshot.
    #[derive(Default)]
    struct FakeSuggester {
        script: Mutex<VecDeque<Result<Vec<RecipeCandidate>, SuggestError>>>,
    }

    #[async_trait]
    impl RecipeSuggestionService for FakeSuggester {
        async fn suggest(
            &self,
            _owner_id: &str,
            snapshot: &[InventoryItem],
            _constraints: &SuggestionConstraints,
            step_label: Option<&str>,
        ) -> Result<Vec<RecipeCandidate>, SuggestError> {
            if let Some(reply) = self.script.lock().unwrap().pop_front() {
                return reply;
            }
            let label = step_label.unwrap_or("meal");
            Ok(["A", "B"]
                .iter()
                .map(|v| RecipeCandidate {
                    title: format!("{label} {v}"),
                    estimated_magnitude: Some(400.0),
                    ingredient_usage: vec![IngredientUsage {
                        item_id: snapshot.first().map(|i| i.id),
                        quantity_needed: 100.0,
                        name: None,
                    }],
                    steps: vec![],
                })
                .collect())
        }
    }

    async fn stocked_ledger() -> InventoryLedger {
        let ledger = InventoryLedger::new(Arc::new(MemoryStore::new()));
        ledger
            .add("alice", NewItem::new("Rice", Category::ShelfStable, 1000.0))
            .await
            .unwrap();
        ledger
    }

    fn options(days: usize, slots: &[&str]) -> PlanOptions {
        PlanOptions {
            days,
            slots: slots.iter().map(|s| s.to_string()).collect(),
            count: 2,
            preferences: None,
        }
    }

    async fn run(
        ledger: &InventoryLedger,
        suggester: FakeSuggester,
        opts: PlanOptions,
        answers: &str,
    ) -> (Result<()>, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = run_plan(
            ledger,
            Arc::new(suggester),
            "alice",
            opts,
            &mut input,
            &mut output,
        )
        .await;
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn parse_choice_is_one_based_and_bounded() {
        assert_eq!(parse_choice("1", 3), Some(0));
        assert_eq!(parse_choice("3", 3), Some(2));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("two", 3), None);
    }

    #[test]
    fn blank_preferences_are_not_forwarded() {
        let mut opts = options(1, &[" Lunch "]);
        opts.preferences = Some("  ".into());
        let config = opts.wizard_config();
        assert_eq!(config.preferences, None);
        assert_eq!(config.meal_slots, vec!["Lunch".to_string()]);
    }

    #[tokio::test]
    async fn full_plan_without_cooking_leaves_pantry_untouched() {
        let ledger = stocked_ledger().await;
        let (result, out) = run(
            &ledger,
            FakeSuggester::default(),
            options(1, &["Lunch", "Dinner"]),
            "1\n2\n\n",
        )
        .await;
        result.unwrap();

        assert!(out.contains("Day 1 – Lunch -> Day 1 – Lunch A"));
        assert!(out.contains("Day 1 – Dinner -> Day 1 – Dinner B"));
        assert!(out.contains("Meal plan:"));
        assert_eq!(ledger.list_for("alice").await.unwrap()[0].quantity, 1000.0);
    }

    #[tokio::test]
    async fn cooking_an_entry_consumes_its_ingredients() {
        let ledger = stocked_ledger().await;
        let (result, out) = run(
            &ledger,
            FakeSuggester::default(),
            options(1, &["Dinner"]),
            "1\n1\n\n",
        )
        .await;
        result.unwrap();

        assert!(out.contains("Cooked Day 1 – Dinner A"));
        assert_eq!(ledger.list_for("alice").await.unwrap()[0].quantity, 900.0);
        let log = ConsumptionTransaction::new(&ledger)
            .history("alice", None)
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn failure_can_be_retried() {
        let ledger = stocked_ledger().await;
        let suggester = FakeSuggester {
            script: Mutex::new(VecDeque::from([Err(SuggestError::Timeout { secs: 5 })])),
        };
        let (result, out) = run(&ledger, suggester, options(1, &["Lunch"]), "r\n2\n\n").await;
        result.unwrap();

        assert!(out.contains("Suggestion failed: suggestion command timed out after 5s"));
        assert!(out.contains("Day 1 – Lunch -> Day 1 – Lunch B"));
    }

    #[tokio::test]
    async fn empty_suggestions_can_be_rerequested() {
        let ledger = stocked_ledger().await;
        let suggester = FakeSuggester {
            script: Mutex::new(VecDeque::from([Ok(vec![])])),
        };
        let (result, out) = run(&ledger, suggester, options(1, &["Lunch"]), "r\n1\n\n").await;
        result.unwrap();

        assert!(out.contains("No suggestions came back"));
        assert!(out.contains("Meal plan:"));
    }

    #[tokio::test]
    async fn bad_choice_prompts_again() {
        let ledger = stocked_ledger().await;
        let (result, out) = run(
            &ledger,
            FakeSuggester::default(),
            options(1, &["Lunch"]),
            "9\n1\n\n",
        )
        .await;
        result.unwrap();
        assert!(out.contains("Enter a number between 1 and 2."));
        assert!(out.contains("Meal plan:"));
    }

    #[tokio::test]
    async fn quitting_abandons_the_plan() {
        let ledger = stocked_ledger().await;
        let (result, out) = run(
            &ledger,
            FakeSuggester::default(),
            options(2, &["Lunch"]),
            "1\nq\n",
        )
        .await;
        result.unwrap();
        assert!(out.contains("Planning abandoned"));
        assert!(!out.contains("Meal plan:"));
    }

    #[tokio::test]
    async fn empty_pantry_is_rejected_up_front() {
        let ledger = InventoryLedger::new(Arc::new(MemoryStore::new()));
        let (result, _) = run(&ledger, FakeSuggester::default(), options(1, &["Lunch"]), "").await;
        assert!(result.unwrap_err().to_string().contains("empty"));
    }
}
