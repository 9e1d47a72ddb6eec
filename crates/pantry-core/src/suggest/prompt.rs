//! Suggestion prompt construction and response parsing.
//!
//! Pure logic, no I/O: the prompt lists the live inventory and the output
//! contract; the parser pulls candidate recipes back out of whatever text
//! the collaborator produced.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::warn;

use pantry_db::models::InventoryItem;

use super::{RecipeCandidate, SuggestError, SuggestionConstraints};

// ---------------------------------------------------------------------------
// Prompt construction
// ---------------------------------------------------------------------------

/// JSON output contract included in every prompt.
const OUTPUT_CONTRACT: &str = r#"## Output format

Reply with a JSON array only. Each element:

```json
{
  "title": "string",                 // REQUIRED. Recipe name.
  "estimated_magnitude": 520,        // Optional. Estimated kcal per portion.
  "ingredient_usage": [              // Ordered list of ingredients used.
    { "item_id": 12, "quantity_needed": 150 },
    { "item_id": null, "name": "salt", "quantity_needed": 2 }
  ],
  "steps": ["string"]                // Ordered cooking instructions.
}
```

- `item_id` MUST be one of the `#id` values listed under Inventory, or
  `null` for an ingredient the pantry does not track.
- `quantity_needed` is in grams or millilitres and never exceeds what the
  inventory lists for that id.
"#;

/// Build the prompt sent to the suggestion collaborator.
pub fn build_suggestion_prompt(
    snapshot: &[InventoryItem],
    constraints: &SuggestionConstraints,
    step_label: Option<&str>,
) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("# Pantry recipe suggestions\n\n");
    prompt.push_str(&format!(
        "Propose up to {} recipes that can be cooked mostly from the inventory below. \
         Prefer items that were bought earliest.\n\n",
        constraints.candidate_count
    ));

    if let Some(label) = step_label {
        prompt.push_str(&format!("The recipes are for: **{label}**.\n\n"));
    }
    if let Some(prefs) = constraints.preferences.as_deref().filter(|p| !p.trim().is_empty()) {
        prompt.push_str(&format!("Dietary preferences: {}\n\n", prefs.trim()));
    }

    prompt.push_str("## Inventory\n\n");
    if snapshot.is_empty() {
        prompt.push_str("(empty)\n");
    }
    for item in snapshot {
        prompt.push_str(&format!(
            "- #{} {} ({}): {} g, bought {}\n",
            item.id,
            item.name,
            item.category,
            format_quantity(item.quantity),
            item.added_at
        ));
    }
    prompt.push('\n');
    prompt.push_str(OUTPUT_CONTRACT);

    prompt
}

fn format_quantity(q: f64) -> String {
    if q.fract() == 0.0 {
        format!("{q:.0}")
    } else {
        format!("{q:.1}")
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    List(Vec<RecipeCandidate>),
    Wrapped { recipes: Vec<RecipeCandidate> },
}

/// Parse candidates out of the collaborator's raw output.
///
/// Accepts a bare JSON array, a `{"recipes": [...]}` object, either of them
/// inside a fenced code block, or surrounded by prose. Ingredient ids that
/// are not in `snapshot` are downgraded to untracked rather than trusted.
pub fn parse_candidates(
    text: &str,
    snapshot: &[InventoryItem],
) -> Result<Vec<RecipeCandidate>, SuggestError> {
    let envelope = extract_json(text).ok_or_else(|| {
        SuggestError::Malformed(format!(
            "no JSON recipe list found in output ({} bytes)",
            text.len()
        ))
    })?;

    let mut candidates = match envelope {
        Envelope::List(list) => list,
        Envelope::Wrapped { recipes } => recipes,
    };

    let known: HashSet<i64> = snapshot.iter().map(|i| i.id).collect();

    for (idx, candidate) in candidates.iter_mut().enumerate() {
        candidate.title = candidate.title.trim().to_string();
        if candidate.title.is_empty() {
            return Err(SuggestError::Malformed(format!(
                "candidate {idx} has an empty title"
            )));
        }
        if let Some(m) = candidate.estimated_magnitude {
            if !m.is_finite() || m < 0.0 {
                candidate.estimated_magnitude = None;
            }
        }
        for usage in &mut candidate.ingredient_usage {
            if !usage.quantity_needed.is_finite() || usage.quantity_needed < 0.0 {
                return Err(SuggestError::Malformed(format!(
                    "candidate {:?} uses an invalid quantity {}",
                    candidate.title, usage.quantity_needed
                )));
            }
            if let Some(id) = usage.item_id {
                if !known.contains(&id) {
                    warn!(
                        recipe = %candidate.title,
                        item_id = id,
                        "suggestion referenced unknown item; treating as untracked"
                    );
                    usage.item_id = None;
                }
            }
        }
    }

    Ok(candidates)
}

/// Try progressively looser ways of locating the JSON payload.
fn extract_json(text: &str) -> Option<Envelope> {
    let trimmed = text.trim();
    if let Ok(env) = serde_json::from_str(trimmed) {
        return Some(env);
    }

    if let Some(block) = fenced_block(trimmed) {
        if let Ok(env) = serde_json::from_str(block) {
            return Some(env);
        }
    }

    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                if let Ok(env) = serde_json::from_str(&trimmed[start..=end]) {
                    return Some(env);
                }
            }
        }
    }
    None
}

/// Contents of the first ``` fenced block, without its language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
