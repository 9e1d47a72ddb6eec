//! CLI handlers for `pantry item` subcommands and `pantry seed`.
//!
//! Implements:
//! - `pantry item add <name> <qty>`     -- add a new lot
//! - `pantry item list [--json]`        -- live items, oldest first
//! - `pantry item edit ID=QTY...`       -- reconcile edited quantities
//! - `pantry item delete <id>`          -- remove one item
//! - `pantry item discard-all --yes`    -- remove everything
//! - `pantry seed`                      -- stock the demo basket

use anyhow::{Context, Result, bail};

use pantry_core::{EditedRow, InventoryLedger};
use pantry_db::models::{Category, InventoryItem, NewItem};

use crate::ItemCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch an `ItemCommands` variant to the appropriate handler.
pub async fn run_item_command(
    command: ItemCommands,
    ledger: &InventoryLedger,
    owner: &str,
) -> Result<()> {
    match command {
        ItemCommands::Add {
            name,
            quantity,
            category,
            added_at,
        } => {
            let item = NewItem {
                added_at,
                ..NewItem::new(name, category.parse::<Category>()?, quantity)
            };
            cmd_add(ledger, owner, item).await
        }
        ItemCommands::List { json } => cmd_list(ledger, owner, json).await,
        ItemCommands::Edit { rows } => cmd_edit(ledger, owner, &rows).await,
        ItemCommands::Delete { item_id } => cmd_delete(ledger, owner, item_id).await,
        ItemCommands::DiscardAll { yes } => cmd_discard_all(ledger, owner, yes).await,
    }
}

/// Parse one `ID=QUANTITY` argument.
pub fn parse_edited_row(s: &str) -> Result<EditedRow, String> {
    let (id, qty) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=QUANTITY, got {s:?}"))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid item id {id:?}: {e}"))?;
    let quantity = qty
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid quantity {qty:?}: {e}"))?;
    Ok(EditedRow { id, quantity })
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

async fn cmd_add(ledger: &InventoryLedger, owner: &str, item: NewItem) -> Result<()> {
    let item = ledger.add(owner, item).await?;
    println!(
        "Added #{} {} ({}) {} g, bought {}",
        item.id,
        item.name,
        item.category,
        format_quantity(item.quantity),
        item.added_at
    );
    Ok(())
}

async fn cmd_list(ledger: &InventoryLedger, owner: &str, json: bool) -> Result<()> {
    let items = ledger.list_for(owner).await?;

    if json {
        let text = serde_json::to_string_pretty(&items).context("failed to serialize items")?;
        println!("{text}");
        return Ok(());
    }

    if items.is_empty() {
        println!("Pantry for {owner} is empty. Try `pantry item add` or `pantry seed`.");
        return Ok(());
    }
    print_items(&items);
    Ok(())
}

async fn cmd_edit(ledger: &InventoryLedger, owner: &str, rows: &[EditedRow]) -> Result<()> {
    let report = ledger.reconcile_edit(owner, rows).await?;
    println!(
        "Updated {}, removed {}, unchanged {}.",
        report.updated, report.deleted, report.unchanged
    );
    if report.stale > 0 {
        println!(
            "Skipped {} row(s) for items that no longer exist.",
            report.stale
        );
    }
    Ok(())
}

async fn cmd_delete(ledger: &InventoryLedger, owner: &str, item_id: i64) -> Result<()> {
    if ledger.delete(owner, item_id).await? {
        println!("Item #{item_id} deleted.");
    } else {
        println!("Item #{item_id} not found; nothing to delete.");
    }
    Ok(())
}

async fn cmd_discard_all(ledger: &InventoryLedger, owner: &str, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to discard every item for {owner} without --yes");
    }
    let removed = ledger.discard_all(owner).await?;
    println!("Discarded {removed} item(s).");
    Ok(())
}

/// Execute `pantry seed`.
pub async fn cmd_seed(ledger: &InventoryLedger, owner: &str) -> Result<()> {
    let items = ledger.seed_demo_basket(owner).await?;
    println!("Seeded {} item(s) from the demo basket:", items.len());
    println!();
    print_items(&items);
    Ok(())
}

// -----------------------------------------------------------------------
// Formatting
// -----------------------------------------------------------------------

fn print_items(items: &[InventoryItem]) {
    println!(
        "{:>6}  {:<28} {:<14} {:>10}  {:<10}",
        "ID", "NAME", "CATEGORY", "QTY (g)", "ADDED"
    );
    println!("{}", "-".repeat(74));
    for item in items {
        println!(
            "{:>6}  {:<28} {:<14} {:>10}  {:<10}",
            item.id,
            truncate(&item.name, 28),
            item.category,
            format_quantity(item.quantity),
            item.added_at
        );
    }
}

pub fn format_quantity(q: f64) -> String {
    if q.fract() == 0.0 {
        format!("{q:.0}")
    } else {
        format!("{q:.1}")
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width - 3).collect();
    out.push_str("...");
    out
}
