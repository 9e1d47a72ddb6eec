//! `pantry eat`, `pantry log` and `pantry report`.

use anyhow::Result;
use chrono::NaiveDate;
use tracing::warn;

use pantry_core::consumption::daily_totals;
use pantry_core::{ConsumptionTransaction, InventoryLedger, Usage, UsageOutcome};
use pantry_db::models::DateRange;

use crate::item_cmds::format_quantity;

/// Execute `pantry eat`: one eating event against a single item.
pub async fn cmd_eat(
    ledger: &InventoryLedger,
    owner: &str,
    item_id: i64,
    quantity: f64,
    label: Option<&str>,
    magnitude: Option<f64>,
) -> Result<()> {
    let label = match label {
        Some(l) => l.to_string(),
        None => match ledger.get(owner, item_id).await? {
            Some(item) => item.name,
            None => {
                warn!(owner, item_id, "eating an item that is not in the pantry");
                format!("item #{item_id}")
            }
        },
    };

    let receipt = ConsumptionTransaction::new(ledger)
        .consume(owner, &[Usage::tracked(item_id, quantity)], &label, magnitude)
        .await?;

    println!("Logged \"{}\" (entry #{}).", receipt.entry.label, receipt.entry.id);
    for outcome in &receipt.outcomes {
        println!("  {}", describe_outcome(outcome));
    }
    Ok(())
}

/// One line per usage outcome, shared with the plan wizard.
pub fn describe_outcome(outcome: &UsageOutcome) -> String {
    match outcome {
        UsageOutcome::Decremented { item_id, remaining } => {
            format!("#{item_id}: {} g left", format_quantity(*remaining))
        }
        UsageOutcome::Exhausted { item_id } => format!("#{item_id}: used up, removed"),
        UsageOutcome::Stale { item_id } => format!("#{item_id}: no longer in the pantry, skipped"),
        UsageOutcome::Untracked => "untracked ingredient".to_string(),
    }
}

fn range(since: Option<NaiveDate>, until: Option<NaiveDate>) -> Option<DateRange> {
    if since.is_none() && until.is_none() {
        None
    } else {
        Some(DateRange { since, until })
    }
}

fn format_magnitude(m: Option<f64>) -> String {
    match m {
        Some(m) => format!("{m:.0}"),
        None => "-".to_string(),
    }
}

/// Execute `pantry log`.
pub async fn cmd_log(
    ledger: &InventoryLedger,
    owner: &str,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
) -> Result<()> {
    let entries = ConsumptionTransaction::new(ledger)
        .history(owner, range(since, until))
        .await?;

    if entries.is_empty() {
        println!("No consumption logged.");
        return Ok(());
    }

    println!("{:>6}  {:<17} {:<36} {:>9}", "ID", "WHEN (UTC)", "LABEL", "KCAL");
    println!("{}", "-".repeat(72));
    for e in &entries {
        println!(
            "{:>6}  {:<17} {:<36} {:>9}",
            e.id,
            e.logged_at.format("%Y-%m-%d %H:%M"),
            e.label,
            format_magnitude(e.magnitude)
        );
    }
    Ok(())
}

/// Execute `pantry report`: per-day totals over the log.
pub async fn cmd_report(
    ledger: &InventoryLedger,
    owner: &str,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
) -> Result<()> {
    let entries = ConsumptionTransaction::new(ledger)
        .history(owner, range(since, until))
        .await?;
    let days = daily_totals(&entries);

    if days.is_empty() {
        println!("No consumption logged.");
        return Ok(());
    }

    println!("{:<12} {:>8} {:>10} {:>9}", "DATE", "MEALS", "KCAL", "UNKNOWN");
    println!("{}", "-".repeat(42));
    let mut total = 0.0;
    for day in &days {
        total += day.magnitude;
        println!(
            "{:<12} {:>8} {:>10.0} {:>9}",
            day.date, day.entries, day.magnitude, day.unknown_magnitude
        );
    }
    println!();
    println!(
        "{} meal(s) over {} day(s), {:.0} kcal total, {:.0} kcal/day on average.",
        entries.len(),
        days.len(),
        total,
        total / days.len() as f64
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_each_outcome() {
        assert_eq!(
            describe_outcome(&UsageOutcome::Decremented {
                item_id: 4,
                remaining: 120.0
            }),
            "#4: 120 g left"
        );
        assert!(describe_outcome(&UsageOutcome::Exhausted { item_id: 4 }).contains("removed"));
        assert!(describe_outcome(&UsageOutcome::Stale { item_id: 4 }).contains("skipped"));
        assert_eq!(describe_outcome(&UsageOutcome::Untracked), "untracked ingredient");
    }

    #[test]
    fn open_range_means_no_filter() {
        assert_eq!(range(None, None), None);
        let d = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(
            range(Some(d), None),
            Some(DateRange {
                since: Some(d),
                until: None
            })
        );
    }
}
