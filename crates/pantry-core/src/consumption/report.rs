//! Per-day summaries of the consumption log.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use pantry_db::models::ConsumptionLogEntry;

/// Totals for one UTC calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    /// Number of eating events.
    pub entries: usize,
    /// Sum of the magnitudes that were present.
    pub magnitude: f64,
    /// Events logged without a magnitude.
    pub unknown_magnitude: usize,
}

/// Fold log entries into per-day totals, oldest day first.
///
/// Missing magnitudes are counted separately, never treated as zero.
pub fn daily_totals(entries: &[ConsumptionLogEntry]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, DailyTotal> = BTreeMap::new();
    for entry in entries {
        let date = entry.logged_at.date_naive();
        let day = days.entry(date).or_insert_with(|| DailyTotal {
            date,
            entries: 0,
            magnitude: 0.0,
            unknown_magnitude: 0,
        });
        day.entries += 1;
        match entry.magnitude {
            Some(m) => day.magnitude += m,
            None => day.unknown_magnitude += 1,
        }
    }
    days.into_values().collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn entry(id: i64, day: u32, hour: u32, magnitude: Option<f64>) -> ConsumptionLogEntry {
        ConsumptionLogEntry {
            id,
            owner_id: "alice".into(),
            label: format!("meal-{id}"),
            magnitude,
            logged_at: Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn groups_by_day_oldest_first() {
        let entries = vec![
            entry(3, 2, 19, Some(700.0)),
            entry(2, 1, 12, Some(500.0)),
            entry(1, 1, 8, Some(300.0)),
        ];
        let totals = daily_totals(&entries);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].date, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
        assert_eq!(totals[0].entries, 2);
        assert_eq!(totals[0].magnitude, 800.0);
        assert_eq!(totals[1].magnitude, 700.0);
    }

    #[test]
    fn missing_magnitudes_are_counted_not_zeroed() {
        let totals = daily_totals(&[entry(1, 3, 8, None), entry(2, 3, 9, Some(250.0))]);
        assert_eq!(totals[0].entries, 2);
        assert_eq!(totals[0].magnitude, 250.0);
        assert_eq!(totals[0].unknown_magnitude, 1);
    }

    #[test]
    fn empty_log_has_no_days() {
        assert!(daily_totals(&[]).is_empty());
    }
}
