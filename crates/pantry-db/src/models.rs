use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Food category of an inventory item.
///
/// The set is open: anything outside the well-known values is kept verbatim
/// in [`Category::Custom`]. Stored as snake_case text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
    Meat,
    Dairy,
    Vegetables,
    Fruit,
    ShelfStable,
    Other,
    Custom(String),
}

impl Category {
    /// The well-known categories, in display order.
    pub const KNOWN: [Category; 6] = [
        Self::Meat,
        Self::Dairy,
        Self::Vegetables,
        Self::Fruit,
        Self::ShelfStable,
        Self::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Meat => "meat",
            Self::Dairy => "dairy",
            Self::Vegetables => "vegetables",
            Self::Fruit => "fruit",
            Self::ShelfStable => "shelf_stable",
            Self::Other => "other",
            Self::Custom(s) => s,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Infallible;

    /// Case-insensitive; unknown names become [`Category::Custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = trimmed.to_ascii_lowercase().replace([' ', '-'], "_");
        Ok(match normalized.as_str() {
            "meat" => Self::Meat,
            "dairy" => Self::Dairy,
            "vegetables" | "vegetable" => Self::Vegetables,
            "fruit" | "fruits" => Self::Fruit,
            "shelf_stable" => Self::ShelfStable,
            "other" | "" => Self::Other,
            _ => Self::Custom(trimmed.to_owned()),
        })
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(c) => c,
            Err(never) => match never {},
        }
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_owned()
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A live inventory record. Rows with a quantity of zero never exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    /// Grams or millilitres.
    pub quantity: f64,
    pub added_at: NaiveDate,
}

/// One eating event. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConsumptionLogEntry {
    pub id: i64,
    pub owner_id: String,
    pub label: String,
    /// Informational only (typically kcal). `None` when the source gave none.
    pub magnitude: Option<f64>,
    pub logged_at: DateTime<Utc>,
}

/// Fields for a new inventory record; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub category: Category,
    pub quantity: f64,
    /// Defaults to today when absent.
    #[serde(default)]
    pub added_at: Option<NaiveDate>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, category: Category, quantity: f64) -> Self {
        Self {
            name: name.into(),
            category,
            quantity,
            added_at: None,
        }
    }
}

/// Inclusive date window for log queries. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.since.is_none_or(|s| date >= s) && self.until.is_none_or(|u| date <= u)
    }
}
