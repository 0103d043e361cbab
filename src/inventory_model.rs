//! # Inventory and Reconciliation Data Model
//!
//! This module defines the data structures passed through the reconciliation
//! engine: live inventory lines, ephemeral requirement lines, and the
//! per-line deduction reports the engine emits.
//!
//! ## Core Concepts
//!
//! - **InventoryLine**: a live stock record owned by one household
//! - **RequirementLine**: what a recipe needs, created per request
//! - **DeductionRecord**: the engine's per-line verdict (status, arithmetic,
//!   recommended action, selection default)
//! - **UnitKind**: coarse string-based unit classification; no dimensional
//!   conversion happens anywhere in this subsystem

use crate::shelf_life::StorageLocation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A live stock record. Mutated only through the reconciliation apply step
/// or host-side CRUD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub id: i64,
    /// Owning user/household; every read and write is scoped to it.
    pub owner_id: i64,
    pub name: String,
    /// Positive stock quantity in `unit`.
    pub quantity: f64,
    /// Unit token; compared by case-insensitive string equality only.
    pub unit: String,
    pub expiry: Option<NaiveDate>,
    /// True when `expiry` was inferred from shelf-life reference data
    /// rather than supplied by the user.
    pub expiry_is_estimated: bool,
    pub location: Option<StorageLocation>,
    pub active: bool,
}

impl InventoryLine {
    /// Create an active line with no expiry or location.
    pub fn new(id: i64, owner_id: i64, name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            id,
            owner_id,
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            expiry: None,
            expiry_is_estimated: false,
            location: None,
            active: true,
        }
    }
}

/// One line of what a recipe requires. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementLine {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl RequirementLine {
    pub fn new(name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
        }
    }
}

/// How a requirement line resolved against the inventory snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStatus {
    /// Matched with enough stock; shortfall is zero.
    Sufficient,
    /// Matched with enough stock, but the remainder falls below the
    /// small-quantity threshold and is treated as fully consumed.
    Negligible,
    /// Matched but stock does not cover the requirement.
    Short,
    /// Matched by name but the unit strings differ; quantities cannot be
    /// safely combined, stock is surfaced for visibility only.
    UnitMismatch,
    /// No inventory candidate cleared the acceptance threshold.
    Unmatched,
}

/// What the engine recommends the caller do with a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecommendedAction {
    /// Consume the matched stock; nothing needs buying.
    DeductFromInventory,
    /// Put the full requirement on the shopping list.
    AddToShoppingList,
    /// Consume what stock there is and buy the shortfall.
    ReduceShoppingQuantity {
        /// Quantity covered by existing stock.
        use_from_stock: f64,
        /// Quantity still to buy.
        buy: f64,
    },
}

/// Pointer to the inventory line a requirement matched, captured at compute
/// time. The apply step re-validates it rather than trusting it blindly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryMatch {
    pub line_id: i64,
    pub name: String,
    pub unit: String,
}

/// The engine's per-line output. Ephemeral unless a caller persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionRecord {
    pub ingredient_name: String,
    pub recipe_quantity: f64,
    pub recipe_unit: String,
    pub inventory_match: Option<InventoryMatch>,
    /// Stock quantity observed at compute time (0 when unmatched).
    pub current_inventory_quantity: f64,
    /// Stock quantity the apply step would write.
    pub quantity_after_deduction: f64,
    /// Quantity still needed after consuming matched stock; never negative.
    pub shortfall: f64,
    /// True when the post-deduction remainder fell below the configured
    /// small-quantity threshold.
    pub is_small_quantity: bool,
    /// Whether the engine recommends applying this line. Defaults to true
    /// for sufficient/negligible matches, false otherwise.
    pub selected: bool,
    pub status: LineStatus,
    pub action: RecommendedAction,
}

/// Coarse unit classification from the unit token alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Mass,
    Volume,
    Count,
}

impl UnitKind {
    /// Classify a unit token. Unrecognized tokens are counted units.
    pub fn classify(unit: &str) -> Self {
        match unit.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" | "kg" | "kilogram" | "kilograms" | "mg" | "oz" | "ounce"
            | "ounces" | "lb" | "lbs" | "pound" | "pounds" => UnitKind::Mass,
            "ml" | "millilitre" | "millilitres" | "milliliter" | "milliliters" | "l" | "litre"
            | "litres" | "liter" | "liters" | "cl" | "dl" | "tsp" | "teaspoon" | "teaspoons"
            | "tbsp" | "tablespoon" | "tablespoons" | "cup" | "cups" | "pint" | "pints"
            | "fl oz" => UnitKind::Volume,
            _ => UnitKind::Count,
        }
    }
}

/// User-configurable thresholds below which a post-deduction remainder is
/// negligible, interpreted in the matched line's own unit. Count-like units
/// have no negligible band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmallQuantityThresholds {
    /// Threshold for mass-like units.
    pub mass: f64,
    /// Threshold for volume-like units.
    pub volume: f64,
}

impl SmallQuantityThresholds {
    /// Threshold applicable to a given unit token.
    pub fn for_unit(&self, unit: &str) -> f64 {
        match UnitKind::classify(unit) {
            UnitKind::Mass => self.mass,
            UnitKind::Volume => self.volume,
            UnitKind::Count => 0.0,
        }
    }
}

impl Default for SmallQuantityThresholds {
    fn default() -> Self {
        Self {
            mass: 10.0,   // e.g. 10 g of flour left in the bag
            volume: 50.0, // e.g. 50 ml of milk left in the bottle
        }
    }
}

/// Case-insensitive unit equality; the only unit comparison this subsystem
/// performs.
pub fn units_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_kind_classification() {
        assert_eq!(UnitKind::classify("g"), UnitKind::Mass);
        assert_eq!(UnitKind::classify("KG"), UnitKind::Mass);
        assert_eq!(UnitKind::classify("ml"), UnitKind::Volume);
        assert_eq!(UnitKind::classify("cups"), UnitKind::Volume);
        assert_eq!(UnitKind::classify("pieces"), UnitKind::Count);
        assert_eq!(UnitKind::classify(""), UnitKind::Count);
    }

    #[test]
    fn test_threshold_selection() {
        let thresholds = SmallQuantityThresholds::default();
        assert_eq!(thresholds.for_unit("g"), 10.0);
        assert_eq!(thresholds.for_unit("ml"), 50.0);
        assert_eq!(thresholds.for_unit("pieces"), 0.0);
    }

    #[test]
    fn test_units_match_is_case_insensitive() {
        assert!(units_match("g", "G"));
        assert!(units_match(" ml", "ML "));
        assert!(!units_match("cups", "l"));
        assert!(!units_match("g", "kg"));
    }

    #[test]
    fn test_inventory_line_constructor() {
        let line = InventoryLine::new(1, 42, "flour", 500.0, "g");
        assert!(line.active);
        assert!(line.expiry.is_none());
        assert!(!line.expiry_is_estimated);
    }

    #[test]
    fn test_deduction_record_serializes() {
        let record = DeductionRecord {
            ingredient_name: "flour".into(),
            recipe_quantity: 200.0,
            recipe_unit: "g".into(),
            inventory_match: Some(InventoryMatch {
                line_id: 1,
                name: "plain flour".into(),
                unit: "g".into(),
            }),
            current_inventory_quantity: 500.0,
            quantity_after_deduction: 300.0,
            shortfall: 0.0,
            is_small_quantity: false,
            selected: true,
            status: LineStatus::Sufficient,
            action: RecommendedAction::DeductFromInventory,
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: DeductionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
