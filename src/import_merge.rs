//! # Purchase Import Merge
//!
//! When a purchased shopping-list item is converted into inventory, this
//! module decides whether it merges into an existing stock line or becomes
//! a new one. Matching keys on the canonical name (exact equivalence-class
//! semantics, as in duplicate detection); the shelf-life reference data
//! supplies storage location, category and an estimated expiry when the
//! purchase carries none.
//!
//! Merge rules: same canonical key and same unit → quantities add and the
//! earlier expiry date is kept (assume the older stock expires first);
//! differing units are kept as separate lines rather than guessing a
//! conversion.
//!
//! This module only decides; the returned [`MergeOutcome`] tells the host
//! which write to run.

use crate::inventory_model::{units_match, InventoryLine};
use crate::normalize::normalize;
use crate::shelf_life::{self, Category, StorageLocation};
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// A purchased item coming off a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasedItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    /// User-supplied expiry, if any (e.g. read off the packaging).
    pub expiry: Option<NaiveDate>,
}

/// A line to be inserted; the host assigns id and owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInventoryLine {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub expiry: Option<NaiveDate>,
    /// True when `expiry` came from shelf-life estimation rather than the
    /// user.
    pub expiry_is_estimated: bool,
    pub location: Option<StorageLocation>,
    pub category: Category,
}

/// The decision for one purchased item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MergeOutcome {
    /// Add the purchase into an existing line.
    MergeInto {
        line_id: i64,
        new_quantity: f64,
        expiry: Option<NaiveDate>,
        expiry_is_estimated: bool,
    },
    /// Create a new line.
    Insert(NewInventoryLine),
}

/// Decide how a purchased item enters the inventory.
///
/// # Examples
///
/// ```rust
/// use chrono::NaiveDate;
/// use pantry::import_merge::{merge_purchased_item, MergeOutcome, PurchasedItem};
/// use pantry::inventory_model::InventoryLine;
///
/// let snapshot = vec![InventoryLine::new(1, 42, "courgette", 2.0, "pieces")];
/// let item = PurchasedItem {
///     name: "zucchini".into(),
///     quantity: 3.0,
///     unit: "pieces".into(),
///     expiry: None,
/// };
/// let purchase = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
///
/// match merge_purchased_item(&snapshot, &item, purchase) {
///     MergeOutcome::MergeInto { line_id, new_quantity, .. } => {
///         assert_eq!(line_id, 1);
///         assert_eq!(new_quantity, 5.0);
///     }
///     MergeOutcome::Insert(_) => panic!("synonyms should merge"),
/// }
/// ```
pub fn merge_purchased_item(
    snapshot: &[InventoryLine],
    item: &PurchasedItem,
    purchase_date: NaiveDate,
) -> MergeOutcome {
    let key = normalize(&item.name);

    // New-item expiry: user-supplied wins, else shelf-life estimate.
    let (item_expiry, item_estimated) = match item.expiry {
        Some(date) => (Some(date), false),
        None => match shelf_life::estimate_expiry(&item.name, purchase_date) {
            Some(date) => (Some(date), true),
            None => (None, false),
        },
    };

    let existing = snapshot
        .iter()
        .filter(|l| l.active)
        .find(|l| normalize(&l.name) == key);

    if let Some(line) = existing {
        if units_match(&line.unit, &item.unit) {
            // Conservative: the older stock expires first.
            let (expiry, estimated) = earlier_expiry(
                line.expiry,
                line.expiry_is_estimated,
                item_expiry,
                item_estimated,
            );
            info!(
                "merging purchase '{}' into line {} ('{}'): {} + {} {}",
                item.name, line.id, line.name, line.quantity, item.quantity, line.unit
            );
            return MergeOutcome::MergeInto {
                line_id: line.id,
                new_quantity: line.quantity + item.quantity,
                expiry,
                expiry_is_estimated: estimated,
            };
        }
        debug!(
            "purchase '{}' matches line {} but units differ ({} vs {}); keeping separate",
            item.name, line.id, item.unit, line.unit
        );
    }

    let reference = shelf_life::lookup(&item.name);
    MergeOutcome::Insert(NewInventoryLine {
        name: item.name.clone(),
        quantity: item.quantity,
        unit: item.unit.clone(),
        expiry: item_expiry,
        expiry_is_estimated: item_estimated,
        location: reference.map(|r| r.location),
        category: reference.map(|r| r.category).unwrap_or(Category::Other),
    })
}

/// Earlier of two optional expiry dates, carrying the matching estimated
/// flag.
fn earlier_expiry(
    a: Option<NaiveDate>,
    a_estimated: bool,
    b: Option<NaiveDate>,
    b_estimated: bool,
) -> (Option<NaiveDate>, bool) {
    match (a, b) {
        (Some(da), Some(db)) => {
            if da <= db {
                (Some(da), a_estimated)
            } else {
                (Some(db), b_estimated)
            }
        }
        (Some(da), None) => (Some(da), a_estimated),
        (None, Some(db)) => (Some(db), b_estimated),
        (None, None) => (None, false),
    }
}
