//! # Shelf-Life Reference Data
//!
//! This module holds the static shelf-life reference table and the fuzzy
//! lookup used when importing purchases: category, typical shelf life in
//! days, and a default storage location per ingredient.
//!
//! Lookup runs three tiers against the table, first hit wins: exact
//! canonical-key match, substring match (either direction), then word
//! overlap. "Not found" is a normal outcome, not an error — callers fall
//! back to [`Category::Other`], no estimated shelf life, and manual
//! location assignment.

use crate::normalize::normalize;
use chrono::{Duration, NaiveDate};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Where an ingredient is stored by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageLocation {
    /// Refrigerated storage.
    Fridge,
    /// Frozen storage.
    Freezer,
    /// Ambient cupboard/pantry storage.
    Cupboard,
    /// Open counter (bananas, tomatoes ripening).
    Counter,
}

/// Broad ingredient category used for grouping and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Produce,
    Meat,
    Fish,
    Dairy,
    Bakery,
    DryGoods,
    Herbs,
    Condiments,
    /// Fallback for ingredients the reference table does not know.
    Other,
}

/// One immutable reference entry. Loaded once, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShelfLifeRecord {
    /// Raw-name form used for matching.
    pub name: &'static str,
    /// Canonical key, precomputed at load.
    pub key: String,
    pub category: Category,
    /// Typical shelf life in days from purchase.
    pub shelf_life_days: i64,
    pub location: StorageLocation,
}

fn entry(
    name: &'static str,
    category: Category,
    shelf_life_days: i64,
    location: StorageLocation,
) -> ShelfLifeRecord {
    ShelfLifeRecord {
        name,
        key: normalize(name),
        category,
        shelf_life_days,
        location,
    }
}

/// The reference table. Keys are unique, the substring tier prefers the
/// longest key, so order only decides ties in the word-match tier.
static SHELF_LIFE_TABLE: LazyLock<Vec<ShelfLifeRecord>> = LazyLock::new(|| {
    use Category::*;
    use StorageLocation::*;
    vec![
        // Meat and fish
        entry("chicken", Meat, 2, Fridge),
        entry("beef mince", Meat, 2, Fridge),
        entry("beef", Meat, 3, Fridge),
        entry("pork", Meat, 3, Fridge),
        entry("lamb", Meat, 3, Fridge),
        entry("bacon", Meat, 7, Fridge),
        entry("sausages", Meat, 3, Fridge),
        entry("salmon", Fish, 2, Fridge),
        entry("cod", Fish, 2, Fridge),
        entry("prawns", Fish, 1, Fridge),
        entry("tuna", Fish, 2, Fridge),
        // Dairy and eggs
        entry("milk", Dairy, 7, Fridge),
        entry("double cream", Dairy, 5, Fridge),
        entry("cheddar cheese", Dairy, 21, Fridge),
        entry("cheese", Dairy, 14, Fridge),
        entry("butter", Dairy, 30, Fridge),
        entry("yoghurt", Dairy, 10, Fridge),
        entry("eggs", Dairy, 21, Fridge),
        // Produce
        entry("spring onion", Produce, 7, Fridge),
        entry("onion", Produce, 30, Cupboard),
        entry("garlic", Produce, 60, Cupboard),
        entry("potato", Produce, 21, Cupboard),
        entry("sweet potato", Produce, 14, Cupboard),
        entry("carrot", Produce, 21, Fridge),
        entry("tomato", Produce, 7, Counter),
        entry("cherry tomato", Produce, 7, Fridge),
        entry("lettuce", Produce, 5, Fridge),
        entry("spinach", Produce, 4, Fridge),
        entry("broccoli", Produce, 5, Fridge),
        entry("cauliflower", Produce, 7, Fridge),
        entry("courgette", Produce, 7, Fridge),
        entry("aubergine", Produce, 7, Fridge),
        entry("pepper", Produce, 10, Fridge),
        entry("cucumber", Produce, 7, Fridge),
        entry("mushroom", Produce, 5, Fridge),
        entry("celery", Produce, 14, Fridge),
        entry("leek", Produce, 10, Fridge),
        entry("cabbage", Produce, 14, Fridge),
        entry("apple", Produce, 21, Fridge),
        entry("banana", Produce, 5, Counter),
        entry("lemon", Produce, 21, Fridge),
        entry("lime", Produce, 14, Fridge),
        entry("orange", Produce, 14, Counter),
        entry("avocado", Produce, 4, Counter),
        entry("strawberries", Produce, 3, Fridge),
        entry("blueberries", Produce, 7, Fridge),
        entry("grapes", Produce, 7, Fridge),
        // Herbs
        entry("basil", Herbs, 5, Counter),
        entry("coriander", Herbs, 5, Fridge),
        entry("parsley", Herbs, 7, Fridge),
        entry("thyme", Herbs, 10, Fridge),
        entry("rosemary", Herbs, 10, Fridge),
        entry("mint", Herbs, 7, Fridge),
        // Bakery
        entry("bread", Bakery, 5, Cupboard),
        entry("tortilla wraps", Bakery, 7, Cupboard),
        // Dry goods
        entry("plain flour", DryGoods, 365, Cupboard),
        entry("flour", DryGoods, 365, Cupboard),
        entry("sugar", DryGoods, 720, Cupboard),
        entry("rice", DryGoods, 720, Cupboard),
        entry("pasta", DryGoods, 720, Cupboard),
        entry("couscous", DryGoods, 365, Cupboard),
        entry("oats", DryGoods, 365, Cupboard),
        entry("chickpea", DryGoods, 365, Cupboard),
        entry("lentils", DryGoods, 365, Cupboard),
        // Condiments and oils
        entry("olive oil", Condiments, 540, Cupboard),
        entry("vegetable oil", Condiments, 540, Cupboard),
        entry("soy sauce", Condiments, 365, Cupboard),
        entry("tomato puree", Condiments, 365, Cupboard),
        entry("mayonnaise", Condiments, 60, Fridge),
        entry("ketchup", Condiments, 180, Fridge),
        entry("stock cube", Condiments, 365, Cupboard),
    ]
});

/// Look up shelf-life reference data for a raw ingredient name.
///
/// Tiers, tried in order, first hit wins:
///
/// 1. Exact: normalized input equals a table entry's key.
/// 2. Substring: normalized input contains the entry's key, or vice versa;
///    the longest matching key wins.
/// 3. Word match: any input word longer than 2 characters contains, or is
///    contained in, any reference word.
///
/// Returns `None` when no tier matches.
///
/// # Examples
///
/// ```rust
/// use pantry::shelf_life::{lookup, Category};
///
/// let record = lookup("2 chicken breasts").expect("known ingredient");
/// assert_eq!(record.category, Category::Meat);
/// assert!(lookup("dragon fruit").is_none());
/// ```
pub fn lookup(raw: &str) -> Option<&'static ShelfLifeRecord> {
    let key = normalize(raw);
    if key.is_empty() {
        return None;
    }

    // Tier 1: exact key equality.
    if let Some(record) = SHELF_LIFE_TABLE.iter().find(|r| r.key == key) {
        trace!("shelf-life exact match: '{}' -> '{}'", raw, record.name);
        return Some(record);
    }

    // Tier 2: substring either direction. The longest key wins so specific
    // entries beat generic ones ("sweet potato" over "potato").
    if let Some(record) = SHELF_LIFE_TABLE
        .iter()
        .filter(|r| key.contains(&r.key) || r.key.contains(&key))
        .max_by_key(|r| r.key.len())
    {
        trace!("shelf-life substring match: '{}' -> '{}'", raw, record.name);
        return Some(record);
    }

    // Tier 3: word-level containment, short words ignored.
    let words: Vec<&str> = key.split_whitespace().filter(|w| w.len() > 2).collect();
    for record in SHELF_LIFE_TABLE.iter() {
        let ref_words = record.key.split_whitespace().filter(|w| w.len() > 2);
        for ref_word in ref_words {
            if words
                .iter()
                .any(|w| w.contains(ref_word) || ref_word.contains(w))
            {
                trace!("shelf-life word match: '{}' -> '{}'", raw, record.name);
                return Some(record);
            }
        }
    }

    debug!("no shelf-life reference entry for '{}'", raw);
    None
}

/// Estimate an expiry date by adding the reference shelf life to a purchase
/// date. Returns `None` for unknown ingredients. Callers recording the
/// result must flag it as estimated rather than user-supplied.
pub fn estimate_expiry(raw: &str, purchase_date: NaiveDate) -> Option<NaiveDate> {
    lookup(raw).map(|record| purchase_date + Duration::days(record.shelf_life_days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let record = lookup("milk").unwrap();
        assert_eq!(record.name, "milk");
        assert_eq!(record.category, Category::Dairy);
        assert_eq!(record.location, StorageLocation::Fridge);
    }

    #[test]
    fn test_exact_beats_substring() {
        // "cherry tomatoes" has its own entry; the substring tier would have
        // settled for plain "tomato".
        let record = lookup("cherry tomatoes").unwrap();
        assert_eq!(record.name, "cherry tomato");

        let record = lookup("sweet potatoes").unwrap();
        assert_eq!(record.name, "sweet potato");
    }

    #[test]
    fn test_substring_match() {
        // "basmati rice" contains the "rice" entry key.
        let record = lookup("basmati rice").unwrap();
        assert_eq!(record.name, "rice");

        // Reverse direction: input key contained in a reference key.
        let record = lookup("cheddar").unwrap();
        assert_eq!(record.name, "cheddar cheese");
    }

    #[test]
    fn test_substring_prefers_most_specific_entry() {
        // Both "potato" and "sweet potato" are substrings; the longer key wins.
        let record = lookup("sweet potato mash").unwrap();
        assert_eq!(record.name, "sweet potato");

        let record = lookup("double concentrated tomato puree").unwrap();
        assert_eq!(record.name, "tomato puree");
    }

    #[test]
    fn test_word_match() {
        // No substring relation with "soy sauce" as a whole, but the word
        // "sauce" overlaps.
        let record = lookup("hoisin sauce").unwrap();
        assert_eq!(record.category, Category::Condiments);
    }

    #[test]
    fn test_word_match_ignores_short_words() {
        // Two-character words never participate in tier 3.
        assert!(lookup("xy").is_none());
    }

    #[test]
    fn test_unknown_ingredient_returns_none() {
        assert!(lookup("dragon fruit").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_normalized_forms_resolve() {
        // Synonyms and modifiers resolve through normalization.
        let record = lookup("2 large eggplants").unwrap();
        assert_eq!(record.name, "aubergine");

        let record = lookup("fresh basil leaves").unwrap();
        assert_eq!(record.category, Category::Herbs);
    }

    #[test]
    fn test_estimate_expiry() {
        let purchase = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let expiry = estimate_expiry("milk", purchase).unwrap();
        assert_eq!(expiry, NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());

        assert!(estimate_expiry("dragon fruit", purchase).is_none());
    }
}
