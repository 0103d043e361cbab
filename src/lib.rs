//! # Pantry
//!
//! Ingredient identity resolution and quantity reconciliation for a
//! household meal-planning application: canonical name normalization,
//! similarity scoring, duplicate grouping, shelf-life lookup, and
//! unit-aware stock deduction.

pub mod duplicate_detection;
pub mod import_merge;
pub mod inventory_model;
pub mod normalize;
pub mod reconciliation;
pub mod shelf_life;
pub mod similarity;
pub mod store;
