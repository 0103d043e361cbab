//! # Reconciliation Engine
//!
//! This module matches recipe requirement lines against a household's
//! inventory snapshot, computes consumption and shortfall per line, and —
//! on a separate, explicit apply step — commits the quantity deltas back
//! through the store contract.
//!
//! ## Design
//!
//! - The compute step is pure over its inputs: it reads a point-in-time
//!   snapshot and writes nothing, so it can run concurrently for any
//!   number of callers.
//! - The apply step trusts nothing from compute time: ownership is
//!   re-checked by the store and every write is conditional on the
//!   quantity observed at compute time, so a concurrent apply surfaces as
//!   a per-line conflict instead of a double deduction.
//! - "No match found" is an expected outcome reported in the record, never
//!   an error; only structurally invalid input and store unavailability
//!   fail a call.

use crate::inventory_model::{
    DeductionRecord, InventoryLine, InventoryMatch, LineStatus, RecommendedAction,
    RequirementLine, SmallQuantityThresholds, units_match,
};
use crate::similarity::similarity;
use crate::store::{InventoryStore, StoreError, UpdateOutcome};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Minimum similarity score an inventory candidate must clear to count as
/// a match.
pub const MIN_MATCH_SCORE: f64 = 0.6;

/// Scores closer than this are treated as tied and fall through to the
/// deterministic tie-break chain.
const SCORE_EPSILON: f64 = 1e-9;

/// Rejection of structurally invalid requirement lines.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// Non-positive quantity or empty ingredient name.
    InvalidInput(String),
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::InvalidInput(msg) => write!(f, "Invalid requirement line: {msg}"),
        }
    }
}

impl std::error::Error for ReconcileError {}

/// Whole-batch failure of the apply step.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyError {
    /// The write collaborator is unavailable; nothing was attempted
    /// beyond the failing call.
    StorageUnavailable(String),
}

impl std::fmt::Display for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ApplyError {}

/// Per-line outcome of the apply step. Partial failure is a first-class
/// result, not an exception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    /// The conditional write succeeded.
    Applied,
    /// The row's quantity moved since compute time; nothing was written.
    Conflict { actual: f64 },
    /// The row is gone or no longer belongs to the requesting user.
    NotFound,
    /// The record was not selected or carried no match; nothing to do.
    Skipped,
}

/// One line's apply result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineApplyResult {
    pub ingredient_name: String,
    pub line_id: Option<i64>,
    pub outcome: ApplyOutcome,
}

/// Structured summary of an apply batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplySummary {
    /// Number of rows actually written.
    pub updated_count: usize,
    pub per_line_results: Vec<LineApplyResult>,
}

/// Compute cooking deductions for a set of requirement lines against an
/// inventory snapshot.
///
/// Fails fast with [`ReconcileError::InvalidInput`] on a non-positive
/// quantity or empty name; otherwise always produces one record per line,
/// including unmatched ones.
///
/// # Examples
///
/// ```rust
/// use pantry::inventory_model::{InventoryLine, RequirementLine, SmallQuantityThresholds};
/// use pantry::reconciliation::calculate_deductions;
///
/// let snapshot = vec![InventoryLine::new(1, 42, "plain flour", 500.0, "g")];
/// let required = vec![RequirementLine::new("flour", 200.0, "g")];
///
/// let report = calculate_deductions(
///     &required,
///     &snapshot,
///     &SmallQuantityThresholds::default(),
/// ).unwrap();
///
/// assert_eq!(report[0].quantity_after_deduction, 300.0);
/// assert_eq!(report[0].shortfall, 0.0);
/// ```
pub fn calculate_deductions(
    requirements: &[RequirementLine],
    snapshot: &[InventoryLine],
    thresholds: &SmallQuantityThresholds,
) -> Result<Vec<DeductionRecord>, ReconcileError> {
    for line in requirements {
        if line.name.trim().is_empty() {
            return Err(ReconcileError::InvalidInput(
                "requirement with empty ingredient name".to_string(),
            ));
        }
        if line.quantity <= 0.0 {
            return Err(ReconcileError::InvalidInput(format!(
                "non-positive quantity {} for '{}'",
                line.quantity, line.name
            )));
        }
    }

    info!(
        "calculating deductions: {} requirements against {} inventory lines",
        requirements.len(),
        snapshot.len()
    );

    Ok(requirements
        .iter()
        .map(|req| reconcile_line(req, snapshot, thresholds))
        .collect())
}

/// Find the best-matching candidate and classify one requirement line.
fn reconcile_line(
    req: &RequirementLine,
    snapshot: &[InventoryLine],
    thresholds: &SmallQuantityThresholds,
) -> DeductionRecord {
    let best = best_match(req, snapshot);

    let Some((line, score)) = best else {
        debug!("'{}': no inventory match", req.name);
        return DeductionRecord {
            ingredient_name: req.name.clone(),
            recipe_quantity: req.quantity,
            recipe_unit: req.unit.clone(),
            inventory_match: None,
            current_inventory_quantity: 0.0,
            quantity_after_deduction: 0.0,
            shortfall: req.quantity,
            is_small_quantity: false,
            selected: false,
            status: LineStatus::Unmatched,
            action: RecommendedAction::AddToShoppingList,
        };
    };

    debug!(
        "'{}' matched inventory line {} ('{}') with score {:.3}",
        req.name, line.id, line.name, score
    );

    let matched = InventoryMatch {
        line_id: line.id,
        name: line.name.clone(),
        unit: line.unit.clone(),
    };

    if !units_match(&req.unit, &line.unit) {
        // Quantities in different unit strings cannot be safely combined;
        // surface the stock for visibility but deduct nothing.
        debug!(
            "'{}': unit mismatch ({} vs {}), no deduction",
            req.name, req.unit, line.unit
        );
        return DeductionRecord {
            ingredient_name: req.name.clone(),
            recipe_quantity: req.quantity,
            recipe_unit: req.unit.clone(),
            inventory_match: Some(matched),
            current_inventory_quantity: line.quantity,
            quantity_after_deduction: line.quantity,
            shortfall: req.quantity,
            is_small_quantity: false,
            selected: false,
            status: LineStatus::UnitMismatch,
            action: RecommendedAction::AddToShoppingList,
        };
    }

    let remaining = line.quantity - req.quantity;
    if remaining >= 0.0 {
        let threshold = thresholds.for_unit(&line.unit);
        let negligible = remaining > 0.0 && remaining < threshold;
        // A remainder below the threshold is consumed entirely rather than
        // left as an unusable sliver.
        let after = if negligible { 0.0 } else { remaining };
        DeductionRecord {
            ingredient_name: req.name.clone(),
            recipe_quantity: req.quantity,
            recipe_unit: req.unit.clone(),
            inventory_match: Some(matched),
            current_inventory_quantity: line.quantity,
            quantity_after_deduction: after,
            shortfall: 0.0,
            is_small_quantity: negligible,
            selected: true,
            status: if negligible {
                LineStatus::Negligible
            } else {
                LineStatus::Sufficient
            },
            action: RecommendedAction::DeductFromInventory,
        }
    } else {
        let shortfall = -remaining;
        DeductionRecord {
            ingredient_name: req.name.clone(),
            recipe_quantity: req.quantity,
            recipe_unit: req.unit.clone(),
            inventory_match: Some(matched),
            current_inventory_quantity: line.quantity,
            quantity_after_deduction: 0.0,
            shortfall,
            is_small_quantity: false,
            selected: false,
            status: LineStatus::Short,
            action: RecommendedAction::ReduceShoppingQuantity {
                use_from_stock: line.quantity,
                buy: shortfall,
            },
        }
    }
}

/// Highest-scoring active candidate above [`MIN_MATCH_SCORE`]. Ties break
/// by case-insensitive exact raw-name equality, then by larger stock
/// quantity, then by lower row id.
fn best_match<'a>(
    req: &RequirementLine,
    snapshot: &'a [InventoryLine],
) -> Option<(&'a InventoryLine, f64)> {
    let mut best: Option<(&InventoryLine, f64)> = None;

    for candidate in snapshot.iter().filter(|l| l.active) {
        let score = similarity(&req.name, &candidate.name);
        if score < MIN_MATCH_SCORE {
            continue;
        }
        best = match best {
            None => Some((candidate, score)),
            Some((held, held_score)) => {
                if beats(req, candidate, score, held, held_score) {
                    Some((candidate, score))
                } else {
                    Some((held, held_score))
                }
            }
        };
    }
    best
}

fn beats(
    req: &RequirementLine,
    challenger: &InventoryLine,
    challenger_score: f64,
    held: &InventoryLine,
    held_score: f64,
) -> bool {
    if (challenger_score - held_score).abs() > SCORE_EPSILON {
        return challenger_score > held_score;
    }
    let challenger_exact = challenger.name.eq_ignore_ascii_case(&req.name);
    let held_exact = held.name.eq_ignore_ascii_case(&req.name);
    if challenger_exact != held_exact {
        return challenger_exact;
    }
    if (challenger.quantity - held.quantity).abs() > SCORE_EPSILON {
        // Prefer consuming from the larger stock.
        return challenger.quantity > held.quantity;
    }
    challenger.id < held.id
}

/// Apply selected deduction records through the store contract.
///
/// Operates only on records with `selected = true` and a present match;
/// everything else is reported as skipped. Each write is conditional on
/// the quantity observed at compute time, so re-applying an already
/// applied (now stale) record reports a conflict instead of deducting
/// twice. One line's failure never aborts the batch; store unavailability
/// fails the whole call with [`ApplyError::StorageUnavailable`].
pub fn apply_deductions(
    store: &dyn InventoryStore,
    records: &[DeductionRecord],
    owner_id: i64,
) -> Result<ApplySummary, ApplyError> {
    let mut updated_count = 0;
    let mut per_line_results = Vec::with_capacity(records.len());

    for record in records {
        let matched = match (&record.inventory_match, record.selected) {
            (Some(matched), true) => matched,
            _ => {
                per_line_results.push(LineApplyResult {
                    ingredient_name: record.ingredient_name.clone(),
                    line_id: record.inventory_match.as_ref().map(|m| m.line_id),
                    outcome: ApplyOutcome::Skipped,
                });
                continue;
            }
        };

        let result = store.update_quantity(
            owner_id,
            matched.line_id,
            record.current_inventory_quantity,
            record.quantity_after_deduction.max(0.0),
        );

        let outcome = match result {
            Ok(UpdateOutcome::Updated) => {
                updated_count += 1;
                ApplyOutcome::Applied
            }
            Ok(UpdateOutcome::Conflict { actual }) => ApplyOutcome::Conflict { actual },
            Ok(UpdateOutcome::NotFound) => ApplyOutcome::NotFound,
            Err(StoreError::Unavailable(msg)) => {
                return Err(ApplyError::StorageUnavailable(msg));
            }
        };

        per_line_results.push(LineApplyResult {
            ingredient_name: record.ingredient_name.clone(),
            line_id: Some(matched.line_id),
            outcome,
        });
    }

    info!(
        "apply batch for owner {}: {} of {} lines written",
        owner_id,
        updated_count,
        records.len()
    );

    Ok(ApplySummary {
        updated_count,
        per_line_results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn thresholds() -> SmallQuantityThresholds {
        SmallQuantityThresholds::default()
    }

    #[test]
    fn test_sufficient_stock() {
        let snapshot = vec![InventoryLine::new(1, 42, "flour", 500.0, "g")];
        let required = vec![RequirementLine::new("flour", 200.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        let record = &report[0];

        assert_eq!(record.status, LineStatus::Sufficient);
        assert_eq!(record.shortfall, 0.0);
        assert_eq!(record.quantity_after_deduction, 300.0);
        assert!(record.selected);
        assert!(!record.is_small_quantity);
        assert_eq!(record.action, RecommendedAction::DeductFromInventory);
    }

    #[test]
    fn test_short_stock() {
        let snapshot = vec![InventoryLine::new(1, 42, "flour", 100.0, "g")];
        let required = vec![RequirementLine::new("flour", 200.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        let record = &report[0];

        assert_eq!(record.status, LineStatus::Short);
        assert_eq!(record.shortfall, 100.0);
        assert_eq!(record.quantity_after_deduction, 0.0);
        assert!(!record.selected);
        assert_eq!(
            record.action,
            RecommendedAction::ReduceShoppingQuantity {
                use_from_stock: 100.0,
                buy: 100.0,
            }
        );
    }

    #[test]
    fn test_negligible_remainder_fully_consumed() {
        // 505 g - 500 g leaves 5 g, below the 10 g mass threshold.
        let snapshot = vec![InventoryLine::new(1, 42, "flour", 505.0, "g")];
        let required = vec![RequirementLine::new("flour", 500.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        let record = &report[0];

        assert_eq!(record.status, LineStatus::Negligible);
        assert!(record.is_small_quantity);
        assert_eq!(record.quantity_after_deduction, 0.0);
        assert_eq!(record.shortfall, 0.0);
        assert!(record.selected);
    }

    #[test]
    fn test_exact_depletion_is_sufficient_not_negligible() {
        let snapshot = vec![InventoryLine::new(1, 42, "flour", 200.0, "g")];
        let required = vec![RequirementLine::new("flour", 200.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        assert_eq!(report[0].status, LineStatus::Sufficient);
        assert!(!report[0].is_small_quantity);
        assert_eq!(report[0].quantity_after_deduction, 0.0);
    }

    #[test]
    fn test_count_units_have_no_negligible_band() {
        let snapshot = vec![InventoryLine::new(1, 42, "eggs", 6.0, "pieces")];
        let required = vec![RequirementLine::new("eggs", 5.0, "pieces")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        assert_eq!(report[0].status, LineStatus::Sufficient);
        assert_eq!(report[0].quantity_after_deduction, 1.0);
    }

    #[test]
    fn test_unmatched_requirement() {
        let snapshot = vec![InventoryLine::new(1, 42, "beef", 300.0, "g")];
        let required = vec![RequirementLine::new("saffron", 1.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        let record = &report[0];

        assert_eq!(record.status, LineStatus::Unmatched);
        assert!(record.inventory_match.is_none());
        assert_eq!(record.shortfall, 1.0);
        assert!(!record.selected);
        assert_eq!(record.action, RecommendedAction::AddToShoppingList);
    }

    #[test]
    fn test_unit_mismatch_surfaces_stock_without_deducting() {
        let snapshot = vec![InventoryLine::new(1, 42, "milk", 1.0, "l")];
        let required = vec![RequirementLine::new("milk", 2.0, "cups")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        let record = &report[0];

        assert_eq!(record.status, LineStatus::UnitMismatch);
        assert!(record.inventory_match.is_some());
        assert_eq!(record.current_inventory_quantity, 1.0);
        // No deduction across incompatible unit strings.
        assert_eq!(record.quantity_after_deduction, 1.0);
        assert_eq!(record.shortfall, 2.0);
        assert!(!record.selected);
        assert_eq!(record.action, RecommendedAction::AddToShoppingList);
    }

    #[test]
    fn test_case_folded_units_do_match() {
        let snapshot = vec![InventoryLine::new(1, 42, "milk", 1000.0, "ML")];
        let required = vec![RequirementLine::new("milk", 250.0, "ml")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        assert_eq!(report[0].status, LineStatus::Sufficient);
        assert_eq!(report[0].quantity_after_deduction, 750.0);
    }

    #[test]
    fn test_fuzzy_name_match() {
        // "plain flour" and "flour" share a canonical containment.
        let snapshot = vec![InventoryLine::new(1, 42, "plain flour", 500.0, "g")];
        let required = vec![RequirementLine::new("flour", 200.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        assert_eq!(report[0].status, LineStatus::Sufficient);
        assert_eq!(report[0].inventory_match.as_ref().unwrap().line_id, 1);
    }

    #[test]
    fn test_tie_break_prefers_exact_name() {
        // Both candidates normalize to "tomato"; score ties at 1.0 and the
        // exact raw name wins even though the other holds more stock.
        let snapshot = vec![
            InventoryLine::new(1, 42, "tomatoes", 900.0, "g"),
            InventoryLine::new(2, 42, "tomato", 400.0, "g"),
        ];
        let required = vec![RequirementLine::new("tomato", 100.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        assert_eq!(report[0].inventory_match.as_ref().unwrap().line_id, 2);
    }

    #[test]
    fn test_tie_break_prefers_larger_stock() {
        let snapshot = vec![
            InventoryLine::new(1, 42, "tomatoes", 200.0, "g"),
            InventoryLine::new(2, 42, "tomatos", 900.0, "g"),
        ];
        let required = vec![RequirementLine::new("tomato", 100.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        assert_eq!(report[0].inventory_match.as_ref().unwrap().line_id, 2);
    }

    #[test]
    fn test_tie_break_falls_back_to_lower_id() {
        let snapshot = vec![
            InventoryLine::new(5, 42, "tomatoes", 200.0, "g"),
            InventoryLine::new(3, 42, "tomatos", 200.0, "g"),
        ];
        let required = vec![RequirementLine::new("tomato", 100.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        assert_eq!(report[0].inventory_match.as_ref().unwrap().line_id, 3);
    }

    #[test]
    fn test_inactive_lines_ignored() {
        let mut line = InventoryLine::new(1, 42, "flour", 500.0, "g");
        line.active = false;
        let required = vec![RequirementLine::new("flour", 200.0, "g")];

        let report = calculate_deductions(&required, &[line], &thresholds()).unwrap();
        assert_eq!(report[0].status, LineStatus::Unmatched);
    }

    #[test]
    fn test_invalid_input_rejected() {
        let snapshot = vec![InventoryLine::new(1, 42, "flour", 500.0, "g")];

        let err = calculate_deductions(
            &[RequirementLine::new("flour", 0.0, "g")],
            &snapshot,
            &thresholds(),
        )
        .unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidInput(_)));

        let err = calculate_deductions(
            &[RequirementLine::new("  ", 100.0, "g")],
            &snapshot,
            &thresholds(),
        )
        .unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidInput(_)));
    }

    #[test]
    fn test_apply_writes_selected_lines() {
        let store = MemoryStore::with_lines(vec![
            InventoryLine::new(1, 42, "flour", 500.0, "g"),
            InventoryLine::new(2, 42, "milk", 1000.0, "ml"),
        ]);
        let snapshot = store.active_inventory(42).unwrap();
        let required = vec![
            RequirementLine::new("flour", 200.0, "g"),
            RequirementLine::new("milk", 250.0, "ml"),
        ];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        let summary = apply_deductions(&store, &report, 42).unwrap();

        assert_eq!(summary.updated_count, 2);
        assert_eq!(store.get(1).unwrap().quantity, 300.0);
        assert_eq!(store.get(2).unwrap().quantity, 750.0);
    }

    #[test]
    fn test_apply_skips_unselected_lines() {
        let store = MemoryStore::with_lines(vec![InventoryLine::new(1, 42, "flour", 100.0, "g")]);
        let snapshot = store.active_inventory(42).unwrap();
        let required = vec![RequirementLine::new("flour", 200.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        assert!(!report[0].selected);

        let summary = apply_deductions(&store, &report, 42).unwrap();
        assert_eq!(summary.updated_count, 0);
        assert_eq!(summary.per_line_results[0].outcome, ApplyOutcome::Skipped);
        // Stock untouched.
        assert_eq!(store.get(1).unwrap().quantity, 100.0);
    }

    #[test]
    fn test_reapplying_stale_records_conflicts_not_double_deducts() {
        let store = MemoryStore::with_lines(vec![InventoryLine::new(1, 42, "flour", 500.0, "g")]);
        let snapshot = store.active_inventory(42).unwrap();
        let required = vec![RequirementLine::new("flour", 200.0, "g")];

        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();
        apply_deductions(&store, &report, 42).unwrap();
        assert_eq!(store.get(1).unwrap().quantity, 300.0);

        // Same (now stale) records again: the conditional write must refuse.
        let summary = apply_deductions(&store, &report, 42).unwrap();
        assert_eq!(summary.updated_count, 0);
        assert_eq!(
            summary.per_line_results[0].outcome,
            ApplyOutcome::Conflict { actual: 300.0 }
        );
        assert_eq!(store.get(1).unwrap().quantity, 300.0);
    }

    #[test]
    fn test_apply_reports_missing_rows_per_line() {
        let store = MemoryStore::with_lines(vec![
            InventoryLine::new(1, 42, "flour", 500.0, "g"),
            InventoryLine::new(2, 42, "milk", 1000.0, "ml"),
        ]);
        let snapshot = store.active_inventory(42).unwrap();
        let required = vec![
            RequirementLine::new("flour", 200.0, "g"),
            RequirementLine::new("milk", 250.0, "ml"),
        ];
        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();

        // The milk row disappears before apply (host-side CRUD).
        let mut gone = store.get(2).unwrap();
        gone.active = false;
        store.upsert(gone);

        let summary = apply_deductions(&store, &report, 42).unwrap();
        assert_eq!(summary.updated_count, 1);

        let milk = summary
            .per_line_results
            .iter()
            .find(|r| r.ingredient_name == "milk")
            .unwrap();
        assert_eq!(milk.outcome, ApplyOutcome::NotFound);
    }

    #[test]
    fn test_apply_rechecks_ownership() {
        let store = MemoryStore::with_lines(vec![InventoryLine::new(1, 42, "flour", 500.0, "g")]);
        let snapshot = store.active_inventory(42).unwrap();
        let required = vec![RequirementLine::new("flour", 200.0, "g")];
        let report = calculate_deductions(&required, &snapshot, &thresholds()).unwrap();

        // Applied as a different user: the store refuses every line.
        let summary = apply_deductions(&store, &report, 7).unwrap();
        assert_eq!(summary.updated_count, 0);
        assert_eq!(summary.per_line_results[0].outcome, ApplyOutcome::NotFound);
        assert_eq!(store.get(1).unwrap().quantity, 500.0);
    }
}
