//! # Inventory Store Contract
//!
//! The reconciliation engine does not talk to persistence directly; the
//! host application supplies two narrow operations behind the
//! [`InventoryStore`] trait: a snapshot read of a user's active inventory
//! and a per-row conditional quantity update.
//!
//! The conditional update is the concurrency guard: two reconciliations for
//! the same household applied at once must not double-deduct a single
//! stock line, so each write carries the quantity it expects to replace and
//! fails with [`UpdateOutcome::Conflict`] when the row has moved on.
//!
//! [`MemoryStore`] is an in-process implementation used by tests.

use crate::inventory_model::InventoryLine;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Mutex;

/// Failure of the storage collaborator itself, as opposed to expected
/// per-row outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backing store cannot be reached at all.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Result of a conditional quantity update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The expected quantity matched and the row was written.
    Updated,
    /// The row's quantity no longer matched the expectation; nothing was
    /// written. Carries the quantity actually found.
    Conflict { actual: f64 },
    /// No active row with this id belongs to the given owner.
    NotFound,
}

/// The narrow read/write contract the host application supplies.
pub trait InventoryStore {
    /// Point-in-time snapshot of the owner's active inventory lines.
    fn active_inventory(&self, owner_id: i64) -> Result<Vec<InventoryLine>, StoreError>;

    /// Conditionally set one row's quantity, scoped to the owning user.
    ///
    /// Writes `new_quantity` only if the row currently holds
    /// `expected_quantity` (compared within a small epsilon to absorb float
    /// round-trips). Rows reaching zero stay in place for audit history.
    fn update_quantity(
        &self,
        owner_id: i64,
        line_id: i64,
        expected_quantity: f64,
        new_quantity: f64,
    ) -> Result<UpdateOutcome, StoreError>;
}

/// Tolerance for the optimistic quantity comparison.
const QUANTITY_EPSILON: f64 = 1e-9;

/// In-memory implementation of [`InventoryStore`], keyed by line id.
pub struct MemoryStore {
    lines: Mutex<HashMap<i64, InventoryLine>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(HashMap::new()),
        }
    }

    /// Seed the store with inventory lines.
    pub fn with_lines(lines: Vec<InventoryLine>) -> Self {
        let store = Self::new();
        {
            let mut map = store.lines.lock().expect("store lock poisoned");
            for line in lines {
                map.insert(line.id, line);
            }
        }
        store
    }

    /// Insert or replace a line.
    pub fn upsert(&self, line: InventoryLine) {
        info!("upserting inventory line {} ('{}')", line.id, line.name);
        self.lines
            .lock()
            .expect("store lock poisoned")
            .insert(line.id, line);
    }

    /// Fetch one line by id, regardless of owner. Test/inspection helper.
    pub fn get(&self, line_id: i64) -> Option<InventoryLine> {
        self.lines
            .lock()
            .expect("store lock poisoned")
            .get(&line_id)
            .cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryStore for MemoryStore {
    fn active_inventory(&self, owner_id: i64) -> Result<Vec<InventoryLine>, StoreError> {
        let map = self.lines.lock().expect("store lock poisoned");
        let mut lines: Vec<InventoryLine> = map
            .values()
            .filter(|l| l.owner_id == owner_id && l.active)
            .cloned()
            .collect();
        // Deterministic snapshot order.
        lines.sort_by_key(|l| l.id);
        debug!("snapshot for owner {}: {} active lines", owner_id, lines.len());
        Ok(lines)
    }

    fn update_quantity(
        &self,
        owner_id: i64,
        line_id: i64,
        expected_quantity: f64,
        new_quantity: f64,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut map = self.lines.lock().expect("store lock poisoned");
        let line = match map.get_mut(&line_id) {
            Some(line) if line.owner_id == owner_id && line.active => line,
            _ => {
                info!("update for line {} rejected: not found for owner {}", line_id, owner_id);
                return Ok(UpdateOutcome::NotFound);
            }
        };

        if (line.quantity - expected_quantity).abs() > QUANTITY_EPSILON {
            info!(
                "update for line {} conflicted: expected {}, found {}",
                line_id, expected_quantity, line.quantity
            );
            return Ok(UpdateOutcome::Conflict {
                actual: line.quantity,
            });
        }

        line.quantity = new_quantity.max(0.0);
        info!("line {} quantity set to {}", line_id, line.quantity);
        Ok(UpdateOutcome::Updated)
    }
}
