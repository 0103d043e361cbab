//! # Duplicate Detection
//!
//! This module partitions named records (shopping-list items, inventory
//! rows) into equivalence groups by canonical key. Synonymous raw names
//! ("eggplant" and "aubergine") land in the same group because grouping
//! keys directly on the normalized form — this is a strict partition, not
//! fuzzy clustering.

use crate::normalize::normalize;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An externally identified record carrying a raw ingredient name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRecord {
    /// Identifier owned by the caller (row id, list-item id, ...).
    pub id: i64,
    /// The raw, user- or AI-supplied name.
    pub name: String,
}

/// A set of records sharing one canonical key. Only meaningful with two or
/// more members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The shared canonical key.
    pub normalized_name: String,
    /// The records that collapsed onto it, in input order.
    pub items: Vec<NamedRecord>,
}

/// Partition records by canonical key.
///
/// Every input record appears in exactly one group; within a group, input
/// order is preserved.
pub fn group(items: &[NamedRecord]) -> HashMap<String, Vec<NamedRecord>> {
    let mut groups: HashMap<String, Vec<NamedRecord>> = HashMap::new();
    for item in items {
        groups
            .entry(normalize(&item.name))
            .or_default()
            .push(item.clone());
    }
    debug!("grouped {} records into {} keys", items.len(), groups.len());
    groups
}

/// Surface groups with two or more members as duplicate candidates.
///
/// Groups are returned sorted by canonical key so output is deterministic.
///
/// # Examples
///
/// ```rust
/// use pantry::duplicate_detection::{find_duplicates, NamedRecord};
///
/// let items = vec![
///     NamedRecord { id: 1, name: "eggplant".into() },
///     NamedRecord { id: 2, name: "aubergine".into() },
///     NamedRecord { id: 3, name: "pork".into() },
/// ];
/// let dupes = find_duplicates(&items);
/// assert_eq!(dupes.len(), 1);
/// assert_eq!(dupes[0].normalized_name, "aubergine");
/// ```
pub fn find_duplicates(items: &[NamedRecord]) -> Vec<DuplicateGroup> {
    let mut duplicates: Vec<DuplicateGroup> = group(items)
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(normalized_name, items)| DuplicateGroup {
            normalized_name,
            items,
        })
        .collect();
    duplicates.sort_by(|a, b| a.normalized_name.cmp(&b.normalized_name));
    debug!("found {} duplicate groups", duplicates.len());
    duplicates
}
