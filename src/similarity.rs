//! # Ingredient Similarity Scoring
//!
//! This module compares two free-text ingredient names via their canonical
//! keys and produces a graded score in [0.0, 1.0], plus a coarse confidence
//! bucket for callers that only need HIGH/MEDIUM/LOW.
//!
//! ## Usage
//!
//! ```rust
//! use pantry::similarity::{similarity, ConfidenceLevel};
//!
//! let score = similarity("chicken breast", "chicken breasts");
//! assert_eq!(score, 1.0);
//! assert_eq!(ConfidenceLevel::from_score(score), ConfidenceLevel::High);
//! ```

use crate::normalize::normalize;
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Base of the containment band: one key is a substring of the other.
const CONTAINMENT_BASE: f64 = 0.55;
/// Width of the containment band; the band stays strictly inside (0, 1).
const CONTAINMENT_SPAN: f64 = 0.40;

/// Coarse bucket summarizing a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    /// Score ≥ 0.9: safe to treat as the same ingredient.
    High,
    /// Score in [0.6, 0.9): likely the same, worth confirming.
    Medium,
    /// Score < 0.6: probably different ingredients.
    Low,
}

impl ConfidenceLevel {
    /// Classify a similarity score by fixed thresholds.
    ///
    /// Total over [0, 1]; scores of exactly 0.9 and 0.6 classify as
    /// `High` and `Medium` respectively.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ConfidenceLevel::High
        } else if score >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Score how likely two raw ingredient names refer to the same ingredient.
///
/// - Equal canonical keys (including two empty inputs) score 1.0.
/// - One empty key against a non-empty one scores 0.0.
/// - One key containing the other scores inside (0, 1), scaled by the
///   length ratio of the shorter key to the longer — the scoring is
///   symmetric in its arguments.
/// - Otherwise the token-overlap ratio (shared ÷ union) is returned,
///   0.0 when the keys share no tokens.
///
/// # Examples
///
/// ```rust
/// use pantry::similarity::similarity;
///
/// assert_eq!(similarity("Aubergine", "eggplant"), 1.0);
/// assert_eq!(similarity("apple", "beef"), 0.0);
/// let partial = similarity("chicken", "chicken stock");
/// assert!(partial > 0.0 && partial < 1.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    let ka = normalize(a);
    let kb = normalize(b);

    if ka == kb {
        return 1.0;
    }
    if ka.is_empty() || kb.is_empty() {
        return 0.0;
    }

    if ka.contains(&kb) || kb.contains(&ka) {
        let (shorter, longer) = if ka.len() <= kb.len() {
            (ka.len(), kb.len())
        } else {
            (kb.len(), ka.len())
        };
        let ratio = shorter as f64 / longer as f64;
        let score = (CONTAINMENT_BASE + CONTAINMENT_SPAN * ratio).clamp(0.01, 0.99);
        trace!("similarity: containment '{}' / '{}' -> {:.3}", ka, kb, score);
        return score;
    }

    let tokens_a: HashSet<&str> = ka.split_whitespace().collect();
    let tokens_b: HashSet<&str> = kb.split_whitespace().collect();
    let shared = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 0.0;
    }
    let score = shared as f64 / union as f64;
    trace!("similarity: overlap '{}' / '{}' -> {:.3}", ka, kb, score);
    score
}
