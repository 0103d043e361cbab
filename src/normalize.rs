//! # Ingredient Name Normalizer
//!
//! This module reduces free-text ingredient names to a canonical key used as
//! an equality key across shopping-list deduplication, inventory import and
//! cooking-time stock deduction.
//!
//! ## Features
//!
//! - Strips quantities, packaging notes and preparation instructions
//! - Removes freshness/quality/size/dietary modifiers
//! - Resolves US spellings to their UK equivalents (eggplant → aubergine)
//! - Drops portion words (cloves, breasts, slices) and singularizes plurals
//!
//! ## Usage
//!
//! ```rust
//! use pantry::normalize::normalize;
//!
//! assert_eq!(normalize("2 large organic chicken breasts, sliced"), "chicken");
//! assert_eq!(normalize("Eggplant"), normalize("aubergine"));
//! ```
//!
//! Normalization is a total, pure function: it never fails, empty input
//! yields an empty key, and the output is a fixpoint
//! (`normalize(normalize(x)) == normalize(x)`).

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

lazy_static! {
    // Matches a parenthesized segment, or an unclosed trailing one.
    static ref PARENS: Regex = Regex::new(r"\([^()]*\)?").expect("parens pattern should be valid");
}

/// Preparation words stripped wherever they appear as whole tokens.
static PREP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "diced", "chopped", "minced", "sliced", "grated", "crushed", "shredded", "peeled",
        "trimmed", "rinsed", "washed", "drained", "halved", "quartered", "beaten", "whisked",
        "melted", "softened", "cubed", "julienned", "deseeded", "finely", "roughly", "coarsely",
        "thinly", "thickly", "and",
    ]
    .into_iter()
    .collect()
});

/// Single-word freshness/quality/size/dietary modifiers.
static MODIFIER_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "fresh", "dried", "frozen", "canned", "tinned", "raw", "cooked", "ripe", "organic",
        "large", "medium", "small", "extra", "baby", "whole", "lean", "skinless", "boneless",
        "unsalted", "salted", "unsweetened", "reduced", "light",
    ]
    .into_iter()
    .collect()
});

/// Multi-word modifiers, matched after hyphens are split into spaces so that
/// "low-fat" and "low fat" behave identically.
static MODIFIER_PHRASES: &[&str] = &[
    "free range",
    "grass fed",
    "corn fed",
    "low fat",
    "full fat",
    "sugar free",
    "gluten free",
    "semi skimmed",
];

/// US → UK whole-phrase synonym table. Applied longest-phrase-first as the
/// final pipeline stage, so keys and replacements are both written in
/// already-singularized form and replacements are fixpoints of the whole
/// pipeline.
static SYNONYMS: LazyLock<Vec<(&'static str, &'static str)>> = LazyLock::new(|| {
    let mut table = vec![
        ("eggplant", "aubergine"),
        ("zucchini", "courgette"),
        ("cilantro", "coriander"),
        ("arugula", "rocket"),
        ("scallion", "spring onion"),
        ("green onion", "spring onion"),
        ("ground beef", "beef mince"),
        ("ground pork", "pork mince"),
        ("ground lamb", "lamb mince"),
        ("ground turkey", "turkey mince"),
        ("heavy whipping cream", "double cream"),
        ("heavy cream", "double cream"),
        ("all purpose flour", "plain flour"),
        ("garbanzo bean", "chickpea"),
        ("garbanzo", "chickpea"),
        ("snow pea", "mangetout"),
        ("powdered sugar", "icing sugar"),
        ("confectioner sugar", "icing sugar"),
        ("cornstarch", "cornflour"),
        ("romaine lettuce", "cos lettuce"),
        ("shrimp", "prawn"),
        ("broiler chicken", "chicken"),
        ("rutabaga", "swede"),
        ("beet", "beetroot"),
    ];
    // Longest phrase first so "green onions" wins over any shorter overlap.
    table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    table
});

/// Portion/form words dropped from the end of a name when other content
/// remains. Stripping runs on singularized tokens; "leave" covers the
/// irregular plural "leaves".
static FORM_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "clove", "breast", "thigh", "fillet", "leaf", "leave", "slice", "stick",
        "sprig", "head", "bunch", "floret", "wedge", "drumstick", "rasher", "knob",
    ]
    .into_iter()
    .collect()
});

/// Container words recognized in a leading "<container> of ..." phrase.
static CONTAINER_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "tin", "tins", "jar", "jars", "packet", "packets", "can", "cans", "bag", "bags",
        "bottle", "bottles", "tub", "tubs", "box", "boxes", "carton", "cartons", "punnet",
        "punnets",
    ]
    .into_iter()
    .collect()
});

/// Tokens never singularized (mass nouns that happen to end in "s").
static UNCOUNTABLE: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ["couscous", "hummus", "asparagus", "molasses", "swiss", "watercress"]
        .into_iter()
        .collect()
});

/// Reduce a raw ingredient name to its canonical key.
///
/// The pipeline runs in a fixed order: lowercase and whitespace collapse,
/// parenthesized-segment strip, comma truncation, numeric-token drop,
/// preparation-word strip, modifier strip, singularization, trailing
/// form-word strip, US→UK synonym substitution. Synonyms run last, over
/// singular tokens, so plural US spellings resolve in a single pass.
///
/// # Examples
///
/// ```rust
/// use pantry::normalize::normalize;
///
/// assert_eq!(normalize("chicken (boneless)"), "chicken");
/// assert_eq!(normalize("garlic, minced"), "garlic");
/// assert_eq!(normalize("3 garlic cloves"), "garlic");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();

    // Parenthesized segments carry packaging/prep notes, never identity.
    let without_parens = PARENS.replace_all(&lowered, " ");

    // Everything after the first comma is preparation detail.
    let before_comma = without_parens
        .split(',')
        .next()
        .unwrap_or("")
        .replace('-', " ");

    let mut tokens: Vec<&str> = before_comma
        .split_whitespace()
        .filter(|t| !is_numeric_token(t))
        .filter(|t| !PREP_WORDS.contains(t))
        .filter(|t| !MODIFIER_WORDS.contains(t))
        .collect();

    // Leading "<container> of ..." phrases describe packaging.
    while tokens.len() > 2 && CONTAINER_WORDS.contains(tokens[0]) && tokens[1] == "of" {
        tokens.drain(..2);
    }

    let mut tokens: Vec<String> = tokens.iter().map(|t| singularize(t)).collect();

    // Trailing portion words go, but never the whole name.
    while tokens.len() > 1 && FORM_WORDS.contains(tokens.last().expect("non-empty").as_str()) {
        tokens.pop();
    }

    let result = apply_synonyms(&tokens.join(" "));

    trace!("normalize: '{}' -> '{}'", raw, result);
    result
}

/// True for standalone quantity tokens: "2", "1.5", "1/2".
fn is_numeric_token(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
        && token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '/')
}

/// Whole-phrase substitution over a space-separated key. Longest phrases are
/// tried first; matching is anchored to word boundaries by space padding.
fn apply_synonyms(key: &str) -> String {
    let mut padded = format!(" {} ", key);
    for phrase in MODIFIER_PHRASES {
        padded = padded.replace(&format!(" {} ", phrase), " ");
    }
    for (us, uk) in SYNONYMS.iter() {
        padded = padded.replace(&format!(" {} ", us), &format!(" {} ", uk));
    }
    padded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Best-effort English singularization of a single token.
fn singularize(token: &str) -> String {
    if UNCOUNTABLE.contains(token) {
        return token.to_string();
    }
    if token.len() > 4 {
        if let Some(stem) = token.strip_suffix("ies") {
            return format!("{}y", stem);
        }
    }
    if let Some(stem) = token.strip_suffix("oes") {
        return format!("{}o", stem);
    }
    if let Some(stem) = token.strip_suffix("es") {
        if stem.ends_with("ch") || stem.ends_with("sh") || stem.ends_with("ss")
            || stem.ends_with('x') || stem.ends_with('z')
        {
            return stem.to_string();
        }
    }
    if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}
