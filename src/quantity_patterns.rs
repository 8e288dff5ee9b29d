//! # Quantity Patterns Module
//!
//! This module contains the regex pattern, unit vocabulary and "as needed"
//! phrases used to read quantity expressions from the menu database.

use lazy_static::lazy_static;
use regex::Regex;

use crate::quantity::Unit;

// Leading decimal (dot or comma) optionally followed by a known unit token
pub const QUANTITY_PATTERN: &str = r"^(\d+(?:[.,]\d+)?)\s*(?:(kg|chilo|chili|g|gr|grammo|grammi|ml|cl|l|lt|litro|litri|unità|pezzo|pezzi|bicchiere|bicchieri|bustina|bustine|costa|coste|stecca|stecche|foglio|fogli|piccola|piccolo)\b)?";

/// Phrases meaning "as much as needed"; matched against the whole expression
pub const AS_NEEDED_PHRASES: &[&str] = &["q.b.", "q.b", "qb", "quanto basta", "a piacere"];

lazy_static! {
    pub static ref QUANTITY_REGEX: Regex =
        Regex::new(QUANTITY_PATTERN).expect("Quantity pattern should be valid");
}

/// Map a unit token to its base unit and the factor converting into it
pub fn unit_for_token(token: &str) -> Option<(Unit, f64)> {
    let mapped = match token {
        "kg" | "chilo" | "chili" => (Unit::Grams, 1000.0),
        "g" | "gr" | "grammo" | "grammi" => (Unit::Grams, 1.0),
        "l" | "lt" | "litro" | "litri" => (Unit::Milliliters, 1000.0),
        "cl" => (Unit::Milliliters, 10.0),
        "ml" => (Unit::Milliliters, 1.0),
        "unità" => (Unit::Count, 1.0),
        "pezzo" | "pezzi" => (Unit::Pieces, 1.0),
        "bicchiere" | "bicchieri" => (Unit::Glasses, 1.0),
        "bustina" | "bustine" => (Unit::Sachets, 1.0),
        "costa" | "coste" => (Unit::Stalks, 1.0),
        "stecca" | "stecche" => (Unit::Bars, 1.0),
        "foglio" | "fogli" => (Unit::Sheets, 1.0),
        "piccola" | "piccolo" => (Unit::SmallPortions, 1.0),
        _ => return None,
    };
    Some(mapped)
}

/// True when the (lowercased, trimmed) text is an "as needed" phrase
pub fn is_as_needed_phrase(text: &str) -> bool {
    AS_NEEDED_PHRASES.contains(&text)
}
