//! # Quantity Data Model
//!
//! This module turns the free-text quantity expressions of the menu database
//! ("350g", "1,5 kg", "2 fette", "q.b.") into normalized quantities, and
//! provides the arithmetic the shopping list needs: summing and scaling.
//!
//! ## Core Concepts
//!
//! - **Unit**: base units only. Kilograms become grams, liters and
//!   centiliters become milliliters when parsed.
//! - **Quantity**: either a numeric amount in a unit, or "as needed" (q.b.),
//!   which has no value and yields to any concrete amount when summed.
//!
//! ## Usage
//!
//! ```rust
//! use menu_planner::quantity::{Quantity, Unit};
//!
//! let flour = Quantity::parse("1,5 kg");
//! assert_eq!(flour, Quantity::amount(1500.0, Unit::Grams));
//! assert_eq!(flour.scale(2.0).to_string(), "3.0 kg");
//! assert_eq!(Quantity::parse("q.b.").sum(&flour).to_string(), "1.5 kg");
//! ```

use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::quantity_patterns::{is_as_needed_phrase, unit_for_token, QUANTITY_REGEX};

/// Display text of an "as needed" quantity
pub const AS_NEEDED_TEXT: &str = "q.b.";

/// Normalized measurement units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Grams (kilograms are converted on parse)
    Grams,
    /// Milliliters (liters and centiliters are converted on parse)
    Milliliters,
    /// A bare number with no unit
    Count,
    /// Pieces
    Pieces,
    /// Glasses
    Glasses,
    /// Sachets
    Sachets,
    /// Stalks (celery and the like)
    Stalks,
    /// Bars (cinnamon sticks, chocolate bars)
    Bars,
    /// Sheets (lasagne, gelatine)
    Sheets,
    /// A small portion ("1 piccola")
    SmallPortions,
}

impl Unit {
    /// Get the display name appended to formatted amounts
    pub fn display_name(&self) -> &'static str {
        match self {
            Unit::Grams => "g",
            Unit::Milliliters => "ml",
            Unit::Count => "unità",
            Unit::Pieces => "pezzi",
            Unit::Glasses => "bicchiere",
            Unit::Sachets => "bustina",
            Unit::Stalks => "costa",
            Unit::Bars => "stecca",
            Unit::Sheets => "fogli",
            Unit::SmallPortions => "piccola",
        }
    }
}

/// A parsed quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Quantity {
    /// "Quanto basta": no fixed amount
    AsNeeded,
    /// A non-negative amount in a base unit
    Amount { value: f64, unit: Unit },
}

/// Two quantities that could not be summed because their units differ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitMismatch {
    /// The operand whose value survives
    pub kept: Quantity,
    /// The operand that was discarded
    pub dropped: Quantity,
}

impl fmt::Display for UnitMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kept {} and dropped {} (different units)", self.kept, self.dropped)
    }
}

/// How aggregation treats quantities of the same ingredient in different units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitMismatchPolicy {
    /// Keep the first quantity silently
    #[default]
    KeepFirst,
    /// Keep the first quantity and report a warning
    Warn,
}

impl FromStr for UnitMismatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep-first" | "keep_first" | "first" => Ok(UnitMismatchPolicy::KeepFirst),
            "warn" | "warning" => Ok(UnitMismatchPolicy::Warn),
            other => Err(format!("unknown unit mismatch policy '{other}'")),
        }
    }
}

impl fmt::Display for UnitMismatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitMismatchPolicy::KeepFirst => write!(f, "keep-first"),
            UnitMismatchPolicy::Warn => write!(f, "warn"),
        }
    }
}

impl Quantity {
    /// Create an amount in the given unit
    pub fn amount(value: f64, unit: Unit) -> Self {
        Quantity::Amount { value, unit }
    }

    /// Parse a free-text quantity expression.
    ///
    /// Never fails: anything unreadable becomes [`Quantity::AsNeeded`].
    pub fn parse(text: &str) -> Self {
        let normalized = text.trim().to_lowercase();

        if is_as_needed_phrase(&normalized) {
            return Quantity::AsNeeded;
        }

        let Some(captures) = QUANTITY_REGEX.captures(&normalized) else {
            trace!("No quantity found in '{}'", text);
            return Quantity::AsNeeded;
        };

        let Ok(number) = captures[1].replace(',', ".").parse::<f64>() else {
            return Quantity::AsNeeded;
        };

        let (unit, factor) = match captures.get(2) {
            Some(token) => unit_for_token(token.as_str()).unwrap_or((Unit::Count, 1.0)),
            None => (Unit::Count, 1.0),
        };

        Quantity::amount(number * factor, unit)
    }

    /// Check if this quantity is "as needed"
    pub fn is_as_needed(&self) -> bool {
        matches!(self, Quantity::AsNeeded)
    }

    /// Numeric value, if any
    pub fn value(&self) -> Option<f64> {
        match self {
            Quantity::Amount { value, .. } => Some(*value),
            Quantity::AsNeeded => None,
        }
    }

    /// Sum two quantities, reporting a unit mismatch instead of resolving it.
    ///
    /// "As needed" yields to the other operand.
    pub fn try_sum(&self, other: &Quantity) -> Result<Quantity, UnitMismatch> {
        match (self, other) {
            (Quantity::AsNeeded, _) => Ok(*other),
            (_, Quantity::AsNeeded) => Ok(*self),
            (
                Quantity::Amount { value: a, unit: ua },
                Quantity::Amount { value: b, unit: ub },
            ) => {
                if ua == ub {
                    Ok(Quantity::amount(a + b, *ua))
                } else {
                    Err(UnitMismatch {
                        kept: *self,
                        dropped: *other,
                    })
                }
            }
        }
    }

    /// Sum two quantities; when units differ the first operand is kept.
    pub fn sum(&self, other: &Quantity) -> Quantity {
        self.try_sum(other).unwrap_or_else(|mismatch| mismatch.kept)
    }

    /// Multiply by a factor; "as needed" stays "as needed".
    pub fn scale(&self, factor: f64) -> Quantity {
        match self {
            Quantity::AsNeeded => Quantity::AsNeeded,
            Quantity::Amount { value, unit } => Quantity::amount(value * factor, *unit),
        }
    }
}

/// Format an amount for display.
///
/// Grams and milliliters of 1000 or more are shown in kg and l with one
/// decimal; whole numbers are shown without decimals. The value is rounded
/// to one decimal before either check, so the output parses back to itself.
pub fn format_quantity(value: f64, unit: Unit) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    match unit {
        Unit::Grams if rounded >= 1000.0 => format!("{:.1} kg", rounded / 1000.0),
        Unit::Milliliters if rounded >= 1000.0 => format!("{:.1} l", rounded / 1000.0),
        _ if rounded.fract() == 0.0 => format!("{:.0} {}", rounded, unit.display_name()),
        _ => format!("{:.1} {}", rounded, unit.display_name()),
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::AsNeeded => write!(f, "{AS_NEEDED_TEXT}"),
            Quantity::Amount { value, unit } => write!(f, "{}", format_quantity(*value, *unit)),
        }
    }
}
