//! # Nutritional Frequency Rules Module
//!
//! Weekly minimum/maximum portions per protein category, the keyword table
//! that tags a dish with its protein category, and week validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::data_source::Dish;

/// Protein classification of a dish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProteinCategory {
    #[serde(rename = "legumi")]
    Legumes,
    #[serde(rename = "uova")]
    Eggs,
    #[serde(rename = "carne_bianca")]
    WhiteMeat,
    #[serde(rename = "carne_rossa")]
    RedMeat,
    #[serde(rename = "formaggi_freschi")]
    FreshCheese,
    #[serde(rename = "formaggi_stagionati")]
    AgedCheese,
    #[serde(rename = "pesce_bianco")]
    WhiteFish,
    #[serde(rename = "pesce_grasso")]
    FattyFish,
    #[serde(rename = "crostacei_molluschi")]
    Shellfish,
    #[serde(rename = "tonno_scatola")]
    CannedTuna,
    #[serde(rename = "affettati")]
    CuredMeats,
}

/// Weekly portion bounds of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrequencyRule {
    pub category: ProteinCategory,
    pub min: u32,
    pub max: u32,
}

const fn rule(category: ProteinCategory, min: u32, max: u32) -> FrequencyRule {
    FrequencyRule { category, min, max }
}

/// Frequency table in declaration order; the order drives tagging priority
pub const WEEKLY_FREQUENCIES: [FrequencyRule; 11] = [
    rule(ProteinCategory::Legumes, 2, 2),
    rule(ProteinCategory::Eggs, 0, 2),
    rule(ProteinCategory::WhiteMeat, 0, 3),
    rule(ProteinCategory::RedMeat, 0, 2),
    rule(ProteinCategory::FreshCheese, 0, 3),
    rule(ProteinCategory::AgedCheese, 0, 1),
    rule(ProteinCategory::WhiteFish, 2, 4),
    rule(ProteinCategory::FattyFish, 0, 1),
    rule(ProteinCategory::Shellfish, 0, 1),
    rule(ProteinCategory::CannedTuna, 0, 1),
    rule(ProteinCategory::CuredMeats, 0, 1),
];

impl ProteinCategory {
    /// Key used in serialized output
    pub fn key(&self) -> &'static str {
        match self {
            ProteinCategory::Legumes => "legumi",
            ProteinCategory::Eggs => "uova",
            ProteinCategory::WhiteMeat => "carne_bianca",
            ProteinCategory::RedMeat => "carne_rossa",
            ProteinCategory::FreshCheese => "formaggi_freschi",
            ProteinCategory::AgedCheese => "formaggi_stagionati",
            ProteinCategory::WhiteFish => "pesce_bianco",
            ProteinCategory::FattyFish => "pesce_grasso",
            ProteinCategory::Shellfish => "crostacei_molluschi",
            ProteinCategory::CannedTuna => "tonno_scatola",
            ProteinCategory::CuredMeats => "affettati",
        }
    }

    /// Lowercase keywords that identify the category inside an ingredient name
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ProteinCategory::Legumes => &[
                "legumi", "fagioli", "ceci", "lenticchie", "piselli", "fave", "borlotti",
                "cannellini", "pasta di legumi",
            ],
            ProteinCategory::Eggs => &["uova", "uovo", "albume", "frittata"],
            ProteinCategory::WhiteMeat => &[
                "pollo", "tacchino", "petto di pollo", "petto di tacchino", "fesa di tacchino",
                "carne bianca",
            ],
            ProteinCategory::RedMeat => &[
                "manzo", "vitello", "carne rossa", "bistecca", "tagliata", "lonza",
                "hamburger di vitello",
            ],
            ProteinCategory::FreshCheese => &[
                "ricotta", "mozzarella", "fiocchi di latte", "feta", "robiola", "primo sale",
                "caprino",
            ],
            ProteinCategory::AgedCheese => &[
                "parmigiano", "grana", "pecorino", "parmigiano reggiano", "grana padano",
            ],
            ProteinCategory::WhiteFish => &[
                "merluzzo", "nasello", "platessa", "sogliola", "orata", "spigola", "branzino",
            ],
            ProteinCategory::FattyFish => &["salmone", "trota", "sgombro", "tonno fresco", "alici"],
            ProteinCategory::Shellfish => &[
                "gamberi", "gamberetti", "calamari", "vongole", "cozze", "polpo", "frutti di mare",
            ],
            ProteinCategory::CannedTuna => &["tonno in scatola", "tonno al naturale", "tonno sgocciolato"],
            ProteinCategory::CuredMeats => &["bresaola", "prosciutto", "salmone affumicato"],
        }
    }

    /// Weekly bounds of this category
    pub fn rule(&self) -> FrequencyRule {
        WEEKLY_FREQUENCIES
            .iter()
            .copied()
            .find(|r| r.category == *self)
            .unwrap_or(FrequencyRule {
                category: *self,
                min: 0,
                max: 0,
            })
    }
}

impl fmt::Display for ProteinCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Tag a list of ingredient names with the first matching protein category
pub fn category_of<I, S>(ingredients: I) -> Option<ProteinCategory>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<String> = ingredients
        .into_iter()
        .map(|n| n.as_ref().trim().to_lowercase())
        .collect();

    WEEKLY_FREQUENCIES.iter().map(|r| r.category).find(|category| {
        category
            .keywords()
            .iter()
            .any(|keyword| names.iter().any(|name| name.contains(keyword)))
    })
}

/// Anything that can report its protein category
pub trait ProteinSource {
    fn protein_category(&self) -> Option<ProteinCategory>;
}

impl ProteinSource for Dish {
    fn protein_category(&self) -> Option<ProteinCategory> {
        category_of(self.ingredient_names())
    }
}

impl ProteinSource for Option<ProteinCategory> {
    fn protein_category(&self) -> Option<ProteinCategory> {
        *self
    }
}

impl<T: ProteinSource> ProteinSource for &T {
    fn protein_category(&self) -> Option<ProteinCategory> {
        (*self).protein_category()
    }
}

/// Which side of a rule a count breaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Minimum(u32),
    Maximum(u32),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Minimum(n) => write!(f, "minimum {n}"),
            Bound::Maximum(n) => write!(f, "maximum {n}"),
        }
    }
}

/// A category whose weekly count lies outside its bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub category: ProteinCategory,
    pub count: u32,
    pub bound: Bound,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.category, self.count, self.bound)
    }
}

/// Per-category counts of a week
pub type CategoryCounts = BTreeMap<ProteinCategory, u32>;

/// Outcome of checking a week against the frequency table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekValidation {
    pub counts: CategoryCounts,
    pub valid: bool,
    pub violations: Vec<Violation>,
}

/// Count categories over the meals and check every rule
pub fn validate_week<M: ProteinSource>(meals: &[M]) -> WeekValidation {
    let mut counts: CategoryCounts = WEEKLY_FREQUENCIES.iter().map(|r| (r.category, 0)).collect();

    for category in meals.iter().filter_map(|meal| meal.protein_category()) {
        *counts.entry(category).or_insert(0) += 1;
    }

    let mut violations = Vec::new();
    for rule in WEEKLY_FREQUENCIES {
        let count = counts.get(&rule.category).copied().unwrap_or(0);
        if count < rule.min {
            violations.push(Violation {
                category: rule.category,
                count,
                bound: Bound::Minimum(rule.min),
            });
        }
        if count > rule.max {
            violations.push(Violation {
                category: rule.category,
                count,
                bound: Bound::Maximum(rule.max),
            });
        }
    }

    WeekValidation {
        counts,
        valid: violations.is_empty(),
        violations,
    }
}

/// Portions per category for a week of `slots` meals, derived from the table.
///
/// Minimums come first; then categories below their maximum that have
/// candidates (per `has_candidates`) gain one portion at a time in table
/// order until the week is full. The result may be shorter than `slots`
/// when the table cannot fill it.
pub fn derive_quota(slots: usize, has_candidates: impl Fn(ProteinCategory) -> bool) -> Vec<ProteinCategory> {
    let mut portions: Vec<(ProteinCategory, u32, u32)> = WEEKLY_FREQUENCIES
        .iter()
        .map(|r| (r.category, r.min, r.max))
        .collect();
    let mut total: usize = portions.iter().map(|(_, n, _)| *n as usize).sum();

    while total < slots {
        let mut added = false;
        for (category, count, max) in portions.iter_mut() {
            if total == slots {
                break;
            }
            if *count < *max && has_candidates(*category) {
                *count += 1;
                total += 1;
                added = true;
            }
        }
        if !added {
            break;
        }
    }

    portions
        .into_iter()
        .flat_map(|(category, count, _)| std::iter::repeat(category).take(count as usize))
        .take(slots)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_of_first_match_wins() {
        assert_eq!(category_of(["Pasta", "Ceci", "Pomodoro"]), Some(ProteinCategory::Legumes));
        assert_eq!(category_of(["Riso", "Petto di Pollo"]), Some(ProteinCategory::WhiteMeat));
        assert_eq!(category_of(["Pasta", "Tonno in scatola"]), Some(ProteinCategory::CannedTuna));
        // "salmone" is listed before "salmone affumicato"
        assert_eq!(category_of(["Salmone affumicato"]), Some(ProteinCategory::FattyFish));
        assert_eq!(category_of(["Pane", "Cetrioli"]), None);
        assert_eq!(category_of(Vec::<String>::new()), None);
    }

    #[test]
    fn test_table_bounds() {
        for rule in WEEKLY_FREQUENCIES {
            assert!(rule.max >= rule.min);
        }
        assert_eq!(ProteinCategory::WhiteFish.rule().min, 2);
        assert_eq!(ProteinCategory::WhiteFish.rule().max, 4);
    }

    fn balanced_week() -> Vec<Option<ProteinCategory>> {
        use ProteinCategory::*;
        vec![
            Some(Legumes), Some(Legumes), Some(WhiteFish), Some(WhiteFish), Some(WhiteMeat),
            Some(WhiteMeat), Some(Eggs), Some(Eggs), Some(FreshCheese), Some(FreshCheese),
            Some(RedMeat), Some(FattyFish), Some(AgedCheese), None,
        ]
    }

    #[test]
    fn test_validate_balanced_week() {
        let result = validate_week(&balanced_week());
        assert!(result.valid);
        assert!(result.violations.is_empty());
        assert_eq!(result.counts[&ProteinCategory::Legumes], 2);
        assert_eq!(result.counts[&ProteinCategory::Shellfish], 0);
    }

    #[test]
    fn test_validate_reports_minimum() {
        let mut week = balanced_week();
        week[0] = None;
        let result = validate_week(&week);
        assert!(!result.valid);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].to_string(), "legumi: 1 (minimum 2)");
    }

    #[test]
    fn test_validate_reports_maximum() {
        let mut week = balanced_week();
        week[13] = Some(ProteinCategory::AgedCheese);
        let result = validate_week(&week);
        assert_eq!(
            result.violations,
            vec![Violation {
                category: ProteinCategory::AgedCheese,
                count: 2,
                bound: Bound::Maximum(1),
            }]
        );
    }

    #[test]
    fn test_derive_quota_fills_week() {
        let quota = derive_quota(14, |_| true);
        assert_eq!(quota.len(), 14);
        let result = validate_week(&quota.iter().map(|c| Some(*c)).collect::<Vec<_>>());
        assert!(result.valid, "{:?}", result.violations);
        assert_eq!(result.counts[&ProteinCategory::WhiteFish], 3);
    }

    #[test]
    fn test_derive_quota_without_candidates_keeps_minimums() {
        let quota = derive_quota(14, |_| false);
        assert_eq!(quota.len(), 4);
        assert_eq!(quota.iter().filter(|c| **c == ProteinCategory::Legumes).count(), 2);
    }

    #[test]
    fn test_violation_serializes() {
        let violation = Violation {
            category: ProteinCategory::Legumes,
            count: 1,
            bound: Bound::Minimum(2),
        };
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["category"], "legumi");
        assert_eq!(json["bound"]["minimum"], 2);
    }
}
