//! # Shopping List Module
//!
//! Aggregates the ingredients of every dish served on a set of dates into one
//! quantity per ingredient, scaled by the number of people, and groups the
//! result by shopping category.
//!
//! Quantities stay typed during aggregation and are formatted once at the
//! end, so repeated sums do not accumulate rounding from the display format.

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::MenuCatalog;
use crate::classifier::IngredientClassifier;
use crate::data_source::{Dish, MenuSource};
use crate::ingredient_categories::ShoppingCategory;
use crate::menu_errors::MenuError;
use crate::quantity::{Quantity, UnitMismatchPolicy};

/// One line of the shopping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingItem {
    pub name: String,
    pub quantity: String,
}

/// Ingredients of one shopping category, sorted by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub category: ShoppingCategory,
    pub ingredients: Vec<ShoppingItem>,
}

/// Consolidated shopping list for a set of dates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingList {
    pub dates: Vec<String>,
    pub party_size: u32,
    /// Non-empty categories in presentation order
    pub categories: Vec<CategoryGroup>,
    pub total_ingredients: usize,
    /// Unit mismatches, reported only under [`UnitMismatchPolicy::Warn`]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ShoppingList {
    /// Quantity text of an ingredient, if present in any category
    pub fn quantity_of(&self, name: &str) -> Option<&str> {
        self.categories
            .iter()
            .flat_map(|g| g.ingredients.iter())
            .find(|item| item.name == name)
            .map(|item| item.quantity.as_str())
    }

    /// Category an ingredient was placed in
    pub fn category_of(&self, name: &str) -> Option<ShoppingCategory> {
        self.categories
            .iter()
            .find(|g| g.ingredients.iter().any(|item| item.name == name))
            .map(|g| g.category)
    }
}

/// Per-ingredient totals with any unit mismatch warnings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientTotals {
    pub totals: BTreeMap<String, Quantity>,
    pub warnings: Vec<String>,
}

/// Sum every ingredient of the dishes, scaled by `party_size`
pub fn total_ingredients(dishes: &[Dish], party_size: u32, policy: UnitMismatchPolicy) -> IngredientTotals {
    let mut result = IngredientTotals::default();
    let factor = f64::from(party_size);

    for line in dishes.iter().flat_map(|dish| dish.ingredients.iter()) {
        let scaled = Quantity::parse(&line.quantity).scale(factor);

        let Some(current) = result.totals.get_mut(&line.name) else {
            result.totals.insert(line.name.clone(), scaled);
            continue;
        };

        match current.try_sum(&scaled) {
            Ok(sum) => *current = sum,
            Err(mismatch) => {
                debug!("Unit mismatch for '{}': {}", line.name, mismatch);
                if policy == UnitMismatchPolicy::Warn {
                    warn!("Unit mismatch for '{}': {}", line.name, mismatch);
                    result.warnings.push(format!("{}: {}", line.name, mismatch));
                }
                *current = mismatch.kept;
            }
        }
    }

    result
}

/// Builds shopping lists from the catalog, classifying every ingredient
pub struct ShoppingListAggregator<'a, S: MenuSource> {
    catalog: &'a MenuCatalog<S>,
    classifier: &'a mut IngredientClassifier,
    policy: UnitMismatchPolicy,
}

impl<'a, S: MenuSource> ShoppingListAggregator<'a, S> {
    pub fn new(catalog: &'a MenuCatalog<S>, classifier: &'a mut IngredientClassifier) -> Self {
        Self {
            catalog,
            classifier,
            policy: UnitMismatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnitMismatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shopping list for the given dates (either date format) and party size
    pub fn aggregate(&mut self, dates: &[String], party_size: u32) -> Result<ShoppingList, MenuError> {
        if dates.is_empty() {
            return Err(MenuError::MalformedInput("no dates selected".to_string()));
        }
        if party_size == 0 {
            return Err(MenuError::MalformedInput("party size must be at least 1".to_string()));
        }

        let mut dishes = Vec::new();
        for date in dates {
            dishes.extend(self.catalog.dishes_on(date)?);
        }
        info!(
            "Building shopping list for {} dates, {} dishes, {} people",
            dates.len(),
            dishes.len(),
            party_size
        );

        let IngredientTotals { totals, warnings } = total_ingredients(&dishes, party_size, self.policy);

        let mut grouped: BTreeMap<ShoppingCategory, Vec<ShoppingItem>> = BTreeMap::new();
        for (name, quantity) in totals {
            let (category, _) = self.classifier.classify(&name);
            grouped.entry(category).or_default().push(ShoppingItem {
                name,
                quantity: quantity.to_string(),
            });
        }
        self.classifier.log_stats();

        // BTreeMap order follows the declaration order of ShoppingCategory
        let categories: Vec<CategoryGroup> = grouped
            .into_iter()
            .map(|(category, mut ingredients)| {
                ingredients.sort_by(|a, b| a.name.cmp(&b.name));
                CategoryGroup { category, ingredients }
            })
            .collect();

        Ok(ShoppingList {
            dates: dates.to_vec(),
            party_size,
            total_ingredients: categories.iter().map(|g| g.ingredients.len()).sum(),
            categories,
            warnings,
        })
    }
}
