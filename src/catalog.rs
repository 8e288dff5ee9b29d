//! # Menu Catalog Module
//!
//! Dated menu queries over a [`MenuSource`]: the menu of a day, the dates and
//! ISO weeks with at least one dish, and the pool of active dishes used by
//! the weekly generator.

use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::data_source::{
    columns, is_active_flag, iso_week, iso_week_of, normalize_date, parse_menu_date, Dish,
    IngredientLine, MenuRow, MenuSource,
};
use crate::menu_errors::MenuError;
use crate::nutrition::{ProteinCategory, ProteinSource, WEEKLY_FREQUENCIES};
use crate::settings::DEFAULT_CURRENCY_SYMBOL;

/// A dish as shown in the menu of a day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuDish {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Price rendered with the currency symbol, e.g. "€8.50"
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    pub week: u32,
    /// Present only when ingredients were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<IngredientLine>>,
}

/// Menu of one day plus the index of every available date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuDay {
    pub date: String,
    pub dishes: Vec<MenuDish>,
    pub available_dates: Vec<String>,
    pub total: usize,
    /// Set when the data source could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Available dates grouped by ISO week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSummary {
    pub year: i32,
    pub week: u32,
    pub dates: Vec<String>,
    pub label: String,
}

/// Short dish description used in the per-category view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DishSummary {
    pub id: u32,
    pub name: String,
    pub description: String,
}

/// Active dishes sharing a protein category (`None` = no category)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProteinGroup {
    pub category: Option<ProteinCategory>,
    pub dishes: Vec<DishSummary>,
}

/// Read-only queries over the menu database
pub struct MenuCatalog<S: MenuSource> {
    source: S,
    currency_symbol: String,
}

impl<S: MenuSource> MenuCatalog<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }

    /// Use a different currency symbol when rendering prices
    pub fn with_currency(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Menu of a date (either accepted format).
    ///
    /// A missing or unreadable data source yields an empty menu with `error`
    /// set; malformed rows are skipped.
    pub fn load_menu(&self, date: &str, include_ingredients: bool) -> MenuDay {
        let requested = normalize_date(date).unwrap_or_else(|| date.trim().to_string());

        let table = match self.source.read_table() {
            Ok(table) => table,
            Err(e) => {
                warn!("Cannot load menu for {}: {}", requested, e);
                return MenuDay {
                    date: requested,
                    dishes: Vec::new(),
                    available_dates: Vec::new(),
                    total: 0,
                    error: Some(e.to_string()),
                };
            }
        };

        let mut available = BTreeSet::new();
        let mut dishes = Vec::new();

        for row in &table.rows {
            let Some(row_date) = normalize_date(row.get(columns::DATE)) else {
                debug!("Skipping row with unreadable date '{}'", row.get(columns::DATE));
                continue;
            };
            available.insert(row_date.clone());

            if row_date != requested || !is_active(row) {
                continue;
            }
            match Dish::from_row(row) {
                Ok(dish) => dishes.push(self.project(dish, include_ingredients)),
                Err(e) => warn!("Skipping menu row: {}", e),
            }
        }

        MenuDay {
            date: requested,
            total: dishes.len(),
            dishes,
            available_dates: available.into_iter().collect(),
            error: None,
        }
    }

    /// Active, well-formed dishes of a date
    pub fn dishes_on(&self, date: &str) -> Result<Vec<Dish>, MenuError> {
        let requested = parse_menu_date(date)
            .ok_or_else(|| MenuError::MalformedInput(format!("invalid date '{date}'")))?;
        Ok(self
            .active_dishes()?
            .into_iter()
            .filter(|dish| dish.date == requested)
            .collect())
    }

    /// Every distinct canonical date, sorted, regardless of the active flag
    pub fn available_dates(&self) -> Vec<String> {
        match self.source.read_table() {
            Ok(table) => table
                .rows
                .iter()
                .filter_map(|row| normalize_date(row.get(columns::DATE)))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            Err(e) => {
                warn!("Cannot list available dates: {}", e);
                Vec::new()
            }
        }
    }

    /// Available dates grouped by ISO (year, week), ascending
    pub fn available_weeks(&self) -> Vec<WeekSummary> {
        let mut weeks: BTreeMap<(i32, u32), Vec<String>> = BTreeMap::new();
        for date in self.available_dates() {
            weeks.entry(iso_week_of(&date)).or_default().push(date);
        }

        weeks
            .into_iter()
            .map(|((year, week), dates)| WeekSummary {
                year,
                week,
                dates,
                label: format!("Settimana {week} del {year}"),
            })
            .collect()
    }

    /// Available dates inside one ISO week, sorted
    pub fn dates_in_week(&self, year: i32, week: u32) -> Vec<String> {
        self.available_dates()
            .into_iter()
            .filter(|date| iso_week_of(date) == (year, week))
            .collect()
    }

    /// Every active, well-formed dish regardless of date
    pub fn active_dishes(&self) -> Result<Vec<Dish>, MenuError> {
        let table = self.source.read_table()?;
        let dishes: Vec<Dish> = table
            .rows
            .iter()
            .filter(|row| is_active(row))
            .filter_map(|row| match Dish::from_row(row) {
                Ok(dish) => Some(dish),
                Err(e) => {
                    debug!("Ignoring dish: {}", e);
                    None
                }
            })
            .collect();
        debug!("Loaded {} active dishes", dishes.len());
        Ok(dishes)
    }

    /// Active dishes grouped by protein category, in table order, with
    /// uncategorized dishes last
    pub fn dishes_by_protein(&self) -> Result<Vec<ProteinGroup>, MenuError> {
        let mut grouped: BTreeMap<Option<ProteinCategory>, Vec<DishSummary>> = BTreeMap::new();
        for dish in self.active_dishes()? {
            grouped.entry(dish.protein_category()).or_default().push(DishSummary {
                id: dish.id,
                name: dish.name,
                description: dish.description,
            });
        }

        let order = WEEKLY_FREQUENCIES
            .iter()
            .map(|r| Some(r.category))
            .chain(std::iter::once(None));

        Ok(order
            .filter_map(|category| {
                grouped
                    .remove(&category)
                    .map(|dishes| ProteinGroup { category, dishes })
            })
            .collect())
    }

    fn project(&self, dish: Dish, include_ingredients: bool) -> MenuDish {
        let (_, week) = iso_week(dish.date);
        MenuDish {
            id: dish.id,
            price: format!("{}{:.2}", self.currency_symbol, dish.price),
            name: dish.name,
            description: dish.description,
            category: dish.category,
            recipe: dish.recipe,
            week,
            ingredients: include_ingredients.then_some(dish.ingredients),
        }
    }
}

fn is_active(row: &MenuRow) -> bool {
    is_active_flag(row.get(columns::ACTIVE))
}
