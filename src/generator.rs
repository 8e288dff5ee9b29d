//! # Weekly Menu Generator Module
//!
//! Builds a week of 14 meals (lunch and dinner, Monday to Sunday) from the
//! active dishes, checked against the nutritional frequency table.
//!
//! ## Strategies
//!
//! - **Random**: sample every slot uniformly, retry up to a bound, keep the
//!   first valid week or the last attempt marked invalid.
//! - **Quota**: derive portions per protein category from the frequency
//!   table, shuffle them over the 14 slots and draw a dish of the required
//!   category for each.
//!
//! Randomness is injected so callers can seed it.

use chrono::{Datelike, Duration, NaiveDate};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::catalog::MenuCatalog;
use crate::data_source::{columns, format_italian_date, Dish, MenuSource};
use crate::menu_errors::MenuError;
use crate::nutrition::{derive_quota, validate_week, CategoryCounts, ProteinCategory, ProteinSource, Violation};

/// Italian day names, Monday first
pub const DAY_NAMES: [&str; 7] = [
    "Lunedì", "Martedì", "Mercoledì", "Giovedì", "Venerdì", "Sabato", "Domenica",
];

/// Two meals a day for seven days
pub const MEALS_PER_WEEK: usize = 14;

/// Meal slot within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Midday,
    Evening,
}

/// Selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Random,
    #[default]
    Quota,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(Strategy::Random),
            "quota" => Ok(Strategy::Quota),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Random => write!(f, "random"),
            Strategy::Quota => write!(f, "quota"),
        }
    }
}

/// A dish reference placed in a slot, with its precomputed category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMeal {
    pub dish_id: u32,
    pub name: String,
    pub protein: Option<ProteinCategory>,
}

impl ProteinSource for PlannedMeal {
    fn protein_category(&self) -> Option<ProteinCategory> {
        self.protein
    }
}

/// One day of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: String,
    pub date: NaiveDate,
    pub midday: Option<PlannedMeal>,
    pub evening: Option<PlannedMeal>,
}

impl DayPlan {
    fn slot_mut(&mut self, slot: MealSlot) -> &mut Option<PlannedMeal> {
        match slot {
            MealSlot::Midday => &mut self.midday,
            MealSlot::Evening => &mut self.evening,
        }
    }
}

/// Seven days of two meal slots each
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub start: NaiveDate,
    pub days: Vec<DayPlan>,
}

impl WeeklyPlan {
    /// Empty plan starting on `start`
    pub fn empty(start: NaiveDate) -> Self {
        let days = DAY_NAMES
            .iter()
            .enumerate()
            .map(|(offset, name)| DayPlan {
                day: name.to_string(),
                date: start + Duration::days(offset as i64),
                midday: None,
                evening: None,
            })
            .collect();
        Self { start, days }
    }

    /// Filled slots in day order, lunch before dinner
    pub fn meals(&self) -> impl Iterator<Item = (NaiveDate, &PlannedMeal)> {
        self.days.iter().flat_map(|day| {
            [&day.midday, &day.evening]
                .into_iter()
                .flatten()
                .map(move |meal| (day.date, meal))
        })
    }

    /// Number of filled slots
    pub fn filled_slots(&self) -> usize {
        self.meals().count()
    }

    fn all_slots(&self) -> Vec<(usize, MealSlot)> {
        (0..self.days.len())
            .flat_map(|day| [(day, MealSlot::Midday), (day, MealSlot::Evening)])
            .collect()
    }

    fn set(&mut self, day: usize, slot: MealSlot, meal: Option<PlannedMeal>) {
        if let Some(day_plan) = self.days.get_mut(day) {
            *day_plan.slot_mut(slot) = meal;
        }
    }
}

/// A generated plan with its frequency check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedWeek {
    pub plan: WeeklyPlan,
    pub strategy: Strategy,
    /// Attempts used by the random strategy; 1 for quota
    pub attempts: u32,
    pub counts: CategoryCounts,
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl GeneratedWeek {
    fn evaluate(plan: WeeklyPlan, strategy: Strategy, attempts: u32) -> Self {
        let meals: Vec<&PlannedMeal> = plan.meals().map(|(_, meal)| meal).collect();
        let check = validate_week(&meals);
        Self {
            plan,
            strategy,
            attempts,
            counts: check.counts,
            valid: check.valid,
            violations: check.violations,
        }
    }
}

/// Monday following the week of `today` (a Monday maps to the next one)
pub fn next_monday(today: NaiveDate) -> NaiveDate {
    let offset = 7 - i64::from(today.weekday().num_days_from_monday());
    today + Duration::days(offset)
}

/// Weekly menu generator over a pool of active dishes
#[derive(Debug, Clone)]
pub struct WeeklyMenuGenerator {
    candidates: Vec<PlannedMeal>,
    by_category: BTreeMap<ProteinCategory, Vec<PlannedMeal>>,
}

impl WeeklyMenuGenerator {
    /// Build the candidate pool from dishes, tagging each with its category
    pub fn new(dishes: &[Dish]) -> Self {
        let candidates: Vec<PlannedMeal> = dishes
            .iter()
            .filter(|dish| dish.active)
            .map(|dish| PlannedMeal {
                dish_id: dish.id,
                name: dish.name.clone(),
                protein: dish.protein_category(),
            })
            .collect();

        let mut by_category: BTreeMap<ProteinCategory, Vec<PlannedMeal>> = BTreeMap::new();
        for meal in &candidates {
            if let Some(category) = meal.protein {
                by_category.entry(category).or_default().push(meal.clone());
            }
        }

        info!("Generator loaded {} candidate dishes", candidates.len());
        for (category, meals) in &by_category {
            debug!("  {}: {} dishes", category, meals.len());
        }

        Self {
            candidates,
            by_category,
        }
    }

    /// Build the generator from the active dishes of a catalog
    pub fn from_catalog<S: MenuSource>(catalog: &MenuCatalog<S>) -> Result<Self, MenuError> {
        Ok(Self::new(&catalog.active_dishes()?))
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Number of candidates tagged with a category
    pub fn candidates_in(&self, category: ProteinCategory) -> usize {
        self.by_category.get(&category).map_or(0, Vec::len)
    }

    /// Generate with the chosen strategy
    pub fn generate<R: Rng + ?Sized>(
        &self,
        strategy: Strategy,
        start: NaiveDate,
        max_attempts: u32,
        rng: &mut R,
    ) -> GeneratedWeek {
        match strategy {
            Strategy::Random => self.generate_random(start, max_attempts, rng),
            Strategy::Quota => self.generate_quota(start, rng),
        }
    }

    /// Sample every slot uniformly until a valid week is found or the
    /// attempts run out; the last attempt is returned marked invalid
    pub fn generate_random<R: Rng + ?Sized>(&self, start: NaiveDate, max_attempts: u32, rng: &mut R) -> GeneratedWeek {
        let max_attempts = max_attempts.max(1);
        let mut last = None;

        for attempt in 1..=max_attempts {
            let mut plan = WeeklyPlan::empty(start);
            for (day, slot) in plan.all_slots() {
                let meal = self.candidates.choose(rng).cloned();
                plan.set(day, slot, meal);
            }

            let generated = GeneratedWeek::evaluate(plan, Strategy::Random, attempt);
            if generated.valid {
                info!("Valid week found at attempt {}", attempt);
                return generated;
            }
            last = Some(generated);
        }

        warn!("No valid week in {} attempts, returning the last one", max_attempts);
        last.unwrap_or_else(|| GeneratedWeek::evaluate(WeeklyPlan::empty(start), Strategy::Random, 0))
    }

    /// Assign derived category portions to shuffled slots
    pub fn generate_quota<R: Rng + ?Sized>(&self, start: NaiveDate, rng: &mut R) -> GeneratedWeek {
        let mut plan = WeeklyPlan::empty(start);

        let mut slots = plan.all_slots();
        slots.shuffle(rng);

        let mut quota = derive_quota(MEALS_PER_WEEK, |category| self.candidates_in(category) > 0);
        quota.shuffle(rng);
        debug!("Quota of {} categorized portions", quota.len());

        for (index, (day, slot)) in slots.into_iter().enumerate() {
            let meal = match quota.get(index) {
                Some(category) => self.pick_in(*category, rng),
                None => self.candidates.choose(rng).cloned(),
            };
            plan.set(day, slot, meal);
        }

        GeneratedWeek::evaluate(plan, Strategy::Quota, 1)
    }

    fn pick_in<R: Rng + ?Sized>(&self, category: ProteinCategory, rng: &mut R) -> Option<PlannedMeal> {
        match self.by_category.get(&category).and_then(|meals| meals.choose(rng)) {
            Some(meal) => Some(meal.clone()),
            None => {
                debug!("No dish for {}, picking any dish", category);
                self.candidates.choose(rng).cloned()
            }
        }
    }
}

/// Append the plan to the data source as copies of the referenced dishes,
/// with fresh ids and the slot dates. Returns the new ids.
pub fn commit<S: MenuSource>(plan: &WeeklyPlan, source: &mut S) -> Result<Vec<u32>, MenuError> {
    if plan.filled_slots() == 0 {
        return Err(MenuError::MalformedInput("the weekly plan is empty".to_string()));
    }

    let mut table = source.read_table()?;
    let originals: HashMap<u32, _> = table
        .rows
        .iter()
        .filter_map(|row| row.id().map(|id| (id, row.clone())))
        .collect();

    let mut next_id = table.max_id() + 1;
    let mut new_ids = Vec::new();

    for (date, meal) in plan.meals() {
        let Some(original) = originals.get(&meal.dish_id) else {
            warn!("Dish {} not found, slot on {} skipped", meal.dish_id, date);
            continue;
        };

        let mut row = original.clone();
        row.set(columns::ID, next_id.to_string());
        row.set(columns::DATE, format_italian_date(date));
        table.rows.push(row);

        new_ids.push(next_id);
        next_id += 1;
    }

    source.write_table(&table)?;
    info!("Weekly menu saved: {} dishes added", new_ids.len());
    Ok(new_ids)
}
