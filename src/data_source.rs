//! # Menu Data Source Module
//!
//! Read/write contract of the flat menu database: a `;`-separated UTF-8 file
//! with a header row, fields addressed by column name. Also hosts the date
//! helpers (two accepted date formats, ISO week numbering) and the typed
//! [`Dish`] built from a row.

use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::menu_errors::MenuError;
use crate::quantity::AS_NEEDED_TEXT;

/// Field delimiter of the menu database
pub const DELIMITER: u8 = b';';
/// Separator of the ingredient and quantity lists inside a field
pub const LIST_SEPARATOR: char = '|';

/// Column names of the menu database
pub mod columns {
    pub const ID: &str = "id";
    pub const DATE: &str = "data";
    pub const NAME: &str = "nome";
    pub const DESCRIPTION: &str = "descrizione";
    pub const CATEGORY: &str = "categoria";
    pub const PRICE: &str = "prezzo";
    pub const ACTIVE: &str = "attivo";
    pub const RECIPE: &str = "ricetta";
    pub const INGREDIENTS: &str = "ingredienti";
    pub const QUANTITIES: &str = "quantita";

    /// Columns every data source must have
    pub const REQUIRED: [&str; 7] = [ID, DATE, NAME, DESCRIPTION, CATEGORY, PRICE, ACTIVE];
}

/// One record of the data source, addressed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRow(BTreeMap<String, String>);

impl MenuRow {
    /// Build a row from (column, value) pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Raw value of a column; empty when the column is absent
    pub fn get(&self, column: &str) -> &str {
        self.0.get(column).map(String::as_str).unwrap_or("")
    }

    /// Set a column value
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.0.insert(column.to_string(), value.into());
    }

    /// Parsed id, if the id field is a positive integer
    pub fn id(&self) -> Option<u32> {
        self.get(columns::ID).trim().parse().ok().filter(|id| *id > 0)
    }
}

/// A record the reader could not decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Line number in the file (header is line 1)
    pub line: usize,
    pub reason: String,
}

/// Whole content of the data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuTable {
    /// Column names in file order
    pub headers: Vec<String>,
    pub rows: Vec<MenuRow>,
    /// Records left out of `rows`; never written back
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
}

impl MenuTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Check if a column is present in the header
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Required columns missing from the header
    pub fn missing_required(&self) -> Vec<String> {
        columns::REQUIRED
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Highest valid id in the table, 0 when there is none
    pub fn max_id(&self) -> u32 {
        self.rows.iter().filter_map(MenuRow::id).max().unwrap_or(0)
    }
}

/// Read/write contract of the menu database
pub trait MenuSource {
    /// Read every decodable row
    fn read_table(&self) -> Result<MenuTable, MenuError>;

    /// Replace the whole content
    fn write_table(&mut self, table: &MenuTable) -> Result<(), MenuError>;
}

/// Menu database stored as a semicolon-separated file
#[derive(Debug, Clone)]
pub struct CsvMenuFile {
    path: PathBuf,
}

impl CsvMenuFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl MenuSource for CsvMenuFile {
    fn read_table(&self) -> Result<MenuTable, MenuError> {
        if !self.path.exists() {
            return Err(MenuError::MissingResource(format!(
                "File {} non trovato",
                self.path.display()
            )));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(MenuError::MalformedInput(format!(
                "{} has no header row",
                self.path.display()
            )));
        }

        let mut table = MenuTable::new(headers);
        for (index, record) in reader.records().enumerate() {
            match record {
                Ok(record) => {
                    let row = MenuRow::from_pairs(
                        table.headers.iter().cloned().zip(record.iter().map(str::to_string)),
                    );
                    table.rows.push(row);
                }
                Err(e) => {
                    let line = e.position().map_or(index + 2, |p| p.line() as usize);
                    warn!("Skipping unreadable row {} in {}: {}", line, self.path.display(), e);
                    table.skipped.push(SkippedRecord {
                        line,
                        reason: unreadable_reason(&e),
                    });
                }
            }
        }

        debug!("Read {} rows from {}", table.rows.len(), self.path.display());
        Ok(table)
    }

    fn write_table(&mut self, table: &MenuTable) -> Result<(), MenuError> {
        let mut writer = WriterBuilder::new().delimiter(DELIMITER).from_path(&self.path)?;

        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(table.headers.iter().map(|h| row.get(h)))?;
        }
        writer.flush()?;

        info!("Wrote {} rows to {}", table.rows.len(), self.path.display());
        Ok(())
    }
}

fn unreadable_reason(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Utf8 { .. } => "invalid UTF-8".to_string(),
        _ => err.to_string(),
    }
}

/// Parse a date in `DD/MM/YYYY` or `YYYY-MM-DD` form
pub fn parse_menu_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.contains('/') {
        NaiveDate::parse_from_str(text, "%d/%m/%Y").ok()
    } else if text.contains('-') {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
    } else {
        None
    }
}

/// Canonical `YYYY-MM-DD` form of a date in either accepted format
pub fn normalize_date(text: &str) -> Option<String> {
    parse_menu_date(text).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Render a date as `DD/MM/YYYY`
pub fn format_italian_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// ISO-8601 (year, week) of a date
pub fn iso_week(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

/// ISO (year, week) of a date text; malformed text falls back to week 1
/// of the first four-digit year found in it (year 0 when there is none)
pub fn iso_week_of(text: &str) -> (i32, u32) {
    match parse_menu_date(text) {
        Some(date) => iso_week(date),
        None => {
            let year = text
                .trim()
                .split(['-', '/'])
                .find(|part| part.len() == 4)
                .and_then(|y| y.parse().ok())
                .unwrap_or(0);
            debug!("Unparseable date '{}', using week 1 of {}", text, year);
            (year, 1)
        }
    }
}

/// One ingredient of a dish with its quantity expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    pub quantity: String,
}

/// Pair the pipe-separated ingredient and quantity fields by position.
///
/// A missing quantity becomes "q.b."; surplus quantities are ignored.
pub fn ingredient_lines(ingredients: &str, quantities: &str) -> Vec<IngredientLine> {
    let mut quantities = split_list(quantities).into_iter();
    split_list(ingredients)
        .into_iter()
        .map(|name| IngredientLine {
            name,
            quantity: quantities.next().unwrap_or_else(|| AS_NEEDED_TEXT.to_string()),
        })
        .filter(|line| !line.name.is_empty())
        .collect()
}

/// Split a `|`-separated field into trimmed items; empty field gives no items
pub fn split_list(field: &str) -> Vec<String> {
    if field.trim().is_empty() {
        return Vec::new();
    }
    field.split(LIST_SEPARATOR).map(|s| s.trim().to_string()).collect()
}

/// A typed menu entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: u32,
    pub date: NaiveDate,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub active: bool,
    pub recipe: Option<String>,
    pub ingredients: Vec<IngredientLine>,
}

impl Dish {
    /// Build a dish from a row, rejecting rows with a bad id, date or price
    pub fn from_row(row: &MenuRow) -> Result<Self, MenuError> {
        let id = row
            .id()
            .ok_or_else(|| MenuError::MalformedInput(format!("invalid id '{}'", row.get(columns::ID))))?;

        let date = parse_menu_date(row.get(columns::DATE)).ok_or_else(|| {
            MenuError::MalformedInput(format!("dish {}: invalid date '{}'", id, row.get(columns::DATE)))
        })?;

        let price = parse_price(row.get(columns::PRICE)).ok_or_else(|| {
            MenuError::MalformedInput(format!("dish {}: invalid price '{}'", id, row.get(columns::PRICE)))
        })?;

        let recipe = Some(row.get(columns::RECIPE).trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(Self {
            id,
            date,
            name: row.get(columns::NAME).trim().to_string(),
            description: row.get(columns::DESCRIPTION).trim().to_string(),
            category: row.get(columns::CATEGORY).trim().to_string(),
            price,
            active: is_active_flag(row.get(columns::ACTIVE)),
            recipe,
            ingredients: ingredient_lines(row.get(columns::INGREDIENTS), row.get(columns::QUANTITIES)),
        })
    }

    /// Canonical date text
    pub fn date_text(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Ingredient names only
    pub fn ingredient_names(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(|l| l.name.as_str())
    }
}

/// Parse a non-negative price
pub fn parse_price(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// True for "SI" in any case
pub fn is_active_flag(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("SI")
}
