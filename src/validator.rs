//! # Data Source Validator Module
//!
//! Validation and repair of the menu database file, plus restore from the
//! most recent backup. The live file is never modified by validation: a
//! backup is always taken first, and a separate corrected file is written
//! only when rows had to be discarded.

use chrono::Local;
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::data_source::{
    columns, parse_menu_date, parse_price, split_list, CsvMenuFile, MenuRow, MenuSource, MenuTable,
    SkippedRecord,
};
use crate::menu_errors::MenuError;

/// Dish categories considered standard; others only raise a warning
pub const STANDARD_CATEGORIES: [&str; 8] = [
    "Primi", "Secondi", "Contorni", "Dolci", "Antipasti", "Vegetariani", "Vegani", "Zuppe",
];

const BACKUP_TAG: &str = "backup";
const PRE_RESTORE_TAG: &str = "pre_restore";
const CORRECTED_SUFFIX: &str = "corrected";

/// A row rejected by validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscardedRow {
    /// Line number in the file (header is line 1)
    pub line: usize,
    pub errors: Vec<String>,
    pub row: MenuRow,
}

/// Outcome of a validation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid_rows: usize,
    pub discarded: Vec<DiscardedRow>,
    pub warnings: Vec<String>,
    pub backup: PathBuf,
    /// Written only when rows were discarded
    pub corrected_file: Option<PathBuf>,
    pub message: String,
}

/// Outcome of a restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub restored_from: PathBuf,
    /// Snapshot of the file as it was before the restore
    pub pre_restore: Option<PathBuf>,
    pub message: String,
}

/// Copy `path` to `{path}.{tag}_{YYYYmmdd_HHMMSS}` (with a `_NNN` counter when
/// that name is taken) and return the copy's path
pub fn snapshot(path: &Path, tag: &str) -> Result<PathBuf, MenuError> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut target = sibling(path, &format!("{tag}_{stamp}"));
    // Same second as an earlier snapshot: number the copy instead of overwriting
    let mut counter = 1;
    while target.exists() {
        target = sibling(path, &format!("{tag}_{stamp}_{counter:03}"));
        counter += 1;
    }
    fs::copy(path, &target)?;
    info!("Snapshot of {} saved as {}", path.display(), target.display());
    Ok(target)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.{suffix}"))
}

/// Validate the menu database, backing it up first.
///
/// Fails only when the file is missing, has no header or lacks required
/// columns; row problems are reported in the result.
pub fn validate(file: &CsvMenuFile) -> Result<ValidationReport, MenuError> {
    if !file.exists() {
        return Err(MenuError::MissingResource(format!(
            "File {} non trovato",
            file.path().display()
        )));
    }

    let backup = snapshot(file.path(), BACKUP_TAG)?;
    let table = file.read_table()?;

    let missing = table.missing_required();
    if !missing.is_empty() {
        return Err(MenuError::MissingColumns(missing));
    }

    let mut valid = Vec::new();
    let mut discarded = Vec::new();
    let mut warnings = Vec::new();

    for record in &table.skipped {
        discarded.push(DiscardedRow {
            line: record.line,
            errors: vec![format!("unreadable row: {}", record.reason)],
            row: MenuRow::default(),
        });
    }

    let lines = row_lines(table.rows.len(), &table.skipped);
    for (row, line) in table.rows.iter().zip(lines) {
        let mut row = row.clone();
        let errors = check_row(&mut row, line, &mut warnings);

        if errors.is_empty() {
            valid.push(row);
        } else {
            discarded.push(DiscardedRow { line, errors, row });
        }
    }
    discarded.sort_by_key(|d| d.line);

    let corrected_file = if discarded.is_empty() {
        None
    } else {
        let path = sibling(file.path(), CORRECTED_SUFFIX);
        let corrected = MenuTable {
            rows: valid.clone(),
            ..MenuTable::new(table.headers.clone())
        };
        CsvMenuFile::new(&path).write_table(&corrected)?;
        Some(path)
    };

    let message = match &corrected_file {
        Some(path) => format!(
            "Found {} invalid rows. Corrected file saved as {}",
            discarded.len(),
            path.display()
        ),
        None => "No errors found. The menu database is valid".to_string(),
    };
    info!("{}", message);

    Ok(ValidationReport {
        valid_rows: valid.len(),
        discarded,
        warnings,
        backup,
        corrected_file,
        message,
    })
}

/// File line of each decoded row, skipping the lines of unreadable records
fn row_lines(count: usize, skipped: &[SkippedRecord]) -> Vec<usize> {
    let taken: BTreeSet<usize> = skipped.iter().map(|s| s.line).collect();
    (2..).filter(|line| !taken.contains(line)).take(count).collect()
}

/// Check one row; returns its errors, pushes warnings, fixes the active flag
fn check_row(row: &mut MenuRow, line: usize, warnings: &mut Vec<String>) -> Vec<String> {
    let mut errors = Vec::new();

    let id = row.get(columns::ID).trim().to_string();
    match id.parse::<i64>() {
        Ok(value) if value <= 0 => errors.push("ID must be > 0".to_string()),
        Ok(_) => {}
        Err(_) => errors.push(format!("Invalid ID: {id}")),
    }

    let date = row.get(columns::DATE).trim().to_string();
    if date.is_empty() {
        errors.push("Missing date".to_string());
    } else if parse_menu_date(&date).is_none() {
        errors.push(format!("Invalid date: {date}"));
    }

    if row.get(columns::NAME).trim().is_empty() {
        errors.push("Missing dish name".to_string());
    }

    let category = row.get(columns::CATEGORY).trim();
    if !STANDARD_CATEGORIES.contains(&category) {
        warnings.push(format!("Line {line}: non-standard category '{category}'"));
    }

    let price = row.get(columns::PRICE).trim().to_string();
    if parse_price(&price).is_none() {
        match price.replace(',', ".").parse::<f64>() {
            Ok(_) => errors.push("Negative price".to_string()),
            Err(_) => errors.push(format!("Invalid price: {price}")),
        }
    }

    let active = row.get(columns::ACTIVE).trim().to_uppercase();
    if active != "SI" && active != "NO" {
        warnings.push(format!(
            "Line {line}: active flag must be SI or NO, found '{active}', corrected to SI"
        ));
        row.set(columns::ACTIVE, "SI");
    }

    let ingredients = split_list(row.get(columns::INGREDIENTS));
    let quantities = split_list(row.get(columns::QUANTITIES));
    if !ingredients.is_empty() && !quantities.is_empty() && ingredients.len() != quantities.len() {
        warnings.push(format!(
            "Line {line}: {} ingredients but {} quantities",
            ingredients.len(),
            quantities.len()
        ));
    }

    errors
}

/// Replace the live file with its most recent `.backup_*` snapshot, after
/// snapshotting the current state as `.pre_restore_*`
pub fn restore(path: &Path) -> Result<RestoreReport, MenuError> {
    let latest = latest_backup(path)?;

    let pre_restore = if path.exists() {
        Some(snapshot(path, PRE_RESTORE_TAG)?)
    } else {
        None
    };

    fs::copy(&latest, path)?;

    let message = format!(
        "Menu database restored from {}",
        latest.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
    );
    info!("{}", message);

    Ok(RestoreReport {
        restored_from: latest,
        pre_restore,
        message,
    })
}

/// Most recently modified `{file}.backup_*` next to `path`
pub fn latest_backup(path: &Path) -> Result<PathBuf, MenuError> {
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = format!(
        "{}.{}_",
        path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
        BACKUP_TAG
    );

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(&directory)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, entry.path()));
    }

    // Same mtime: the later timestamp in the name wins
    candidates
        .into_iter()
        .max()
        .map(|(_, path)| path)
        .ok_or_else(|| MenuError::NoBackup(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> MenuRow {
        MenuRow::from_pairs(pairs.iter().copied())
    }

    fn good_row() -> MenuRow {
        row(&[
            ("id", "1"),
            ("data", "06/01/2025"),
            ("nome", "Pasta e ceci"),
            ("descrizione", ""),
            ("categoria", "Primi"),
            ("prezzo", "8.50"),
            ("attivo", "SI"),
        ])
    }

    #[test]
    fn test_good_row_passes() {
        let mut warnings = Vec::new();
        assert!(check_row(&mut good_row(), 2, &mut warnings).is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_row_errors() {
        let mut warnings = Vec::new();
        let mut bad = good_row();
        bad.set("id", "-3");
        bad.set("data", "31/02/2025");
        bad.set("nome", "  ");
        bad.set("prezzo", "-1");
        let errors = check_row(&mut bad, 5, &mut warnings);
        assert_eq!(
            errors,
            vec!["ID must be > 0", "Invalid date: 31/02/2025", "Missing dish name", "Negative price"]
        );

        let mut bad = good_row();
        bad.set("prezzo", "gratis");
        assert_eq!(check_row(&mut bad, 2, &mut warnings), vec!["Invalid price: gratis"]);
    }

    #[test]
    fn test_active_flag_corrected_with_warning() {
        let mut warnings = Vec::new();
        let mut odd = good_row();
        odd.set("attivo", "forse");
        assert!(check_row(&mut odd, 3, &mut warnings).is_empty());
        assert_eq!(odd.get("attivo"), "SI");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Line 3:"));
    }

    #[test]
    fn test_category_and_count_warnings() {
        let mut warnings = Vec::new();
        let mut odd = good_row();
        odd.set("categoria", "Pizze");
        odd.set("ingredienti", "Farina|Acqua|Lievito");
        odd.set("quantita", "500g|300 ml");
        assert!(check_row(&mut odd, 4, &mut warnings).is_empty());
        assert_eq!(
            warnings,
            vec![
                "Line 4: non-standard category 'Pizze'".to_string(),
                "Line 4: 3 ingredients but 2 quantities".to_string(),
            ]
        );
    }

    #[test]
    fn test_row_lines_skip_unreadable_records() {
        let skipped = vec![SkippedRecord {
            line: 3,
            reason: "invalid UTF-8".to_string(),
        }];
        assert_eq!(row_lines(3, &skipped), vec![2, 4, 5]);
        assert_eq!(row_lines(2, &[]), vec![2, 3]);
    }

    #[test]
    fn test_snapshots_in_the_same_second_do_not_collide() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("menu_database.csv");
        fs::write(&path, "first").unwrap();
        let first = snapshot(&path, BACKUP_TAG).unwrap();

        fs::write(&path, "second").unwrap();
        let second = snapshot(&path, BACKUP_TAG).unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(first).unwrap(), "first");
        assert_eq!(fs::read_to_string(second).unwrap(), "second");
    }

    #[test]
    fn test_sibling_name() {
        assert_eq!(
            sibling(Path::new("data/menu_database.csv"), "corrected"),
            PathBuf::from("data/menu_database.csv.corrected")
        );
    }
}
