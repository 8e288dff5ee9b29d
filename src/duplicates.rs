//! # Duplicate Dishes Module
//!
//! Finds dishes that share a name (case-insensitive, trimmed) and removes the
//! copies, keeping the row with the lowest id as the original.

use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::data_source::{columns, CsvMenuFile, MenuSource};
use crate::menu_errors::MenuError;
use crate::validator::snapshot;

/// Dishes sharing one name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Name as written on the original row
    pub name: String,
    pub original: u32,
    pub duplicates: Vec<u32>,
}

/// Duplicate analysis of the whole data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    pub duplicate_count: usize,
    pub group_count: usize,
    pub total_dishes: usize,
}

impl DuplicateReport {
    /// Every id that `remove` should drop
    pub fn duplicate_ids(&self) -> Vec<u32> {
        self.groups.iter().flat_map(|g| g.duplicates.iter().copied()).collect()
    }
}

/// Outcome of a removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    pub before: usize,
    pub after: usize,
    pub removed: usize,
    pub backup: PathBuf,
}

/// Group rows by normalized name and report groups with more than one row
pub fn analyze<S: MenuSource>(source: &S) -> Result<DuplicateReport, MenuError> {
    let table = source.read_table()?;

    let mut by_name: BTreeMap<String, Vec<(u32, String)>> = BTreeMap::new();
    let mut total_dishes = 0;
    for row in &table.rows {
        let Some(id) = row.id() else {
            continue;
        };
        total_dishes += 1;
        let name = row.get(columns::NAME).trim();
        by_name
            .entry(name.to_lowercase())
            .or_default()
            .push((id, name.to_string()));
    }

    let groups: Vec<DuplicateGroup> = by_name
        .into_values()
        .filter(|dishes| dishes.len() > 1)
        .map(|mut dishes| {
            dishes.sort_by_key(|(id, _)| *id);
            let (original, name) = dishes[0].clone();
            DuplicateGroup {
                name,
                original,
                duplicates: dishes[1..].iter().map(|(id, _)| *id).collect(),
            }
        })
        .collect();

    let duplicate_count = groups.iter().map(|g| g.duplicates.len()).sum();
    info!(
        "Duplicate analysis: {} groups, {} duplicates over {} dishes",
        groups.len(),
        duplicate_count,
        total_dishes
    );

    Ok(DuplicateReport {
        group_count: groups.len(),
        groups,
        duplicate_count,
        total_dishes,
    })
}

/// Remove the rows with the given ids, after backing the file up
pub fn remove(file: &mut CsvMenuFile, ids: &[u32]) -> Result<RemovalReport, MenuError> {
    if ids.is_empty() {
        return Err(MenuError::MalformedInput("no duplicate ids given".to_string()));
    }

    let mut table = file.read_table()?;
    let backup = snapshot(file.path(), "backup")?;

    let doomed: BTreeSet<u32> = ids.iter().copied().collect();
    let before = table.rows.len();
    table.rows.retain(|row| row.id().map_or(true, |id| !doomed.contains(&id)));
    let after = table.rows.len();

    file.write_table(&table)?;
    info!("Removed {} duplicate dishes", before - after);

    Ok(RemovalReport {
        before,
        after,
        removed: before - after,
        backup,
    })
}
