//! # Weekly Generator Tests
//!
//! Generation over a menu database holding one dish per protein category,
//! seeded for reproducible output, plus committing a week back to the file.

use chrono::NaiveDate;
use menu_planner::catalog::MenuCatalog;
use menu_planner::data_source::{columns, CsvMenuFile, MenuSource};
use menu_planner::generator::{commit, Strategy, WeeklyMenuGenerator, WeeklyPlan, MEALS_PER_WEEK};
use menu_planner::menu_errors::MenuError;
use menu_planner::nutrition::ProteinCategory;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str = "id;data;nome;descrizione;categoria;prezzo;attivo;ricetta;ingredienti;quantita";

const ONE_PER_CATEGORY: [(&str, &str); 11] = [
    ("Pasta e fagioli", "Pasta|Fagioli"),
    ("Frittata", "Uova|Zucchine"),
    ("Pollo arrosto", "Pollo|Rosmarino"),
    ("Tagliata", "Manzo|Rucola"),
    ("Ricotta e spinaci", "Ricotta|Spinaci"),
    ("Scaglie di grana", "Parmigiano|Rucola"),
    ("Merluzzo al forno", "Merluzzo|Patate"),
    ("Salmone alla piastra", "Salmone|Limone"),
    ("Spaghetti alle vongole", "Spaghetti|Vongole"),
    ("Insalata di tonno", "Tonno in scatola|Insalata"),
    ("Bresaola e rucola", "Bresaola|Rucola"),
];

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 13).unwrap()
}

fn write_catalog(dir: &TempDir, dishes: &[(&str, &str)], first_id: u32) -> PathBuf {
    let path = dir.path().join("menu_database.csv");
    let mut content = String::from(HEADER);
    for (offset, (name, ingredients)) in dishes.iter().enumerate() {
        content.push_str(&format!(
            "\n{};06/01/2025;{};;Secondi;10.00;SI;;{};100g|100g",
            first_id + offset as u32,
            name,
            ingredients
        ));
    }
    content.push('\n');
    fs::write(&path, content).unwrap();
    path
}

fn generator_for(path: &PathBuf) -> WeeklyMenuGenerator {
    let catalog = MenuCatalog::new(CsvMenuFile::new(path));
    WeeklyMenuGenerator::from_catalog(&catalog).unwrap()
}

#[test]
fn test_catalog_covers_every_category() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, &ONE_PER_CATEGORY, 1);
    let generator = generator_for(&path);

    assert_eq!(generator.candidate_count(), 11);
    assert_eq!(generator.candidates_in(ProteinCategory::Legumes), 1);
    assert_eq!(generator.candidates_in(ProteinCategory::CannedTuna), 1);
    assert_eq!(generator.candidates_in(ProteinCategory::CuredMeats), 1);
}

#[test]
fn test_quota_fills_every_slot() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, &ONE_PER_CATEGORY, 1);
    let generator = generator_for(&path);

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let week = generator.generate(Strategy::Quota, start(), 10, &mut rng);

        assert_eq!(week.plan.filled_slots(), MEALS_PER_WEEK);
        assert_eq!(week.counts.values().sum::<u32>() as usize, MEALS_PER_WEEK);
        assert!(week.valid, "seed {} produced {:?}", seed, week.violations);
        assert_eq!(week.counts.get(&ProteinCategory::Legumes).copied(), Some(2));
        assert_eq!(week.attempts, 1);
    }
}

#[test]
fn test_same_seed_same_week() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, &ONE_PER_CATEGORY, 1);
    let generator = generator_for(&path);

    let first = generator.generate(Strategy::Quota, start(), 10, &mut StdRng::seed_from_u64(7));
    let second = generator.generate(Strategy::Quota, start(), 10, &mut StdRng::seed_from_u64(7));
    assert_eq!(first, second);
}

#[test]
fn test_random_gives_up_after_bounded_attempts() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, &ONE_PER_CATEGORY[..1], 1);
    let generator = generator_for(&path);

    let mut rng = StdRng::seed_from_u64(3);
    let week = generator.generate(Strategy::Random, start(), 5, &mut rng);

    assert_eq!(week.strategy, Strategy::Random);
    assert_eq!(week.attempts, 5);
    assert_eq!(week.plan.filled_slots(), MEALS_PER_WEEK);
    assert!(!week.valid);
    assert!(!week.violations.is_empty());
}

#[test]
fn test_commit_appends_fresh_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, &ONE_PER_CATEGORY, 20);
    let generator = generator_for(&path);
    let week = generator.generate(Strategy::Quota, start(), 10, &mut StdRng::seed_from_u64(1));

    let mut file = CsvMenuFile::new(&path);
    let ids = commit(&week.plan, &mut file).unwrap();
    assert_eq!(ids, (31..31 + MEALS_PER_WEEK as u32).collect::<Vec<_>>());

    let table = file.read_table().unwrap();
    assert_eq!(table.rows.len(), 11 + MEALS_PER_WEEK);

    let first_new = &table.rows[11];
    assert_eq!(first_new.get(columns::ID), "31");
    assert_eq!(first_new.get(columns::DATE), "13/01/2025");
    let last_new = table.rows.last().unwrap();
    assert_eq!(last_new.get(columns::DATE), "19/01/2025");
    assert_eq!(last_new.get(columns::ACTIVE), "SI");
}

#[test]
fn test_commit_rejects_empty_plan() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, &ONE_PER_CATEGORY, 1);
    let mut file = CsvMenuFile::new(&path);

    let result = commit(&WeeklyPlan::empty(start()), &mut file);
    assert!(matches!(result, Err(MenuError::MalformedInput(_))));
    assert_eq!(file.read_table().unwrap().rows.len(), 11);
}
