//! # Catalog and Shopping List Tests
//!
//! End-to-end checks over a menu database written to a temporary directory:
//! daily menus, ISO week grouping and aggregated shopping lists.

use menu_planner::catalog::MenuCatalog;
use menu_planner::classifier::IngredientClassifier;
use menu_planner::data_source::CsvMenuFile;
use menu_planner::ingredient_categories::ShoppingCategory;
use menu_planner::menu_errors::MenuError;
use menu_planner::shopping_list::ShoppingListAggregator;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str = "id;data;nome;descrizione;categoria;prezzo;attivo;ricetta;ingredienti;quantita";

fn write_menu(dir: &TempDir, rows: &[&str]) -> PathBuf {
    let path = dir.path().join("menu_database.csv");
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    fs::write(&path, content).unwrap();
    path
}

fn scenario_rows() -> Vec<&'static str> {
    vec![
        "1;06/01/2025;Pasta al tonno;Pasta con tonno;Primi;8.50;SI;;Pasta|Tonno in scatola;100g|1 scatola",
        "2;06/01/2025;Riso e pollo;Riso con pollo;Secondi;12,00;SI;Cuocere il riso;Riso|Pollo;80g|150g",
        "3;06/01/2025;Pane;Pane casereccio;Contorni;2.00;SI;;Pane;2 fette",
        "4;07/01/2025;Zuppa di legumi;Ceci e lenticchie;Zuppe;7.00;NO;;Ceci|Lenticchie;100g|100g",
        "5;30/12/2024;Frittata;Uova e zucchine;Secondi;6.00;SI;;Uova|Zucchine;2|1",
    ]
}

fn catalog_for(path: &PathBuf) -> MenuCatalog<CsvMenuFile> {
    MenuCatalog::new(CsvMenuFile::new(path))
}

#[test]
fn test_load_menu_of_a_day() {
    let dir = TempDir::new().unwrap();
    let path = write_menu(&dir, &scenario_rows());
    let catalog = catalog_for(&path);

    let menu = catalog.load_menu("06/01/2025", false);
    assert_eq!(menu.date, "2025-01-06");
    assert_eq!(menu.total, 3);
    assert!(menu.error.is_none());
    assert_eq!(menu.dishes[0].name, "Pasta al tonno");
    assert_eq!(menu.dishes[0].price, "€8.50");
    assert_eq!(menu.dishes[0].week, 2);
    assert!(menu.dishes[0].ingredients.is_none());
    assert_eq!(menu.dishes[1].price, "€12.00");
    assert_eq!(menu.dishes[1].recipe.as_deref(), Some("Cuocere il riso"));

    // Inactive dishes are hidden but their date is still listed
    let menu = catalog.load_menu("2025-01-07", true);
    assert_eq!(menu.total, 0);
    assert_eq!(
        menu.available_dates,
        vec!["2024-12-30", "2025-01-06", "2025-01-07"]
    );
}

#[test]
fn test_load_menu_with_ingredients_and_currency() {
    let dir = TempDir::new().unwrap();
    let path = write_menu(&dir, &scenario_rows());
    let catalog = catalog_for(&path).with_currency("CHF ");

    let menu = catalog.load_menu("2025-01-06", true);
    let lines = menu.dishes[0].ingredients.as_ref().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].name, "Tonno in scatola");
    assert_eq!(lines[1].quantity, "1 scatola");
    assert_eq!(menu.dishes[0].price, "CHF 8.50");
}

#[test]
fn test_missing_file_sets_error_marker() {
    let dir = TempDir::new().unwrap();
    let catalog = catalog_for(&dir.path().join("missing.csv"));

    let menu = catalog.load_menu("2025-01-06", false);
    assert_eq!(menu.total, 0);
    assert!(menu.dishes.is_empty());
    assert!(menu.error.is_some());
    assert!(catalog.available_dates().is_empty());
}

#[test]
fn test_weeks_follow_iso_numbering() {
    let dir = TempDir::new().unwrap();
    let path = write_menu(&dir, &scenario_rows());
    let catalog = catalog_for(&path);

    let weeks = catalog.available_weeks();
    assert_eq!(weeks.len(), 2);
    // 30/12/2024 belongs to week 1 of 2025
    assert_eq!((weeks[0].year, weeks[0].week), (2025, 1));
    assert_eq!(weeks[0].dates, vec!["2024-12-30"]);
    assert_eq!(weeks[0].label, "Settimana 1 del 2025");
    assert_eq!((weeks[1].year, weeks[1].week), (2025, 2));
    assert_eq!(weeks[1].dates, vec!["2025-01-06", "2025-01-07"]);

    assert_eq!(catalog.dates_in_week(2025, 2), vec!["2025-01-06", "2025-01-07"]);
    assert!(catalog.dates_in_week(2024, 52).is_empty());
}

#[test]
fn test_dishes_by_protein_groups() {
    let dir = TempDir::new().unwrap();
    let path = write_menu(&dir, &scenario_rows());
    let groups = catalog_for(&path).dishes_by_protein().unwrap();

    let total: usize = groups.iter().map(|g| g.dishes.len()).sum();
    assert_eq!(total, 4);
    // Uncategorized dishes come last
    let last = groups.last().unwrap();
    assert!(last.category.is_none());
    assert!(last.dishes.iter().any(|d| d.name == "Pane"));
}

#[test]
fn test_shopping_list_for_two_people() {
    let dir = TempDir::new().unwrap();
    let path = write_menu(&dir, &scenario_rows());
    let catalog = catalog_for(&path);
    let mut classifier = IngredientClassifier::in_memory();

    let list = ShoppingListAggregator::new(&catalog, &mut classifier)
        .aggregate(&["2025-01-06".to_string()], 2)
        .unwrap();

    assert_eq!(list.party_size, 2);
    assert_eq!(list.total_ingredients, 5);
    assert_eq!(list.quantity_of("Pasta"), Some("200 g"));
    assert_eq!(list.quantity_of("Riso"), Some("160 g"));
    assert_eq!(list.quantity_of("Pollo"), Some("300 g"));
    assert_eq!(list.quantity_of("Tonno in scatola"), Some("2 unità"));
    assert_eq!(list.quantity_of("Pane"), Some("4 unità"));

    assert_eq!(list.category_of("Pasta"), Some(ShoppingCategory::Pantry));
    assert_eq!(list.category_of("Pane"), Some(ShoppingCategory::Pantry));
    assert_eq!(list.category_of("Pollo"), Some(ShoppingCategory::MeatAndFish));
    assert_eq!(list.category_of("Tonno in scatola"), Some(ShoppingCategory::MeatAndFish));

    // Fixed category order, empty categories omitted
    let order: Vec<ShoppingCategory> = list.categories.iter().map(|g| g.category).collect();
    assert_eq!(order, vec![ShoppingCategory::MeatAndFish, ShoppingCategory::Pantry]);
}

#[test]
fn test_shopping_list_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let path = write_menu(&dir, &scenario_rows());
    let catalog = catalog_for(&path);
    let mut classifier = IngredientClassifier::in_memory();
    let mut aggregator = ShoppingListAggregator::new(&catalog, &mut classifier);

    assert!(matches!(aggregator.aggregate(&[], 2), Err(MenuError::MalformedInput(_))));
    assert!(matches!(
        aggregator.aggregate(&["2025-01-06".to_string()], 0),
        Err(MenuError::MalformedInput(_))
    ));
    assert!(matches!(
        aggregator.aggregate(&["sometime".to_string()], 1),
        Err(MenuError::MalformedInput(_))
    ));
}

#[test]
fn test_shopping_list_across_dates_skips_inactive() {
    let dir = TempDir::new().unwrap();
    let path = write_menu(&dir, &scenario_rows());
    let catalog = catalog_for(&path);
    let mut classifier = IngredientClassifier::in_memory();

    let list = ShoppingListAggregator::new(&catalog, &mut classifier)
        .aggregate(&["30/12/2024".to_string(), "2025-01-07".to_string()], 1)
        .unwrap();

    assert_eq!(list.quantity_of("Uova"), Some("2 unità"));
    assert_eq!(list.quantity_of("Zucchine"), Some("1 unità"));
    assert!(list.quantity_of("Ceci").is_none());
}
