use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;

use menu_planner::catalog::MenuCatalog;
use menu_planner::classifier::IngredientClassifier;
use menu_planner::config::AppConfig;
use menu_planner::data_source::{parse_menu_date, CsvMenuFile};
use menu_planner::duplicates;
use menu_planner::generator::{self, next_monday, Strategy, WeeklyMenuGenerator};
use menu_planner::settings::{SettingsStore, SettingsUpdate};
use menu_planner::shopping_list::ShoppingListAggregator;
use menu_planner::validator;
use menu_planner::votes::VoteStore;

#[derive(Parser)]
#[command(name = "menu")]
#[command(about = "Restaurant menu planner", long_about = None)]
struct Cli {
    /// Menu database file (overrides MENU_DATA_FILE)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the menu of a date (default: today)
    Menu {
        /// Date as YYYY-MM-DD or DD/MM/YYYY
        date: Option<String>,
        /// Include ingredients and quantities
        #[arg(long)]
        ingredients: bool,
    },
    /// List every date with at least one dish
    Dates,
    /// List available dates grouped by ISO week
    Weeks,
    /// List available dates of one ISO week
    WeekDates { year: i32, week: u32 },
    /// Aggregate the shopping list for one or more dates
    ShoppingList {
        #[arg(required = true)]
        dates: Vec<String>,
        /// Number of people
        #[arg(long, short, default_value_t = 1)]
        people: u32,
    },
    /// Classify ingredient names into shopping categories
    Classify {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Group active dishes by protein category
    ProteinGroups,
    /// Validate the menu database (writes a backup first)
    Validate,
    /// Restore the menu database from the latest backup
    Restore,
    /// Generate a balanced weekly menu
    Generate {
        /// Selection strategy: quota or random
        #[arg(long, default_value_t = Strategy::Quota)]
        strategy: Strategy,
        /// First day of the week (default: next Monday)
        #[arg(long)]
        start: Option<String>,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Append the generated week to the menu database
        #[arg(long)]
        commit: bool,
    },
    /// Find dishes with the same name
    Duplicates {
        /// Remove every duplicate, keeping the lowest id
        #[arg(long)]
        remove: bool,
    },
    /// Rate a dish from 1 to 5 stars
    Vote {
        user: String,
        dish_id: u32,
        rating: u8,
        #[arg(long, default_value = "")]
        comment: String,
        /// Menu date (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show a user's votes for a date
    MyVotes {
        user: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Show vote statistics for a date
    VoteStats {
        #[arg(long)]
        date: Option<String>,
    },
    /// Show or update settings
    Settings {
        #[arg(long)]
        show_prices: Option<bool>,
        #[arg(long)]
        restaurant_name: Option<String>,
        #[arg(long)]
        currency_symbol: Option<String>,
        /// Show only the options visible to non-admin users
        #[arg(long)]
        public: bool,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(data) = cli.data {
        config.data_file = data;
    }

    info!("Using menu database {}", config.data_file.display());
    run(cli.command, &config)
}

fn run(command: Commands, config: &AppConfig) -> Result<()> {
    let settings = SettingsStore::new(&config.settings_file);
    let catalog = MenuCatalog::new(CsvMenuFile::new(&config.data_file))
        .with_currency(settings.load().currency_symbol);
    let today = Local::now().date_naive();
    let today_text = today.format("%Y-%m-%d").to_string();

    match command {
        Commands::Menu { date, ingredients } => {
            let date = date.unwrap_or_else(|| today_text.clone());
            print_json(&catalog.load_menu(&date, ingredients))?;
        }
        Commands::Dates => print_json(&catalog.available_dates())?,
        Commands::Weeks => print_json(&catalog.available_weeks())?,
        Commands::WeekDates { year, week } => print_json(&catalog.dates_in_week(year, week))?,
        Commands::ShoppingList { dates, people } => {
            let mut classifier = IngredientClassifier::from_config(config);
            let list = ShoppingListAggregator::new(&catalog, &mut classifier)
                .with_policy(config.unit_mismatch)
                .aggregate(&dates, people)?;
            print_json(&list)?;
        }
        Commands::Classify { names } => {
            let mut classifier = IngredientClassifier::from_config(config);
            let categories = classifier.classify_all(&names);
            print_json(&serde_json::json!({
                "categories": categories,
                "stats": classifier.stats(),
            }))?;
        }
        Commands::ProteinGroups => print_json(&catalog.dishes_by_protein()?)?,
        Commands::Validate => print_json(&validator::validate(catalog.source())?)?,
        Commands::Restore => print_json(&validator::restore(&config.data_file)?)?,
        Commands::Generate {
            strategy,
            start,
            seed,
            commit,
        } => {
            let start = match start {
                Some(text) => parse_date_arg(&text)?,
                None => next_monday(today),
            };
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let generator = WeeklyMenuGenerator::from_catalog(&catalog)?;
            let week = generator.generate(strategy, start, config.generator_attempts, &mut rng);

            let added = if commit {
                let mut source = CsvMenuFile::new(&config.data_file);
                generator::commit(&week.plan, &mut source)?
            } else {
                Vec::new()
            };
            print_json(&serde_json::json!({ "week": week, "added_ids": added }))?;
        }
        Commands::Duplicates { remove } => {
            let report = duplicates::analyze(catalog.source())?;
            if remove && report.duplicate_count > 0 {
                let mut file = CsvMenuFile::new(&config.data_file);
                print_json(&duplicates::remove(&mut file, &report.duplicate_ids())?)?;
            } else {
                print_json(&report)?;
            }
        }
        Commands::Vote {
            user,
            dish_id,
            rating,
            comment,
            date,
        } => {
            let date = date.unwrap_or_else(|| today_text.clone());
            let vote = VoteStore::new(&config.votes_file).cast(&user, dish_id, rating, &comment, &date)?;
            print_json(&vote)?;
        }
        Commands::MyVotes { user, date } => {
            let date = date.unwrap_or_else(|| today_text.clone());
            print_json(&VoteStore::new(&config.votes_file).votes_of(&user, &date)?)?;
        }
        Commands::VoteStats { date } => {
            let date = date.unwrap_or_else(|| today_text.clone());
            print_json(&VoteStore::new(&config.votes_file).statistics(&date)?)?;
        }
        Commands::Settings {
            show_prices,
            restaurant_name,
            currency_symbol,
            public,
        } => {
            let update = SettingsUpdate {
                show_prices,
                restaurant_name,
                currency_symbol,
            };
            let current = if update == SettingsUpdate::default() {
                settings.load()
            } else {
                settings.update(update)?
            };
            if public {
                print_json(&current.public_view())?;
            } else {
                print_json(&current)?;
            }
        }
    }

    Ok(())
}

fn parse_date_arg(text: &str) -> Result<NaiveDate> {
    parse_menu_date(text).with_context(|| format!("Invalid date '{text}'"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
