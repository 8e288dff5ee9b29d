//! # Menu Planner
//!
//! Restaurant menu management over a flat semicolon-separated database:
//! daily menus, ISO week indexes, aggregated shopping lists with ingredient
//! classification, votes, data validation and balanced weekly menu
//! generation against a nutritional frequency table.

pub mod catalog;
pub mod circuit_breaker;
pub mod classifier;
pub mod config;
pub mod data_source;
pub mod duplicates;
pub mod generator;
pub mod groq_client;
pub mod ingredient_categories;
pub mod menu_errors;
pub mod nutrition;
pub mod quantity;
pub mod quantity_patterns;
pub mod settings;
pub mod shopping_list;
pub mod validator;
pub mod votes;
