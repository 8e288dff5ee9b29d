//! # Configuration Module
//!
//! This module defines the application configuration: file locations, the
//! optional external classifier, generator limits and the recovery settings
//! used by the circuit breaker around the classifier.

use log::{info, warn};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::quantity::UnitMismatchPolicy;

// Defaults for file locations
pub const DEFAULT_DATA_FILE: &str = "menu_database.csv";
pub const DEFAULT_VOTES_FILE: &str = "voti.json";
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_CACHE_FILE: &str = "ingredienti_cache.json";

// Defaults for the external classifier
pub const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 10;

/// Default number of attempts for the randomized weekly generator
pub const DEFAULT_GENERATOR_ATTEMPTS: u32 = 100;

/// Recovery configuration for the external classifier
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Consecutive failures before the breaker opens
    pub circuit_breaker_threshold: u32,
    /// Seconds the breaker stays open before calls are attempted again
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_threshold: 3,
            circuit_breaker_reset_secs: 300, // 5 minutes
        }
    }
}

/// Settings for the optional external classification service
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Whether the external service may be queried at all
    pub enabled: bool,
    /// API key; without it the service is never queried
    pub api_key: Option<String>,
    /// Chat completions endpoint
    pub endpoint: String,
    /// Model name sent with each request
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Recovery and error handling configuration
    pub recovery: RecoveryConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            endpoint: DEFAULT_GROQ_URL.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
            recovery: RecoveryConfig::default(),
        }
    }
}

impl AiConfig {
    /// True when the service is enabled and a key is present
    pub fn is_available(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Semicolon-separated menu database
    pub data_file: PathBuf,
    /// JSON vote document
    pub votes_file: PathBuf,
    /// JSON settings document
    pub settings_file: PathBuf,
    /// JSON ingredient classification cache
    pub cache_file: PathBuf,
    /// External classifier settings
    pub ai: AiConfig,
    /// Attempt bound for the randomized generator
    pub generator_attempts: u32,
    /// How the shopping list treats quantities with different units
    pub unit_mismatch: UnitMismatchPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            votes_file: PathBuf::from(DEFAULT_VOTES_FILE),
            settings_file: PathBuf::from(DEFAULT_SETTINGS_FILE),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            ai: AiConfig::default(),
            generator_attempts: DEFAULT_GENERATOR_ATTEMPTS,
            unit_mismatch: UnitMismatchPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional:
    /// - `MENU_DATA_FILE`, `MENU_VOTES_FILE`, `MENU_SETTINGS_FILE`, `MENU_INGREDIENT_CACHE`
    /// - `GROQ_API_KEY`, `GROQ_MODEL`, `MENU_USE_AI`, `MENU_AI_TIMEOUT_SECS`
    /// - `MENU_GENERATOR_ATTEMPTS`
    /// - `MENU_UNIT_MISMATCH` (`keep-first` or `warn`)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ai = AiConfig {
            enabled: try_load("MENU_USE_AI", defaults.ai.enabled),
            api_key: env::var("GROQ_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            endpoint: env::var("GROQ_API_URL").unwrap_or(defaults.ai.endpoint),
            model: env::var("GROQ_MODEL").unwrap_or(defaults.ai.model),
            timeout_secs: try_load("MENU_AI_TIMEOUT_SECS", defaults.ai.timeout_secs),
            recovery: defaults.ai.recovery,
        };

        let config = Self {
            data_file: path_var("MENU_DATA_FILE", defaults.data_file),
            votes_file: path_var("MENU_VOTES_FILE", defaults.votes_file),
            settings_file: path_var("MENU_SETTINGS_FILE", defaults.settings_file),
            cache_file: path_var("MENU_INGREDIENT_CACHE", defaults.cache_file),
            ai,
            generator_attempts: try_load("MENU_GENERATOR_ATTEMPTS", defaults.generator_attempts),
            unit_mismatch: try_load("MENU_UNIT_MISMATCH", defaults.unit_mismatch),
        };

        info!(
            "Configuration loaded: data={}, external classifier={}",
            config.data_file.display(),
            if config.ai.is_available() { "enabled" } else { "disabled" }
        );
        config
    }
}

fn path_var(key: &str, default: PathBuf) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}, using default {default}");
            default
        }),
        Err(_) => default,
    }
}
