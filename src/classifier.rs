//! # Ingredient Classifier Module
//!
//! Resolves ingredient names to shopping categories through a fallback chain:
//!
//! 1. **Cache**: names resolved earlier, persisted as a JSON document
//! 2. **Base dictionary**: common ingredients, substring match
//! 3. **Oracle**: optional external service behind a circuit breaker
//! 4. **Heuristic**: regex patterns per category in priority order
//! 5. **Fallback**: "Altri"
//!
//! Every new resolution is written to the cache file immediately. The
//! classifier is an explicit instance: build it once and pass it by `&mut`.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{AppConfig, RecoveryConfig};
use crate::groq_client::GroqOracle;
use crate::ingredient_categories::{lookup_base, match_heuristic, ShoppingCategory};
use crate::menu_errors::MenuError;

/// Optional external collaborator able to suggest a category
pub trait CategoryOracle {
    /// Suggest a category for an ingredient; `Ok(None)` means no answer
    fn suggest(&self, ingredient: &str) -> Result<Option<ShoppingCategory>, MenuError>;

    /// Short name used in logs
    fn name(&self) -> &'static str {
        "oracle"
    }
}

/// Which tier of the chain produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Cache,
    Base,
    Ai,
    Heuristic,
    Unknown,
}

/// Usage counters, for operational visibility only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierStats {
    pub cache_hits: u64,
    pub base_hits: u64,
    pub ai_queries: u64,
    pub heuristic_hits: u64,
    pub unknown: u64,
    pub total: u64,
    pub cache_size: usize,
}

/// Layered ingredient classifier with a persistent cache
pub struct IngredientClassifier {
    cache: BTreeMap<String, ShoppingCategory>,
    cache_path: Option<PathBuf>,
    oracle: Option<Box<dyn CategoryOracle>>,
    breaker: CircuitBreaker,
    stats: ClassifierStats,
}

impl IngredientClassifier {
    /// Create a classifier persisting its cache at `cache_path`
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        let cache_path = cache_path.into();
        let cache = load_cache(&cache_path);
        info!(
            "Ingredient cache loaded from {} ({} entries)",
            cache_path.display(),
            cache.len()
        );
        Self {
            cache,
            cache_path: Some(cache_path),
            oracle: None,
            breaker: CircuitBreaker::new(RecoveryConfig::default()),
            stats: ClassifierStats::default(),
        }
    }

    /// Create a classifier whose cache lives only in memory
    pub fn in_memory() -> Self {
        Self {
            cache: BTreeMap::new(),
            cache_path: None,
            oracle: None,
            breaker: CircuitBreaker::new(RecoveryConfig::default()),
            stats: ClassifierStats::default(),
        }
    }

    /// Attach an external oracle guarded by a circuit breaker
    pub fn with_oracle(mut self, oracle: Box<dyn CategoryOracle>, recovery: RecoveryConfig) -> Self {
        self.oracle = Some(oracle);
        self.breaker = CircuitBreaker::new(recovery);
        self
    }

    /// Build the classifier described by the application configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let classifier = Self::new(&config.cache_file);
        match GroqOracle::from_config(&config.ai) {
            Ok(Some(oracle)) => classifier.with_oracle(Box::new(oracle), config.ai.recovery.clone()),
            Ok(None) => classifier,
            Err(e) => {
                warn!("External classifier unavailable: {}", e);
                classifier
            }
        }
    }

    /// Classify one ingredient name
    pub fn classify(&mut self, ingredient: &str) -> (ShoppingCategory, ClassificationSource) {
        let normalized = ingredient.trim().to_lowercase();

        if normalized.is_empty() {
            self.stats.unknown += 1;
            return (ShoppingCategory::Other, ClassificationSource::Unknown);
        }

        if let Some(category) = self.cache.get(&normalized) {
            self.stats.cache_hits += 1;
            return (*category, ClassificationSource::Cache);
        }

        let (category, source) = self.resolve(ingredient, &normalized);
        debug!("Classified '{}' as {} ({:?})", normalized, category, source);

        self.cache.insert(normalized, category);
        self.save_cache();
        (category, source)
    }

    /// Classify many names, returning name -> category
    pub fn classify_all<I, S>(&mut self, names: I) -> BTreeMap<String, ShoppingCategory>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| {
                let (category, _) = self.classify(name.as_ref());
                (name.as_ref().to_string(), category)
            })
            .collect()
    }

    /// Usage counters plus cache size
    pub fn stats(&self) -> ClassifierStats {
        let s = &self.stats;
        ClassifierStats {
            total: s.cache_hits + s.base_hits + s.ai_queries + s.heuristic_hits + s.unknown,
            cache_size: self.cache.len(),
            ..s.clone()
        }
    }

    /// Log the usage counters
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            "Classifier stats: total={}, cache={}, base={}, ai={}, heuristic={}, unknown={}, cache_size={}",
            stats.total,
            stats.cache_hits,
            stats.base_hits,
            stats.ai_queries,
            stats.heuristic_hits,
            stats.unknown,
            stats.cache_size
        );
    }

    fn resolve(&mut self, original: &str, normalized: &str) -> (ShoppingCategory, ClassificationSource) {
        if let Some(category) = lookup_base(normalized) {
            self.stats.base_hits += 1;
            return (category, ClassificationSource::Base);
        }

        if let Some(category) = self.ask_oracle(original) {
            self.stats.ai_queries += 1;
            return (category, ClassificationSource::Ai);
        }

        if let Some(category) = match_heuristic(normalized) {
            self.stats.heuristic_hits += 1;
            return (category, ClassificationSource::Heuristic);
        }

        self.stats.unknown += 1;
        (ShoppingCategory::Other, ClassificationSource::Unknown)
    }

    fn ask_oracle(&mut self, ingredient: &str) -> Option<ShoppingCategory> {
        let oracle = self.oracle.as_ref()?;

        if self.breaker.is_open() {
            debug!("Circuit breaker open, skipping {} for '{}'", oracle.name(), ingredient);
            return None;
        }

        match oracle.suggest(ingredient) {
            Ok(answer) => {
                self.breaker.record_success();
                // "Altri" from the oracle is no better than the local fallback
                answer.filter(|c| *c != ShoppingCategory::Other)
            }
            Err(e) => {
                warn!("{} failed for '{}': {}", oracle.name(), ingredient, e);
                self.breaker.record_failure();
                None
            }
        }
    }

    fn save_cache(&self) {
        let Some(path) = &self.cache_path else {
            return;
        };
        if let Err(e) = write_cache(path, &self.cache) {
            warn!("Failed to save ingredient cache {}: {}", path.display(), e);
        }
    }
}

fn load_cache(path: &Path) -> BTreeMap<String, ShoppingCategory> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return BTreeMap::new(),
    };

    let raw: BTreeMap<String, String> = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Ignoring unreadable ingredient cache {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    raw.into_iter()
        .filter_map(|(name, label)| match label.parse() {
            Ok(category) => Some((name, category)),
            Err(e) => {
                warn!("Skipping cache entry '{}': {}", name, e);
                None
            }
        })
        .collect()
}

fn write_cache(path: &Path, cache: &BTreeMap<String, ShoppingCategory>) -> Result<(), MenuError> {
    let json = serde_json::to_string_pretty(cache)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FixedOracle {
        answer: Result<Option<ShoppingCategory>, MenuError>,
        calls: Rc<Cell<u32>>,
    }

    impl CategoryOracle for FixedOracle {
        fn suggest(&self, _ingredient: &str) -> Result<Option<ShoppingCategory>, MenuError> {
            self.calls.set(self.calls.get() + 1);
            self.answer.clone()
        }
    }

    fn with_answer(answer: Result<Option<ShoppingCategory>, MenuError>) -> (IngredientClassifier, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let oracle = FixedOracle {
            answer,
            calls: Rc::clone(&calls),
        };
        let recovery = RecoveryConfig {
            circuit_breaker_threshold: 2,
            circuit_breaker_reset_secs: 300,
        };
        let classifier = IngredientClassifier::in_memory().with_oracle(Box::new(oracle), recovery);
        (classifier, calls)
    }

    #[test]
    fn test_base_then_cache() {
        let mut classifier = IngredientClassifier::in_memory();
        assert_eq!(
            classifier.classify("Pollo"),
            (ShoppingCategory::MeatAndFish, ClassificationSource::Base)
        );
        assert_eq!(
            classifier.classify("  pollo "),
            (ShoppingCategory::MeatAndFish, ClassificationSource::Cache)
        );
        let stats = classifier.stats();
        assert_eq!(stats.base_hits, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.cache_size, 1);
    }

    #[test]
    fn test_heuristic_and_unknown_without_oracle() {
        let mut classifier = IngredientClassifier::in_memory();
        assert_eq!(
            classifier.classify("Curcuma in polvere"),
            (ShoppingCategory::Pantry, ClassificationSource::Heuristic)
        );
        assert_eq!(
            classifier.classify("Edamame"),
            (ShoppingCategory::Other, ClassificationSource::Unknown)
        );
        assert_eq!(
            classifier.classify("edamame"),
            (ShoppingCategory::Other, ClassificationSource::Cache)
        );
    }

    #[test]
    fn test_oracle_answer_is_used_and_cached() {
        let (mut classifier, calls) = with_answer(Ok(Some(ShoppingCategory::Frozen)));
        assert_eq!(
            classifier.classify("Edamame"),
            (ShoppingCategory::Frozen, ClassificationSource::Ai)
        );
        assert_eq!(classifier.classify("Edamame").1, ClassificationSource::Cache);
        assert_eq!(calls.get(), 1);
        assert_eq!(classifier.stats().ai_queries, 1);
    }

    #[test]
    fn test_oracle_other_falls_through() {
        let (mut classifier, _) = with_answer(Ok(Some(ShoppingCategory::Other)));
        assert_eq!(
            classifier.classify("Radicchio trevigiano"),
            (ShoppingCategory::Produce, ClassificationSource::Heuristic)
        );
    }

    #[test]
    fn test_failing_oracle_trips_breaker() {
        let (mut classifier, calls) =
            with_answer(Err(MenuError::UpstreamUnavailable("timeout".to_string())));
        for name in ["edamame", "tempeh", "seitan", "natto"] {
            assert_eq!(classifier.classify(name).0, ShoppingCategory::Other);
        }
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_empty_name_not_cached() {
        let mut classifier = IngredientClassifier::in_memory();
        assert_eq!(
            classifier.classify("   "),
            (ShoppingCategory::Other, ClassificationSource::Unknown)
        );
        assert_eq!(classifier.stats().cache_size, 0);
    }

    #[test]
    fn test_classify_all_keeps_original_names() {
        let mut classifier = IngredientClassifier::in_memory();
        let result = classifier.classify_all(["Pasta", "Latte"]);
        assert_eq!(result["Pasta"], ShoppingCategory::Pantry);
        assert_eq!(result["Latte"], ShoppingCategory::DairyAndEggs);
    }
}
