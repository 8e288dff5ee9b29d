//! # Groq Client Module
//!
//! External ingredient classification through Groq's OpenAI-compatible chat
//! completions endpoint. Used by the classifier as an optional oracle; every
//! failure is reported as an error and never reaches end users.

use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::classifier::CategoryOracle;
use crate::config::AiConfig;
use crate::ingredient_categories::ShoppingCategory;
use crate::menu_errors::MenuError;

const SYSTEM_PROMPT: &str = "Sei un esperto di alimenti. Classifica gli ingredienti in categorie merceologiche. Rispondi SOLO con il nome della categoria.";

/// Oracle backed by the Groq chat completions API
#[derive(Debug)]
pub struct GroqOracle {
    api_key: String,
    endpoint: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl GroqOracle {
    /// Build an oracle from configuration; `None` when no key is configured
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>, MenuError> {
        if !config.is_available() {
            return Ok(None);
        }
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Some(Self {
            api_key,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            client,
        }))
    }

    fn user_prompt(ingredient: &str) -> String {
        let options: Vec<String> = ShoppingCategory::ALL
            .iter()
            .map(|c| format!("- {}", c.label()))
            .collect();
        format!(
            "Classifica questo ingrediente in UNA di queste categorie:\n{}\n\nIngrediente: {}\n\nRispondi SOLO con il nome della categoria.",
            options.join("\n"),
            ingredient
        )
    }
}

impl CategoryOracle for GroqOracle {
    fn suggest(&self, ingredient: &str) -> Result<Option<ShoppingCategory>, MenuError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::user_prompt(ingredient),
                },
            ],
            max_tokens: 50,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(MenuError::UpstreamUnavailable(format!(
                "classifier returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: ChatResponse = response.json()?;
        let answer = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        debug!("Classifier answered '{}' for '{}'", answer.trim(), ingredient);
        Ok(ShoppingCategory::find_in(&answer))
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_oracle_without_key() {
        let config = AiConfig::default();
        assert!(GroqOracle::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_prompt_lists_every_category() {
        let prompt = GroqOracle::user_prompt("Edamame");
        for category in ShoppingCategory::ALL {
            assert!(prompt.contains(category.label()));
        }
        assert!(prompt.contains("Ingrediente: Edamame"));
    }
}
