//! Chat-completion translator client

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::repair;
use crate::converter::eztr::LINE_LENGTH;
use crate::error::{Error, Result};

/// Built-in system instruction. `{lineLength}` is substituted at
/// construction; callers normally replace the whole thing with their own
/// instruction file.
const DEFAULT_INSTRUCTIONS: &str = "You are translating short fragments of video game \
    dialogue. The user message is a JSON array of strings. Respond with ONLY a JSON array \
    of the translated strings, in the same order and with the same number of entries. \
    Keep each string under {lineLength} characters when possible. Leave the phrase \
    'this button' untranslated.";

/// Odds of attaching a randomly-sampled supplementary instruction.
const DEFAULT_RANDOM_CHANCE: f64 = 0.15;

/// Translation backend configuration.
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Chat-completion endpoint.
    pub endpoint: String,
    /// Model name sent with each request.
    pub model: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// System instruction; `{lineLength}` expands to the display line limit.
    pub instructions: String,
    /// Pool of supplementary instructions, one occasionally sampled per
    /// request to vary the output.
    pub random_instructions: Vec<String>,
    /// Probability of attaching a supplementary instruction.
    pub random_instruction_chance: f64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/chat".to_string(),
            model: "mistral:instruct".to_string(),
            timeout: Duration::from_secs(20),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            random_instructions: Vec::new(),
            random_instruction_chance: DEFAULT_RANDOM_CHANCE,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatOptions {
    num_predict: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    stream: bool,
    messages: &'a [ChatMessage],
    options: ChatOptions,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Blocking client for the translation backend.
pub struct Translator {
    config: TranslatorConfig,
    instructions: String,
    client: reqwest::blocking::Client,
}

impl Translator {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns [`Error::TranslationUnavailable`] if the HTTP client cannot
    /// be constructed.
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::TranslationUnavailable {
                reason: format!("building HTTP client: {e}"),
            })?;
        let instructions = config
            .instructions
            .replace("{lineLength}", &LINE_LENGTH.to_string());
        Ok(Self {
            config,
            instructions,
            client,
        })
    }

    fn sample_random_instruction(&self) -> Option<&str> {
        if self.config.random_instructions.is_empty() {
            return None;
        }
        let mut rng = rand::thread_rng();
        if rng.r#gen::<f64>() >= self.config.random_instruction_chance {
            return None;
        }
        let idx = rng.gen_range(0..self.config.random_instructions.len());
        Some(&self.config.random_instructions[idx])
    }

    /// Translate an ordered list of fragments, returning exactly as many
    /// fragments back.
    ///
    /// `failed_attempts` is the number of previous attempts that produced
    /// unusable syntax; when nonzero the model is warned about it.
    ///
    /// # Errors
    /// Returns [`Error::TranslationUnavailable`] on network failure,
    /// timeout, or an unparseable response. Length mismatches are repaired,
    /// not reported as errors.
    pub fn translate(&self, fragments: &[String], failed_attempts: u32) -> Result<Vec<String>> {
        let payload = serde_json::to_string(fragments)?;

        let mut messages = vec![ChatMessage {
            role: "system",
            content: self.instructions.clone(),
        }];

        if let Some(extra) = self.sample_random_instruction() {
            messages.push(ChatMessage {
                role: "system",
                content: extra.to_string(),
            });
        }

        if failed_attempts > 0 {
            messages.push(ChatMessage {
                role: "system",
                content: format!(
                    "You have failed to give proper syntax {failed_attempts} times. \
                     Be extra careful."
                ),
            });
        }

        messages.push(ChatMessage {
            role: "user",
            content: payload.clone(),
        });

        let request = ChatRequest {
            model: &self.config.model,
            max_tokens: (payload.len() + 20).max(64),
            stream: false,
            messages: &messages,
            options: ChatOptions {
                num_predict: payload.len(),
            },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .map_err(|e| Error::TranslationUnavailable {
                reason: format!("request failed: {e}"),
            })?;

        let body: ChatResponse = response.json().map_err(|e| Error::TranslationUnavailable {
            reason: format!("malformed response body: {e}"),
        })?;

        tracing::debug!(
            fragments = fragments.len(),
            response_len = body.message.content.len(),
            "translator response received"
        );

        repair::parse_fragments(&body.message.content, fragments.len())
    }
}
