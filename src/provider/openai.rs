//! Chat-completion provider (OpenAI-compatible `/v1/chat/completions`).
//!
//! The API key is read from `OPENAI_API_KEY` unless the config names another
//! variable. Transient failures (network, 408, 429, 5xx) are retried with
//! exponential backoff plus jitter.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::error::{ProviderError, ProviderResult};
use super::retry::with_retries;
use super::translator::{Translator, language_name, validate_locale};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const TIMEOUT_SECS: u64 = 60;
const BASE_DELAY_MS: u64 = 800;

#[derive(Debug, Clone)]
pub struct ChatCompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub endpoint: String,
}

impl Default for ChatCompletionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_retries: 3,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ChatCompletionProvider {
    api_key: String,
    client: reqwest::Client,
    options: ChatCompletionOptions,
}

impl ChatCompletionProvider {
    pub fn new(api_key: String, options: ChatCompletionOptions) -> ProviderResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::Config("API key cannot be empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            api_key,
            client,
            options,
        })
    }

    /// Build from the environment variable `key_env`.
    pub fn from_env(key_env: &str, options: ChatCompletionOptions) -> ProviderResult<Self> {
        let api_key = std::env::var(key_env)
            .map_err(|_| ProviderError::MissingCredentials(key_env.to_string()))?;
        Self::new(api_key, options)
    }

    async fn request_once(&self, body: &Value) -> ProviderResult<String> {
        let response = self
            .client
            .post(&self.options.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        // Read as text first so error bodies survive a JSON parse failure.
        let text = response.text().await?;

        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited(extract_error_message(&text)));
        }
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid JSON: {}", e)))?;
        extract_content(&json)
    }
}

#[async_trait]
impl Translator for ChatCompletionProvider {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String> {
        validate_locale(source_lang)?;
        validate_locale(target_lang)?;

        let body = json!({
            "model": self.options.model,
            "temperature": self.options.temperature,
            "messages": [
                { "role": "system", "content": system_prompt(source_lang, target_lang) },
                { "role": "user", "content": text }
            ]
        });

        with_retries(
            self.provider_name(),
            self.options.max_retries,
            Duration::from_millis(BASE_DELAY_MS),
            || self.request_once(&body),
        )
        .await
    }

    fn provider_name(&self) -> &str {
        "OpenAI chat completion"
    }
}

fn system_prompt(source_lang: &str, target_lang: &str) -> String {
    format!(
        "You are a professional UI/localization translator. \
         Translate the user's text from {} to {} for a software user interface.\n\
         - Keep tokens of the form @@TOKEN_n@@ and @@TERM_n@@ exactly as they are.\n\
         - Keep placeholders such as {{{{amount}}}} and HTML tags unchanged.\n\
         - Keep emoji and symbols.\n\
         - Preserve punctuation and capitalization style.\n\
         - Return ONLY the translated text, no quotes, no explanations.",
        language_name(source_lang),
        language_name(target_lang)
    )
}

fn extract_content(json: &Value) -> ProviderResult<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| strip_wrapping_quotes(s.trim()).to_string())
        .ok_or_else(|| {
            ProviderError::InvalidResponse("missing choices[0].message.content".to_string())
        })
}

/// Models sometimes wrap the whole answer in quotes despite being told not to.
fn strip_wrapping_quotes(text: &str) -> &str {
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\u{201C}') && text.ends_with('\u{201D}')));
    if quoted {
        let first = text.chars().next().map(char::len_utf8).unwrap_or(0);
        let last = text.chars().next_back().map(char::len_utf8).unwrap_or(0);
        if first + last <= text.len() {
            return &text[first..text.len() - last];
        }
    }
    text
}

/// Pull a human-readable message out of an error body.
fn extract_error_message(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    match trimmed.char_indices().nth(400) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
