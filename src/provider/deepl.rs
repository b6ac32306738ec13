//! DeepL REST API provider (`/v2/translate`).
//!
//! Authentication key comes from `DEEPL_AUTH_KEY`. Free-tier keys end in
//! `:fx` and use the free endpoint. Rate limits (429) and server errors are
//! retried with backoff; an exhausted quota (456) is not.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::error::{ProviderError, ProviderResult};
use super::retry::with_retries;
use super::translator::{Translator, base_language, validate_locale};

pub const DEFAULT_API_KEY_ENV: &str = "DEEPL_AUTH_KEY";

const PRO_ENDPOINT: &str = "https://api.deepl.com/v2/translate";
const FREE_ENDPOINT: &str = "https://api-free.deepl.com/v2/translate";
const TIMEOUT_SECS: u64 = 30;
const BASE_DELAY_MS: u64 = 800;
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct DeepLProvider {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

impl DeepLProvider {
    pub fn new(api_key: String) -> ProviderResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::Config("API key cannot be empty".to_string()));
        }
        let endpoint = if api_key.ends_with(":fx") {
            FREE_ENDPOINT
        } else {
            PRO_ENDPOINT
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            api_key,
            client,
            endpoint: endpoint.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    pub fn from_env(key_env: &str) -> ProviderResult<Self> {
        let api_key = std::env::var(key_env)
            .map_err(|_| ProviderError::MissingCredentials(key_env.to_string()))?;
        Self::new(api_key)
    }

    /// Total attempts per text, including the first.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_once(&self, body: &serde_json::Value) -> ProviderResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), message.trim()));
        }

        let parsed: DeepLResponse = response.json().await?;
        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| ProviderError::InvalidResponse("empty translations array".to_string()))
    }
}

#[async_trait]
impl Translator for DeepLProvider {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String> {
        validate_locale(source_lang)?;
        validate_locale(target_lang)?;

        let body = json!({
            "text": [text],
            "source_lang": source_code(source_lang),
            "target_lang": target_code(target_lang),
            "preserve_formatting": true
        });

        with_retries(
            self.provider_name(),
            self.max_retries,
            Duration::from_millis(BASE_DELAY_MS),
            || self.request_once(&body),
        )
        .await
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}

/// 456 means the account quota is used up; waiting will not help.
fn classify_status(status: u16, message: &str) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited(format!("HTTP 429: {}", message)),
        456 => ProviderError::Http {
            status,
            message: format!("quota exceeded: {}", message),
        },
        _ => ProviderError::Http {
            status,
            message: message.to_string(),
        },
    }
}

/// DeepL source languages carry no region.
fn source_code(locale: &str) -> String {
    base_language(locale).to_uppercase()
}

/// DeepL requires a regional variant for English and Portuguese targets.
fn target_code(locale: &str) -> String {
    let upper = locale.replace('_', "-").to_uppercase();
    match upper.as_str() {
        "EN" => "EN-US".to_string(),
        "PT" => "PT-PT".to_string(),
        _ => upper,
    }
}
