//! The translation capability consumed by the sync engine.
//!
//! Backends implement [`Translator`]; the engine only ever sees
//! `Arc<dyn Translator>`, so a provider is constructed once and passed in.

use async_trait::async_trait;

use super::error::{ProviderError, ProviderResult};

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate one string from `source_lang` to `target_lang`.
    ///
    /// Language arguments are locale codes as they appear in file names
    /// (`de`, `en`, `pt-BR`).
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String>;

    /// Name used in logs and reports.
    fn provider_name(&self) -> &str;
}

/// Strip region and script: `pt-BR` -> `pt`, `zh_Hans` -> `zh`.
pub fn base_language(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_lowercase()
}

pub fn validate_locale(locale: &str) -> ProviderResult<()> {
    if locale.is_empty() {
        return Err(ProviderError::Config("locale code is empty".to_string()));
    }
    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ProviderError::Config(format!(
            "invalid characters in locale code: {}",
            locale
        )));
    }
    Ok(())
}

/// English name of a locale, for prompts. Unknown codes are returned as-is.
pub fn language_name(locale: &str) -> String {
    let name = match base_language(locale).as_str() {
        "ar" => "Arabic",
        "bg" => "Bulgarian",
        "cs" => "Czech",
        "da" => "Danish",
        "de" => "German",
        "el" => "Greek",
        "en" => "English",
        "es" => "Spanish",
        "et" => "Estonian",
        "fi" => "Finnish",
        "fr" => "French",
        "hr" => "Croatian",
        "hu" => "Hungarian",
        "id" => "Indonesian",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "lt" => "Lithuanian",
        "lv" => "Latvian",
        "nb" | "no" => "Norwegian",
        "nl" => "Dutch",
        "pl" => "Polish",
        "pt" => "Portuguese",
        "ro" => "Romanian",
        "ru" => "Russian",
        "sk" => "Slovak",
        "sl" => "Slovenian",
        "sv" => "Swedish",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "zh" => "Chinese",
        _ => return locale.to_string(),
    };
    name.to_string()
}
