//! Translation providers.
//!
//! - `translator`: the [`Translator`] trait and locale helpers
//! - `openai`: chat-completion backend
//! - `deepl`: DeepL REST backend
//! - `mock`: deterministic offline backend
//! - `cache`: per-run memoization wrapper
//! - `retry`: backoff loop for the HTTP backends

pub mod cache;
pub mod deepl;
pub mod error;
pub mod mock;
pub mod openai;
pub mod retry;
pub mod translator;

use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use cache::CachingTranslator;
pub use deepl::DeepLProvider;
pub use error::{ProviderError, ProviderResult};
pub use mock::{MockMode, MockTranslator};
pub use openai::{ChatCompletionOptions, ChatCompletionProvider};
pub use translator::Translator;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Openai,
    Deepl,
    Mock,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Openai => write!(f, "openai"),
            ProviderKind::Deepl => write!(f, "deepl"),
            ProviderKind::Mock => write!(f, "mock"),
        }
    }
}

/// Construct the configured provider, reading credentials from the
/// environment. Fails before any file is touched when credentials are missing.
pub fn build_provider(kind: ProviderKind, config: &Config) -> ProviderResult<Arc<dyn Translator>> {
    let provider: Arc<dyn Translator> = match kind {
        ProviderKind::Openai => {
            let key_env = config
                .api_key_env
                .as_deref()
                .unwrap_or(openai::DEFAULT_API_KEY_ENV);
            let options = ChatCompletionOptions {
                model: config.model.clone(),
                temperature: config.temperature,
                max_retries: config.max_retries,
                endpoint: config.chat_endpoint(),
            };
            Arc::new(ChatCompletionProvider::from_env(key_env, options)?)
        }
        ProviderKind::Deepl => {
            let key_env = config
                .api_key_env
                .as_deref()
                .unwrap_or(deepl::DEFAULT_API_KEY_ENV);
            Arc::new(DeepLProvider::from_env(key_env)?.max_retries(config.max_retries))
        }
        ProviderKind::Mock => Arc::new(MockTranslator::new(MockMode::Prefix)),
    };
    Ok(Arc::new(CachingTranslator::new(provider)))
}
