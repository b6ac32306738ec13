use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::error::ProviderResult;
use super::translator::Translator;

type CacheKey = (String, String, String);

/// Memoizes successful translations for the lifetime of one run, so the same
/// upstream text is sent to the backend once per language pair.
pub struct CachingTranslator {
    inner: Arc<dyn Translator>,
    cache: Mutex<HashMap<CacheKey, String>>,
}

impl CachingTranslator {
    pub fn new(inner: Arc<dyn Translator>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Translator for CachingTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String> {
        let key = (
            text.to_string(),
            source_lang.to_string(),
            target_lang.to_string(),
        );
        let hit = self.cache.lock().ok().and_then(|c| c.get(&key).cloned());
        if let Some(hit) = hit {
            return Ok(hit);
        }

        let translated = self.inner.translate(text, source_lang, target_lang).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, translated.clone());
        }
        Ok(translated)
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}
