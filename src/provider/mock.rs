//! Deterministic, API-free translator for tests and offline runs.
//!
//! ```ignore
//! let mock = MockTranslator::new(MockMode::Prefix);
//! assert_eq!(mock.translate("Hallo", "de", "en").await?, "[en] Hallo");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::error::{ProviderError, ProviderResult};
use super::translator::Translator;

#[derive(Debug, Clone)]
pub enum MockMode {
    /// `"Hallo"` -> `"[en] Hallo"`. Keeps sentinels intact.
    Prefix,
    /// `(text, target) -> translation`; unknown pairs fall back to `Prefix`.
    Mappings(HashMap<(String, String), String>),
    /// Return the input unchanged.
    Identity,
    /// Every call fails.
    Error(String),
    /// Fail for these input texts, `Prefix` for everything else.
    FailOn(HashSet<String>),
}

#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    calls: AtomicUsize,
    log: Mutex<Vec<(String, String, String)>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_mappings<I, S>(mappings: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: Into<String>,
    {
        let map = mappings
            .into_iter()
            .map(|(text, target, out)| ((text.into(), target.into()), out.into()))
            .collect();
        Self::new(MockMode::Mappings(map))
    }

    pub fn failing_on<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MockMode::FailOn(texts.into_iter().map(Into::into).collect()))
    }

    /// Number of `translate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(text, source, target)` of every call, in call order.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn apply(&self, text: &str, target: &str) -> ProviderResult<String> {
        let prefixed = || format!("[{}] {}", target, text);
        match &self.mode {
            MockMode::Prefix => Ok(prefixed()),
            MockMode::Mappings(map) => Ok(map
                .get(&(text.to_string(), target.to_string()))
                .cloned()
                .unwrap_or_else(prefixed)),
            MockMode::Identity => Ok(text.to_string()),
            MockMode::Error(msg) => Err(ProviderError::Translation(msg.clone())),
            MockMode::FailOn(texts) if texts.contains(text) => Err(ProviderError::Translation(
                format!("mock failure for '{}'", text),
            )),
            MockMode::FailOn(_) => Ok(prefixed()),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.log.lock() {
            log.push((
                text.to_string(),
                source_lang.to_string(),
                target_lang.to_string(),
            ));
        }
        self.apply(text, target_lang)
    }

    fn provider_name(&self) -> &str {
        "Mock"
    }
}
