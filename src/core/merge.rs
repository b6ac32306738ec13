//! Structure-preserving merge of an upstream tree into a target tree.
//!
//! Merging runs in two steps. [`plan_merge`] walks the upstream tree
//! synchronously, mirrors its shape into a clone of the target, applies
//! verbatim copies and collects the leaves that need a provider call.
//! [`MergeEngine::execute`] then runs those translation jobs and writes the
//! results back with [`LocaleTree::set_at`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::task::JoinSet;

use super::detect::ChangeSet;
use super::protect::{TextProtector, missing_special_chars};
use super::tree::{LocaleTree, TreeError, join_path};
use crate::provider::{ProviderError, Translator};

#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Leaves whose path ends with one of these are copied, never translated.
    pub never_translate_suffixes: Vec<String>,
    /// Remove target keys that no longer exist upstream.
    pub prune: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            never_translate_suffixes: vec!["_original".to_string()],
            prune: false,
        }
    }
}

impl MergeOptions {
    pub fn is_never_translate(&self, path: &str) -> bool {
        self.never_translate_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && path.ends_with(suffix.as_str()))
    }
}

/// One leaf waiting for the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    pub path: String,
    /// Key segments as walked; keys may themselves contain dots.
    pub keys: Vec<String>,
    pub text: String,
}

/// Result of the synchronous walk.
#[derive(Debug, Clone, Default)]
pub struct MergePlan {
    /// Target clone with copies, shape fixes and pruning already applied.
    pub tree: LocaleTree,
    pub jobs: Vec<TranslationJob>,
    pub copied: Vec<String>,
    pub preserved: Vec<String>,
    pub shape_conflicts: Vec<String>,
    pub pruned: Vec<String>,
}

impl MergePlan {
    /// Whether executing the plan would change the target.
    pub fn has_pending_work(&self) -> bool {
        !self.jobs.is_empty()
            || !self.copied.is_empty()
            || !self.shape_conflicts.is_empty()
            || !self.pruned.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub tree: LocaleTree,
    pub translated: Vec<String>,
    pub copied: Vec<String>,
    /// Leaves written with the upstream value because the translation
    /// dropped special characters.
    pub fallbacks: Vec<String>,
    /// `(path, reason)`; the target keeps its previous value.
    pub failed: Vec<(String, String)>,
    pub preserved: Vec<String>,
    pub shape_conflicts: Vec<String>,
    pub pruned: Vec<String>,
}

impl MergeOutcome {
    pub fn is_failed(&self, path: &str) -> bool {
        self.failed.iter().any(|(p, _)| p == path)
    }
}

/// Why a single leaf could not be translated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeafError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("translation lost protected tokens: {0}")]
    TokensLost(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("translation task aborted")]
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LeafResult {
    Translated(String),
    Fallback(String),
}

/// Walk `upstream` against `target` and decide what happens to every leaf.
pub fn plan_merge(
    upstream: &LocaleTree,
    target: &LocaleTree,
    changes: &ChangeSet,
    options: &MergeOptions,
) -> MergePlan {
    let mut plan = MergePlan {
        tree: target.clone(),
        ..MergePlan::default()
    };
    let mut tree = std::mem::take(&mut plan.tree);
    walk(upstream.as_map(), tree.as_map_mut(), &[], changes, options, &mut plan);
    if options.prune {
        prune_orphans(upstream.as_map(), tree.as_map_mut(), "", &mut plan.pruned);
    }
    plan.tree = tree;
    plan
}

fn walk(
    upstream: &Map<String, Value>,
    target: &mut Map<String, Value>,
    parents: &[String],
    changes: &ChangeSet,
    options: &MergeOptions,
    plan: &mut MergePlan,
) {
    for (key, value) in upstream {
        let keys = [parents, std::slice::from_ref(key)].concat();
        let path = keys.join(".");

        if let Value::Object(child) = value {
            let entry = target
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                tracing::warn!(path = %path, "target leaf replaced by upstream mapping");
                plan.shape_conflicts.push(path.clone());
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(target_child) = entry {
                walk(child, target_child, &keys, changes, options, plan);
            }
            continue;
        }

        let existing = target.get(key);
        let missing = existing.is_none();
        let shape_conflict = matches!(existing, Some(Value::Object(_)));
        let forced = changes.is_forced(&path);

        if options.is_never_translate(&path) {
            if missing || shape_conflict || forced {
                if shape_conflict {
                    plan.shape_conflicts.push(path.clone());
                }
                target.insert(key.clone(), value.clone());
                plan.copied.push(path);
            } else {
                plan.preserved.push(path);
            }
            continue;
        }

        if missing || shape_conflict || changes.needs_translation(&path) {
            if shape_conflict {
                plan.shape_conflicts.push(path.clone());
            }
            match value {
                Value::String(text) if !text.trim().is_empty() => {
                    plan.jobs.push(TranslationJob {
                        path,
                        keys,
                        text: text.clone(),
                    });
                }
                _ => {
                    target.insert(key.clone(), value.clone());
                    plan.copied.push(path);
                }
            }
        } else {
            plan.preserved.push(path);
        }
    }
}

/// Remove target keys that have no counterpart upstream.
pub fn prune_orphans(
    upstream: &Map<String, Value>,
    target: &mut Map<String, Value>,
    prefix: &str,
    pruned: &mut Vec<String>,
) {
    let orphans: Vec<String> = target
        .keys()
        .filter(|key| !upstream.contains_key(*key))
        .cloned()
        .collect();
    for key in orphans {
        target.shift_remove(&key);
        pruned.push(join_path(prefix, &key));
    }

    for (key, value) in target.iter_mut() {
        if let (Some(Value::Object(up_child)), Value::Object(child)) = (upstream.get(key), value) {
            prune_orphans(up_child, child, &join_path(prefix, key), pruned);
        }
    }
}

/// Runs translation jobs against a provider.
#[derive(Clone)]
pub struct MergeEngine {
    translator: Arc<dyn Translator>,
    protector: Arc<TextProtector>,
    concurrency: usize,
}

impl MergeEngine {
    pub fn new(translator: Arc<dyn Translator>, protector: Arc<TextProtector>) -> Self {
        Self {
            translator,
            protector,
            concurrency: 1,
        }
    }

    /// Maximum number of provider calls in flight within one leg.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Plan and execute in one go.
    pub async fn merge(
        &self,
        upstream: &LocaleTree,
        target: &LocaleTree,
        changes: &ChangeSet,
        options: &MergeOptions,
        source_lang: &str,
        target_lang: &str,
    ) -> MergeOutcome {
        let plan = plan_merge(upstream, target, changes, options);
        self.execute(plan, source_lang, target_lang).await
    }

    pub async fn execute(&self, plan: MergePlan, source_lang: &str, target_lang: &str) -> MergeOutcome {
        let MergePlan {
            tree,
            jobs,
            copied,
            preserved,
            shape_conflicts,
            pruned,
        } = plan;

        let mut outcome = MergeOutcome {
            tree,
            copied,
            preserved,
            shape_conflicts,
            pruned,
            ..MergeOutcome::default()
        };

        let results = if self.concurrency <= 1 || jobs.len() <= 1 {
            self.run_sequential(&jobs, source_lang, target_lang).await
        } else {
            self.run_concurrent(&jobs, source_lang, target_lang).await
        };

        // Applied in job order so the outcome does not depend on scheduling.
        for (job, result) in jobs.into_iter().zip(results) {
            let applied = result.and_then(|leaf| {
                let (value, fallback) = match leaf {
                    LeafResult::Translated(text) => (text, false),
                    LeafResult::Fallback(text) => (text, true),
                };
                outcome.tree.set_at(&job.keys, Value::String(value))?;
                Ok(fallback)
            });
            match applied {
                Ok(false) => {
                    tracing::debug!(path = %job.path, lang = target_lang, "translated");
                    outcome.translated.push(job.path);
                }
                Ok(true) => {
                    tracing::debug!(path = %job.path, lang = target_lang, "special characters lost, kept upstream value");
                    outcome.fallbacks.push(job.path);
                }
                Err(err) => {
                    tracing::warn!(path = %job.path, lang = target_lang, error = %err, "leaf translation failed");
                    outcome.failed.push((job.path, err.to_string()));
                }
            }
        }

        outcome
    }

    async fn run_sequential(
        &self,
        jobs: &[TranslationJob],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<Result<LeafResult, LeafError>> {
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            results.push(
                translate_leaf(
                    self.translator.as_ref(),
                    &self.protector,
                    &job.text,
                    source_lang,
                    target_lang,
                )
                .await,
            );
        }
        results
    }

    async fn run_concurrent(
        &self,
        jobs: &[TranslationJob],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<Result<LeafResult, LeafError>> {
        let mut slots: BTreeMap<usize, Result<LeafResult, LeafError>> = BTreeMap::new();
        let mut set = JoinSet::new();

        for (index, job) in jobs.iter().enumerate() {
            if set.len() >= self.concurrency
                && let Some(Ok((done, result))) = set.join_next().await
            {
                slots.insert(done, result);
            }
            let translator = Arc::clone(&self.translator);
            let protector = Arc::clone(&self.protector);
            let text = job.text.clone();
            let source = source_lang.to_string();
            let target = target_lang.to_string();
            set.spawn(async move {
                let result =
                    translate_leaf(translator.as_ref(), &protector, &text, &source, &target).await;
                (index, result)
            });
        }
        while let Some(joined) = set.join_next().await {
            if let Ok((done, result)) = joined {
                slots.insert(done, result);
            }
        }

        (0..jobs.len())
            .map(|index| slots.remove(&index).unwrap_or(Err(LeafError::Aborted)))
            .collect()
    }
}

/// protect -> translate -> token check -> restore -> special-char check.
async fn translate_leaf(
    translator: &dyn Translator,
    protector: &TextProtector,
    text: &str,
    source_lang: &str,
    target_lang: &str,
) -> Result<LeafResult, LeafError> {
    let protected = protector.protect(text);
    let raw = translator
        .translate(&protected.text, source_lang, target_lang)
        .await?;

    let lost = protected.missing_sentinels(&raw);
    if !lost.is_empty() {
        return Err(LeafError::TokensLost(lost.join(", ")));
    }

    let restored = protected.restore(&raw);
    if !missing_special_chars(text, &restored).is_empty() {
        return Ok(LeafResult::Fallback(text.to_string()));
    }
    Ok(LeafResult::Translated(restored))
}
