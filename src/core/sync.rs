//! Pivot orchestration.
//!
//! Phase A translates the source language into the pivot language. Phase B
//! translates the updated pivot into every other target. Each leg is
//! incremental on its own: change detection, merge, then tree and manifest
//! are persisted. A failing Phase B target never stops the others.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use super::detect::{Baseline, ChangeSet, ForceRequest, detect};
use super::hash::HashOptions;
use super::locale_files::LocaleStore;
use super::manifest::{ManifestStore, update_manifest};
use super::merge::{MergeEngine, MergeOptions, MergeOutcome, MergePlan, plan_merge};
use super::protect::TextProtector;
use super::snapshot::SnapshotStore;
use super::tree::LocaleTree;
use crate::config::{ChangeDetection, Config};
use crate::issues::{
    Issue, LeafFailedIssue, PrunedKeyIssue, ShapeConflictIssue, SpecialCharFallbackIssue,
    TargetFailedIssue, TargetSkippedIssue, UnknownForcedPathIssue,
};
use crate::provider::Translator;

/// Per-run switches, usually from the command line.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub force: ForceRequest,
    /// Compute everything, call no provider, write nothing.
    pub dry_run: bool,
    /// Overrides `prune` from the config when set.
    pub prune: Option<bool>,
    /// Restrict Phase B to these languages. The pivot leg always runs.
    pub locales: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegStatus {
    Synced,
    /// Dry run: `pending` holds the work that would be done.
    Planned,
    Failed(String),
    Skipped,
}

/// Counts for one leg (upstream -> lang).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSummary {
    pub lang: String,
    pub upstream: String,
    pub status: LegStatus,
    pub translated: usize,
    pub copied: usize,
    pub preserved: usize,
    pub forced: usize,
    pub failed: usize,
    pub fallbacks: usize,
    pub pruned: usize,
    /// Provider calls a dry run would make.
    pub pending: usize,
}

impl LanguageSummary {
    fn new(lang: &str, upstream: &str, status: LegStatus) -> Self {
        Self {
            lang: lang.to_string(),
            upstream: upstream.to_string(),
            status,
            translated: 0,
            copied: 0,
            preserved: 0,
            forced: 0,
            failed: 0,
            fallbacks: 0,
            pruned: 0,
            pending: 0,
        }
    }

    /// Whether this leg left (or would leave) work undone.
    pub fn has_pending_work(&self) -> bool {
        self.pending > 0 || self.failed > 0 || !matches!(self.status, LegStatus::Synced | LegStatus::Planned)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub languages: Vec<LanguageSummary>,
    pub issues: Vec<Issue>,
    pub dry_run: bool,
    pub provider: Option<String>,
}

impl SyncReport {
    pub fn summary(&self, lang: &str) -> Option<&LanguageSummary> {
        self.languages.iter().find(|s| s.lang == lang)
    }

    /// Leaf or language failures.
    pub fn has_failures(&self) -> bool {
        self.languages
            .iter()
            .any(|s| s.failed > 0 || matches!(s.status, LegStatus::Failed(_) | LegStatus::Skipped))
    }

    /// Total pending items across languages (dry run).
    pub fn pending_count(&self) -> usize {
        self.languages.iter().map(|s| s.pending).sum()
    }

    pub fn total_translated(&self) -> usize {
        self.languages.iter().map(|s| s.translated).sum()
    }
}

/// One upstream -> target pass.
struct Leg<'a> {
    upstream_lang: &'a str,
    upstream: &'a LocaleTree,
    /// Upstream as it was at the previous run, when snapshot diffing applies.
    previous_upstream: Option<&'a LocaleTree>,
    target_lang: &'a str,
}

pub struct Synchronizer {
    config: Config,
    locales: LocaleStore,
    manifests: ManifestStore,
    snapshots: SnapshotStore,
    protector: Arc<TextProtector>,
}

impl Synchronizer {
    /// Resolve every path relative to `root`. Fails on invalid configuration
    /// before anything is read.
    pub fn new(root: &Path, config: Config) -> Result<Self> {
        config.validate()?;
        let protector = TextProtector::new(&config.protect_patterns, config.mask_parenthetical_terms)?;
        let locales = LocaleStore::new(config.locales_dir(root), config.layout)
            .sort_keys(config.sort_keys);
        let manifests = ManifestStore::new(config.manifest_dir(root));
        let snapshots = SnapshotStore::new(config.snapshot_path(root));
        Ok(Self {
            config,
            locales,
            manifests,
            snapshots,
            protector: Arc::new(protector),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Phase B languages: configured or discovered, minus source and pivot,
    /// filtered by `only` when non-empty.
    pub fn target_languages(&self, only: &[String]) -> Result<Vec<String>> {
        let candidates = if self.config.target_locales.is_empty() {
            self.locales.discover_locales()?
        } else {
            self.config.target_locales.clone()
        };
        let mut targets: Vec<String> = Vec::new();
        for lang in candidates {
            if lang == self.config.source_locale
                || lang == self.config.pivot_locale
                || targets.contains(&lang)
            {
                continue;
            }
            if only.is_empty() || only.contains(&lang) {
                targets.push(lang);
            }
        }
        Ok(targets)
    }

    /// Run both phases. `translator` is only called for leaves that need it.
    pub async fn run(&self, translator: Arc<dyn Translator>, options: &SyncOptions) -> Result<SyncReport> {
        let engine = MergeEngine::new(translator.clone(), self.protector.clone())
            .concurrency(self.config.concurrency);
        let mut report = SyncReport {
            dry_run: options.dry_run,
            provider: Some(translator.provider_name().to_string()),
            ..SyncReport::default()
        };
        self.run_phases(Some(&engine), options, &mut report).await?;
        Ok(report)
    }

    /// Dry run: detect and plan every leg without a provider.
    pub async fn plan(&self, options: &SyncOptions) -> Result<SyncReport> {
        let options = SyncOptions {
            dry_run: true,
            ..options.clone()
        };
        let mut report = SyncReport {
            dry_run: true,
            ..SyncReport::default()
        };
        self.run_phases(None, &options, &mut report).await?;
        Ok(report)
    }

    async fn run_phases(
        &self,
        engine: Option<&MergeEngine>,
        options: &SyncOptions,
        report: &mut SyncReport,
    ) -> Result<()> {
        let source_lang = self.config.source_locale.as_str();
        let pivot_lang = self.config.pivot_locale.as_str();
        let dry_run = options.dry_run || engine.is_none();

        if !self.locales.exists(source_lang) {
            bail!(
                "Source locale '{}' not found in {}",
                source_lang,
                self.locales.root().display()
            );
        }
        let source = self
            .locales
            .read(source_lang)
            .with_context(|| format!("Failed to read source locale '{}'", source_lang))?;
        let locales = self
            .locales
            .clone()
            .with_namespaces_of(source_lang)?;
        let targets = self.target_languages(&options.locales)?;
        let snapshot = self.load_snapshot();

        tracing::info!(
            source = source_lang,
            pivot = pivot_lang,
            targets = ?targets,
            dry_run,
            "starting sync"
        );

        // Phase A
        let pivot_before = locales.read(pivot_lang).ok();
        let phase_a = self
            .run_leg(
                &locales,
                engine,
                Leg {
                    upstream_lang: source_lang,
                    upstream: &source,
                    previous_upstream: snapshot.as_ref(),
                    target_lang: pivot_lang,
                },
                options,
                dry_run,
                report,
            )
            .await;

        let pivot_after = match phase_a {
            Ok(tree) => tree,
            Err(err) => {
                let reason = format!("{:#}", err);
                tracing::warn!(lang = pivot_lang, error = %reason, "pivot leg failed");
                report
                    .languages
                    .push(LanguageSummary::new(pivot_lang, source_lang, LegStatus::Failed(reason.clone())));
                report.issues.push(
                    TargetFailedIssue {
                        lang: pivot_lang.to_string(),
                        reason,
                    }
                    .into(),
                );
                for lang in &targets {
                    report
                        .languages
                        .push(LanguageSummary::new(lang, pivot_lang, LegStatus::Skipped));
                    report.issues.push(
                        TargetSkippedIssue {
                            lang: lang.clone(),
                            pivot: pivot_lang.to_string(),
                        }
                        .into(),
                    );
                }
                return Ok(());
            }
        };

        // Phase B. Snapshot diffing compares the pivot before and after Phase A.
        let previous_pivot = if dry_run || snapshot.is_none() {
            None
        } else {
            pivot_before.as_ref()
        };
        for lang in &targets {
            let leg = Leg {
                upstream_lang: pivot_lang,
                upstream: &pivot_after,
                previous_upstream: previous_pivot,
                target_lang: lang,
            };
            if let Err(err) = self
                .run_leg(&locales, engine, leg, options, dry_run, report)
                .await
            {
                let reason = format!("{:#}", err);
                tracing::warn!(lang = %lang, error = %reason, "target leg failed");
                report
                    .languages
                    .push(LanguageSummary::new(lang, pivot_lang, LegStatus::Failed(reason.clone())));
                report.issues.push(
                    TargetFailedIssue {
                        lang: lang.clone(),
                        reason,
                    }
                    .into(),
                );
            }
        }

        if !dry_run {
            self.snapshots.save(&source)?;
        }
        Ok(())
    }

    /// Run one leg and return the target tree as it stands afterwards.
    async fn run_leg(
        &self,
        locales: &LocaleStore,
        engine: Option<&MergeEngine>,
        leg: Leg<'_>,
        options: &SyncOptions,
        dry_run: bool,
        report: &mut SyncReport,
    ) -> Result<LocaleTree> {
        let target_existed = locales.exists(leg.target_lang);
        let target = locales
            .read(leg.target_lang)
            .with_context(|| format!("Failed to read locale '{}'", leg.target_lang))?;
        let manifest_existed = self.manifests.exists(leg.target_lang, leg.upstream_lang);
        let manifest = self.manifests.load(leg.target_lang, leg.upstream_lang)?;

        let previous_flat = leg.previous_upstream.map(LocaleTree::flatten);
        let baseline = match (&previous_flat, self.config.change_detection) {
            (Some(previous), ChangeDetection::Snapshot) => Baseline::Snapshot {
                previous,
                manifest: manifest_existed.then_some(&manifest),
            },
            (Some(previous), ChangeDetection::Manifest) if !manifest_existed => {
                Baseline::Snapshot {
                    previous,
                    manifest: None,
                }
            }
            _ => Baseline::Manifest(&manifest),
        };

        let changes = detect(leg.upstream, baseline, &options.force, self.hash_options());
        if leg.upstream_lang == self.config.source_locale {
            for path in &changes.unknown_forced {
                tracing::warn!(path = %path, "forced path matches nothing");
                report.issues.push(UnknownForcedPathIssue { path: path.clone() }.into());
            }
        }

        let plan = plan_merge(leg.upstream, &target, &changes, &self.merge_options(options));
        tracing::info!(
            lang = leg.target_lang,
            upstream = leg.upstream_lang,
            changed = changes.changed.len(),
            forced = changes.forced.len(),
            jobs = plan.jobs.len(),
            "leg planned"
        );

        let engine = match engine {
            Some(engine) if !dry_run => engine,
            _ => {
                report.languages.push(planned_summary(&leg, &plan, &changes));
                return Ok(target);
            }
        };

        let has_pending_work = plan.has_pending_work();
        let outcome = engine
            .execute(plan, leg.upstream_lang, leg.target_lang)
            .await;

        if has_pending_work || !target_existed {
            locales
                .write(leg.target_lang, &outcome.tree)
                .with_context(|| format!("Failed to write locale '{}'", leg.target_lang))?;
        }

        let mut updated = manifest.clone();
        update_manifest(
            &mut updated,
            changes.hashes.keys().filter(|path| !outcome.is_failed(path)),
            &changes.hashes,
        );
        if updated != manifest || !manifest_existed {
            self.manifests
                .save(leg.target_lang, leg.upstream_lang, &updated)?;
        }

        collect_issues(leg.target_lang, &outcome, report);
        report.languages.push(synced_summary(&leg, &outcome, &changes));
        tracing::info!(
            lang = leg.target_lang,
            translated = outcome.translated.len(),
            failed = outcome.failed.len(),
            "leg finished"
        );
        Ok(outcome.tree)
    }

    fn load_snapshot(&self) -> Option<LocaleTree> {
        match self.snapshots.load() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %format!("{:#}", err), "ignoring unreadable snapshot");
                None
            }
        }
    }

    fn hash_options(&self) -> HashOptions {
        HashOptions {
            ignore_cosmetic: self.config.ignore_cosmetic_changes,
        }
    }

    fn merge_options(&self, options: &SyncOptions) -> MergeOptions {
        MergeOptions {
            never_translate_suffixes: self.config.never_translate_suffixes.clone(),
            prune: options.prune.unwrap_or(self.config.prune),
        }
    }
}

fn planned_summary(leg: &Leg<'_>, plan: &MergePlan, changes: &ChangeSet) -> LanguageSummary {
    let mut summary = LanguageSummary::new(leg.target_lang, leg.upstream_lang, LegStatus::Planned);
    summary.pending = plan.jobs.len() + plan.copied.len() + plan.pruned.len();
    summary.copied = plan.copied.len();
    summary.preserved = plan.preserved.len();
    summary.forced = changes.forced.len();
    summary.pruned = plan.pruned.len();
    summary
}

fn synced_summary(leg: &Leg<'_>, outcome: &MergeOutcome, changes: &ChangeSet) -> LanguageSummary {
    let mut summary = LanguageSummary::new(leg.target_lang, leg.upstream_lang, LegStatus::Synced);
    summary.translated = outcome.translated.len();
    summary.copied = outcome.copied.len();
    summary.preserved = outcome.preserved.len();
    summary.forced = changes.forced.len();
    summary.failed = outcome.failed.len();
    summary.fallbacks = outcome.fallbacks.len();
    summary.pruned = outcome.pruned.len();
    summary
}

fn collect_issues(lang: &str, outcome: &MergeOutcome, report: &mut SyncReport) {
    for (path, reason) in &outcome.failed {
        report.issues.push(
            LeafFailedIssue {
                lang: lang.to_string(),
                path: path.clone(),
                reason: reason.clone(),
            }
            .into(),
        );
    }
    for path in &outcome.fallbacks {
        report.issues.push(
            SpecialCharFallbackIssue {
                lang: lang.to_string(),
                path: path.clone(),
            }
            .into(),
        );
    }
    for path in &outcome.shape_conflicts {
        report.issues.push(
            ShapeConflictIssue {
                lang: lang.to_string(),
                path: path.clone(),
            }
            .into(),
        );
    }
    for path in &outcome.pruned {
        report.issues.push(
            PrunedKeyIssue {
                lang: lang.to_string(),
                path: path.clone(),
            }
            .into(),
        );
    }
}
