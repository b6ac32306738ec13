use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

use locsync::config::{ChangeDetection, Config, Layout};
use locsync::core::hash::sha256_hex;
use locsync::core::{ForceRequest, LegStatus, SyncOptions, SyncReport, Synchronizer};
use locsync::issues::{Issue, Rule};
use locsync::provider::{ProviderError, ProviderResult, Translator};

/// Word-for-word translator. Words without an entry pass through, so
/// sentinels survive. Texts listed in `fail_on` error out.
#[derive(Default)]
struct Dictionary {
    words: HashMap<(String, String), String>,
    fail_on: Vec<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl Dictionary {
    fn new(entries: &[(&str, &str, &str)]) -> Self {
        Self {
            words: entries
                .iter()
                .map(|(target, from, to)| ((target.to_string(), from.to_string()), to.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    fn failing_on(mut self, text: &str) -> Self {
        self.fail_on.push(text.to_string());
        self
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_to(&self, target: &str) -> usize {
        self.calls().iter().filter(|(t, _)| t == target).count()
    }
}

#[async_trait]
impl Translator for Dictionary {
    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((target_lang.to_string(), text.to_string()));
        if self.fail_on.iter().any(|t| t == text) {
            return Err(ProviderError::Network("connection reset".to_string()));
        }
        Ok(text
            .split(' ')
            .map(|word| {
                self.words
                    .get(&(target_lang.to_string(), word.to_string()))
                    .cloned()
                    .unwrap_or_else(|| word.to_string())
            })
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn provider_name(&self) -> &str {
        "Dictionary"
    }
}

fn dictionary() -> Arc<Dictionary> {
    Arc::new(Dictionary::new(&[
        ("en", "Hallo", "Hello"),
        ("en", "Welt", "World"),
        ("en", "Tschüss", "Bye"),
        ("fr", "Hello", "Bonjour"),
        ("fr", "World", "Monde"),
        ("fr", "Bye", "Salut"),
    ]))
}

struct Project {
    _temp_dir: TempDir,
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Flat layout, de -> en, with `targets` as Phase B languages.
    fn new(source: Value, targets: &[&str]) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        let config = Config {
            locales_root: "locales".to_string(),
            layout: Layout::Flat,
            target_locales: targets.iter().map(|t| t.to_string()).collect(),
            ..Config::default()
        };
        let project = Self {
            _temp_dir: temp_dir,
            root,
            config,
        };
        project.write_locale("de", &source)?;
        Ok(project)
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join("locales").join(relative)
    }

    fn write_locale(&self, lang: &str, tree: &Value) -> Result<()> {
        self.write_raw(&format!("{}.json", lang), &serde_json::to_string_pretty(tree)?)
    }

    fn write_raw(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn read_raw(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    fn read_locale(&self, lang: &str) -> Result<Value> {
        Ok(serde_json::from_str(&self.read_raw(&format!("{}.json", lang))?)?)
    }

    fn manifest(&self, target: &str, upstream: &str) -> Result<Value> {
        let relative = format!(".i18n_manifest/{}.from-{}.json", target, upstream);
        Ok(serde_json::from_str(&self.read_raw(&relative)?)?)
    }

    async fn sync(&self, translator: Arc<Dictionary>) -> Result<SyncReport> {
        self.sync_with(translator, SyncOptions::default()).await
    }

    async fn sync_with(&self, translator: Arc<Dictionary>, options: SyncOptions) -> Result<SyncReport> {
        let synchronizer = Synchronizer::new(&self.root, self.config.clone())?;
        synchronizer.run(translator, &options).await
    }

    async fn plan(&self) -> Result<SyncReport> {
        let synchronizer = Synchronizer::new(&self.root, self.config.clone())?;
        synchronizer.plan(&SyncOptions::default()).await
    }

    fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }
}

fn rules(report: &SyncReport) -> Vec<Rule> {
    report.issues.iter().map(Issue::rule).collect()
}

fn forced(paths: &[&str]) -> SyncOptions {
    SyncOptions {
        force: ForceRequest {
            full: false,
            paths: paths.iter().map(|p| p.to_string()).collect(),
        },
        ..SyncOptions::default()
    }
}

#[tokio::test]
async fn test_first_run_translates_and_records_hashes() -> Result<()> {
    let project = Project::new(json!({"a": {"b": "Hallo {{name}}"}}), &[])?;
    let translator = dictionary();

    let report = project.sync(translator.clone()).await?;

    insta::assert_snapshot!(project.read_raw("en.json")?, @r#"
    {
      "a": {
        "b": "Hello {{name}}"
      }
    }
    "#);
    assert_eq!(
        project.manifest("en", "de")?,
        json!({"a.b": sha256_hex("Hallo {{name}}")})
    );
    assert_eq!(translator.calls_to("en"), 1);
    assert_eq!(report.summary("en").map(|s| s.translated), Some(1));
    assert!(project.exists(".i18n_snapshot/de.json"));
    Ok(())
}

#[tokio::test]
async fn test_only_changed_leaf_is_retranslated() -> Result<()> {
    let project = Project::new(json!({"a": {"b": "Hallo {{name}}", "c": "Welt"}}), &[])?;
    project.sync(dictionary()).await?;

    project.write_locale("de", &json!({"a": {"b": "Hallo {{name}}!", "c": "Welt"}}))?;
    let translator = dictionary();
    let report = project.sync(translator.clone()).await?;

    assert_eq!(translator.calls_to("en"), 1);
    assert_eq!(report.summary("en").map(|s| s.translated), Some(1));
    assert_eq!(
        project.read_locale("en")?,
        json!({"a": {"b": "Hello {{name}}!", "c": "World"}})
    );
    assert_eq!(
        project.manifest("en", "de")?["a.b"],
        json!(sha256_hex("Hallo {{name}}!"))
    );
    Ok(())
}

#[tokio::test]
async fn test_human_edit_with_current_manifest_is_kept() -> Result<()> {
    let project = Project::new(json!({"a": {"b": "Hallo {{name}}"}}), &[])?;
    project.sync(dictionary()).await?;

    project.write_locale("en", &json!({"a": {"b": "Hi there, {{name}}"}}))?;
    let translator = dictionary();
    project.sync(translator.clone()).await?;

    assert!(translator.calls().is_empty());
    assert_eq!(
        project.read_locale("en")?,
        json!({"a": {"b": "Hi there, {{name}}"}})
    );
    Ok(())
}

#[tokio::test]
async fn test_forcing_internal_node_retranslates_its_leaves() -> Result<()> {
    let project = Project::new(
        json!({"a": {"b": "Hallo", "c": "Welt"}, "d": "Tschüss"}),
        &[],
    )?;
    project.sync(dictionary()).await?;
    project.write_locale("en", &json!({"a": {"b": "x", "c": "y"}, "d": "z"}))?;

    let translator = dictionary();
    let report = project.sync_with(translator.clone(), forced(&["a"])).await?;

    assert_eq!(translator.calls_to("en"), 2);
    assert_eq!(report.summary("en").map(|s| s.forced), Some(2));
    assert_eq!(
        project.read_locale("en")?,
        json!({"a": {"b": "Hello", "c": "World"}, "d": "z"})
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_forced_path_is_reported() -> Result<()> {
    let project = Project::new(json!({"a": "Hallo"}), &[])?;
    let report = project
        .sync_with(dictionary(), forced(&["missing.path"]))
        .await?;

    assert_eq!(rules(&report), vec![Rule::UnknownForcedPath]);
    assert!(!report.has_failures());
    Ok(())
}

#[tokio::test]
async fn test_second_run_is_idempotent() -> Result<()> {
    let project = Project::new(
        json!({"nav": {"home": "Hallo Welt", "logo_original": "Acme"}}),
        &["fr"],
    )?;
    project.sync(dictionary()).await?;
    let en = project.read_raw("en.json")?;
    let fr = project.read_raw("fr.json")?;
    let manifest = project.read_raw(".i18n_manifest/fr.from-en.json")?;

    let translator = dictionary();
    let report = project.sync(translator.clone()).await?;

    assert!(translator.calls().is_empty());
    assert_eq!(report.total_translated(), 0);
    assert_eq!(project.read_raw("en.json")?, en);
    assert_eq!(project.read_raw("fr.json")?, fr);
    assert_eq!(project.read_raw(".i18n_manifest/fr.from-en.json")?, manifest);
    Ok(())
}

#[tokio::test]
async fn test_pivot_cascade_reaches_every_target() -> Result<()> {
    let project = Project::new(json!({"greeting": "Hallo Welt"}), &["fr", "it"])?;
    let translator = dictionary();

    let report = project.sync(translator.clone()).await?;

    assert_eq!(
        translator.calls(),
        vec![
            ("en".to_string(), "Hallo Welt".to_string()),
            ("fr".to_string(), "Hello World".to_string()),
            ("it".to_string(), "Hello World".to_string()),
        ]
    );
    assert_eq!(project.read_locale("fr")?, json!({"greeting": "Bonjour Monde"}));
    assert_eq!(project.read_locale("it")?, json!({"greeting": "Hello World"}));
    assert_eq!(report.summary("fr").map(|s| s.upstream.as_str()), Some("en"));
    assert!(project.exists(".i18n_manifest/it.from-en.json"));
    Ok(())
}

#[tokio::test]
async fn test_failing_target_does_not_stop_others() -> Result<()> {
    let project = Project::new(json!({"greeting": "Hallo"}), &["es", "fr"])?;
    project.write_raw("es.json", "[\"not a tree\"]")?;

    let report = project.sync(dictionary()).await?;

    assert!(matches!(
        report.summary("es").map(|s| &s.status),
        Some(LegStatus::Failed(_))
    ));
    assert_eq!(report.summary("fr").map(|s| &s.status), Some(&LegStatus::Synced));
    assert_eq!(project.read_locale("fr")?, json!({"greeting": "Bonjour"}));
    assert_eq!(project.read_raw("es.json")?, "[\"not a tree\"]");
    assert!(!project.exists(".i18n_manifest/es.from-en.json"));
    assert_eq!(rules(&report), vec![Rule::TargetFailed]);
    assert!(report.has_failures());
    Ok(())
}

#[tokio::test]
async fn test_failing_pivot_skips_targets() -> Result<()> {
    let project = Project::new(json!({"greeting": "Hallo"}), &["fr"])?;
    project.write_raw("en.json", "{ broken")?;

    let report = project.sync(dictionary()).await?;

    assert!(matches!(
        report.summary("en").map(|s| &s.status),
        Some(LegStatus::Failed(_))
    ));
    assert_eq!(report.summary("fr").map(|s| &s.status), Some(&LegStatus::Skipped));
    assert!(!project.exists("fr.json"));
    assert!(!project.exists(".i18n_snapshot/de.json"));
    assert_eq!(rules(&report), vec![Rule::TargetFailed, Rule::TargetSkipped]);
    Ok(())
}

#[tokio::test]
async fn test_leaf_failure_keeps_value_and_manifest_stale() -> Result<()> {
    let project = Project::new(json!({"a": "Hallo", "b": "Welt"}), &[])?;
    project.sync(dictionary()).await?;
    project.write_locale("de", &json!({"a": "Hallo Hallo", "b": "Tschüss"}))?;

    let failing = Arc::new(
        Dictionary::new(&[("en", "Tschüss", "Bye")]).failing_on("Hallo Hallo"),
    );
    let report = project.sync(failing).await?;

    assert_eq!(project.read_locale("en")?, json!({"a": "Hello", "b": "Bye"}));
    assert_eq!(project.manifest("en", "de")?["a"], json!(sha256_hex("Hallo")));
    assert_eq!(report.summary("en").map(|s| s.failed), Some(1));
    assert_eq!(rules(&report), vec![Rule::LeafFailed]);

    // The stale hash makes the next run retry the leaf.
    let translator = dictionary();
    project.sync(translator.clone()).await?;
    assert_eq!(translator.calls(), vec![("en".to_string(), "Hallo Hallo".to_string())]);
    assert_eq!(project.read_locale("en")?["a"], json!("Hello Hello"));
    Ok(())
}

#[tokio::test]
async fn test_never_translate_leaves_are_copied_verbatim() -> Result<()> {
    let project = Project::new(
        json!({"brand_original": "Hallo GmbH", "title": "Hallo"}),
        &["fr"],
    )?;
    let translator = dictionary();

    project
        .sync_with(
            translator.clone(),
            SyncOptions {
                force: ForceRequest {
                    full: true,
                    paths: Vec::new(),
                },
                ..SyncOptions::default()
            },
        )
        .await?;

    assert!(translator.calls().iter().all(|(_, text)| text != "Hallo GmbH"));
    assert_eq!(project.read_locale("en")?["brand_original"], json!("Hallo GmbH"));
    assert_eq!(project.read_locale("fr")?["brand_original"], json!("Hallo GmbH"));
    Ok(())
}

#[tokio::test]
async fn test_unknown_target_keys_survive_unless_pruned() -> Result<()> {
    let project = Project::new(json!({"a": "Hallo"}), &[])?;
    project.write_locale("en", &json!({"a": "Hello", "legacy": {"x": "old"}}))?;

    project.sync(dictionary()).await?;
    assert_eq!(project.read_locale("en")?["legacy"], json!({"x": "old"}));

    let report = project
        .sync_with(
            dictionary(),
            SyncOptions {
                prune: Some(true),
                ..SyncOptions::default()
            },
        )
        .await?;
    assert_eq!(project.read_locale("en")?, json!({"a": "Hello"}));
    assert_eq!(report.summary("en").map(|s| s.pruned), Some(1));
    assert_eq!(rules(&report), vec![Rule::PrunedKey]);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_strategy_diffs_against_previous_source() -> Result<()> {
    let mut project = Project::new(json!({"a": "Hallo", "b": "Welt"}), &[])?;
    project.config.change_detection = ChangeDetection::Snapshot;
    project.sync(dictionary()).await?;

    project.write_locale("de", &json!({"a": "Hallo", "b": "Tschüss"}))?;
    let translator = dictionary();
    project.sync(translator.clone()).await?;

    assert_eq!(translator.calls(), vec![("en".to_string(), "Tschüss".to_string())]);
    assert_eq!(project.read_locale("en")?, json!({"a": "Hello", "b": "Bye"}));
    Ok(())
}

#[tokio::test]
async fn test_snapshot_strategy_retries_failed_leaf() -> Result<()> {
    let mut project = Project::new(json!({"a": "Hallo", "b": "Welt"}), &[])?;
    project.config.change_detection = ChangeDetection::Snapshot;
    project.sync(dictionary()).await?;

    project.write_locale("de", &json!({"a": "Tschüss", "b": "Welt"}))?;
    let failing = Arc::new(Dictionary::new(&[("en", "Tschüss", "Bye")]).failing_on("Tschüss"));
    let report = project.sync(failing).await?;
    assert_eq!(report.summary("en").map(|s| s.failed), Some(1));
    assert_eq!(project.read_locale("en")?["a"], json!("Hello"));

    let translator = dictionary();
    project.sync(translator.clone()).await?;
    assert_eq!(translator.calls(), vec![("en".to_string(), "Tschüss".to_string())]);
    assert_eq!(project.read_locale("en")?, json!({"a": "Bye", "b": "World"}));
    Ok(())
}

#[tokio::test]
async fn test_snapshot_strategy_catches_up_filtered_target() -> Result<()> {
    let mut project = Project::new(json!({"a": "Hallo"}), &["es", "fr"])?;
    project.config.change_detection = ChangeDetection::Snapshot;
    project.sync(dictionary()).await?;

    project.write_locale("de", &json!({"a": "Tschüss"}))?;
    project
        .sync_with(
            dictionary(),
            SyncOptions {
                locales: vec!["fr".to_string()],
                ..SyncOptions::default()
            },
        )
        .await?;
    assert_eq!(project.read_locale("fr")?, json!({"a": "Salut"}));
    assert_eq!(project.read_locale("es")?, json!({"a": "Hello"}));

    let translator = dictionary();
    project.sync(translator.clone()).await?;
    assert_eq!(translator.calls(), vec![("es".to_string(), "Bye".to_string())]);
    assert_eq!(project.read_locale("es")?, json!({"a": "Bye"}));
    Ok(())
}

#[tokio::test]
async fn test_snapshot_strategy_retries_failed_target_leaf() -> Result<()> {
    let mut project = Project::new(json!({"a": "Hallo"}), &["fr"])?;
    project.config.change_detection = ChangeDetection::Snapshot;
    project.sync(dictionary()).await?;

    project.write_locale("de", &json!({"a": "Tschüss"}))?;
    let failing = Arc::new(Dictionary::new(&[("en", "Tschüss", "Bye")]).failing_on("Bye"));
    let report = project.sync(failing).await?;
    assert_eq!(report.summary("en").map(|s| s.translated), Some(1));
    assert_eq!(report.summary("fr").map(|s| s.failed), Some(1));
    assert_eq!(project.read_locale("fr")?, json!({"a": "Bonjour"}));

    let translator = dictionary();
    project.sync(translator.clone()).await?;
    assert_eq!(translator.calls(), vec![("fr".to_string(), "Bye".to_string())]);
    assert_eq!(project.read_locale("fr")?, json!({"a": "Salut"}));
    Ok(())
}

#[tokio::test]
async fn test_dotted_keys_stay_flat_and_idempotent() -> Result<()> {
    let project = Project::new(json!({"btn.save": "Hallo", "nav": {"menu.open": "Welt"}}), &["fr"])?;
    project.sync(dictionary()).await?;

    assert_eq!(
        project.read_locale("en")?,
        json!({"btn.save": "Hello", "nav": {"menu.open": "World"}})
    );
    assert_eq!(
        project.read_locale("fr")?,
        json!({"btn.save": "Bonjour", "nav": {"menu.open": "Monde"}})
    );

    let translator = dictionary();
    let report = project.sync(translator.clone()).await?;
    assert!(translator.calls().is_empty());
    assert_eq!(report.total_translated(), 0);
    Ok(())
}

#[tokio::test]
async fn test_placeholders_survive_translation() -> Result<()> {
    let project = Project::new(
        json!({"msg": "Hallo {{name}}, <b>Welt</b> %s"}),
        &[],
    )?;
    project.sync(dictionary()).await?;

    assert_eq!(
        project.read_locale("en")?,
        json!({"msg": "Hello {{name}}, <b>Welt</b> %s"})
    );
    Ok(())
}

#[tokio::test]
async fn test_plan_reports_pending_without_side_effects() -> Result<()> {
    let project = Project::new(json!({"a": "Hallo", "b_original": "X"}), &["fr"])?;

    let report = project.plan().await?;

    assert!(report.dry_run);
    assert_eq!(report.summary("en").map(|s| s.pending), Some(2));
    assert_eq!(report.summary("en").map(|s| &s.status), Some(&LegStatus::Planned));
    assert!(!project.exists("en.json"));
    assert!(!project.exists(".i18n_manifest"));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_run_matches_sequential() -> Result<()> {
    let source = json!({"a": "Hallo", "b": "Welt", "c": {"d": "Tschüss", "e": "Hallo Welt"}});

    let sequential = Project::new(source.clone(), &["fr"])?;
    sequential.sync(dictionary()).await?;

    let mut concurrent = Project::new(source, &["fr"])?;
    concurrent.config.concurrency = 4;
    concurrent.sync(dictionary()).await?;

    assert_eq!(concurrent.read_raw("en.json")?, sequential.read_raw("en.json")?);
    assert_eq!(concurrent.read_raw("fr.json")?, sequential.read_raw("fr.json")?);
    Ok(())
}

#[tokio::test]
async fn test_namespaced_layout_mirrors_source_files() -> Result<()> {
    let mut project = Project::new(json!({"title": "Hallo"}), &[])?;
    project.config.layout = Layout::Namespaced;
    project.write_raw("de/common.json", r#"{"ok": "Welt"}"#)?;

    project.sync(dictionary()).await?;

    assert_eq!(project.read_locale("en")?, json!({"title": "Hello"}));
    let common: Value = serde_json::from_str(&project.read_raw("en/common.json")?)?;
    assert_eq!(common, json!({"ok": "World"}));
    assert_eq!(
        project.manifest("en", "de")?,
        json!({"common.ok": sha256_hex("Welt"), "title": sha256_hex("Hallo")})
    );
    Ok(())
}
