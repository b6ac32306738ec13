use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::protect::DEFAULT_PROTECT_PATTERNS;
use crate::provider::ProviderKind;
use crate::provider::openai::{DEFAULT_MODEL, DEFAULT_ENDPOINT};
use crate::provider::translator::validate_locale;

pub const CONFIG_FILE_NAME: &str = ".locsyncrc.json";

pub const MANIFEST_DIR_NAME: &str = ".i18n_manifest";
pub const SNAPSHOT_DIR_NAME: &str = ".i18n_snapshot";

/// How locale trees are laid out under `localesRoot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `<root>/<lang>.json`
    Flat,
    /// `<root>/<lang>.json` plus `<root>/<lang>/<namespace>.json`
    #[default]
    Namespaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDetection {
    #[default]
    Manifest,
    Snapshot,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_locales_root")]
    pub locales_root: String,
    #[serde(default = "default_source_locale")]
    pub source_locale: String,
    #[serde(default = "default_pivot_locale")]
    pub pivot_locale: String,
    /// Empty means every locale found under `localesRoot`.
    #[serde(default)]
    pub target_locales: Vec<String>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub change_detection: ChangeDetection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_file: Option<String>,
    #[serde(default = "default_never_translate_suffixes")]
    pub never_translate_suffixes: Vec<String>,
    #[serde(default = "default_protect_patterns")]
    pub protect_patterns: Vec<String>,
    #[serde(default = "default_true")]
    pub mask_parenthetical_terms: bool,
    #[serde(default)]
    pub ignore_cosmetic_changes: bool,
    #[serde(default)]
    pub prune: bool,
    #[serde(default)]
    pub sort_keys: bool,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_locales_root() -> String {
    "./locales".to_string()
}

fn default_source_locale() -> String {
    "de".to_string()
}

fn default_pivot_locale() -> String {
    "en".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_retries() -> u32 {
    3
}

fn default_never_translate_suffixes() -> Vec<String> {
    vec!["_original".to_string()]
}

fn default_protect_patterns() -> Vec<String> {
    DEFAULT_PROTECT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locales_root: default_locales_root(),
            source_locale: default_source_locale(),
            pivot_locale: default_pivot_locale(),
            target_locales: Vec::new(),
            layout: Layout::default(),
            provider: ProviderKind::default(),
            model: default_model(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            api_key_env: None,
            endpoint: None,
            change_detection: ChangeDetection::default(),
            manifest_dir: None,
            snapshot_file: None,
            never_translate_suffixes: default_never_translate_suffixes(),
            protect_patterns: default_protect_patterns(),
            mask_parenthetical_terms: default_true(),
            ignore_cosmetic_changes: false,
            prune: false,
            sort_keys: false,
            concurrency: default_concurrency(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Rejects invalid protect patterns, a pivot equal to the source, zero
    /// concurrency or retries, and locale codes that are not plain
    /// `[A-Za-z0-9_-]` names (they become file names).
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.protect_patterns {
            Regex::new(pattern).with_context(|| {
                format!("Invalid regex pattern in 'protectPatterns': \"{}\"", pattern)
            })?;
        }

        if self.source_locale.trim().is_empty() {
            bail!("'sourceLocale' cannot be empty");
        }
        if self.pivot_locale.trim().is_empty() {
            bail!("'pivotLocale' cannot be empty");
        }
        validate_locale(&self.source_locale).context("Invalid 'sourceLocale'")?;
        validate_locale(&self.pivot_locale).context("Invalid 'pivotLocale'")?;
        if self.source_locale == self.pivot_locale {
            bail!(
                "'pivotLocale' must differ from 'sourceLocale' (both are \"{}\")",
                self.source_locale
            );
        }
        if self.concurrency == 0 {
            bail!("'concurrency' must be at least 1");
        }
        if self.max_retries == 0 {
            bail!("'maxRetries' must be at least 1");
        }
        for locale in &self.target_locales {
            validate_locale(locale)
                .with_context(|| format!("Invalid locale in 'targetLocales': \"{}\"", locale))?;
        }

        Ok(())
    }

    /// Absolute locales directory for a project rooted at `root`.
    pub fn locales_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.locales_root)
    }

    pub fn manifest_dir(&self, root: &Path) -> PathBuf {
        match &self.manifest_dir {
            Some(dir) => root.join(dir),
            None => self.locales_dir(root).join(MANIFEST_DIR_NAME),
        }
    }

    pub fn snapshot_path(&self, root: &Path) -> PathBuf {
        match &self.snapshot_file {
            Some(file) => root.join(file),
            None => self
                .locales_dir(root)
                .join(SNAPSHOT_DIR_NAME)
                .join(format!("{}.json", self.source_locale)),
        }
    }

    pub fn chat_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
