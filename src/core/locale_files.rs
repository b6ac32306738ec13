//! Locale trees on disk.
//!
//! Flat layout: one `<root>/<lang>.json` per language.
//! Namespaced layout: `<root>/<lang>.json` plus `<root>/<lang>/<ns>.json`,
//! each namespace file mounted under the top-level key `<ns>`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{Pattern, glob};
use serde_json::{Map, Value};

use super::tree::LocaleTree;
use crate::config::Layout;
use crate::utils::{read_json_file, write_json_atomic};

#[derive(Debug, Clone)]
pub struct LocaleStore {
    root: PathBuf,
    layout: Layout,
    sort_keys: bool,
    /// Namespaces every written tree is split into, usually the source's.
    namespaces: BTreeSet<String>,
}

impl LocaleStore {
    pub fn new(root: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            root: root.into(),
            layout,
            sort_keys: false,
            namespaces: BTreeSet::new(),
        }
    }

    pub fn sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    /// Adopt the namespace files of `lang` as the split used when writing.
    pub fn with_namespaces_of(mut self, lang: &str) -> Result<Self> {
        self.namespaces = self.namespaces_on_disk(lang)?;
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_file(&self, lang: &str) -> PathBuf {
        self.root.join(format!("{}.json", lang))
    }

    pub fn namespace_file(&self, lang: &str, namespace: &str) -> PathBuf {
        self.root.join(lang).join(format!("{}.json", namespace))
    }

    /// Whether any file of `lang` exists.
    pub fn exists(&self, lang: &str) -> bool {
        self.base_file(lang).exists()
            || (self.layout == Layout::Namespaced && self.root.join(lang).is_dir())
    }

    /// Read the full tree of `lang`. A language with no files is empty.
    pub fn read(&self, lang: &str) -> Result<LocaleTree> {
        let mut tree = read_tree(&self.base_file(lang))?.unwrap_or_default();

        if self.layout == Layout::Namespaced {
            for namespace in self.namespaces_on_disk(lang)? {
                let path = self.namespace_file(lang, &namespace);
                let Some(ns_tree) = read_tree(&path)? else {
                    continue;
                };
                let mut mounted = Map::new();
                mounted.insert(namespace, ns_tree.into_value());
                tree.deep_merge(LocaleTree::from(mounted));
            }
        }

        Ok(tree)
    }

    /// Write the tree of `lang`, splitting namespaces back into their files.
    /// Returns the files written.
    pub fn write(&self, lang: &str, tree: &LocaleTree) -> Result<Vec<PathBuf>> {
        let mut tree = tree.clone();
        if self.sort_keys {
            tree.sort_keys();
        }

        let mut written = Vec::new();
        if self.layout == Layout::Namespaced {
            let mut namespaces = self.namespaces.clone();
            namespaces.extend(self.namespaces_on_disk(lang)?);
            for namespace in namespaces {
                let path = self.namespace_file(lang, &namespace);
                let content = match tree.as_map().get(&namespace) {
                    Some(Value::Object(_)) => tree.as_map_mut().shift_remove(&namespace),
                    _ if path.exists() => Some(Value::Object(Map::new())),
                    _ => None,
                };
                if let Some(content) = content {
                    write_json_atomic(&path, &content)?;
                    written.push(path);
                }
            }
        }

        let base = self.base_file(lang);
        if !tree.is_empty() || base.exists() || written.is_empty() {
            write_json_atomic(&base, &tree)?;
            written.push(base);
        }
        Ok(written)
    }

    /// Namespace names present as `<root>/<lang>/*.json`, sorted.
    pub fn namespaces_on_disk(&self, lang: &str) -> Result<BTreeSet<String>> {
        if self.layout == Layout::Flat {
            return Ok(BTreeSet::new());
        }
        let dir = self.root.join(lang);
        if !dir.is_dir() {
            return Ok(BTreeSet::new());
        }
        let pattern = format!("{}/*.json", Pattern::escape(&dir.to_string_lossy()));
        let mut names = BTreeSet::new();
        for entry in glob(&pattern).context("Invalid namespace pattern")? {
            let path = entry.context("Failed to list namespace files")?;
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && !stem.starts_with('.')
            {
                names.insert(stem.to_string());
            }
        }
        Ok(names)
    }

    /// Every language that has a file or (namespaced) a directory under the
    /// root. Hidden entries such as manifest and snapshot dirs are skipped.
    pub fn discover_locales(&self) -> Result<Vec<String>> {
        let mut locales = BTreeSet::new();
        let pattern = format!("{}/*", Pattern::escape(&self.root.to_string_lossy()));
        for entry in glob(&pattern).context("Invalid locale pattern")? {
            let path = entry.context("Failed to list locales")?;
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                if self.layout == Layout::Namespaced {
                    locales.insert(name.to_string());
                }
            } else if let Some(lang) = name.strip_suffix(".json") {
                locales.insert(lang.to_string());
            }
        }
        Ok(locales.into_iter().collect())
    }
}

fn read_tree(path: &Path) -> Result<Option<LocaleTree>> {
    let Some(value) = read_json_file::<Value>(path)? else {
        return Ok(None);
    };
    let tree = LocaleTree::from_value(value)
        .with_context(|| format!("Invalid locale file: {}", path.display()))?;
    Ok(Some(tree))
}
