//! Per (target, pivot) manifests: leaf path -> hash of the upstream value the
//! target's current value was produced from.
//!
//! Files live at `<dir>/<target>.from-<upstream>.json`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::utils::{read_json_file, write_json_atomic};

/// Sorted so manifest files are byte-stable across runs.
pub type Manifest = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, target: &str, upstream: &str) -> PathBuf {
        self.dir.join(format!("{}.from-{}.json", target, upstream))
    }

    pub fn exists(&self, target: &str, upstream: &str) -> bool {
        self.path_for(target, upstream).exists()
    }

    /// Absent file yields an empty manifest; a malformed one is an error.
    pub fn load(&self, target: &str, upstream: &str) -> Result<Manifest> {
        let path = self.path_for(target, upstream);
        let manifest = read_json_file::<Manifest>(&path)
            .with_context(|| format!("Failed to load manifest for '{}'", target))?;
        Ok(manifest.unwrap_or_default())
    }

    pub fn save(&self, target: &str, upstream: &str, manifest: &Manifest) -> Result<()> {
        let path = self.path_for(target, upstream);
        write_json_atomic(&path, manifest)
            .with_context(|| format!("Failed to save manifest for '{}'", target))
    }
}

/// Record `hashes[path]` for every succeeded path, then drop entries whose
/// path no longer exists upstream.
pub fn update_manifest<'a, I>(
    manifest: &mut Manifest,
    succeeded: I,
    hashes: &BTreeMap<String, String>,
) where
    I: IntoIterator<Item = &'a String>,
{
    for path in succeeded {
        if let Some(hash) = hashes.get(path) {
            manifest.insert(path.clone(), hash.clone());
        }
    }
    manifest.retain(|path, _| hashes.contains_key(path));
}
