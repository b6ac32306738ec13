//! Change detection: which upstream leaves need (re)translation.
//!
//! Two baselines are supported. A manifest records the content hash of the
//! upstream value each target leaf was produced from; a snapshot is the
//! upstream tree as it looked at the end of the previous run. The snapshot
//! is shared by every target, so a target that already has a manifest also
//! gets its stale manifest entries. Forced paths and full mode are unioned
//! on top of either.

use std::collections::{BTreeMap, BTreeSet};

use super::hash::{HashOptions, hash_leaves, values_equal};
use super::manifest::Manifest;
use super::tree::{FlatTree, LocaleTree};

/// What the current upstream tree is compared against.
#[derive(Debug, Clone, Copy)]
pub enum Baseline<'a> {
    Manifest(&'a Manifest),
    Snapshot {
        previous: &'a FlatTree,
        /// The target's own manifest, when it has one.
        manifest: Option<&'a Manifest>,
    },
}

/// Paths the caller wants re-translated regardless of state.
#[derive(Debug, Clone, Default)]
pub struct ForceRequest {
    /// Every leaf is forced.
    pub full: bool,
    /// Dotted paths; internal nodes expand to every leaf beneath them.
    pub paths: Vec<String>,
}

impl ForceRequest {
    pub fn is_empty(&self) -> bool {
        !self.full && self.paths.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Leaves whose upstream content changed since the baseline.
    pub changed: BTreeSet<String>,
    /// Leaves forced by `--force` or full mode.
    pub forced: BTreeSet<String>,
    /// Forced paths that matched nothing upstream.
    pub unknown_forced: Vec<String>,
    /// Current content hash of every upstream leaf.
    pub hashes: BTreeMap<String, String>,
}

impl ChangeSet {
    pub fn needs_translation(&self, path: &str) -> bool {
        self.changed.contains(path) || self.forced.contains(path)
    }

    pub fn is_forced(&self, path: &str) -> bool {
        self.forced.contains(path)
    }

    /// Union of changed and forced paths.
    pub fn pending(&self) -> BTreeSet<&str> {
        self.changed
            .iter()
            .chain(self.forced.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Compare `upstream` against `baseline` and apply `force`.
pub fn detect(
    upstream: &LocaleTree,
    baseline: Baseline<'_>,
    force: &ForceRequest,
    options: HashOptions,
) -> ChangeSet {
    let flat = upstream.flatten();
    let hashes = hash_leaves(&flat, options);

    let changed = match baseline {
        Baseline::Manifest(manifest) => detect_by_manifest(&hashes, manifest),
        Baseline::Snapshot { previous, manifest } => {
            let mut changed = detect_by_snapshot(previous, &flat, options);
            if let Some(manifest) = manifest {
                changed.extend(detect_by_manifest(&hashes, manifest));
            }
            changed
        }
    };

    let (forced, unknown_forced) = if force.full {
        (flat.keys().cloned().collect(), Vec::new())
    } else {
        expand_forced(upstream, &force.paths)
    };

    ChangeSet {
        changed,
        forced,
        unknown_forced,
        hashes,
    }
}

/// A path is changed when the manifest lacks it or stores another hash.
pub fn detect_by_manifest(
    hashes: &BTreeMap<String, String>,
    manifest: &Manifest,
) -> BTreeSet<String> {
    hashes
        .iter()
        .filter(|(path, hash)| manifest.get(*path) != Some(*hash))
        .map(|(path, _)| path.clone())
        .collect()
}

/// Added and changed leaves between two flat trees. Deletions are not
/// reported; a type change counts as a change.
pub fn detect_by_snapshot(old: &FlatTree, new: &FlatTree, options: HashOptions) -> BTreeSet<String> {
    new.iter()
        .filter(|(path, value)| match old.get(*path) {
            None => true,
            Some(previous) => !values_equal(previous, value, options),
        })
        .map(|(path, _)| path.clone())
        .collect()
}

/// Expand forced paths to leaf paths. Returns the expanded set and the
/// requested paths that matched nothing.
pub fn expand_forced(tree: &LocaleTree, paths: &[String]) -> (BTreeSet<String>, Vec<String>) {
    let mut forced = BTreeSet::new();
    let mut unknown = Vec::new();
    for path in paths {
        let path = path.trim().trim_matches('.');
        let leaves = tree.leaf_paths_under(path);
        if leaves.is_empty() {
            unknown.push(path.to_string());
        } else {
            forced.extend(leaves);
        }
    }
    (forced, unknown)
}
