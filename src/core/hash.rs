//! Content hashing of leaf values for manifests.

use rayon::prelude::*;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::tree::FlatTree;

/// How leaf values are turned into hash input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashOptions {
    /// Hash strings after [`normalize_cosmetic`], so typography-only edits
    /// do not count as changes.
    pub ignore_cosmetic: bool,
}

/// Lowercase hex SHA-256 of a leaf value.
///
/// Strings hash their raw text. Other values hash `json:` plus their compact
/// JSON form, so `"1"` and `1` never collide.
pub fn content_hash(value: &Value, options: HashOptions) -> String {
    match value {
        Value::String(s) if options.ignore_cosmetic => sha256_hex(&normalize_cosmetic(s)),
        Value::String(s) => sha256_hex(s),
        other => sha256_hex(&format!("json:{}", other)),
    }
}

pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash every leaf of a flattened tree.
pub fn hash_leaves(flat: &FlatTree, options: HashOptions) -> BTreeMap<String, String> {
    let entries: Vec<(&String, &Value)> = flat.iter().collect();
    entries
        .par_iter()
        .map(|(path, value)| ((*path).clone(), content_hash(value, options)))
        .collect()
}

/// Collapse edits that do not change meaning: Unicode spaces, typographic
/// quotes, dash variants, ellipsis and whitespace runs.
pub fn normalize_cosmetic(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{2000}'..='\u{200B}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => ' ',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}' | '\u{2039}'
            | '\u{203A}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{2032}' => '\'',
            '\u{2013}' | '\u{2014}' => '-',
            other => other,
        })
        .collect();
    mapped
        .replace('\u{2026}', "...")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compare two leaf values, optionally ignoring cosmetic string edits.
pub fn values_equal(a: &Value, b: &Value, options: HashOptions) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) if options.ignore_cosmetic => {
            normalize_cosmetic(x) == normalize_cosmetic(y)
        }
        _ => a == b,
    }
}
