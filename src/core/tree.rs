//! Nested locale trees and their flat `dotted.path -> value` form.
//!
//! A [`LocaleTree`] is a JSON object whose values are either nested objects or
//! leaves. Strings are translatable leaves; every other value (numbers, bools,
//! arrays, null) is carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum nesting depth accepted when loading a tree.
pub const MAX_DEPTH: usize = 128;

/// Flat view of a tree: leaf path -> leaf value, in tree order.
pub type FlatTree = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A leaf and a mapping compete for the same path prefix.
    #[error("path '{path}' conflicts with existing leaf at '{existing}'")]
    PathConflict { path: String, existing: String },

    #[error("empty key path")]
    EmptyPath,

    #[error("locale tree is nested deeper than 128 levels")]
    TooDeep,

    #[error("locale file root must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleTree(Map<String, Value>);

impl LocaleTree {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a tree from an arbitrary JSON value.
    ///
    /// The root must be an object and the nesting must stay within [`MAX_DEPTH`].
    pub fn from_value(value: Value) -> Result<Self, TreeError> {
        match value {
            Value::Object(map) => {
                if depth_of(&map) > MAX_DEPTH {
                    return Err(TreeError::TooDeep);
                }
                Ok(Self(map))
            }
            other => Err(TreeError::NotAnObject(type_name(&other))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into `path -> leaf`. Empty objects produce no leaves.
    pub fn flatten(&self) -> FlatTree {
        let mut result = FlatTree::new();
        flatten_into(&self.0, "", &mut result);
        result
    }

    /// Rebuild a tree from a flat map.
    ///
    /// Fails instead of dropping data when both `a` and `a.b` are present.
    pub fn unflatten(flat: &FlatTree) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        for (path, value) in flat {
            tree.insert_new(path, value.clone())?;
        }
        Ok(tree)
    }

    /// Look up a value (leaf or subtree). `None` if any segment is missing or
    /// not a mapping.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Write a value at `path`, creating intermediate mappings.
    ///
    /// An existing value at `path` itself is replaced; a leaf sitting on an
    /// intermediate segment is a [`TreeError::PathConflict`].
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), TreeError> {
        let (parent, last) = self.parent_map_mut(path)?;
        parent.insert(last.to_string(), value);
        Ok(())
    }

    /// Like [`LocaleTree::set`], but walks literal key segments so keys that
    /// contain a dot stay single keys.
    pub fn set_at(&mut self, keys: &[String], value: Value) -> Result<(), TreeError> {
        let (last, parents) = keys.split_last().ok_or(TreeError::EmptyPath)?;
        let mut current = &mut self.0;
        for (i, key) in parents.iter().enumerate() {
            let entry = current
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(map) => current = map,
                _ => {
                    return Err(TreeError::PathConflict {
                        path: keys.join("."),
                        existing: keys[..=i].join("."),
                    });
                }
            }
        }
        current.insert(last.clone(), value);
        Ok(())
    }

    /// Remove the value at `path`, returning it.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parents, last) = match path.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, path),
        };
        let map = match parents {
            None => &mut self.0,
            Some(parents) => {
                let mut current = &mut self.0;
                for part in parents.split('.') {
                    current = current.get_mut(part)?.as_object_mut()?;
                }
                current
            }
        };
        map.shift_remove(last)
    }

    /// Every leaf path at or below `path`. A leaf path yields itself.
    pub fn leaf_paths_under(&self, path: &str) -> Vec<String> {
        match self.get(path) {
            None => Vec::new(),
            Some(Value::Object(map)) => {
                let mut flat = FlatTree::new();
                flatten_into(map, path, &mut flat);
                flat.into_iter().map(|(k, _)| k).collect()
            }
            Some(_) => vec![path.to_string()],
        }
    }

    /// Recursively merge `other` into `self`; objects merge, anything else
    /// is replaced by `other`'s value.
    pub fn deep_merge(&mut self, other: LocaleTree) {
        deep_merge_maps(&mut self.0, other.0);
    }

    /// Recursively sort keys.
    pub fn sort_keys(&mut self) {
        sort_map(&mut self.0);
    }

    /// Insert a leaf that must not overwrite or be shadowed by anything.
    fn insert_new(&mut self, path: &str, value: Value) -> Result<(), TreeError> {
        if let Some(existing) = self.get(path) {
            let existing_path = if existing.is_object() {
                self.leaf_paths_under(path)
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| path.to_string())
            } else {
                path.to_string()
            };
            return Err(TreeError::PathConflict {
                path: path.to_string(),
                existing: existing_path,
            });
        }
        self.set(path, value)
    }

    fn parent_map_mut<'a, 'p>(
        &'a mut self,
        path: &'p str,
    ) -> Result<(&'a mut Map<String, Value>, &'p str), TreeError> {
        if path.is_empty() {
            return Err(TreeError::EmptyPath);
        }
        let parts: Vec<&str> = path.split('.').collect();
        let (last, parents) = parts.split_last().ok_or(TreeError::EmptyPath)?;

        let mut current = &mut self.0;
        for (i, part) in parents.iter().enumerate() {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(map) => current = map,
                _ => {
                    return Err(TreeError::PathConflict {
                        path: path.to_string(),
                        existing: parts[..=i].join("."),
                    });
                }
            }
        }
        Ok((current, *last))
    }
}

impl From<Map<String, Value>> for LocaleTree {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Join a parent path and a key.
pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, result: &mut FlatTree) {
    for (key, value) in map {
        let path = join_path(prefix, key);
        match value {
            Value::Object(child) => flatten_into(child, &path, result),
            leaf => {
                result.insert(path, leaf.clone());
            }
        }
    }
}

fn deep_merge_maps(base: &mut Map<String, Value>, other: Map<String, Value>) {
    for (key, value) in other {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge_maps(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn sort_map(map: &mut Map<String, Value>) {
    map.sort_keys();
    for value in map.values_mut() {
        if let Value::Object(child) = value {
            sort_map(child);
        }
    }
}

/// Nesting depth using an explicit stack, so hostile input cannot overflow.
fn depth_of(map: &Map<String, Value>) -> usize {
    let mut max = 0;
    let mut stack: Vec<(&Map<String, Value>, usize)> = vec![(map, 1)];
    while let Some((current, depth)) = stack.pop() {
        max = max.max(depth);
        if max > MAX_DEPTH {
            return max;
        }
        for value in current.values() {
            if let Value::Object(child) = value {
                stack.push((child, depth + 1));
            }
        }
    }
    max
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
