use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::path::TaskPath;
use super::status::Status;

/// Metadata key promoted to [`ParsedTask::status`] instead of living in the map
pub const STATUS_KEY: &str = "status";

/// Stable task identifier derived from a task's path and title.
///
/// A truncated blake3 digest over a length-prefixed encoding of the heading
/// segments and the title, so no title or heading text can collide with the
/// encoding of another (path, title) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    const HEX_LEN: usize = 16;

    pub fn generate(path: &TaskPath, title: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(path.depth() as u64).to_le_bytes());
        for segment in path.segments() {
            hasher.update(&(segment.len() as u64).to_le_bytes());
            hasher.update(segment.as_bytes());
        }
        hasher.update(&(title.len() as u64).to_le_bytes());
        hasher.update(title.as_bytes());
        let hex = hasher.finalize().to_hex();
        TaskId(hex.as_str()[..Self::HEX_LEN].to_string())
    }

    /// Wrap an id string received from a caller (CLI argument, JSON payload).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        TaskId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-form `key: value` metadata attached to a task. Never holds `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskMetadata(IndexMap<String, String>);

impl TaskMetadata {
    pub fn new() -> Self {
        TaskMetadata::default()
    }

    /// Insert an entry. The reserved `status` key is refused (returns false).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if key == STATUS_KEY {
            return false;
        }
        self.0.insert(key, value.into());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TaskMetadata {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut meta = TaskMetadata::new();
        for (k, v) in iter {
            meta.insert(k, v);
        }
        meta
    }
}

/// A checkbox list item recognized as a task, with its source line range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTask {
    pub id: TaskId,
    /// First-paragraph text with the checkbox marker stripped, inline markup kept verbatim
    pub title: String,
    pub status: Status,
    pub path: TaskPath,
    pub is_checked: bool,
    pub metadata: TaskMetadata,
    /// 1-based, inclusive, in whole-document coordinates (frontmatter included)
    pub start_line: usize,
    /// 1-based, inclusive
    pub end_line: usize,
}

impl ParsedTask {
    /// Number of source lines the task occupies
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}
