use serde::{Deserialize, Serialize};

use super::path::TaskPath;
use super::status::Status;

/// Task ordering within a board column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Source order in the document
    #[default]
    Markdown,
    Priority,
    Due,
    Alphabetical,
}

impl SortBy {
    pub fn from_name(name: &str) -> Option<SortBy> {
        match name.trim().to_ascii_lowercase().as_str() {
            "markdown" => Some(SortBy::Markdown),
            "priority" => Some(SortBy::Priority),
            "due" => Some(SortBy::Due),
            "alphabetical" => Some(SortBy::Alphabetical),
            _ => None,
        }
    }
}

/// Board settings found in a document's frontmatter. Every field is optional;
/// a field of the wrong type is read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontmatterConfig {
    pub statuses: Option<Vec<String>>,
    pub done_statuses: Option<Vec<String>>,
    pub default_status: Option<String>,
    pub default_done_status: Option<String>,
    pub sort_by: Option<SortBy>,
    pub sync_checkbox_with_done: Option<bool>,
    pub filter_paths: Option<Vec<String>>,
}

/// Effective board configuration: defaults (or a settings file) overlaid by
/// frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BoardConfig {
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
    #[serde(default = "default_done_statuses")]
    pub done_statuses: Vec<String>,
    #[serde(default = "default_status")]
    pub default_status: String,
    #[serde(default = "default_done_status")]
    pub default_done_status: String,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default = "default_true")]
    pub sync_checkbox_with_done: bool,
    #[serde(default)]
    pub filter_paths: Vec<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            statuses: default_statuses(),
            done_statuses: default_done_statuses(),
            default_status: default_status(),
            default_done_status: default_done_status(),
            sort_by: SortBy::Markdown,
            sync_checkbox_with_done: true,
            filter_paths: Vec::new(),
        }
    }
}

fn default_statuses() -> Vec<String> {
    vec!["todo".into(), "in-progress".into(), "done".into()]
}

fn default_done_statuses() -> Vec<String> {
    vec!["done".into()]
}

fn default_status() -> String {
    "todo".into()
}

fn default_done_status() -> String {
    "done".into()
}

fn default_true() -> bool {
    true
}

impl BoardConfig {
    /// Apply the fields present in `fm` on top of `self`
    pub fn overlay(&self, fm: &FrontmatterConfig) -> BoardConfig {
        let mut merged = self.clone();
        if let Some(statuses) = &fm.statuses {
            merged.statuses = statuses.clone();
        }
        if let Some(done) = &fm.done_statuses {
            merged.done_statuses = done.clone();
        }
        if let Some(status) = fm.default_status.as_deref().filter(|s| !s.trim().is_empty()) {
            merged.default_status = status.trim().to_string();
        }
        if let Some(status) = fm
            .default_done_status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            merged.default_done_status = status.trim().to_string();
        }
        if let Some(sort_by) = fm.sort_by {
            merged.sort_by = sort_by;
        }
        if let Some(sync) = fm.sync_checkbox_with_done {
            merged.sync_checkbox_with_done = sync;
        }
        if let Some(paths) = &fm.filter_paths {
            merged.filter_paths = paths.clone();
        }
        merged
    }

    /// True if `status` belongs to the done-set (`done_statuses` plus the
    /// default done status).
    pub fn is_done(&self, status: &Status) -> bool {
        let value = status.as_str();
        value == self.default_done_status || self.done_statuses.iter().any(|s| s == value)
    }

    /// Status for an unchecked task with no explicit `status:` line
    pub fn open_status(&self) -> Status {
        Status::new(&self.default_status).unwrap_or_else(|_| Status::literal("todo"))
    }

    /// Status for a checked task with no explicit `status:` line
    pub fn done_status(&self) -> Status {
        Status::new(&self.default_done_status).unwrap_or_else(|_| Status::literal("done"))
    }

    pub fn filter_paths(&self) -> Vec<TaskPath> {
        self.filter_paths.iter().map(|p| TaskPath::parse(p)).collect()
    }
}
