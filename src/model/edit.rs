use serde::{Deserialize, Serialize};

use super::path::TaskPath;
use super::status::Status;
use super::task::{TaskId, TaskMetadata};

/// A task to be inserted into a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub path: TaskPath,
    pub status: Status,
    #[serde(default)]
    pub metadata: TaskMetadata,
}

/// Changes to an existing task. `None` fields are left alone.
///
/// `metadata`, when present, is the complete new metadata map: keys missing
/// from it or mapped to an empty value are removed from the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub id: TaskId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub path: Option<TaskPath>,
    #[serde(default)]
    pub metadata: Option<TaskMetadata>,
}

impl TaskUpdate {
    pub fn new(id: TaskId) -> Self {
        TaskUpdate {
            id,
            title: None,
            status: None,
            path: None,
            metadata: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_path(mut self, path: TaskPath) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_metadata(mut self, metadata: TaskMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One single-task edit applied to a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskEdit {
    Create(NewTask),
    Update(TaskUpdate),
    Delete { id: TaskId },
}

impl TaskEdit {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            TaskEdit::Create(_) => "create",
            TaskEdit::Update(_) => "update",
            TaskEdit::Delete { .. } => "delete",
        }
    }
}
