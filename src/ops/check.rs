use serde::Serialize;

use crate::ops::board_view::{DUE_KEY, parse_due};
use crate::parse::{ParseWarning, ParsedBoard};

/// Structured result from `mdb check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// Something that should be fixed: edits may land somewhere unexpected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckError {
    /// Same title under the same path; edits by id hit the first one
    DuplicateTask {
        title: String,
        path: String,
        lines: Vec<usize>,
    },
    /// Frontmatter settings were ignored
    InvalidFrontmatter { message: String },
}

/// Non-critical issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckWarning {
    /// Status missing from the configured list; shown in an extra column
    UnknownStatus {
        task_id: String,
        title: String,
        status: String,
        line: usize,
    },
    /// `due` value that is not a YYYY-MM-DD date
    InvalidDue {
        task_id: String,
        title: String,
        value: String,
        line: usize,
    },
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckError::DuplicateTask { title, path, lines } => {
                let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
                write!(
                    f,
                    "duplicate task \"{}\" under {} (lines {})",
                    title,
                    path,
                    lines.join(", ")
                )
            }
            CheckError::InvalidFrontmatter { message } => {
                write!(f, "invalid frontmatter: {}", message)
            }
        }
    }
}

impl std::fmt::Display for CheckWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckWarning::UnknownStatus {
                title,
                status,
                line,
                ..
            } => write!(f, "line {}: \"{}\" has unknown status \"{}\"", line, title, status),
            CheckWarning::InvalidDue {
                title, value, line, ..
            } => write!(f, "line {}: \"{}\" has invalid due date \"{}\"", line, title, value),
        }
    }
}

/// Validate a parsed board and return structured results.
///
/// Read-only. Checks performed:
/// 1. Parse warnings (duplicate tasks, unreadable frontmatter)
/// 2. Statuses missing from the configured `statuses`
/// 3. `due` metadata that is not a valid date
pub fn check_board(parsed: &ParsedBoard) -> CheckResult {
    let mut result = CheckResult::default();

    for warning in &parsed.warnings {
        result.errors.push(match warning {
            ParseWarning::DuplicateTask { title, path, lines } => CheckError::DuplicateTask {
                title: title.clone(),
                path: path.to_string(),
                lines: lines.clone(),
            },
            ParseWarning::InvalidFrontmatter { message } => CheckError::InvalidFrontmatter {
                message: message.clone(),
            },
        });
    }

    let statuses = &parsed.settings.statuses;
    for task in &parsed.tasks {
        if !statuses.iter().any(|s| s == task.status.as_str()) {
            result.warnings.push(CheckWarning::UnknownStatus {
                task_id: task.id.to_string(),
                title: task.title.clone(),
                status: task.status.to_string(),
                line: task.start_line,
            });
        }
        if let Some(due) = task.metadata.get(DUE_KEY)
            && parse_due(due).is_none()
        {
            result.warnings.push(CheckWarning::InvalidDue {
                task_id: task.id.to_string(),
                title: task.title.clone(),
                value: due.to_string(),
                line: task.start_line,
            });
        }
    }

    result.valid = result.errors.is_empty();
    result
}
