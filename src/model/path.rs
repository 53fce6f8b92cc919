use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between heading segments in the display form of a path
pub const PATH_SEPARATOR: &str = " / ";

/// Display label for the empty path
pub const ROOT_LABEL: &str = "(root)";

/// Heading hierarchy a task lives under, outermost heading first.
///
/// The empty path is the document root (tasks above the first heading).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskPath {
    segments: Vec<String>,
}

impl TaskPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TaskPath {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn root() -> Self {
        TaskPath::default()
    }

    /// Parse the display form (`A / B`). Empty input and the root label both
    /// mean the root path.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == ROOT_LABEL {
            return TaskPath::root();
        }
        TaskPath::new(
            s.split(PATH_SEPARATOR)
                .map(str::trim)
                .filter(|seg| !seg.is_empty()),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True if `self` equals `ancestor` or lies somewhere below it.
    pub fn starts_with(&self, ancestor: &TaskPath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(ROOT_LABEL)
        } else {
            f.write_str(&self.segments.join(PATH_SEPARATOR))
        }
    }
}
