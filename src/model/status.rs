use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when constructing a [`Status`] from blank input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("status must not be empty")]
    Empty,
}

/// A validated, non-empty status label such as `todo` or `in-progress`.
///
/// Whether a status counts as "done" is decided by the configured done-set,
/// never by the spelling of the label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Status(String);

impl Status {
    pub fn new(value: impl AsRef<str>) -> Result<Self, StatusError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(StatusError::Empty);
        }
        Ok(Status(trimmed.to_string()))
    }

    /// Built-in fallback labels; callers pass non-blank literals only.
    pub(crate) fn literal(value: &'static str) -> Self {
        Status(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Status {
    type Error = StatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Status::new(value)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.0
    }
}

impl std::str::FromStr for Status {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::new(s)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
