//! `---` delimited YAML header at the very top of a document.

use serde_yaml::Value;

use crate::model::config::{FrontmatterConfig, SortBy};

/// Top-level frontmatter key holding board settings
pub const CONFIG_NAMESPACE: &str = "board";

const DELIMITER: &str = "---";

/// A frontmatter block split off the front of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// YAML between the delimiters
    pub yaml: &'a str,
    /// Lines occupied by the block, both delimiters included
    pub line_count: usize,
    /// Everything after the closing delimiter line
    pub body: &'a str,
}

/// Split a leading frontmatter block off `text`. Returns `None` when the
/// first line is not `---` or the block is never closed.
pub fn split_frontmatter(text: &str) -> Option<Frontmatter<'_>> {
    let mut offset = 0;
    let mut yaml_start = None;
    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let line = raw.trim_end_matches(['\n', '\r']);
        let line_start = offset;
        offset += raw.len();
        if idx == 0 {
            if line != DELIMITER {
                return None;
            }
            yaml_start = Some(offset);
            continue;
        }
        if line == DELIMITER {
            let start = yaml_start?;
            return Some(Frontmatter {
                yaml: &text[start..line_start],
                line_count: idx + 1,
                body: &text[offset..],
            });
        }
    }
    None
}

/// Read the board settings out of frontmatter YAML.
///
/// Returns `Ok(None)` if the namespace is absent. Fields of the wrong type are
/// dropped individually; only YAML that fails to decode at all is an error.
pub fn read_config(yaml: &str) -> Result<Option<FrontmatterConfig>, serde_yaml::Error> {
    let root: Value = serde_yaml::from_str(yaml)?;
    let Some(section) = root.get(CONFIG_NAMESPACE) else {
        return Ok(None);
    };
    if !section.is_mapping() {
        return Ok(None);
    }

    Ok(Some(FrontmatterConfig {
        statuses: string_list(section.get("statuses")),
        done_statuses: string_list(section.get("doneStatuses")),
        default_status: string(section.get("defaultStatus")),
        default_done_status: string(section.get("defaultDoneStatus")),
        sort_by: string(section.get("sortBy")).and_then(|s| SortBy::from_name(&s)),
        sync_checkbox_with_done: section.get("syncCheckboxWithDone").and_then(Value::as_bool),
        filter_paths: string_list(section.get("filterPaths")),
    }))
}

fn string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value?
        .as_sequence()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
