use serde::Serialize;

use crate::model::task::ParsedTask;
use crate::ops::board_view::BoardView;
use crate::ops::check::CheckResult;
use crate::parse::Heading;
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

/// Characters of a task id shown in text output; any unique prefix resolves
pub const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub status: String,
    pub checked: bool,
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataJson>,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Serialize)]
pub struct MetadataJson {
    pub key: String,
    pub value: String,
}

#[derive(Serialize)]
pub struct TaskListJson {
    pub tasks: Vec<TaskJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct ColumnJson {
    pub status: String,
    pub known: bool,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct BoardJson {
    pub sort_by: String,
    pub columns: Vec<ColumnJson>,
}

#[derive(Serialize)]
pub struct HeadingJson {
    pub path: Vec<String>,
    pub level: u8,
    pub line: usize,
}

/// Result of a write command
#[derive(Serialize)]
pub struct EditJson {
    pub action: &'static str,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

pub fn task_to_json(task: &ParsedTask) -> TaskJson {
    TaskJson {
        id: task.id.to_string(),
        title: task.title.clone(),
        status: task.status.to_string(),
        checked: task.is_checked,
        path: task.path.segments().to_vec(),
        metadata: task
            .metadata
            .iter()
            .map(|(k, v)| MetadataJson {
                key: k.to_string(),
                value: v.to_string(),
            })
            .collect(),
        start_line: task.start_line,
        end_line: task.end_line,
    }
}

pub fn board_to_json(view: &BoardView) -> BoardJson {
    BoardJson {
        sort_by: format!("{:?}", view.sort_by).to_lowercase(),
        columns: view
            .columns
            .iter()
            .map(|c| ColumnJson {
                status: c.status.clone(),
                known: c.known,
                tasks: c.tasks.iter().map(|t| task_to_json(t)).collect(),
            })
            .collect(),
    }
}

pub fn heading_to_json(heading: &Heading) -> HeadingJson {
    HeadingJson {
        path: heading.path.segments().to_vec(),
        level: heading.level,
        line: heading.line,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

pub fn short_id(task: &ParsedTask) -> &str {
    let id = task.id.as_str();
    &id[..id.len().min(SHORT_ID_LEN)]
}

fn check_char(task: &ParsedTask) -> char {
    if task.is_checked { 'x' } else { ' ' }
}

/// One-line summary: `[x] 1a2b3c4d done  Title  · due: 2025-01-15`
pub fn format_task_line(task: &ParsedTask, status_width: usize, title_width: usize) -> String {
    let meta = if task.metadata.is_empty() {
        String::new()
    } else {
        let pairs: Vec<String> = task
            .metadata
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        format!("  · {}", pairs.join(", "))
    };
    let line = format!(
        "[{}] {} {}  {}{}",
        check_char(task),
        short_id(task),
        pad_to_width(task.status.as_str(), status_width),
        truncate_to_width(&task.title, title_width),
        meta
    );
    line.trim_end().to_string()
}

/// Tasks grouped under a line naming their path, in document order
pub fn format_task_listing(tasks: &[&ParsedTask], title_width: usize) -> Vec<String> {
    let status_width = tasks
        .iter()
        .map(|t| display_width(t.status.as_str()))
        .max()
        .unwrap_or(0);
    let mut lines = Vec::new();
    let mut current = None;
    for task in tasks {
        if current != Some(&task.path) {
            if current.is_some() {
                lines.push(String::new());
            }
            lines.push(task.path.to_string());
            current = Some(&task.path);
        }
        lines.push(format!(
            "  {}",
            format_task_line(task, status_width, title_width)
        ));
    }
    lines
}

pub fn format_board(view: &BoardView, title_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, column) in view.columns.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        let marker = if column.known { "" } else { " (unlisted status)" };
        lines.push(format!(
            "{} ({}){}",
            column.status.to_uppercase(),
            column.tasks.len(),
            marker
        ));
        for task in &column.tasks {
            let path = if task.path.is_root() {
                String::new()
            } else {
                format!("  [{}]", task.path)
            };
            lines.push(format!(
                "  {}  {}{}",
                short_id(task),
                truncate_to_width(&task.title, title_width),
                path
            ));
        }
    }
    lines
}

pub fn format_headings(headings: &[Heading]) -> Vec<String> {
    headings
        .iter()
        .map(|h| {
            let indent = "  ".repeat(h.path.depth().saturating_sub(1));
            let name = h.path.segments().last().map(String::as_str).unwrap_or("");
            format!("{}{} (line {})", indent, name, h.line)
        })
        .collect()
}

pub fn format_check(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        lines.extend(result.errors.iter().map(|e| format!("  {}", e)));
    }
    if !result.warnings.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Warnings:".to_string());
        lines.extend(result.warnings.iter().map(|w| format!("  {}", w)));
    }
    if lines.is_empty() {
        lines.push("No problems found.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::board_view::build_board;
    use crate::ops::check::check_board;
    use crate::parse::parse_board;

    const DOC: &str = "\
- [ ] Loose end
# Work
- [ ] Ship release
  - status: in-progress
  - priority: high
- [x] Write changelog
## Later
- [ ] Plan the next quarter with everyone involved
  - status: blocked
";

    fn ids(doc: &str) -> Vec<String> {
        parse_board(doc)
            .unwrap()
            .tasks
            .iter()
            .map(|t| short_id(t).to_string())
            .collect()
    }

    #[test]
    fn test_task_listing() {
        let parsed = parse_board(DOC).unwrap();
        let tasks: Vec<&ParsedTask> = parsed.tasks.iter().collect();
        let rendered = format_task_listing(&tasks, 20).join("\n");
        let ids = ids(DOC);
        let rendered = ids
            .iter()
            .fold(rendered, |acc, id| acc.replace(id.as_str(), "<id>"));
        insta::assert_snapshot!(rendered, @r"
        (root)
          [ ] <id> todo         Loose end

        Work
          [ ] <id> in-progress  Ship release  · priority: high
          [x] <id> done         Write changelog

        Work / Later
          [ ] <id> blocked      Plan the next quart…
        ");
    }

    #[test]
    fn test_board_rendering() {
        let parsed = parse_board(DOC).unwrap();
        let view = build_board(&parsed, &parsed.settings);
        let rendered = format_board(&view, 60).join("\n");
        let rendered = ids(DOC)
            .iter()
            .fold(rendered, |acc, id| acc.replace(id.as_str(), "<id>"));
        insta::assert_snapshot!(rendered, @r"
        TODO (1)
          <id>  Loose end

        IN-PROGRESS (1)
          <id>  Ship release  [Work]

        DONE (1)
          <id>  Write changelog  [Work]

        BLOCKED (1) (unlisted status)
          <id>  Plan the next quarter with everyone involved  [Work / Later]
        ");
    }

    #[test]
    fn test_headings_are_indented_by_depth() {
        let parsed = parse_board(DOC).unwrap();
        insta::assert_snapshot!(format_headings(&parsed.headings).join("\n"), @r"
        Work (line 2)
          Later (line 7)
        ");
    }

    #[test]
    fn test_check_output_when_clean() {
        let parsed = parse_board("- [ ] A\n").unwrap();
        assert_eq!(format_check(&check_board(&parsed)), vec!["No problems found."]);
    }

    #[test]
    fn test_task_json() {
        let parsed = parse_board(DOC).unwrap();
        let json = serde_json::to_value(task_to_json(&parsed.tasks[1])).unwrap();
        assert_eq!(json["title"], "Ship release");
        assert_eq!(json["status"], "in-progress");
        assert_eq!(json["path"], serde_json::json!(["Work"]));
        assert_eq!(json["metadata"][0]["key"], "priority");
        assert_eq!(json["start_line"], 3);
        assert_eq!(json["end_line"], 5);
    }
}
