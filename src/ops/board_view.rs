use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::config::{BoardConfig, SortBy};
use crate::model::path::TaskPath;
use crate::model::task::ParsedTask;
use crate::parse::ParsedBoard;

pub const PRIORITY_KEY: &str = "priority";
pub const DUE_KEY: &str = "due";
pub const DUE_FORMAT: &str = "%Y-%m-%d";

/// Named priorities, most urgent first
const PRIORITY_NAMES: &[&str] = &["critical", "high", "medium", "low"];

/// Tasks grouped into status columns, ready for display
#[derive(Debug, Serialize)]
pub struct BoardView<'a> {
    pub columns: Vec<Column<'a>>,
    pub sort_by: SortBy,
}

#[derive(Debug, Serialize)]
pub struct Column<'a> {
    pub status: String,
    /// False for statuses found in the document but missing from the configured list
    pub known: bool,
    pub tasks: Vec<&'a ParsedTask>,
}

impl<'a> BoardView<'a> {
    pub fn column(&self, status: &str) -> Option<&Column<'a>> {
        self.columns.iter().find(|c| c.status == status)
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }
}

/// Project a parsed board into columns.
///
/// One column per configured status in order, then one per unknown status in
/// the order it was first seen. Tasks outside `filter_paths` are left out.
pub fn build_board<'a>(parsed: &'a ParsedBoard, config: &BoardConfig) -> BoardView<'a> {
    let filters = config.filter_paths();

    let mut columns: Vec<Column<'a>> = config
        .statuses
        .iter()
        .map(|s| Column {
            status: s.clone(),
            known: true,
            tasks: Vec::new(),
        })
        .collect();

    for task in parsed.tasks.iter().filter(|t| passes_filter(&t.path, &filters)) {
        let status = task.status.as_str();
        match columns.iter_mut().find(|c| c.status == status) {
            Some(column) => column.tasks.push(task),
            None => columns.push(Column {
                status: status.to_string(),
                known: false,
                tasks: vec![task],
            }),
        }
    }

    for column in &mut columns {
        sort_tasks(&mut column.tasks, config.sort_by);
    }

    BoardView {
        columns,
        sort_by: config.sort_by,
    }
}

/// A task passes if its path equals or descends from any filter path.
/// An empty filter list passes everything.
pub fn passes_filter(path: &TaskPath, filters: &[TaskPath]) -> bool {
    filters.is_empty() || filters.iter().any(|f| path.starts_with(f))
}

/// Stable sort, so ties keep source order
pub fn sort_tasks(tasks: &mut [&ParsedTask], sort_by: SortBy) {
    match sort_by {
        SortBy::Markdown => {}
        SortBy::Priority => tasks.sort_by(|a, b| {
            compare_priority(a.metadata.get(PRIORITY_KEY), b.metadata.get(PRIORITY_KEY))
        }),
        SortBy::Due => tasks.sort_by(|a, b| {
            compare_due(
                a.metadata.get(DUE_KEY).and_then(parse_due),
                b.metadata.get(DUE_KEY).and_then(parse_due),
            )
        }),
        SortBy::Alphabetical => {
            tasks.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        }
    }
}

/// Parse a `due` value as a calendar date
pub fn parse_due(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DUE_FORMAT).ok()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PriorityRank {
    Numeric(f64),
    Named(usize),
    Unranked,
}

fn priority_rank(value: Option<&str>) -> PriorityRank {
    let Some(value) = value.map(str::trim) else {
        return PriorityRank::Unranked;
    };
    if let Ok(n) = value.parse::<f64>()
        && n.is_finite()
    {
        return PriorityRank::Numeric(n);
    }
    let lower = value.to_ascii_lowercase();
    match PRIORITY_NAMES.iter().position(|name| *name == lower) {
        Some(i) => PriorityRank::Named(i),
        None => PriorityRank::Unranked,
    }
}

fn compare_priority(a: Option<&str>, b: Option<&str>) -> Ordering {
    use PriorityRank::*;
    match (priority_rank(a), priority_rank(b)) {
        (Numeric(x), Numeric(y)) => x.total_cmp(&y),
        (Numeric(_), _) => Ordering::Less,
        (_, Numeric(_)) => Ordering::Greater,
        (Named(x), Named(y)) => x.cmp(&y),
        (Named(_), Unranked) => Ordering::Less,
        (Unranked, Named(_)) => Ordering::Greater,
        (Unranked, Unranked) => Ordering::Equal,
    }
}

fn compare_due(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_board;
    use pretty_assertions::assert_eq;

    fn titles(view: &BoardView, status: &str) -> Vec<String> {
        view.column(status)
            .map(|c| c.tasks.iter().map(|t| t.title.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_columns_follow_configured_statuses() {
        let doc = "\
- [ ] A
- [ ] B
  - status: in-progress
- [x] C
";
        let parsed = parse_board(doc).unwrap();
        let view = build_board(&parsed, &parsed.settings);
        let names: Vec<&str> = view.columns.iter().map(|c| c.status.as_str()).collect();
        assert_eq!(names, vec!["todo", "in-progress", "done"]);
        assert_eq!(titles(&view, "todo"), vec!["A"]);
        assert_eq!(titles(&view, "in-progress"), vec!["B"]);
        assert_eq!(titles(&view, "done"), vec!["C"]);
        assert_eq!(view.task_count(), 3);
    }

    #[test]
    fn test_unknown_statuses_get_trailing_columns() {
        let doc = "\
- [ ] A
  - status: blocked
- [ ] B
  - status: review
- [ ] C
  - status: blocked
";
        let parsed = parse_board(doc).unwrap();
        let view = build_board(&parsed, &parsed.settings);
        let names: Vec<&str> = view.columns.iter().map(|c| c.status.as_str()).collect();
        assert_eq!(names, vec!["todo", "in-progress", "done", "blocked", "review"]);
        let blocked = view.column("blocked").unwrap();
        assert!(!blocked.known);
        assert_eq!(titles(&view, "blocked"), vec!["A", "C"]);
    }

    #[test]
    fn test_filter_paths_from_frontmatter() {
        let doc = "\
---
board:
  filterPaths: [Work]
---
- [ ] Loose
# Work
- [ ] Ship
## Later
- [ ] Plan
# Home
- [ ] Dishes
";
        let parsed = parse_board(doc).unwrap();
        let view = build_board(&parsed, &parsed.settings);
        assert_eq!(titles(&view, "todo"), vec!["Ship", "Plan"]);
    }

    #[test]
    fn test_filter_does_not_match_sibling_prefix() {
        let path = TaskPath::new(["Workshop"]);
        assert!(!passes_filter(&path, &[TaskPath::new(["Work"])]));
        assert!(passes_filter(&path, &[]));
        assert!(passes_filter(&path, &[TaskPath::root()]));
    }

    #[test]
    fn test_sort_by_priority() {
        let doc = "\
---
board:
  sortBy: priority
---
- [ ] none
- [ ] low
  - priority: low
- [ ] two
  - priority: 2
- [ ] critical
  - priority: Critical
- [ ] one
  - priority: 1
- [ ] weird
  - priority: someday
- [ ] high
  - priority: high
";
        let parsed = parse_board(doc).unwrap();
        let view = build_board(&parsed, &parsed.settings);
        assert_eq!(
            titles(&view, "todo"),
            vec!["one", "two", "critical", "high", "low", "none", "weird"]
        );
    }

    #[test]
    fn test_sort_by_due_puts_invalid_last() {
        let doc = "\
---
board:
  sortBy: due
---
- [ ] late
  - due: 2025-03-01
- [ ] none
- [ ] bad
  - due: next week
- [ ] early
  - due: 2024-12-31
";
        let parsed = parse_board(doc).unwrap();
        let view = build_board(&parsed, &parsed.settings);
        assert_eq!(titles(&view, "todo"), vec!["early", "late", "none", "bad"]);
    }

    #[test]
    fn test_sort_alphabetical_is_case_insensitive() {
        let doc = "- [ ] banana\n- [ ] Apple\n- [ ] cherry\n";
        let parsed = parse_board(doc).unwrap();
        let mut config = parsed.settings.clone();
        config.sort_by = SortBy::Alphabetical;
        let view = build_board(&parsed, &config);
        assert_eq!(titles(&view, "todo"), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_markdown_sort_keeps_source_order() {
        let doc = "- [ ] z\n- [ ] a\n- [ ] m\n";
        let parsed = parse_board(doc).unwrap();
        let view = build_board(&parsed, &parsed.settings);
        assert_eq!(titles(&view, "todo"), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_parse_due() {
        assert_eq!(parse_due(" 2024-02-29 "), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_due("2023-02-29"), None);
        assert_eq!(parse_due("tomorrow"), None);
    }
}
