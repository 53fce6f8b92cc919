//! Applies single-task edits to a board document.
//!
//! Every edit re-parses the text it is given, so line numbers always match
//! the exact snapshot being changed. Only the edited task's lines move;
//! all other bytes are kept. The document's line-ending style is detected
//! once per edit and used for every line written back.

use crate::model::config::BoardConfig;
use crate::model::edit::{NewTask, TaskEdit, TaskUpdate};
use crate::model::path::TaskPath;
use crate::model::task::{ParsedTask, STATUS_KEY, TaskId};
use crate::parse::board_parser::{ParseError, ParsedBoard, parse_board_with};
use crate::parse::line_editor::{LineEditor, indent_of};
use crate::util::eol::{LineEnding, join_lines, split_lines};

/// Error type for applying an edit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("heading not found: {0}")]
    HeadingNotFound(TaskPath),
    /// A blank title would write a checkbox line that no longer parses as a task
    #[error("task title must not be blank")]
    EmptyTitle,
}

/// Apply `edit` to `text` using built-in default settings
pub fn apply_edit(text: &str, edit: &TaskEdit) -> Result<String, SerializeError> {
    apply_edit_with(text, edit, &BoardConfig::default())
}

/// Apply `edit` to `text` and return the complete new document. The input
/// is never modified; on error nothing is returned.
pub fn apply_edit_with(
    text: &str,
    edit: &TaskEdit,
    base: &BoardConfig,
) -> Result<String, SerializeError> {
    let board = parse_board_with(text, base)?;
    let result = match edit {
        TaskEdit::Create(new) => create_task(text, &board, new),
        TaskEdit::Update(update) => update_task(text, &board, update, base),
        TaskEdit::Delete { id } => delete_task(text, &board, id),
    };
    match &result {
        Ok(_) => tracing::debug!(kind = edit.kind(), "applied edit"),
        Err(e) => tracing::debug!(kind = edit.kind(), error = %e, "edit rejected"),
    }
    result
}

/// A document split into lines, remembering its line-ending style
struct Document {
    lines: Vec<String>,
    ending: LineEnding,
}

impl Document {
    fn from_text(text: &str) -> Self {
        Document {
            lines: split_lines(text),
            ending: LineEnding::detect(text),
        }
    }

    fn to_text(&self) -> String {
        join_lines(&self.lines, self.ending)
    }

    /// 0-based index range for a task's 1-based inclusive line range
    fn task_range(task: &ParsedTask) -> std::ops::Range<usize> {
        task.start_line - 1..task.end_line
    }

    fn insert(&mut self, point: &InsertionPoint, mut block: Vec<String>) {
        if point.blank_after {
            block.push(String::new());
        }
        self.lines.splice(point.index..point.index, block);
    }
}

fn delete_task(text: &str, board: &ParsedBoard, id: &TaskId) -> Result<String, SerializeError> {
    let task = board
        .find_task(id)
        .ok_or_else(|| SerializeError::TaskNotFound(id.clone()))?;
    let mut doc = Document::from_text(text);
    doc.lines.drain(Document::task_range(task));
    Ok(doc.to_text())
}

fn create_task(text: &str, board: &ParsedBoard, new: &NewTask) -> Result<String, SerializeError> {
    let title = checked_title(&new.title)?;
    let mut doc = Document::from_text(text);
    let point = insertion_point(board, &new.path, &doc.lines)?;
    let block = render_new_task(new, &title, &board.settings, &point.indent);
    doc.insert(&point, block);
    Ok(doc.to_text())
}

fn update_task(
    text: &str,
    board: &ParsedBoard,
    update: &TaskUpdate,
    base: &BoardConfig,
) -> Result<String, SerializeError> {
    let task = board
        .find_task(&update.id)
        .ok_or_else(|| SerializeError::TaskNotFound(update.id.clone()))?;
    let title = update.title.as_deref().map(checked_title).transpose()?;
    let destination = update.path.as_ref().filter(|path| **path != task.path);
    if let Some(dest) = destination
        && !board.has_heading(dest)
    {
        return Err(SerializeError::HeadingNotFound(dest.clone()));
    }

    let mut doc = Document::from_text(text);
    let range = Document::task_range(task);
    let mut block = doc.lines[range.clone()].to_vec();
    edit_task_lines(&mut block, task, title.as_deref(), update, &board.settings);

    let Some(dest) = destination else {
        doc.lines.splice(range, block);
        return Ok(doc.to_text());
    };

    // Move: take the task out, then find where it goes in what is left.
    let start = range.start;
    doc.lines.drain(range);
    collapse_blank_pair(&mut doc.lines, start);
    let remaining = doc.to_text();
    let reparsed = parse_board_with(&remaining, base)?;
    let point = insertion_point(&reparsed, dest, &doc.lines)?;
    LineEditor::new(&mut block).reindent(&point.indent);
    doc.insert(&point, block);
    Ok(doc.to_text())
}

/// Title, status and metadata changes on a task's own lines
fn edit_task_lines(
    block: &mut Vec<String>,
    task: &ParsedTask,
    title: Option<&str>,
    update: &TaskUpdate,
    settings: &BoardConfig,
) {
    let mut editor = LineEditor::new(block);

    if let Some(title) = title {
        editor.replace_title(title);
    }

    if let Some(status) = &update.status
        && status != &task.status
    {
        if settings.sync_checkbox_with_done {
            editor.set_checked(settings.is_done(status));
        }
        editor.set_status(status.as_str());
    }

    if let Some(metadata) = &update.metadata {
        for key in task.metadata.keys() {
            if !metadata.contains_key(key) {
                editor.remove_metadata(key);
            }
        }
        for (key, value) in metadata.iter() {
            if value.trim().is_empty() {
                editor.remove_metadata(key);
            }
        }
        let mut cursor = None;
        for (key, value) in metadata.iter() {
            let value = value.trim();
            if value.is_empty() || key == STATUS_KEY {
                continue;
            }
            let existed = editor.find_metadata_line(key).is_some();
            let idx = editor.set_metadata(key, value, cursor);
            if !existed {
                cursor = Some(idx);
            }
        }
    }
}

fn render_new_task(
    new: &NewTask,
    title: &str,
    settings: &BoardConfig,
    indent: &str,
) -> Vec<String> {
    let mark = if settings.is_done(&new.status) { 'x' } else { ' ' };
    let mut block = vec![
        format!("{}- [{}] {}", indent, mark, title),
        format!("{}  - {}: {}", indent, STATUS_KEY, new.status),
    ];
    for (key, value) in new.metadata.iter() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        block.push(format!("{}  - {}: {}", indent, key, value));
    }
    block
}

/// Collapse a multi-line title onto one line
fn single_line(title: &str) -> String {
    title
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The title as it will be written, or `EmptyTitle` if nothing is left
fn checked_title(title: &str) -> Result<String, SerializeError> {
    let title = single_line(title);
    if title.is_empty() {
        return Err(SerializeError::EmptyTitle);
    }
    Ok(title)
}

/// After lines were removed at `at`, drop one of two blank lines that the
/// removal left adjacent. The trailing empty element of a final newline is
/// not a blank line.
fn collapse_blank_pair(lines: &mut Vec<String>, at: usize) {
    let blank = |idx: usize| lines.get(idx).is_some_and(|l| l.trim().is_empty());
    if at > 0 && at + 1 < lines.len() && blank(at - 1) && blank(at) {
        lines.remove(at);
    }
}

/// Where a new task's lines go
#[derive(Debug, Clone, PartialEq, Eq)]
struct InsertionPoint {
    /// 0-based line index to insert before
    index: usize,
    /// Indentation for the checkbox line
    indent: String,
    /// The next line is plain text and would otherwise be read as a lazy
    /// continuation of the inserted item
    blank_after: bool,
}

fn insertion_point(
    board: &ParsedBoard,
    path: &TaskPath,
    lines: &[String],
) -> Result<InsertionPoint, SerializeError> {
    if let Some(last) = board.tasks_under(path).last() {
        let indent = lines
            .get(last.start_line - 1)
            .map_or("", |l| indent_of(l))
            .to_string();
        return Ok(point_at(last.end_line, indent, lines));
    }

    if path.is_root() {
        let index = match board.headings.first() {
            Some(heading) => heading.line - 1,
            None => end_of_document(lines),
        };
        return Ok(point_at(index, String::new(), lines));
    }

    let heading = board
        .headings
        .iter()
        .find(|h| &h.path == path)
        .ok_or_else(|| SerializeError::HeadingNotFound(path.clone()))?;
    Ok(point_at(heading.end_line, String::new(), lines))
}

fn point_at(index: usize, indent: String, lines: &[String]) -> InsertionPoint {
    let index = index.min(lines.len());
    let blank_after = lines.get(index).is_some_and(|next| is_plain_text(next));
    InsertionPoint {
        index,
        indent,
        blank_after,
    }
}

/// Index just before the trailing empty element a final newline leaves
fn end_of_document(lines: &[String]) -> usize {
    match lines.last() {
        Some(last) if last.is_empty() => lines.len() - 1,
        _ => lines.len(),
    }
}

/// A non-blank line that does not open a block of its own
fn is_plain_text(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return false;
    }
    let opens_block = trimmed.starts_with('#')
        || trimmed.starts_with('>')
        || trimmed.starts_with("```")
        || trimmed.starts_with("~~~")
        || trimmed.starts_with('<')
        || trimmed.starts_with("- ")
        || trimmed.starts_with("* ")
        || trimmed.starts_with("+ ")
        || trimmed == "-"
        || trimmed.split_once(['.', ')']).is_some_and(|(n, rest)| {
            !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) && rest.starts_with(' ')
        });
    !opens_block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::status::Status;
    use crate::model::task::TaskMetadata;
    use crate::parse::board_parser::parse_board;
    use pretty_assertions::assert_eq;

    fn status(s: &str) -> Status {
        Status::new(s).unwrap()
    }

    fn id_of(text: &str, title: &str) -> TaskId {
        parse_board(text)
            .unwrap()
            .tasks
            .into_iter()
            .find(|t| t.title == title)
            .unwrap()
            .id
    }

    fn create(title: &str, path: TaskPath) -> TaskEdit {
        TaskEdit::Create(NewTask {
            title: title.to_string(),
            path,
            status: status("todo"),
            metadata: TaskMetadata::new(),
        })
    }

    #[test]
    fn test_delete_removes_whole_range() {
        let source = "- [ ] a\n  - due: x\n- [ ] b\n";
        let out = apply_edit(source, &TaskEdit::Delete { id: id_of(source, "a") }).unwrap();
        assert_eq!(out, "- [ ] b\n");
    }

    #[test]
    fn test_delete_twice_fails() {
        let source = "- [ ] a\n- [ ] b\n";
        let edit = TaskEdit::Delete { id: id_of(source, "a") };
        let once = apply_edit(source, &edit).unwrap();
        let err = apply_edit(&once, &edit).unwrap_err();
        assert!(matches!(err, SerializeError::TaskNotFound(_)));
    }

    #[test]
    fn test_update_title() {
        let source = "# A\n- [ ] old\n  - due: x\n- [ ] other\n";
        let update = TaskUpdate::new(id_of(source, "old")).with_title("new");
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "# A\n- [ ] new\n  - due: x\n- [ ] other\n");
    }

    #[test]
    fn test_update_status_toggles_checkbox_and_inserts_line() {
        let source = "- [ ] task\n  - due: x\n";
        let update = TaskUpdate::new(id_of(source, "task")).with_status(status("done"));
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "- [x] task\n  - status: done\n  - due: x\n");

        let update = TaskUpdate::new(id_of(&out, "task")).with_status(status("in-progress"));
        let out = apply_edit(&out, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "- [ ] task\n  - status: in-progress\n  - due: x\n");
    }

    #[test]
    fn test_noop_status_update_is_byte_identical() {
        let source = "- [X] shipped\n- [ ] open\n  - status:  review \n";
        for title in ["shipped", "open"] {
            let board = parse_board(source).unwrap();
            let task = board.tasks.iter().find(|t| t.title == title).unwrap();
            let update = TaskUpdate::new(task.id.clone()).with_status(task.status.clone());
            let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
            assert_eq!(out, source);
        }
    }

    #[test]
    fn test_sync_disabled_keeps_checkbox() {
        let source = "---\nboard:\n  syncCheckboxWithDone: false\n---\n- [ ] task\n";
        let update = TaskUpdate::new(id_of(source, "task")).with_status(status("done"));
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "---\nboard:\n  syncCheckboxWithDone: false\n---\n- [ ] task\n  - status: done\n");
    }

    #[test]
    fn test_update_metadata() {
        let source = "- [ ] t\n  - status: todo\n  - owner: sam\n  - due: soon\n";
        let metadata: TaskMetadata = [("due", "2025-02-01"), ("priority", "high"), ("tag", "")]
            .into_iter()
            .collect();
        let update = TaskUpdate::new(id_of(source, "t")).with_metadata(metadata);
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(
            out,
            "- [ ] t\n  - status: todo\n  - priority: high\n  - due: 2025-02-01\n"
        );
        let task = &parse_board(&out).unwrap().tasks[0];
        assert_eq!(task.metadata.get("priority"), Some("high"));
        assert!(!task.metadata.contains_key("owner"));
    }

    #[test]
    fn test_create_at_root_after_last_root_task() {
        let source = "- [ ] a\n\n# H\n- [ ] h\n";
        let out = apply_edit(source, &create("New", TaskPath::root())).unwrap();
        assert_eq!(out, "- [ ] a\n- [ ] New\n  - status: todo\n\n# H\n- [ ] h\n");
    }

    #[test]
    fn test_create_at_root_before_first_heading() {
        let source = "Intro text.\n\n# H\n";
        let out = apply_edit(source, &create("New", TaskPath::root())).unwrap();
        assert_eq!(out, "Intro text.\n\n- [ ] New\n  - status: todo\n# H\n");
    }

    #[test]
    fn test_create_at_root_in_empty_document() {
        let out = apply_edit("", &create("New", TaskPath::root())).unwrap();
        assert_eq!(out, "- [ ] New\n  - status: todo\n");
        let out = apply_edit("No newline", &create("New", TaskPath::root())).unwrap();
        assert_eq!(out, "No newline\n- [ ] New\n  - status: todo");
    }

    #[test]
    fn test_create_under_heading_without_tasks() {
        let source = "# A\nSection intro.\n## B\n- [ ] b\n";
        let out = apply_edit(source, &create("New", TaskPath::new(["A"]))).unwrap();
        assert_eq!(
            out,
            "# A\n- [ ] New\n  - status: todo\n\nSection intro.\n## B\n- [ ] b\n"
        );
        let board = parse_board(&out).unwrap();
        let new = board.tasks.iter().find(|t| t.title == "New").unwrap();
        assert_eq!(new.path, TaskPath::new(["A"]));
        assert_eq!(new.status.as_str(), "todo");
    }

    #[test]
    fn test_create_under_heading_after_existing_tasks() {
        let source = "# A\n  - [ ] nested style\n    - due: x\n# B\n";
        let out = apply_edit(source, &create("New", TaskPath::new(["A"]))).unwrap();
        assert_eq!(
            out,
            "# A\n  - [ ] nested style\n    - due: x\n  - [ ] New\n    - status: todo\n# B\n"
        );
    }

    #[test]
    fn test_create_done_with_metadata() {
        let metadata: TaskMetadata = [("priority", "low"), ("empty", " ")].into_iter().collect();
        let edit = TaskEdit::Create(NewTask {
            title: "Finished".into(),
            path: TaskPath::root(),
            status: status("done"),
            metadata,
        });
        let out = apply_edit("", &edit).unwrap();
        assert_eq!(out, "- [x] Finished\n  - status: done\n  - priority: low\n");
    }

    #[test]
    fn test_create_under_missing_heading() {
        let err = apply_edit("# A\n", &create("New", TaskPath::new(["Nope"]))).unwrap_err();
        assert_eq!(err, SerializeError::HeadingNotFound(TaskPath::new(["Nope"])));
    }

    #[test]
    fn test_move_between_headings() {
        let source = "# A\n- [ ] mover\n  - due: x\n- [ ] stay\n# B\n- [ ] b1\n";
        let update = TaskUpdate::new(id_of(source, "mover"))
            .with_path(TaskPath::new(["B"]))
            .with_title("moved");
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "# A\n- [ ] stay\n# B\n- [ ] b1\n- [ ] moved\n  - due: x\n");
    }

    #[test]
    fn test_move_reindents_to_destination() {
        let source = "# A\n- Group\n  - [ ] deep\n    - due: x\n# B\n";
        let update = TaskUpdate::new(id_of(source, "deep")).with_path(TaskPath::new(["B"]));
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "# A\n- Group\n# B\n- [ ] deep\n  - due: x\n");
    }

    #[test]
    fn test_move_to_missing_heading() {
        let source = "# A\n- [ ] t\n";
        let update = TaskUpdate::new(id_of(source, "t")).with_path(TaskPath::new(["NoSuchHeading"]));
        let err = apply_edit(source, &TaskEdit::Update(update)).unwrap_err();
        assert!(matches!(err, SerializeError::HeadingNotFound(_)));
    }

    #[test]
    fn test_same_path_is_not_a_move() {
        let source = "# A\n- [ ] one\n- [ ] two\n";
        let update = TaskUpdate::new(id_of(source, "one")).with_path(TaskPath::new(["A"]));
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_crlf_preserved() {
        let source = "# A\r\n- [ ] one\r\n- [ ] two\r\n";
        let update = TaskUpdate::new(id_of(source, "one")).with_status(status("done"));
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "# A\r\n- [x] one\r\n  - status: done\r\n- [ ] two\r\n");

        let out = apply_edit(&out, &create("three", TaskPath::new(["A"]))).unwrap();
        assert!(!out.replace("\r\n", "").contains(['\r', '\n']));
    }

    #[test]
    fn test_repeated_metadata_key_edit_takes_effect() {
        let source = "- [ ] t\n  - due: a\n  - due: b\n";
        let metadata: TaskMetadata = [("due", "c")].into_iter().collect();
        let update = TaskUpdate::new(id_of(source, "t")).with_metadata(metadata);
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "- [ ] t\n  - due: c\n  - due: b\n");
        assert_eq!(parse_board(&out).unwrap().tasks[0].metadata.get("due"), Some("c"));
    }

    #[test]
    fn test_repeated_status_line_edit_takes_effect() {
        let source = "- [ ] t\n  - status: a\n  - status: b\n";
        let update = TaskUpdate::new(id_of(source, "t")).with_status(status("c"));
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "- [ ] t\n  - status: c\n  - status: b\n");
        assert_eq!(parse_board(&out).unwrap().tasks[0].status.as_str(), "c");
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let err = apply_edit("# A\n", &create("  ", TaskPath::new(["A"]))).unwrap_err();
        assert_eq!(err, SerializeError::EmptyTitle);

        let source = "- [ ] keep me\n";
        let update = TaskUpdate::new(id_of(source, "keep me")).with_title("\n \n");
        let err = apply_edit(source, &TaskEdit::Update(update)).unwrap_err();
        assert_eq!(err, SerializeError::EmptyTitle);
    }

    #[test]
    fn test_move_collapses_doubled_blank_line() {
        let source = "# A\n\n- [ ] a\n\n  desc para\n\n- [ ] b\n# B\n";
        let update = TaskUpdate::new(id_of(source, "a")).with_path(TaskPath::new(["B"]));
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "# A\n\n- [ ] b\n# B\n- [ ] a\n\n  desc para\n");
    }

    #[test]
    fn test_move_keeps_single_blank_line() {
        let source = "# A\n\n- [ ] a\n- [ ] b\n\n# B\n";
        let update = TaskUpdate::new(id_of(source, "a")).with_path(TaskPath::new(["B"]));
        let out = apply_edit(source, &TaskEdit::Update(update)).unwrap();
        assert_eq!(out, "# A\n\n- [ ] b\n\n# B\n- [ ] a\n");
    }

    #[test]
    fn test_is_plain_text() {
        assert!(is_plain_text("Some words"));
        assert!(is_plain_text("2025 was a year"));
        assert!(!is_plain_text(""));
        assert!(!is_plain_text("## Heading"));
        assert!(!is_plain_text("- item"));
        assert!(!is_plain_text("12. item"));
    }
}
