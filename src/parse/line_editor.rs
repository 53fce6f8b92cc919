//! In-place edits on the lines of a single task: its checkbox line plus the
//! child lines below it. Never sees lines outside that slice.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::task::STATUS_KEY;
use crate::parse::board_parser::split_key_value;

/// `- [ ] title`, `* [x] title`, `1. [X] title` at any indentation
static TASK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<lead>[ \t]*(?:[-*+]|\d{1,9}[.)])[ \t]+)\[(?P<mark>[ xX])\](?P<rest>.*)$")
        .expect("task line pattern is valid")
});

/// Any list item line
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)(?:[-*+]|\d{1,9}[.)])(?:[ \t]+(?P<body>.*))?$")
        .expect("list item pattern is valid")
});

/// Leading whitespace of `line`
pub fn indent_of(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// Mutable view over one task's lines. Index 0 is the checkbox line.
pub struct LineEditor<'a> {
    lines: &'a mut Vec<String>,
}

impl<'a> LineEditor<'a> {
    pub fn new(lines: &'a mut Vec<String>) -> Self {
        LineEditor { lines }
    }

    /// Replace the title text after the checkbox marker. Indentation, bullet
    /// and marker are kept; wrapped continuation lines of the old title are
    /// dropped. Returns false if the first line is not a task line.
    pub fn replace_title(&mut self, title: &str) -> bool {
        let Some(first) = self.lines.first() else {
            return false;
        };
        let Some(caps) = TASK_LINE.captures(first) else {
            return false;
        };
        let current = caps.name("rest").map_or("", |m| m.as_str());
        let continuation = self.title_continuation_end();
        if current.trim() == title && continuation == 1 {
            return true;
        }

        let head_end = caps.name("rest").map_or(first.len(), |m| m.start());
        let rebuilt = format!("{} {}", &first[..head_end], title);
        self.lines[0] = rebuilt;
        self.lines.drain(1..continuation);
        true
    }

    /// Set the checkbox to checked/unchecked. A marker already in the wanted
    /// state is left as written (`[X]` stays `[X]`).
    pub fn set_checked(&mut self, checked: bool) {
        let Some(first) = self.lines.first() else {
            return;
        };
        let Some(mark) = TASK_LINE.captures(first).and_then(|c| c.name("mark")) else {
            return;
        };
        let is_checked = mark.as_str() != " ";
        if is_checked == checked {
            return;
        }
        let replacement = if checked { "x" } else { " " };
        let mut line = first.clone();
        line.replace_range(mark.range(), replacement);
        self.lines[0] = line;
    }

    pub fn is_checked(&self) -> Option<bool> {
        let first = self.lines.first()?;
        let mark = TASK_LINE.captures(first)?.name("mark")?;
        Some(mark.as_str() != " ")
    }

    /// Index of the `- status: ...` child line, if any
    pub fn find_status_line(&self) -> Option<usize> {
        self.find_metadata_line(STATUS_KEY)
    }

    /// Index of the first direct child line of the form `- <key>: ...`
    pub fn find_metadata_line(&self, key: &str) -> Option<usize> {
        self.child_entries()
            .into_iter()
            .find(|(_, k)| k == key)
            .map(|(idx, _)| idx)
    }

    /// Write `value` into the status child line, inserting one right after
    /// the title if there is none. Returns true if a line changed.
    pub fn set_status(&mut self, value: &str) -> bool {
        match self.find_status_line() {
            Some(idx) => self.overwrite_value(idx, value),
            None => {
                let at = self.title_continuation_end();
                let line = self.child_line(STATUS_KEY, value);
                self.lines.insert(at, line);
                true
            }
        }
    }

    /// Overwrite an existing metadata line or insert a new one. New lines go
    /// after the status line, or become the first child when there is none.
    /// `after` pushes the insertion point past lines inserted earlier in the
    /// same edit, keeping their order.
    pub fn set_metadata(&mut self, key: &str, value: &str, after: Option<usize>) -> usize {
        if let Some(idx) = self.find_metadata_line(key) {
            self.overwrite_value(idx, value);
            return idx;
        }
        let anchor = match after {
            Some(idx) => idx + 1,
            None => match self.find_status_line() {
                Some(idx) => self.entry_end(idx),
                None => self.title_continuation_end(),
            },
        };
        let line = self.child_line(key, value);
        self.lines.insert(anchor, line);
        anchor
    }

    /// Remove every child line for `key`, with anything nested below it.
    /// Returns the number of lines removed.
    pub fn remove_metadata(&mut self, key: &str) -> usize {
        let mut removed = 0;
        while let Some(idx) = self.find_metadata_line(key) {
            let end = self.entry_end(idx);
            self.lines.drain(idx..end);
            removed += end - idx;
        }
        removed
    }

    /// Shift the whole slice so the checkbox line starts at `indent`
    pub fn reindent(&mut self, indent: &str) {
        let Some(first) = self.lines.first() else {
            return;
        };
        let current = indent_of(first).len();
        for line in self.lines.iter_mut() {
            if line.trim().is_empty() {
                continue;
            }
            let strip = indent_of(line).len().min(current);
            *line = format!("{}{}", indent, &line[strip..]);
        }
    }

    /// Indentation used for direct child lines: taken from the first
    /// existing child item, else aligned with the title text.
    pub fn child_indent(&self) -> String {
        if let Some(child) = self
            .lines
            .iter()
            .skip(1)
            .filter_map(|l| LIST_ITEM.captures(l))
            .find_map(|c| c.name("indent"))
        {
            return child.as_str().to_string();
        }
        let lead = self
            .lines
            .first()
            .and_then(|l| TASK_LINE.captures(l))
            .and_then(|c| c.name("lead"))
            .map_or(2, |m| m.as_str().len());
        " ".repeat(lead)
    }

    /// One past the last line of the title paragraph (checkbox line plus
    /// wrapped continuation lines)
    fn title_continuation_end(&self) -> usize {
        let mut idx = 1;
        while idx < self.lines.len() {
            let line = &self.lines[idx];
            if line.trim().is_empty() || LIST_ITEM.is_match(line) {
                break;
            }
            idx += 1;
        }
        idx.min(self.lines.len())
    }

    /// `(index, key)` for every direct child line shaped like `- key: value`
    fn child_entries(&self) -> Vec<(usize, String)> {
        let indent = self.child_indent();
        self.lines
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(idx, line)| {
                let caps = LIST_ITEM.captures(line)?;
                if caps.name("indent")?.as_str() != indent {
                    return None;
                }
                let body = caps.name("body")?.as_str();
                if body.starts_with("[ ]") || body.starts_with("[x]") || body.starts_with("[X]") {
                    return None;
                }
                let (key, _) = split_key_value(body)?;
                Some((idx, key.to_string()))
            })
            .collect()
    }

    /// One past the last line belonging to the child entry at `idx`
    fn entry_end(&self, idx: usize) -> usize {
        let depth = indent_of(&self.lines[idx]).len();
        let mut end = idx + 1;
        while end < self.lines.len() {
            let line = &self.lines[end];
            if line.trim().is_empty() || indent_of(line).len() <= depth {
                break;
            }
            end += 1;
        }
        end
    }

    fn overwrite_value(&mut self, idx: usize, value: &str) -> bool {
        let line = &self.lines[idx];
        let Some(colon) = line.find(':') else {
            return false;
        };
        if line[colon + 1..].trim() == value {
            return false;
        }
        let rebuilt = format!("{} {}", &line[..=colon], value);
        self.lines[idx] = rebuilt;
        true
    }

    fn child_line(&self, key: &str, value: &str) -> String {
        format!("{}- {}: {}", self.child_indent(), key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_replace_title_keeps_marker_and_indent() {
        let mut buf = lines("    * [X] Old title");
        assert!(LineEditor::new(&mut buf).replace_title("New title"));
        assert_eq!(buf, vec!["    * [X] New title"]);
    }

    #[test]
    fn test_replace_title_same_text_is_untouched() {
        let mut buf = lines("- [ ] Same  ");
        LineEditor::new(&mut buf).replace_title("Same");
        assert_eq!(buf, vec!["- [ ] Same  "]);
    }

    #[test]
    fn test_replace_title_drops_wrapped_lines() {
        let mut buf = lines("- [ ] Old title\n  wrapped onto two lines\n  - due: 2025-01-01");
        LineEditor::new(&mut buf).replace_title("Short");
        assert_eq!(buf, vec!["- [ ] Short", "  - due: 2025-01-01"]);
    }

    #[test]
    fn test_replace_title_rejects_non_task_line() {
        let mut buf = lines("- plain bullet");
        assert!(!LineEditor::new(&mut buf).replace_title("x"));
        assert_eq!(buf, vec!["- plain bullet"]);
    }

    #[test]
    fn test_set_checked() {
        let mut buf = lines("1. [ ] numbered");
        let mut editor = LineEditor::new(&mut buf);
        editor.set_checked(true);
        assert_eq!(editor.is_checked(), Some(true));
        assert_eq!(buf, vec!["1. [x] numbered"]);

        let mut buf = lines("- [X] upper");
        LineEditor::new(&mut buf).set_checked(true);
        assert_eq!(buf, vec!["- [X] upper"]);
        LineEditor::new(&mut buf).set_checked(false);
        assert_eq!(buf, vec!["- [ ] upper"]);
    }

    #[test]
    fn test_find_lines() {
        let mut buf = lines("- [ ] t\n  - priority: high\n  - status: doing\n    - status: nested");
        let editor = LineEditor::new(&mut buf);
        assert_eq!(editor.find_status_line(), Some(2));
        assert_eq!(editor.find_metadata_line("priority"), Some(1));
        assert_eq!(editor.find_metadata_line("due"), None);
    }

    #[test]
    fn test_set_status_overwrites_in_place() {
        let mut buf = lines("- [ ] t\n    - status:   todo");
        assert!(LineEditor::new(&mut buf).set_status("done"));
        assert_eq!(buf, vec!["- [ ] t", "    - status: done"]);
        assert!(!LineEditor::new(&mut buf).set_status("done"));
    }

    #[test]
    fn test_set_status_inserts_first_child() {
        let mut buf = lines("  - [ ] t\n    - due: soon");
        LineEditor::new(&mut buf).set_status("doing");
        assert_eq!(buf, vec!["  - [ ] t", "    - status: doing", "    - due: soon"]);
    }

    #[test]
    fn test_set_metadata_inserts_after_status_in_order() {
        let mut buf = lines("- [ ] t\n  - status: todo\n  - owner: sam");
        let mut editor = LineEditor::new(&mut buf);
        let first = editor.set_metadata("priority", "high", None);
        editor.set_metadata("due", "2025-01-15", Some(first));
        editor.set_metadata("owner", "kim", None);
        assert_eq!(
            buf,
            vec![
                "- [ ] t",
                "  - status: todo",
                "  - priority: high",
                "  - due: 2025-01-15",
                "  - owner: kim",
            ]
        );
    }

    #[test]
    fn test_set_metadata_without_children_uses_title_alignment() {
        let mut buf = lines("10. [ ] numbered");
        LineEditor::new(&mut buf).set_metadata("due", "today", None);
        assert_eq!(buf, vec!["10. [ ] numbered", "    - due: today"]);
    }

    #[test]
    fn test_remove_metadata_takes_nested_lines() {
        let mut buf = lines("- [ ] t\n  - note: a\n    more note\n  - due: x");
        let removed = LineEditor::new(&mut buf).remove_metadata("note");
        assert_eq!(removed, 2);
        assert_eq!(buf, vec!["- [ ] t", "  - due: x"]);
    }

    #[test]
    fn test_reindent() {
        let mut buf = lines("    - [ ] t\n      - due: x");
        LineEditor::new(&mut buf).reindent("");
        assert_eq!(buf, vec!["- [ ] t", "  - due: x"]);
    }
}
