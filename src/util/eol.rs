//! Line-ending aware split/join.
//!
//! Every text mutation goes through detect, split, edit, join. Split lines
//! never carry a `\r`.

/// Line-ending style of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// Style of the first line break in `text`; LF when there is none.
    pub fn detect(text: &str) -> LineEnding {
        match text.find('\n') {
            Some(idx) if text[..idx].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Split into lines with every line terminator removed.
///
/// A trailing newline yields a final empty element, so `join_lines` restores
/// it exactly.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

pub fn join_lines(lines: &[String], ending: LineEnding) -> String {
    lines.join(ending.as_str())
}
