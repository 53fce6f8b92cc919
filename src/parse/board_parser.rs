use std::fmt;

use indexmap::IndexMap;

use crate::model::config::{BoardConfig, FrontmatterConfig};
use crate::model::path::TaskPath;
use crate::model::status::Status;
use crate::model::task::{ParsedTask, STATUS_KEY, TaskId, TaskMetadata};
use crate::parse::block_tree::{Block, ListItem, build_block_tree};
use crate::parse::frontmatter::{read_config, split_frontmatter};
use crate::parse::span::LineIndex;

/// Error type for parsing a board document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("markdown parse failed: {0}")]
    Markdown(String),
}

/// Advisory problems found while parsing. Never block an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// Several tasks share one id (same title under the same path)
    DuplicateTask {
        title: String,
        path: TaskPath,
        lines: Vec<usize>,
    },
    /// The frontmatter block is not valid YAML; its settings were ignored
    InvalidFrontmatter { message: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::DuplicateTask { title, path, lines } => {
                let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
                write!(
                    f,
                    "duplicate task \"{}\" under {} at lines {}",
                    title,
                    path,
                    lines.join(", ")
                )
            }
            ParseWarning::InvalidFrontmatter { message } => {
                write!(f, "ignoring invalid frontmatter: {}", message)
            }
        }
    }
}

/// A heading seen in the document, with the path it opens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub path: TaskPath,
    pub level: u8,
    /// 1-based, whole-document coordinates
    pub line: usize,
    /// Last line of the heading; differs from `line` for setext headings
    pub end_line: usize,
}

/// Everything derived from one parse of a document
#[derive(Debug, Clone)]
pub struct ParsedBoard {
    /// Tasks in document order
    pub tasks: Vec<ParsedTask>,
    /// Headings in document order
    pub headings: Vec<Heading>,
    pub warnings: Vec<ParseWarning>,
    /// Settings read from frontmatter, if the document has any
    pub config: Option<FrontmatterConfig>,
    /// Base configuration with the frontmatter settings applied
    pub settings: BoardConfig,
}

impl ParsedBoard {
    /// First task with the given id, in document order
    pub fn find_task(&self, id: &TaskId) -> Option<&ParsedTask> {
        let mut matches = self.tasks.iter().filter(|t| &t.id == id);
        let first = matches.next()?;
        if matches.next().is_some() {
            tracing::warn!(
                task = %id,
                title = %first.title,
                line = first.start_line,
                "task id is ambiguous; using the first match"
            );
        }
        Some(first)
    }

    /// True if `path` names a heading in the document. The root always exists.
    pub fn has_heading(&self, path: &TaskPath) -> bool {
        path.is_root() || self.headings.iter().any(|h| &h.path == path)
    }

    pub fn heading_paths(&self) -> impl Iterator<Item = &TaskPath> {
        self.headings.iter().map(|h| &h.path)
    }

    pub fn tasks_under<'a>(&'a self, path: &'a TaskPath) -> impl Iterator<Item = &'a ParsedTask> {
        self.tasks.iter().filter(move |t| &t.path == path)
    }
}

/// Parse a board document with built-in default settings
pub fn parse_board(text: &str) -> Result<ParsedBoard, ParseError> {
    parse_board_with(text, &BoardConfig::default())
}

/// Parse a board document. Settings in the document's frontmatter are
/// applied on top of `base`.
pub fn parse_board_with(text: &str, base: &BoardConfig) -> Result<ParsedBoard, ParseError> {
    let mut warnings = Vec::new();
    let (body, line_offset, config) = match split_frontmatter(text) {
        Some(fm) => match read_config(fm.yaml) {
            Ok(config) => (fm.body, fm.line_count, config),
            Err(e) => {
                warnings.push(ParseWarning::InvalidFrontmatter {
                    message: e.to_string(),
                });
                (fm.body, fm.line_count, None)
            }
        },
        None => (text, 0, None),
    };
    let settings = match &config {
        Some(fm) => base.overlay(fm),
        None => base.clone(),
    };

    let blocks = build_block_tree(body)?;
    let ctx = Walk {
        source: body,
        lines: LineIndex::new(body),
        line_offset,
        settings: &settings,
    };

    let mut stack: Vec<(u8, String)> = Vec::new();
    let mut tasks = Vec::new();
    let mut headings = Vec::new();
    walk_blocks(&ctx, &blocks, &mut stack, &mut tasks, &mut headings);

    warnings.extend(find_duplicates(&tasks));
    tracing::debug!(
        tasks = tasks.len(),
        headings = headings.len(),
        warnings = warnings.len(),
        "parsed board"
    );

    Ok(ParsedBoard {
        tasks,
        headings,
        warnings,
        config,
        settings,
    })
}

/// Read-only context shared by the whole walk
struct Walk<'a> {
    source: &'a str,
    lines: LineIndex,
    line_offset: usize,
    settings: &'a BoardConfig,
}

impl Walk<'_> {
    fn text(&self, span: &std::ops::Range<usize>) -> &str {
        self.source.get(span.clone()).unwrap_or("")
    }

    fn lines_of(&self, span: &std::ops::Range<usize>) -> (usize, usize) {
        let (start, end) = self.lines.line_range(self.source, span);
        (start + self.line_offset, end + self.line_offset)
    }
}

fn stack_path(stack: &[(u8, String)]) -> TaskPath {
    TaskPath::new(stack.iter().map(|(_, text)| text.clone()))
}

/// Walk top-level blocks in order, maintaining the heading stack
fn walk_blocks(
    ctx: &Walk<'_>,
    blocks: &[Block],
    stack: &mut Vec<(u8, String)>,
    tasks: &mut Vec<ParsedTask>,
    headings: &mut Vec<Heading>,
) {
    for block in blocks {
        match block {
            Block::Heading { level, span } => {
                while stack.last().is_some_and(|(l, _)| *l >= *level) {
                    stack.pop();
                }
                stack.push((*level, heading_text(ctx.text(span))));
                let (line, end_line) = ctx.lines_of(span);
                headings.push(Heading {
                    path: stack_path(stack),
                    level: *level,
                    line,
                    end_line,
                });
            }
            Block::List { items, .. } => {
                let path = stack_path(stack);
                walk_list(ctx, items, &path, tasks);
            }
            // Quoted and fenced content never yields tasks
            Block::BlockQuote { .. }
            | Block::Code { .. }
            | Block::Paragraph { .. }
            | Block::Other { .. } => {}
        }
    }
}

fn walk_list(ctx: &Walk<'_>, items: &[ListItem], path: &TaskPath, tasks: &mut Vec<ParsedTask>) {
    for item in items {
        if item.checkbox.is_some() {
            if let Some(task) = extract_task(ctx, item, path) {
                tasks.push(task);
            }
            continue;
        }
        for nested in item.nested_lists() {
            walk_list(ctx, nested, path, tasks);
        }
    }
}

fn extract_task(ctx: &Walk<'_>, item: &ListItem, path: &TaskPath) -> Option<ParsedTask> {
    let para = item.first_paragraph()?;
    let start = item
        .marker
        .as_ref()
        .map_or(para.start, |marker| marker.start.min(para.start));
    let title = normalize_title(strip_checkbox(ctx.text(&(start..para.end))));
    if title.is_empty() {
        return None;
    }

    let mut metadata = TaskMetadata::new();
    let mut explicit_status = None;
    for children in item.nested_lists() {
        for child in children {
            if child.checkbox.is_some() {
                continue;
            }
            let Some(span) = child.first_paragraph() else {
                continue;
            };
            let Some((key, value)) = split_key_value(ctx.text(span)) else {
                continue;
            };
            // A repeated key keeps its first value: that is the line edits rewrite
            if key == STATUS_KEY {
                if explicit_status.is_none()
                    && let Ok(status) = Status::new(value)
                {
                    explicit_status = Some(status);
                }
            } else if !metadata.contains_key(key) {
                metadata.insert(key, value);
            }
        }
    }

    let is_checked = item.checkbox == Some(true);
    let status = explicit_status.unwrap_or_else(|| {
        if is_checked {
            ctx.settings.done_status()
        } else {
            ctx.settings.open_status()
        }
    });
    let (start_line, end_line) = ctx.lines_of(&item.span);

    Some(ParsedTask {
        id: TaskId::generate(path, &title),
        title,
        status,
        path: path.clone(),
        is_checked,
        metadata,
        start_line,
        end_line,
    })
}

/// Remove a leading `[ ]` / `[x]` / `[X]` marker and the space after it
fn strip_checkbox(raw: &str) -> &str {
    let trimmed = raw.trim_start();
    for marker in ["[ ]", "[x]", "[X]"] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return rest;
        }
    }
    trimmed
}

/// Trim each source line of a (possibly wrapped) title and rejoin with `\n`,
/// so the same title yields the same id under LF and CRLF.
fn normalize_title(raw: &str) -> String {
    raw.trim()
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split `key: value` at the first colon. The key must be non-empty and on
/// one line.
pub(crate) fn split_key_value(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || key.contains('\n') {
        return None;
    }
    Some((key, value.trim()))
}

/// Text of a heading from its source: ATX markers and closing hashes
/// removed, or the text lines of a setext heading joined by single spaces.
/// Inline markup is kept verbatim, so `# **Work**` is the segment `**Work**`.
pub(crate) fn heading_text(raw: &str) -> String {
    let first = raw.lines().next().unwrap_or("").trim();
    let Some(after) = first.strip_prefix('#') else {
        return setext_text(raw);
    };
    let content = after.trim_start_matches('#');
    let content = content.trim();
    // Closing sequence: a run of `#` preceded by whitespace (or nothing else)
    let without_closing = content.trim_end_matches('#');
    if without_closing.len() == content.len() {
        return content.to_string();
    }
    if without_closing.is_empty() {
        return String::new();
    }
    if without_closing.ends_with([' ', '\t']) {
        return without_closing.trim_end().to_string();
    }
    content.to_string()
}

fn setext_text(raw: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().map(str::trim).collect();
    let is_underline = |line: &str| {
        !line.is_empty() && (line.chars().all(|c| c == '=') || line.chars().all(|c| c == '-'))
    };
    if lines.len() > 1 && lines.last().is_some_and(|l| is_underline(l)) {
        lines.pop();
    }
    lines
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_duplicates(tasks: &[ParsedTask]) -> Vec<ParseWarning> {
    let mut groups: IndexMap<&TaskId, Vec<&ParsedTask>> = IndexMap::new();
    for task in tasks {
        groups.entry(&task.id).or_default().push(task);
    }
    groups
        .into_values()
        .filter(|group| group.len() > 1)
        .map(|group| ParseWarning::DuplicateTask {
            title: group[0].title.clone(),
            path: group[0].path.clone(),
            lines: group.iter().map(|t| t.start_line).collect(),
        })
        .collect()
}
