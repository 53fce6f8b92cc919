//! Block structure of a Markdown document, reduced to the node kinds the
//! board parser looks at. Built from pulldown-cmark's offset event stream.

use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag};

use super::board_parser::ParseError;

/// A block-level node with its byte span in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, span: Range<usize> },
    Paragraph { span: Range<usize> },
    List { span: Range<usize>, items: Vec<ListItem> },
    /// Contents are never inspected
    BlockQuote { span: Range<usize> },
    /// Fenced or indented code; contents are never inspected
    Code { span: Range<usize> },
    Other { span: Range<usize> },
}

impl Block {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Block::Heading { span, .. }
            | Block::Paragraph { span }
            | Block::List { span, .. }
            | Block::BlockQuote { span }
            | Block::Code { span }
            | Block::Other { span } => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub span: Range<usize>,
    /// `Some(checked)` when the item carries a task-list checkbox
    pub checkbox: Option<bool>,
    /// Span of the `[ ]` / `[x]` marker
    pub marker: Option<Range<usize>>,
    pub children: Vec<Block>,
}

impl ListItem {
    /// The item's first paragraph. In tight lists this is the implicit
    /// paragraph made of the item's leading inline content.
    pub fn first_paragraph(&self) -> Option<&Range<usize>> {
        self.children.iter().find_map(|block| match block {
            Block::Paragraph { span } => Some(span),
            _ => None,
        })
    }

    pub fn nested_lists(&self) -> impl Iterator<Item = &[ListItem]> {
        self.children.iter().filter_map(|block| match block {
            Block::List { items, .. } => Some(items.as_slice()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Heading(u8),
    Paragraph,
    List,
    Item,
    BlockQuote,
    Code,
    Inline,
    Other,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    span: Range<usize>,
    children: Vec<Block>,
    items: Vec<ListItem>,
    checkbox: Option<bool>,
    marker: Option<Range<usize>>,
    /// Inline content seen directly inside an item, not yet wrapped in a paragraph
    inline: Option<Range<usize>>,
}

impl Frame {
    fn new(kind: FrameKind, span: Range<usize>) -> Self {
        Frame {
            kind,
            span,
            children: Vec::new(),
            items: Vec::new(),
            checkbox: None,
            marker: None,
            inline: None,
        }
    }

    fn flush_inline(&mut self) {
        if let Some(span) = self.inline.take() {
            self.children.push(Block::Paragraph { span });
        }
    }

    fn extend_inline(&mut self, range: &Range<usize>) {
        self.inline = Some(match self.inline.take() {
            Some(span) => span.start.min(range.start)..span.end.max(range.end),
            None => range.clone(),
        });
    }
}

/// Parse `text` into top-level blocks
pub fn build_block_tree(text: &str) -> Result<Vec<Block>, ParseError> {
    let options = Options::ENABLE_TASKLISTS | Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut root: Vec<Block> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                let kind = classify(&tag);
                if let Some(top) = stack.last_mut()
                    && top.kind == FrameKind::Item
                {
                    if kind == FrameKind::Inline {
                        top.extend_inline(&range);
                    } else {
                        top.flush_inline();
                    }
                }
                stack.push(Frame::new(kind, range));
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or_else(|| {
                    ParseError::Markdown(format!("unexpected end tag at byte {}", range.start))
                })?;
                close_frame(frame, stack.last_mut(), &mut root);
            }
            Event::TaskListMarker(checked) => {
                if let Some(item) = stack.iter_mut().rev().find(|f| f.kind == FrameKind::Item) {
                    item.checkbox = Some(checked);
                    item.marker = Some(range.clone());
                }
                if let Some(top) = stack.last_mut()
                    && top.kind == FrameKind::Item
                {
                    top.extend_inline(&range);
                }
            }
            Event::Rule => {
                let block = Block::Other { span: range };
                match stack.last_mut() {
                    Some(top) => {
                        top.flush_inline();
                        top.children.push(block);
                    }
                    None => root.push(block),
                }
            }
            _ => {
                if let Some(top) = stack.last_mut()
                    && top.kind == FrameKind::Item
                {
                    top.extend_inline(&range);
                }
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Markdown(format!(
            "unclosed block starting at byte {}",
            open.span.start
        )));
    }
    Ok(root)
}

fn classify(tag: &Tag<'_>) -> FrameKind {
    match tag {
        Tag::Heading { level, .. } => FrameKind::Heading(*level as u8),
        Tag::Paragraph => FrameKind::Paragraph,
        Tag::List(_) => FrameKind::List,
        Tag::Item => FrameKind::Item,
        Tag::BlockQuote(_) => FrameKind::BlockQuote,
        Tag::CodeBlock(_) => FrameKind::Code,
        Tag::Emphasis
        | Tag::Strong
        | Tag::Strikethrough
        | Tag::Link { .. }
        | Tag::Image { .. } => FrameKind::Inline,
        _ => FrameKind::Other,
    }
}

fn close_frame(mut frame: Frame, parent: Option<&mut Frame>, root: &mut Vec<Block>) {
    let span = frame.span.clone();
    let block = match frame.kind {
        FrameKind::Inline => return,
        FrameKind::Item => {
            frame.flush_inline();
            let item = ListItem {
                span,
                checkbox: frame.checkbox,
                marker: frame.marker,
                children: frame.children,
            };
            if let Some(parent) = parent
                && parent.kind == FrameKind::List
            {
                parent.items.push(item);
            }
            return;
        }
        FrameKind::Heading(level) => Block::Heading { level, span },
        FrameKind::Paragraph => Block::Paragraph { span },
        FrameKind::List => Block::List {
            span,
            items: frame.items,
        },
        FrameKind::BlockQuote => Block::BlockQuote { span },
        FrameKind::Code => Block::Code { span },
        FrameKind::Other => Block::Other { span },
    };
    match parent {
        Some(parent) => parent.children.push(block),
        None => root.push(block),
    }
}
