pub mod block_tree;
pub mod board_parser;
pub mod board_serializer;
pub mod frontmatter;
pub mod line_editor;
pub mod span;

pub use board_parser::{Heading, ParseError, ParseWarning, ParsedBoard, parse_board, parse_board_with};
pub use board_serializer::{SerializeError, apply_edit, apply_edit_with};
pub use line_editor::LineEditor;
