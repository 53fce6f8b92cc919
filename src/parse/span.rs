use std::ops::Range;

/// Maps byte offsets in a text to 1-based line numbers
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        LineIndex { line_starts }
    }

    /// 1-based line containing `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// 1-based inclusive line range covered by `span`, ignoring trailing
    /// whitespace and line breaks inside it.
    pub fn line_range(&self, text: &str, span: &Range<usize>) -> (usize, usize) {
        let start = self.line_of(span.start);
        let content = text.get(span.clone()).unwrap_or("");
        let trimmed = content.trim_end().len();
        if trimmed == 0 {
            return (start, start);
        }
        (start, self.line_of(span.start + trimmed - 1))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(2), 1); // the newline itself
        assert_eq!(index.line_of(3), 2);
        assert_eq!(index.line_of(6), 3);
        assert_eq!(index.line_of(7), 4);
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_line_range_ignores_trailing_breaks() {
        let text = "- [ ] a\n  - k: v\n\n- [ ] b\n";
        let index = LineIndex::new(text);
        assert_eq!(index.line_range(text, &(0..18)), (1, 2));
        assert_eq!(index.line_range(text, &(18..26)), (4, 4));
    }

    #[test]
    fn test_line_range_crlf() {
        let text = "- [ ] a\r\n  - k: v\r\n";
        let index = LineIndex::new(text);
        assert_eq!(index.line_range(text, &(0..text.len())), (1, 2));
    }
}
