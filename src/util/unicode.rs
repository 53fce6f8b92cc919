use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` down to at most `max_cells` terminal cells, ending in `…` when
/// anything was dropped. Never splits a grapheme cluster.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let budget = max_cells - 1;
    let mut used = 0;
    let mut out = String::new();
    for grapheme in s.graphemes(true) {
        let w = UnicodeWidthStr::width(grapheme);
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(grapheme);
    }
    out.push('\u{2026}');
    out
}

/// Right-pad with spaces to `cells` terminal cells
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let width = display_width(s);
    if width >= cells {
        return s.to_string();
    }
    format!("{}{}", s, " ".repeat(cells - width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_to_width("hello world", 20), "hello world");
        assert_eq!(truncate_to_width("hello world", 6), "hello\u{2026}");
        assert_eq!(truncate_to_width("hello", 0), "");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // each CJK char is 2 cells
        assert_eq!(truncate_to_width("日本語テキスト", 7), "日本語\u{2026}");
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("abcd", 2), "abcd");
    }
}
