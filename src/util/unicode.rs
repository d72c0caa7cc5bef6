use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to `max_cells` terminal cells, appending `…` when cut.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let gw = display_width(g);
        if width + gw > budget {
            break;
        }
        width += gw;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Right-pad with spaces to exactly `cells` (truncating when longer).
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let w = display_width(&out);
    if w < cells {
        out.push_str(&" ".repeat(cells - w));
    }
    out
}

/// Byte offset of the grapheme boundary after `byte_offset`, None at the end.
pub fn next_grapheme_boundary(s: &str, byte_offset: usize) -> Option<usize> {
    if byte_offset >= s.len() {
        return None;
    }
    match s[byte_offset..].grapheme_indices(true).nth(1) {
        Some((i, _)) => Some(byte_offset + i),
        None => Some(s.len()),
    }
}

/// Byte offset of the grapheme boundary before `byte_offset`, None at the start.
pub fn prev_grapheme_boundary(s: &str, byte_offset: usize) -> Option<usize> {
    if byte_offset == 0 {
        return None;
    }
    s[..byte_offset]
        .grapheme_indices(true)
        .next_back()
        .map(|(i, _)| i)
}

/// Display column of a byte offset.
pub fn byte_offset_to_display_col(s: &str, byte_offset: usize) -> usize {
    display_width(&s[..byte_offset.min(s.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_of_wide_chars() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("日本"), 4);
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("hello world", 6), "hello\u{2026}");
        assert_eq!(truncate_to_width("hi", 6), "hi");
        assert_eq!(truncate_to_width("日本語", 4), "日\u{2026}");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn pad_fills_cells() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("abcdef", 4), "abc\u{2026}");
    }

    #[test]
    fn grapheme_boundaries() {
        let s = "ae\u{301}b"; // a, e + combining acute, b
        assert_eq!(next_grapheme_boundary(s, 0), Some(1));
        assert_eq!(next_grapheme_boundary(s, 1), Some(4));
        assert_eq!(next_grapheme_boundary(s, 5), None);
        assert_eq!(prev_grapheme_boundary(s, 4), Some(1));
        assert_eq!(prev_grapheme_boundary(s, 0), None);
    }

    #[test]
    fn display_col_counts_wide() {
        assert_eq!(byte_offset_to_display_col("日本", 3), 2);
    }
}
