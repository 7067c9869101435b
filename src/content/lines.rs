//! Line splitting for content previews.

/// Split on `\n` and `\r\n`.
///
/// A `\r` is only part of a terminator when it directly precedes `\n`; a
/// trailing lone `\r` stays in the last line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    for line in &mut lines[..last] {
        let s: &str = *line;
        *line = s.strip_suffix('\r').unwrap_or(s);
    }
    lines
}

/// First `max_lines` lines of `text`, joined with `\n`.
pub fn take_lines(text: &str, max_lines: usize) -> String {
    split_lines(text)
        .into_iter()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_terminators() {
        let text = "# Title\r\nfirst\nsecond\r\nthird";
        assert_eq!(split_lines(text), vec!["# Title", "first", "second", "third"]);
        assert_eq!(take_lines(text, 2), "# Title\nfirst");
        assert_eq!(take_lines(text, 3), "# Title\nfirst\nsecond");
    }

    #[test]
    fn test_max_lines_beyond_content_returns_everything_normalized() {
        let text = "a\r\nb\nc\r\n";
        assert_eq!(take_lines(text, 4), "a\nb\nc\n");
        assert_eq!(take_lines(text, 100), "a\nb\nc\n");
    }

    #[test]
    fn test_lone_carriage_return_is_content() {
        assert_eq!(split_lines("a\rb\nc\r"), vec!["a\rb", "c\r"]);
        assert_eq!(take_lines("a\rb\nc\r", 5), "a\rb\nc\r");
    }

    #[test]
    fn test_empty_and_zero() {
        assert_eq!(split_lines(""), vec![""]);
        assert_eq!(take_lines("", 3), "");
        assert_eq!(take_lines("a\nb", 0), "");
    }

    #[test]
    fn test_blank_lines_are_kept() {
        assert_eq!(take_lines("a\n\n\nb", 3), "a\n\n");
    }
}
