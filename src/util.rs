/// Shorten `s` to at most `max` characters, marking the cut with `...`.
/// Review text is collapsed to one line first.
pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }

    let s = single_line(s);
    let char_count = s.chars().count();
    if char_count <= max {
        return s;
    }

    if max <= 3 {
        return s.chars().take(max).collect();
    }

    let truncated: String = s.chars().take(max - 3).collect();
    format!("{}...", truncated)
}

/// Collapse runs of whitespace (newlines included) into single spaces
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
