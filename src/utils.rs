// src/utils.rs
// Small text helpers shared by the clarification and extraction layers

/// Truncate a string to max length with ellipsis.
///
/// Cuts on a char boundary at or below `max_len` bytes, then appends "...".
/// Used to keep raw model text out of log lines.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Collapse every whitespace run to a single space, trim, and lowercase.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
