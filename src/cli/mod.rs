pub mod add_review;
pub mod browse;
pub mod doctor;
pub mod import;
pub mod search;
pub mod stats;

/// Shorten `s` to at most `max` characters, appending `...` when cut.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

pub(crate) fn or_dash(s: Option<&str>) -> &str {
    s.unwrap_or("-")
}
