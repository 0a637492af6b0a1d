//! Small formatting helpers shared by the template renderer and CLI output.

/// Formats a byte count as a human-readable string (e.g. "1.23 MB").
pub fn human_readable_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;
    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }
    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Truncates `s` to at most `limit` bytes, backing off to the previous
/// UTF-8 character boundary so a multi-byte character is never split.
pub fn truncate_to_byte_limit(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
