//! Text helpers for turning file contents and process output into messages

use std::time::Duration;

/// How many leading bytes are inspected when sniffing for binary content
const BINARY_SNIFF_LEN: usize = 8192;

/// A file is treated as binary when its first block contains a NUL byte
pub fn is_binary(content: &[u8]) -> bool {
    let head = &content[..content.len().min(BINARY_SNIFF_LEN)];
    head.contains(&0)
}

/// Non-empty, right-trimmed lines of `text`
pub fn meaningful_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
}

/// Keep at most `limit` lines, noting how many were dropped
pub fn capped(lines: Vec<String>, limit: usize) -> Vec<String> {
    if lines.len() <= limit {
        return lines;
    }
    let dropped = lines.len() - limit;
    let mut kept: Vec<String> = lines.into_iter().take(limit).collect();
    kept.push(format!("... and {dropped} more lines"));
    kept
}

/// Render a duration for humans: `1s`, `2.35s`, `120ms`
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        format!("{}ms", duration.as_millis())
    } else if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_binary() {
        assert!(!is_binary(b"fn main() {}\n"));
        assert!(is_binary(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"));
        assert!(!is_binary(b""));
    }

    #[test]
    fn test_meaningful_lines() {
        let lines: Vec<&str> = meaningful_lines("error: one  \n\n   \nwarning: two\n").collect();
        assert_eq!(lines, vec!["error: one", "warning: two"]);
    }

    #[test]
    fn test_capped() {
        let lines: Vec<String> = (1..=5).map(|i| format!("line {i}")).collect();
        assert_eq!(capped(lines.clone(), 10), lines);

        let kept = capped(lines, 2);
        assert_eq!(kept, vec!["line 1", "line 2", "... and 3 more lines"]);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(120)), "120ms");
        assert_eq!(format_duration(Duration::from_secs(3)), "3s");
        assert_eq!(format_duration(Duration::from_millis(2350)), "2.35s");
    }
}
