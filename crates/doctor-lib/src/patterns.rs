//! Log pattern matching
//!
//! A fixed, ordered table of named error patterns is compiled once and
//! shared by reference across diagnoses. Scanning is a pure function of the
//! table and the text.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Severity;

/// Maximum stored length of a matched sample line
pub const MAX_SAMPLE_LEN: usize = 200;

/// A named error pattern with a fixed severity
pub struct LogPattern {
    pub regex: Regex,
    pub title: &'static str,
    pub description: &'static str,
    pub severity: Severity,
}

fn pattern(
    re: &str,
    title: &'static str,
    description: &'static str,
    severity: Severity,
) -> LogPattern {
    LogPattern {
        regex: Regex::new(re).expect("invalid log pattern"),
        title,
        description,
        severity,
    }
}

/// Default error patterns, in emission order
pub static LOG_PATTERNS: Lazy<Vec<LogPattern>> = Lazy::new(|| {
    use Severity::{Critical, Warning};
    vec![
        pattern(r"(?i)panic:", "Panic detected", "Application panicked", Critical),
        pattern(r"(?i)fatal\s*(error)?:", "Fatal error", "Fatal error occurred", Critical),
        pattern(r"(?i)out\s*of\s*memory", "Out of memory", "Application ran out of memory", Critical),
        pattern(r"(?i)killed", "Process killed", "Process was killed", Warning),
        pattern(r"(?i)connection\s*refused", "Connection refused", "Cannot connect to a service", Warning),
        pattern(r"(?i)ECONNREFUSED", "Connection refused", "TCP connection refused", Warning),
        pattern(r"(?i)permission\s*denied", "Permission denied", "Insufficient permissions", Warning),
        pattern(r"(?i)access\s*denied", "Access denied", "Access was denied", Warning),
        pattern(r"(?i)no\s*such\s*file", "File not found", "Required file not found", Warning),
        pattern(r"(?i)timeout|timed?\s*out", "Timeout", "Operation timed out", Warning),
        pattern(r"(?i)deadline\s*exceeded", "Deadline exceeded", "Operation deadline was exceeded", Warning),
        pattern(r"(?i)certificate\s*(verify|validation)\s*failed", "Certificate error", "TLS certificate validation failed", Warning),
        pattern(r"(?i)authentication\s*failed", "Auth failed", "Authentication failed", Warning),
        pattern(r"(?i)unauthorized", "Unauthorized", "Unauthorized access attempt", Warning),
        pattern(r"(?i)segmentation\s*fault", "Segfault", "Segmentation fault occurred", Critical),
        pattern(r"(?i)stack\s*overflow", "Stack overflow", "Stack overflow error", Critical),
        pattern(r"(?i)null\s*pointer", "Null pointer", "Null pointer exception", Critical),
    ]
});

/// A pattern together with the sample lines it matched
pub struct PatternHit<'a> {
    pub pattern: &'a LogPattern,
    pub samples: Vec<String>,
}

/// Scan text line by line against an ordered pattern table.
///
/// Blank lines are skipped. Samples are truncated to [`MAX_SAMPLE_LEN`]
/// characters. Hits are emitted in pattern declaration order, each carrying
/// every sample recorded under the pattern's title.
pub fn scan_text<'a>(patterns: &'a [LogPattern], text: &str) -> Vec<PatternHit<'a>> {
    let mut samples_by_title: HashMap<&str, Vec<String>> = HashMap::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        for pattern in patterns {
            if pattern.regex.is_match(line) {
                samples_by_title
                    .entry(pattern.title)
                    .or_default()
                    .push(truncate_line(line, MAX_SAMPLE_LEN));
            }
        }
    }

    patterns
        .iter()
        .filter_map(|pattern| {
            samples_by_title.get(pattern.title).map(|samples| PatternHit {
                pattern,
                samples: samples.clone(),
            })
        })
        .collect()
}

/// Truncate a line to `max_len` characters, ending in an ellipsis marker
fn truncate_line(line: &str, max_len: usize) -> String {
    if line.chars().count() <= max_len {
        return line.to_string();
    }
    let mut truncated: String = line.chars().take(max_len - 3).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_line_is_unmodified() {
        let line = "a".repeat(50);
        assert_eq!(truncate_line(&line, MAX_SAMPLE_LEN), line);
    }

    #[test]
    fn long_line_truncates_to_exactly_max_len() {
        let line = "x".repeat(250);
        let truncated = truncate_line(&line, MAX_SAMPLE_LEN);
        assert_eq!(truncated.chars().count(), 200);
        assert!(truncated.ends_with("..."));
        assert_eq!(&truncated[..197], &line[..197]);
    }

    #[test]
    fn truncation_is_char_safe() {
        let line = "é".repeat(250);
        let truncated = truncate_line(&line, MAX_SAMPLE_LEN);
        assert_eq!(truncated.chars().count(), 200);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn matches_panic_line_case_insensitively() {
        let text = "starting up\nPANIC: runtime error: index out of range\n";
        let hits = scan_text(&LOG_PATTERNS, text);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pattern.title, "Panic detected");
        assert_eq!(hits[0].pattern.severity, Severity::Critical);
        assert_eq!(hits[0].samples.len(), 1);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "\n   \n\npanic: boom\n\n";
        let hits = scan_text(&LOG_PATTERNS, text);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].samples.len(), 1);
    }

    #[test]
    fn hits_follow_declaration_order_not_match_order() {
        // Timeout appears before the panic in the text, but "Panic detected"
        // is declared first in the table.
        let text = "request timed out\npanic: boom\n";
        let hits = scan_text(&LOG_PATTERNS, text);

        let titles: Vec<&str> = hits.iter().map(|h| h.pattern.title).collect();
        assert_eq!(titles, vec!["Panic detected", "Timeout"]);
    }

    #[test]
    fn first_sample_wins_and_all_matches_are_counted() {
        let text = "panic: first\npanic: second\npanic: third\n";
        let hits = scan_text(&LOG_PATTERNS, text);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].samples.len(), 3);
        assert_eq!(hits[0].samples[0], "panic: first");
    }

    #[test]
    fn both_connection_refused_spellings_share_a_title() {
        let text = "dial tcp: connection refused\nError: ECONNREFUSED\n";
        let hits = scan_text(&LOG_PATTERNS, text);

        // Two patterns share the title, so both emit with the merged samples.
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert_eq!(hit.pattern.title, "Connection refused");
            assert_eq!(hit.samples.len(), 2);
        }
    }
}
