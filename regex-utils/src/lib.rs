//! Regex utilities for discopop-runner
//! Extracted to a separate crate for compilation optimization

use once_cell::sync::Lazy;
use regex::Regex;

/// Source locations written by the DiscoPoP tools as `<fileId>:<lineNr>`
pub mod location {
    use super::*;

    pub static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^\s*(\d+)\s*:\s*(\d+)\s*$").expect("Invalid regex pattern")
    });

    /// Split a location string into `(file_id, line_nr)`
    pub fn parse(text: &str) -> Option<(u64, u32)> {
        let caps = PATTERN.captures(text)?;
        let file_id = caps.get(1)?.as_str().parse().ok()?;
        let line = caps.get(2)?.as_str().parse().ok()?;
        Some((file_id, line))
    }
}

/// Lines of a `FileMapping.txt`: `<fileId><TAB><path>`
pub mod file_mapping {
    use super::*;

    pub static LINE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\d+)\t(.+)$").expect("Invalid regex pattern"));

    /// Parse one already-trimmed mapping line
    pub fn parse_line(line: &str) -> Option<(u64, &str)> {
        let caps = LINE.captures(line)?;
        let id = caps.get(1)?.as_str().parse().ok()?;
        let path = caps.get(2)?.as_str().trim();
        if path.is_empty() {
            return None;
        }
        Some((id, path))
    }
}

/// Quoting of words interpolated into `sh -c` command lines
pub mod shell {
    use super::*;

    static SAFE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[A-Za-z0-9_@%+=:,./-]+$").expect("Invalid regex pattern"));

    /// Quote a word so the shell passes it through unchanged
    pub fn quote(word: &str) -> String {
        if SAFE.is_match(word) {
            return word.to_string();
        }
        format!("'{}'", word.replace('\'', r"'\''"))
    }

    /// Quote every word and join them with single spaces
    pub fn join<I, S>(words: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        words.into_iter().map(|w| quote(w.as_ref())).collect::<Vec<_>>().join(" ")
    }
}
