use std::sync::OnceLock;

use regex::Regex;

use super::pipeline::{SanitizeStage, StageContext};

const STRUCTURAL_MARKERS: [&str; 7] = ["Message", "Response", "┌", "│", "└", "├", "─"];

fn ansi_escape_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\x1B[@-_][0-?]*[ -/]*[@-~]").expect("ansi escape pattern must compile")
    })
}

fn log_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:(?:INFO|DEBUG|WARNING|ERROR|TRACE)\b|Setting default model)")
            .expect("log line pattern must compile")
    })
}

fn invisible_char_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[\p{Cc}\p{Cf}&&[^\t]]").expect("invisible char pattern must compile")
    })
}

/// Lowercase, trim and drop trailing ASCII punctuation.
pub fn normalize_line(line: &str) -> String {
    let lowered = line.to_lowercase();
    lowered.trim().trim_end_matches(|c: char| c.is_ascii_punctuation()).trim_end().to_string()
}

fn is_box_drawing(c: char) -> bool {
    ('\u{2500}'..='\u{257F}').contains(&c)
}

pub struct StripAnsi;

impl SanitizeStage for StripAnsi {
    fn name(&self) -> &'static str {
        "strip_ansi"
    }

    fn apply(&self, lines: Vec<String>, _context: &StageContext<'_>) -> Vec<String> {
        lines
            .into_iter()
            .map(|line| ansi_escape_pattern().replace_all(&line, "").into_owned())
            .collect()
    }
}

pub struct StripBoxDrawing;

impl SanitizeStage for StripBoxDrawing {
    fn name(&self) -> &'static str {
        "strip_box_drawing"
    }

    fn apply(&self, lines: Vec<String>, _context: &StageContext<'_>) -> Vec<String> {
        lines
            .into_iter()
            .map(|line| line.chars().filter(|c| !is_box_drawing(*c)).collect())
            .collect()
    }
}

/// Removes control (Cc) and format (Cf) characters such as BOM and zero-width space.
/// Newlines are already line boundaries here, so only tab survives.
pub struct StripControlChars;

impl SanitizeStage for StripControlChars {
    fn name(&self) -> &'static str {
        "strip_control_chars"
    }

    fn apply(&self, lines: Vec<String>, _context: &StageContext<'_>) -> Vec<String> {
        lines
            .into_iter()
            .map(|line| invisible_char_pattern().replace_all(&line, "").into_owned())
            .collect()
    }
}

pub struct TrimLines;

impl SanitizeStage for TrimLines {
    fn name(&self) -> &'static str {
        "trim_lines"
    }

    fn apply(&self, lines: Vec<String>, _context: &StageContext<'_>) -> Vec<String> {
        lines
            .into_iter()
            .filter_map(|line| {
                let trimmed = line.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect()
    }
}

pub struct DropLogLines;

impl SanitizeStage for DropLogLines {
    fn name(&self) -> &'static str {
        "drop_log_lines"
    }

    fn apply(&self, lines: Vec<String>, _context: &StageContext<'_>) -> Vec<String> {
        lines.into_iter().filter(|line| !log_line_pattern().is_match(line)).collect()
    }
}

/// Drops the leading run of placeholder and echo lines. Everything after the
/// first genuine line is kept as-is, so output made only of echoes is empty.
pub struct DropQueryEchoes;

impl DropQueryEchoes {
    fn is_echo(line: &str, query: &str, repeated: &str) -> bool {
        let line = normalize_line(line);

        line.starts_with("thinking")
            || line == query
            || line.starts_with(repeated)
            || line.split_whitespace().all(|word| word == query)
    }
}

impl SanitizeStage for DropQueryEchoes {
    fn name(&self) -> &'static str {
        "drop_query_echoes"
    }

    fn apply(&self, lines: Vec<String>, context: &StageContext<'_>) -> Vec<String> {
        let query = context.normalized_query();
        let repeated = format!("{query} {query}");
        let echoes =
            lines.iter().take_while(|line| Self::is_echo(line, query, &repeated)).count();

        lines.into_iter().skip(echoes).collect()
    }
}

pub struct DropMarkerLines;

impl SanitizeStage for DropMarkerLines {
    fn name(&self) -> &'static str {
        "drop_marker_lines"
    }

    fn apply(&self, lines: Vec<String>, _context: &StageContext<'_>) -> Vec<String> {
        lines
            .into_iter()
            .filter(|line| !STRUCTURAL_MARKERS.iter().any(|marker| line.contains(marker)))
            .collect()
    }
}

/// Strips the query, repeated any number of times, from the start of the text.
/// A line consumed entirely is removed and the next one is checked.
pub struct StripQueryPrefix;

impl SanitizeStage for StripQueryPrefix {
    fn name(&self) -> &'static str {
        "strip_query_prefix"
    }

    fn apply(&self, mut lines: Vec<String>, context: &StageContext<'_>) -> Vec<String> {
        let query = context.query().trim().to_lowercase();
        if query.is_empty() {
            return lines;
        }

        loop {
            let Some(first) = lines.first() else { break };
            let Some(rest) = strip_prefix_ignore_case(first, &query) else { break };
            let rest = rest.trim().to_string();
            if rest.is_empty() {
                lines.remove(0);
            } else {
                lines[0] = rest;
            }
        }

        lines
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, lowered_prefix: &str) -> Option<&'a str> {
    let mut expected = lowered_prefix.chars().peekable();

    for (index, actual) in line.char_indices() {
        if expected.peek().is_none() {
            return Some(&line[index..]);
        }
        for lowered in actual.to_lowercase() {
            if expected.next() != Some(lowered) {
                return None;
            }
        }
    }

    expected.peek().is_none().then_some("")
}
