//! Text record parser.
//!
//! Turns a raw mapping line into cleaned fields. The parser never fails on
//! odd input; callers check the field count against their schema.

pub use crate::util::to_lowercase;

/// What a single line of a mapping file holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Comment,
    /// `[NAME]` section header, inner text trimmed.
    Section(&'a str),
    Record(&'a str),
}

/// Split on a single delimiter, keeping empty leading and trailing fields.
pub fn split(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter).map(str::to_string).collect()
}

/// Remove whitespace and control characters anywhere in the field.
pub fn strip_whitespace(field: &str) -> String {
    field
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect()
}

/// Classify a line. Comments must start the line (after indentation).
pub fn classify_line<'a, M: AsRef<str>>(line: &'a str, comment_markers: &[M]) -> LineKind<'a> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if comment_markers
        .iter()
        .any(|m| trimmed.starts_with(m.as_ref()))
    {
        return LineKind::Comment;
    }
    if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        return LineKind::Section(trimmed[1..trimmed.len() - 1].trim());
    }
    LineKind::Record(line)
}

/// Split, clean every field and require exactly `expected` fields.
pub fn split_record(line: &str, delimiter: char, expected: usize) -> Result<Vec<String>, String> {
    let fields: Vec<String> = split(line, delimiter)
        .iter()
        .map(|f| strip_whitespace(f))
        .collect();
    if fields.len() != expected {
        return Err(format!(
            "expected {} fields, found {}",
            expected,
            fields.len()
        ));
    }
    Ok(fields)
}
