//! Candidate splitting for lines carrying back-to-back JSON objects
//!
//! The backend can flush several frames into one line with no separator,
//! e.g. `{"text":"A"}{"text":"B"}`. Each returned slice is a candidate that
//! the assembler then tries to parse on its own.

use serde::{Deserialize, Serialize};

/// How a line is cut into candidate JSON fragments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Cut wherever `}` is immediately followed by `{`
    ///
    /// Wire-compatible with the web client. Breaks on string values that
    /// contain a literal `}{`.
    #[default]
    BraceBoundary,
    /// Depth scanner that understands JSON strings and escapes
    Tokenizer,
}

impl SplitStrategy {
    /// Split a (trimmed, prefix-stripped) line into ordered candidates
    pub fn split(self, line: &str) -> Vec<&str> {
        match self {
            SplitStrategy::BraceBoundary => split_brace_boundary(line),
            SplitStrategy::Tokenizer => split_json_tokens(line),
        }
    }
}

/// Split on every `}{` boundary, keeping the `}` with the left fragment
///
/// Always returns at least one fragment (possibly empty).
pub fn split_brace_boundary(line: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;

    for (idx, _) in line.match_indices("}{") {
        fragments.push(&line[start..=idx]);
        start = idx + 1;
    }
    fragments.push(&line[start..]);

    fragments
}

/// Split into top-level `{...}` spans, honouring string literals
///
/// Non-blank text between objects and an unterminated trailing object are
/// returned as candidates too, so they surface as parse failures rather
/// than vanishing.
pub fn split_json_tokens(line: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut gap_start = 0;
    let mut object_start = 0;

    // All delimiters are ASCII, so byte offsets are valid char boundaries
    for (i, b) in line.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' if depth > 0 => in_string = true,
            b'{' => {
                if depth == 0 {
                    push_gap(&mut fragments, &line[gap_start..i]);
                    object_start = i;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    fragments.push(&line[object_start..=i]);
                    gap_start = i + 1;
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        fragments.push(&line[object_start..]);
    } else {
        push_gap(&mut fragments, &line[gap_start..]);
    }

    if fragments.is_empty() {
        fragments.push(line);
    }
    fragments
}

fn push_gap<'a>(fragments: &mut Vec<&'a str>, gap: &'a str) {
    let gap = gap.trim();
    if !gap.is_empty() {
        fragments.push(gap);
    }
}
