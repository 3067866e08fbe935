//! The ordered textual repair rules for legacy entries.
//!
//! Each rule is a predicate over an entry's raw text plus a transform. The
//! registration order in [`RULES`] is load-bearing: applicable rules run in
//! that order, each against the previous rule's output, and later rules
//! assume earlier ones already ran — stripping embedded ideas relies on a
//! closing stamp being present, which the first rule guarantees.

use crate::idea::HEADER_MARKER;
use crate::idea::scanner::IdeaScanner;
use crate::stamp::Stamp;

use super::FixError;

/// Legacy commit-message marker.
const TILDE_PREFIX: &str = "#~ ";

/// Current commit-message marker.
const HEADER_PREFIX: &str = "# ";

/// One textual repair for a legacy entry layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The entry was never closed: synthesize a closing stamp two minutes
    /// after the opening one.
    AppendClosingStamp,

    /// Legacy two-line commit-message header (`#~ a` followed by `# b`)
    /// merged into the single line `# a | b`.
    MergeSplitHeader,

    /// A lone legacy `#~ ` commit-message marker rewritten to `# `.
    NormalizeTildeHeader,

    /// Idea blocks removed from the entry body (they were migrated into the
    /// store by an earlier pipeline step).
    StripEmbeddedIdeas,
}

/// Every rule, in application order.
pub const RULES: [Rule; 4] = [
    Rule::AppendClosingStamp,
    Rule::MergeSplitHeader,
    Rule::NormalizeTildeHeader,
    Rule::StripEmbeddedIdeas,
];

impl Rule {
    /// Whether this rule has anything to repair in `text`.
    pub fn applies(self, text: &str) -> bool {
        match self {
            Self::AppendClosingStamp => !last_nonempty_line_is_stamp(text),
            Self::MergeSplitHeader => split_header_at(text).is_some(),
            Self::NormalizeTildeHeader => lone_tilde_header_at(text).is_some(),
            Self::StripEmbeddedIdeas => {
                IdeaScanner::new(text).next().is_some_and(|idea| idea.is_ok())
            }
        }
    }

    /// Applies this rule's transform, returning the repaired text.
    pub fn apply(self, text: &str) -> Result<String, FixError> {
        match self {
            Self::AppendClosingStamp => append_closing_stamp(text),
            Self::MergeSplitHeader => Ok(merge_split_header(text)),
            Self::NormalizeTildeHeader => Ok(normalize_tilde_header(text)),
            Self::StripEmbeddedIdeas => strip_embedded_ideas(text),
        }
    }
}

fn last_nonempty_line_is_stamp(text: &str) -> bool {
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| Stamp::parse_line(line).is_ok())
}

/// Reads the opening stamp from line one, copies the text verbatim, and
/// appends a blank line plus `opened_at + 2 minutes`.
///
/// An unparsable first line is fatal here, not a "doesn't need fixing"
/// signal: an entry without a valid opening stamp can't be repaired at all.
fn append_closing_stamp(text: &str) -> Result<String, FixError> {
    let first = text.lines().next().unwrap_or_default();
    let opened_at =
        Stamp::parse_line(first).map_err(|_| FixError::BadOpeningStamp(first.to_string()))?;
    let closed_at = opened_at.add_minutes(2)?;

    let mut fixed = String::with_capacity(text.len() + 64);
    for line in text.lines() {
        fixed.push_str(line);
        fixed.push('\n');
    }
    fixed.push('\n');
    fixed.push_str(&closed_at.to_string());
    fixed.push('\n');
    Ok(fixed)
}

/// The index of the first `#~ ` line immediately followed by a `# ` line.
fn split_header_at(text: &str) -> Option<usize> {
    let lines: Vec<&str> = text.lines().collect();
    lines
        .windows(2)
        .position(|pair| pair[0].starts_with(TILDE_PREFIX) && pair[1].starts_with(HEADER_PREFIX))
}

fn merge_split_header(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(at) = split_header_at(text) else {
        return text.to_string();
    };

    let mut fixed = String::with_capacity(text.len());
    for (i, line) in lines.iter().enumerate() {
        if i == at {
            let part1 = line.strip_prefix(TILDE_PREFIX).unwrap_or(line);
            let part2 = lines[i + 1].strip_prefix(HEADER_PREFIX).unwrap_or(lines[i + 1]);
            fixed.push_str(&format!("# {part1} | {part2}\n"));
        } else if i == at + 1 {
            continue;
        } else {
            fixed.push_str(line);
            fixed.push('\n');
        }
    }
    fixed
}

/// The index of the first `#~ ` line that is *not* half of a split header,
/// including one sitting on the final line.
fn lone_tilde_header_at(text: &str) -> Option<usize> {
    let lines: Vec<&str> = text.lines().collect();
    (0..lines.len()).find(|&i| {
        lines[i].starts_with(TILDE_PREFIX)
            && lines.get(i + 1).is_none_or(|next| !next.starts_with(HEADER_PREFIX))
    })
}

fn normalize_tilde_header(text: &str) -> String {
    let Some(at) = lone_tilde_header_at(text) else {
        return text.to_string();
    };

    let mut fixed = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i == at {
            fixed.push_str(&line.replacen("#~", "#", 1));
        } else {
            fixed.push_str(line);
        }
        fixed.push('\n');
    }
    fixed
}

/// Keeps everything before the first idea header, then re-appends a blank
/// line and the closing stamp.
///
/// The stamp kept is the *last* line in the remainder that parses as one:
/// ideas may sit between the entry body and the closing stamp, and an idea
/// body could itself contain a stamp-shaped line. Finding none is fatal —
/// in the pipeline, the append-closing-stamp rule has always run first.
fn strip_embedded_ideas(text: &str) -> Result<String, FixError> {
    let mut lines = text.lines();

    let mut kept = String::new();
    for line in lines.by_ref() {
        if line.contains(HEADER_MARKER) {
            break;
        }
        kept.push_str(line);
        kept.push('\n');
    }

    let closing = lines
        .rev()
        .find(|line| Stamp::parse_line(line).is_ok())
        .ok_or(FixError::MissingClosingStamp)?;

    let mut fixed = kept.trim().to_string();
    fixed.push_str("\n\n");
    fixed.push_str(closing);
    fixed.push('\n');
    Ok(fixed)
}
