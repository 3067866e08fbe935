//! Streams idea records out of free-form entry text.
//!
//! Entries are prose with idea blocks mixed in. The scanner walks the text
//! line by line, ignoring everything before the first idea header, and
//! yields one [`Idea`] per block. A block's body runs until the next header
//! (stashed as lookahead for the following scan), a closing timestamp line
//! (consumed, never part of a body), or end of input — an entry that is
//! still open has no closing stamp, and that is not an error.
//!
//! The scanner is lazy, finite, and not restartable; rescanning means
//! constructing a new scanner over the text.

use crate::idea::{HEADER_MARKER, HeaderFormatError, Idea, parse_header};
use crate::stamp::Stamp;

pub struct IdeaScanner<'a> {
    lines: std::str::Lines<'a>,
    next_header: Option<&'a str>,
    failed: bool,
}

impl<'a> IdeaScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            next_header: None,
            failed: false,
        }
    }
}

impl Iterator for IdeaScanner<'_> {
    type Item = Result<Idea, HeaderFormatError>;

    /// Advances to the next idea block. Errors are sticky: after a malformed
    /// header the scanner yields nothing further.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        // Use the header stashed by the previous body scan, or skip prose
        // until the next header line.
        let header = match self.next_header.take() {
            Some(line) => line,
            None => loop {
                let line = self.lines.next()?;
                if line.contains(HEADER_MARKER) {
                    break line;
                }
            },
        };

        let mut body = String::new();
        for line in self.lines.by_ref() {
            if line.contains(HEADER_MARKER) {
                self.next_header = Some(line);
                break;
            }
            // A closing timestamp terminates the body and is not part of it.
            if Stamp::parse_line(line).is_ok() {
                break;
            }
            body.push_str(line);
            body.push('\n');
        }

        match parse_header(header) {
            Ok((status, id, name)) => {
                let mut body = body.trim().to_string();
                body.push('\n');
                Some(Ok(Idea {
                    status,
                    id,
                    name,
                    body,
                }))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Collects every idea in `text`, failing on the first malformed header.
pub fn ideas_in(text: &str) -> Result<Vec<Idea>, HeaderFormatError> {
    IdeaScanner::new(text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idea::Status;

    const ENTRY: &str = "\
Mon Jan 15 15:04:05 UTC 2024

# Commit message for this entry
Some prose about the day that is not an idea.

## [active] [2] First Idea
The first body.

Across two paragraphs.

## [inactive] Second Idea
The second body.

Mon Jan 15 17:30:00 UTC 2024
";

    #[test]
    fn yields_every_idea_in_document_order() {
        let ideas = ideas_in(ENTRY).unwrap();

        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].name, "First Idea");
        assert_eq!(ideas[0].id, 2);
        assert_eq!(ideas[0].status, Status::Active);
        assert_eq!(ideas[1].name, "Second Idea");
        assert_eq!(ideas[1].id, 0);
        assert_eq!(ideas[1].status, Status::Inactive);
    }

    #[test]
    fn bodies_are_trimmed_with_one_trailing_newline() {
        let ideas = ideas_in(ENTRY).unwrap();

        assert_eq!(ideas[0].body, "The first body.\n\nAcross two paragraphs.\n");
        assert_eq!(ideas[1].body, "The second body.\n");
    }

    #[test]
    fn closing_stamp_never_appears_in_a_body() {
        let ideas = ideas_in(ENTRY).unwrap();

        assert!(!ideas[1].body.contains("17:30:00"));
    }

    #[test]
    fn prose_without_ideas_yields_nothing() {
        let text = "Mon Jan 15 15:04:05 UTC 2024\n\n# message\nJust prose.\n";
        assert!(ideas_in(text).unwrap().is_empty());
    }

    #[test]
    fn final_idea_may_run_to_end_of_input() {
        // An entry that is still open has no closing stamp.
        let text = "## [active] Unclosed\nStill being written";
        let ideas = ideas_in(text).unwrap();

        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].body, "Still being written\n");
    }

    #[test]
    fn empty_body_becomes_a_single_newline() {
        let ideas = ideas_in("## [active] Bare\n").unwrap();
        assert_eq!(ideas[0].body, "\n");
    }

    #[test]
    fn malformed_header_is_a_sticky_error() {
        // The second header is detected by its marker but has no name, so
        // the scan fails there and stays failed.
        let text = "\
## [active] Fine
body

## [active] [9]
## [active] Never Reached
";
        let mut scanner = IdeaScanner::new(text);

        assert_eq!(scanner.next().unwrap().unwrap().name, "Fine");
        assert!(scanner.next().unwrap().is_err());
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
