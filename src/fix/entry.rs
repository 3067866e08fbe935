//! Classifies one entry file as current-format or needing repair.

use std::fs;
use std::path::Path;

use crate::git::CommitRequest;

use super::FixError;
use super::rules::{RULES, Rule};

/// One entry's text plus the repair rules that apply to it.
///
/// Construction runs every registered rule's predicate against the raw text
/// in registration order; an entry with no applicable rules is already in
/// the current format.
#[derive(Debug, Clone)]
pub struct Entry {
    text: String,
    fixes: Vec<Rule>,
}

impl Entry {
    pub fn new(text: String) -> Self {
        let fixes = RULES
            .iter()
            .copied()
            .filter(|rule| rule.applies(&text))
            .collect();
        Self { text, fixes }
    }

    pub fn from_file(path: &Path) -> Result<Self, FixError> {
        Ok(Self::new(fs::read_to_string(path)?))
    }

    pub fn needs_fixed(&self) -> bool {
        !self.fixes.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Applies the applicable rules in order, each fed the previous rule's
    /// output, and returns the repaired entry plus a commit request carrying
    /// only the message — the caller attaches the working directory and the
    /// file path.
    ///
    /// Any rule failure aborts the whole repair.
    pub fn fixed(&self) -> Result<(Entry, CommitRequest), FixError> {
        let mut text = self.text.clone();
        for rule in &self.fixes {
            text = rule.apply(&text)?;
        }

        let request = CommitRequest {
            message: "entry - format updated".to_string(),
            ..CommitRequest::default()
        };
        Ok((
            Entry {
                text,
                fixes: Vec::new(),
            },
            request,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_format_entry_needs_nothing() {
        let text = "Mon Jan 15 15:04:05 UTC 2024\n\n# message\nprose\n\n\
                    Mon Jan 15 17:30:00 UTC 2024\n";
        let entry = Entry::new(text.to_string());

        assert!(!entry.needs_fixed());
        let (fixed, _) = entry.fixed().unwrap();
        assert_eq!(fixed.text(), text);
    }

    #[test]
    fn split_header_without_closing_stamp_is_fully_repaired() {
        // Both the merge and the synthesized closing stamp, in one pass:
        // the stamp lands first (two minutes after opening), then the
        // two-line header collapses.
        let entry = Entry::new("Mon Jan 15 15:04:05 UTC 2024\n\n#~ Msg\n# Extra\n".to_string());
        assert!(entry.needs_fixed());

        let (fixed, request) = entry.fixed().unwrap();
        assert_eq!(
            fixed.text(),
            "Mon Jan 15 15:04:05 UTC 2024\n\n# Msg | Extra\n\n\
             Mon Jan 15 15:06:05 UTC 2024\n"
        );
        assert!(!fixed.needs_fixed());
        assert_eq!(request.message, "entry - format updated");
    }

    #[test]
    fn embedded_ideas_are_stripped_after_the_stamp_lands() {
        // No closing stamp and an embedded idea: the strip rule leans on the
        // stamp the first rule appended.
        let entry = Entry::new(
            "Mon Jan 15 15:04:05 UTC 2024\n\n# message\nprose\n\n\
             ## [active] An Idea\nbody\n"
                .to_string(),
        );

        let (fixed, _) = entry.fixed().unwrap();
        assert_eq!(
            fixed.text(),
            "Mon Jan 15 15:04:05 UTC 2024\n\n# message\nprose\n\n\
             Mon Jan 15 15:06:05 UTC 2024\n"
        );
    }

    #[test]
    fn bad_opening_stamp_aborts_the_repair() {
        let entry = Entry::new("never a timestamp\nprose\n".to_string());
        assert!(entry.needs_fixed());

        assert!(matches!(
            entry.fixed(),
            Err(FixError::BadOpeningStamp(_))
        ));
    }
}
