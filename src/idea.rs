//! The idea text format.
//!
//! An idea is a small status-tagged note. It appears in two places: embedded
//! in an entry while the entry is being edited, and persisted as its own
//! file in the directory store. Both use the same markdown-like shape:
//!
//! ```text
//! ## [active] [3] Improve the widget
//! Some free-form body text.
//! ```
//!
//! The `[3]` id segment is omitted for ideas that have never been persisted;
//! the header grammar also predates id tracking, so the parser accepts an
//! empty `[]` marker and the no-marker form encountered in old journals.

pub mod scanner;
pub mod store;

use std::fmt;

/// The line marker that opens an idea header.
pub const HEADER_MARKER: &str = "## [";

/// An idea's lifecycle status.
///
/// Open-ended on purpose: journals written by older versions of the tool may
/// carry statuses this version doesn't know, and they must round-trip
/// untouched rather than reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Active,
    Inactive,
    Completed,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Completed => "completed",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for Status {
    fn from(raw: &str) -> Self {
        match raw {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            "completed" => Self::Completed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status-tagged note.
///
/// `id == 0` means the idea has never been persisted; the directory store
/// assigns the first free id on save and that id is permanent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idea {
    pub status: Status,
    pub id: u32,
    pub name: String,
    /// Body text, trimmed of surrounding blank lines, exactly one trailing
    /// newline.
    pub body: String,
}

impl Idea {
    /// The header line, without a trailing newline.
    pub fn header(&self) -> String {
        if self.id == 0 {
            format!("## [{}] {}", self.status, self.name)
        } else {
            format!("## [{}] [{}] {}", self.status, self.id, self.name)
        }
    }

    /// The full textual representation: header line plus body.
    pub fn render(&self) -> String {
        format!("{}\n{}", self.header(), self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderFormatError {
    #[error("idea header must start with \"## \": {0:?}")]
    MissingMarker(String),

    #[error("idea header status must be wrapped w/ []: {0:?}")]
    UnbracketedStatus(String),

    #[error("idea header id must be an unsigned integer: {0:?}")]
    BadId(String),

    #[error("idea header has no name: {0:?}")]
    MissingName(String),
}

/// Parses an idea header line into `(status, id, name)`.
///
/// Three shapes are accepted, all three of which occur in historical
/// journals:
///
/// ```text
/// ## [active] [3] Name     # id assigned
/// ## [active] [] Name      # empty id marker, id = 0
/// ## [active] Name         # no id marker, id = 0
/// ```
pub fn parse_header(line: &str) -> Result<(Status, u32, String), HeaderFormatError> {
    let line = line.trim();

    let rest = line
        .strip_prefix("## ")
        .ok_or_else(|| HeaderFormatError::MissingMarker(line.to_string()))?;

    let (status_token, rest) = rest
        .split_once(' ')
        .ok_or_else(|| HeaderFormatError::MissingName(line.to_string()))?;
    let status = status_token
        .strip_prefix('[')
        .and_then(|token| token.strip_suffix(']'))
        .ok_or_else(|| HeaderFormatError::UnbracketedStatus(line.to_string()))?;
    let status = Status::from(status);

    let (id, name) = match rest.strip_prefix('[') {
        Some(after) => {
            let (id_token, name) = after
                .split_once("] ")
                .ok_or_else(|| HeaderFormatError::MissingName(line.to_string()))?;
            let id = if id_token.is_empty() {
                0
            } else {
                id_token
                    .parse()
                    .map_err(|_| HeaderFormatError::BadId(line.to_string()))?
            };
            (id, name)
        }
        None => (0, rest),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(HeaderFormatError::MissingName(line.to_string()));
    }

    Ok((status, id, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_with_id() {
        let (status, id, name) = parse_header("## [active] [3] An Idea").unwrap();
        assert_eq!(status, Status::Active);
        assert_eq!(id, 3);
        assert_eq!(name, "An Idea");
    }

    #[test]
    fn parses_header_with_empty_id_marker() {
        let (status, id, name) = parse_header("## [completed] [] An Idea").unwrap();
        assert_eq!(status, Status::Completed);
        assert_eq!(id, 0);
        assert_eq!(name, "An Idea");
    }

    #[test]
    fn parses_header_without_id_marker() {
        let (status, id, name) = parse_header("## [active] An Idea").unwrap();
        assert_eq!(status, Status::Active);
        assert_eq!(id, 0);
        assert_eq!(name, "An Idea");
    }

    #[test]
    fn rejects_unbracketed_status() {
        assert!(matches!(
            parse_header("## active An Idea"),
            Err(HeaderFormatError::UnbracketedStatus(_))
        ));
    }

    #[test]
    fn rejects_non_integer_id() {
        assert!(matches!(
            parse_header("## [active] [three] An Idea"),
            Err(HeaderFormatError::BadId(_))
        ));
    }

    #[test]
    fn rejects_missing_name() {
        assert!(matches!(
            parse_header("## [active] "),
            Err(HeaderFormatError::MissingName(_))
        ));
    }

    #[test]
    fn unknown_status_round_trips() {
        let (status, _, _) = parse_header("## [someday] An Idea").unwrap();
        assert_eq!(status, Status::Other("someday".to_string()));
        assert_eq!(status.to_string(), "someday");
    }

    #[test]
    fn header_round_trips_with_and_without_id() {
        for id in [0, 7] {
            let idea = Idea {
                status: Status::Inactive,
                id,
                name: "Round Trip".to_string(),
                body: "body\n".to_string(),
            };

            let (status, parsed_id, name) = parse_header(&idea.header()).unwrap();
            assert_eq!(status, idea.status);
            assert_eq!(parsed_id, id);
            assert_eq!(name, idea.name);
        }
    }

    #[test]
    fn render_omits_zero_id() {
        let idea = Idea {
            status: Status::Active,
            id: 0,
            name: "Fresh".to_string(),
            body: "first thought\n".to_string(),
        };

        assert_eq!(idea.render(), "## [active] Fresh\nfirst thought\n");
    }

    #[test]
    fn render_includes_assigned_id() {
        let idea = Idea {
            status: Status::Active,
            id: 12,
            name: "Persisted".to_string(),
            body: "\n".to_string(),
        };

        assert_eq!(idea.render(), "## [active] [12] Persisted\n\n");
    }
}
