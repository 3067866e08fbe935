//! Journal timestamps.
//!
//! Two fixed textual formats, both carrying an abbreviated zone name:
//!
//! ```text
//! Mon Jan 15 15:04:05 UTC 2024      # line format: opening, closing, and
//!                                   # embedded-idea terminator lines
//! 2024-01-15-1504-UTC               # filename format, minute precision
//! ```
//!
//! A [`Stamp`] is a civil datetime plus the zone abbreviation it was written
//! with. The abbreviation round-trips verbatim and is never resolved against
//! a zone database: journals are single-machine, human-authored text, and a
//! rewrite must reproduce the label byte-for-byte.

use std::fmt::{self, Write as _};

use jiff::civil::DateTime;
use jiff::{ToSpan, Zoned};

/// Datetime portion of the line format, zone token handled separately.
const LINE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Datetime portion of the filename format, zone suffix handled separately.
const FILENAME_FORMAT: &str = "%Y-%m-%d-%H%M";

#[derive(Debug, thiserror::Error)]
pub enum StampError {
    #[error("not a timestamp line: {0:?}")]
    Line(String),

    #[error("not a timestamp filename: {0:?}")]
    Filename(String),

    #[error("timestamp arithmetic out of range: {0}")]
    OutOfRange(#[from] jiff::Error),
}

/// A civil datetime plus the zone abbreviation it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    datetime: DateTime,
    zone: String,
}

impl Stamp {
    /// The current local time, labelled with the local zone abbreviation.
    pub fn now() -> Self {
        let zoned = Zoned::now();
        let mut zone = String::new();
        // Fixed-offset zones have no abbreviation to format; fall back to UTC
        // rather than producing an unparsable label.
        if write!(zone, "{}", zoned.strftime("%Z")).is_err() || !is_zone_abbreviation(&zone) {
            zone = "UTC".to_string();
        }
        Self {
            datetime: zoned.datetime(),
            zone,
        }
    }

    /// Parses the line format: `Mon Jan 15 15:04:05 UTC 2024`.
    ///
    /// Strict: the whole line must match, the weekday must agree with the
    /// date, and the zone token must be a short run of uppercase letters.
    pub fn parse_line(line: &str) -> Result<Self, StampError> {
        let err = || StampError::Line(line.to_string());

        let trimmed = line.trim_end();
        if trimmed.starts_with(char::is_whitespace) {
            return Err(err());
        }

        let [weekday, month, day, time, zone, year] =
            trimmed.split_whitespace().collect::<Vec<_>>()[..]
        else {
            return Err(err());
        };
        if !is_zone_abbreviation(zone) {
            return Err(err());
        }

        let rebuilt = format!("{weekday} {month} {day} {time} {year}");
        let datetime = DateTime::strptime(LINE_FORMAT, &rebuilt).map_err(|_| err())?;

        Ok(Self {
            datetime,
            zone: zone.to_string(),
        })
    }

    /// Parses the filename format: `2024-01-15-1504-UTC`.
    pub fn parse_filename(name: &str) -> Result<Self, StampError> {
        let err = || StampError::Filename(name.to_string());

        let (datetime, zone) = name.rsplit_once('-').ok_or_else(err)?;
        if !is_zone_abbreviation(zone) {
            return Err(err());
        }

        let datetime = DateTime::strptime(FILENAME_FORMAT, datetime).map_err(|_| err())?;

        Ok(Self {
            datetime,
            zone: zone.to_string(),
        })
    }

    /// Renders the filename format.
    pub fn filename(&self) -> String {
        format!("{}-{}", self.datetime.strftime(FILENAME_FORMAT), self.zone)
    }

    /// This stamp shifted forward by `minutes`, keeping the zone label.
    pub fn add_minutes(&self, minutes: i64) -> Result<Self, StampError> {
        Ok(Self {
            datetime: self.datetime.checked_add(minutes.minutes())?,
            zone: self.zone.clone(),
        })
    }

    /// The civil datetime, for chronological ordering.
    pub fn datetime(&self) -> DateTime {
        self.datetime
    }
}

impl fmt::Display for Stamp {
    /// The line format, day-of-month space padded as `date(1)` prints it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.datetime.strftime("%a %b %e %H:%M:%S"),
            self.zone,
            self.datetime.strftime("%Y"),
        )
    }
}

/// A zone label is one to five uppercase ASCII letters.
fn is_zone_abbreviation(token: &str) -> bool {
    !token.is_empty() && token.len() <= 5 && token.chars().all(|c| c.is_ascii_uppercase())
}
