//! Core types for the version stamp written into the filesystem image

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Toolchain identifier recorded in every stamp
pub const BUILDER: &str = "PlatformIO";

/// Default location of the stamp, relative to the project root
pub const DEFAULT_OUTPUT_PATH: &str = "data/version.json";

/// `buildDate` rendering, e.g. `Mar 05 2024`
pub const DATE_FORMAT: &str = "%b %d %Y";

/// `buildTime` rendering, e.g. `14:30:00`
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Error returned when the human-readable fields of a record cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFormatError(String);

impl fmt::Display for RecordFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RecordFormatError {}

/// Build metadata persisted as `version.json`.
///
/// Field order matches the on-disk layout consumed by the device web UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VersionRecord {
    pub build_date: String,
    pub build_time: String,
    pub build_timestamp: i64,
    pub builder: String,
}

impl VersionRecord {
    /// Derive every field from one captured instant.
    ///
    /// The date and time are rendered in the instant's own zone, so a local
    /// capture yields local wall-clock text and a UTC capture yields UTC text.
    pub fn from_datetime<Tz>(captured: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            build_date: captured.format(DATE_FORMAT).to_string(),
            build_time: captured.format(TIME_FORMAT).to_string(),
            build_timestamp: captured.timestamp(),
            builder: BUILDER.to_string(),
        }
    }

    /// Parse `buildDate` + `buildTime` back into a zone-less wall-clock value.
    pub fn wall_clock(&self) -> Result<NaiveDateTime, RecordFormatError> {
        let joined = format!("{} {}", self.build_date, self.build_time);
        NaiveDateTime::parse_from_str(&joined, &format!("{DATE_FORMAT} {TIME_FORMAT}")).map_err(
            |e| {
                RecordFormatError(format!(
                    "cannot parse build date/time {:?}: {}",
                    joined, e
                ))
            },
        )
    }

    /// Check that the human-readable fields, read in `tz`, name the same
    /// epoch second as `buildTimestamp`.
    ///
    /// A wall-clock time that falls in a DST fold maps to two instants; the
    /// record is consistent if either matches. A time in a DST gap never is.
    pub fn is_consistent_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<bool, RecordFormatError> {
        let naive = self.wall_clock()?;
        let matches = |dt: DateTime<Tz>| dt.timestamp() == self.build_timestamp;
        Ok(match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => matches(dt),
            LocalResult::Ambiguous(earliest, latest) => matches(earliest) || matches(latest),
            LocalResult::None => false,
        })
    }

    /// True when the builder tag is the one this tool writes.
    pub fn has_known_builder(&self) -> bool {
        self.builder == BUILDER
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}, {})",
            self.build_date, self.build_time, self.build_timestamp, self.builder
        )
    }
}
