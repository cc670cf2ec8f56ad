//! Time sources for stamping

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Env var used by reproducible-build tooling to pin the build time.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Zone used to render the human-readable fields of a stamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TimeBasis {
    /// Whatever zone the build host is configured with
    #[default]
    Local,
    /// UTC, identical on every host
    Utc,
}

impl TimeBasis {
    /// Render an instant in this basis, keeping the offset that applied.
    pub fn render<Tz: TimeZone>(self, instant: &DateTime<Tz>) -> DateTime<FixedOffset> {
        match self {
            TimeBasis::Local => instant.with_timezone(&Local).fixed_offset(),
            TimeBasis::Utc => instant.with_timezone(&Utc).fixed_offset(),
        }
    }
}

impl TryFrom<String> for TimeBasis {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TimeBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBasis::Local => f.write_str("local"),
            TimeBasis::Utc => f.write_str("utc"),
        }
    }
}

impl FromStr for TimeBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(TimeBasis::Local),
            "utc" => Ok(TimeBasis::Utc),
            other => Err(format!("unknown time basis '{other}' (expected local or utc)")),
        }
    }
}

/// A source of "now".
///
/// Each call is one sample; callers derive everything they need from a
/// single call rather than sampling repeatedly.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Host wall clock
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    basis: TimeBasis,
    pinned: Option<DateTime<Utc>>,
}

impl SystemClock {
    pub fn new(basis: TimeBasis) -> Self {
        Self {
            basis,
            pinned: None,
        }
    }

    /// Honour `SOURCE_DATE_EPOCH` when it is set to a valid epoch second.
    ///
    /// An unset variable leaves the host clock in charge; an unparsable one
    /// is logged and ignored.
    pub fn reproducible(basis: TimeBasis) -> Self {
        let pinned = match std::env::var(SOURCE_DATE_EPOCH) {
            Ok(raw) => {
                let parsed = raw
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                if parsed.is_none() {
                    warn!("Ignoring invalid {}={:?}", SOURCE_DATE_EPOCH, raw);
                }
                parsed
            }
            Err(_) => None,
        };
        Self { basis, pinned }
    }

    pub fn basis(&self) -> TimeBasis {
        self.basis
    }

    /// The pinned instant, if `SOURCE_DATE_EPOCH` was honoured.
    pub fn pinned(&self) -> Option<DateTime<Utc>> {
        self.pinned
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.pinned {
            Some(instant) => self.basis.render(&instant),
            None => match self.basis {
                TimeBasis::Local => Local::now().fixed_offset(),
                TimeBasis::Utc => Utc::now().fixed_offset(),
            },
        }
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
