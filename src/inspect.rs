//! Read back an existing stamp and check it is well formed

use crate::clock::TimeBasis;
use crate::types::{RecordFormatError, VersionRecord, BUILDER};
use chrono::{Local, Utc};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors found while inspecting a stamp file
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid stamp JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected builder {found:?} (expected {:?})", BUILDER)]
    UnknownBuilder { found: String },

    #[error(transparent)]
    Format(#[from] RecordFormatError),

    #[error("buildDate/buildTime {date} {time} do not match buildTimestamp {timestamp} in {basis} time")]
    Inconsistent {
        date: String,
        time: String,
        timestamp: i64,
        basis: TimeBasis,
    },
}

/// Parse and validate stamp bytes.
///
/// `basis` is the zone the stamp was generated in; the human-readable
/// fields are read back in it and must name `buildTimestamp`.
pub fn check(bytes: &[u8], basis: TimeBasis) -> Result<VersionRecord, InspectError> {
    let record: VersionRecord = serde_json::from_slice(bytes)?;

    if !record.has_known_builder() {
        return Err(InspectError::UnknownBuilder {
            found: record.builder,
        });
    }

    let consistent = match basis {
        TimeBasis::Local => record.is_consistent_in(&Local)?,
        TimeBasis::Utc => record.is_consistent_in(&Utc)?,
    };
    if !consistent {
        return Err(InspectError::Inconsistent {
            date: record.build_date,
            time: record.build_time,
            timestamp: record.build_timestamp,
            basis,
        });
    }

    Ok(record)
}

/// Read and validate the stamp at `path`.
#[instrument(skip_all, fields(path = %path.display(), %basis))]
pub fn inspect(path: &Path, basis: TimeBasis) -> Result<VersionRecord, InspectError> {
    let bytes = std::fs::read(path).map_err(|source| InspectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes", bytes.len());
    check(&bytes, basis)
}
