//! Version stamp generation: capture once, format, write atomically

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::types::VersionRecord;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors raised while persisting a stamp
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("Output directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("Permission denied writing {0}")]
    PermissionDenied(PathBuf),

    #[error("Disk full while writing {0}")]
    DiskFull(PathBuf),

    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that abort stamp generation
#[derive(Debug, Error)]
pub enum StampError {
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot write build log: {0}")]
    Report(#[source] io::Error),
}

/// Classify an io::Error raised while writing `path`.
///
/// `dir` is the directory the temporary file lives in; a NotFound on it means
/// the caller never created the output directory.
fn classify(e: io::Error, path: &Path, dir: &Path) -> FilesystemError {
    if e.raw_os_error() == Some(libc::ENOSPC) {
        return FilesystemError::DiskFull(path.to_path_buf());
    }
    match e.kind() {
        io::ErrorKind::NotFound => FilesystemError::MissingDirectory(dir.to_path_buf()),
        io::ErrorKind::PermissionDenied => FilesystemError::PermissionDenied(path.to_path_buf()),
        _ => FilesystemError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

/// Directory that will hold `path`; a bare file name lives in the working directory.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Links followed before giving up, matching the usual kernel limit.
const MAX_SYMLINK_HOPS: usize = 40;

/// Follow symlinks at `path` to the file that should actually be replaced.
///
/// The final target does not have to exist yet; a dangling link names the
/// file to create.
fn resolve_target(path: &Path) -> Result<PathBuf, FilesystemError> {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_SYMLINK_HOPS {
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let link = std::fs::read_link(&current)
                    .map_err(|e| classify(e, path, &parent_dir(&current)))?;
                current = if link.is_absolute() {
                    link
                } else {
                    parent_dir(&current).join(link)
                };
            }
            _ => return Ok(current),
        }
    }
    Err(FilesystemError::Io {
        path: path.to_path_buf(),
        source: io::Error::other("too many levels of symbolic links"),
    })
}

/// Mode for a stamp that did not exist before. The temp file starts at 0600.
#[cfg(unix)]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    None
}

/// Atomically write data to a file using write-to-temp + fsync + rename.
///
/// A symlink at `path` is followed and its target replaced, and an existing
/// file keeps its permissions. The parent directory is never created. If
/// anything fails, the previous file is left as it was.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), FilesystemError> {
    let target = resolve_target(path)?;
    let dir = parent_dir(&target);
    if !dir.is_dir() {
        return Err(FilesystemError::MissingDirectory(dir));
    }

    let permissions = match std::fs::metadata(&target) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| classify(e, path, &dir))?;
    tmp.write_all(data).map_err(|e| classify(e, path, &dir))?;
    if let Some(permissions) = permissions {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| classify(e, path, &dir))?;
    }
    tmp.as_file().sync_all().map_err(|e| classify(e, path, &dir))?;
    tmp.persist(&target).map_err(|e| classify(e.error, path, &dir))?;
    debug!("Replaced {}", target.display());
    Ok(())
}

/// Render a record the way it is stored on disk: two-space indented JSON,
/// no trailing newline.
pub fn to_json(record: &VersionRecord) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(record)
}

/// Print the build-log confirmation for a written stamp.
pub fn report(writer: &mut impl Write, path: &Path, record: &VersionRecord) -> io::Result<()> {
    writeln!(writer, "✓ Generated {}", path.display())?;
    writeln!(writer, "  Build Date: {}", record.build_date)?;
    writeln!(writer, "  Build Time: {}", record.build_time)?;
    writer.flush()
}

/// Generate a stamp and write it to `config.output_path`.
///
/// The clock is sampled exactly once; every field of the record comes from
/// that sample. The file is created or replaced, and the confirmation goes
/// to `log`.
#[instrument(skip_all, fields(path = %config.output_path.display()))]
pub fn generate(
    config: &Config,
    clock: &dyn Clock,
    log: &mut impl Write,
) -> Result<VersionRecord, StampError> {
    let captured = clock.now();
    let record = VersionRecord::from_datetime(&captured);
    debug!(offset = %captured.offset(), "Captured build time {}", captured.to_rfc3339());

    let json = to_json(&record)?;
    atomic_write(&config.output_path, &json)?;

    info!(
        build_date = %record.build_date,
        build_time = %record.build_time,
        build_timestamp = record.build_timestamp,
        "Wrote version stamp"
    );
    report(log, &config.output_path, &record).map_err(StampError::Report)?;

    Ok(record)
}

/// Clock selected by a config: pinned to `SOURCE_DATE_EPOCH` when
/// reproducible builds are enabled, the host clock otherwise.
pub fn clock_for(config: &Config) -> SystemClock {
    if config.reproducible {
        SystemClock::reproducible(config.time_basis)
    } else {
        SystemClock::new(config.time_basis)
    }
}
