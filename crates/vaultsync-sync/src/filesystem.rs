//! File operations used by the engine
//!
//! ## Design Decisions
//!
//! - **Retention**: before a destination file is overwritten it is moved to
//!   its side's `.retained` folder. The folder keeps one file per name; an
//!   older retained file of the same name is deleted first.
//! - **Modification times**: copies carry the source's modification time,
//!   which is what the planner compares on the next pass. Times are
//!   compared in whole milliseconds.
//! - **Moves**: `rename` first, falling back to copy + delete when the
//!   rename fails (e.g. across filesystems).
//! - Blocking `std::fs` calls that have no `tokio::fs` counterpart run on
//!   `spawn_blocking`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, instrument};

use crate::path_lock::PathLocks;
use crate::SyncError;

// ============================================================================
// Metadata
// ============================================================================

/// Convert a `SystemTime` to epoch milliseconds (negative before 1970).
pub fn system_time_ms(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
    }
}

/// Modification time of a file in epoch milliseconds, `None` if it does not
/// exist.
///
/// # Errors
/// Returns `SyncError::Io` for failures other than "not found".
pub async fn mtime_ms(path: &Path) -> Result<Option<i64>, SyncError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => {
            let modified = meta.modified().map_err(|e| SyncError::io(path, e))?;
            Ok(Some(system_time_ms(modified)))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SyncError::io(path, e)),
    }
}

/// Whether `path` exists (file or directory). Errors count as "absent".
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Whether `path` is an existing regular file
pub async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Whether `path` is an existing directory
pub async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Create `dir` and its parents.
///
/// # Errors
/// Returns `SyncError::Io` if the directory cannot be created.
pub async fn ensure_dir(dir: &Path) -> Result<(), SyncError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SyncError::io(dir, e))
}

async fn ensure_parent(path: &Path) -> Result<(), SyncError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent).await,
        _ => Ok(()),
    }
}

/// Names of the direct children of `dir`, sorted. A missing directory has
/// no children.
///
/// # Errors
/// Returns `SyncError::Io` if the directory exists but cannot be listed.
pub async fn list_names(dir: &Path) -> Result<Vec<(String, bool)>, SyncError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SyncError::io(dir, e)),
    };
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| SyncError::io(dir, e))? {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if let Some(name) = entry.file_name().to_str() {
            names.push((name.to_string(), is_dir));
        }
    }
    names.sort();
    Ok(names)
}

// ============================================================================
// Copy / move / delete
// ============================================================================

/// Copy `source` over `dest`, then give `dest` the source's modification
/// time. Creates the destination's parent directory.
///
/// # Errors
/// Returns `SyncError::Io` naming the path that failed.
#[instrument(level = "debug", fields(source = %source.display(), dest = %dest.display()))]
pub async fn copy_preserving_mtime(source: &Path, dest: &Path) -> Result<(), SyncError> {
    ensure_parent(dest).await?;
    let src = source.to_path_buf();
    let dst = dest.to_path_buf();
    tokio::task::spawn_blocking(move || copy_preserving_mtime_blocking(&src, &dst)).await??;
    debug!("copied with modification time");
    Ok(())
}

fn copy_preserving_mtime_blocking(source: &Path, dest: &Path) -> Result<(), SyncError> {
    let metadata = std::fs::metadata(source).map_err(|e| SyncError::io(source, e))?;
    let modified = metadata.modified().map_err(|e| SyncError::io(source, e))?;
    let mut reader = std::fs::File::open(source).map_err(|e| SyncError::io(source, e))?;

    // A read-only file left at `dest` cannot be truncated in place.
    match std::fs::remove_file(dest) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(SyncError::io(dest, e)),
    }

    // Permissions last: a read-only copy cannot be reopened to set its mtime.
    let mut writer = std::fs::File::create(dest).map_err(|e| SyncError::io(dest, e))?;
    std::io::copy(&mut reader, &mut writer).map_err(|e| SyncError::io(dest, e))?;
    writer
        .set_modified(modified)
        .map_err(|e| SyncError::io(dest, e))?;
    drop(writer);
    std::fs::set_permissions(dest, metadata.permissions()).map_err(|e| SyncError::io(dest, e))
}

/// Move a file, creating the destination's parent directory.
///
/// # Errors
/// Returns `SyncError::Io` naming the path that failed.
pub async fn move_file(source: &Path, dest: &Path) -> Result<(), SyncError> {
    ensure_parent(dest).await?;
    if tokio::fs::rename(source, dest).await.is_ok() {
        return Ok(());
    }
    copy_preserving_mtime(source, dest).await?;
    tokio::fs::remove_file(source)
        .await
        .map_err(|e| SyncError::io(source, e))
}

/// Move a directory tree to `dest`.
///
/// # Errors
/// Returns `SyncError::Io` naming the path that failed.
pub async fn move_dir(source: &Path, dest: &Path) -> Result<(), SyncError> {
    ensure_parent(dest).await?;
    if tokio::fs::rename(source, dest).await.is_ok() {
        return Ok(());
    }
    merge_dir(source, dest, None).await?;
    tokio::fs::remove_dir_all(source)
        .await
        .map_err(|e| SyncError::io(source, e))
}

/// Remove a file or directory tree. A missing path is not an error.
///
/// # Errors
/// Returns `SyncError::Io` if removal fails.
pub async fn remove_path(path: &Path) -> Result<(), SyncError> {
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(SyncError::io(path, e)),
    };
    let result = if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    result.map_err(|e| SyncError::io(path, e))
}

/// Copy every file below `source` into `dest`, creating directories as
/// needed. Files already in `dest` are overwritten by the source's version;
/// files only in `dest` stay. When `locks` is given, each destination file
/// is written under its path lock.
///
/// # Errors
/// Returns `SyncError::Io` on the first failing path.
pub async fn merge_dir(
    source: &Path,
    dest: &Path,
    locks: Option<&PathLocks>,
) -> Result<(), SyncError> {
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(source.to_path_buf(), dest.to_path_buf())];
    while let Some((src_dir, dst_dir)) = pending.pop() {
        ensure_dir(&dst_dir).await?;
        for (name, is_dir) in list_names(&src_dir).await? {
            let src = src_dir.join(&name);
            let dst = dst_dir.join(&name);
            if is_dir {
                pending.push((src, dst));
                continue;
            }
            let _guard = match locks {
                Some(locks) => Some(locks.lock(&dst).await),
                None => None,
            };
            copy_preserving_mtime(&src, &dst).await?;
        }
    }
    Ok(())
}

// ============================================================================
// Retention
// ============================================================================

/// Move `file` into `retained_dir`, replacing an earlier retained file of
/// the same name. Returns the retained path.
///
/// # Errors
/// Returns `SyncError::Io` naming the path that failed.
#[instrument(level = "debug", fields(file = %file.display()))]
pub async fn retain(file: &Path, retained_dir: &Path) -> Result<PathBuf, SyncError> {
    let name = file
        .file_name()
        .ok_or_else(|| SyncError::io(file, std::io::Error::from(ErrorKind::InvalidInput)))?;
    ensure_dir(retained_dir).await?;
    let target = retained_dir.join(name);
    remove_path(&target).await?;
    move_file(file, &target).await?;
    debug!(retained = %target.display(), "retained previous version");
    Ok(target)
}
