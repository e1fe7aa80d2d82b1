//! Filesystem reconciliation of the dispatch table.
//!
//! Every operation here is idempotent and safe to interleave with concurrent
//! lookups: a reader may transiently see a missing link mid-relink, which the
//! next rehash (or a retry) heals.

use crate::error::{Result, ShimError};
use crate::plan::{LinkSpec, name_belongs_to_tool, plan_links};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

fn is_symlink(path: &Path) -> io::Result<bool> {
    Ok(fs::symlink_metadata(path)?.file_type().is_symlink())
}

// Converge one link onto its target: matching link is a no-op, a stale link
// is atomically replaced, a non-symlink occupant is a conflict.
fn ensure_link(spec: &LinkSpec, shim_dir: &Path) -> Result<()> {
    let link = shim_dir.join(&spec.name);

    // Two attempts: a concurrent creator can race us between the probe and
    // the symlink call; the second pass sees whatever won.
    for attempt in 0..2 {
        match fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let current = fs::read_link(&link).map_err(|e| ShimError::io(&link, e))?;
                if current == spec.target {
                    return Ok(());
                }
                debug!(link = %link.display(), old = %current.display(),
                       new = %spec.target.display(), "relinking stale shim");
                fs::remove_file(&link).map_err(|e| ShimError::io(&link, e))?;
            }
            Ok(_) => return Err(ShimError::LinkConflict(link)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(ShimError::io(&link, err)),
        }

        match make_symlink(&spec.target, &link) {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && attempt == 0 => continue,
            Err(err) => return Err(ShimError::io(&link, err)),
        }
    }

    Err(ShimError::LinkConflict(link))
}

/// Create (or repair) the link set for `tool@version`.
///
/// A primary-link failure is the operation's result; secondary links
/// (versioned and suffixed variants) fail soft with a warning and never
/// remove or block the primary.
pub fn create_tool_symlinks(
    tool: &str,
    version: &str,
    binary: &Path,
    shim_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(shim_dir).map_err(|e| ShimError::io(shim_dir, e))?;

    for spec in plan_links(tool, version, binary) {
        match ensure_link(&spec, shim_dir) {
            Ok(()) => {}
            Err(err) if spec.primary => return Err(err),
            Err(err) => {
                warn!(tool, link = %spec.name, error = %err, "secondary shim link failed");
            }
        }
    }
    Ok(())
}

/// Remove every link belonging to `tool`: the canonical name and any
/// `tool-<version>` alias. Links of other tools are never touched.
pub fn remove_tool_symlinks(tool: &str, shim_dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(shim_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(ShimError::io(shim_dir, err)),
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name_belongs_to_tool(&name, tool) {
            continue;
        }
        let path = entry.path();
        match is_symlink(&path) {
            Ok(true) => match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!(link = %path.display(), error = %err, "failed to remove shim"),
            },
            Ok(false) => {
                warn!(link = %path.display(), "shim name held by a non-symlink, leaving it");
            }
            Err(_) => {}
        }
    }
    Ok(removed)
}

/// All symlinks in `dir`.
pub fn list_symlinks(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(ShimError::io(dir, err)),
    };

    let mut links: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_symlink(path).unwrap_or(false))
        .collect();
    links.sort();
    Ok(links)
}

/// Symlinks in `dir` whose target no longer exists.
pub fn validate_symlinks(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_symlinks(dir)?
        .into_iter()
        .filter(|link| !link.exists())
        .collect())
}

/// Delete exactly the broken set reported by [`validate_symlinks`].
///
/// This is what makes the dispatch table convergent after an interrupted
/// install or rehash.
pub fn cleanup_broken_symlinks(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for link in validate_symlinks(dir)? {
        match fs::remove_file(&link) {
            Ok(()) => removed += 1,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(link = %link.display(), error = %err, "failed to remove broken shim"),
        }
    }
    Ok(removed)
}
