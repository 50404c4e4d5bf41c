//! Output path preparation: overwrite policy and destination directories.
//!
//! [`check_destination`] runs first, before any source is read or any temp
//! file exists. [`create_parent_dirs`] runs just before the PDF engine is
//! started; its failure blocks rendering but is not fatal to the run.

use crate::error::MdpdfError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Refuse to continue if `output` exists and `force` is not set.
pub fn check_destination(output: &Path, force: bool) -> Result<(), MdpdfError> {
    if matches!(output.try_exists(), Ok(true)) {
        if !force {
            return Err(MdpdfError::DestinationExists {
                path: output.to_path_buf(),
            });
        }
        info!("Overwriting existing {}", output.display());
    }
    Ok(())
}

/// Create every missing ancestor directory of `output`.
///
/// Walks the parent path one component at a time, creating each missing
/// directory. A directory that already exists (or appears concurrently) is
/// fine; anything else in the way is an error naming the offending path.
/// Returns the directories that were created, outermost first.
pub fn create_parent_dirs(output: &Path) -> io::Result<Vec<PathBuf>> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(Vec::new()),
    };

    let mut created = Vec::new();
    let mut current = PathBuf::new();
    for component in parent.components() {
        current.push(component);
        if current.is_dir() {
            continue;
        }
        match fs::create_dir(&current) {
            Ok(()) => {
                debug!("Created directory {}", current.display());
                created.push(current.clone());
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && current.is_dir() => {}
            Err(e) => {
                return Err(io::Error::new(
                    e.kind(),
                    format!("{}: {}", current.display(), e),
                ))
            }
        }
    }
    Ok(created)
}
