//! Temporary HTML artifact: the file the PDF engine reads.
//!
//! The assembled document is written to `mdpdf-XXXXXX.html` inside the
//! resolved temp directory. The file is created exclusively with a random
//! name via [`tempfile::Builder`], and removed when the [`TempArtifact`] is
//! closed or dropped, on every exit path of a conversion. Removal is
//! best-effort: a failure is logged and never turns into an error.

use crate::error::MdpdfError;
use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;

/// Environment variables consulted for the temp directory, highest priority first.
pub const TEMP_DIR_VARS: [&str; 3] = ["TMPDIR", "TMP", "TEMP"];

/// Used when none of [`TEMP_DIR_VARS`] is set.
pub const DEFAULT_TEMP_DIR: &str = "/tmp/";

const PREFIX: &str = "mdpdf-";
const SUFFIX: &str = ".html";
const RAND_LEN: usize = 6;

/// Resolve the temp directory from the process environment.
pub fn resolve_temp_dir() -> PathBuf {
    resolve_temp_dir_with(|key| std::env::var_os(key))
}

/// Resolve the temp directory using `lookup` for environment access.
///
/// The first variable in [`TEMP_DIR_VARS`] with a non-empty value wins.
pub fn resolve_temp_dir_with(lookup: impl Fn(&str) -> Option<OsString>) -> PathBuf {
    TEMP_DIR_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMP_DIR))
}

/// A uniquely named HTML file that is deleted when this value goes away.
#[derive(Debug)]
pub struct TempArtifact {
    file: Option<NamedTempFile>,
    path: PathBuf,
    uri: Url,
}

impl TempArtifact {
    /// Create a fresh, empty artifact inside `dir`.
    pub fn create(dir: &Path) -> Result<TempArtifact, MdpdfError> {
        let wrap = |source: io::Error| MdpdfError::TempArtifact {
            dir: dir.to_path_buf(),
            source,
        };

        let file = tempfile::Builder::new()
            .prefix(PREFIX)
            .suffix(SUFFIX)
            .rand_bytes(RAND_LEN)
            .tempfile_in(dir)
            .map_err(wrap)?;

        let path = std::path::absolute(file.path()).map_err(wrap)?;
        let uri = Url::from_file_path(&path).map_err(|()| {
            wrap(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot express '{}' as a file:// URI", path.display()),
            ))
        })?;

        debug!("Created temp artifact {}", path.display());
        Ok(TempArtifact {
            file: Some(file),
            path,
            uri,
        })
    }

    /// Absolute path of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `file://` address of the artifact.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Writable handle to the artifact.
    pub fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .map(NamedTempFile::as_file_mut)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "temp artifact already removed"))
    }

    /// Remove the artifact now, returning the removal result.
    pub fn close(mut self) -> io::Result<()> {
        self.remove()
    }

    fn remove(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(file) => {
                file.close()?;
                debug!("Removed temp artifact {}", self.path.display());
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            warn!(
                "Could not remove temporary file '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}
