//! Result of a conversion run.

use crate::error::Warning;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a conversion produced.
///
/// Returned even when the PDF could not be written: fatal problems are
/// `Err(MdpdfError)`, everything else ends up in `warnings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// The destination path.
    pub output: PathBuf,
    /// True when the PDF engine reported success.
    pub pdf_written: bool,
    /// Size of the assembled HTML document in bytes.
    pub html_bytes: u64,
    /// True when stylesheet content was spliced into the document.
    pub styled: bool,
    /// Non-fatal issues, in the order they occurred.
    pub warnings: Vec<Warning>,
}

impl ConversionOutcome {
    /// True when the PDF was written and nothing needed reporting.
    pub fn is_clean(&self) -> bool {
        self.pdf_written && self.warnings.is_empty()
    }
}
