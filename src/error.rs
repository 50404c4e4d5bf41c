//! Error types for the mdpdf library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`MdpdfError`]: **Fatal**: the invocation cannot produce a PDF at all
//!   (destination conflict, unreadable source, temp file could not be
//!   created). Returned as `Err(MdpdfError)` from the `convert*` functions,
//!   always before the PDF engine has been started.
//!
//! * [`Warning`]: **Non-fatal**: something went wrong but the pipeline kept
//!   going (missing stylesheet, output directory could not be created, the
//!   engine reported a failure, the echo channel failed, the temp file could
//!   not be removed). Stored in
//!   [`crate::output::ConversionOutcome::warnings`].

use std::path::PathBuf;
use thiserror::Error;

/// Process exit status for a failed read of a markdown source.
pub const EXIT_INPUT_IO: u8 = 5;

/// Process exit status for every other fatal error.
pub const EXIT_FAILURE: u8 = 1;

/// All fatal errors returned by the mdpdf library.
#[derive(Debug, Error)]
pub enum MdpdfError {
    // ── Argument errors ───────────────────────────────────────────────────
    /// The positional argument list was empty, so there is no OUTPUT.
    #[error("No OUTPUT supplied")]
    NoOutput,

    /// Standard input was named more than once in the source list.
    #[error("Standard input ('-') may only be given once as a SOURCE")]
    DuplicateStdin,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Destination errors ────────────────────────────────────────────────
    /// OUTPUT already exists and overwriting was not requested.
    #[error("File {} does already exist. Use -f to overwrite it.", .path.display())]
    DestinationExists { path: PathBuf },

    // ── Input errors ──────────────────────────────────────────────────────
    /// A source could not be opened or read to the end.
    #[error("I/O errors found while reading input '{source_name}': {source}")]
    SourceRead {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    // ── Temp artifact errors ──────────────────────────────────────────────
    /// The temporary HTML file could not be created.
    #[error("Failed to create temporary HTML file in '{}': {source}", .dir.display())]
    TempArtifact {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the assembled document to the temp file failed.
    #[error("Failed to write temporary HTML file '{}': {source}", .path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MdpdfError {
    /// Exit status the CLI should terminate with for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MdpdfError::SourceRead { .. } => EXIT_INPUT_IO,
            _ => EXIT_FAILURE,
        }
    }

    /// Whether usage text should accompany the message.
    pub fn shows_usage(&self) -> bool {
        matches!(
            self,
            MdpdfError::NoOutput | MdpdfError::DuplicateStdin | MdpdfError::DestinationExists { .. }
        )
    }
}

/// A non-fatal problem encountered during a conversion.
///
/// The run continues after any of these; the caller inspects
/// [`crate::output::ConversionOutcome::warnings`] to decide what to report.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum Warning {
    /// The stylesheet could not be opened; the document was assembled without it.
    #[error("Could not open {} for reading. Skipping user supplied styles. ({reason})", .path.display())]
    StylesheetUnavailable { path: PathBuf, reason: String },

    /// The parent directories of OUTPUT could not be created; no PDF was rendered.
    #[error("Could not create directory '{}': {reason}", .path.display())]
    OutputDirectory { path: PathBuf, reason: String },

    /// The PDF engine could not be started.
    #[error("PDF engine unavailable: {reason}")]
    RendererUnavailable { reason: String },

    /// The PDF engine ran but reported failure.
    #[error("Conversion failed for '{}': {reason}", .output.display())]
    RenderFailed { output: PathBuf, reason: String },

    /// The verbose echo channel failed; the temp HTML file is unaffected.
    #[error("Could not echo the generated HTML: {reason}")]
    EchoFailed { reason: String },

    /// The temp HTML file could not be removed.
    #[error("Could not remove temporary file '{}': {reason}", .path.display())]
    CleanupFailed { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_exists_names_path() {
        let e = MdpdfError::DestinationExists {
            path: PathBuf::from("out/report.pdf"),
        };
        let msg = e.to_string();
        assert!(msg.contains("out/report.pdf"), "got: {msg}");
        assert!(msg.contains("-f"), "got: {msg}");
        assert_eq!(e.exit_code(), EXIT_FAILURE);
        assert!(e.shows_usage());
    }

    #[test]
    fn source_read_has_distinct_exit_code() {
        let e = MdpdfError::SourceRead {
            source_name: "missing.md".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(e.exit_code(), EXIT_INPUT_IO);
        assert!(e.to_string().contains("missing.md"));
        assert!(!e.shows_usage());
    }

    #[test]
    fn stylesheet_warning_display() {
        let w = Warning::StylesheetUnavailable {
            path: PathBuf::from("theme.css"),
            reason: "No such file or directory".into(),
        };
        let msg = w.to_string();
        assert!(msg.contains("theme.css"));
        assert!(msg.contains("Skipping user supplied styles"));
    }

    #[test]
    fn warning_serialises() {
        let w = Warning::RenderFailed {
            output: PathBuf::from("a.pdf"),
            reason: "exit status 1".into(),
        };
        let json = serde_json::to_string(&w).expect("serialise");
        assert!(json.contains("RenderFailed"));
        let back: Warning = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, w);
    }
}
