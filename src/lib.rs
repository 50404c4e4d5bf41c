//! # mdpdf
//!
//! Convert one or more Markdown documents into a single PDF.
//!
//! Markdown parsing is done by [comrak]; PDF rendering by an HTML-to-PDF
//! engine (`wkhtmltopdf` by default). This crate is the pipeline between
//! the two: source ordering and page breaks, the HTML page skeleton and
//! stylesheet injection, the temporary HTML file, and preparing the
//! destination path.
//!
//! ## Pipeline Overview
//!
//! ```text
//! SOURCE... ─┐
//!            ├─ 1. Check    refuse to overwrite OUTPUT unless forced
//!            ├─ 2. Read     concatenate sources (+ page-break markers)
//!            ├─ 3. Render   Markdown → HTML fragment
//!            ├─ 4. Wrap     <head> (+ stylesheet) / <body> skeleton → temp .html
//!            ├─ 5. Prepare  create OUTPUT's parent directories
//!            ├─ 6. Print    engine renders file:///…/mdpdf-XXXXXX.html → OUTPUT
//!            └─ 7. Clean    remove the temp .html
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdpdf::{convert, ConversionConfig, SourceList};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .page_break(true)
//!         .stylesheet("print.css")
//!         .build()?;
//!     let sources = SourceList::files(["intro.md", "usage.md"])?;
//!     let outcome = convert(&sources, "book/manual.pdf", &config)?;
//!     for warning in &outcome.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mdpdf` binary (clap + anyhow + tracing-subscriber) |
//!
//! [comrak]: https://docs.rs/comrak

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, LoadErrorHandling, MarkdownOptions};
pub use convert::{convert, convert_with};
pub use error::{MdpdfError, Warning, EXIT_FAILURE, EXIT_INPUT_IO};
pub use output::ConversionOutcome;
pub use pipeline::pdf::{EngineGuard, PdfRenderer, RenderError, Wkhtmltopdf};
pub use pipeline::sources::{Source, SourceList, PAGE_BREAK_SEPARATOR};
