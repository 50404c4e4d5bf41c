//! Conversion entry points: the orchestration of every pipeline stage.
//!
//! Stages run strictly one after another on the calling thread:
//!
//! 1. check the destination (overwrite policy), before anything else
//! 2. aggregate sources into one Markdown buffer
//! 3. render Markdown → HTML fragment
//! 4. create the temp artifact and assemble the document into it
//! 5. create OUTPUT's parent directories
//! 6. start the PDF engine, render, release the engine
//! 7. remove the temp artifact
//!
//! Steps 1–4 fail fast with [`MdpdfError`]. From step 5 on every problem is
//! recorded as a [`Warning`] and the run still returns `Ok`. The temp artifact
//! is removed on every path once it exists.

use crate::config::ConversionConfig;
use crate::error::{MdpdfError, Warning};
use crate::output::ConversionOutcome;
use crate::pipeline::artifact::{resolve_temp_dir, TempArtifact};
use crate::pipeline::assemble::{assemble, Tee};
use crate::pipeline::destination::{check_destination, create_parent_dirs};
use crate::pipeline::markdown::render_html;
use crate::pipeline::pdf::{EngineGuard, PdfRenderer, Wkhtmltopdf};
use crate::pipeline::sources::{aggregate_from, SourceList};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tracing::{error, info, warn};

/// Convert `sources` into a PDF at `output` using `wkhtmltopdf`.
///
/// Standard input is read from the process's stdin; with `verbose` the
/// assembled HTML is echoed to stdout.
///
/// # Errors
/// Returns `Err(MdpdfError)` only for fatal errors, all of which happen
/// before the PDF engine is started:
/// - OUTPUT exists and `force` is not set
/// - a source cannot be read
/// - the temp HTML file cannot be created or written
pub fn convert(
    sources: &SourceList,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutcome, MdpdfError> {
    let mut engine = Wkhtmltopdf::new(config.wkhtmltopdf.clone());
    let stdin = io::stdin();
    let stdout = io::stdout();
    convert_with(
        sources,
        output.as_ref(),
        config,
        &mut engine,
        &mut stdin.lock(),
        &mut stdout.lock(),
    )
}

/// Convert with an explicit engine, stdin and echo channel.
pub fn convert_with(
    sources: &SourceList,
    output: &Path,
    config: &ConversionConfig,
    engine: &mut dyn PdfRenderer,
    stdin: &mut dyn Read,
    echo: &mut dyn Write,
) -> Result<ConversionOutcome, MdpdfError> {
    info!("Converting {} source(s) → {}", sources.len(), output.display());

    // ── Step 1: Overwrite policy ─────────────────────────────────────────
    check_destination(output, config.force)?;

    // ── Step 2: Aggregate sources ────────────────────────────────────────
    let markdown = aggregate_from(sources, config.page_break, config.input_unit, stdin)?;

    // ── Step 3: Markdown → HTML ──────────────────────────────────────────
    let fragment = render_html(&markdown, &config.markdown);
    drop(markdown);

    // ── Step 4: Assemble into the temp artifact ──────────────────────────
    let temp_dir = config.temp_dir.clone().unwrap_or_else(resolve_temp_dir);
    let mut artifact = TempArtifact::create(&temp_dir)?;

    let artifact_path = artifact.path().to_path_buf();
    let mut echo_error = None;
    let mut assembly = artifact
        .file_mut()
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            let stylesheet = config.stylesheet_path();
            if config.verbose {
                let mut tee = Tee::new(&mut writer, &mut *echo);
                let assembly = assemble(&fragment, stylesheet, &mut tee);
                echo_error = tee.take_secondary_error();
                assembly
            } else {
                assemble(&fragment, stylesheet, &mut writer)
            }
        })
        .map_err(|source| MdpdfError::ArtifactWrite {
            path: artifact_path.clone(),
            source,
        })?;
    if let Some(e) = echo_error {
        warn!("Could not echo the generated HTML: {}", e);
        assembly.warnings.push(Warning::EchoFailed {
            reason: e.to_string(),
        });
    }
    info!(
        "Assembled {} bytes of HTML into {}",
        assembly.bytes,
        artifact_path.display()
    );

    let mut outcome = ConversionOutcome {
        output: output.to_path_buf(),
        pdf_written: false,
        html_bytes: assembly.bytes,
        styled: assembly.styled,
        warnings: assembly.warnings,
    };

    // ── Steps 5–6: Destination directories, then render ──────────────────
    match create_parent_dirs(output) {
        Ok(created) => {
            if !created.is_empty() {
                info!("Created {} directory level(s) for output", created.len());
            }
            render_pdf(engine, &artifact, output, config, &mut outcome);
        }
        Err(e) => {
            let parent = output.parent().unwrap_or(output).to_path_buf();
            error!(
                "Could not create directory '{}': {}; no PDF written",
                parent.display(),
                e
            );
            outcome.warnings.push(Warning::OutputDirectory {
                path: parent,
                reason: e.to_string(),
            });
        }
    }

    // ── Step 7: Remove the temp artifact ─────────────────────────────────
    if let Err(e) = artifact.close() {
        warn!(
            "Could not remove temporary file '{}': {}",
            artifact_path.display(),
            e
        );
        outcome.warnings.push(Warning::CleanupFailed {
            path: artifact_path,
            reason: e.to_string(),
        });
    }

    Ok(outcome)
}

/// Start the engine, render once, release the engine.
fn render_pdf(
    engine: &mut dyn PdfRenderer,
    artifact: &TempArtifact,
    output: &Path,
    config: &ConversionConfig,
    outcome: &mut ConversionOutcome,
) {
    let mut guard = match EngineGuard::acquire(engine) {
        Ok(guard) => guard,
        Err(e) => {
            error!("PDF engine unavailable: {}", e);
            outcome.warnings.push(Warning::RendererUnavailable {
                reason: e.to_string(),
            });
            return;
        }
    };

    match guard.render(artifact.uri(), output, config.load_error_handling) {
        Ok(()) => {
            info!("Wrote {}", output.display());
            outcome.pdf_written = true;
        }
        Err(e) => {
            error!("Conversion failed for '{}': {}", output.display(), e);
            outcome.warnings.push(Warning::RenderFailed {
                output: output.to_path_buf(),
                reason: e.to_string(),
            });
        }
    }
}
