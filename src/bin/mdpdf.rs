//! CLI binary for mdpdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, runs one conversion and maps the result to an exit code.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use mdpdf::{
    convert, ConversionConfig, ConversionOutcome, LoadErrorHandling, MdpdfError, SourceList,
    EXIT_FAILURE,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # One file
  mdpdf README.md readme.pdf

  # Several files, each starting on a new page, with custom styles
  mdpdf -p -s print.css intro.md usage.md faq.md book/manual.pdf

  # From standard input
  cat notes.md | mdpdf notes.pdf

  # Replace an existing PDF and show the generated HTML
  mdpdf -f -v README.md readme.pdf

ENVIRONMENT VARIABLES:
  TMPDIR, TMP, TEMP     Directory for the intermediate HTML file (first set wins; default /tmp/)
  MDPDF_WKHTMLTOPDF     Path to the wkhtmltopdf executable (default: search PATH)
  MDPDF_STYLESHEET      Default for --stylesheet
  RUST_LOG              Log filter, e.g. RUST_LOG=mdpdf=debug

EXIT STATUS:
  0  success (a failed PDF engine run is reported but does not change the status)
  1  usage error, or OUTPUT exists without --force
  5  a SOURCE could not be read
"#;

/// Convert Markdown files to a single PDF.
#[derive(Parser, Debug)]
#[command(
    name = "mdpdf",
    disable_version_flag = true,
    about = "Convert markdown in SOURCE, or multiple SOURCE(s), to PDF in OUTPUT",
    long_about = "Convert markdown in SOURCE, or multiple SOURCE(s), to PDF in OUTPUT.\n\
Add CSS rules with --stylesheet pointing to a file. With no SOURCE, markdown is read \
from standard input.",
    override_usage = "mdpdf [OPTIONS] [SOURCE]... OUTPUT",
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown sources followed by the PDF to write; `-` reads standard input.
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Overwrite destination files.
    #[arg(short, long, env = "MDPDF_FORCE")]
    force: bool,

    /// Add a page break between sources.
    #[arg(short, long, env = "MDPDF_PAGE_BREAK")]
    page_break: bool,

    /// Add the CSS rules in this file to the document head.
    #[arg(short, long, value_name = "PATH", env = "MDPDF_STYLESHEET")]
    stylesheet: Option<PathBuf>,

    /// Print the generated HTML to stdout and enable debug logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress everything except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the wkhtmltopdf executable.
    #[arg(long, value_name = "PATH", env = "MDPDF_WKHTMLTOPDF")]
    wkhtmltopdf: Option<PathBuf>,

    /// What the PDF engine does when a linked resource fails to load.
    #[arg(long, value_enum, default_value = "ignore")]
    load_error_handling: LoadErrorArg,

    /// Print version.
    #[arg(short = 'V', long)]
    version: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LoadErrorArg {
    Abort,
    Skip,
    Ignore,
}

impl From<LoadErrorArg> for LoadErrorHandling {
    fn from(v: LoadErrorArg) -> Self {
        match v {
            LoadErrorArg::Abort => LoadErrorHandling::Abort,
            LoadErrorArg::Skip => LoadErrorHandling::Skip,
            LoadErrorArg::Ignore => LoadErrorHandling::Ignore,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help goes to stdout and succeeds; everything else is a usage error.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if cli.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(outcome) => {
            if outcome.pdf_written && !cli.quiet {
                eprintln!("✔ {}", outcome.output.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            let fatal = err.downcast_ref::<MdpdfError>();
            if fatal.is_some_and(MdpdfError::shows_usage) {
                eprintln!("{}", Cli::command().render_usage());
            }
            ExitCode::from(fatal.map_or(EXIT_FAILURE, MdpdfError::exit_code))
        }
    }
}

fn run(cli: &Cli) -> Result<ConversionOutcome> {
    let (sources, output) = SourceList::from_positionals(cli.paths.iter().cloned())?;
    let config = build_config(cli)?;
    let outcome = convert(&sources, &output, &config)?;
    Ok(outcome)
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .force(cli.force)
        .page_break(cli.page_break)
        .verbose(cli.verbose)
        .load_error_handling(cli.load_error_handling.clone().into());

    if let Some(ref path) = cli.stylesheet {
        builder = builder.stylesheet(path);
    }
    if let Some(ref path) = cli.wkhtmltopdf {
        builder = builder.wkhtmltopdf(path);
    }

    builder.build().context("Invalid configuration")
}
