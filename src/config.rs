//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! once via its [`ConversionConfigBuilder`] and then passed by reference to
//! every pipeline stage. Nothing in the pipeline reads process-wide flags.

use crate::error::MdpdfError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default read/growth increment for the source buffer, in bytes.
pub const DEFAULT_INPUT_UNIT: usize = 1024;

/// Default AST nesting bound handed to the Markdown renderer.
pub const DEFAULT_MAX_NESTING: usize = 16;

/// Configuration for a single Markdown-to-PDF conversion.
///
/// # Example
/// ```rust
/// use mdpdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .force(true)
///     .page_break(true)
///     .stylesheet("theme.css")
///     .build()
///     .unwrap();
/// assert!(config.page_break);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Overwrite OUTPUT if it already exists. Default: false.
    pub force: bool,

    /// Insert a page-break separator between consecutive sources. Default: false.
    pub page_break: bool,

    /// CSS file spliced verbatim into the document head. Default: None.
    pub stylesheet: Option<PathBuf>,

    /// Echo the assembled HTML to the echo channel as it is written. Default: false.
    pub verbose: bool,

    /// Read and growth increment for the source buffer, in bytes. Default: 1024.
    pub input_unit: usize,

    /// Options handed to the Markdown renderer.
    pub markdown: MarkdownOptions,

    /// Directory for the temporary HTML file. When None, resolved from the
    /// environment (see [`crate::pipeline::artifact::resolve_temp_dir`]).
    pub temp_dir: Option<PathBuf>,

    /// How the PDF engine treats resources that fail to load. Default: Ignore.
    pub load_error_handling: LoadErrorHandling,

    /// Explicit path to the `wkhtmltopdf` executable. Default: None (discover).
    pub wkhtmltopdf: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            force: false,
            page_break: false,
            stylesheet: None,
            verbose: false,
            input_unit: DEFAULT_INPUT_UNIT,
            markdown: MarkdownOptions::default(),
            temp_dir: None,
            load_error_handling: LoadErrorHandling::default(),
            wkhtmltopdf: None,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The stylesheet path, if one was supplied and is non-empty.
    pub fn stylesheet_path(&self) -> Option<&Path> {
        self.stylesheet
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn force(mut self, v: bool) -> Self {
        self.config.force = v;
        self
    }

    pub fn page_break(mut self, v: bool) -> Self {
        self.config.page_break = v;
        self
    }

    pub fn stylesheet(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.stylesheet = Some(path.into());
        self
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.config.verbose = v;
        self
    }

    pub fn input_unit(mut self, bytes: usize) -> Self {
        self.config.input_unit = bytes;
        self
    }

    pub fn max_nesting(mut self, depth: usize) -> Self {
        self.config.markdown.max_nesting = depth;
        self
    }

    pub fn autolink(mut self, v: bool) -> Self {
        self.config.markdown.autolink = v;
        self
    }

    pub fn footnotes(mut self, v: bool) -> Self {
        self.config.markdown.footnotes = v;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn load_error_handling(mut self, policy: LoadErrorHandling) -> Self {
        self.config.load_error_handling = policy;
        self
    }

    pub fn wkhtmltopdf(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wkhtmltopdf = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, MdpdfError> {
        let c = &self.config;
        if c.input_unit < 64 {
            return Err(MdpdfError::InvalidConfig(format!(
                "input unit must be at least 64 bytes, got {}",
                c.input_unit
            )));
        }
        if c.markdown.max_nesting == 0 || c.markdown.max_nesting > 64 {
            return Err(MdpdfError::InvalidConfig(format!(
                "max nesting must be 1–64, got {}",
                c.markdown.max_nesting
            )));
        }
        Ok(self.config)
    }
}

/// Knobs for the Markdown-to-HTML step.
///
/// Fenced code blocks are part of CommonMark itself and are always parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownOptions {
    /// Maximum AST depth kept in the rendered output. Default: 16.
    pub max_nesting: usize,
    /// Turn bare URLs and e-mail addresses into links. Default: true.
    pub autolink: bool,
    /// Parse `[^ref]` footnotes. Default: true.
    pub footnotes: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
            autolink: true,
            footnotes: true,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the PDF engine does when a linked resource (image, font, iframe)
/// fails to load while rendering the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadErrorHandling {
    /// Abort the conversion.
    Abort,
    /// Leave the failed resource out.
    Skip,
    /// Carry on as if nothing happened. (default)
    #[default]
    Ignore,
}

impl LoadErrorHandling {
    /// The value `wkhtmltopdf --load-error-handling` expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadErrorHandling::Abort => "abort",
            LoadErrorHandling::Skip => "skip",
            LoadErrorHandling::Ignore => "ignore",
        }
    }
}
