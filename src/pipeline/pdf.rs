//! HTML → PDF: the engine seam and its `wkhtmltopdf` backend.
//!
//! The engine has a process-level lifecycle: it is initialised once right
//! before the first render and torn down once after the last. [`EngineGuard`]
//! ties that lifecycle to a scope: `init` on acquire, `deinit` on drop, on
//! every exit path including early returns and panics. The guard holds the
//! renderer mutably, so the borrow checker rules out a second concurrent
//! initialisation.
//!
//! The shipped backend, [`Wkhtmltopdf`], locates the `wkhtmltopdf`
//! executable during `init` and runs it once per render.

use crate::config::LoadErrorHandling;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Environment variable naming an explicit `wkhtmltopdf` executable.
pub const WKHTMLTOPDF_ENV: &str = "MDPDF_WKHTMLTOPDF";

const WKHTMLTOPDF_BIN: &str = "wkhtmltopdf";

/// Failure reported by a PDF engine.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The engine could not be located or initialised.
    #[error("{0}")]
    Unavailable(String),

    /// `render` was called outside an [`EngineGuard`].
    #[error("PDF engine used before initialisation")]
    NotInitialised,

    /// The engine process could not be started.
    #[error("failed to run '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and reported failure.
    #[error("engine exited with {status}{}", fmt_detail(.detail))]
    Failed { status: String, detail: String },
}

fn fmt_detail(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    }
}

/// An HTML-to-PDF engine.
///
/// Use through [`EngineGuard`], which pairs `init` with `deinit`.
pub trait PdfRenderer {
    /// Prepare the engine. Called once before the first `render`.
    fn init(&mut self) -> Result<(), RenderError>;

    /// Render the document at `page` into a PDF at `output`.
    fn render(
        &mut self,
        page: &Url,
        output: &Path,
        load_errors: LoadErrorHandling,
    ) -> Result<(), RenderError>;

    /// Release the engine. Called once after the last `render`.
    fn deinit(&mut self);
}

/// Scoped acquisition of a [`PdfRenderer`].
pub struct EngineGuard<'r, R: PdfRenderer + ?Sized> {
    renderer: &'r mut R,
}

impl<'r, R: PdfRenderer + ?Sized> EngineGuard<'r, R> {
    /// Initialise `renderer`; it is deinitialised when the guard drops.
    pub fn acquire(renderer: &'r mut R) -> Result<Self, RenderError> {
        renderer.init()?;
        debug!("PDF engine initialised");
        Ok(Self { renderer })
    }

    pub fn render(
        &mut self,
        page: &Url,
        output: &Path,
        load_errors: LoadErrorHandling,
    ) -> Result<(), RenderError> {
        self.renderer.render(page, output, load_errors)
    }
}

impl<R: PdfRenderer + ?Sized> Drop for EngineGuard<'_, R> {
    fn drop(&mut self) {
        self.renderer.deinit();
        debug!("PDF engine released");
    }
}

// ── wkhtmltopdf backend ──────────────────────────────────────────────────

/// Renders by running the `wkhtmltopdf` executable.
///
/// Lookup order at `init`: the explicit path, then `$MDPDF_WKHTMLTOPDF`,
/// then every directory on `$PATH`.
#[derive(Debug, Default)]
pub struct Wkhtmltopdf {
    explicit: Option<PathBuf>,
    binary: Option<PathBuf>,
}

impl Wkhtmltopdf {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            binary: None,
        }
    }

    /// The executable chosen by `init`, if initialised.
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    fn discover(&self) -> Result<PathBuf, RenderError> {
        if let Some(ref path) = self.explicit {
            return existing_file(path);
        }
        if let Some(path) = std::env::var_os(WKHTMLTOPDF_ENV).filter(|v| !v.is_empty()) {
            return existing_file(Path::new(&path));
        }
        find_in_path(WKHTMLTOPDF_BIN, std::env::var_os("PATH")).ok_or_else(|| {
            RenderError::Unavailable(format!(
                "'{WKHTMLTOPDF_BIN}' was not found on PATH.\n\
                 Install wkhtmltopdf or point {WKHTMLTOPDF_ENV} / --wkhtmltopdf at it."
            ))
        })
    }
}

impl PdfRenderer for Wkhtmltopdf {
    fn init(&mut self) -> Result<(), RenderError> {
        let binary = self.discover()?;
        info!("Using {}", binary.display());
        self.binary = Some(binary);
        Ok(())
    }

    fn render(
        &mut self,
        page: &Url,
        output: &Path,
        load_errors: LoadErrorHandling,
    ) -> Result<(), RenderError> {
        let binary = self.binary.as_ref().ok_or(RenderError::NotInitialised)?;

        debug!("{} {} → {}", binary.display(), page, output.display());
        let result = Command::new(binary)
            .arg("--quiet")
            .arg("--load-error-handling")
            .arg(load_errors.as_str())
            .arg(page.as_str())
            .arg(output)
            .output()
            .map_err(|source| RenderError::Spawn {
                program: binary.clone(),
                source,
            })?;

        if result.status.success() {
            Ok(())
        } else {
            Err(RenderError::Failed {
                status: result.status.to_string(),
                detail: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            })
        }
    }

    fn deinit(&mut self) {
        self.binary = None;
    }
}

fn existing_file(path: &Path) -> Result<PathBuf, RenderError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(RenderError::Unavailable(format!(
            "wkhtmltopdf executable not found at '{}'",
            path.display()
        )))
    }
}

/// Search each directory of a `PATH`-style value for an executable named `name`.
pub fn find_in_path(name: &str, path_var: Option<OsString>) -> Option<PathBuf> {
    let file_name = format!("{name}{}", std::env::consts::EXE_SUFFIX);
    std::env::split_paths(&path_var?)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recording {
        inits: usize,
        renders: usize,
        deinits: usize,
        fail_init: bool,
    }

    impl PdfRenderer for Recording {
        fn init(&mut self) -> Result<(), RenderError> {
            self.inits += 1;
            if self.fail_init {
                Err(RenderError::Unavailable("no engine".into()))
            } else {
                Ok(())
            }
        }

        fn render(&mut self, _: &Url, _: &Path, _: LoadErrorHandling) -> Result<(), RenderError> {
            self.renders += 1;
            Ok(())
        }

        fn deinit(&mut self) {
            self.deinits += 1;
        }
    }

    fn page() -> Url {
        Url::parse("file:///tmp/mdpdf-abcdef.html").unwrap()
    }

    #[test]
    fn guard_pairs_init_and_deinit() {
        let mut engine = Recording::default();
        {
            let mut guard = EngineGuard::acquire(&mut engine).unwrap();
            guard
                .render(&page(), Path::new("out.pdf"), LoadErrorHandling::Ignore)
                .unwrap();
        }
        assert_eq!((engine.inits, engine.renders, engine.deinits), (1, 1, 1));
    }

    #[test]
    fn failed_init_skips_deinit() {
        let mut engine = Recording {
            fail_init: true,
            ..Recording::default()
        };
        assert!(EngineGuard::acquire(&mut engine).is_err());
        assert_eq!((engine.inits, engine.deinits), (1, 0));
    }

    #[test]
    fn guard_releases_on_early_return() {
        fn bail(engine: &mut Recording) -> Result<(), RenderError> {
            let _guard = EngineGuard::acquire(engine)?;
            Err(RenderError::Failed {
                status: "exit status: 1".into(),
                detail: String::new(),
            })
        }
        let mut engine = Recording::default();
        assert!(bail(&mut engine).is_err());
        assert_eq!(engine.deinits, 1);
    }

    #[test]
    fn render_before_init_is_rejected() {
        let mut engine = Wkhtmltopdf::default();
        let err = engine
            .render(&page(), Path::new("out.pdf"), LoadErrorHandling::Ignore)
            .unwrap_err();
        assert!(matches!(err, RenderError::NotInitialised));
    }

    #[test]
    fn explicit_missing_binary_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let mut engine = Wkhtmltopdf::new(Some(dir.path().join("wkhtmltopdf")));
        let err = engine.init().unwrap_err();
        assert!(matches!(err, RenderError::Unavailable(_)));
        assert!(engine.binary().is_none());
    }

    #[test]
    fn path_search_finds_first_match() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let name = format!("fake-engine{}", std::env::consts::EXE_SUFFIX);
        std::fs::write(second.path().join(&name), b"").unwrap();

        let path_var = std::env::join_paths([first.path(), second.path()]).unwrap();
        let found = find_in_path("fake-engine", Some(path_var)).unwrap();
        assert_eq!(found, second.path().join(&name));

        assert!(find_in_path("fake-engine", None).is_none());
    }

    #[test]
    fn failed_status_display_includes_detail() {
        let e = RenderError::Failed {
            status: "exit status: 1".into(),
            detail: "Exit with code 1 due to network error".into(),
        };
        assert_eq!(
            e.to_string(),
            "engine exited with exit status: 1: Exit with code 1 due to network error"
        );
    }

    #[cfg(unix)]
    #[test]
    fn runs_engine_process() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let ok = dir.path().join("ok-engine");
        std::fs::write(
            &ok,
            "#!/bin/sh\nfor last; do :; done\nprintf '%%PDF-1.4 %s' \"$*\" > \"$last\"\n",
        )
        .unwrap();
        let bad = dir.path().join("bad-engine");
        std::fs::write(&bad, "#!/bin/sh\necho 'Exit with code 1' >&2\nexit 1\n").unwrap();
        for script in [&ok, &bad] {
            std::fs::set_permissions(script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let out = dir.path().join("out.pdf");
        let mut engine = Wkhtmltopdf::new(Some(ok));
        {
            let mut guard = EngineGuard::acquire(&mut engine).unwrap();
            guard.render(&page(), &out, LoadErrorHandling::Ignore).unwrap();
        }
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.starts_with("%PDF-1.4"));
        assert!(written.contains("--load-error-handling ignore file:///tmp/mdpdf-abcdef.html"));

        let mut engine = Wkhtmltopdf::new(Some(bad));
        let mut guard = EngineGuard::acquire(&mut engine).unwrap();
        let err = guard
            .render(&page(), &dir.path().join("bad.pdf"), LoadErrorHandling::Ignore)
            .unwrap_err();
        assert!(err.to_string().contains("Exit with code 1"), "got: {err}");
    }
}
