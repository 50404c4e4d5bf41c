//! Document assembly: wrap the HTML fragment in a fixed page skeleton.
//!
//! The stream is written straight into the temp artifact. When echoing is
//! enabled the same writes go through a [`Tee`], so the echoed copy is
//! byte-identical to what lands on disk.

use crate::error::Warning;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Everything before the optional stylesheet.
pub const HTML_HEAD_START: &str =
    "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n";

/// Wraps user stylesheet bytes; emitted only when a stylesheet was opened.
pub const STYLE_OPEN: &str = "<style>\n";
pub const STYLE_CLOSE: &str = "\n</style>\n";

/// Closes the head and opens the body.
pub const HTML_HEAD_END: &str = "</head>\n<body>\n";

/// Closes the document.
pub const HTML_END: &str = "</body>\n</html>\n";

/// What [`assemble`] produced besides the bytes themselves.
#[derive(Debug, Default)]
pub struct Assembly {
    /// Total bytes written.
    pub bytes: u64,
    /// Whether stylesheet content was included.
    pub styled: bool,
    /// Non-fatal issues (stylesheet could not be opened).
    pub warnings: Vec<Warning>,
}

/// Write the full document for `fragment` to `out`.
///
/// A stylesheet that cannot be opened or read is reported as a [`Warning`] and left
/// out; it never fails the assembly. Only write errors on `out` are returned.
pub fn assemble(
    fragment: &[u8],
    stylesheet: Option<&Path>,
    out: &mut dyn Write,
) -> io::Result<Assembly> {
    let mut out = CountingWriter::new(out);
    let mut assembly = Assembly::default();

    out.write_all(HTML_HEAD_START.as_bytes())?;

    if let Some(path) = stylesheet {
        match std::fs::read(path) {
            Ok(css) => {
                out.write_all(STYLE_OPEN.as_bytes())?;
                out.write_all(&css)?;
                out.write_all(STYLE_CLOSE.as_bytes())?;
                debug!("Included {} bytes of styles from {}", css.len(), path.display());
                assembly.styled = true;
            }
            Err(e) => {
                warn!(
                    "Could not open {} for reading. Skipping user supplied styles. ({})",
                    path.display(),
                    e
                );
                assembly.warnings.push(Warning::StylesheetUnavailable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    out.write_all(HTML_HEAD_END.as_bytes())?;
    out.write_all(fragment)?;
    out.write_all(HTML_END.as_bytes())?;
    out.flush()?;

    assembly.bytes = out.count;
    Ok(assembly)
}

/// Writer that duplicates every write to a primary and a secondary sink.
///
/// Only bytes accepted by the primary are forwarded to the secondary, so the
/// two streams never diverge on short writes. Errors from the primary are
/// returned. The first error from the secondary is kept and echoing stops;
/// the primary is unaffected.
pub struct Tee<A, B> {
    primary: A,
    secondary: B,
    secondary_error: Option<io::Error>,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self {
            primary,
            secondary,
            secondary_error: None,
        }
    }

    /// The error that stopped the secondary sink, if any.
    pub fn take_secondary_error(&mut self) -> Option<io::Error> {
        self.secondary_error.take()
    }

    pub fn into_inner(self) -> (A, B) {
        (self.primary, self.secondary)
    }

    fn echo(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            if self.secondary_error.is_none() {
                self.secondary_error = Some(e);
            }
        }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.primary.write(buf)?;
        if self.secondary_error.is_none() {
            let result = self.secondary.write_all(&buf[..n]);
            self.echo(result);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        if self.secondary_error.is_none() {
            let result = self.secondary.flush();
            self.echo(result);
        }
        Ok(())
    }
}

struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn assemble_to_string(fragment: &str, stylesheet: Option<&Path>) -> (String, Assembly) {
        let mut out = Vec::new();
        let assembly = assemble(fragment.as_bytes(), stylesheet, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), assembly)
    }

    #[test]
    fn skeleton_without_stylesheet() {
        let (doc, assembly) = assemble_to_string("<h1>Title</h1>\n", None);
        assert_eq!(
            doc,
            format!("{HTML_HEAD_START}{HTML_HEAD_END}<h1>Title</h1>\n{HTML_END}")
        );
        assert!(!doc.contains("<style>"));
        assert!(!assembly.styled);
        assert!(assembly.warnings.is_empty());
        assert_eq!(assembly.bytes, doc.len() as u64);
    }

    #[test]
    fn stylesheet_is_copied_verbatim() {
        let dir = TempDir::new().unwrap();
        let css = dir.path().join("theme.css");
        let rules = "h1 { color: red; }\n/* # not markdown */\n<b>raw</b>";
        std::fs::write(&css, rules).unwrap();

        let (doc, assembly) = assemble_to_string("<p>x</p>\n", Some(&css));
        assert!(assembly.styled);
        assert!(doc.contains(&format!("{STYLE_OPEN}{rules}{STYLE_CLOSE}")));
        let style_at = doc.find("<style>").unwrap();
        let body_at = doc.find("<body>").unwrap();
        assert!(style_at < body_at, "styles must sit inside <head>");
    }

    #[test]
    fn missing_stylesheet_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let css = dir.path().join("nope.css");

        let (doc, assembly) = assemble_to_string("<p>x</p>\n", Some(&css));
        assert!(!assembly.styled);
        assert!(!doc.contains("<style>"));
        assert_eq!(assembly.warnings.len(), 1);
        assert!(assembly.warnings[0].to_string().contains("nope.css"));
    }

    #[test]
    fn tee_copies_are_identical() {
        let dir = TempDir::new().unwrap();
        let css = dir.path().join("theme.css");
        std::fs::write(&css, "body { margin: 0 }").unwrap();

        let mut tee = Tee::new(Vec::new(), Vec::new());
        assemble(b"<h1>T</h1>\n", Some(&css), &mut tee).unwrap();
        let (disk, echo) = tee.into_inner();
        assert!(!disk.is_empty());
        assert_eq!(disk, echo);
    }

    #[test]
    fn unreadable_stylesheet_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let styles = dir.path().join("styles");
        std::fs::create_dir(&styles).unwrap();

        let (doc, assembly) = assemble_to_string("<p>x</p>\n", Some(&styles));
        assert!(!assembly.styled);
        assert!(!doc.contains("<style>"));
        assert_eq!(
            doc,
            format!("{HTML_HEAD_START}{HTML_HEAD_END}<p>x</p>\n{HTML_END}")
        );
        assert!(matches!(
            assembly.warnings.as_slice(),
            [Warning::StylesheetUnavailable { path, .. }] if path == &styles
        ));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failing_echo_does_not_disturb_primary() {
        let mut tee = Tee::new(Vec::new(), ClosedPipe);
        let assembly = assemble(b"<h1>T</h1>\n", None, &mut tee).unwrap();

        let err = tee.take_secondary_error().expect("echo error is kept");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        let (disk, _) = tee.into_inner();
        assert_eq!(disk.len() as u64, assembly.bytes);
        assert!(String::from_utf8(disk).unwrap().contains("<h1>T</h1>"));
    }
}
