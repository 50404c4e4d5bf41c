//! Source aggregation: read every Markdown source, in order, into one buffer.
//!
//! The aggregated buffer is the only input the Markdown renderer sees, so
//! document order is exactly argument order. With page breaks enabled a fixed
//! raw-HTML separator goes *between* sources, never before the first or after
//! the last.

use crate::error::MdpdfError;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Markup inserted between consecutive sources when page breaks are enabled.
pub const PAGE_BREAK_SEPARATOR: &str =
    "\n\n<div class=\"page-break\" style=\"page-break-after: always;\"></div>\n\n";

/// One Markdown input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Standard input, read to end-of-stream.
    Stdin,
    /// A file on disk.
    File(PathBuf),
}

impl Source {
    /// Classify a positional argument; `-` names standard input.
    pub fn from_arg(arg: impl Into<PathBuf>) -> Self {
        let path = arg.into();
        if path.as_os_str() == "-" {
            Source::Stdin
        } else {
            Source::File(path)
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => f.write_str("<stdin>"),
            Source::File(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Ordered, non-empty list of sources. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceList {
    sources: Vec<Source>,
}

impl SourceList {
    /// Split raw positional arguments into sources and the OUTPUT path.
    ///
    /// The last argument is always OUTPUT. If nothing precedes it, the single
    /// source is standard input.
    pub fn from_positionals<I, P>(args: I) -> Result<(SourceList, PathBuf), MdpdfError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut args: Vec<PathBuf> = args.into_iter().map(Into::into).collect();
        let output = args.pop().ok_or(MdpdfError::NoOutput)?;

        let sources = if args.is_empty() {
            SourceList::stdin()
        } else {
            SourceList::new(args.into_iter().map(Source::from_arg).collect())?
        };
        Ok((sources, output))
    }

    /// Build a list from explicit sources. An empty vector means standard input.
    pub fn new(sources: Vec<Source>) -> Result<SourceList, MdpdfError> {
        if sources.is_empty() {
            return Ok(SourceList::stdin());
        }
        if sources.iter().filter(|s| **s == Source::Stdin).count() > 1 {
            return Err(MdpdfError::DuplicateStdin);
        }
        Ok(SourceList { sources })
    }

    /// A list holding only standard input.
    pub fn stdin() -> SourceList {
        SourceList {
            sources: vec![Source::Stdin],
        }
    }

    /// Convenience constructor for a list of file paths.
    pub fn files<I, P>(paths: I) -> Result<SourceList, MdpdfError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        SourceList::new(
            paths
                .into_iter()
                .map(|p| Source::File(p.as_ref().to_path_buf()))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Read every source into one contiguous buffer, taking standard input from
/// `stdin`.
///
/// Any open or read failure aborts the whole aggregation; the partial buffer
/// is dropped and the failing source is named in the error.
pub fn aggregate_from(
    sources: &SourceList,
    page_break: bool,
    unit: usize,
    stdin: &mut dyn Read,
) -> Result<Vec<u8>, MdpdfError> {
    let mut buf = Vec::with_capacity(unit);
    let last = sources.len().saturating_sub(1);

    for (i, source) in sources.iter().enumerate() {
        let read = match source {
            Source::Stdin => read_chunked(stdin, &mut buf, unit),
            Source::File(path) => std::fs::File::open(path)
                .and_then(|mut f| read_chunked(&mut f, &mut buf, unit)),
        }
        .map_err(|e| MdpdfError::SourceRead {
            source_name: source.to_string(),
            source: e,
        })?;
        debug!("Read {} bytes from {}", read, source);

        if page_break && i < last {
            buf.extend_from_slice(PAGE_BREAK_SEPARATOR.as_bytes());
        }
    }

    info!(
        "Aggregated {} source(s) into {} bytes",
        sources.len(),
        buf.len()
    );
    Ok(buf)
}

/// Append everything `reader` yields to `buf`, growing by `unit` bytes at a time.
fn read_chunked(reader: &mut dyn Read, buf: &mut Vec<u8>, unit: usize) -> io::Result<usize> {
    let mut chunk = vec![0u8; unit];
    let mut total = 0;
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(total),
            Ok(n) => {
                if buf.capacity() - buf.len() < n {
                    buf.reserve(unit);
                }
                buf.extend_from_slice(&chunk[..n]);
                total += n;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn last_positional_is_output() {
        let (sources, output) = SourceList::from_positionals(["a.md", "b.md", "out.pdf"]).unwrap();
        assert_eq!(output, PathBuf::from("out.pdf"));
        let got: Vec<_> = sources.iter().cloned().collect();
        assert_eq!(
            got,
            vec![Source::File("a.md".into()), Source::File("b.md".into())]
        );
    }

    #[test]
    fn only_output_means_stdin() {
        let (sources, output) = SourceList::from_positionals(["out.pdf"]).unwrap();
        assert_eq!(output, PathBuf::from("out.pdf"));
        assert_eq!(sources, SourceList::stdin());
    }

    #[test]
    fn no_positionals_is_missing_output() {
        let err = SourceList::from_positionals(Vec::<PathBuf>::new()).unwrap_err();
        assert!(matches!(err, MdpdfError::NoOutput));
    }

    #[test]
    fn dash_names_stdin_once() {
        let (sources, _) = SourceList::from_positionals(["a.md", "-", "out.pdf"]).unwrap();
        assert_eq!(sources.iter().nth(1), Some(&Source::Stdin));

        let err = SourceList::from_positionals(["-", "-", "out.pdf"]).unwrap_err();
        assert!(matches!(err, MdpdfError::DuplicateStdin));
    }

    #[test]
    fn separator_only_between_sources() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.md", "# A");
        let b = write(&dir, "b.md", "# B");
        let sources = SourceList::files([&a, &b]).unwrap();

        let buf = aggregate_from(&sources, true, 64, &mut io::empty()).unwrap();
        let expected = format!("# A{}# B", PAGE_BREAK_SEPARATOR);
        assert_eq!(buf, expected.as_bytes());
        assert_eq!(
            String::from_utf8(buf).unwrap().matches("page-break\"").count(),
            1
        );
    }

    #[test]
    fn no_separator_without_page_break() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.md", "one\n");
        let b = write(&dir, "b.md", "two\n");
        let c = write(&dir, "c.md", "three\n");
        let sources = SourceList::files([&a, &b, &c]).unwrap();

        let buf = aggregate_from(&sources, false, 64, &mut io::empty()).unwrap();
        assert_eq!(buf, b"one\ntwo\nthree\n");
    }

    #[test]
    fn single_source_never_gets_separator() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.md", "# Only");
        let sources = SourceList::files([&a]).unwrap();
        let buf = aggregate_from(&sources, true, 64, &mut io::empty()).unwrap();
        assert_eq!(buf, b"# Only");
    }

    #[test]
    fn reads_stdin_larger_than_unit() {
        let body = "x".repeat(1000);
        let mut stdin = Cursor::new(body.clone().into_bytes());
        let buf = aggregate_from(&SourceList::stdin(), false, 64, &mut stdin).unwrap();
        assert_eq!(buf, body.as_bytes());
    }

    #[test]
    fn missing_file_is_fatal_and_named() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.md", "# A");
        let missing = dir.path().join("missing.md");
        let sources = SourceList::files([&a, &missing]).unwrap();

        let err = aggregate_from(&sources, true, 64, &mut io::empty()).unwrap_err();
        match err {
            MdpdfError::SourceRead { source_name, .. } => {
                assert!(source_name.ends_with("missing.md"), "got: {source_name}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
