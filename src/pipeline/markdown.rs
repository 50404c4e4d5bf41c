//! Markdown → HTML fragment via comrak.
//!
//! The renderer is a pure, single-call transformation: bytes in, HTML bytes
//! out, no state kept between calls. Raw HTML in the input is passed through
//! untouched because the page-break separator is itself raw HTML.

use crate::config::MarkdownOptions;
use comrak::{format_html, nodes::AstNode, parse_document, Arena, Options};
use tracing::{debug, warn};

/// Build the comrak options for the given toggles.
pub fn comrak_options(opts: &MarkdownOptions) -> Options<'static> {
    let mut options = Options::default();
    options.extension.autolink = opts.autolink;
    options.extension.footnotes = opts.footnotes;
    options.render.r#unsafe = true;
    options
}

/// Render the aggregated Markdown buffer into an HTML fragment.
///
/// Input is decoded as UTF-8; invalid sequences are replaced rather than
/// rejected. Nodes nested deeper than `max_nesting` are dropped.
pub fn render_html(markdown: &[u8], opts: &MarkdownOptions) -> Vec<u8> {
    let text = String::from_utf8_lossy(markdown);
    let options = comrak_options(opts);

    let arena = Arena::new();
    let root = parse_document(&arena, &text, &options);
    let pruned = prune_deeper_than(root, opts.max_nesting);
    if pruned > 0 {
        warn!(
            "Dropped {} node(s) nested deeper than {} levels",
            pruned, opts.max_nesting
        );
    }

    let mut html = String::new();
    if let Err(e) = format_html(root, &options, &mut html) {
        // Formatting into a String cannot fail short of a panic in fmt impls.
        warn!("HTML formatting stopped early: {}", e);
    }
    debug!("Rendered {} bytes of markdown → {} bytes of HTML", markdown.len(), html.len());
    html.into_bytes()
}

/// Detach every node below depth `max` (the document root is depth 0).
/// Returns how many subtrees were removed.
fn prune_deeper_than<'a>(root: &'a AstNode<'a>, max: usize) -> usize {
    let mut removed = 0;
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let children: Vec<_> = node.children().collect();
        for child in children {
            if depth + 1 > max {
                child.detach();
                removed += 1;
            } else {
                stack.push((child, depth + 1));
            }
        }
    }
    removed
}
