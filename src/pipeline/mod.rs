//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one step; [`crate::convert`] runs them
//! in order.
//!
//! ## Data Flow
//!
//! ```text
//! destination ──▶ sources ──▶ markdown ──▶ assemble ──▶ artifact ──▶ pdf
//!  (overwrite)    (buffer)    (comrak)     (skeleton)   (temp .html)  (engine)
//! ```
//!
//! 1. [`destination`]: overwrite policy up front, parent directories before rendering
//! 2. [`sources`]: read every source in order into one buffer
//! 3. [`markdown`]: Markdown → HTML fragment
//! 4. [`assemble`]: wrap the fragment in the page skeleton, splice in styles
//! 5. [`artifact`]: the uniquely named temp file the engine reads
//! 6. [`pdf`]: engine lifecycle and the `wkhtmltopdf` backend

pub mod artifact;
pub mod assemble;
pub mod destination;
pub mod markdown;
pub mod pdf;
pub mod sources;
