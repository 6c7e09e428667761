//! Public entry points.
//!
//! # Example
//!
//! ```no_run
//! use pdfparse_core::api::PdfDocument;
//!
//! let doc = PdfDocument::open("document.pdf")?;
//! for obj in doc.tree().objects() {
//!     if let Some(body) = doc.stream_body(obj) {
//!         println!("{:?}: {} stream bytes", doc.tree().offset(obj), body.len());
//!     }
//! }
//! # Ok::<(), pdfparse_core::PdfError>(())
//! ```

pub mod builder;
pub mod document;
pub mod high_level;

pub use builder::PdfReader;
pub use document::PdfDocument;
pub use high_level::{ParseOptions, parse, parse_with};
