//! Invoice form with a live preview and PDF export.
//!
//! The model ([`Invoice`], [`LineItem`]) keeps the raw text a user typed and
//! derives every number from it on read. [`render_preview`] and
//! [`export_document`] are pure entry points over an invoice snapshot, and
//! [`Session`] ties them into an edit → recompute → render loop.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod pdf;
pub mod preview;
pub mod session;
pub mod totals;

pub use error::{Error, Result};
pub use export::{artifact_file_name, export_document, Artifact, DocumentSurface};
pub use model::{parse_amount, HeaderField, Invoice, ItemField, LineItem};
pub use pdf::{export_pdf, PdfSurface};
pub use preview::{render_preview, PreviewRow, PreviewView};
pub use session::{Edit, Session};
pub use totals::{compute_totals, format_currency, Totals};
