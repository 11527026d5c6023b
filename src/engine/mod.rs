//! The rasterization capability seam.
//!
//! The conversion task does not depend on pdfium directly; it talks to a
//! [`RasterEngine`] behind `Arc<dyn RasterEngine>`. The trait captures the
//! four capabilities the task needs — open a document by path, get the page
//! count, render page *i* at a scale, and (via [`image::DynamicImage`])
//! persist the pixels — so the core loop is testable against a stub engine
//! and portable to any conforming backend.
//!
//! A [`RasterDocument`] borrows its engine and is released on drop, which is
//! how the task guarantees the source is closed on every exit path.

pub mod pdfium;

use crate::error::EngineError;
use image::DynamicImage;
use std::path::Path;

/// Reference resolution of PDF user space: one point is 1/72 inch.
/// The per-task render scale is `requested_dpi / BASE_DPI`.
pub const BASE_DPI: f32 = 72.0;

/// A document decoding and rasterization backend.
///
/// Implementations must be shareable across threads: the task calls the
/// engine from a blocking worker thread while the owner lives elsewhere.
pub trait RasterEngine: Send + Sync {
    /// Open a document by path. The returned handle borrows the engine and
    /// closes the document when dropped.
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RasterDocument + 'a>, EngineError>;

    /// Native reference resolution the scale factor is computed against.
    fn base_dpi(&self) -> f32 {
        BASE_DPI
    }
}

/// An open document: page count plus per-page rendering.
pub trait RasterDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Render the page at `index` (0-based) at `scale` × the document's
    /// native page size, into a pixel buffer.
    fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, EngineError>;
}
