//! Error types for the pdf2img library.
//!
//! Three distinct error types reflect three distinct failure surfaces:
//!
//! * [`ValidationError`] — precondition failures, returned synchronously by
//!   [`crate::validate::validate`] before any task exists.
//!
//! * [`TaskError`] — returned synchronously by
//!   [`crate::task::Converter::start`] when a task cannot begin
//!   (another one is already active for the same owner).
//!
//! * [`EngineError`] — raised by a [`crate::engine::RasterEngine`] while a
//!   task is running. These never cross the worker/observer boundary as
//!   errors: the task translates them into a terminal
//!   [`crate::event::ConversionEvent::Failed`] event carrying a
//!   human-readable message.
//!
//! Engine-specific representations (pdfium error codes and the like) stay
//! behind the engine seam; everything surfaced here is already translated.

use std::path::PathBuf;
use thiserror::Error;

/// Precondition failures detected before a task may start.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Source path is empty or does not reference an existing, readable file.
    #[error("invalid source: '{path}' is not an existing readable file")]
    InvalidSource { path: PathBuf },

    /// Output directory path is empty.
    #[error("invalid output: output directory path is empty")]
    InvalidOutput,

    /// The output directory was absent and could not be created.
    #[error("output directory '{path}' could not be created: {source}")]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures to begin a task, reported synchronously by `start`.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A conversion is already active for this owner; at most one is allowed.
    #[error("a conversion task is already running")]
    AlreadyRunning,
}

/// Failures raised by a raster engine while a task runs.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine initialisation failed (missing or incompatible native library).
    #[error("failed to bind raster engine: {detail}")]
    Bind { detail: String },

    /// The source document could not be opened (corrupt, unsupported, I/O).
    #[error("failed to open document: {detail}")]
    Open { detail: String },

    /// A single page could not be rendered. `page` is 1-based.
    #[error("failed to render page {page}: {detail}")]
    Render { page: usize, detail: String },
}
