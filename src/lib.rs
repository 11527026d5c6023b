//! # pdf2img
//!
//! Convert a multi-page PDF into one raster image per page, with an ordered
//! progress event stream delivered while the conversion runs off the caller's
//! execution context.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ConversionRequest
//!  │
//!  ├─ 1. Validate  source exists, output directory created
//!  ├─ 2. Start     atomic running-flag guard, spawn_blocking worker
//!  ├─ 3. Open      load the document via the raster engine (pdfium)
//!  ├─ 4. Loop      render page i at fixed scale → write <stem>_pageNNNN.ext
//!  └─ 5. Events    Started → PageDone… → Finished | Failed
//! ```
//!
//! The worker and the observer are the only two execution contexts. The
//! worker emits events into a single-consumer ordered channel and never
//! blocks on the observer; the observer drains the [`TaskHandle`] on its own
//! context (or forwards to a [`ConversionObserver`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2img::{validate, ConversionRequest, Converter, ImageFormat, PdfiumEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ConversionRequest::new("deck.pdf", "out")
//!         .with_dpi(200)
//!         .with_format(ImageFormat::Png);
//!     let validated = validate(&request)?;
//!
//!     let converter = Converter::new(Arc::new(PdfiumEngine::new()?));
//!     let mut handle = converter.start(validated)?;
//!     while let Some(event) = handle.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## What this crate is not
//!
//! No batch mode, no cancellation of an in-flight task, no retry of a failed
//! page, and no front-end: collecting user input and displaying status belong
//! to the host application, which only sees [`ConversionEvent`]s.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod engine;
pub mod error;
pub mod event;
pub mod observer;
pub mod request;
pub mod task;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use engine::pdfium::PdfiumEngine;
pub use engine::{RasterDocument, RasterEngine};
pub use error::{EngineError, TaskError, ValidationError};
pub use event::ConversionEvent;
pub use observer::{ConversionObserver, NoopObserver};
pub use request::{ConversionRequest, ImageFormat, ValidatedRequest};
pub use task::{Converter, TaskHandle};
pub use validate::validate;
