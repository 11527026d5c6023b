//! Observer-side event handling.
//!
//! The channel in [`crate::task::TaskHandle`] already decouples the worker
//! from the observer; this module adds the callback-shaped surface most
//! front-ends want. [`ConversionObserver`] has one method per event with
//! default no-op implementations, and [`TaskHandle::forward_to`] drains the
//! channel on the *caller's* context, invoking the observer there — never on
//! the worker thread. A UI can therefore mutate its own state from the
//! callbacks without any cross-thread synchronisation.
//!
//! # Example
//!
//! ```rust,no_run
//! use pdf2img::{ConversionObserver, Converter, PdfiumEngine, validate, ConversionRequest};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionObserver for Printer {
//!     fn on_page_done(&self, index: usize, completed: usize, path: &Path) {
//!         println!("[{completed}] wrote {}", path.display());
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::new(Arc::new(PdfiumEngine::new()?));
//! let validated = validate(&ConversionRequest::new("deck.pdf", "out"))?;
//! converter.start(validated)?.forward_to(&Printer).await;
//! # Ok(())
//! # }
//! ```

use crate::event::ConversionEvent;
use crate::task::TaskHandle;
use std::path::Path;

/// Receives conversion events, one call per event, in emission order.
///
/// All methods default to no-ops so implementors only override what they
/// care about. Handlers run on the context draining the event stream, so
/// they should return promptly; they must not call back into
/// [`crate::task::Converter::start`].
pub trait ConversionObserver {
    /// The source opened; `total` pages will be converted.
    fn on_started(&self, total: usize) {
        let _ = total;
    }

    /// Page `index` (1-based) was written to `path`; `completed == index`.
    fn on_page_done(&self, index: usize, completed: usize, path: &Path) {
        let _ = (index, completed, path);
    }

    /// Every page converted successfully.
    fn on_finished(&self, total: usize, output_dir: &Path) {
        let _ = (total, output_dir);
    }

    /// The task aborted; earlier pages remain on disk.
    fn on_failed(&self, message: &str) {
        let _ = message;
    }
}

/// For callers that only want the side effects (files on disk).
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

impl TaskHandle {
    /// Drain this task's events, dispatching each to `observer` on the
    /// caller's context. Returns once the terminal event has been delivered.
    pub async fn forward_to(mut self, observer: &dyn ConversionObserver) {
        while let Some(event) = self.recv().await {
            match &event {
                ConversionEvent::Started { total } => observer.on_started(*total),
                ConversionEvent::PageDone {
                    index,
                    completed,
                    path,
                } => observer.on_page_done(*index, *completed, path),
                ConversionEvent::Finished { total, output_dir } => {
                    observer.on_finished(*total, output_dir)
                }
                ConversionEvent::Failed { message } => observer.on_failed(message),
            }
        }
    }
}
