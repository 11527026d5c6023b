//! The conversion task: lifecycle, page loop, and event delivery.
//!
//! ## Two contexts, one direction
//!
//! A task runs on a `tokio::task::spawn_blocking` worker thread — pdfium is
//! synchronous and page I/O blocks, so the loop must stay off the async
//! worker threads. The observer drains a [`TaskHandle`] on its own context.
//! Events travel through an unbounded single-consumer channel: sends never
//! block, so a slow (or vanished) observer cannot stall page N+1, and the
//! channel preserves emission order exactly.
//!
//! ## One task per owner
//!
//! A [`Converter`] is the owner: it permits at most one active task at a
//! time, guarded by a single atomic compare-exchange so two near-simultaneous
//! `start` calls cannot both proceed. The flag is cleared by a drop guard
//! only after the terminal event has been emitted, which is what re-enables
//! `start`.
//!
//! State machine: `Idle → Running → {Succeeded, Failed}` — terminal either
//! way, no cancellation, no retry.

use crate::engine::RasterEngine;
use crate::error::TaskError;
use crate::event::ConversionEvent;
use crate::request::{ImageFormat, ValidatedRequest};
use image::DynamicImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owner of conversion tasks; at most one may be active at a time.
pub struct Converter {
    engine: Arc<dyn RasterEngine>,
    running: Arc<AtomicBool>,
}

impl Converter {
    pub fn new(engine: Arc<dyn RasterEngine>) -> Self {
        Self {
            engine,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a task is currently active for this owner.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start a conversion task for a validated request.
    ///
    /// Returns synchronously, before any concurrent work begins. The worker
    /// is spawned onto the blocking pool of the ambient tokio runtime; the
    /// returned [`TaskHandle`] is the only way to observe progress.
    ///
    /// # Errors
    /// [`TaskError::AlreadyRunning`] when a task for this owner is still
    /// active. The in-flight task's event stream is unaffected.
    pub fn start(&self, request: ValidatedRequest) -> Result<TaskHandle, TaskError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TaskError::AlreadyRunning);
        }

        let guard = RunningGuard {
            flag: Arc::clone(&self.running),
        };
        let engine = Arc::clone(&self.engine);
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = tokio::task::spawn_blocking(move || {
            run(engine.as_ref(), &request, &tx);
            // Clear the running flag only after the terminal event is out.
            drop(guard);
        });

        Ok(TaskHandle { events: rx, worker })
    }
}

/// Clears the owner's running flag on drop, including on worker panic.
struct RunningGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Receiving side of one task's event stream.
///
/// Dropping the handle does not cancel the task; the worker runs to its
/// terminal event regardless and further sends are simply discarded.
#[derive(Debug)]
pub struct TaskHandle {
    events: mpsc::UnboundedReceiver<ConversionEvent>,
    worker: JoinHandle<()>,
}

impl TaskHandle {
    /// Receive the next event, in emission order. `None` once the stream has
    /// ended (the terminal event was already delivered).
    pub async fn recv(&mut self) -> Option<ConversionEvent> {
        self.events.recv().await
    }

    /// Drain the remaining events and wait for the worker to finish.
    pub async fn collect(mut self) -> Vec<ConversionEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let _ = self.worker.await;
        events
    }
}

/// Deterministic output file name for a page: `<stem>_page<NNNN>.<ext>` with
/// the 1-based index zero-padded to 4 digits. This naming is a compatibility
/// contract; identical inputs always produce identical names.
pub fn page_file_name(stem: &str, index: usize, format: ImageFormat) -> String {
    format!("{stem}_page{index:04}.{}", format.extension())
}

/// The page loop. Runs to a terminal event on the blocking worker thread.
///
/// The document handle is scoped to this function, so the source is closed
/// on every exit path — success, per-page failure, and open failure alike.
fn run(
    engine: &dyn RasterEngine,
    request: &ValidatedRequest,
    tx: &mpsc::UnboundedSender<ConversionEvent>,
) {
    // Fixed for the whole task; never recomputed per page.
    let scale = request.dpi() as f32 / engine.base_dpi();

    let doc = match engine.open(request.source()) {
        Ok(doc) => doc,
        Err(e) => {
            // Total page count unknown: Failed without a prior Started.
            warn!(source = %request.source().display(), error = %e, "open failed");
            let _ = tx.send(ConversionEvent::Failed {
                message: e.to_string(),
            });
            return;
        }
    };

    let total = doc.page_count();
    info!(
        source = %request.source().display(),
        total,
        dpi = request.dpi(),
        scale,
        "conversion started"
    );
    let _ = tx.send(ConversionEvent::Started { total });

    let stem = request
        .source()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_owned());

    for index in 1..=total {
        let image = match doc.render_page(index - 1, scale) {
            Ok(image) => image,
            Err(e) => {
                warn!(page = index, error = %e, "render failed, aborting");
                let _ = tx.send(ConversionEvent::Failed {
                    message: e.to_string(),
                });
                return;
            }
        };

        let path = request
            .output_dir()
            .join(page_file_name(&stem, index, request.format()));
        if let Err(e) = persist(&image, &path, request.format()) {
            warn!(page = index, path = %path.display(), error = %e, "write failed, aborting");
            let _ = tx.send(ConversionEvent::Failed {
                message: format!("failed to write '{}': {e}", path.display()),
            });
            return;
        }

        debug!(page = index, total, path = %path.display(), "page written");
        let _ = tx.send(ConversionEvent::PageDone {
            index,
            completed: index,
            path,
        });
    }

    info!(total, output_dir = %request.output_dir().display(), "conversion finished");
    let _ = tx.send(ConversionEvent::Finished {
        total,
        output_dir: request.output_dir().to_path_buf(),
    });
}

/// Write a rendered page to disk in the requested format.
///
/// An existing file with the same name is silently overwritten.
fn persist(image: &DynamicImage, path: &Path, format: ImageFormat) -> image::ImageResult<()> {
    match format {
        ImageFormat::Png => image.save_with_format(path, image::ImageFormat::Png),
        // JPEG has no alpha channel; pdfium bitmaps are RGBA.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .save_with_format(path, image::ImageFormat::Jpeg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RasterDocument;
    use crate::error::EngineError;
    use crate::request::ConversionRequest;
    use image::{Rgba, RgbaImage};
    use std::sync::mpsc::Receiver;
    use std::sync::Mutex;

    // ── Stub engine ──────────────────────────────────────────────────────

    #[derive(Default)]
    struct StubEngine {
        pages: usize,
        fail_open: bool,
        /// Fail rendering of this 1-based page.
        fail_at: Option<usize>,
        /// When set, `open` blocks until the sender side releases it.
        gate: Mutex<Option<Receiver<()>>>,
        seen_scale: Mutex<Option<f32>>,
    }

    impl StubEngine {
        fn with_pages(pages: usize) -> Self {
            Self {
                pages,
                ..Default::default()
            }
        }
    }

    impl RasterEngine for StubEngine {
        fn open<'a>(
            &'a self,
            _path: &Path,
        ) -> Result<Box<dyn RasterDocument + 'a>, EngineError> {
            if let Some(gate) = self.gate.lock().unwrap().take() {
                let _ = gate.recv();
            }
            if self.fail_open {
                return Err(EngineError::Open {
                    detail: "stub: unreadable document".into(),
                });
            }
            Ok(Box::new(StubDocument { engine: self }))
        }
    }

    struct StubDocument<'a> {
        engine: &'a StubEngine,
    }

    impl RasterDocument for StubDocument<'_> {
        fn page_count(&self) -> usize {
            self.engine.pages
        }

        fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, EngineError> {
            *self.engine.seen_scale.lock().unwrap() = Some(scale);
            if self.engine.fail_at == Some(index + 1) {
                return Err(EngineError::Render {
                    page: index + 1,
                    detail: "stub: render failure".into(),
                });
            }
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                4,
                4,
                Rgba([12, 34, 56, 255]),
            )))
        }
    }

    fn request(source: &str, out: &Path) -> ValidatedRequest {
        ValidatedRequest {
            inner: ConversionRequest::new(source, out),
        }
    }

    // ── File naming ──────────────────────────────────────────────────────

    #[test]
    fn file_names_are_padded_and_deterministic() {
        assert_eq!(
            page_file_name("deck", 1, ImageFormat::Png),
            "deck_page0001.png"
        );
        assert_eq!(
            page_file_name("deck", 57, ImageFormat::Jpeg),
            "deck_page0057.jpg"
        );
        assert_eq!(
            page_file_name("deck", 12345, ImageFormat::Png),
            "deck_page12345.png"
        );
        // Idempotent: same inputs, same name.
        assert_eq!(
            page_file_name("deck", 3, ImageFormat::Png),
            page_file_name("deck", 3, ImageFormat::Png)
        );
    }

    // ── Event stream properties ──────────────────────────────────────────

    #[tokio::test]
    async fn five_page_run_emits_ordered_stream() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::new(Arc::new(StubEngine::with_pages(5)));
        let handle = converter
            .start(request("deck.pdf", dir.path()))
            .unwrap();
        let events = handle.collect().await;

        assert_eq!(events.len(), 7);
        assert_eq!(events[0], ConversionEvent::Started { total: 5 });
        for i in 1..=5 {
            assert_eq!(
                events[i],
                ConversionEvent::PageDone {
                    index: i,
                    completed: i,
                    path: dir.path().join(format!("deck_page{i:04}.png")),
                }
            );
            assert!(dir.path().join(format!("deck_page{i:04}.png")).is_file());
        }
        assert_eq!(
            events[6],
            ConversionEvent::Finished {
                total: 5,
                output_dir: dir.path().to_path_buf(),
            }
        );
    }

    #[tokio::test]
    async fn jpeg_single_page_uses_jpg_extension() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::new(Arc::new(StubEngine::with_pages(1)));
        let req = ValidatedRequest {
            inner: ConversionRequest::new("name.pdf", dir.path())
                .with_dpi(400)
                .with_format(ImageFormat::Jpeg),
        };
        let events = converter.start(req).unwrap().collect().await;

        let expected = dir.path().join("name_page0001.jpg");
        assert_eq!(
            events,
            vec![
                ConversionEvent::Started { total: 1 },
                ConversionEvent::PageDone {
                    index: 1,
                    completed: 1,
                    path: expected.clone(),
                },
                ConversionEvent::Finished {
                    total: 1,
                    output_dir: dir.path().to_path_buf(),
                },
            ]
        );
        assert!(expected.is_file());
    }

    #[tokio::test]
    async fn render_failure_aborts_after_prior_pages() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine {
            pages: 5,
            fail_at: Some(3),
            ..Default::default()
        };
        let converter = Converter::new(Arc::new(engine));
        let events = converter
            .start(request("deck.pdf", dir.path()))
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 4); // Started, PageDone x2, Failed
        assert_eq!(events[0], ConversionEvent::Started { total: 5 });
        assert!(matches!(
            events[1],
            ConversionEvent::PageDone { index: 1, .. }
        ));
        assert!(matches!(
            events[2],
            ConversionEvent::PageDone { index: 2, .. }
        ));
        match &events[3] {
            ConversionEvent::Failed { message } => {
                assert!(message.contains("page 3"), "got: {message}")
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        // Pages written before the failure remain on disk.
        assert!(dir.path().join("deck_page0001.png").is_file());
        assert!(dir.path().join("deck_page0002.png").is_file());
        assert!(!dir.path().join("deck_page0003.png").exists());
    }

    #[tokio::test]
    async fn write_failure_aborts_after_prior_pages() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the page-2 output path makes the image
        // write fail the way a permission error would.
        std::fs::create_dir(dir.path().join("deck_page0002.png")).unwrap();

        let converter = Converter::new(Arc::new(StubEngine::with_pages(3)));
        let events = converter
            .start(request("deck.pdf", dir.path()))
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 3); // Started, PageDone, Failed
        assert_eq!(events[0], ConversionEvent::Started { total: 3 });
        assert!(matches!(
            events[1],
            ConversionEvent::PageDone { index: 1, .. }
        ));
        match &events[2] {
            ConversionEvent::Failed { message } => assert!(
                message.contains("deck_page0002.png"),
                "got: {message}"
            ),
            other => panic!("expected Failed, got {other:?}"),
        }
        // Page 1 stays on disk, page 3 was never attempted, flag is cleared.
        assert!(dir.path().join("deck_page0001.png").is_file());
        assert!(!dir.path().join("deck_page0003.png").exists());
        assert!(!converter.is_running());
    }

    #[tokio::test]
    async fn open_failure_emits_failed_without_started() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine {
            pages: 5,
            fail_open: true,
            ..Default::default()
        };
        let converter = Converter::new(Arc::new(engine));
        let events = converter
            .start(request("corrupt.pdf", dir.path()))
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ConversionEvent::Failed { .. }));
        assert!(!converter.is_running());
    }

    #[tokio::test]
    async fn empty_document_finishes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::new(Arc::new(StubEngine::with_pages(0)));
        let events = converter
            .start(request("empty.pdf", dir.path()))
            .unwrap()
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                ConversionEvent::Started { total: 0 },
                ConversionEvent::Finished {
                    total: 0,
                    output_dir: dir.path().to_path_buf(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn scale_is_dpi_over_base_dpi() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(StubEngine::with_pages(1));
        let converter = Converter::new(Arc::clone(&engine) as Arc<dyn RasterEngine>);
        let req = ValidatedRequest {
            inner: ConversionRequest::new("deck.pdf", dir.path()).with_dpi(200),
        };
        converter.start(req).unwrap().collect().await;

        let seen = engine.seen_scale.lock().unwrap().unwrap();
        assert!((seen - 200.0 / 72.0).abs() < 1e-6, "got scale {seen}");
    }

    #[tokio::test]
    async fn second_start_is_rejected_until_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let (release, gate) = std::sync::mpsc::channel();
        let engine = StubEngine {
            pages: 1,
            gate: Mutex::new(Some(gate)),
            ..Default::default()
        };
        let converter = Converter::new(Arc::new(engine));

        let handle = converter.start(request("deck.pdf", dir.path())).unwrap();
        assert!(converter.is_running());

        // The in-flight task is still blocked in open(); a second start must
        // fail synchronously and leave the first stream untouched.
        let err = converter
            .start(request("deck.pdf", dir.path()))
            .unwrap_err();
        assert!(matches!(err, TaskError::AlreadyRunning));

        release.send(()).unwrap();
        let events = handle.collect().await;
        assert!(events.last().unwrap().is_terminal());
        assert!(!converter.is_running());

        // Terminal transition re-enables starting a new task.
        let events = converter
            .start(request("deck.pdf", dir.path()))
            .unwrap()
            .collect()
            .await;
        assert!(matches!(
            events.last(),
            Some(ConversionEvent::Finished { .. })
        ));
    }

    #[tokio::test]
    async fn rerun_overwrites_with_identical_names() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::new(Arc::new(StubEngine::with_pages(2)));

        let first = converter
            .start(request("deck.pdf", dir.path()))
            .unwrap()
            .collect()
            .await;
        let second = converter
            .start(request("deck.pdf", dir.path()))
            .unwrap()
            .collect()
            .await;

        let names = |events: &[ConversionEvent]| -> Vec<std::path::PathBuf> {
            events
                .iter()
                .filter_map(|e| match e {
                    ConversionEvent::PageDone { path, .. } => Some(path.clone()),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(names(&first), names(&second));
    }
}
