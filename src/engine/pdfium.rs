//! Production raster engine backed by pdfium.
//!
//! The `thread_safe` feature of `pdfium-render` serialises FFI calls behind
//! a lock, and the `sync` feature marks `Pdfium` as `Send + Sync` on top of
//! it, so one engine can be shared between the owner and the blocking
//! worker thread. pdfium error values carry no useful `Display`; they are
//! formatted with `{:?}` and translated into [`EngineError`] at this seam —
//! nothing pdfium-specific escapes the module.

use crate::engine::{RasterDocument, RasterEngine};
use crate::error::EngineError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// A [`RasterEngine`] that decodes and renders PDFs via pdfium.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Bind to the system pdfium library.
    ///
    /// # Errors
    /// [`EngineError::Bind`] when no compatible pdfium library is found.
    pub fn new() -> Result<Self, EngineError> {
        let bindings = Pdfium::bind_to_system_library().map_err(|e| EngineError::Bind {
            detail: format!("{e:?}"),
        })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl RasterEngine for PdfiumEngine {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn RasterDocument + 'a>, EngineError> {
        let document =
            self.pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| EngineError::Open {
                    detail: format!("{e:?}"),
                })?;

        info!(
            path = %path.display(),
            pages = document.pages().len(),
            "document opened"
        );

        Ok(Box::new(PdfiumDocument { document }))
    }
}

impl RasterDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, EngineError> {
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| EngineError::Render {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| EngineError::Render {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;

        let image = bitmap.as_image();
        debug!(
            page = index + 1,
            width = image.width(),
            height = image.height(),
            "page rendered"
        );

        Ok(image)
    }
}
