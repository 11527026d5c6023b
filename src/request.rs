//! Request value types: what to convert, where to, and how.
//!
//! A [`ConversionRequest`] is an immutable value constructed once per run.
//! It is never mutated after the task starts; the task reads it, the observer
//! never sees it. Validation (see [`crate::validate`]) turns a request into a
//! [`ValidatedRequest`], which is the only input [`crate::task::Converter::start`]
//! accepts — the type system guarantees no task runs on an unchecked path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output raster format for the produced page images.
///
/// The format also fixes the file extension of every produced page
/// (`png` / `jpg`) — part of the output naming contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    /// Lossless PNG (default). Text stays crisp at any DPI.
    #[default]
    Png,
    /// JPEG, written with the `jpg` extension. Smaller files, lossy.
    Jpeg,
}

impl ImageFormat {
    /// File extension used for produced pages.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// An immutable conversion request: source document, output directory,
/// rendering resolution, and output format.
///
/// # Example
/// ```rust
/// use pdf2img::{ConversionRequest, ImageFormat};
///
/// let request = ConversionRequest::new("deck.pdf", "out")
///     .with_dpi(300)
///     .with_format(ImageFormat::Jpeg);
/// assert_eq!(request.dpi(), 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    source: PathBuf,
    output_dir: PathBuf,
    dpi: u32,
    format: ImageFormat,
}

impl ConversionRequest {
    /// Create a request with the default resolution (200 DPI) and format (PNG).
    pub fn new(source: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output_dir: output_dir.into(),
            dpi: 200,
            format: ImageFormat::default(),
        }
    }

    /// Set the rendering resolution. Clamped to 1–1200; typical range 72–600.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.clamp(1, 1200);
        self
    }

    /// Set the output raster format.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// A request that has passed precondition checks.
///
/// Only [`crate::validate::validate`] constructs this; holding one means the
/// source file existed and was readable and the output directory exists.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub(crate) inner: ConversionRequest,
}

impl ValidatedRequest {
    pub fn source(&self) -> &Path {
        self.inner.source()
    }

    pub fn output_dir(&self) -> &Path {
        self.inner.output_dir()
    }

    pub fn dpi(&self) -> u32 {
        self.inner.dpi()
    }

    pub fn format(&self) -> ImageFormat {
        self.inner.format()
    }
}
