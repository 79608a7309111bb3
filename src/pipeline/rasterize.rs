//! Whole-page PDF rasterisation — the extraction fallback.
//!
//! The primary extractor recovers authored artwork pixel-exact, but some
//! PDFs in the wild are malformed enough that structural parsing gets
//! nothing out of them. Rasterising every page is the robust last resort:
//! it works for any PDF a renderer can open, at the cost of capturing the
//! full page layout (surrounding whitespace included) instead of the
//! isolated artwork.
//!
//! The capability is a trait so the collector and extractor never depend on
//! a concrete PDF engine: production uses [`PdfiumRasterizer`], tests
//! inject a double that synthesises pages without any native library.

use image::DynamicImage;
use pdfium_render::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Linear scale factor used by the fallback: 2× resolution (4× pixel area)
/// keeps rasterised cards crisp at print size.
pub const FALLBACK_SCALE: f32 = 2.0;

/// A rasterisation failure, carried as text into the failure log.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RasterizeError(pub String);

/// Capability: render every page of a PDF to a raster image with alpha.
pub trait PageRasterizer {
    /// Render all pages at `scale` × the page's native size, in page order.
    fn rasterize(&self, pdf_bytes: &[u8], scale: f32) -> Result<Vec<DynamicImage>, RasterizeError>;
}

/// Production rasteriser backed by pdfium.
///
/// Binds to a pdfium shared library at call time: first a copy next to the
/// executable, then the system library. A missing library surfaces as an
/// ordinary [`RasterizeError`], which the extractor records as a fallback
/// failure for that one source — it never aborts the run.
pub struct PdfiumRasterizer;

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf_bytes: &[u8], scale: f32) -> Result<Vec<DynamicImage>, RasterizeError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| RasterizeError(format!("pdfium library unavailable: {e}")))?;
        let pdfium = Pdfium::new(bindings);

        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|e| RasterizeError(format!("pdfium could not open PDF: {e:?}")))?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let mut images = Vec::new();
        for page in document.pages().iter() {
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| RasterizeError(format!("rasterisation failed: {e:?}")))?;
            // as_image() yields RGBA pixels, so page transparency survives
            // into the saved PNG.
            images.push(bitmap.as_image());
        }

        debug!(pages = images.len(), scale, "Rasterised PDF via pdfium");
        Ok(images)
    }
}
