//! Image extraction from one PDF: structural parse first, rasterise last.
//!
//! ## The two methods
//!
//! The **primary** method parses the PDF with lopdf and pulls the embedded
//! raster XObjects straight out of each page — exact pixels, correct
//! transparency, no resampling. It fails on malformed or non-standard
//! PDFs, and finds nothing on pages whose artwork is vector-only.
//!
//! The **fallback** method hands the whole document to a
//! [`PageRasterizer`] and keeps one 2×-scale render per page. It works on
//! anything a renderer can open but captures the full page layout, not the
//! isolated artwork, so it is strictly a last resort and individually
//! toggleable by the caller.
//!
//! Outcomes are data, never panics or propagated errors: success (paths,
//! no failure), degraded success (paths + failure with
//! `used_fallback = true`), or total failure (no paths + failure with
//! `used_fallback = false`).
//!
//! ## Which image wins on a page?
//!
//! The largest by pixel area, falling back to encoded byte length when the
//! dimensions are unknown. On some layouts a large background texture can
//! out-score the actual card artwork; this heuristic is kept deliberately —
//! it matches what the rest of the pipeline was tuned against, and no
//! replacement tie-break has been validated.

use crate::pipeline::rasterize::{PageRasterizer, FALLBACK_SCALE};
use lopdf::{Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Why the primary method produced nothing.
#[derive(Debug, Error)]
enum PrimaryError {
    #[error("invalid PDF header: {0}")]
    InvalidHeader(String),
    #[error("PDF parse failed: {0}")]
    Parse(String),
    #[error("no images found in PDF")]
    NoImages,
    #[error("failed to write image file: {0}")]
    Write(String),
}

/// A per-source extraction problem, completed into a
/// [`crate::output::FailedSource`] by the collector (which knows the
/// container display names).
#[derive(Debug, Clone)]
pub struct ExtractFailure {
    pub error: String,
    pub used_fallback: bool,
}

/// One embedded raster inside a PDF page: dimensions from the image
/// dictionary plus the encoded bytes.
struct EmbeddedImage {
    width: i64,
    height: i64,
    data: Vec<u8>,
}

impl EmbeddedImage {
    /// Selection score: pixel area, or byte length when the area is
    /// zero/unknown.
    fn score(&self) -> u64 {
        let area = (self.width.max(0) as u64) * (self.height.max(0) as u64);
        if area > 0 {
            area
        } else {
            self.data.len() as u64
        }
    }
}

/// Extract card images from one PDF into `dest_dir`.
///
/// Output files are named `{container_id}_{entry_stem}_p{page}.png` with a
/// 0-based page index, one file per page that yielded an image.
///
/// Returns the ordered output paths plus an optional failure record:
/// - primary succeeded → `(paths, None)`
/// - fallback rescued  → `(paths, Some(used_fallback = true))`
/// - both failed       → `(vec![], Some(used_fallback = false))`
///
/// A PDF with zero pages yields `(vec![], None)` — not an error, and the
/// fallback is not attempted.
pub fn extract_images(
    pdf_bytes: &[u8],
    dest_dir: &Path,
    container_id: &str,
    entry_stem: &str,
    rasterizer: &dyn PageRasterizer,
    fallback_enabled: bool,
) -> (Vec<PathBuf>, Option<ExtractFailure>) {
    let primary_error = match extract_primary(pdf_bytes, dest_dir, container_id, entry_stem) {
        Ok(paths) => {
            // Covers both real successes and the zero-page edge case.
            return (paths, None);
        }
        Err(e) => e,
    };

    debug!(container_id, entry_stem, error = %primary_error, "Primary extraction failed");

    if !fallback_enabled {
        return (
            Vec::new(),
            Some(ExtractFailure {
                error: primary_error.to_string(),
                used_fallback: false,
            }),
        );
    }

    match extract_fallback(pdf_bytes, dest_dir, container_id, entry_stem, rasterizer) {
        Ok(paths) if !paths.is_empty() => (
            paths,
            Some(ExtractFailure {
                error: primary_error.to_string(),
                used_fallback: true,
            }),
        ),
        Ok(_) => (
            // A degraded success must produce at least one card; an empty
            // render counts as a total failure.
            Vec::new(),
            Some(ExtractFailure {
                error: format!("{primary_error}; fallback rendered no pages"),
                used_fallback: false,
            }),
        ),
        Err(fallback_error) => (
            Vec::new(),
            Some(ExtractFailure {
                error: fallback_error,
                used_fallback: false,
            }),
        ),
    }
}

// ── Primary method: lopdf structural parse ───────────────────────────────

fn extract_primary(
    pdf_bytes: &[u8],
    dest_dir: &Path,
    container_id: &str,
    entry_stem: &str,
) -> Result<Vec<PathBuf>, PrimaryError> {
    if !pdf_bytes.starts_with(b"%PDF") {
        let head = &pdf_bytes[..pdf_bytes.len().min(10)];
        return Err(PrimaryError::InvalidHeader(format!("{head:?}")));
    }

    let doc = Document::load_mem(pdf_bytes).map_err(|e| PrimaryError::Parse(e.to_string()))?;

    let page_ids: Vec<ObjectId> = doc.page_iter().collect();
    if page_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for (page_index, &page_id) in page_ids.iter().enumerate() {
        let Some(winner) = largest_page_image(&doc, page_id) else {
            // A page without embedded images contributes nothing; that is
            // only a failure if the whole document stays empty.
            continue;
        };
        if winner.data.is_empty() {
            continue;
        }

        let filename = format!("{container_id}_{entry_stem}_p{page_index}.png");
        let out_path = dest_dir.join(filename);
        std::fs::write(&out_path, &winner.data)
            .map_err(|e| PrimaryError::Write(format!("{}: {e}", out_path.display())))?;
        paths.push(out_path);
    }

    if paths.is_empty() {
        return Err(PrimaryError::NoImages);
    }

    debug!(
        container_id,
        entry_stem,
        images = paths.len(),
        "Primary extraction succeeded"
    );
    Ok(paths)
}

/// Pick the highest-scoring embedded image of one page, if any.
///
/// The first image keeps the spot on a score tie, so extraction order is
/// deterministic for documents with duplicate artwork.
fn largest_page_image(doc: &Document, page_id: ObjectId) -> Option<EmbeddedImage> {
    let mut winner: Option<EmbeddedImage> = None;
    for candidate in page_embedded_images(doc, page_id) {
        match &winner {
            Some(current) if candidate.score() <= current.score() => {}
            _ => winner = Some(candidate),
        }
    }
    winner
}

/// Walk page dict → `/Resources` → `/XObject` and collect every
/// `/Subtype /Image` stream as an [`EmbeddedImage`].
fn page_embedded_images(doc: &Document, page_id: ObjectId) -> Vec<EmbeddedImage> {
    let mut images = Vec::new();

    let Ok(page_obj) = doc.get_object(page_id) else {
        return images;
    };
    let Ok(page_dict) = page_obj.as_dict() else {
        return images;
    };
    let Some(resources) = resolve_dict(doc, page_dict, b"Resources") else {
        return images;
    };
    let Some(xobjects) = resolve_dict(doc, resources, b"XObject") else {
        return images;
    };

    for (_name, obj) in xobjects.iter() {
        let resolved = resolve_object(doc, obj);
        let Object::Stream(stream) = resolved else {
            continue;
        };
        if !is_image_subtype(&stream.dict) {
            continue;
        }

        let width = dict_i64(&stream.dict, b"Width").unwrap_or(0);
        let height = dict_i64(&stream.dict, b"Height").unwrap_or(0);

        match decode_image_stream(doc, stream, width, height) {
            Some(data) => images.push(EmbeddedImage {
                width,
                height,
                data,
            }),
            None => {
                warn!(?page_id, width, height, "Skipping undecodable image XObject");
            }
        }
    }

    images
}

fn is_image_subtype(dict: &lopdf::Dictionary) -> bool {
    dict.get(b"Subtype")
        .map(|obj| matches!(obj, Object::Name(n) if n == b"Image"))
        .unwrap_or(false)
}

/// Turn an image XObject stream into bytes the `image` crate can decode.
///
/// JPEG streams (`DCTDecode`) and any content that already parses as a
/// complete image file pass through verbatim; raw pixel buffers (typically
/// `FlateDecode`) are reconstructed from the stream dictionary's
/// `/Width`, `/Height`, `/BitsPerComponent`, and `/ColorSpace` and
/// re-encoded as PNG.
fn decode_image_stream(
    doc: &Document,
    stream: &lopdf::Stream,
    width: i64,
    height: i64,
) -> Option<Vec<u8>> {
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    if has_dct_filter(&stream.dict) || image::load_from_memory(&content).is_ok() {
        return Some(content);
    }

    reconstruct_raw_pixels(doc, &stream.dict, &content, width, height)
}

fn has_dct_filter(dict: &lopdf::Dictionary) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => n == b"DCTDecode",
        Ok(Object::Array(arr)) => arr
            .iter()
            .any(|o| matches!(o, Object::Name(n) if n == b"DCTDecode")),
        _ => false,
    }
}

/// Rebuild a PNG from an uncompressed pixel buffer.
fn reconstruct_raw_pixels(
    doc: &Document,
    dict: &lopdf::Dictionary,
    raw: &[u8],
    width: i64,
    height: i64,
) -> Option<Vec<u8>> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let (width, height) = (width as u32, height as u32);
    let bpc = dict_i64(dict, b"BitsPerComponent").unwrap_or(8) as u32;
    let channels = color_space_channels(doc, dict);
    let expected = (width as usize) * (height as usize) * (channels as usize) * (bpc as usize) / 8;
    if bpc != 8 || raw.len() < expected {
        return None;
    }

    let pixels = raw[..expected].to_vec();
    let img = match channels {
        1 => image::GrayImage::from_raw(width, height, pixels).map(image::DynamicImage::ImageLuma8),
        3 => image::RgbImage::from_raw(width, height, pixels).map(image::DynamicImage::ImageRgb8),
        4 => image::RgbaImage::from_raw(width, height, pixels).map(image::DynamicImage::ImageRgba8),
        _ => None,
    }?;

    let mut png = std::io::Cursor::new(Vec::new());
    img.write_to(&mut png, image::ImageFormat::Png).ok()?;
    Some(png.into_inner())
}

/// Channel count implied by the `/ColorSpace` entry (default RGB).
fn color_space_channels(doc: &Document, dict: &lopdf::Dictionary) -> u32 {
    let Ok(obj) = dict.get(b"ColorSpace") else {
        return 3;
    };
    match resolve_object(doc, obj) {
        Object::Name(n) => match n.as_slice() {
            b"DeviceGray" => 1,
            b"DeviceCMYK" => 4,
            _ => 3,
        },
        Object::Array(arr) if !arr.is_empty() => match &arr[0] {
            Object::Name(n) if n == b"ICCBased" && arr.len() > 1 => {
                if let Object::Reference(id) = &arr[1] {
                    if let Ok(Object::Stream(s)) = doc.get_object(*id) {
                        return dict_i64(&s.dict, b"N").unwrap_or(3) as u32;
                    }
                }
                3
            }
            Object::Name(n) if n == b"Indexed" => 1,
            _ => 3,
        },
        _ => 3,
    }
}

fn resolve_object<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict<'a>(
    doc: &'a Document,
    dict: &'a lopdf::Dictionary,
    key: &[u8],
) -> Option<&'a lopdf::Dictionary> {
    let obj = dict.get(key).ok()?;
    resolve_object(doc, obj).as_dict().ok()
}

fn dict_i64(dict: &lopdf::Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).ok()?.as_i64().ok()
}

// ── Fallback method: whole-page rasterisation ────────────────────────────

fn extract_fallback(
    pdf_bytes: &[u8],
    dest_dir: &Path,
    container_id: &str,
    entry_stem: &str,
    rasterizer: &dyn PageRasterizer,
) -> Result<Vec<PathBuf>, String> {
    let pages = rasterizer
        .rasterize(pdf_bytes, FALLBACK_SCALE)
        .map_err(|e| e.to_string())?;

    let mut paths = Vec::with_capacity(pages.len());
    for (page_index, page) in pages.iter().enumerate() {
        let filename = format!("{container_id}_{entry_stem}_p{page_index}.png");
        let out_path = dest_dir.join(filename);
        page.save(&out_path)
            .map_err(|e| format!("failed to save rendered page: {e}"))?;
        paths.push(out_path);
    }

    debug!(
        container_id,
        entry_stem,
        pages = paths.len(),
        "Fallback rasterisation succeeded"
    );
    Ok(paths)
}

// ── Tests ────────────────────────────────────────────────────────────────
