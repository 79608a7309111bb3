//! Pagination of card images onto a printable A4 card sheet.
//!
//! Cards land on a 3×3 grid of fixed-size cells, centered on the page,
//! filled in sequence order from the bottom-left cell rightward then
//! upward. Cut marks at every grid-line position let the printed sheet be
//! trimmed with a straightedge. The grid geometry is constant; what varies
//! per run is only which cards land in which cells.

use crate::error::CardsheetError;
use crate::output::CardImage;
use crate::progress::ProgressObserver;
use printpdf::{
    Color, Line, LinePoint, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt,
    RawImage, RawImageData, RawImageFormat, Rgb, XObjectTransform,
};
use std::path::Path;
use tracing::{debug, info};

/// A4 portrait, in PDF points.
pub const PAGE_WIDTH_PT: f32 = 595.2756;
pub const PAGE_HEIGHT_PT: f32 = 841.8898;

/// Default card cell size in points. 190 × 266 pt leaves room for the 3×3
/// grid plus cut-mark margins on A4.
pub const CARD_WIDTH_PT: f32 = 190.0;
pub const CARD_HEIGHT_PT: f32 = 266.0;

pub const GRID_COLS: usize = 3;
pub const GRID_ROWS: usize = 3;

/// Cards per page.
pub const CARDS_PER_PAGE: usize = GRID_COLS * GRID_ROWS;

const CUT_MARK_LEN_PT: f32 = 12.0;
const CUT_MARK_THICKNESS_PT: f32 = 0.5;

/// Write the card-sheet PDF for `cards`, in the given order, returning the
/// page count.
///
/// Cells are `card_width` × `card_height` points. Each card is scaled to
/// fit its cell preserving aspect ratio (upscaling allowed, never cropped)
/// and anchored at the cell's bottom-left corner. PNG transparency is
/// preserved.
///
/// Fails with [`CardsheetError::NothingToLayOut`] on empty input — before
/// any file is created — and with [`CardsheetError::CardImageUnreadable`]
/// if a card's backing file has gone missing or undecodable since
/// collection.
pub fn write_card_sheet(
    cards: &[CardImage],
    output_path: &Path,
    card_width: f32,
    card_height: f32,
    progress: Option<&ProgressObserver>,
) -> Result<usize, CardsheetError> {
    if cards.is_empty() {
        return Err(CardsheetError::NothingToLayOut);
    }

    let total_pages = cards.len().div_ceil(CARDS_PER_PAGE);
    if let Some(p) = progress {
        p.on_layout_start(total_pages);
    }

    let mut doc = PdfDocument::new("Card Sheet");
    let mut pages = Vec::with_capacity(total_pages);

    for (page_index, chunk) in cards.chunks(CARDS_PER_PAGE).enumerate() {
        let mut ops = cut_mark_ops(card_width, card_height);

        for (i, card) in chunk.iter().enumerate() {
            let (raw, px_width, px_height) = load_card_image(&card.image_path)?;
            let xobject_id = doc.add_image(&raw);

            let (cell_x, cell_y) = cell_origin(i, card_width, card_height);
            // With dpi = 72 one pixel maps to one point, so a single fit
            // ratio scales the bitmap into the cell.
            let scale = (card_width / px_width as f32).min(card_height / px_height as f32);

            ops.push(Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(cell_x)),
                    translate_y: Some(Pt(cell_y)),
                    rotate: None,
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(72.0),
                },
            });
        }

        pages.push(PdfPage::new(Mm(210.0), Mm(297.0), ops));

        debug!(page = page_index + 1, cards = chunk.len(), "Laid out page");
        if let Some(p) = progress {
            p.on_page_written(page_index + 1, total_pages);
        }
    }

    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);

    std::fs::write(output_path, &bytes).map_err(|e| CardsheetError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    info!(
        cards = cards.len(),
        pages = total_pages,
        output = %output_path.display(),
        "Card sheet written"
    );
    Ok(total_pages)
}

/// Bottom-left corner of the cell for chunk index `i`.
///
/// Row 0 is the bottom row; filling proceeds left-to-right, bottom-to-top,
/// which in PDF's bottom-left coordinate space is plain row-major order.
fn cell_origin(i: usize, card_width: f32, card_height: f32) -> (f32, f32) {
    let (offset_x, offset_y) = grid_offsets(card_width, card_height);
    let col = i % GRID_COLS;
    let row = i / GRID_COLS;
    (
        offset_x + col as f32 * card_width,
        offset_y + row as f32 * card_height,
    )
}

/// Margins that center the grid on the page.
fn grid_offsets(card_width: f32, card_height: f32) -> (f32, f32) {
    (
        (PAGE_WIDTH_PT - GRID_COLS as f32 * card_width) / 2.0,
        (PAGE_HEIGHT_PT - GRID_ROWS as f32 * card_height) / 2.0,
    )
}

/// Cut marks: 12 pt ticks at every grid-line position, drawn inward from
/// the page edges so they survive trimming of the outermost cards.
fn cut_mark_ops(card_width: f32, card_height: f32) -> Vec<Op> {
    let (offset_x, offset_y) = grid_offsets(card_width, card_height);

    let mut ops = vec![
        Op::SetOutlineColor {
            col: Color::Rgb(Rgb {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                icc_profile: None,
            }),
        },
        Op::SetOutlineThickness {
            pt: Pt(CUT_MARK_THICKNESS_PT),
        },
    ];

    for i in 0..=GRID_COLS {
        let x = offset_x + i as f32 * card_width;
        ops.push(tick(x, 0.0, x, CUT_MARK_LEN_PT));
        ops.push(tick(x, PAGE_HEIGHT_PT - CUT_MARK_LEN_PT, x, PAGE_HEIGHT_PT));
    }
    for i in 0..=GRID_ROWS {
        let y = offset_y + i as f32 * card_height;
        ops.push(tick(0.0, y, CUT_MARK_LEN_PT, y));
        ops.push(tick(PAGE_WIDTH_PT - CUT_MARK_LEN_PT, y, PAGE_WIDTH_PT, y));
    }

    ops
}

fn tick(x1: f32, y1: f32, x2: f32, y2: f32) -> Op {
    Op::DrawLine {
        line: Line {
            points: vec![
                LinePoint {
                    p: Point {
                        x: Pt(x1),
                        y: Pt(y1),
                    },
                    bezier: false,
                },
                LinePoint {
                    p: Point {
                        x: Pt(x2),
                        y: Pt(y2),
                    },
                    bezier: false,
                },
            ],
            is_closed: false,
        },
    }
}

/// Decode a card file into a printpdf [`RawImage`], keeping the alpha
/// channel when the source has one.
fn load_card_image(path: &Path) -> Result<(RawImage, u32, u32), CardsheetError> {
    let bytes = std::fs::read(path).map_err(|e| CardsheetError::CardImageUnreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let img =
        image::load_from_memory(&bytes).map_err(|e| CardsheetError::CardImageUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let (width, height) = (img.width(), img.height());
    let raw = if img.color().has_alpha() {
        RawImage {
            pixels: RawImageData::U8(img.to_rgba8().into_raw()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGBA8,
            tag: Vec::new(),
        }
    } else {
        RawImage {
            pixels: RawImageData::U8(img.to_rgb8().into_raw()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        }
    };
    Ok((raw, width, height))
}
