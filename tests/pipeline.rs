//! End-to-end pipeline tests over synthetic asset trees.
//!
//! Assets are fabricated in temp directories: ZIP archives via
//! `zip::ZipWriter`, PDFs with embedded JPEG XObjects via `lopdf`, and a
//! fake rasterisation backend so no native PDF renderer is needed.

use cardsheet::{
    build_with, BuildConfig, BuildProgress, CardsheetError, PageRasterizer,
};
use image::DynamicImage;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

// ── Fixture helpers ──────────────────────────────────────────────────────

struct FakeRasterizer {
    pages: usize,
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(
        &self,
        _pdf_bytes: &[u8],
        _scale: f32,
    ) -> Result<Vec<DynamicImage>, cardsheet::pipeline::rasterize::RasterizeError> {
        Ok((0..self.pages)
            .map(|_| {
                DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
                    16,
                    16,
                    image::Rgba([80, 80, 200, 255]),
                ))
            })
            .collect())
    }
}

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (name, data) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([200, 40, 40, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([90u8, 120, 60]));
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

fn jpeg_xobject(doc: &mut Document, width: i64, height: i64) -> ObjectId {
    let jpeg = jpeg_bytes(width as u32, height as u32);
    let mut stream = Stream::new(
        dictionary! {
            "Type" => Object::Name(b"XObject".to_vec()),
            "Subtype" => Object::Name(b"Image".to_vec()),
            "Width" => Object::Integer(width),
            "Height" => Object::Integer(height),
            "ColorSpace" => Object::Name(b"DeviceRGB".to_vec()),
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => Object::Name(b"DCTDecode".to_vec()),
            "Length" => Object::Integer(jpeg.len() as i64),
        },
        jpeg,
    );
    stream.allows_compression = false;
    doc.add_object(Object::Stream(stream))
}

/// Build a PDF with one page per element of `pages_with_image`; `true`
/// pages carry one embedded JPEG, `false` pages carry only text content.
fn make_pdf(pages_with_image: &[bool]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for &with_image in pages_with_image {
        let content = Stream::new(dictionary! {}, b"q Q".to_vec());
        let content_id = doc.add_object(Object::Stream(content));

        let mut xobject_dict = lopdf::Dictionary::new();
        if with_image {
            let img_id = jpeg_xobject(&mut doc, 40, 56);
            xobject_dict.set(b"Card".to_vec(), Object::Reference(img_id));
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Page".to_vec()),
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "XObject" => Object::Dictionary(xobject_dict),
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let kids_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => Object::Name(b"Pages".to_vec()),
            "Kids" => kids,
            "Count" => Object::Integer(kids_count),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

struct Workspace {
    _root: TempDir,
    assets: std::path::PathBuf,
    images: std::path::PathBuf,
    output: std::path::PathBuf,
}

fn workspace() -> Workspace {
    let root = TempDir::new().unwrap();
    let assets = root.path().join("assets");
    std::fs::create_dir(&assets).unwrap();
    Workspace {
        images: root.path().join("work/images"),
        output: root.path().join("out/cards.pdf"),
        _root: root,
        assets,
    }
}

fn config_for(ws: &Workspace, fallback: bool) -> BuildConfig {
    BuildConfig::builder()
        .assets_dir(&ws.assets)
        .images_dir(&ws.images)
        .output_path(&ws.output)
        .fallback_enabled(fallback)
        .build()
        .unwrap()
}

fn output_page_count(path: &Path) -> usize {
    Document::load(path).unwrap().page_iter().count()
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[test]
fn image_only_zip_yields_one_card_per_entry() {
    let ws = workspace();
    let png = png_bytes();
    write_zip(
        &ws.assets.join("set1.zip"),
        &[
            ("a.png", png.as_slice()),
            ("b.png", png.as_slice()),
            ("c.png", png.as_slice()),
        ],
    );

    let report = build_with(&config_for(&ws, true), &FakeRasterizer { pages: 0 }).unwrap();

    assert_eq!(report.stats.cards, 3);
    assert_eq!(report.stats.pages, 1);
    assert!(report.fallback_rescued.is_empty());
    assert!(report.failed.is_empty());
    assert!(report.stats.output_bytes > 0);
    assert_eq!(output_page_count(&ws.output), 1);
}

#[test]
fn mixed_archive_extracts_pdfs_and_rescues_imageless_ones() {
    // set1.zip: a.pdf has two pages with one embedded image each, b.pdf is
    // a valid PDF whose only page has no images. With the fallback
    // rendering one page, the build ends with exactly three cards.
    let ws = workspace();
    let a_pdf = make_pdf(&[true, true]);
    let b_pdf = make_pdf(&[false]);
    write_zip(
        &ws.assets.join("set1.zip"),
        &[("a.pdf", a_pdf.as_slice()), ("b.pdf", b_pdf.as_slice())],
    );

    let report = build_with(&config_for(&ws, true), &FakeRasterizer { pages: 1 }).unwrap();

    assert_eq!(report.stats.cards, 3);
    assert_eq!(report.stats.pages, 1);

    assert_eq!(report.fallback_rescued.len(), 1);
    let rescue = &report.fallback_rescued[0];
    assert_eq!(rescue.container, "set1.zip");
    assert_eq!(rescue.entry_name, "b.pdf");
    assert!(rescue.used_fallback);
    assert!(report.failed.is_empty());

    // All three extracted PNGs landed in the working directory.
    for name in ["set1_a_p0.png", "set1_a_p1.png", "set1_b_p0.png"] {
        assert!(ws.images.join(name).exists(), "missing {name}");
    }
}

#[test]
fn disabling_the_fallback_reports_total_failures() {
    let ws = workspace();
    let a_pdf = make_pdf(&[true, true]);
    let b_pdf = make_pdf(&[false]);
    write_zip(
        &ws.assets.join("set1.zip"),
        &[("a.pdf", a_pdf.as_slice()), ("b.pdf", b_pdf.as_slice())],
    );

    let report = build_with(&config_for(&ws, false), &FakeRasterizer { pages: 1 }).unwrap();

    assert_eq!(report.stats.cards, 2);
    assert!(report.fallback_rescued.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].entry_name, "b.pdf");
    assert!(!report.failed[0].used_fallback);
}

#[test]
fn ten_cards_paginate_onto_two_pages() {
    let ws = workspace();
    let png = png_bytes();
    let entries: Vec<(String, &[u8])> = (0..10)
        .map(|i| (format!("card{i:02}.png"), png.as_slice()))
        .collect();
    let borrowed: Vec<(&str, &[u8])> =
        entries.iter().map(|(n, d)| (n.as_str(), *d)).collect();
    write_zip(&ws.assets.join("deck.zip"), &borrowed);

    let report = build_with(&config_for(&ws, true), &FakeRasterizer { pages: 0 }).unwrap();

    assert_eq!(report.stats.cards, 10);
    assert_eq!(report.stats.pages, 2);
    assert_eq!(output_page_count(&ws.output), 2);
}

#[test]
fn loose_files_and_archives_combine() {
    let ws = workspace();
    write_zip(&ws.assets.join("set1.zip"), &[("zipped.png", png_bytes().as_slice())]);
    std::fs::write(ws.assets.join("loose.png"), png_bytes()).unwrap();
    std::fs::write(ws.assets.join("loose.pdf"), make_pdf(&[true])).unwrap();

    let report = build_with(&config_for(&ws, true), &FakeRasterizer { pages: 0 }).unwrap();

    assert_eq!(report.stats.cards, 3);
    assert!(ws.images.join("set1_zipped.png").exists());
    assert!(ws.images.join("direct_loose.png").exists());
    assert!(ws.images.join("direct_loose_p0.png").exists());
}

#[test]
fn missing_assets_root_aborts_before_output_io() {
    let ws = workspace();
    std::fs::remove_dir(&ws.assets).unwrap();

    let err = build_with(&config_for(&ws, true), &FakeRasterizer { pages: 0 }).unwrap_err();
    assert!(matches!(err, CardsheetError::AssetsDirMissing { .. }));
    assert!(!ws.output.exists());
}

#[test]
fn empty_assets_root_is_no_cards_found() {
    let ws = workspace();
    std::fs::write(ws.assets.join("notes.txt"), b"not a card").unwrap();

    let err = build_with(&config_for(&ws, true), &FakeRasterizer { pages: 0 }).unwrap_err();
    assert!(matches!(err, CardsheetError::NoCardsFound { .. }));
    assert!(!ws.output.exists());
}

#[test]
fn progress_observer_sees_every_source_and_page() {
    struct Counting {
        total_sources: AtomicUsize,
        sources: AtomicUsize,
        total_pages: AtomicUsize,
        pages: AtomicUsize,
    }

    impl BuildProgress for Counting {
        fn on_collect_start(&self, total_sources: usize) {
            self.total_sources.store(total_sources, Ordering::SeqCst);
        }
        fn on_source_processed(&self, _container: &str, _entry_name: &str) {
            self.sources.fetch_add(1, Ordering::SeqCst);
        }
        fn on_layout_start(&self, total_pages: usize) {
            self.total_pages.store(total_pages, Ordering::SeqCst);
        }
        fn on_page_written(&self, _page_num: usize, _total_pages: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }
    }

    let ws = workspace();
    let png = png_bytes();
    let entries: Vec<(String, &[u8])> = (0..10)
        .map(|i| (format!("card{i:02}.png"), png.as_slice()))
        .collect();
    let borrowed: Vec<(&str, &[u8])> =
        entries.iter().map(|(n, d)| (n.as_str(), *d)).collect();
    write_zip(&ws.assets.join("deck.zip"), &borrowed);

    let observer = Arc::new(Counting {
        total_sources: AtomicUsize::new(0),
        sources: AtomicUsize::new(0),
        total_pages: AtomicUsize::new(0),
        pages: AtomicUsize::new(0),
    });

    let config = BuildConfig::builder()
        .assets_dir(&ws.assets)
        .images_dir(&ws.images)
        .output_path(&ws.output)
        .progress(observer.clone() as Arc<dyn BuildProgress>)
        .build()
        .unwrap();

    build_with(&config, &FakeRasterizer { pages: 0 }).unwrap();

    assert_eq!(observer.total_sources.load(Ordering::SeqCst), 10);
    assert_eq!(observer.sources.load(Ordering::SeqCst), 10);
    assert_eq!(observer.total_pages.load(Ordering::SeqCst), 2);
    assert_eq!(observer.pages.load(Ordering::SeqCst), 2);
}

#[test]
fn rebuilding_the_same_assets_gives_identical_stats() {
    let ws = workspace();
    write_zip(
        &ws.assets.join("set1.zip"),
        &[("a.pdf", make_pdf(&[true]).as_slice()), ("b.png", png_bytes().as_slice())],
    );

    let first = build_with(&config_for(&ws, true), &FakeRasterizer { pages: 0 }).unwrap();
    let second = build_with(&config_for(&ws, true), &FakeRasterizer { pages: 0 }).unwrap();

    assert_eq!(first.stats.cards, second.stats.cards);
    assert_eq!(first.stats.pages, second.stats.pages);
    // Second run overwrites the work files in place; no duplicates pile up.
    let work_files = std::fs::read_dir(&ws.images).unwrap().count();
    assert_eq!(work_files, 2);
}
