//! Source catalog: enumerate every card-bearing unit under an assets root.
//!
//! Four categories are recognised: ZIP archives, PDF entries inside them,
//! image entries inside them, and loose PDF/image files directly in the
//! root. The catalog produces a single deterministic ordering — archives
//! first (alphabetical by path), each archive's PDFs before its images,
//! entries filename-sorted within each kind, then loose PDFs, then loose
//! images — and the collector consumes that list verbatim. Reproducible
//! discovery order is what makes two runs over the same assets byte-compare
//! equal.
//!
//! Directory entries and macOS resource-fork noise (`__MACOSX/…`) inside
//! archives are never treated as sources.

use crate::error::CardsheetError;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Raster file extensions accepted as card images (matched case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// ZIP entry prefix for macOS resource-fork metadata.
const MACOS_METADATA_PREFIX: &str = "__MACOSX/";

/// Where a source entry lives: inside a ZIP archive, or loose on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerRef {
    /// A ZIP archive under the assets root.
    Zip(PathBuf),
    /// The conceptual "direct" group of loose files in the assets root.
    Direct,
}

impl ContainerRef {
    /// Identifier used in generated filenames: the ZIP stem, or `"direct"`.
    pub fn id(&self) -> String {
        match self {
            ContainerRef::Zip(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "archive".to_string()),
            ContainerRef::Direct => "direct".to_string(),
        }
    }

    /// Human-readable name used in reports: the ZIP filename, or `"(direct)"`.
    pub fn display_name(&self) -> String {
        match self {
            ContainerRef::Zip(path) => path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "archive.zip".to_string()),
            ContainerRef::Direct => "(direct)".to_string(),
        }
    }
}

/// What kind of payload a source entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Image,
}

/// One card-bearing unit, created during cataloging and consumed exactly
/// once by the collector.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub container: ContainerRef,
    /// Entry name inside the container, or the filename on disk.
    pub entry_name: String,
    pub kind: SourceKind,
}

// ── Directory scanning ───────────────────────────────────────────────────

fn scan_assets_dir(
    assets_dir: &Path,
    wanted: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, CardsheetError> {
    let entries = std::fs::read_dir(assets_dir).map_err(|_| CardsheetError::AssetsDirMissing {
        path: assets_dir.to_path_buf(),
    })?;

    let mut found: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && wanted(p))
        .collect();
    found.sort();
    found.dedup();
    Ok(found)
}

fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            candidates.iter().any(|c| *c == ext)
        })
        .unwrap_or(false)
}

/// All ZIP archives in the assets root, sorted by path.
pub fn list_zip_files(assets_dir: &Path) -> Result<Vec<PathBuf>, CardsheetError> {
    scan_assets_dir(assets_dir, |p| has_extension(p, &["zip"]))
}

/// All loose PDF files directly in the assets root, sorted.
pub fn list_loose_pdfs(assets_dir: &Path) -> Result<Vec<PathBuf>, CardsheetError> {
    scan_assets_dir(assets_dir, |p| has_extension(p, &["pdf"]))
}

/// All loose image files directly in the assets root, sorted.
pub fn list_loose_images(assets_dir: &Path) -> Result<Vec<PathBuf>, CardsheetError> {
    scan_assets_dir(assets_dir, |p| has_extension(p, IMAGE_EXTENSIONS))
}

// ── Archive listing ──────────────────────────────────────────────────────

fn open_archive(zip_path: &Path) -> Result<ZipArchive<BufReader<File>>, CardsheetError> {
    let file = File::open(zip_path).map_err(|e| CardsheetError::ZipRead {
        path: zip_path.to_path_buf(),
        detail: e.to_string(),
    })?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| CardsheetError::ZipRead {
        path: zip_path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn entry_is_noise(name: &str) -> bool {
    name.ends_with('/') || name.starts_with(MACOS_METADATA_PREFIX)
}

fn list_zip_entries(
    zip_path: &Path,
    wanted: impl Fn(&str) -> bool,
) -> Result<Vec<String>, CardsheetError> {
    let archive = open_archive(zip_path)?;
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| !entry_is_noise(name) && wanted(name))
        .map(|name| name.to_string())
        .collect();
    names.sort();
    Ok(names)
}

fn name_has_extension(name: &str, candidates: &[&str]) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            candidates.iter().any(|c| *c == ext)
        })
        .unwrap_or(false)
}

/// PDF entries inside a ZIP archive, sorted by name.
pub fn list_pdfs_in_zip(zip_path: &Path) -> Result<Vec<String>, CardsheetError> {
    list_zip_entries(zip_path, |name| name_has_extension(name, &["pdf"]))
}

/// Image entries inside a ZIP archive, sorted by name.
pub fn list_images_in_zip(zip_path: &Path) -> Result<Vec<String>, CardsheetError> {
    list_zip_entries(zip_path, |name| name_has_extension(name, IMAGE_EXTENSIONS))
}

/// Read the raw bytes of one entry from a ZIP archive.
pub fn read_zip_entry(zip_path: &Path, entry_name: &str) -> Result<Vec<u8>, CardsheetError> {
    let mut archive = open_archive(zip_path)?;
    let mut entry = archive
        .by_name(entry_name)
        .map_err(|e| CardsheetError::ZipRead {
            path: zip_path.to_path_buf(),
            detail: format!("entry '{entry_name}': {e}"),
        })?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| CardsheetError::ZipRead {
            path: zip_path.to_path_buf(),
            detail: format!("entry '{entry_name}': {e}"),
        })?;
    Ok(bytes)
}

// ── Full catalog ─────────────────────────────────────────────────────────

/// Produce the complete, ordered source list for one assets root.
///
/// Ordering contract (the collector replays this list as-is): each ZIP
/// archive in path order, with its PDF entries (sorted) before its image
/// entries (sorted); then loose PDFs (sorted); then loose images (sorted).
pub fn catalog_sources(assets_dir: &Path) -> Result<Vec<SourceDescriptor>, CardsheetError> {
    let mut sources = Vec::new();

    for zip_path in list_zip_files(assets_dir)? {
        let container = ContainerRef::Zip(zip_path.clone());
        for entry_name in list_pdfs_in_zip(&zip_path)? {
            sources.push(SourceDescriptor {
                container: container.clone(),
                entry_name,
                kind: SourceKind::Pdf,
            });
        }
        for entry_name in list_images_in_zip(&zip_path)? {
            sources.push(SourceDescriptor {
                container: container.clone(),
                entry_name,
                kind: SourceKind::Image,
            });
        }
    }

    for pdf_path in list_loose_pdfs(assets_dir)? {
        sources.push(SourceDescriptor {
            container: ContainerRef::Direct,
            entry_name: file_name_of(&pdf_path),
            kind: SourceKind::Pdf,
        });
    }

    for image_path in list_loose_images(assets_dir)? {
        sources.push(SourceDescriptor {
            container: ContainerRef::Direct,
            entry_name: file_name_of(&image_path),
            kind: SourceKind::Image,
        });
    }

    debug!(total = sources.len(), "Catalog complete");
    Ok(sources)
}

/// Advisory total used to size progress indicators. Equals the number of
/// units the collector will process.
pub fn count_all_sources(assets_dir: &Path) -> Result<usize, CardsheetError> {
    Ok(catalog_sources(assets_dir)?.len())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
