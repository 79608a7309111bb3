//! Card collection: turn the catalog's source list into PNG files on disk.
//!
//! The collector replays [`catalog_sources`] in order. PDF sources go
//! through [`extract_images`]; image sources are copied verbatim under a
//! container-prefixed name. Per-source problems are appended to the
//! failure log and never interrupt the sweep; only environmental problems
//! (missing assets root, unwritable work directory, corrupt archive) abort
//! it.

use crate::error::CardsheetError;
use crate::output::{CardImage, FailedSource};
use crate::pipeline::catalog::{catalog_sources, read_zip_entry, ContainerRef, SourceKind};
use crate::pipeline::extract::extract_images;
use crate::pipeline::rasterize::PageRasterizer;
use crate::progress::ProgressObserver;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Collect every card image under `assets_dir` into `images_dir`.
///
/// Returns the cards in discovery order together with the failure log.
/// `images_dir` is created if absent; files from earlier runs are
/// overwritten on name collision but never deleted.
pub fn collect_cards(
    assets_dir: &Path,
    images_dir: &Path,
    rasterizer: &dyn PageRasterizer,
    fallback_enabled: bool,
    progress: Option<&ProgressObserver>,
) -> Result<(Vec<CardImage>, Vec<FailedSource>), CardsheetError> {
    std::fs::create_dir_all(images_dir).map_err(|e| CardsheetError::WorkDirWriteFailed {
        path: images_dir.to_path_buf(),
        source: e,
    })?;

    let sources = catalog_sources(assets_dir)?;
    if let Some(p) = progress {
        p.on_collect_start(sources.len());
    }

    let mut cards = Vec::new();
    let mut failures = Vec::new();

    for source in &sources {
        let container_display = source.container.display_name();

        match source.kind {
            SourceKind::Pdf => {
                let outcome = read_source_bytes(assets_dir, &source.container, &source.entry_name)?;
                match outcome {
                    Ok(pdf_bytes) => {
                        let stem = file_stem_of(&source.entry_name);
                        let (paths, failure) = extract_images(
                            &pdf_bytes,
                            images_dir,
                            &source.container.id(),
                            &stem,
                            rasterizer,
                            fallback_enabled,
                        );

                        for image_path in paths {
                            cards.push(CardImage {
                                container: container_display.clone(),
                                entry_name: source.entry_name.clone(),
                                image_path,
                            });
                        }
                        if let Some(f) = failure {
                            if !f.used_fallback {
                                warn!(
                                    container = %container_display,
                                    entry = %source.entry_name,
                                    error = %f.error,
                                    "Source yielded no cards"
                                );
                            }
                            failures.push(FailedSource {
                                container: container_display.clone(),
                                entry_name: source.entry_name.clone(),
                                error: f.error,
                                used_fallback: f.used_fallback,
                            });
                        }
                    }
                    Err(read_error) => {
                        warn!(
                            container = %container_display,
                            entry = %source.entry_name,
                            error = %read_error,
                            "Source yielded no cards"
                        );
                        failures.push(FailedSource {
                            container: container_display.clone(),
                            entry_name: source.entry_name.clone(),
                            error: read_error,
                            used_fallback: false,
                        });
                    }
                }
            }
            SourceKind::Image => {
                match copy_image(assets_dir, &source.container, &source.entry_name, images_dir)? {
                    Ok(image_path) => cards.push(CardImage {
                        container: container_display.clone(),
                        entry_name: source.entry_name.clone(),
                        image_path,
                    }),
                    Err(read_error) => {
                        warn!(
                            container = %container_display,
                            entry = %source.entry_name,
                            error = %read_error,
                            "Source yielded no cards"
                        );
                        failures.push(FailedSource {
                            container: container_display.clone(),
                            entry_name: source.entry_name.clone(),
                            error: read_error,
                            used_fallback: false,
                        });
                    }
                }
            }
        }

        if let Some(p) = progress {
            p.on_source_processed(&container_display, &source.entry_name);
        }
    }

    info!(
        cards = cards.len(),
        failures = failures.len(),
        "Collection complete"
    );
    Ok((cards, failures))
}

/// Read one source's bytes. The outer `Result` is fatal (corrupt archive);
/// the inner records a per-source problem as text.
fn read_source_bytes(
    assets_dir: &Path,
    container: &ContainerRef,
    entry_name: &str,
) -> Result<Result<Vec<u8>, String>, CardsheetError> {
    match container {
        ContainerRef::Zip(zip_path) => Ok(Ok(read_zip_entry(zip_path, entry_name)?)),
        ContainerRef::Direct => {
            // A loose file vanishing between catalog and collection is a
            // problem with that one source, not with the run.
            Ok(std::fs::read(assets_dir.join(entry_name))
                .map_err(|e| format!("could not read file: {e}")))
        }
    }
}

/// Copy an image source verbatim into the work directory under
/// `{container_id}_{basename}`.
fn copy_image(
    assets_dir: &Path,
    container: &ContainerRef,
    entry_name: &str,
    images_dir: &Path,
) -> Result<Result<PathBuf, String>, CardsheetError> {
    let bytes = match read_source_bytes(assets_dir, container, entry_name)? {
        Ok(bytes) => bytes,
        Err(e) => return Ok(Err(e)),
    };

    let basename = Path::new(entry_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry_name.to_string());
    let dest = images_dir.join(format!("{}_{}", container.id(), basename));

    std::fs::write(&dest, &bytes).map_err(|e| CardsheetError::WorkDirWriteFailed {
        path: dest.clone(),
        source: e,
    })?;

    debug!(dest = %dest.display(), "Copied image source");
    Ok(Ok(dest))
}

fn file_stem_of(entry_name: &str) -> String {
    Path::new(entry_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry_name.to_string())
}
