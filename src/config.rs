//! Configuration types for a card-sheet build.
//!
//! All behaviour is controlled through [`BuildConfig`], built via its
//! [`BuildConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to log a run's settings and to diff two runs to understand why their
//! outputs differ.
//!
//! # Design choice: builder over constructor
//! The defaults cover the common case (an `assets/` folder next to the
//! binary, output under `build/`); the builder lets callers override only
//! what they care about without a many-argument constructor.

use crate::error::CardsheetError;
use crate::pipeline::layout::{CARD_HEIGHT_PT, CARD_WIDTH_PT, GRID_COLS, GRID_ROWS, PAGE_HEIGHT_PT, PAGE_WIDTH_PT};
use crate::progress::ProgressObserver;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for one build run.
///
/// Built via [`BuildConfig::builder()`] or [`BuildConfig::default()`].
///
/// # Example
/// ```rust
/// use cardsheet::BuildConfig;
///
/// let config = BuildConfig::builder()
///     .assets_dir("my-assets")
///     .fallback_enabled(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BuildConfig {
    /// Directory scanned for ZIP archives, loose PDFs, and loose images.
    /// Default: `assets`.
    pub assets_dir: PathBuf,

    /// Path of the output card-sheet PDF. Parent directories are created.
    /// Default: `build/cards.pdf`.
    pub output_path: PathBuf,

    /// Working directory where extracted/copied card PNGs are materialised.
    /// Created if absent; files from a prior run are overwritten on name
    /// collision but never deleted. Default: `.temp/images`.
    pub images_dir: PathBuf,

    /// Whether a PDF that yields no embedded images may be rasterised page
    /// by page instead. Default: true.
    ///
    /// The fallback always produces output for a structurally valid PDF,
    /// but rasterises the whole page layout — surrounding whitespace
    /// included — instead of recovering the authored artwork pixel-exact.
    /// Disable it to see exactly which sources the primary method handles.
    pub fallback_enabled: bool,

    /// Card cell width in PDF points. Default: 190.0.
    pub card_width: f32,

    /// Card cell height in PDF points. Default: 266.0.
    pub card_height: f32,

    /// Optional progress observer, invoked synchronously at pipeline
    /// checkpoints (per source processed, per page written).
    pub progress: Option<ProgressObserver>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            output_path: PathBuf::from("build/cards.pdf"),
            images_dir: PathBuf::from(".temp/images"),
            fallback_enabled: true,
            card_width: CARD_WIDTH_PT,
            card_height: CARD_HEIGHT_PT,
            progress: None,
        }
    }
}

impl fmt::Debug for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildConfig")
            .field("assets_dir", &self.assets_dir)
            .field("output_path", &self.output_path)
            .field("images_dir", &self.images_dir)
            .field("fallback_enabled", &self.fallback_enabled)
            .field("card_width", &self.card_width)
            .field("card_height", &self.card_height)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn BuildProgress>"))
            .finish()
    }
}

impl BuildConfig {
    /// Create a new builder for `BuildConfig`.
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BuildConfig`].
pub struct BuildConfigBuilder {
    config: BuildConfig,
}

impl BuildConfigBuilder {
    pub fn assets_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.assets_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn output_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.output_path = path.as_ref().to_path_buf();
        self
    }

    pub fn images_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.images_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn fallback_enabled(mut self, v: bool) -> Self {
        self.config.fallback_enabled = v;
        self
    }

    pub fn card_size(mut self, width_pt: f32, height_pt: f32) -> Self {
        self.config.card_width = width_pt;
        self.config.card_height = height_pt;
        self
    }

    pub fn progress(mut self, observer: ProgressObserver) -> Self {
        self.config.progress = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BuildConfig, CardsheetError> {
        let c = &self.config;
        if !(c.card_width > 0.0 && c.card_height > 0.0) {
            return Err(CardsheetError::InvalidConfig(format!(
                "card size must be positive, got {}x{} pt",
                c.card_width, c.card_height
            )));
        }
        // The whole 3×3 grid must fit on the page; otherwise the centring
        // offsets go negative and cards fall off the sheet.
        if GRID_COLS as f32 * c.card_width > PAGE_WIDTH_PT
            || GRID_ROWS as f32 * c.card_height > PAGE_HEIGHT_PT
        {
            return Err(CardsheetError::InvalidConfig(format!(
                "a {}x{} grid of {}x{} pt cards does not fit on an A4 page",
                GRID_COLS, GRID_ROWS, c.card_width, c.card_height
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BuildConfig::builder().build().unwrap();
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.output_path, PathBuf::from("build/cards.pdf"));
        assert!(config.fallback_enabled);
        assert_eq!(config.card_width, 190.0);
        assert_eq!(config.card_height, 266.0);
    }

    #[test]
    fn zero_card_size_is_rejected() {
        let err = BuildConfig::builder().card_size(0.0, 266.0).build();
        assert!(matches!(err, Err(CardsheetError::InvalidConfig(_))));
    }

    #[test]
    fn oversized_grid_is_rejected() {
        // 3 × 300 pt = 900 pt wide, an A4 page is ~595 pt.
        let err = BuildConfig::builder().card_size(300.0, 100.0).build();
        assert!(matches!(err, Err(CardsheetError::InvalidConfig(_))));
    }

    #[test]
    fn debug_does_not_require_observer_debug() {
        let config = BuildConfig::builder().build().unwrap();
        let s = format!("{config:?}");
        assert!(s.contains("fallback_enabled"));
    }
}
