//! Pipeline stages for the card-sheet build.
//!
//! Each submodule implements exactly one stage. Keeping stages separate
//! makes each independently testable and lets us swap implementations
//! (e.g. a different rasterisation backend) without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! catalog ──▶ extract ──▶ collect ──▶ layout
//! (discover)  (lopdf /    (cards +    (3×3 grid
//!              pdfium)     failures)   + cut marks)
//! ```
//!
//! 1. [`catalog`]   — enumerate ZIP archives, loose PDFs, loose images
//! 2. [`extract`]   — pull raster artwork out of one PDF, with fallback
//! 3. [`rasterize`] — the fallback capability: whole-page rendering
//! 4. [`collect`]   — drive catalog + extract, materialise every card
//! 5. [`layout`]    — paginate the sorted cards onto cut-marked pages

pub mod catalog;
pub mod collect;
pub mod extract;
pub mod layout;
pub mod rasterize;
