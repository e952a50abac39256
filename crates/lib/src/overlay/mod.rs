//! Patch overlays.
//!
//! A project keeps one authoritative base source root. For every additional
//! target version a [`PatchSet`] names a directory of replacement and added
//! files; [`OverlayEngine::merge`] lays it over a copy of the base to produce
//! the version-specific variant that gets compiled.
//!
//! # Submodules
//!
//! - [`merge`] - Variant assembly and completion markers

pub mod merge;
mod types;

pub use merge::{OverlayEngine, VariantMarker, is_complete, marker_path, merge_layers, read_marker};
pub use types::*;
