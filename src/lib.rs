#![deny(clippy::unwrap_used, clippy::expect_used)]
//! Compile a YAML database of pixel glyphs into OpenType fonts.
//!
//! The same glyph data yields three fonts: a monospace font, a proportional
//! "junior" font with kerning and mark positioning, and a "senior" font which
//! additionally joins letters cursively.
pub mod assembly;
mod bitmap;
mod composite;
mod error;
pub mod features;
pub mod filters;
mod font;
mod glyph;
mod glyphset;
pub mod metrics;
pub mod names;
mod unicode;
mod variant;

pub use crate::{
    assembly::{build_all, build_font},
    bitmap::{AccentPosition, Bitmap},
    error::PixelfontError,
    features::{generate_features, FeatureBlock, Features},
    font::{FontVersion, GlyphData, KerningDefinition, Metadata},
    glyph::{
        CompositeSpec, CursiveAnchor, GlyphDefinition, GlyphName, GlyphProperties, GlyphSource,
        ResolvedGlyph, VariantTag,
    },
    glyphset::{GlyphSet, ResolvedGlyphSet},
    unicode::codepoint_for,
    variant::FontVariant,
};
use std::path::Path;

/// Load glyph data from a YAML file or a directory of YAML files
pub fn load(path: impl AsRef<Path>) -> Result<GlyphData, PixelfontError> {
    GlyphData::load(path)
}
