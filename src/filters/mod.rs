//! Glyph-set filters.
//!
//! Each font variant is derived from the glyph data by running an ordered
//! list of filters over a copy of the glyph definitions.
mod dropcontextual;
mod dropproportional;
mod dropunused;
mod noentry;
mod preferproportional;

pub use dropcontextual::DropContextualVariants;
pub use dropproportional::DropProportional;
pub use dropunused::DropUnused;
pub use noentry::{SynthesizeNoEntry, ZWNJ};
pub use preferproportional::PreferProportional;

use crate::{FontVariant, GlyphSet, PixelfontError};

pub trait GlyphFilter {
    fn apply(&self, glyphs: &mut GlyphSet) -> Result<(), PixelfontError>;
}

/// The filters which turn the glyph data into the glyph set for `variant`,
/// in the order they must run.
pub fn pipeline(variant: FontVariant) -> Vec<Box<dyn GlyphFilter>> {
    let mut filters: Vec<Box<dyn GlyphFilter>> = vec![Box::new(DropUnused::new())];
    if !variant.is_senior() {
        filters.push(Box::new(DropContextualVariants::new()));
    }
    if variant.is_proportional() {
        filters.push(Box::new(PreferProportional::new()));
    } else {
        filters.push(Box::new(DropProportional::new()));
    }
    if variant.is_senior() {
        filters.push(Box::new(SynthesizeNoEntry::new()));
    }
    filters
}
