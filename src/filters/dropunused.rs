use crate::{filters::GlyphFilter, GlyphSet, PixelfontError};

/// Drops `.unused` stubs
#[derive(Default)]
pub struct DropUnused;

impl DropUnused {
    pub fn new() -> Self {
        DropUnused
    }
}

impl GlyphFilter for DropUnused {
    fn apply(&self, glyphs: &mut GlyphSet) -> Result<(), PixelfontError> {
        let before = glyphs.glyphs.len();
        glyphs.glyphs.retain(|name, _| !name.is_unused());
        log::debug!("Dropped {} unused glyphs", before - glyphs.glyphs.len());
        Ok(())
    }
}
