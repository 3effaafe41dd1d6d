use crate::{filters::GlyphFilter, GlyphSet, PixelfontError};

/// Drops `.prop` alternates from the monospace font
#[derive(Default)]
pub struct DropProportional;

impl DropProportional {
    pub fn new() -> Self {
        DropProportional
    }
}

impl GlyphFilter for DropProportional {
    fn apply(&self, glyphs: &mut GlyphSet) -> Result<(), PixelfontError> {
        let before = glyphs.glyphs.len();
        glyphs.glyphs.retain(|name, _| !name.is_prop());
        log::debug!("Dropped {} proportional alternates", before - glyphs.glyphs.len());
        Ok(())
    }
}
