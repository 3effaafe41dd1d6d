use crate::{filters::GlyphFilter, GlyphSet, PixelfontError};

/// Drops entry, exit and half forms from fonts which do not join cursively
#[derive(Default)]
pub struct DropContextualVariants;

impl DropContextualVariants {
    pub fn new() -> Self {
        DropContextualVariants
    }
}

impl GlyphFilter for DropContextualVariants {
    fn apply(&self, glyphs: &mut GlyphSet) -> Result<(), PixelfontError> {
        log::info!("Dropping contextual variants");
        glyphs.glyphs.retain(|name, _| !name.is_contextual());
        Ok(())
    }
}
