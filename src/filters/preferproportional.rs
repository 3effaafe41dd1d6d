use std::collections::HashSet;

use indexmap::IndexMap;

use crate::{filters::GlyphFilter, GlyphName, GlyphSet, PixelfontError};

/// Replaces glyphs by their `.prop` alternates.
///
/// `X.prop` is renamed to `X`, taking the position of `X.prop` in the glyph
/// order; the original `X` is dropped. Glyphs without an alternate are kept.
#[derive(Default)]
pub struct PreferProportional;

impl PreferProportional {
    pub fn new() -> Self {
        PreferProportional
    }
}

impl GlyphFilter for PreferProportional {
    fn apply(&self, glyphs: &mut GlyphSet) -> Result<(), PixelfontError> {
        let replaced: HashSet<GlyphName> = glyphs
            .glyphs
            .keys()
            .filter(|name| name.is_prop())
            .map(GlyphName::without_prop)
            .collect();
        log::info!("Using {} proportional alternates", replaced.len());
        let mut renamed = IndexMap::with_capacity(glyphs.glyphs.len());
        for (name, definition) in std::mem::take(&mut glyphs.glyphs) {
            if name.is_prop() {
                let new_name = name.without_prop();
                log::debug!("Renaming {} to {}", name, new_name);
                renamed.insert(new_name, definition);
            } else if !replaced.contains(&name) {
                renamed.insert(name, definition);
            }
        }
        glyphs.glyphs = renamed;
        Ok(())
    }
}
