use crate::{filters::GlyphFilter, GlyphSet, PixelfontError};

/// The zero-width non-joiner, which breaks cursive chains
pub const ZWNJ: &str = "uni200C";

/// Adds a `.noentry` copy of every plain glyph with a cursive entry.
///
/// The copy has no entry anchor and remembers the glyph it stands in for.
/// After a ZWNJ the contextual alternates substitute it in, so cursive
/// attachment sees no entry and the chain breaks. Nothing is added if the
/// font has no ZWNJ glyph.
#[derive(Default)]
pub struct SynthesizeNoEntry;

impl SynthesizeNoEntry {
    pub fn new() -> Self {
        SynthesizeNoEntry
    }
}

impl GlyphFilter for SynthesizeNoEntry {
    fn apply(&self, glyphs: &mut GlyphSet) -> Result<(), PixelfontError> {
        if !glyphs.glyphs.contains_key(ZWNJ) {
            log::debug!("No {} glyph, not synthesizing .noentry variants", ZWNJ);
            return Ok(());
        }
        let mut candidates: Vec<_> = glyphs
            .glyphs
            .iter()
            .filter(|(name, definition)| {
                name.is_plain() && !definition.properties.cursive_entry.is_empty()
            })
            .map(|(name, definition)| (name.clone(), definition.clone()))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));
        log::info!("Synthesizing {} .noentry variants", candidates.len());
        for (name, mut definition) in candidates {
            definition.properties.cursive_entry.clear();
            definition.properties.noentry_for = Some(name.clone());
            glyphs.glyphs.insert(name.with_suffix("noentry"), definition);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        glyph::{CursiveAnchor, GlyphDefinition},
        FontVariant,
    };
    use pretty_assertions::assert_eq;

    fn joining_set(with_zwnj: bool) -> GlyphSet {
        let mut names = vec!["qsTea", "qsPea", "qsPea.entry-xheight", "space"];
        if with_zwnj {
            names.push(ZWNJ);
        }
        let mut glyphs =
            GlyphSet::from_names(FontVariant::Senior, names, GlyphDefinition::default());
        for name in ["qsTea", "qsPea", "qsPea.entry-xheight"] {
            glyphs.glyphs[name].properties.cursive_entry = vec![CursiveAnchor { x: 0, y: 5 }];
        }
        glyphs.glyphs["qsTea"].properties.cursive_exit = vec![CursiveAnchor { x: 5, y: 0 }];
        glyphs
    }

    #[test]
    fn test_noentry_variants() {
        let mut glyphs = joining_set(true);
        SynthesizeNoEntry::new().apply(&mut glyphs).unwrap();
        assert_eq!(
            glyphs.names(),
            vec![
                "qsTea",
                "qsPea",
                "qsPea.entry-xheight",
                "space",
                ZWNJ,
                "qsPea.noentry",
                "qsTea.noentry"
            ]
        );
        let noentry = &glyphs.glyphs["qsTea.noentry"].properties;
        assert!(noentry.cursive_entry.is_empty());
        assert_eq!(noentry.cursive_exit, vec![CursiveAnchor { x: 5, y: 0 }]);
        assert_eq!(noentry.noentry_for.as_ref().map(|n| n.as_str()), Some("qsTea"));
    }

    #[test]
    fn test_no_zwnj_no_variants() {
        let mut glyphs = joining_set(false);
        SynthesizeNoEntry::new().apply(&mut glyphs).unwrap();
        assert_eq!(glyphs.glyphs.len(), 4);
    }
}
