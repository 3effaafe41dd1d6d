//! Per-variant glyph inventories.
//!
//! [`GlyphSet`] is the unresolved working copy the filters operate on;
//! [`ResolvedGlyphSet`] is what metrics, outlines and feature generation
//! consume.
use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::{
    composite::resolve_composites,
    filters,
    font::GlyphData,
    glyph::{GlyphDefinition, ResolvedGlyph},
    unicode::codepoint_for,
    FontVariant, GlyphName, PixelfontError,
};

pub const NOTDEF: &str = ".notdef";
pub const SPACE: &str = "space";

/// Glyph-name bases of the fixed-width Quikscript glyphs
const QUIKSCRIPT_PREFIXES: [&str; 2] = ["uniE6", "qs"];
/// The angled parentheses, which are taller than every other Quikscript glyph
const ANGLE_PARENS: [&str; 4] = [
    "uniE66E",
    "uniE66F",
    "qsAngleParenLeft",
    "qsAngleParenRight",
];

/// The glyph definitions of one font variant, before composite resolution
#[derive(Debug, Clone)]
pub struct GlyphSet {
    pub variant: FontVariant,
    pub glyphs: IndexMap<GlyphName, GlyphDefinition>,
}

impl GlyphSet {
    /// A working copy of every glyph definition in `data`
    pub fn new(data: &GlyphData, variant: FontVariant) -> Self {
        GlyphSet {
            variant,
            glyphs: data.glyphs.clone(),
        }
    }

    /// Run the variant's filter pipeline over a copy of `data`
    pub fn filtered(data: &GlyphData, variant: FontVariant) -> Result<Self, PixelfontError> {
        let mut set = GlyphSet::new(data, variant);
        for filter in filters::pipeline(variant) {
            filter.apply(&mut set)?;
        }
        Ok(set)
    }

    pub fn names(&self) -> Vec<&str> {
        self.glyphs.keys().map(GlyphName::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.glyphs.contains_key(name)
    }

    #[cfg(test)]
    pub(crate) fn from_names<'a>(
        variant: FontVariant,
        names: impl IntoIterator<Item = &'a str>,
        definition: GlyphDefinition,
    ) -> Self {
        GlyphSet {
            variant,
            glyphs: names
                .into_iter()
                .map(|n| (GlyphName::new(n), definition.clone()))
                .collect(),
        }
    }
}

/// The final glyph inventory of one font variant
#[derive(Debug, Clone)]
pub struct ResolvedGlyphSet {
    pub variant: FontVariant,
    /// Every glyph, in definition order
    pub glyphs: IndexMap<GlyphName, ResolvedGlyph>,
    /// `.notdef`, `space`, then every other glyph sorted by name
    pub order: Vec<GlyphName>,
    pub cmap: BTreeMap<u32, GlyphName>,
}

impl ResolvedGlyphSet {
    pub fn resolve(data: &GlyphData, variant: FontVariant) -> Result<Self, PixelfontError> {
        log::info!("Resolving glyphs for the {} variant", variant);
        let set = GlyphSet::filtered(data, variant)?;
        let glyphs = resolve_composites(&set.glyphs)?;
        let order = glyph_order(&glyphs, variant);
        let cmap = character_map(&glyphs);
        let resolved = ResolvedGlyphSet {
            variant,
            glyphs,
            order,
            cmap,
        };
        resolved.validate()?;
        log::info!(
            "{} glyphs, {} mapped code points",
            resolved.order.len(),
            resolved.cmap.len()
        );
        Ok(resolved)
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedGlyph> {
        self.glyphs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.glyphs.contains_key(name)
    }

    /// The glyph-id of `name` in the glyph order
    pub fn glyph_id(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n.as_str() == name)
    }

    /// Proportional metrics apply to every glyph of a proportional variant,
    /// and to `.prop` glyphs elsewhere.
    pub fn is_proportional_glyph(&self, name: &GlyphName) -> bool {
        self.variant.is_proportional() || name.is_prop()
    }

    fn validate(&self) -> Result<(), PixelfontError> {
        for name in &self.order {
            let Some(glyph) = self.glyphs.get(name) else {
                continue;
            };
            let Some(bitmap) = &glyph.bitmap else {
                continue;
            };
            let is_quikscript = QUIKSCRIPT_PREFIXES
                .iter()
                .any(|prefix| name.base().starts_with(prefix));
            let widths = bitmap.row_widths();

            if !self.is_proportional_glyph(name) && is_quikscript {
                if let Some((row, width)) = widths.iter().enumerate().find(|(_, w)| **w != 5) {
                    return Err(PixelfontError::WrongRowWidth {
                        glyph: name.to_string(),
                        row,
                        width: *width,
                        expected: 5,
                    });
                }
            } else if widths.windows(2).any(|pair| pair[0] != pair[1]) {
                return Err(PixelfontError::InconsistentRowWidths {
                    glyph: name.to_string(),
                    widths,
                });
            }

            if is_quikscript {
                check_quikscript_height(name, glyph)?;
            }
        }
        Ok(())
    }
}

fn check_quikscript_height(name: &GlyphName, glyph: &ResolvedGlyph) -> Result<(), PixelfontError> {
    let rows = glyph.height();
    let expected = if ANGLE_PARENS.contains(&name.as_str()) {
        (rows != 12).then_some("12 (angled parenthesis)")
    } else if glyph.y_offset == -3 {
        (rows != 9).then_some("9 (y_offset -3)")
    } else {
        (rows != 6 && rows != 9).then_some("6 or 9")
    };
    match expected {
        Some(expected) => Err(PixelfontError::WrongRowCount {
            glyph: name.to_string(),
            rows,
            expected: expected.to_string(),
        }),
        None => Ok(()),
    }
}

fn glyph_order(glyphs: &IndexMap<GlyphName, ResolvedGlyph>, variant: FontVariant) -> Vec<GlyphName> {
    let mut rest: Vec<GlyphName> = glyphs
        .keys()
        .filter(|name| name.as_str() != NOTDEF && name.as_str() != SPACE)
        .filter(|name| variant.is_proportional() || !name.is_prop())
        .cloned()
        .collect();
    rest.sort();
    let mut order = vec![GlyphName::new(NOTDEF), GlyphName::new(SPACE)];
    order.extend(rest);
    order
}

fn character_map(glyphs: &IndexMap<GlyphName, ResolvedGlyph>) -> BTreeMap<u32, GlyphName> {
    let mut cmap = BTreeMap::new();
    cmap.insert(0x20, GlyphName::new(SPACE));
    for name in glyphs.keys() {
        if name.is_prop() || name.as_str() == NOTDEF {
            continue;
        }
        if let Some(codepoint) = codepoint_for(name.as_str()) {
            if let Some(previous) = cmap.insert(codepoint, name.clone()) {
                if previous != *name {
                    log::debug!(
                        "U+{:04X} now maps to {} instead of {}",
                        codepoint,
                        name,
                        previous
                    );
                }
            }
        }
    }
    cmap
}
