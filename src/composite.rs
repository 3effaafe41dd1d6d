//! Composite glyph resolution.
//!
//! A composite names a base glyph and up to two accents. Resolution draws
//! the accents onto the base bitmap so that nothing downstream has to know
//! the glyph was ever a composite.
use std::collections::HashMap;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    bitmap::{AccentPosition, Bitmap},
    glyph::{CompositeSpec, GlyphDefinition, GlyphSource, ResolvedGlyph},
    GlyphName, PixelfontError,
};

/// Per-base accent adjustments, keyed by accent family.
///
/// A combining mark declares `base_x_adjust`/`base_y_adjust`; a spacing
/// accent used in a composite picks them up when it belongs to the same
/// accent family (its `accent` key, or its own name when it has none).
#[derive(Debug, Default)]
struct AccentAdjustments {
    x: HashMap<SmolStr, IndexMap<SmolStr, i32>>,
    y: HashMap<SmolStr, IndexMap<SmolStr, i32>>,
}

impl AccentAdjustments {
    fn new(glyphs: &IndexMap<GlyphName, GlyphDefinition>) -> Self {
        let mut adjustments = AccentAdjustments::default();
        for (name, definition) in glyphs {
            let props = &definition.properties;
            if !props.is_mark || definition.bitmap().is_none() {
                continue;
            }
            let key = accent_key(name, definition);
            if !props.base_x_adjust.is_empty() {
                adjustments
                    .x
                    .insert(key.clone(), props.base_x_adjust.clone());
            }
            if !props.base_y_adjust.is_empty() {
                adjustments.y.insert(key, props.base_y_adjust.clone());
            }
        }
        adjustments
    }

    fn get(&self, accent: &SmolStr, base: &str) -> (i32, i32) {
        let lookup = |map: &HashMap<SmolStr, IndexMap<SmolStr, i32>>| {
            map.get(accent)
                .and_then(|per_base| per_base.get(base))
                .copied()
                .unwrap_or(0)
        };
        (lookup(&self.x), lookup(&self.y))
    }
}

fn accent_key(name: &GlyphName, definition: &GlyphDefinition) -> SmolStr {
    definition
        .properties
        .accent
        .clone()
        .unwrap_or_else(|| SmolStr::new(name.as_str()))
}

/// Resolve every glyph definition into a [`ResolvedGlyph`], keeping the
/// definition order.
pub fn resolve_composites(
    glyphs: &IndexMap<GlyphName, GlyphDefinition>,
) -> Result<IndexMap<GlyphName, ResolvedGlyph>, PixelfontError> {
    let adjustments = AccentAdjustments::new(glyphs);
    glyphs
        .iter()
        .map(|(name, definition)| {
            let (bitmap, y_offset) = match &definition.source {
                GlyphSource::Empty => (None, definition.y_offset),
                GlyphSource::Bitmap(bitmap) => (Some(bitmap.clone()), definition.y_offset),
                GlyphSource::Composite(composite) => {
                    let (bitmap, y_offset) = resolve_one(name, composite, glyphs, &adjustments)?;
                    log::debug!("Resolved composite {} ({} rows)", name, bitmap.height());
                    (Some(bitmap), y_offset)
                }
            };
            Ok((
                name.clone(),
                ResolvedGlyph {
                    bitmap,
                    y_offset,
                    properties: definition.properties.clone(),
                },
            ))
        })
        .collect()
}

fn resolve_one(
    name: &GlyphName,
    composite: &CompositeSpec,
    glyphs: &IndexMap<GlyphName, GlyphDefinition>,
    adjustments: &AccentAdjustments,
) -> Result<(Bitmap, i32), PixelfontError> {
    let base = glyphs
        .get(composite.base.as_str())
        .ok_or_else(|| PixelfontError::MissingBase {
            glyph: name.to_string(),
            base: composite.base.to_string(),
        })?;
    let mut bitmap = base.bitmap().cloned().unwrap_or_default();
    let mut y_offset = base.y_offset;

    for (position, accent_name) in [
        (AccentPosition::Top, &composite.top),
        (AccentPosition::Bottom, &composite.bottom),
    ] {
        let Some(accent_name) = accent_name else {
            continue;
        };
        let (accent_glyph_name, accent) = glyphs
            .get_key_value(accent_name.as_str())
            .ok_or_else(|| PixelfontError::MissingAccent {
                glyph: name.to_string(),
                position: position.as_str(),
                accent: accent_name.to_string(),
            })?;
        let mark_y = match position {
            AccentPosition::Top => base.properties.top_mark_y,
            AccentPosition::Bottom => base.properties.bottom_mark_y,
        }
        .ok_or_else(|| PixelfontError::MissingMarkAnchor {
            glyph: name.to_string(),
            base: composite.base.to_string(),
            position: position.as_str(),
        })?;
        let (x_adjust, y_adjust) =
            adjustments.get(&accent_key(accent_glyph_name, accent), &composite.base);
        let accent_bitmap = accent.bitmap().cloned().unwrap_or_default();
        let composed = bitmap
            .compose(
                y_offset,
                &accent_bitmap,
                mark_y + y_adjust,
                position,
                x_adjust,
            )
            .ok_or_else(|| PixelfontError::AccentOutOfBounds {
                glyph: name.to_string(),
                accent: accent_name.to_string(),
                x_adjust,
            })?;
        bitmap = composed.bitmap;
        y_offset = composed.y_offset;
    }
    Ok((bitmap, y_offset))
}
