use std::collections::BTreeMap;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    bitmap::AccentPosition,
    features::{anchor, sanitize, FeatureBlock, Lookup},
    glyphset::ResolvedGlyphSet,
    metrics::proportional_advance,
};

/// A combining mark and where it attaches
struct Mark<'a> {
    name: &'a str,
    position: AccentPosition,
    anchor: (i32, i32),
    x_adjust: IndexMap<SmolStr, i32>,
    y_adjust: IndexMap<SmolStr, i32>,
}

impl Mark<'_> {
    fn is_adjusted(&self) -> bool {
        !self.x_adjust.is_empty() || !self.y_adjust.is_empty()
    }
}

/// Base glyph name to anchor, one map per attachment position
#[derive(Default)]
struct Bases<'a> {
    top: BTreeMap<&'a str, (i32, i32)>,
    bottom: BTreeMap<&'a str, (i32, i32)>,
}

impl<'a> Bases<'a> {
    fn get(&self, position: AccentPosition) -> &BTreeMap<&'a str, (i32, i32)> {
        match position {
            AccentPosition::Top => &self.top,
            AccentPosition::Bottom => &self.bottom,
        }
    }
}

fn collect_marks(set: &ResolvedGlyphSet, pixel_size: i32) -> Vec<Mark<'_>> {
    set.glyphs
        .iter()
        .filter(|(_, glyph)| glyph.properties.is_mark)
        .map(|(name, glyph)| {
            // Top marks hang from the bottom of their ink, bottom marks from the top
            let (position, y) = if glyph.y_offset >= 0 {
                (AccentPosition::Top, glyph.y_offset)
            } else {
                (
                    AccentPosition::Bottom,
                    glyph.y_offset + glyph.height() as i32,
                )
            };
            Mark {
                name: name.as_str(),
                position,
                anchor: (0, y * pixel_size),
                x_adjust: glyph.properties.mark_x_adjust(),
                y_adjust: glyph.properties.mark_y_adjust(),
            }
        })
        .collect()
}

fn collect_bases(set: &ResolvedGlyphSet, pixel_size: i32) -> Bases<'_> {
    let mut bases = Bases::default();
    for (name, glyph) in &set.glyphs {
        let props = &glyph.properties;
        if props.is_mark {
            continue;
        }
        let Some(advance) = proportional_advance(glyph, pixel_size) else {
            continue;
        };
        let centre = advance.div_euclid(2);
        if let Some(y) = props.top_mark_y {
            bases.top.insert(
                name.as_str(),
                (
                    centre + props.top_mark_x.unwrap_or(0) * pixel_size,
                    y * pixel_size,
                ),
            );
        }
        if let Some(y) = props.bottom_mark_y {
            bases.bottom.insert(
                name.as_str(),
                (
                    centre + props.bottom_mark_x.unwrap_or(0) * pixel_size,
                    y * pixel_size,
                ),
            );
        }
    }
    bases
}

/// Mark-to-base attachment.
///
/// Marks without per-base adjustments share the `@mark_top` and
/// `@mark_bottom` classes; each adjusted mark gets a class and lookup of its
/// own, with the adjustments folded into the base anchors.
pub fn generate_mark(set: &ResolvedGlyphSet, pixel_size: i32) -> Option<FeatureBlock> {
    let mut marks = collect_marks(set, pixel_size);
    if marks.is_empty() {
        return None;
    }
    let bases = collect_bases(set, pixel_size);
    if bases.top.is_empty() && bases.bottom.is_empty() {
        log::debug!("No mark bases, skipping mark feature");
        return None;
    }
    marks.sort_by_key(|m| m.name);

    let mut block = FeatureBlock::new("mark");
    for position in [AccentPosition::Top, AccentPosition::Bottom] {
        for mark in marks
            .iter()
            .filter(|m| m.position == position && !m.is_adjusted())
        {
            block.mark_classes.push(format!(
                "markClass {} {} @mark_{};",
                mark.name,
                anchor(Some(mark.anchor)),
                position.as_str()
            ));
        }
    }
    for mark in marks.iter().filter(|m| m.is_adjusted()) {
        block.mark_classes.push(format!(
            "markClass {} {} @mark_{};",
            mark.name,
            anchor(Some(mark.anchor)),
            sanitize(mark.name)
        ));
    }

    for position in [AccentPosition::Top, AccentPosition::Bottom] {
        let has_marks = marks
            .iter()
            .any(|m| m.position == position && !m.is_adjusted());
        if !has_marks {
            continue;
        }
        let mut lookup = Lookup::new(format!("mark_{}", position.as_str()));
        for (base, point) in bases.get(position) {
            lookup.push(format!(
                "pos base {} {} mark @mark_{}",
                base,
                anchor(Some(*point)),
                position.as_str()
            ));
        }
        block.add_lookup(lookup);
    }

    for mark in marks.iter().filter(|m| m.is_adjusted()) {
        let class = sanitize(mark.name);
        let mut lookup = Lookup::new(format!("mark_{}", mark.name));
        for (base, (x, y)) in bases.get(mark.position) {
            let dx = mark.x_adjust.get(*base).copied().unwrap_or(0) * pixel_size;
            let dy = mark.y_adjust.get(*base).copied().unwrap_or(0) * pixel_size;
            lookup.push(format!(
                "pos base {} {} mark @mark_{}",
                base,
                anchor(Some((x + dx, y + dy))),
                class
            ));
        }
        block.add_lookup(lookup);
    }

    if block.is_empty() {
        return None;
    }
    Some(block)
}
