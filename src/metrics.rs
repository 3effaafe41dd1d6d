//! Horizontal metrics derived from bitmaps.
use kurbo::Rect;

use crate::{
    glyph::ResolvedGlyph,
    glyphset::{ResolvedGlyphSet, NOTDEF, SPACE},
    GlyphName,
};

/// Cells per monospace advance: a five-cell glyph plus one cell either side
pub const MONO_CELLS: i32 = 7;
/// Blank cells added to a bitmap's width for a proportional advance
pub const PROPORTIONAL_MARGIN: i32 = 2;

/// Horizontal metrics of one glyph, in font units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphMetrics {
    pub advance_width: i32,
    /// Shift applied to the bitmap's rectangles when drawing the outline
    pub x_offset: i32,
    pub lsb: i32,
}

pub fn mono_width(pixel_size: i32) -> i32 {
    MONO_CELLS * pixel_size
}

/// Scale an explicit advance, which may be fractional, to font units,
/// truncating toward zero
pub fn scaled_advance(advance_width: f64, pixel_size: i32) -> i32 {
    (advance_width * f64::from(pixel_size)).trunc() as i32
}

/// The advance a glyph gets in a proportional font: its explicit advance if
/// it has one, otherwise the bitmap width plus margins. `None` for a glyph
/// with neither.
pub fn proportional_advance(glyph: &ResolvedGlyph, pixel_size: i32) -> Option<i32> {
    if let Some(advance) = glyph.properties.advance_width {
        return Some(scaled_advance(advance, pixel_size));
    }
    glyph
        .bitmap
        .as_ref()
        .map(|bitmap| (bitmap.width() as i32 + PROPORTIONAL_MARGIN) * pixel_size)
}

/// The `.notdef` box: four cells square, one cell in from the origin
pub fn notdef_box(pixel_size: i32) -> Rect {
    Rect::new(
        f64::from(pixel_size),
        0.0,
        f64::from(5 * pixel_size),
        f64::from(5 * pixel_size),
    )
}

/// Metrics of glyph `name` in `set`
pub fn glyph_metrics(set: &ResolvedGlyphSet, name: &GlyphName, pixel_size: i32) -> GlyphMetrics {
    let mono = mono_width(pixel_size);
    if name.as_str() == NOTDEF {
        return GlyphMetrics {
            advance_width: mono,
            x_offset: 0,
            lsb: pixel_size,
        };
    }
    let glyph = set.get(name.as_str());
    let explicit = glyph
        .and_then(|g| g.properties.advance_width)
        .map(|advance| scaled_advance(advance, pixel_size));

    if name.as_str() == SPACE {
        let advance_width = explicit.unwrap_or_else(|| {
            log::warn!("space has no advance_width, using the monospace width");
            mono
        });
        return GlyphMetrics {
            advance_width,
            ..Default::default()
        };
    }

    let Some((glyph, bitmap)) = glyph.and_then(|g| g.bitmap.as_ref().map(|b| (g, b))) else {
        return GlyphMetrics {
            advance_width: explicit.unwrap_or(mono),
            ..Default::default()
        };
    };

    let advance_width = match explicit {
        Some(advance) => advance,
        None if set.is_proportional_glyph(name) => {
            (bitmap.width() as i32 + PROPORTIONAL_MARGIN) * pixel_size
        }
        None => mono,
    };
    let bitmap_width = bitmap.width() as i32 * pixel_size;
    // Zero-advance glyphs are centred on the origin
    let x_offset = if advance_width == 0 {
        -(bitmap_width / 2)
    } else {
        (advance_width - bitmap_width).div_euclid(2)
    };
    // lsb is the outline's xMin
    let leftmost = bitmap
        .rectangles(pixel_size, glyph.y_offset)
        .iter()
        .map(|r| r.x0)
        .fold(None, |min: Option<f64>, x| Some(min.map_or(x, |m| m.min(x))));
    let lsb = leftmost.map_or(x_offset, |x| x as i32 + x_offset);
    GlyphMetrics {
        advance_width,
        x_offset,
        lsb,
    }
}
