//! Turning a resolved glyph set into a font binary.
//!
//! Outlines are TrueType: every ink cell becomes one closed four-point
//! contour. Layout tables come from compiling the generated feature source
//! with fea-rs and are copied into the font as-is.
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use chrono::Utc;
use fea_rs_ast::fea_rs::{
    self,
    compile::{Compiler, NopFeatureProvider, NopVariationInfo},
};
use kurbo::{BezPath, Rect, Vec2};
use smol_str::SmolStr;
use write_fonts::{
    read::FontRef,
    tables::{
        cmap::Cmap,
        gasp::{Gasp, GaspRange, GaspRangeBehavior},
        glyf::{Bbox, GlyfLocaBuilder, SimpleGlyph},
        head::Head,
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        loca::LocaFormat,
        maxp::Maxp,
        os2::{Os2, SelectionFlags},
        post::Post,
    },
    types::{FWord, Fixed, GlyphId, LongDateTime, Tag, UfWord},
    FontBuilder,
};

use crate::{
    features::generate_features,
    font::GlyphData,
    glyphset::{ResolvedGlyphSet, NOTDEF},
    metrics::{glyph_metrics, notdef_box, GlyphMetrics},
    names::Names,
    FontVariant, GlyphName, PixelfontError,
};

/// Seconds between the OpenType epoch (1904-01-01) and the Unix epoch
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

fn overflow(glyph: &GlyphName, value: impl Into<i64>) -> PixelfontError {
    PixelfontError::CoordinateOverflow {
        glyph: glyph.to_string(),
        value: value.into(),
    }
}

fn to_i16(glyph: &GlyphName, value: i32) -> Result<i16, PixelfontError> {
    i16::try_from(value).map_err(|_| overflow(glyph, value))
}

fn to_u16(glyph: &GlyphName, value: i32) -> Result<u16, PixelfontError> {
    u16::try_from(value).map_err(|_| overflow(glyph, value))
}

/// The ink rectangles of a glyph, before horizontal positioning
fn glyph_rectangles(set: &ResolvedGlyphSet, name: &GlyphName, pixel_size: i32) -> Vec<Rect> {
    if name.as_str() == NOTDEF {
        return vec![notdef_box(pixel_size)];
    }
    set.get(name.as_str())
        .and_then(|glyph| {
            glyph
                .bitmap
                .as_ref()
                .map(|bitmap| bitmap.rectangles(pixel_size, glyph.y_offset))
        })
        .unwrap_or_default()
}

/// One clockwise contour per rectangle, shifted right by `x_offset`
pub fn simple_glyph(
    name: &GlyphName,
    rects: &[Rect],
    x_offset: i32,
) -> Result<SimpleGlyph, PixelfontError> {
    if rects.is_empty() {
        return Ok(SimpleGlyph::default());
    }
    let shift = Vec2::new(f64::from(x_offset), 0.0);
    let mut path = BezPath::new();
    for rect in rects {
        let rect = *rect + shift;
        for value in [rect.x0, rect.y0, rect.x1, rect.y1] {
            if value < f64::from(i16::MIN) || value > f64::from(i16::MAX) {
                return Err(overflow(name, value as i64));
            }
        }
        path.move_to((rect.x0, rect.y0));
        path.line_to((rect.x0, rect.y1));
        path.line_to((rect.x1, rect.y1));
        path.line_to((rect.x1, rect.y0));
        path.close_path();
    }
    SimpleGlyph::from_bezpath(&path).map_err(|e| PixelfontError::Outline {
        glyph: name.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Running totals for the font-wide metric tables
#[derive(Default)]
struct FontExtents {
    bbox: Option<Bbox>,
    advance_width_max: u16,
    min_left_side_bearing: Option<i16>,
    min_right_side_bearing: Option<i16>,
    x_max_extent: Option<i16>,
    max_points: u16,
    max_contours: u16,
    advance_total: i64,
    advance_count: i64,
}

impl FontExtents {
    fn add(
        &mut self,
        name: &GlyphName,
        glyph: &SimpleGlyph,
        metrics: &GlyphMetrics,
        contours: usize,
    ) -> Result<(), PixelfontError> {
        let advance = to_u16(name, metrics.advance_width)?;
        self.advance_width_max = self.advance_width_max.max(advance);
        if advance > 0 {
            self.advance_total += i64::from(advance);
            self.advance_count += 1;
        }
        if contours == 0 {
            return Ok(());
        }
        let bbox = glyph.bbox;
        self.bbox = Some(self.bbox.map_or(bbox, |b| b.union(bbox)));
        let lsb = bbox.x_min;
        let rsb = to_i16(name, metrics.advance_width - i32::from(bbox.x_max))?;
        // lsb is the bbox's left edge, so the extent is its right edge
        let extent = bbox.x_max;
        self.min_left_side_bearing = Some(self.min_left_side_bearing.map_or(lsb, |m| m.min(lsb)));
        self.min_right_side_bearing =
            Some(self.min_right_side_bearing.map_or(rsb, |m| m.min(rsb)));
        self.x_max_extent = Some(self.x_max_extent.map_or(extent, |m| m.max(extent)));
        let contours = to_u16(name, contours as i32)?;
        self.max_contours = self.max_contours.max(contours);
        self.max_points = self.max_points.max(contours.saturating_mul(4));
        Ok(())
    }

    fn average_advance(&self) -> i16 {
        if self.advance_count == 0 {
            return 0;
        }
        (self.advance_total / self.advance_count)
            .try_into()
            .unwrap_or(i16::MAX)
    }
}

/// Build every table except the layout ones
fn assemble(
    data: &GlyphData,
    set: &ResolvedGlyphSet,
    layout: Option<&[u8]>,
) -> Result<Vec<u8>, PixelfontError> {
    let metadata = &data.metadata;
    let pixel_size = metadata.pixel_size;

    let mut glyf_builder = GlyfLocaBuilder::new();
    let mut h_metrics = Vec::with_capacity(set.order.len());
    let mut extents = FontExtents::default();
    for name in &set.order {
        let metrics = glyph_metrics(set, name, pixel_size);
        let rects = glyph_rectangles(set, name, pixel_size);
        let glyph = simple_glyph(name, &rects, metrics.x_offset)?;
        extents.add(name, &glyph, &metrics, rects.len())?;
        glyf_builder.add_glyph(&glyph)?;
        h_metrics.push(LongMetric {
            advance: to_u16(name, metrics.advance_width)?,
            side_bearing: to_i16(name, metrics.lsb)?,
        });
    }
    let (glyf, loca, loca_format) = glyf_builder.build();
    let num_glyphs = u16::try_from(set.order.len()).map_err(|_| {
        PixelfontError::CoordinateOverflow {
            glyph: "glyph count".to_string(),
            value: set.order.len() as i64,
        }
    })?;

    let glyph_ids: HashMap<&str, u32> = set
        .order
        .iter()
        .enumerate()
        .map(|(gid, name)| (name.as_str(), gid as u32))
        .collect();
    let cmap = Cmap::from_mappings(set.cmap.iter().filter_map(|(codepoint, name)| {
        let character = char::from_u32(*codepoint)?;
        let gid = glyph_ids.get(name.as_str())?;
        Some((character, GlyphId::new(*gid)))
    }))?;

    let bbox = extents.bbox.unwrap_or_default();
    let hhea = Hhea {
        ascender: FWord::new(metadata.ascender),
        descender: FWord::new(metadata.descender),
        line_gap: FWord::new(0),
        advance_width_max: UfWord::new(extents.advance_width_max),
        min_left_side_bearing: FWord::new(extents.min_left_side_bearing.unwrap_or(0)),
        min_right_side_bearing: FWord::new(extents.min_right_side_bearing.unwrap_or(0)),
        x_max_extent: FWord::new(extents.x_max_extent.unwrap_or(0)),
        caret_slope_rise: 1,
        caret_slope_run: 0,
        caret_offset: 0,
        number_of_h_metrics: num_glyphs,
        ..Default::default()
    };
    let hmtx = Hmtx {
        h_metrics,
        left_side_bearings: vec![],
    };

    let maxp = Maxp {
        num_glyphs,
        max_points: Some(extents.max_points),
        max_contours: Some(extents.max_contours),
        max_composite_points: Some(0),
        max_composite_contours: Some(0),
        max_zones: Some(2),
        max_twilight_points: Some(0),
        max_storage: Some(0),
        max_function_defs: Some(0),
        max_instruction_defs: Some(0),
        max_stack_elements: Some(0),
        max_size_of_instructions: Some(0),
        max_component_elements: Some(0),
        max_component_depth: Some(0),
    };

    let bmp_codepoints = set.cmap.keys().map(|cp| (*cp).min(0xFFFF) as u16);
    let os2 = Os2 {
        x_avg_char_width: extents.average_advance(),
        us_weight_class: 400,
        us_width_class: 5,
        fs_type: 0,
        ach_vend_id: Tag::new(b"NONE"),
        fs_selection: SelectionFlags::REGULAR,
        us_first_char_index: bmp_codepoints.clone().min().unwrap_or(0),
        us_last_char_index: bmp_codepoints.max().unwrap_or(0),
        s_typo_ascender: metadata.ascender,
        s_typo_descender: metadata.descender,
        s_typo_line_gap: 0,
        us_win_ascent: metadata.ascender.max(0).unsigned_abs(),
        us_win_descent: metadata.descender.unsigned_abs(),
        ul_code_page_range_1: Some(1),
        ul_code_page_range_2: Some(0),
        sx_height: Some(metadata.x_height),
        s_cap_height: Some(metadata.cap_height),
        us_default_char: Some(0),
        us_break_char: Some(0x20),
        us_max_context: Some(0),
        ..Default::default()
    };

    let mut post = Post::new_v2(set.order.iter().map(GlyphName::as_str));
    post.is_fixed_pitch = u32::from(!set.variant.is_proportional());

    let now = LongDateTime::new(Utc::now().timestamp() + MAC_EPOCH_OFFSET);
    let head = Head {
        font_revision: Fixed::from_f64(metadata.version.value()),
        units_per_em: metadata.units_per_em,
        created: now,
        modified: now,
        x_min: bbox.x_min,
        y_min: bbox.y_min,
        x_max: bbox.x_max,
        y_max: bbox.y_max,
        lowest_rec_ppem: 3,
        font_direction_hint: 2,
        index_to_loc_format: match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        },
        ..Default::default()
    };

    let gasp = Gasp {
        version: 1,
        num_ranges: 1,
        gasp_ranges: vec![GaspRange {
            range_max_ppem: 0xFFFF,
            range_gasp_behavior: GaspRangeBehavior::GASP_GRIDFIT,
        }],
    };

    let name = Names::new(metadata, set.variant).to_table();

    let mut builder = FontBuilder::new();
    builder.add_table(&head)?;
    builder.add_table(&hhea)?;
    builder.add_table(&maxp)?;
    builder.add_table(&os2)?;
    builder.add_table(&hmtx)?;
    builder.add_table(&cmap)?;
    builder.add_table(&loca)?;
    builder.add_table(&glyf)?;
    builder.add_table(&name)?;
    builder.add_table(&post)?;
    builder.add_table(&gasp)?;
    if let Some(layout) = layout {
        builder.copy_missing_tables(FontRef::new(layout)?);
    }
    Ok(builder.build())
}

/// Compile the feature file at `fea_path` against the glyph order of `set`.
///
/// The result is a font containing only the layout tables.
pub fn compile_features(fea_path: &Path, set: &ResolvedGlyphSet) -> Result<Vec<u8>, PixelfontError> {
    let glyph_names: Vec<SmolStr> = set.order.iter().map(|n| SmolStr::new(n.as_str())).collect();
    let glyph_map = fea_rs::GlyphMap::from_iter(glyph_names.iter().cloned());
    Compiler::<NopFeatureProvider, NopVariationInfo>::new(fea_path.to_path_buf(), &glyph_map)
        .compile_binary()
        .map_err(|e| PixelfontError::FeatureCompilation(e.to_string()))
}

/// Build the font for `variant`, writing `<stem>.ttf` (and `<stem>.fea`
/// when there are features) into `output_dir`.
pub fn build_font(
    data: &GlyphData,
    variant: FontVariant,
    output_dir: &Path,
) -> Result<PathBuf, PixelfontError> {
    let set = ResolvedGlyphSet::resolve(data, variant)?;
    let features = generate_features(&set, data)?;
    let font_path = output_dir.join(format!("{}.ttf", variant.file_stem()));

    let layout = if features.is_empty() {
        None
    } else {
        let fea_path = font_path.with_extension("fea");
        std::fs::write(&fea_path, features.to_fea())?;
        log::info!("Feature code saved to {}", fea_path.display());
        Some(compile_features(&fea_path, &set)?)
    };

    let bytes = assemble(data, &set, layout.as_deref())?;
    std::fs::write(&font_path, &bytes)?;
    log::info!(
        "Font saved to {} ({} variant, {} glyphs, {} features)",
        font_path.display(),
        variant,
        set.order.len(),
        features.blocks.len()
    );
    Ok(font_path)
}

/// Build each of `variants` in turn, stopping at the first error
pub fn build_all(
    data: &GlyphData,
    output_dir: &Path,
    variants: &[FontVariant],
) -> Result<Vec<PathBuf>, PixelfontError> {
    variants
        .iter()
        .map(|variant| build_font(data, *variant, output_dir))
        .collect()
}
