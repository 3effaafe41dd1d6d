#![allow(clippy::expect_used, clippy::unwrap_used)]
use std::path::{Path, PathBuf};

use pixelfont::{build_all, build_font, FontVariant, PixelfontError};
use pretty_assertions::assert_eq;
use write_fonts::{
    read::{tables::glyf::Glyph, FontRef, TableProvider},
    types::{GlyphId, NameId, Tag},
};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/fixture")
}

fn name_string(font: &FontRef, id: NameId) -> Option<String> {
    let name = font.name().unwrap();
    name.name_record()
        .iter()
        .find(|record| record.name_id() == id)
        .map(|record| record.string(name.string_data()).unwrap().to_string())
}

fn has_table(font: &FontRef, tag: &[u8; 4]) -> bool {
    font.table_data(Tag::new(tag)).is_some()
}

#[test]
fn test_build_all_variants() {
    let data = pixelfont::load(fixture()).unwrap();
    let output = tempfile::tempdir().unwrap();
    let paths = build_all(&data, output.path(), &FontVariant::ALL).unwrap();
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "AbbotsMortonSpaceportMono.ttf",
            "AbbotsMortonSpaceportSansJunior.ttf",
            "AbbotsMortonSpaceportSansSenior.ttf",
        ]
    );
    for path in &paths {
        assert!(path.exists());
    }
}

#[test]
fn test_mono_font() {
    let data = pixelfont::load(fixture()).unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = build_font(&data, FontVariant::Mono, output.path()).unwrap();
    assert!(!path.with_extension("fea").exists());

    let bytes = std::fs::read(&path).unwrap();
    let font = FontRef::new(&bytes).unwrap();
    assert_eq!(font.post().unwrap().is_fixed_pitch(), 1);
    assert!(!has_table(&font, b"GPOS"));
    assert!(!has_table(&font, b"GSUB"));
    assert!(has_table(&font, b"gasp"));
    assert_eq!(
        name_string(&font, NameId::FAMILY_NAME).as_deref(),
        Some("Test Pixel Mono")
    );
    assert_eq!(
        name_string(&font, NameId::POSTSCRIPT_NAME).as_deref(),
        Some("TestPixelMono-Regular")
    );
    assert_eq!(
        name_string(&font, NameId::VERSION_STRING).as_deref(),
        Some("Version 1.25")
    );

    // Every advance is the monospace width apart from space and the marks
    let hmtx = font.hmtx().unwrap();
    let advances: Vec<u16> = hmtx.h_metrics().iter().map(|m| m.advance()).collect();
    assert_eq!(advances[0], 350);
    assert_eq!(advances[1], 150);
    assert!(advances.iter().all(|a| [0, 150, 350].contains(a)));

    // x.unused and l.prop never reach the font
    let maxp = font.maxp().unwrap();
    assert_eq!(maxp.num_glyphs(), 17);
    let cmap = font.cmap().unwrap();
    assert_eq!(cmap.map_codepoint(' '), Some(GlyphId::new(1)));
    assert!(cmap.map_codepoint('l').is_some());
    assert!(cmap.map_codepoint('A').is_some());
}

#[test]
fn test_junior_font() {
    let data = pixelfont::load(fixture()).unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = build_font(&data, FontVariant::Junior, output.path()).unwrap();
    let fea = std::fs::read_to_string(path.with_extension("fea")).unwrap();
    assert!(fea.contains("feature kern {"));
    assert!(fea.contains("feature mark {"));
    assert!(!fea.contains("feature curs"));
    assert!(fea.ends_with("} mark;\n"));

    let bytes = std::fs::read(&path).unwrap();
    let font = FontRef::new(&bytes).unwrap();
    assert_eq!(font.post().unwrap().is_fixed_pitch(), 0);
    assert!(has_table(&font, b"GPOS"));
    assert!(has_table(&font, b"GDEF"));
    // The proportional l is one cell wide plus margins
    let l = font.cmap().unwrap().map_codepoint('l').unwrap();
    assert_eq!(font.hmtx().unwrap().advance(l), Some(150));
}

#[test]
fn test_mark_side_bearing_matches_outline() {
    let data = pixelfont::load(fixture()).unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = build_font(&data, FontVariant::Junior, output.path()).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let font = FontRef::new(&bytes).unwrap();

    let gid = font.cmap().unwrap().map_codepoint('\u{301}').unwrap();
    let hmtx = font.hmtx().unwrap();
    let metric = &hmtx.h_metrics()[gid.to_u32() as usize];
    assert_eq!(metric.advance(), 0);

    let glyf = font.glyf().unwrap();
    let loca = font.loca(None).unwrap();
    let x_min = match loca.get_glyf(gid, &glyf).unwrap() {
        Some(Glyph::Simple(glyph)) => glyph.x_min(),
        _ => panic!("expected a simple glyph"),
    };
    // Two cells wide, centred on the origin
    assert_eq!(x_min, -50);
    assert_eq!(metric.side_bearing(), x_min);
}

#[test]
fn test_senior_font() {
    let data = pixelfont::load(fixture()).unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = build_font(&data, FontVariant::Senior, output.path()).unwrap();
    let fea = std::fs::read_to_string(path.with_extension("fea")).unwrap();
    for tag in ["kern", "mark", "liga", "curs", "calt"] {
        assert!(fea.contains(&format!("feature {tag} {{")), "no {tag} in\n{fea}");
    }
    assert!(fea.contains("sub @exit_y3 t' by t.entry-high;"));
    assert!(fea.contains("sub uni200C @qs_has_entry' by @qs_noentry;"));

    let bytes = std::fs::read(&path).unwrap();
    let font = FontRef::new(&bytes).unwrap();
    assert!(has_table(&font, b"GSUB"));
    assert!(has_table(&font, b"GPOS"));
    assert_eq!(
        name_string(&font, NameId::FAMILY_NAME).as_deref(),
        Some("Test Pixel Sans Senior")
    );
}

#[test]
fn test_missing_input() {
    let err = pixelfont::load(fixture().join("nonexistent.yaml")).unwrap_err();
    assert!(matches!(err, PixelfontError::InputNotFound { .. }));
}
