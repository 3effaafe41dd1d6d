use std::collections::{BTreeMap, BTreeSet};

use crate::{
    features::{anchor, height_label, FeatureBlock, Lookup},
    glyph::CursiveAnchor,
    glyphset::ResolvedGlyphSet,
};

/// The first anchor at height `y`, scaled to font units
fn scaled_at(anchors: &[CursiveAnchor], y: i32, pixel_size: i32) -> Option<(i32, i32)> {
    anchors
        .iter()
        .find(|a| a.y == y)
        .map(|a| (a.x * pixel_size, a.y * pixel_size))
}

/// Cursive attachment, one lookup per anchor height.
///
/// Keeping heights apart stops a glyph exiting at one height from attaching
/// to a glyph entering at another.
pub fn generate_curs(set: &ResolvedGlyphSet, pixel_size: i32) -> Option<FeatureBlock> {
    let mut by_height: BTreeMap<i32, BTreeSet<String>> = BTreeMap::new();
    for (name, glyph) in &set.glyphs {
        let props = &glyph.properties;
        let heights: BTreeSet<i32> = props.entry_ys().chain(props.exit_ys()).collect();
        for y in heights {
            by_height.entry(y).or_default().insert(format!(
                "pos cursive {} {} {}",
                name,
                anchor(scaled_at(&props.cursive_entry, y, pixel_size)),
                anchor(scaled_at(&props.cursive_exit, y, pixel_size))
            ));
        }
    }
    if by_height.is_empty() {
        return None;
    }

    // A chain-breaking glyph without an exit still has to sit in the lookups
    // its original enters at, or attachment would skip over it.
    for (name, glyph) in &set.glyphs {
        if !name.is_noentry() || !glyph.properties.cursive_exit.is_empty() {
            continue;
        }
        let Some(original) = glyph
            .properties
            .noentry_for
            .as_ref()
            .and_then(|n| set.get(n.as_str()))
        else {
            continue;
        };
        for y in original.properties.entry_ys() {
            by_height.entry(y).or_default().insert(format!(
                "pos cursive {} {} {}",
                name,
                anchor(None),
                anchor(None)
            ));
        }
    }

    let mut block = FeatureBlock::new("curs");
    for (y, rules) in by_height {
        let mut lookup = Lookup::new(format!("cursive_y{}", height_label(y)));
        for rule in rules {
            lookup.push(rule);
        }
        block.add_lookup(lookup);
    }
    Some(block)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        features::{test_support::*, Features},
        FontVariant,
    };
    use pretty_assertions::assert_eq;

    const BODY: &str = r#"
glyphs:
  uni200C:
    advance_width: 0
  t:
    bitmap: ['.#.', '###', '.#.']
    cursive_entry: [0, 0]
    cursive_exit: [[3, 0], [3, 2]]
  t.entry-high:
    bitmap: ['.#.', '###', '.#.']
    cursive_entry: [0, 2]
  n:
    bitmap: ['###', '#.#', '#.#']
    cursive_entry: [[0, 0], [0, -1]]
"#;

    #[test]
    fn test_lookups_grouped_by_height() {
        let (_, set) = resolve(BODY, FontVariant::Senior);
        let block = generate_curs(&set, 50).unwrap();
        let names: Vec<&str> = block.lookups().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["cursive_yn1", "cursive_y0", "cursive_y2"]);
        assert_eq!(
            block.lookup("cursive_y0").unwrap().rules,
            vec![
                "pos cursive n <anchor 0 0> <anchor NULL>",
                "pos cursive n.noentry <anchor NULL> <anchor NULL>",
                "pos cursive t <anchor 0 0> <anchor 150 0>",
                "pos cursive t.noentry <anchor NULL> <anchor 150 0>",
            ]
        );
        assert_eq!(
            block.lookup("cursive_y2").unwrap().rules,
            vec![
                "pos cursive t <anchor NULL> <anchor 150 100>",
                "pos cursive t.entry-high <anchor 0 100> <anchor NULL>",
                "pos cursive t.noentry <anchor NULL> <anchor 150 100>",
            ]
        );
    }

    #[test]
    fn test_noentry_without_exit_joins_original_heights() {
        let (_, set) = resolve(BODY, FontVariant::Senior);
        let block = generate_curs(&set, 50).unwrap();
        assert_eq!(
            block.lookup("cursive_yn1").unwrap().rules,
            vec![
                "pos cursive n <anchor 0 -50> <anchor NULL>",
                "pos cursive n.noentry <anchor NULL> <anchor NULL>",
            ]
        );
    }

    #[test]
    fn test_no_anchors() {
        let (_, set) = resolve("glyphs:\n  a:\n    bitmap: ['#']\n", FontVariant::Senior);
        assert!(generate_curs(&set, 50).is_none());
    }

    #[test]
    fn test_parses() {
        let (_, set) = resolve(BODY, FontVariant::Senior);
        let mut features = Features::default();
        features.push(generate_curs(&set, 50));
        assert_parses(&features.to_fea(), &set);
    }
}
