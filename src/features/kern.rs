use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    features::{FeatureBlock, Lookup},
    font::KerningDefinition,
    glyphset::ResolvedGlyphSet,
};

/// Kerning group tag to the glyphs declaring it
fn kerning_groups(set: &ResolvedGlyphSet) -> HashMap<&str, BTreeSet<&str>> {
    let mut groups: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for (name, glyph) in &set.glyphs {
        for tag in &glyph.properties.kerning {
            groups.entry(tag.as_str()).or_default().insert(name.as_str());
        }
    }
    groups
}

/// Keep the names present in `set`, logging the others
fn present<'a>(
    set: &ResolvedGlyphSet,
    tag: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Vec<&'a str> {
    names
        .into_iter()
        .filter(|name| {
            let keep = set.contains(name);
            if !keep {
                log::debug!("Kerning group {} names absent glyph {}", tag, name);
            }
            keep
        })
        .collect()
}

/// One pair-positioning lookup per kerning definition.
///
/// The left side is the definition's explicit list, or else every glyph not
/// tagged with the definition's group.
pub fn generate_kern(
    set: &ResolvedGlyphSet,
    kerning: &IndexMap<SmolStr, KerningDefinition>,
    pixel_size: i32,
) -> Option<FeatureBlock> {
    if kerning.is_empty() {
        return None;
    }
    let groups = kerning_groups(set);
    let mut block = FeatureBlock::new("kern");
    for (tag, definition) in kerning {
        let mut left: Vec<&str> = match &definition.left {
            Some(left) => present(set, tag, left.iter().map(SmolStr::as_str)),
            None => {
                let excluded = groups.get(tag.as_str());
                set.glyphs
                    .keys()
                    .map(|name| name.as_str())
                    .filter(|name| !excluded.is_some_and(|e| e.contains(name)))
                    .collect()
            }
        };
        left.sort_unstable();
        let right = present(set, tag, definition.right.iter().map(SmolStr::as_str));
        if left.is_empty() || right.is_empty() {
            log::debug!("Kerning group {} has an empty side, skipping", tag);
            continue;
        }
        let mut lookup = Lookup::new(format!("kern_{}", tag));
        lookup.push(format!(
            "pos [{}] [{}] {}",
            left.join(" "),
            right.join(" "),
            definition.value * pixel_size
        ));
        block.add_lookup(lookup);
    }
    Some(block)
}
