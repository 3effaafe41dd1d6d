use crate::{features::FeatureBlock, glyphset::ResolvedGlyphSet};

/// `sub a b by a_b` for every ligature whose components are all present
pub fn generate_liga(set: &ResolvedGlyphSet) -> Option<FeatureBlock> {
    let mut ligatures: Vec<(&str, Vec<&str>)> = set
        .glyphs
        .keys()
        .filter_map(|name| {
            let components = name.ligature_components()?;
            if let Some(missing) = components.iter().find(|c| !set.contains(c)) {
                log::debug!("Skipping ligature {}: no glyph {}", name, missing);
                return None;
            }
            Some((name.as_str(), components))
        })
        .collect();
    if ligatures.is_empty() {
        return None;
    }
    ligatures.sort_unstable_by_key(|(name, _)| *name);

    let mut block = FeatureBlock::new("liga");
    for (name, components) in ligatures {
        block.add_rule(format!("sub {} by {}", components.join(" "), name));
    }
    Some(block)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        features::{test_support::*, Features, Statement},
        FontVariant,
    };
    use pretty_assertions::assert_eq;

    const BODY: &str = r#"
glyphs:
  f:
    bitmap: ['.##', '##.', '#..']
  i:
    bitmap: ['#', '.', '#']
  l:
    bitmap: ['#', '#', '#']
  f_l:
    bitmap: ['.###', '##.#', '#..#']
  f_i:
    bitmap: ['.###', '##..', '#..#']
  f_j:
    bitmap: ['.###', '##..', '#..#']
"#;

    #[test]
    fn test_ligatures_sorted_and_complete() {
        let (_, set) = resolve(BODY, FontVariant::Senior);
        let block = generate_liga(&set).unwrap();
        assert_eq!(
            block.statements,
            vec![
                Statement::Rule("sub f i by f_i".to_string()),
                Statement::Rule("sub f l by f_l".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_ligatures() {
        let (_, set) = resolve("glyphs:\n  a:\n    bitmap: ['#']\n", FontVariant::Senior);
        assert!(generate_liga(&set).is_none());
    }

    #[test]
    fn test_parses() {
        let (_, set) = resolve(BODY, FontVariant::Senior);
        let mut features = Features::default();
        features.push(generate_liga(&set));
        assert_parses(&features.to_fea(), &set);
    }
}
