//! Contextual alternates for cursive joining.
//!
//! Two kinds of substitution pick the variant of a glyph that joins its
//! neighbours at the right height:
//!
//! * backward rules swap in an `.entry-*` variant according to the exit
//!   height of the preceding glyph;
//! * forward rules swap in a variant with a different exit (`.exit-*`,
//!   `.half`, ...) according to the entry height of the following glyph.
//!
//! Substituting one glyph can change the exit height its successor sees, so
//! the backward lookups are ordered so that a glyph whose variants introduce
//! new exit heights is processed before any glyph that reacts to them.
use std::collections::{BTreeMap, BTreeSet};

use smol_str::SmolStr;

use crate::{
    features::{height_label, FeatureBlock, Lookup},
    filters::ZWNJ,
    glyphset::ResolvedGlyphSet,
    GlyphName, PixelfontError,
};

type ByHeight<'a> = BTreeMap<i32, &'a str>;

/// A variant that only applies next to a listed set of glyphs
struct PairOverride<'a> {
    variant: &'a str,
    neighbours: BTreeSet<String>,
}

#[derive(Default)]
struct Plan<'a> {
    /// Base to entry height to the entry variant used after that height
    backward: BTreeMap<&'a str, ByHeight<'a>>,
    backward_pairs: BTreeMap<&'a str, Vec<PairOverride<'a>>>,
    /// Base to exit height to the variant used before that height
    forward: BTreeMap<&'a str, ByHeight<'a>>,
    forward_pairs: BTreeMap<&'a str, Vec<PairOverride<'a>>>,
    /// Following glyphs before which a forward substitution must not happen
    exclusions: BTreeMap<&'a str, BTreeMap<i32, BTreeSet<String>>>,
    exit_classes: BTreeMap<i32, BTreeSet<&'a str>>,
    entry_classes: BTreeMap<i32, BTreeSet<&'a str>>,
}

/// A glyph named in `calt_after` and friends may be a `.prop` name which the
/// proportional fonts know by its base name.
fn resolve_neighbour(set: &ResolvedGlyphSet, name: &str) -> String {
    if set.contains(name) {
        name.to_string()
    } else {
        GlyphName::new(name).without_prop().to_string()
    }
}

fn resolve_neighbours<'a>(
    set: &ResolvedGlyphSet,
    names: impl IntoIterator<Item = &'a SmolStr>,
) -> BTreeSet<String> {
    names
        .into_iter()
        .map(|n| resolve_neighbour(set, n))
        .collect()
}

impl<'a> Plan<'a> {
    fn new(set: &'a ResolvedGlyphSet) -> Self {
        let mut plan = Plan::default();
        for (name, glyph) in &set.glyphs {
            let props = &glyph.properties;
            if !name.is_entry_variant() || !set.contains(name.base()) {
                continue;
            }
            let Some(entry) = props.cursive_entry.first() else {
                continue;
            };
            if props.calt_after.is_empty() {
                plan.backward
                    .entry(name.base())
                    .or_default()
                    .insert(entry.y, name.as_str());
            } else {
                plan.backward_pairs
                    .entry(name.base())
                    .or_default()
                    .push(PairOverride {
                        variant: name.as_str(),
                        neighbours: resolve_neighbours(set, &props.calt_after),
                    });
            }
        }

        for (name, glyph) in &set.glyphs {
            let props = &glyph.properties;
            if name.is_plain()
                || name.is_entry_variant()
                || name.is_noentry()
                || !set.contains(name.base())
            {
                continue;
            }
            let Some(exit) = props.cursive_exit.first() else {
                continue;
            };
            if props.calt_before.is_empty() {
                plan.forward
                    .entry(name.base())
                    .or_default()
                    .insert(exit.y, name.as_str());
                if !props.calt_not_before.is_empty() {
                    plan.exclusions
                        .entry(name.base())
                        .or_default()
                        .insert(exit.y, resolve_neighbours(set, &props.calt_not_before));
                }
            } else {
                plan.forward_pairs
                    .entry(name.base())
                    .or_default()
                    .push(PairOverride {
                        variant: name.as_str(),
                        neighbours: resolve_neighbours(set, &props.calt_before),
                    });
            }
        }

        for (name, glyph) in &set.glyphs {
            let props = &glyph.properties;
            if !name.is_noentry() {
                for y in props.exit_ys() {
                    plan.exit_classes.entry(y).or_default().insert(name.as_str());
                }
            }
            for y in props.entry_ys() {
                let class = plan.entry_classes.entry(y).or_default();
                class.insert(name.as_str());
                // The base is still in the stream when forward rules look at it
                if name.is_entry_variant() && set.contains(name.base()) {
                    class.insert(name.base());
                }
            }
        }
        plan
    }

    fn is_empty(&self) -> bool {
        self.backward.is_empty() && self.forward.is_empty()
    }

    /// Backward bases ordered so that any base whose variants introduce an
    /// exit height comes before the bases that substitute on that height.
    fn backward_order(&self, set: &ResolvedGlyphSet) -> Result<Vec<&'a str>, PixelfontError> {
        let new_exit_ys: BTreeMap<&str, BTreeSet<i32>> = self
            .backward
            .iter()
            .map(|(base, variants)| {
                let own: BTreeSet<i32> = set
                    .get(base)
                    .map(|g| g.properties.exit_ys().collect())
                    .unwrap_or_default();
                let introduced = variants
                    .values()
                    .filter_map(|variant| set.get(variant))
                    .flat_map(|g| g.properties.exit_ys())
                    .filter(|y| !own.contains(y))
                    .collect();
                (*base, introduced)
            })
            .collect();

        // depends_on[b] holds every a which must run before b
        let mut depends_on: BTreeMap<&'a str, BTreeSet<&'a str>> = BTreeMap::new();
        for (b, b_variants) in &self.backward {
            let deps = depends_on.entry(*b).or_default();
            for a in self.backward.keys() {
                if a == b {
                    continue;
                }
                if b_variants
                    .keys()
                    .any(|y| new_exit_ys.get(a).is_some_and(|ys| ys.contains(y)))
                {
                    deps.insert(*a);
                }
            }
        }

        let mut order = vec![];
        let mut visited = BTreeSet::new();
        let mut in_progress = BTreeSet::new();
        for node in depends_on.keys() {
            visit(*node, &depends_on, &mut visited, &mut in_progress, &mut order)?;
        }
        Ok(order)
    }
}

fn visit<'a>(
    node: &'a str,
    depends_on: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    visited: &mut BTreeSet<&'a str>,
    in_progress: &mut BTreeSet<&'a str>,
    order: &mut Vec<&'a str>,
) -> Result<(), PixelfontError> {
    if in_progress.contains(node) {
        return Err(PixelfontError::CyclicCaltDependency {
            glyph: node.to_string(),
        });
    }
    if visited.contains(node) {
        return Ok(());
    }
    in_progress.insert(node);
    if let Some(deps) = depends_on.get(node) {
        for dep in deps {
            visit(*dep, depends_on, visited, in_progress, order)?;
        }
    }
    in_progress.remove(node);
    visited.insert(node);
    order.push(node);
    Ok(())
}

/// Substitute `.noentry` forms after a ZWNJ so the cursive chain breaks
fn zwnj_lookup(set: &ResolvedGlyphSet, block: &mut FeatureBlock) {
    if !set.contains(ZWNJ) {
        return;
    }
    let mut pairs: Vec<(&str, &str)> = set
        .glyphs
        .keys()
        .filter_map(|name| {
            let base = name.as_str().strip_suffix(".noentry")?;
            set.contains(base).then_some((base, name.as_str()))
        })
        .collect();
    if pairs.is_empty() {
        return;
    }
    pairs.sort_unstable_by_key(|(_, noentry)| *noentry);
    block.add_class("qs_has_entry", pairs.iter().map(|(base, _)| *base));
    block.add_class("qs_noentry", pairs.iter().map(|(_, noentry)| *noentry));
    let mut lookup = Lookup::new("calt_zwnj");
    lookup.push(format!("sub {} @qs_has_entry' by @qs_noentry", ZWNJ));
    block.add_lookup(lookup);
}

fn emit_forward(plan: &Plan, base: &str, block: &mut FeatureBlock) {
    for pair in plan.forward_pairs.get(base).into_iter().flatten() {
        let mut lookup = Lookup::new(format!("calt_fwd_pair_{}", pair.variant));
        lookup.push(format!(
            "sub {}' [{}] by {}",
            base,
            join(&pair.neighbours),
            pair.variant
        ));
        block.add_lookup(lookup);
    }
    let Some(variants) = plan.forward.get(base) else {
        return;
    };
    let mut lookup = Lookup::new(format!("calt_fwd_{}", base));
    for (y, variant) in variants.iter().rev() {
        if !plan.entry_classes.contains_key(y) {
            continue;
        }
        let excluded = plan.exclusions.get(base).and_then(|e| e.get(y));
        for following in excluded.into_iter().flatten() {
            lookup.push(format!("ignore sub {}' {}", base, following));
        }
        lookup.push(format!(
            "sub {}' @entry_y{} by {}",
            base,
            height_label(*y),
            variant
        ));
    }
    block.add_lookup(lookup);
}

fn emit_backward(plan: &Plan, base: &str, block: &mut FeatureBlock) {
    for pair in plan.backward_pairs.get(base).into_iter().flatten() {
        let mut lookup = Lookup::new(format!("calt_pair_{}", pair.variant));
        lookup.push(format!(
            "sub [{}] {}' by {}",
            join(&pair.neighbours),
            base,
            pair.variant
        ));
        block.add_lookup(lookup);
    }
    let Some(variants) = plan.backward.get(base) else {
        return;
    };
    let mut lookup = Lookup::new(format!("calt_{}", base));
    for (y, variant) in variants {
        if plan.exit_classes.contains_key(y) {
            lookup.push(format!(
                "sub @exit_y{} {}' by {}",
                height_label(*y),
                base,
                variant
            ));
        }
    }
    block.add_lookup(lookup);
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Generate the contextual alternates which select cursive variants.
///
/// Returns `Ok(None)` if the font has no entry or exit variants, and an
/// error if the backward substitutions depend on each other in a cycle.
pub fn generate_calt(set: &ResolvedGlyphSet) -> Result<Option<FeatureBlock>, PixelfontError> {
    let plan = Plan::new(set);
    if plan.is_empty() {
        return Ok(None);
    }
    let backward_order = plan.backward_order(set)?;
    log::debug!("Backward calt order: {}", backward_order.join(", "));

    let mut block = FeatureBlock::new("calt");
    let backward_ys: BTreeSet<i32> = plan.backward.values().flat_map(|v| v.keys().copied()).collect();
    for y in backward_ys {
        if let Some(members) = plan.exit_classes.get(&y) {
            block.add_class(&format!("exit_y{}", height_label(y)), members.iter().copied());
        }
    }
    let forward_ys: BTreeSet<i32> = plan.forward.values().flat_map(|v| v.keys().copied()).collect();
    for y in forward_ys {
        if let Some(members) = plan.entry_classes.get(&y) {
            block.add_class(&format!("entry_y{}", height_label(y)), members.iter().copied());
        }
    }

    zwnj_lookup(set, &mut block);

    let all_forward: BTreeSet<&str> = plan
        .forward
        .keys()
        .chain(plan.forward_pairs.keys())
        .copied()
        .collect();
    // Forward-only bases go first so they can change an exit before the
    // following glyph commits to an entry variant.
    for base in all_forward.iter().filter(|base| {
        !plan.backward.contains_key(*base) && !plan.backward_pairs.contains_key(*base)
    }) {
        emit_forward(&plan, base, &mut block);
    }

    let pair_only = plan
        .backward_pairs
        .keys()
        .filter(|base| !plan.backward.contains_key(*base))
        .copied();
    for base in backward_order.into_iter().chain(pair_only) {
        emit_backward(&plan, base, &mut block);
        if all_forward.contains(base) {
            emit_forward(&plan, base, &mut block);
        }
    }

    if block.is_empty() {
        return Ok(None);
    }
    Ok(Some(block))
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

    const CHAIN: &str = r#"
glyphs:
  uni200C:
    advance_width: 0
  a:
    cursive_entry: [0, 0]
    cursive_exit: [3, 0]
  a.entry-high:
    cursive_entry: [0, 2]
    cursive_exit: [3, 0]
  b:
    cursive_entry: [0, 0]
    cursive_exit: [3, 0]
  b.entry-high:
    cursive_entry: [0, 2]
    cursive_exit: [3, 2]
  c:
    cursive_exit: [3, 2]
  d:
    cursive_entry: [0, 0]
  d.exit-high:
    cursive_exit: [3, 2]
"#;

    fn lookup_names(block: &FeatureBlock) -> Vec<&str> {
        block.lookups().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn test_introduced_exit_orders_lookups() {
        let (_, set) = resolve(CHAIN, FontVariant::Senior);
        let block = generate_calt(&set).unwrap().unwrap();
        // b's variant introduces exit 2, which a reacts to
        assert_eq!(
            lookup_names(&block),
            vec!["calt_zwnj", "calt_fwd_d", "calt_b", "calt_a"]
        );
        assert_eq!(
            block.lookup("calt_a").unwrap().rules,
            vec!["sub @exit_y2 a' by a.entry-high"]
        );
        assert_eq!(
            block.lookup("calt_fwd_d").unwrap().rules,
            vec!["sub d' @entry_y2 by d.exit-high"]
        );
    }

    #[test]
    fn test_classes() {
        let (_, set) = resolve(CHAIN, FontVariant::Senior);
        let block = generate_calt(&set).unwrap().unwrap();
        let classes: Vec<(&str, &str)> = block
            .classes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            classes,
            vec![
                ("exit_y2", "b.entry-high c d.exit-high"),
                ("entry_y2", "a a.entry-high b b.entry-high"),
                ("qs_has_entry", "a b d"),
                ("qs_noentry", "a.noentry b.noentry d.noentry"),
            ]
        );
        assert_eq!(
            block.lookup("calt_zwnj").unwrap().rules,
            vec!["sub uni200C @qs_has_entry' by @qs_noentry"]
        );
    }

    #[test]
    fn test_cycle_is_an_error() {
        let cyclic = CHAIN.replace(
            "  a.entry-high:\n    cursive_entry: [0, 2]\n    cursive_exit: [3, 0]",
            "  a.entry-high:\n    cursive_entry: [0, 2]\n    cursive_exit: [3, 2]",
        );
        let (_, set) = resolve(&cyclic, FontVariant::Senior);
        let err = generate_calt(&set).unwrap_err();
        assert!(matches!(
            err,
            PixelfontError::CyclicCaltDependency { ref glyph } if glyph == "a"
        ));
    }

    #[test]
    fn test_output_is_deterministic() {
        let (_, set) = resolve(CHAIN, FontVariant::Senior);
        let first = generate_calt(&set).unwrap();
        let second = generate_calt(&set).unwrap();
        assert_eq!(first, second);
    }

    const PAIRS: &str = r#"
glyphs:
  p:
    cursive_entry: [0, 0]
    cursive_exit: [3, 0]
  p.entry-high:
    cursive_entry: [0, 2]
    cursive_exit: [3, 0]
    calt_after: [q.prop]
  q.prop:
    cursive_exit: [3, 2]
  r:
    cursive_exit: [3, 0]
  r.half:
    cursive_exit: [3, 2]
    calt_not_before: [p]
  s: {}
  s.exit-low:
    cursive_exit: [3, 0]
    calt_before: [p]
"#;

    #[test]
    fn test_pair_overrides_and_exclusions() {
        let (_, set) = resolve(PAIRS, FontVariant::Senior);
        let block = generate_calt(&set).unwrap().unwrap();
        assert_eq!(
            lookup_names(&block),
            vec![
                "calt_fwd_r",
                "calt_fwd_pair_s_exit_low",
                "calt_pair_p_entry_high"
            ]
        );
        assert_eq!(
            block.lookup("calt_fwd_r").unwrap().rules,
            vec!["ignore sub r' p", "sub r' @entry_y2 by r.half"]
        );
        assert_eq!(
            block.lookup("calt_fwd_pair_s_exit_low").unwrap().rules,
            vec!["sub s' [p] by s.exit-low"]
        );
        assert_eq!(
            block.lookup("calt_pair_p_entry_high").unwrap().rules,
            vec!["sub [q] p' by p.entry-high"]
        );
    }

    const COMPANION: &str = r#"
glyphs:
  a:
    cursive_entry: [0, 0]
    cursive_exit: [3, 0]
  a.entry-high:
    cursive_entry: [0, 2]
    cursive_exit: [3, 0]
  a.exit-high:
    cursive_exit: [3, 2]
  z:
    cursive_entry: [0, 0]
    cursive_exit: [3, 0]
  z.exit-high:
    cursive_exit: [3, 2]
"#;

    #[test]
    fn test_forward_companion_follows_backward_lookup() {
        let (_, set) = resolve(COMPANION, FontVariant::Senior);
        let block = generate_calt(&set).unwrap().unwrap();
        assert_eq!(
            lookup_names(&block),
            vec!["calt_fwd_z", "calt_a", "calt_fwd_a"]
        );
        assert_eq!(
            block.lookup("calt_a").unwrap().rules,
            vec!["sub @exit_y2 a' by a.entry-high"]
        );
        assert_eq!(
            block.lookup("calt_fwd_a").unwrap().rules,
            vec!["sub a' @entry_y2 by a.exit-high"]
        );
    }

    #[test]
    fn test_no_variants() {
        let (_, set) = resolve(
            "glyphs:\n  a:\n    cursive_entry: [0, 0]\n    cursive_exit: [3, 0]\n",
            FontVariant::Senior,
        );
        assert!(generate_calt(&set).unwrap().is_none());
    }

    #[test]
    fn test_parses() {
        for body in [CHAIN, PAIRS, COMPANION] {
            let (_, set) = resolve(body, FontVariant::Senior);
            let mut features = Features::default();
            features.push(generate_calt(&set).unwrap());
            assert_parses(&features.to_fea(), &set);
        }
    }
}
