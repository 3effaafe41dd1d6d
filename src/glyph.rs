use crate::bitmap::Bitmap;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use smol_str::SmolStr;
use std::{
    borrow::Borrow,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

/// A variant marker carried in a glyph name after the base name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariantTag {
    /// `.prop`: proportional-width alternate of a monospace glyph
    Prop,
    /// `.entry-*`: contextual form selected by the preceding glyph's exit
    Entry(SmolStr),
    /// `.exit-*`: contextual form selected by the following glyph's entry
    Exit(SmolStr),
    /// `.half`: contextual short form
    Half,
    /// `.noentry`: chain-breaking form without an entry anchor
    NoEntry,
    /// `.unused*`: a stub which is never compiled
    Unused,
    Other(SmolStr),
}

impl VariantTag {
    fn parse(segment: &str) -> Self {
        if segment == "prop" {
            VariantTag::Prop
        } else if let Some(rest) = segment.strip_prefix("entry-") {
            VariantTag::Entry(rest.into())
        } else if let Some(rest) = segment.strip_prefix("exit-") {
            VariantTag::Exit(rest.into())
        } else if segment == "half" {
            VariantTag::Half
        } else if segment == "noentry" {
            VariantTag::NoEntry
        } else if segment.starts_with("unused") {
            VariantTag::Unused
        } else {
            VariantTag::Other(segment.into())
        }
    }

    fn is_contextual(&self) -> bool {
        matches!(
            self,
            VariantTag::Entry(_) | VariantTag::Exit(_) | VariantTag::Half
        )
    }
}

/// A glyph name split into its base name and variant tags.
///
/// `qsPea.prop.entry-xheight` has base `qsPea` and tags
/// `[Prop, Entry("xheight")]`. Names beginning with a dot (`.notdef`) are
/// their own base. Equality, hashing and ordering use the full name only.
#[derive(Clone, Deserialize)]
#[serde(from = "SmolStr")]
pub struct GlyphName {
    name: SmolStr,
    base: SmolStr,
    tags: Vec<VariantTag>,
}

impl GlyphName {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        let name: SmolStr = name.into();
        if name.starts_with('.') {
            return GlyphName {
                base: name.clone(),
                name,
                tags: vec![],
            };
        }
        let mut segments = name.split('.');
        let base: SmolStr = segments.next().unwrap_or_default().into();
        let tags = segments.map(VariantTag::parse).collect();
        GlyphName { name, base, tags }
    }

    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }

    pub fn base(&self) -> &str {
        self.base.as_str()
    }

    pub fn tags(&self) -> &[VariantTag] {
        &self.tags
    }

    pub fn is_plain(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn is_prop(&self) -> bool {
        self.tags.contains(&VariantTag::Prop)
    }

    pub fn is_entry_variant(&self) -> bool {
        self.tags.iter().any(|t| matches!(t, VariantTag::Entry(_)))
    }

    pub fn is_exit_variant(&self) -> bool {
        self.tags.iter().any(|t| matches!(t, VariantTag::Exit(_)))
    }

    /// Entry, exit and half forms
    pub fn is_contextual(&self) -> bool {
        self.tags.iter().any(VariantTag::is_contextual)
    }

    pub fn is_noentry(&self) -> bool {
        self.tags.last() == Some(&VariantTag::NoEntry)
    }

    pub fn is_unused(&self) -> bool {
        self.tags.contains(&VariantTag::Unused)
    }

    /// Ligature components, if this name joins several glyph names with `_`
    pub fn ligature_components(&self) -> Option<Vec<&str>> {
        if self.name.contains('_') {
            Some(self.name.split('_').collect())
        } else {
            None
        }
    }

    /// The same name with every `prop` tag removed
    pub fn without_prop(&self) -> GlyphName {
        if !self.is_prop() {
            return self.clone();
        }
        let mut name = String::from(self.base.as_str());
        for (segment, tag) in self.name.split('.').skip(1).zip(self.tags.iter()) {
            if *tag != VariantTag::Prop {
                name.push('.');
                name.push_str(segment);
            }
        }
        GlyphName::new(name)
    }

    /// The same name with another `.`-separated segment appended
    pub fn with_suffix(&self, suffix: &str) -> GlyphName {
        GlyphName::new(format!("{}.{}", self.name, suffix))
    }
}

impl From<SmolStr> for GlyphName {
    fn from(name: SmolStr) -> Self {
        GlyphName::new(name)
    }
}

impl From<&str> for GlyphName {
    fn from(name: &str) -> Self {
        GlyphName::new(name)
    }
}

impl PartialEq for GlyphName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for GlyphName {}

impl Hash for GlyphName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.as_str().hash(state)
    }
}

impl PartialOrd for GlyphName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GlyphName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Borrow<str> for GlyphName {
    fn borrow(&self) -> &str {
        self.name.as_str()
    }
}

impl fmt::Display for GlyphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for GlyphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.name)
    }
}

/// A cursive attachment point, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursiveAnchor {
    pub x: i32,
    pub y: i32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnchors {
    One([i32; 2]),
    Many(Vec<[i32; 2]>),
}

/// Accepts `[x, y]` or `[[x, y], ...]`
fn deserialize_anchors<'de, D>(deserializer: D) -> Result<Vec<CursiveAnchor>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawAnchors>::deserialize(deserializer)?;
    let pairs = match raw {
        None => vec![],
        Some(RawAnchors::One(pair)) => vec![pair],
        Some(RawAnchors::Many(pairs)) => pairs,
    };
    Ok(pairs
        .into_iter()
        .map(|[x, y]| CursiveAnchor { x, y })
        .collect())
}

/// Everything about a glyph other than where its pixels come from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlyphProperties {
    /// Explicit advance in pixels
    pub advance_width: Option<f64>,
    #[serde(default)]
    pub is_mark: bool,
    pub top_mark_y: Option<i32>,
    pub bottom_mark_y: Option<i32>,
    pub top_mark_x: Option<i32>,
    pub bottom_mark_x: Option<i32>,
    #[serde(default)]
    pub base_x_adjust: IndexMap<SmolStr, i32>,
    #[serde(default)]
    pub base_y_adjust: IndexMap<SmolStr, i32>,
    /// Overrides `base_x_adjust` in mark positioning only
    #[serde(default)]
    pub mark_base_x_adjust: IndexMap<SmolStr, i32>,
    /// Overrides `base_y_adjust` in mark positioning only
    #[serde(default)]
    pub mark_base_y_adjust: IndexMap<SmolStr, i32>,
    /// Accent family shared by a combining mark and its spacing accent
    pub accent: Option<SmolStr>,
    #[serde(default, deserialize_with = "deserialize_anchors")]
    pub cursive_entry: Vec<CursiveAnchor>,
    #[serde(default, deserialize_with = "deserialize_anchors")]
    pub cursive_exit: Vec<CursiveAnchor>,
    #[serde(default)]
    pub kerning: Vec<SmolStr>,
    #[serde(default)]
    pub calt_after: Vec<SmolStr>,
    #[serde(default)]
    pub calt_before: Vec<SmolStr>,
    #[serde(default)]
    pub calt_not_before: Vec<SmolStr>,
    /// For synthesized `.noentry` glyphs, the glyph they stand in for
    #[serde(skip)]
    pub noentry_for: Option<GlyphName>,
}

impl GlyphProperties {
    /// Per-base x adjustments for mark positioning, with mark-only overrides applied
    pub fn mark_x_adjust(&self) -> IndexMap<SmolStr, i32> {
        merge_adjustments(&self.base_x_adjust, &self.mark_base_x_adjust)
    }

    /// Per-base y adjustments for mark positioning, with mark-only overrides applied
    pub fn mark_y_adjust(&self) -> IndexMap<SmolStr, i32> {
        merge_adjustments(&self.base_y_adjust, &self.mark_base_y_adjust)
    }

    pub fn entry_ys(&self) -> impl Iterator<Item = i32> + '_ {
        self.cursive_entry.iter().map(|a| a.y)
    }

    pub fn exit_ys(&self) -> impl Iterator<Item = i32> + '_ {
        self.cursive_exit.iter().map(|a| a.y)
    }
}

fn merge_adjustments(
    generic: &IndexMap<SmolStr, i32>,
    overrides: &IndexMap<SmolStr, i32>,
) -> IndexMap<SmolStr, i32> {
    let mut merged = generic.clone();
    for (base, value) in overrides {
        merged.insert(base.clone(), *value);
    }
    merged
}

/// A composite glyph: a base plus optional accents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSpec {
    pub base: SmolStr,
    pub top: Option<SmolStr>,
    pub bottom: Option<SmolStr>,
}

/// Where a glyph's pixels come from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GlyphSource {
    #[default]
    Empty,
    Bitmap(Bitmap),
    Composite(CompositeSpec),
}

#[derive(Deserialize)]
struct RawGlyphDefinition {
    bitmap: Option<Bitmap>,
    #[serde(default)]
    y_offset: i32,
    base: Option<SmolStr>,
    top: Option<SmolStr>,
    bottom: Option<SmolStr>,
    #[serde(flatten)]
    properties: GlyphProperties,
}

/// A glyph as written in the glyph data
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawGlyphDefinition")]
pub struct GlyphDefinition {
    pub source: GlyphSource,
    pub y_offset: i32,
    pub properties: GlyphProperties,
}

impl From<RawGlyphDefinition> for GlyphDefinition {
    fn from(raw: RawGlyphDefinition) -> Self {
        let source = match (raw.bitmap, raw.base) {
            (Some(bitmap), _) if !bitmap.is_empty() => GlyphSource::Bitmap(bitmap),
            (_, Some(base)) => GlyphSource::Composite(CompositeSpec {
                base,
                top: raw.top,
                bottom: raw.bottom,
            }),
            _ => GlyphSource::Empty,
        };
        GlyphDefinition {
            source,
            y_offset: raw.y_offset,
            properties: raw.properties,
        }
    }
}

impl GlyphDefinition {
    pub fn bitmap(&self) -> Option<&Bitmap> {
        match &self.source {
            GlyphSource::Bitmap(bitmap) => Some(bitmap),
            _ => None,
        }
    }
}

/// A glyph after composite resolution: its pixels are known.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGlyph {
    pub bitmap: Option<Bitmap>,
    pub y_offset: i32,
    pub properties: GlyphProperties,
}

impl ResolvedGlyph {
    pub fn height(&self) -> usize {
        self.bitmap.as_ref().map(Bitmap::height).unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.bitmap.as_ref().map(Bitmap::width).unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("qsPea", "qsPea", vec![])]
    #[case("qsPea.prop", "qsPea", vec![VariantTag::Prop])]
    #[case(
        "qsTea.entry-xheight.half",
        "qsTea",
        vec![VariantTag::Entry("xheight".into()), VariantTag::Half]
    )]
    #[case("a.unused2", "a", vec![VariantTag::Unused])]
    #[case(".notdef", ".notdef", vec![])]
    #[case("f_i.ss01", "f_i", vec![VariantTag::Other("ss01".into())])]
    fn test_parse_name(#[case] name: &str, #[case] base: &str, #[case] tags: Vec<VariantTag>) {
        let parsed = GlyphName::new(name);
        assert_eq!(parsed.as_str(), name);
        assert_eq!(parsed.base(), base);
        assert_eq!(parsed.tags(), tags.as_slice());
    }

    #[test]
    fn test_name_predicates() {
        let name = GlyphName::new("qsTea.exit-baseline");
        assert!(name.is_contextual());
        assert!(name.is_exit_variant());
        assert!(!name.is_entry_variant());
        assert!(GlyphName::new("qsTea.noentry").is_noentry());
        assert!(GlyphName::new("qsTea.half").is_contextual());
        assert!(!GlyphName::new("qsTea.prop").is_contextual());
    }

    #[test]
    fn test_without_prop() {
        assert_eq!(GlyphName::new("qsPea.prop").without_prop().as_str(), "qsPea");
        assert_eq!(
            GlyphName::new("qsPea.prop.half").without_prop().as_str(),
            "qsPea.half"
        );
        assert_eq!(GlyphName::new("qsPea").without_prop().as_str(), "qsPea");
    }

    #[test]
    fn test_ordering_is_by_name() {
        let mut names = vec![
            GlyphName::new("b"),
            GlyphName::new("B"),
            GlyphName::new("a.prop"),
            GlyphName::new("a"),
        ];
        names.sort();
        let sorted: Vec<&str> = names.iter().map(GlyphName::as_str).collect();
        assert_eq!(sorted, vec!["B", "a", "a.prop", "b"]);
    }

    #[test]
    fn test_definition_kinds() {
        let yaml = r##"
bitmapped:
  bitmap: ["#.", ".#"]
  y_offset: -1
composite:
  base: a
  top: acute
empty:
  advance_width: 3
"##;
        let defs: IndexMap<GlyphName, GlyphDefinition> = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(defs["bitmapped"].source, GlyphSource::Bitmap(_)));
        assert_eq!(defs["bitmapped"].y_offset, -1);
        assert_eq!(
            defs["composite"].source,
            GlyphSource::Composite(CompositeSpec {
                base: "a".into(),
                top: Some("acute".into()),
                bottom: None,
            })
        );
        assert_eq!(defs["empty"].source, GlyphSource::Empty);
        assert_eq!(defs["empty"].properties.advance_width, Some(3.0));
    }

    #[test]
    fn test_cursive_anchor_forms() {
        let yaml = r#"
single:
  cursive_entry: [0, 5]
multiple:
  cursive_exit: [[4, 5], [4, 8]]
"#;
        let defs: IndexMap<GlyphName, GlyphDefinition> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            defs["single"].properties.cursive_entry,
            vec![CursiveAnchor { x: 0, y: 5 }]
        );
        assert_eq!(
            defs["multiple"].properties.exit_ys().collect::<Vec<_>>(),
            vec![5, 8]
        );
    }

    #[test]
    fn test_mark_adjustments_merge() {
        let yaml = r#"
base_x_adjust: {a: 1, e: -1}
mark_base_x_adjust: {e: 2}
"#;
        let props: GlyphProperties = serde_yaml::from_str(yaml).unwrap();
        let merged = props.mark_x_adjust();
        assert_eq!(merged.get("a"), Some(&1));
        assert_eq!(merged.get("e"), Some(&2));
        assert!(props.mark_y_adjust().is_empty());
    }
}
