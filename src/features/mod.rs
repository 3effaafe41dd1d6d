//! OpenType feature source generation.
//!
//! Every generator inspects a [`ResolvedGlyphSet`] and returns a
//! [`FeatureBlock`], or `None` when it has nothing to contribute.
//! [`Features`] gathers the blocks and renders them as a feature file.
mod calt;
mod curs;
mod kern;
mod liga;
mod mark;

pub use calt::generate_calt;
pub use curs::generate_curs;
pub use kern::generate_kern;
pub use liga::generate_liga;
pub use mark::generate_mark;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{font::GlyphData, glyphset::ResolvedGlyphSet, FontVariant, PixelfontError};

/// A named lookup and its rules, without trailing semicolons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub name: String,
    pub rules: Vec<String>,
}

impl Lookup {
    pub fn new(name: impl AsRef<str>) -> Self {
        Lookup {
            name: sanitize(name.as_ref()),
            rules: vec![],
        }
    }

    pub fn push(&mut self, rule: impl Into<String>) {
        self.rules.push(rule.into());
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A statement directly inside a feature block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Rule(String),
    Lookup(Lookup),
}

/// One feature and the top-level definitions it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureBlock {
    pub tag: SmolStr,
    /// Glyph classes, without the leading `@`, to space-separated members
    pub classes: IndexMap<String, String>,
    /// `markClass` definitions
    pub mark_classes: Vec<String>,
    pub statements: Vec<Statement>,
}

impl FeatureBlock {
    pub fn new(tag: &str) -> Self {
        FeatureBlock {
            tag: tag.into(),
            classes: IndexMap::new(),
            mark_classes: vec![],
            statements: vec![],
        }
    }

    pub fn add_class<'a>(&mut self, name: &str, members: impl IntoIterator<Item = &'a str>) {
        self.classes
            .insert(sanitize(name), members.into_iter().collect::<Vec<_>>().join(" "));
    }

    /// Append a lookup, unless it has no rules
    pub fn add_lookup(&mut self, lookup: Lookup) {
        if lookup.is_empty() {
            log::debug!("Skipping empty lookup {}", lookup.name);
            return;
        }
        self.statements.push(Statement::Lookup(lookup));
    }

    pub fn add_rule(&mut self, rule: impl Into<String>) {
        self.statements.push(Statement::Rule(rule.into()));
    }

    pub fn lookups(&self) -> impl Iterator<Item = &Lookup> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Lookup(lookup) => Some(lookup),
            Statement::Rule(_) => None,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<&Lookup> {
        self.lookups().find(|l| l.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    fn body(&self) -> String {
        let mut parts = vec![];
        for statement in &self.statements {
            match statement {
                Statement::Rule(rule) => parts.push(format!("    {};", rule)),
                Statement::Lookup(lookup) => {
                    let mut text = format!("    lookup {} {{\n", lookup.name);
                    for rule in &lookup.rules {
                        text.push_str(&format!("        {};\n", rule));
                    }
                    text.push_str(&format!("    }} {};", lookup.name));
                    parts.push(text);
                }
            }
        }
        parts.join("\n")
    }
}

/// The feature blocks of one font, in emission order
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub blocks: Vec<FeatureBlock>,
}

impl Features {
    pub fn push(&mut self, block: Option<FeatureBlock>) {
        if let Some(block) = block.filter(|b| !b.is_empty()) {
            log::debug!("Generated {} feature", block.tag);
            self.blocks.push(block);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.tag.as_str()).collect()
    }

    /// Render the feature file: glyph classes, then mark classes, then the
    /// feature blocks.
    pub fn to_fea(&self) -> String {
        let mut sections = vec![];
        let classes: Vec<String> = self
            .blocks
            .iter()
            .flat_map(|b| b.classes.iter())
            .map(|(name, members)| format!("@{} = [{}];", name, members))
            .collect();
        if !classes.is_empty() {
            sections.push(classes.join("\n"));
        }
        let mark_classes: Vec<&str> = self
            .blocks
            .iter()
            .flat_map(|b| b.mark_classes.iter().map(String::as_str))
            .collect();
        if !mark_classes.is_empty() {
            sections.push(mark_classes.join("\n"));
        }
        for block in &self.blocks {
            sections.push(format!(
                "feature {} {{\n{}\n}} {};",
                block.tag,
                block.body(),
                block.tag
            ));
        }
        let mut fea = sections.join("\n\n");
        fea.push('\n');
        fea
    }
}

/// Generate every feature `set`'s variant carries.
///
/// The monospace font has no features; the junior font gets kerning and
/// mark positioning; the senior font additionally gets ligatures, cursive
/// attachment and contextual alternates.
pub fn generate_features(
    set: &ResolvedGlyphSet,
    data: &GlyphData,
) -> Result<Features, PixelfontError> {
    let pixel_size = data.metadata.pixel_size;
    let mut features = Features::default();
    if set.variant == FontVariant::Mono {
        return Ok(features);
    }
    features.push(generate_kern(set, &data.kerning, pixel_size));
    features.push(generate_mark(set, pixel_size));
    if set.variant.is_senior() {
        features.push(generate_liga(set));
        features.push(generate_curs(set, pixel_size));
        features.push(generate_calt(set)?);
    }
    log::info!(
        "Generated features for {}: {}",
        set.variant,
        features.tags().join(", ")
    );
    Ok(features)
}

/// Make a string usable as a lookup or class name
pub(crate) fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// A cursive height as it appears in a name: `5`, or `n3` for `-3`
pub(crate) fn height_label(y: i32) -> String {
    if y < 0 {
        format!("n{}", y.unsigned_abs())
    } else {
        y.to_string()
    }
}

/// `<anchor x y>` in font units, or `<anchor NULL>`
pub(crate) fn anchor(point: Option<(i32, i32)>) -> String {
    match point {
        Some((x, y)) => format!("<anchor {} {}>", x, y),
        None => "<anchor NULL>".to_string(),
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::test_support::*;
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("qsTea.entry-xheight", "qsTea_entry_xheight")]
    #[case("kern_T_after", "kern_T_after")]
    #[case("a.b-c", "a_b_c")]
    fn test_sanitize(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(sanitize(name), expected);
    }

    #[test]
    fn test_height_label() {
        assert_eq!(height_label(5), "5");
        assert_eq!(height_label(-3), "n3");
        assert_eq!(height_label(0), "0");
    }

    #[test]
    fn test_render() {
        let mut block = FeatureBlock::new("calt");
        block.add_class("exit_y5", ["a", "b"]);
        let mut lookup = Lookup::new("calt_a.alt");
        lookup.push("sub @exit_y5 a' by b");
        block.add_lookup(lookup);
        block.add_lookup(Lookup::new("calt_empty"));
        let mut liga = FeatureBlock::new("liga");
        liga.add_rule("sub a b by a_b");
        let features = Features {
            blocks: vec![block, liga],
        };
        assert_eq!(
            features.to_fea(),
            "@exit_y5 = [a b];\n\n\
             feature calt {\n    lookup calt_a_alt {\n        sub @exit_y5 a' by b;\n    } calt_a_alt;\n} calt;\n\n\
             feature liga {\n    sub a b by a_b;\n} liga;\n"
        );
    }

    #[test]
    fn test_variant_gating() {
        let body = r#"
glyphs:
  T:
    bitmap: ['###', '.#.']
    kerning: [T_after]
  comma:
    bitmap: ['#']
kerning:
  T_after:
    right: [comma]
    value: -1
"#;
        let (data, mono) = resolve(body, FontVariant::Mono);
        assert!(generate_features(&mono, &data).unwrap().is_empty());
        let (data, junior) = resolve(body, FontVariant::Junior);
        let features = generate_features(&junior, &data).unwrap();
        assert_eq!(features.tags(), vec!["kern"]);
        assert_parses(&features.to_fea(), &junior);
    }
}
