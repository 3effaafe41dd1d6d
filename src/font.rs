use crate::{
    error::PixelfontError,
    glyph::{GlyphDefinition, GlyphName},
};
use indexmap::IndexMap;
use serde::Deserialize;
use smol_str::SmolStr;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// A font revision number, as written in the glyph data
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize)]
pub struct FontVersion(pub f64);

impl FontVersion {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for FontVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Font-wide parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    pub font_name: String,
    pub version: FontVersion,
    pub units_per_em: u16,
    /// Size of one bitmap cell in font units
    pub pixel_size: i32,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    pub x_height: i16,
    pub copyright: Option<String>,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub sample_text: Option<String>,
    pub vendor_url: Option<String>,
    pub description: Option<String>,
}

/// A kerning rule for one group tag
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KerningDefinition {
    pub right: Vec<SmolStr>,
    /// Adjustment in pixels
    pub value: i32,
    /// Explicit left side; otherwise every glyph not tagged with the group
    pub left: Option<Vec<SmolStr>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGlyphData {
    metadata: Option<Metadata>,
    #[serde(default)]
    glyphs: IndexMap<GlyphName, Option<GlyphDefinition>>,
    #[serde(default)]
    kerning: IndexMap<SmolStr, KerningDefinition>,
}

/// The complete glyph database. It is never modified once loaded; each font
/// variant derives its own glyph set from it.
#[derive(Debug, Clone, Default)]
pub struct GlyphData {
    pub metadata: Metadata,
    pub glyphs: IndexMap<GlyphName, GlyphDefinition>,
    pub kerning: IndexMap<SmolStr, KerningDefinition>,
}

impl GlyphData {
    /// Load glyph data from a YAML file, or from every `*.yaml` file in a
    /// directory merged in filename order.
    ///
    /// When merging, later files replace earlier glyph and kerning entries
    /// of the same name in place, and the last `metadata` block wins. A
    /// `null` glyph entry removes the glyph.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PixelfontError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PixelfontError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        log::info!("Loading glyph data from {}", path.display());
        let files = if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "yaml"))
                .collect();
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut metadata = None;
        let mut glyphs = IndexMap::new();
        let mut kerning = IndexMap::new();
        for file in files {
            log::debug!("Reading {}", file.display());
            let text = std::fs::read_to_string(&file)?;
            let Some(raw) = serde_yaml::from_str::<Option<RawGlyphData>>(&text)
                .map_err(|source| PixelfontError::Yaml {
                    path: file.clone(),
                    source,
                })?
            else {
                continue;
            };
            if raw.metadata.is_some() {
                metadata = raw.metadata;
            }
            for (name, definition) in raw.glyphs {
                match definition {
                    Some(definition) => {
                        glyphs.insert(name, definition);
                    }
                    None => {
                        glyphs.shift_remove(&name);
                    }
                }
            }
            kerning.extend(raw.kerning);
        }

        let metadata = metadata.ok_or_else(|| PixelfontError::MissingMetadata {
            path: path.to_path_buf(),
        })?;
        log::info!(
            "Loaded {} glyphs and {} kerning groups",
            glyphs.len(),
            kerning.len()
        );
        Ok(GlyphData {
            metadata,
            glyphs,
            kerning,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, PixelfontError> {
        let raw: RawGlyphData =
            serde_yaml::from_str(text).map_err(|source| PixelfontError::Yaml {
                path: PathBuf::from("<string>"),
                source,
            })?;
        let metadata = raw.metadata.ok_or_else(|| PixelfontError::MissingMetadata {
            path: PathBuf::from("<string>"),
        })?;
        Ok(GlyphData {
            metadata,
            glyphs: raw
                .glyphs
                .into_iter()
                .filter_map(|(name, definition)| definition.map(|d| (name, d)))
                .collect(),
            kerning: raw.kerning,
        })
    }
}
