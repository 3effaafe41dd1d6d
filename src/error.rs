use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixelfontError {
    #[error("Input path not found: {path:?}")]
    InputNotFound { path: PathBuf },

    #[error("IO Error: {0}")]
    IO(#[from] io::Error),

    #[error("Error parsing YAML file {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("No metadata found in {path:?}")]
    MissingMetadata { path: PathBuf },

    #[error("Composite glyph '{glyph}' references base '{base}' which doesn't exist")]
    MissingBase { glyph: String, base: String },

    #[error("Composite glyph '{glyph}' references {position} accent '{accent}' which doesn't exist")]
    MissingAccent {
        glyph: String,
        position: &'static str,
        accent: String,
    },

    #[error("Composite glyph '{glyph}' needs {position}_mark_y on base '{base}'")]
    MissingMarkAnchor {
        glyph: String,
        base: String,
        position: &'static str,
    },

    #[error("Composite glyph '{glyph}' places accent '{accent}' outside the canvas (x adjust {x_adjust})")]
    AccentOutOfBounds {
        glyph: String,
        accent: String,
        x_adjust: i32,
    },

    #[error("Glyph '{glyph}' has inconsistent row widths: {widths:?}")]
    InconsistentRowWidths { glyph: String, widths: Vec<usize> },

    #[error("Glyph '{glyph}' row {row} has width {width}, expected {expected}")]
    WrongRowWidth {
        glyph: String,
        row: usize,
        width: usize,
        expected: usize,
    },

    #[error("Glyph '{glyph}' has {rows} rows, expected {expected}")]
    WrongRowCount {
        glyph: String,
        rows: usize,
        expected: String,
    },

    #[error("Circular dependency in calt lookups involving {glyph}")]
    CyclicCaltDependency { glyph: String },

    #[error("Glyph '{glyph}' has no usable outline: {reason}")]
    Outline { glyph: String, reason: String },

    #[error("Glyph '{glyph}' has a coordinate which does not fit in a font: {value}")]
    CoordinateOverflow { glyph: String, value: i64 },

    #[error("Conflicting character map entry: {0}")]
    Cmap(#[from] write_fonts::tables::cmap::CmapConflict),

    #[error("Error writing table: {0}")]
    Table(#[from] write_fonts::error::Error),

    #[error("Error building font: {0}")]
    Builder(#[from] write_fonts::BuilderError),

    #[error("Error reading compiled font data: {0}")]
    Read(#[from] write_fonts::read::ReadError),

    #[error("Error compiling features: {0}")]
    FeatureCompilation(String),
}
