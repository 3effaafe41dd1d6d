use std::fmt;

/// The fonts built from one glyph database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum FontVariant {
    /// Fixed-width font without layout features
    Mono,
    /// Proportional font with kerning and mark positioning
    Junior,
    /// Proportional font which also joins cursively
    Senior,
}

impl FontVariant {
    pub const ALL: [FontVariant; 3] = [FontVariant::Mono, FontVariant::Junior, FontVariant::Senior];

    pub fn is_proportional(&self) -> bool {
        !matches!(self, FontVariant::Mono)
    }

    pub fn is_senior(&self) -> bool {
        matches!(self, FontVariant::Senior)
    }

    /// Appended to the family name from the metadata
    pub fn family_suffix(&self) -> &'static str {
        match self {
            FontVariant::Mono => " Mono",
            FontVariant::Junior => " Sans Junior",
            FontVariant::Senior => " Sans Senior",
        }
    }

    /// Output file name, without extension
    pub fn file_stem(&self) -> &'static str {
        match self {
            FontVariant::Mono => "AbbotsMortonSpaceportMono",
            FontVariant::Junior => "AbbotsMortonSpaceportSansJunior",
            FontVariant::Senior => "AbbotsMortonSpaceportSansSenior",
        }
    }
}

impl fmt::Display for FontVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FontVariant::Mono => "mono",
            FontVariant::Junior => "junior",
            FontVariant::Senior => "senior",
        })
    }
}
