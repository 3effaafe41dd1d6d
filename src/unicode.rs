//! Code points for glyph names.
use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

static POSTSCRIPT_NAMES: LazyLock<HashMap<String, u32>> = LazyLock::new(|| {
    serde_yaml::from_str(include_str!("../resources/postscript_glyph_names.yaml")).unwrap_or_else(
        |e| {
            log::error!("Could not parse PostScript glyph name table: {}", e);
            HashMap::new()
        },
    )
});

static UNI_NAME: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // Safe because the regex is valid
    Regex::new(r"^uni([0-9A-Fa-f]{4})$").unwrap()
});
static U_NAME: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // Safe because the regex is valid
    Regex::new(r"^u([0-9A-Fa-f]{5,6})$").unwrap()
});

/// The code point a glyph name stands for, if any.
///
/// Single-character names map to that character; `uniXXXX` and
/// `uXXXXX`/`uXXXXXX` (beyond the BMP) decode their hex digits; anything
/// else is looked up in the PostScript glyph name table.
pub fn codepoint_for(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(c as u32);
    }
    if let Some(caps) = UNI_NAME.captures(name) {
        return u32::from_str_radix(&caps[1], 16).ok();
    }
    if let Some(caps) = U_NAME.captures(name) {
        return u32::from_str_radix(&caps[1], 16)
            .ok()
            .filter(|cp| *cp > 0xFFFF);
    }
    POSTSCRIPT_NAMES.get(name).copied()
}
