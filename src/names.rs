use chrono::Datelike;
use write_fonts::{
    tables::name::{Name, NameRecord},
    types::NameId,
};

use crate::{font::Metadata, FontVariant};

/// Windows platform, Unicode BMP encoding, US English
const PLATFORM_WINDOWS: u16 = 3;
const ENCODING_UNICODE_BMP: u16 = 1;
const LANGUAGE_EN_US: u16 = 0x409;

/// The strings of a font's `name` table
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Names {
    pub copyright: Option<String>,
    pub family_name: String,
    pub subfamily_name: String,
    pub unique_id: String,
    pub full_name: String,
    pub version: String,
    pub postscript_name: String,
    pub description: Option<String>,
    pub vendor_url: Option<String>,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub sample_text: Option<String>,
}

impl Names {
    pub fn new(metadata: &Metadata, variant: FontVariant) -> Self {
        Self::new_with_year(metadata, variant, chrono::Utc::now().year())
    }

    /// As [`Names::new`], with the copyright year given explicitly
    pub fn new_with_year(metadata: &Metadata, variant: FontVariant, year: i32) -> Self {
        let family_name = format!("{}{}", metadata.font_name, variant.family_suffix());
        let postscript_name = postscript_name(&family_name);
        Names {
            copyright: metadata
                .copyright
                .as_deref()
                .map(|c| c.replacen("© ", &format!("© {year} "), 1)),
            unique_id: format!("pixelfont:{family_name}.Regular"),
            full_name: format!("{family_name} Regular"),
            subfamily_name: "Regular".to_string(),
            version: format!("Version {}", metadata.version),
            postscript_name,
            family_name,
            description: metadata.description.clone(),
            vendor_url: metadata.vendor_url.clone(),
            license: metadata.license.clone(),
            license_url: metadata.license_url.clone(),
            sample_text: metadata.sample_text.clone(),
        }
    }

    pub fn get(&self, stringid: NameId) -> Option<&str> {
        match stringid {
            NameId::COPYRIGHT_NOTICE => self.copyright.as_deref(),
            NameId::FAMILY_NAME => Some(&self.family_name),
            NameId::SUBFAMILY_NAME => Some(&self.subfamily_name),
            NameId::UNIQUE_ID => Some(&self.unique_id),
            NameId::FULL_NAME => Some(&self.full_name),
            NameId::VERSION_STRING => Some(&self.version),
            NameId::POSTSCRIPT_NAME => Some(&self.postscript_name),
            NameId::DESCRIPTION => self.description.as_deref(),
            NameId::VENDOR_URL => self.vendor_url.as_deref(),
            NameId::LICENSE_DESCRIPTION => self.license.as_deref(),
            NameId::LICENSE_URL => self.license_url.as_deref(),
            NameId::SAMPLE_TEXT => self.sample_text.as_deref(),
            _ => None,
        }
    }

    /// Build the `name` table, with one Windows English record per string
    pub fn to_table(&self) -> Name {
        let mut name = Name::default();
        for id in [
            NameId::COPYRIGHT_NOTICE,
            NameId::FAMILY_NAME,
            NameId::SUBFAMILY_NAME,
            NameId::UNIQUE_ID,
            NameId::FULL_NAME,
            NameId::VERSION_STRING,
            NameId::POSTSCRIPT_NAME,
            NameId::DESCRIPTION,
            NameId::VENDOR_URL,
            NameId::LICENSE_DESCRIPTION,
            NameId::LICENSE_URL,
            NameId::SAMPLE_TEXT,
        ] {
            if let Some(string) = self.get(id) {
                name.name_record.push(NameRecord::new(
                    PLATFORM_WINDOWS,
                    ENCODING_UNICODE_BMP,
                    LANGUAGE_EN_US,
                    id,
                    string.to_string().into(),
                ));
            }
        }
        name.name_record.sort();
        name
    }
}

/// `Family Name` becomes `FamilyName-Regular`
pub fn postscript_name(family_name: &str) -> String {
    format!("{}-Regular", family_name.replace(' ', ""))
}
