//! Language tag: a normalized, registry-backed locale identifier.
//!
//! Tags are compared by their normalized primary code. Region and script
//! subtags ("en-GB", "zh_Hant") are dropped on parse, so every variant of a
//! language collapses to the same tag.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use std::fmt;
use std::str::FromStr;

/// A language code that is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language code: '{0}'")]
pub struct UnknownLanguage(pub String);

/// A validated language tag.
///
/// Only languages present in the registry can be constructed, which keeps the
/// mapping to the three-letter wire code total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageTag {
    /// Normalized primary code (e.g., "en", "und")
    code: &'static str,
}

impl LanguageTag {
    /// The unspecified language, used for text whose language was never asserted.
    pub const UND: LanguageTag = LanguageTag { code: "und" };

    pub const ENGLISH: LanguageTag = LanguageTag { code: "en" };
    pub const GERMAN: LanguageTag = LanguageTag { code: "de" };
    pub const FRENCH: LanguageTag = LanguageTag { code: "fr" };
    pub const ITALIAN: LanguageTag = LanguageTag { code: "it" };
    pub const SPANISH: LanguageTag = LanguageTag { code: "es" };

    /// Parse a language code such as "de", "EN-us" or "pt_BR".
    ///
    /// Only the primary subtag is kept; matching is case-insensitive.
    pub fn from_code(code: &str) -> Result<LanguageTag, UnknownLanguage> {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        LanguageRegistry::get()
            .get_by_code(&primary)
            .map(|config| LanguageTag { code: config.code })
            .ok_or_else(|| UnknownLanguage(code.to_string()))
    }

    /// Resolve a three-letter wire code (e.g., "deu") to a tag.
    pub fn from_iso3(iso3: &str) -> Result<LanguageTag, UnknownLanguage> {
        LanguageRegistry::get()
            .get_by_iso3(iso3)
            .map(|config| LanguageTag { code: config.code })
            .ok_or_else(|| UnknownLanguage(iso3.to_string()))
    }

    /// Normalized primary code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Registry entry for this tag.
    ///
    /// Tags only come from the registry, so the lookup cannot miss.
    fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("LanguageTag is always registry-backed")
    }

    /// Three-letter wire code (e.g., "deu").
    pub fn iso3(&self) -> &'static str {
        self.config().iso3
    }

    /// English name of the language.
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn is_und(&self) -> bool {
        *self == Self::UND
    }

    /// Upper-case two-letter code as the translation provider expects it.
    ///
    /// `None` for the unspecified language, which cannot be a translation target.
    pub fn provider_code(&self) -> Option<String> {
        if self.is_und() {
            None
        } else {
            Some(self.code.to_ascii_uppercase())
        }
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::UND
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl FromStr for LanguageTag {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageTag::from_code(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_resolve() {
        assert_eq!(LanguageTag::ENGLISH.iso3(), "eng");
        assert_eq!(LanguageTag::GERMAN.iso3(), "deu");
        assert_eq!(LanguageTag::FRENCH.iso3(), "fra");
        assert_eq!(LanguageTag::ITALIAN.iso3(), "ita");
        assert_eq!(LanguageTag::SPANISH.iso3(), "spa");
        assert_eq!(LanguageTag::UND.iso3(), "und");
    }

    #[test]
    fn test_from_code_normalizes() {
        assert_eq!(LanguageTag::from_code("EN").unwrap(), LanguageTag::ENGLISH);
        assert_eq!(LanguageTag::from_code("en-GB").unwrap(), LanguageTag::ENGLISH);
        assert_eq!(LanguageTag::from_code(" pt_BR ").unwrap().code(), "pt");
        assert_eq!(LanguageTag::from_code("und").unwrap(), LanguageTag::UND);
    }

    #[test]
    fn test_from_code_unknown() {
        let err = LanguageTag::from_code("xx").unwrap_err();
        assert_eq!(err, UnknownLanguage("xx".to_string()));
        assert!(LanguageTag::from_code("").is_err());
    }

    #[test]
    fn test_from_iso3() {
        assert_eq!(LanguageTag::from_iso3("deu").unwrap(), LanguageTag::GERMAN);
        assert_eq!(LanguageTag::from_iso3("und").unwrap(), LanguageTag::UND);
        assert!(LanguageTag::from_iso3("xyz").is_err());
        // Wire codes are lower-case only
        assert!(LanguageTag::from_iso3("DEU").is_err());
    }

    #[test]
    fn test_iso3_round_trip_for_every_language() {
        for config in LanguageRegistry::get().list_all() {
            let tag = LanguageTag::from_code(config.code).unwrap();
            assert_eq!(LanguageTag::from_iso3(tag.iso3()).unwrap(), tag);
        }
    }

    #[test]
    fn test_provider_code() {
        assert_eq!(LanguageTag::GERMAN.provider_code().as_deref(), Some("DE"));
        assert_eq!(LanguageTag::UND.provider_code(), None);
    }

    #[test]
    fn test_default_is_und() {
        assert!(LanguageTag::default().is_und());
        assert!(!LanguageTag::ENGLISH.is_und());
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(LanguageTag::ITALIAN.to_string(), "it");
        let parsed: LanguageTag = "fr".parse().unwrap();
        assert_eq!(parsed, LanguageTag::FRENCH);
        assert_eq!(parsed.name(), "French");
    }
}
