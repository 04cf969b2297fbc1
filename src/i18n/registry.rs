//! Language registry: the table of languages a catalog field may be tagged with.
//!
//! Each language carries its ISO 639-1 code (used in memory and by the
//! translation provider) and its ISO 639-3 code (used on the wire). Both
//! columns are unique, so the two code systems map bijectively for every
//! language the registry knows.

use std::sync::OnceLock;

/// Configuration for a known language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Normalized primary code (ISO 639-1 where one exists, e.g. "en", "de")
    pub code: &'static str,

    /// Three-letter wire code (ISO 639-3, e.g. "eng", "deu")
    pub iso3: &'static str,

    /// English name of the language
    pub name: &'static str,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its normalized primary code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get a language configuration by its three-letter wire code.
    pub fn get_by_iso3(&self, iso3: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.iso3 == iso3)
    }

    /// Get all known languages, the unspecified sentinel included.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }
}

macro_rules! lang {
    ($code:literal, $iso3:literal, $name:literal) => {
        LanguageConfig {
            code: $code,
            iso3: $iso3,
            name: $name,
        }
    };
}

/// Default language table.
///
/// "und" is the unspecified sentinel; it is its own wire code.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        lang!("und", "und", "Undetermined"),
        lang!("en", "eng", "English"),
        lang!("de", "deu", "German"),
        lang!("fr", "fra", "French"),
        lang!("it", "ita", "Italian"),
        lang!("es", "spa", "Spanish"),
        lang!("pt", "por", "Portuguese"),
        lang!("nl", "nld", "Dutch"),
        lang!("da", "dan", "Danish"),
        lang!("sv", "swe", "Swedish"),
        lang!("nb", "nob", "Norwegian Bokmål"),
        lang!("no", "nor", "Norwegian"),
        lang!("fi", "fin", "Finnish"),
        lang!("is", "isl", "Icelandic"),
        lang!("pl", "pol", "Polish"),
        lang!("cs", "ces", "Czech"),
        lang!("sk", "slk", "Slovak"),
        lang!("sl", "slv", "Slovenian"),
        lang!("hr", "hrv", "Croatian"),
        lang!("sr", "srp", "Serbian"),
        lang!("bs", "bos", "Bosnian"),
        lang!("hu", "hun", "Hungarian"),
        lang!("ro", "ron", "Romanian"),
        lang!("bg", "bul", "Bulgarian"),
        lang!("el", "ell", "Greek"),
        lang!("ru", "rus", "Russian"),
        lang!("uk", "ukr", "Ukrainian"),
        lang!("be", "bel", "Belarusian"),
        lang!("lt", "lit", "Lithuanian"),
        lang!("lv", "lav", "Latvian"),
        lang!("et", "est", "Estonian"),
        lang!("ga", "gle", "Irish"),
        lang!("cy", "cym", "Welsh"),
        lang!("ca", "cat", "Catalan"),
        lang!("eu", "eus", "Basque"),
        lang!("gl", "glg", "Galician"),
        lang!("la", "lat", "Latin"),
        lang!("lb", "ltz", "Luxembourgish"),
        lang!("rm", "roh", "Romansh"),
        lang!("sq", "sqi", "Albanian"),
        lang!("mk", "mkd", "Macedonian"),
        lang!("tr", "tur", "Turkish"),
        lang!("ar", "ara", "Arabic"),
        lang!("he", "heb", "Hebrew"),
        lang!("fa", "fas", "Persian"),
        lang!("hi", "hin", "Hindi"),
        lang!("zh", "zho", "Chinese"),
        lang!("ja", "jpn", "Japanese"),
        lang!("ko", "kor", "Korean"),
        lang!("id", "ind", "Indonesian"),
        lang!("ms", "msa", "Malay"),
        lang!("vi", "vie", "Vietnamese"),
        lang!("th", "tha", "Thai"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_singleton() {
        let r1 = LanguageRegistry::get();
        let r2 = LanguageRegistry::get();
        assert!(std::ptr::eq(r1, r2));
    }

    #[test]
    fn test_get_by_code() {
        let german = LanguageRegistry::get().get_by_code("de").expect("German");
        assert_eq!(german.iso3, "deu");
        assert_eq!(german.name, "German");
        assert!(LanguageRegistry::get().get_by_code("xx").is_none());
    }

    #[test]
    fn test_get_by_iso3() {
        let french = LanguageRegistry::get().get_by_iso3("fra").expect("French");
        assert_eq!(french.code, "fr");
        assert!(LanguageRegistry::get().get_by_iso3("fre").is_none());
    }

    #[test]
    fn test_codes_are_unique_in_both_directions() {
        let all = LanguageRegistry::get().list_all();
        let codes: HashSet<_> = all.iter().map(|l| l.code).collect();
        let iso3s: HashSet<_> = all.iter().map(|l| l.iso3).collect();
        assert_eq!(codes.len(), all.len(), "duplicate primary code");
        assert_eq!(iso3s.len(), all.len(), "duplicate wire code");
    }

    #[test]
    fn test_wire_codes_are_three_lowercase_letters() {
        for lang in LanguageRegistry::get().list_all() {
            assert_eq!(lang.iso3.len(), 3, "{}", lang.code);
            assert!(lang.iso3.chars().all(|c| c.is_ascii_lowercase()));
        }
    }
}
