use crate::i18n::LanguageTag;
use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Translation provider
    pub deepl_api_key: String,
    pub deepl_api_url: String,
    pub translate_timeout_secs: u64,
    pub translate_max_attempts: u32,

    // Cache
    pub cache_path: String,

    // Enrichment
    pub target_languages: Vec<LanguageTag>,
    pub batch_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Translation provider
            deepl_api_key: std::env::var("DEEPL_API_KEY").context("DEEPL_API_KEY not set")?,
            deepl_api_url: std::env::var("DEEPL_API_URL")
                .unwrap_or_else(|_| "https://api-free.deepl.com/v2/translate".to_string()),
            translate_timeout_secs: std::env::var("TRANSLATE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            // One attempt: a failed language is retried by the next run instead
            translate_max_attempts: std::env::var("TRANSLATE_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),

            // Cache
            cache_path: std::env::var("CACHE_PATH")
                .unwrap_or_else(|_| "data/translations.db".to_string()),

            // Enrichment
            target_languages: parse_language_list(
                &std::env::var("TARGET_LANGUAGES").unwrap_or_else(|_| "en,de,fr,it".to_string()),
            )
            .context("Invalid TARGET_LANGUAGES")?,
            batch_concurrency: std::env::var("BATCH_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(4),
        })
    }
}

/// Parse a comma-separated language list, keeping order and dropping repeats
pub fn parse_language_list(value: &str) -> Result<Vec<LanguageTag>> {
    let mut languages = Vec::new();
    for code in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let language = LanguageTag::from_code(code)?;
        if language.is_und() {
            bail!("'{}' cannot be a translation target", code);
        }
        if !languages.contains(&language) {
            languages.push(language);
        }
    }
    Ok(languages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_list_keeps_order() {
        let languages = parse_language_list("fr, en,de").expect("Should parse");
        assert_eq!(
            languages,
            vec![
                LanguageTag::FRENCH,
                LanguageTag::ENGLISH,
                LanguageTag::GERMAN
            ]
        );
    }

    #[test]
    fn test_parse_language_list_normalizes_and_dedups() {
        let languages = parse_language_list("EN-GB,en,,it").unwrap();
        assert_eq!(languages, vec![LanguageTag::ENGLISH, LanguageTag::ITALIAN]);
    }

    #[test]
    fn test_parse_language_list_empty() {
        assert!(parse_language_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_language_list_rejects_unknown() {
        let err = parse_language_list("en,xx").unwrap_err();
        assert!(err.to_string().contains("xx"));
    }

    #[test]
    fn test_parse_language_list_rejects_und() {
        assert!(parse_language_list("en,und").is_err());
    }
}
