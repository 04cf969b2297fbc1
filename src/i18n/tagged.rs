//! Tagged multilingual strings.
//!
//! A [`TaggedString`] holds one text per language, in insertion order, and
//! remembers whether each text was authored or machine translated. On the
//! wire it is a single JSON value:
//!
//! - no entries: `""`
//! - one entry: `"text ::deu"`
//! - several entries: `["bête ::t:fra", "animal", "Tier ::deu"]`
//!
//! Each element carries an inline suffix: ` ::<iso3>` for authored text,
//! ` ::t:<iso3>` for translated text, and nothing for the unspecified
//! language.

use crate::i18n::{LanguageTag, UnknownLanguage};
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Languages tried, in order, when choosing the text to translate from.
pub const SOURCE_PRIORITY: [LanguageTag; 5] = [
    LanguageTag::ENGLISH,
    LanguageTag::GERMAN,
    LanguageTag::FRENCH,
    LanguageTag::ITALIAN,
    LanguageTag::UND,
];

/// Failure to encode or decode a wire value.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("malformed multilingual value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unresolvable language suffix: {0}")]
    Language(#[from] UnknownLanguage),
}

/// One language variant of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub language: LanguageTag,
    pub text: String,
    pub translated: bool,
}

impl Entry {
    /// Element string as it appears on the wire.
    fn to_wire(&self) -> String {
        if self.translated {
            format!("{} ::t:{}", self.text, self.language.iso3())
        } else if self.language.is_und() {
            self.text.clone()
        } else {
            format!("{} ::{}", self.text, self.language.iso3())
        }
    }

    /// Parse one wire element.
    ///
    /// Text without a recognizable suffix is kept verbatim as an unspecified,
    /// authored entry. The suffix match spans line breaks in the text.
    fn from_wire(element: &str) -> Result<Entry, UnknownLanguage> {
        let regex = SUFFIX_REGEX
            .get_or_init(|| Regex::new(r"(?s)^(.*) ::(t:)?([a-z]{3})$").unwrap());

        match regex.captures(element) {
            Some(caps) => Ok(Entry {
                language: LanguageTag::from_iso3(&caps[3])?,
                text: caps[1].to_string(),
                translated: caps.get(2).is_some(),
            }),
            None => Ok(Entry {
                language: LanguageTag::UND,
                text: element.to_string(),
                translated: false,
            }),
        }
    }
}

static SUFFIX_REGEX: OnceLock<Regex> = OnceLock::new();

/// An ordered set of per-language texts for one field.
///
/// At most one entry exists per language; [`TaggedString::set`] enforces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedString {
    entries: Vec<Entry>,
}

impl TaggedString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single authored entry in the unspecified language.
    pub fn und(text: impl Into<String>) -> Self {
        let mut tms = Self::new();
        tms.set(text, LanguageTag::UND, false);
        tms
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Replace the text for `language`, moving it to the end.
    pub fn set(&mut self, text: impl Into<String>, language: LanguageTag, translated: bool) {
        self.remove(language);
        self.entries.push(Entry {
            language,
            text: text.into(),
            translated,
        });
    }

    pub fn remove(&mut self, language: LanguageTag) {
        self.entries.retain(|entry| entry.language != language);
    }

    /// Text for `language`, or `""` when absent.
    pub fn get(&self, language: LanguageTag) -> &str {
        self.entries
            .iter()
            .find(|entry| entry.language == language)
            .map(|entry| entry.text.as_str())
            .unwrap_or("")
    }

    pub fn contains(&self, language: LanguageTag) -> bool {
        self.entries.iter().any(|entry| entry.language == language)
    }

    pub fn languages(&self) -> Vec<LanguageTag> {
        self.entries.iter().map(|entry| entry.language).collect()
    }

    pub fn native_languages(&self) -> Vec<LanguageTag> {
        self.entries
            .iter()
            .filter(|entry| !entry.translated)
            .map(|entry| entry.language)
            .collect()
    }

    pub fn translated_languages(&self) -> Vec<LanguageTag> {
        self.entries
            .iter()
            .filter(|entry| entry.translated)
            .map(|entry| entry.language)
            .collect()
    }

    /// Relabel the first entry whose text equals `source_text`.
    ///
    /// Used to backfill the language of an unspecified entry once the
    /// provider has detected it. Any other entry already holding `language`
    /// is dropped so languages stay unique. No-op when no text matches.
    pub fn set_lang(&mut self, source_text: &str, language: LanguageTag, translated: bool) {
        let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.text == source_text)
        else {
            return;
        };

        self.entries[index].language = language;
        self.entries[index].translated = translated;

        let mut position = 0;
        self.entries.retain(|entry| {
            let keep = position == index || entry.language != language;
            position += 1;
            keep
        });
    }

    /// Text and language to translate from.
    ///
    /// A lone entry is used as is, with its language treated as unknown.
    /// Otherwise the first authored language in [`SOURCE_PRIORITY`] wins; if
    /// none is present the source text is empty.
    pub fn translation_source(&self) -> (String, LanguageTag) {
        match self.entries.as_slice() {
            [] => (String::new(), LanguageTag::UND),
            [only] => (only.text.clone(), LanguageTag::UND),
            _ => {
                let native = self.native_languages();
                SOURCE_PRIORITY
                    .iter()
                    .find(|language| native.contains(language))
                    .map(|&language| (self.get(language).to_string(), language))
                    .unwrap_or((String::new(), LanguageTag::UND))
            }
        }
    }

    /// Append entries from `other` for languages this string lacks.
    ///
    /// Returns the number of entries added.
    pub fn merge_missing(&mut self, other: &TaggedString) -> usize {
        let mut added = 0;
        for entry in &other.entries {
            if !self.contains(entry.language) {
                self.entries.push(entry.clone());
                added += 1;
            }
        }
        added
    }

    pub fn to_json(&self) -> Result<String, EncodingError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EncodingError> {
        let wire: Option<WireValue> = serde_json::from_str(json)?;
        Ok(Self::from_wire(wire)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        let wire: Option<WireValue> = serde_json::from_slice(bytes)?;
        Ok(Self::from_wire(wire)?)
    }

    fn from_wire(wire: Option<WireValue>) -> Result<Self, UnknownLanguage> {
        let elements = match wire {
            None => Vec::new(),
            Some(WireValue::Single(s)) if s.is_empty() => Vec::new(),
            Some(WireValue::Single(s)) => vec![s],
            Some(WireValue::Multi(v)) => v,
        };

        let mut tms = TaggedString::new();
        for element in &elements {
            let entry = Entry::from_wire(element)?;
            tms.set(entry.text, entry.language, entry.translated);
        }
        Ok(tms)
    }
}

/// Display text: the unspecified entry, else the first authored entry,
/// else the first entry at all.
impl fmt::Display for TaggedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chosen = self
            .entries
            .iter()
            .find(|entry| entry.language.is_und())
            .or_else(|| self.entries.iter().find(|entry| !entry.translated))
            .or_else(|| self.entries.first());

        match chosen {
            Some(entry) => f.write_str(&entry.text),
            None => Ok(()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireValue {
    Single(String),
    Multi(Vec<String>),
}

impl Serialize for TaggedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.entries.as_slice() {
            [] => serializer.serialize_str(""),
            [only] => serializer.serialize_str(&only.to_wire()),
            entries => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for entry in entries {
                    seq.serialize_element(&entry.to_wire())?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for TaggedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Option::<WireValue>::deserialize(deserializer)?;
        TaggedString::from_wire(wire).map_err(de::Error::custom)
    }
}
