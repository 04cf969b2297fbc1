//! Multilingual text support.
//!
//! # Architecture
//!
//! - `registry`: Table of known languages with their two- and three-letter codes
//! - `language`: `LanguageTag`, the normalized language identifier
//! - `tagged`: `TaggedString`, the per-language text collection and its wire codec
//! - `metrics`: Counters for translation enrichment
//!
//! # Example
//!
//! ```rust
//! use catalog_lingua::i18n::{LanguageTag, TaggedString};
//!
//! let tms = TaggedString::from_json(r#"["bête ::t:fra","animal","Tier ::deu"]"#).unwrap();
//! assert_eq!(tms.to_string(), "animal");
//! assert_eq!(tms.get(LanguageTag::GERMAN), "Tier");
//! ```

mod language;
mod metrics;
mod registry;
mod tagged;

pub use language::{LanguageTag, UnknownLanguage};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use tagged::{EncodingError, Entry, TaggedString, SOURCE_PRIORITY};
