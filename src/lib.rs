//! Multilingual catalog fields and their machine-translation enrichment.
//!
//! - [`i18n`]: language tags and the tagged multilingual string with its wire codec
//! - [`translation`]: the translator that fills in missing languages
//! - [`cache`] / [`db`]: the translation cache interface and its SQLite store
//! - [`deepl`]: HTTP translation provider
//! - [`pipeline`]: batch enrichment of catalog records

pub mod cache;
pub mod config;
pub mod db;
pub mod deepl;
pub mod i18n;
pub mod pipeline;
pub mod retry;
pub mod translation;
