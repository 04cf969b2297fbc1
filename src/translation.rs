use crate::cache::{cache_key, CacheError, CacheStore};
use crate::i18n::{EncodingError, LanguageTag, TaggedString, TranslationMetrics};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Number of lock stripes serializing work on the same cache key
const KEY_LOCK_STRIPES: usize = 64;

/// A single machine translation returned by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTranslation {
    pub text: String,
    /// Source language as detected by the provider, when it reports one
    pub detected_source: Option<LanguageTag>,
}

/// Failure of one provider call. Always recovered by skipping that target.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("translation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("translation provider error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse translation response: {0}")]
    Decode(String),

    #[error("translation response contained no translations")]
    Empty,
}

/// External machine translation service
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text` into the language with upper-case two-letter code
    /// `target_lang_code`.
    async fn translate(
        &self,
        text: &str,
        target_lang_code: &str,
    ) -> Result<ProviderTranslation, ProviderError>;
}

/// Failures that abort a [`Translator::translate`] call
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("failed to encode translations: {0}")]
    Encoding(#[from] EncodingError),

    #[error("failed to write translation cache: {0}")]
    Cache(CacheError),
}

impl From<CacheError> for TranslateError {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Encoding(e) => TranslateError::Encoding(e),
            other => TranslateError::Cache(other),
        }
    }
}

/// Fills in missing languages of a [`TaggedString`] from the cache or the
/// translation provider.
pub struct Translator {
    provider: Arc<dyn TranslationProvider>,
    cache: Arc<dyn CacheStore>,
    metrics: TranslationMetrics,
    key_locks: Vec<Mutex<()>>,
}

impl Translator {
    pub fn new(provider: Arc<dyn TranslationProvider>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            provider,
            cache,
            metrics: TranslationMetrics::new(),
            key_locks: (0..KEY_LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    fn key_lock(&self, key: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.key_locks[hasher.finish() as usize % self.key_locks.len()]
    }

    /// Add each of `targets` that `tms` lacks.
    ///
    /// Cached translations for the source text replace the contents of `tms`.
    /// Provider failures skip the affected language. Only encoding and cache
    /// write failures are returned; mutations made before them are kept.
    pub async fn translate(
        &self,
        tms: &mut TaggedString,
        targets: &[LanguageTag],
    ) -> Result<(), TranslateError> {
        if tms.is_empty() {
            return Ok(());
        }

        let (source_text, mut source_lang) = tms.translation_source();

        if source_text.is_empty() {
            // Every text hashes to the same key here, so the cache is not consulted
            warn!(
                "No source text among {:?}; adding empty placeholders",
                tms.languages()
            );
            for &target in targets {
                if target.is_und() {
                    warn!("Skipping translation into the unspecified language");
                    continue;
                }
                if !tms.contains(target) {
                    tms.set("", target, true);
                }
            }
            return Ok(());
        }

        let key = cache_key(&source_text);
        let _guard = self.key_lock(&key).lock().await;

        self.load_cached(&key, tms);

        let mut modified = false;
        for &target in targets {
            if tms.contains(target) {
                continue;
            }

            let Some(target_code) = target.provider_code() else {
                warn!("Skipping translation into the unspecified language");
                continue;
            };

            self.metrics.record_provider_call();
            let translation = match self.provider.translate(&source_text, &target_code).await {
                Ok(translation) => translation,
                Err(e) => {
                    self.metrics.record_provider_failure();
                    warn!("Translation to {} failed, skipping: {}", target.name(), e);
                    continue;
                }
            };

            if let Some(detected) = translation.detected_source {
                if source_lang.is_und() {
                    debug!("Detected source language {} for {}", detected, key);
                    tms.set_lang(&source_text, detected, false);
                    source_lang = detected;
                }
            }

            // The detected source may itself be the target
            if !tms.contains(target) {
                tms.set(translation.text, target, true);
            }
            modified = true;
        }

        if modified {
            self.store(&key, &source_text, tms)?;
        }

        Ok(())
    }

    /// Replace `tms` with the cached value under `key`, if any.
    ///
    /// Read and decode failures count as a miss.
    fn load_cached(&self, key: &str, tms: &mut TaggedString) {
        match self.cache.view(key) {
            Ok(Some(bytes)) => match TaggedString::from_slice(&bytes) {
                Ok(cached) => {
                    self.metrics.record_cache_hit();
                    debug!("Cache hit for {}", key);
                    *tms = cached;
                }
                Err(e) => {
                    self.metrics.record_cache_read_failure();
                    warn!("Ignoring undecodable cache entry {}: {}", key, e);
                }
            },
            Ok(None) => {
                self.metrics.record_cache_miss();
            }
            Err(e) => {
                self.metrics.record_cache_read_failure();
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
            }
        }
    }

    /// Write `tms` under `key`, keeping languages stored there meanwhile.
    ///
    /// On success `tms` holds exactly what was written. The source text keeps
    /// a single entry, under whichever side detected its language.
    fn store(
        &self,
        key: &str,
        source_text: &str,
        tms: &mut TaggedString,
    ) -> Result<(), TranslateError> {
        let mut written: Option<TaggedString> = None;

        self.cache.update(key, &mut |current| {
            let mut next = tms.clone();
            if let Some(bytes) = current {
                match TaggedString::from_slice(bytes) {
                    Ok(mut stored) => {
                        reconcile_source(&mut next, &mut stored, source_text);
                        next.merge_missing(&stored);
                    }
                    Err(e) => warn!("Overwriting undecodable cache entry {}: {}", key, e),
                }
            }
            let encoded = next.to_json()?.into_bytes();
            written = Some(next);
            Ok(encoded)
        })?;

        self.metrics.record_cache_write();
        debug!("Stored translations for {}", key);

        if let Some(next) = written {
            *tms = next;
        }
        Ok(())
    }
}

/// Line up the source text's language between `ours` and `stored` before
/// merging, so a detection on either side does not leave the same text under
/// both `und` and the detected language.
fn reconcile_source(ours: &mut TaggedString, stored: &mut TaggedString, source_text: &str) {
    let is_und_source = |tms: &TaggedString| {
        tms.contains(LanguageTag::UND) && tms.get(LanguageTag::UND) == source_text
    };

    if is_und_source(stored) && !is_und_source(ours) {
        stored.remove(LanguageTag::UND);
    } else if is_und_source(ours) {
        let detected = stored
            .native_languages()
            .into_iter()
            .find(|&language| !language.is_und() && stored.get(language) == source_text);
        if let Some(language) = detected {
            ours.set_lang(source_text, language, false);
        }
    }
}
