use crate::config::Config;
use crate::i18n::LanguageTag;
use crate::retry::{with_retry_if, RetryConfig};
use crate::translation::{ProviderError, ProviderTranslation, TranslationProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// DeepL translate request (form encoded)
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[serde(default)]
    detected_source_language: Option<String>,
    text: String,
}

/// HTTP client for the DeepL translation API
#[derive(Debug, Clone)]
pub struct DeepLClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl DeepLClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.deepl_api_url,
            &config.deepl_api_key,
            Duration::from_secs(config.translate_timeout_secs),
            RetryConfig::provider(config.translate_max_attempts),
        )
    }

    async fn request(
        &self,
        text: &str,
        target_lang_code: &str,
    ) -> Result<ProviderTranslation, ProviderError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&TranslateRequest {
                text,
                target_lang: target_lang_code,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranslateResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        let translation = parsed
            .translations
            .into_iter()
            .next()
            .ok_or(ProviderError::Empty)?;

        Ok(ProviderTranslation {
            text: translation.text,
            detected_source: translation
                .detected_source_language
                .as_deref()
                .and_then(detected_language),
        })
    }
}

/// Map a provider-reported source language to a tag, dropping unknown codes
fn detected_language(code: &str) -> Option<LanguageTag> {
    match LanguageTag::from_code(code) {
        Ok(language) if !language.is_und() => Some(language),
        Ok(_) => None,
        Err(e) => {
            warn!("Ignoring detected source language: {}", e);
            None
        }
    }
}

/// Retry rate limits, server errors and transport failures; client errors
/// and malformed responses will not improve on a second attempt
fn is_retryable_error(error: &ProviderError) -> bool {
    match error {
        ProviderError::Transport(_) => true,
        ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
        ProviderError::Decode(_) | ProviderError::Empty => false,
    }
}

#[async_trait]
impl TranslationProvider for DeepLClient {
    async fn translate(
        &self,
        text: &str,
        target_lang_code: &str,
    ) -> Result<ProviderTranslation, ProviderError> {
        with_retry_if(
            &self.retry,
            &format!("Translation to {}", target_lang_code),
            || self.request(text, target_lang_code),
            is_retryable_error,
        )
        .await
    }
}
