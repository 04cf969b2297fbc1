//! Batch enrichment of catalog records.
//!
//! Records come from an upstream source, have their multilingual fields
//! translated, and are upserted into a downstream sink by id. A record whose
//! translations cannot be encoded or cached is logged and left out; the rest
//! of the batch carries on.

use crate::i18n::{LanguageTag, TaggedString};
use crate::translation::{TranslateError, Translator};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{BufRead, Write};
use std::pin::pin;
use tracing::{error, info, warn};

/// A record with one or more multilingual fields
pub trait MultilingualRecord {
    /// Stable identifier used for downstream upserts
    fn id(&self) -> &str;

    fn multilingual_fields_mut(&mut self) -> Vec<&mut TaggedString>;
}

/// Downstream destination for enriched records
pub trait RecordSink<R> {
    /// Insert or replace the record with the same id
    fn upsert(&mut self, record: &R) -> Result<()>;
}

/// Generic catalog record: title and description are multilingual, every
/// other field passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,

    #[serde(default)]
    pub title: TaggedString,

    #[serde(default)]
    pub description: TaggedString,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MultilingualRecord for CatalogRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn multilingual_fields_mut(&mut self) -> Vec<&mut TaggedString> {
        vec![&mut self.title, &mut self.description]
    }
}

/// Writes one JSON document per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write, R: Serialize> RecordSink<R> for JsonLinesSink<W> {
    fn upsert(&mut self, record: &R) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("Failed to encode record")?;
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .context("Failed to write record")?;
        Ok(())
    }
}

/// Outcome of a batch run
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    /// Ids of records that were skipped
    pub failed: Vec<String>,
}

/// Read JSON-lines records, skipping (and counting) lines that fail to decode
pub fn read_records<R: DeserializeOwned>(reader: impl BufRead) -> Result<(Vec<R>, usize)> {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Skipping line {}: {}", index + 1, e);
                skipped += 1;
            }
        }
    }

    Ok((records, skipped))
}

/// Translate every multilingual field of `record`
pub async fn enrich_record<R: MultilingualRecord>(
    translator: &Translator,
    record: &mut R,
    targets: &[LanguageTag],
) -> Result<(), TranslateError> {
    for field in record.multilingual_fields_mut() {
        translator.translate(field, targets).await?;
    }
    Ok(())
}

/// Enrich `records` with up to `concurrency` in flight and upsert each
/// successful one into `sink`, preserving input order.
///
/// Per-record translation failures are reported, not returned; a sink
/// failure aborts the batch.
pub async fn enrich_batch<R, S>(
    translator: &Translator,
    records: Vec<R>,
    targets: &[LanguageTag],
    concurrency: usize,
    sink: &mut S,
) -> Result<BatchReport>
where
    R: MultilingualRecord,
    S: RecordSink<R>,
{
    let mut report = BatchReport::default();
    let total = records.len();

    let enriched = stream::iter(records.into_iter().map(|mut record| async move {
        let outcome = enrich_record(translator, &mut record, targets).await;
        (record, outcome)
    }))
    .buffered(concurrency.max(1));
    let mut enriched = pin!(enriched);

    while let Some((record, outcome)) = enriched.next().await {
        match outcome {
            Ok(()) => {
                sink.upsert(&record)
                    .with_context(|| format!("Failed to publish record {}", record.id()))?;
                report.succeeded += 1;
            }
            Err(e) => {
                error!("Skipping record {}: {}", record.id(), e);
                report.failed.push(record.id().to_string());
            }
        }
    }

    info!(
        "Enriched {}/{} records ({} failed)",
        report.succeeded,
        total,
        report.failed.len()
    );

    Ok(report)
}
