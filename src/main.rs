use anyhow::{Context, Result};
use catalog_lingua::{
    config::Config,
    db::Database,
    deepl::DeepLClient,
    pipeline::{enrich_batch, read_records, CatalogRecord, JsonLinesSink},
    translation::Translator,
};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging (stdout carries records)
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("catalog_lingua=info".parse()?),
        )
        .init();

    info!("Starting catalog translation enrichment");

    let config = Config::from_env()?;

    if let Some(parent) = Path::new(&config.cache_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create {}", parent.display()))?;
        }
    }
    let cache = Database::new(&config.cache_path)?;
    info!(
        "Translation cache at {} ({} entries)",
        config.cache_path,
        cache.entry_count()?
    );

    let provider = DeepLClient::from_config(&config)?;
    let translator = Translator::new(Arc::new(provider), Arc::new(cache));

    // Step 1: Read records from stdin
    let (records, skipped) = read_records::<CatalogRecord>(io::stdin().lock())?;
    info!("Read {} records ({} unreadable)", records.len(), skipped);

    // Step 2: Enrich and publish to stdout
    let mut sink = JsonLinesSink::new(io::stdout().lock());
    let report = enrich_batch(
        &translator,
        records,
        &config.target_languages,
        config.batch_concurrency,
        &mut sink,
    )
    .await?;

    if !report.failed.is_empty() {
        info!("Failed records: {}", report.failed.join(", "));
    }
    info!(
        "Translation metrics: {}",
        serde_json::to_string(&translator.metrics().report())?
    );

    Ok(())
}
