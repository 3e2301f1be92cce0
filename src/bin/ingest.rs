//! Batch job: Scrapbox project → chunks → sparse vectors → Elasticsearch.
//!
//! Recreates the index on every run and exits non-zero on failure.

use std::process::ExitCode;
use std::sync::Arc;

use ai_llm_service::telemetry;
use anyhow::{Context, Result};
use rag_store::{ElasticFacade, IngestConfig, Processor, ScrapboxClient, StoreConfig, run_batch};
use splade_encoder::EncoderConfig;
use tracing::{Level, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn run() -> Result<()> {
    let ingest_cfg = IngestConfig::from_env().context("ingestion config")?;
    let store_cfg = StoreConfig::from_env().context("store config")?;
    let encoder = EncoderConfig::from_env()
        .context("encoder config")?
        .build()
        .context("encoder setup")?;

    let store = Arc::new(ElasticFacade::new(&store_cfg).context("elasticsearch client")?);
    let client = ScrapboxClient::new(&ingest_cfg).context("scrapbox client")?;
    let processor = Processor::new(encoder, &ingest_cfg).context("processor")?;

    let report = run_batch(&client, &processor, store.as_ref(), ingest_cfg.bulk_batch)
        .await
        .context("ingestion batch")?;

    info!(
        pages = report.pages,
        documents = report.documents,
        index = store.index(),
        "ingestion finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::INFO))
        .with(telemetry::layer())
        .try_init()
    {
        eprintln!("failed to init tracing: {e}");
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Batch failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
