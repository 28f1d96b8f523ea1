use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use kurator::{
    load_config, ArchiveScanner, BatchRunner, ConfigError, JsonMetadataSource,
    JsonlDescriptionStore, MetadataSource, OpenAiClient,
};

fn init_logging() {
    // Route `log` macro output from the library into tracing.
    let _ = tracing_log::LogTracer::init();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn run() -> kurator::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "kurator.json".to_string());
    let config = load_config(&config_path)?;

    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| ConfigError::MissingCredential("OPENAI_API_KEY".to_string()))?;

    let metadata = JsonMetadataSource::new(&config.metadata_tables).read_all()?;
    info!("Loaded metadata for {} objects", metadata.len());

    let scanner = ArchiveScanner::new(&config.input_directories, config.max_images_per_object);
    let work_items = scanner.scan(&metadata);
    if work_items.is_empty() {
        info!("No objects found in the archive, nothing to do");
        return Ok(());
    }

    let store = Arc::new(JsonlDescriptionStore::new(&config.descriptions_table));
    let client = Arc::new(OpenAiClient::from_config(&config, api_key));
    let runner = BatchRunner::from_config(&config, client, store);

    let summary = runner.run(work_items).await?;
    info!("Run complete: {summary}");

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
