//! Build-time model downloader
//!
//! Populates the bundled-models directory so the runtime service starts
//! without network access. Runs a plain sequential fallback list: the models
//! are tried in order (best quality first, lightweight fallback last) and
//! the first one that downloads, loads, and verifies wins.
//!
//! Exit codes: 0 when at least one model was downloaded and verified,
//! 1 when every attempt failed.

use anyhow::{Context, ensure};
use clap::Parser;
use sembed_embeddings::{ModelSource, SentenceModel, resolve_model};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// Sentence used to verify a downloaded model actually encodes
const PROBE_SENTENCE: &str = "test sentence";

/// sembed model fetcher
///
/// Downloads sentence-embedding models into the bundled-models directory at
/// container build time.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Models to try, in priority order; the first success wins
    #[arg(
        long = "model",
        default_values_t = [
            "all-mpnet-base-v2".to_string(),
            "sentence-transformers/all-mpnet-base-v2".to_string(),
            "all-MiniLM-L6-v2".to_string(),
        ]
    )]
    models: Vec<String>,

    /// Directory to populate; doubles as the hub cache folder
    #[arg(long, default_value = "/bundled-models")]
    cache_dir: String,

    /// Maximum tokens per input used for the verification encode
    #[arg(long, default_value = "512")]
    max_tokens: usize,
}

/// Download one model into the cache and verify it encodes
async fn fetch_and_verify(
    model_id: &str,
    cache_dir: &Path,
    max_tokens: usize,
) -> anyhow::Result<()> {
    let start = Instant::now();

    let resolved = resolve_model(model_id, cache_dir)
        .await
        .context("resolution failed")?;
    if let ModelSource::Bundled(path) = &resolved.source {
        info!(path = %path.display(), "Already bundled, reusing");
    }

    let model = SentenceModel::load(model_id, &resolved.files, max_tokens)
        .context("model load failed")?;
    let dimensions = model.dimensions();
    info!(
        model = model_id,
        dimensions,
        elapsed_s = format!("{:.1}", start.elapsed().as_secs_f64()),
        "Downloaded"
    );

    let embedding = model
        .encode(PROBE_SENTENCE)
        .context("verification encode failed")?;
    ensure!(
        embedding.len() == dimensions,
        "verification encode returned {} values, expected {dimensions}",
        embedding.len()
    );

    info!(model = model_id, "Model verified");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cache_dir = Path::new(&args.cache_dir);

    if let Err(e) = std::fs::create_dir_all(cache_dir) {
        error!(dir = %cache_dir.display(), error = %e, "Cannot create cache directory");
        std::process::exit(1);
    }

    info!(dir = %cache_dir.display(), "Starting model download");

    let total = args.models.len();
    for (i, model_id) in args.models.iter().enumerate() {
        info!(model = %model_id, attempt = i + 1, total, "Downloading...");

        match fetch_and_verify(model_id, cache_dir, args.max_tokens).await {
            Ok(()) => {
                info!(model = %model_id, "Using as primary model");
                info!("Model download completed successfully");
                return;
            }
            Err(e) => {
                warn!(model = %model_id, error = %e, "Download failed");
            }
        }
    }

    error!("All model downloads failed - runtime will attempt download");
    std::process::exit(1);
}
