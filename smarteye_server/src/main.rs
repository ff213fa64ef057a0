use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ort_common::OrtDetector;
use smarteye_server::api;
use smarteye_server::config::AppConfig;
use smarteye_server::state::AppState;
use tracing_subscriber::prelude::*;

const DEFAULT_LOG_FILTER: &str =
    "warn,smarteye_server=info,ort_common=info,ffmpeg_common=info,tower_http=info";

#[derive(Debug, Parser)]
pub struct Args {
    /// TOML config file. Missing files are ignored and defaults apply.
    #[arg(long, short, default_value = "smarteye.toml")]
    config: PathBuf,
    /// Overrides `server.port` from the config.
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(Some(&args.config))
        .with_context(|| format!("reading config from {:?}", args.config))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::debug!("{config:?}");

    let detector = OrtDetector::load(&config.model).with_context(|| {
        format!(
            "loading {} model from {:?}",
            config.model.kind, config.model.path
        )
    })?;
    tracing::info!(
        "Loaded {} with {} labels, sampling every {} video frames",
        config.model.kind,
        detector.labels().len(),
        config.video.sample_every
    );

    let state = AppState::new(Arc::new(detector), config.video.sample_every)
        .with_scratch_dir(config.video.scratch_dir.clone());
    api::serve(state, &config.server).await
}
