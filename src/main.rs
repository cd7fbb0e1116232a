use anyhow::Result;
use clap::Parser;
use lensley_cv::{DetectionConfig, InferencePipeline, InferenceResult};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

mod loader;

/// Classify crossing-scene photos: crosswalk, signal state and countdown timer.
#[derive(Debug, Parser)]
#[command(name = "lensley", version)]
struct Cli {
    /// JPEG or PNG frames to classify
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// JSON detection config; unspecified keys keep their defaults
    #[arg(long, env = "LENSLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Skip digit recognition even if tesseract is installed
    #[arg(long)]
    no_ocr: bool,

    /// Per-image recognition timeout
    #[arg(long, value_name = "MS")]
    ocr_timeout_ms: Option<u64>,

    /// Pretty-print each result
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    path: &'a std::path::Path,
    #[serde(flatten)]
    result: InferenceResult,
}

fn load_config(cli: &Cli) -> Result<DetectionConfig> {
    let mut config = match &cli.config {
        Some(path) => DetectionConfig::from_file(path)?,
        None => DetectionConfig::default(),
    };
    if cli.no_ocr {
        config.ocr.enabled = false;
    }
    if let Some(ms) = cli.ocr_timeout_ms {
        config.ocr.timeout_ms = ms;
    }
    Ok(config)
}

fn classify(pipeline: &InferencePipeline, path: &std::path::Path, pretty: bool) -> Result<String> {
    let frame = loader::load_frame(path)?;
    let report = Report {
        path,
        result: pipeline.infer(&frame),
    };
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lensley=info,lensley_cv=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration failed: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let pipeline = InferencePipeline::new(config);
    info!(ocr = pipeline.ocr_available(), images = cli.images.len(), "pipeline ready");

    let mut failures = 0usize;
    for path in &cli.images {
        match classify(&pipeline, path, cli.pretty) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Detection failed for {:?}: {:#}", path, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
