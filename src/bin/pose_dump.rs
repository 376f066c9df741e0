//! Runs the pose pipeline over still images and prints the JSON export for
//! each one. Useful for checking a model file without a camera.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use pose_overlay::config::Config;
use pose_overlay::export::PoseExporter;
use pose_overlay::logging;
use pose_overlay::pipeline::FramePipeline;
use pose_overlay::pose::{OnnxPoseEngine, RawFrame};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file
    #[arg(short, long, default_value = "pose_overlay.toml")]
    config: PathBuf,

    /// Model file (overrides the config)
    #[arg(short, long)]
    model: Option<String>,

    /// Export score threshold (overrides the config)
    #[arg(long)]
    threshold: Option<f32>,

    /// Input images (JPEG / PNG)
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load_or_default(&args.config);
    logging::init(&config.log.filter);

    if let Some(model) = args.model {
        config.model.path = model;
    }
    if let Some(threshold) = args.threshold {
        config.export.threshold = threshold;
    }

    let engine = OnnxPoseEngine::new(&config.model).context("cannot start without a pose model")?;
    let mut pipeline = FramePipeline::new(engine);
    let exporter = PoseExporter::from(&config.export);

    let mut failed = 0usize;
    for path in &args.images {
        let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        match pipeline.process(&RawFrame::encoded(bytes)) {
            Ok(pose) => {
                info!(image = %path.display(), avg_score = pose.average_score(), "pose estimated");
                println!("{}", exporter.to_json(&pose)?);
            }
            Err(e) => {
                failed += 1;
                warn!(image = %path.display(), error = %e, "skipped");
            }
        }
    }

    if failed > 0 {
        warn!("{} of {} images failed", failed, args.images.len());
    }
    Ok(())
}
