//! describe_frame - one-shot narrative for a single frame or detector output

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;

use scene_narrator::config::{DetectorKind, DetectorSettings};
use scene_narrator::detect::DetectionResult;
use scene_narrator::spatial::ReferenceFrame;
use scene_narrator::{BackendRegistry, Frame, Pipeline, PipelineConfig};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file holding a detector result ({frame_width, frame_height, detections}).
    #[arg(long, conflicts_with = "image")]
    detections: Option<PathBuf>,
    /// Image file to run the detector on.
    #[arg(long)]
    image: Option<PathBuf>,
    /// Detector backend used with --image.
    #[arg(long, default_value = "stub", env = "NARRATOR_DETECTOR")]
    detector: String,
    /// ONNX model path for the tract detector.
    #[arg(long, env = "NARRATOR_MODEL_PATH")]
    model_path: Option<PathBuf>,
    /// Minimum detection confidence.
    #[arg(long, default_value_t = 0.5, env = "NARRATOR_MIN_CONFIDENCE")]
    min_confidence: f32,
    /// Reference resolution for head orientation (WIDTHxHEIGHT).
    #[arg(long, default_value = "1920x1080")]
    reference: String,
    /// Print the full snapshot report as JSON instead of the narrative.
    #[arg(long)]
    json: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, value_enum, default_value = "auto", value_name = "MODE")]
    ui: ui::UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let ui = ui::Ui::new(args.ui);

    let pipeline = Pipeline::new(PipelineConfig {
        min_confidence: args.min_confidence,
        reference: parse_reference(&args.reference)?,
    });
    let captured_at = Local::now();

    let report = match (&args.detections, &args.image) {
        (Some(path), _) => {
            let result = {
                let _stage = ui.stage("Load detections");
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str::<DetectionResult>(&raw)
                    .with_context(|| format!("invalid detection JSON in {}", path.display()))?
            };
            let _stage = ui.stage("Analyze scene");
            pipeline.process(Ok(result), None, captured_at)
        }
        (None, Some(path)) => {
            let frame = {
                let _stage = ui.stage("Decode image");
                let image = image::open(path)
                    .with_context(|| format!("failed to decode {}", path.display()))?;
                Frame::from_image(image, captured_at)?
            };
            let detectors = {
                let _stage = ui.stage("Load detector");
                BackendRegistry::from_settings(&DetectorSettings {
                    backend: args.detector.parse::<DetectorKind>()?,
                    model_path: args.model_path.clone(),
                })?
            };
            let _stage = ui.stage("Analyze scene");
            let outcome = detectors.detect(frame.pixels(), frame.width, frame.height);
            let luma = frame.to_luma();
            pipeline.process(outcome, Some(&luma), frame.captured_at)
        }
        (None, None) => return Err(anyhow!("one of --detections or --image is required")),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.narrative);
    }
    Ok(())
}

fn parse_reference(value: &str) -> Result<ReferenceFrame> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| anyhow!("reference must look like 1920x1080"))?;
    let width: u32 = width.trim().parse().context("invalid reference width")?;
    let height: u32 = height.trim().parse().context("invalid reference height")?;
    if width == 0 || height == 0 {
        return Err(anyhow!("reference resolution must be non-zero"));
    }
    Ok(ReferenceFrame { width, height })
}
