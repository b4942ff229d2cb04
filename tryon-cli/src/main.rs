// TryOn preprocessing command line interface
// Runs background removal, mask refinement and pose estimation for one user image

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tryon_core::{SegmentationConfig, TryOnConfig};
use tryon_pose::{extract_keypoints, extract_keypoints_from_dir, KeypointMap, PoseInvoker};
use tryon_seg::{refine_mask_file, HumanSegmenter, MaskPredictor, SegmentationError};

#[derive(Parser)]
#[command(name = "tryon")]
#[command(about = "Virtual try-on preprocessing: segmentation masks and body keypoints", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment, refine, estimate pose and print the keypoint map
    Run {
        /// Fail when no person is detected
        #[arg(long)]
        require_person: bool,

        /// Also write the keypoint map to this file
        #[arg(long)]
        keypoints_out: Option<PathBuf>,
    },

    /// Produce the raw segmentation mask
    Segment {
        /// Input image (defaults to the configured one)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Mask output path
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Threshold a mask and paint its contours
    Refine {
        /// Raw mask (defaults to the configured mask path)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Refined mask output path
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Run the pose estimator and list the JSON files it produced
    Pose,

    /// Extract keypoints from existing pose output
    Keypoints {
        /// Directory with pose JSON files (defaults to the configured one)
        #[arg(long, short)]
        dir: Option<PathBuf>,

        /// Fail when no person is detected
        #[arg(long)]
        require_person: bool,

        /// Also write the keypoint map to this file
        #[arg(long)]
        keypoints_out: Option<PathBuf>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { require_person, keypoints_out } => {
            let map = run_pipeline(&config, require_person).await?;
            emit_keypoints(&map, keypoints_out.as_deref())?;
        }
        Commands::Segment { input, output } => {
            let mut seg = config.segmentation.clone();
            if let Some(input) = input {
                seg.input_image = input;
            }
            if let Some(output) = output {
                seg.mask_path = output;
            }
            segment(seg).await?;
        }
        Commands::Refine { input, output } => {
            let seg = &config.segmentation;
            let input = input.unwrap_or_else(|| seg.mask_path.clone());
            let output = output.unwrap_or_else(|| seg.refined_mask_path.clone());
            let refined = refine_mask_file(&input, &output, seg.threshold, seg.intensity_step)?;
            println!("{} contours painted into {}", refined.contours, output.display());
        }
        Commands::Pose => {
            let files = PoseInvoker::new(config.pose.clone()).run().await?;
            for file in files {
                println!("{}", file.display());
            }
        }
        Commands::Keypoints { dir, require_person, keypoints_out } => {
            let dir = dir.unwrap_or_else(|| config.pose.json_dir.clone());
            let map = keypoints_from_dir(&dir, require_person)?;
            emit_keypoints(&map, keypoints_out.as_deref())?;
        }
        Commands::Config(ConfigCommands::Show) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// RUST_LOG takes precedence; otherwise `--verbose` selects debug
fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// File (or defaults), then `TRYON_*` environment overrides, then validation
fn load_config(path: Option<&Path>) -> anyhow::Result<TryOnConfig> {
    let mut config = match path {
        Some(path) => TryOnConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => TryOnConfig::default(),
    };
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

async fn run_pipeline(config: &TryOnConfig, require_person: bool) -> anyhow::Result<KeypointMap> {
    let seg = config.segmentation.clone();
    segment(seg.clone()).await?;

    let refined = refine_mask_file(&seg.mask_path, &seg.refined_mask_path, seg.threshold, seg.intensity_step)?;
    info!("Refined mask has {} contours", refined.contours);

    let files = PoseInvoker::new(config.pose.clone()).run().await?;
    let map = extract_keypoints(&files)?;
    finish_keypoints(map, require_person)
}

/// Segmentation is CPU bound, so it runs on the blocking pool
async fn segment(config: SegmentationConfig) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let predictor = load_predictor(&config)?;
        let mut segmenter = HumanSegmenter::new(config, predictor);
        segmenter.run()?;
        Ok(())
    })
    .await
    .context("Segmentation task panicked")?
}

#[cfg(feature = "onnx")]
fn load_predictor(config: &SegmentationConfig) -> Result<Box<dyn MaskPredictor>, SegmentationError> {
    Ok(Box::new(tryon_seg::U2NetOnnx::load(&config.weights_path)?))
}

#[cfg(not(feature = "onnx"))]
fn load_predictor(config: &SegmentationConfig) -> Result<Box<dyn MaskPredictor>, SegmentationError> {
    if !config.weights_path.is_file() {
        return Err(SegmentationError::MissingWeights(config.weights_path.clone()));
    }
    Err(SegmentationError::Model(
        "tryon was built without ONNX support, rebuild with `--features onnx`".to_string(),
    ))
}

fn keypoints_from_dir(dir: &Path, require_person: bool) -> anyhow::Result<KeypointMap> {
    let map = extract_keypoints_from_dir(dir)?;
    finish_keypoints(map, require_person)
}

fn finish_keypoints(map: KeypointMap, require_person: bool) -> anyhow::Result<KeypointMap> {
    if require_person {
        return Ok(map.require_person()?);
    }
    if map.is_empty() {
        warn!("No person detected, keypoint map is empty");
    }
    Ok(map)
}

fn emit_keypoints(map: &KeypointMap, out: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = out {
        map.write_json(path)?;
        info!("Keypoints written to {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(map)?);
    Ok(())
}
