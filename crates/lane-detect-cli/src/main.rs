//! lane-detect CLI: run the lane pipeline over a directory of frames.

mod frames;
mod overlay;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lane_detect::detect::frame_view_rgb;
use lane_detect::{
    ConfigError, FrameRecord, LaneDetectError, LaneDetectReport, LaneDetector, LaneDetectorParams,
    LaneIoError,
};
use log::{info, warn, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

const PROGRESS_EVERY: usize = 100;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("no frames found in {}", .0.display())]
    NoFrames(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Detect(#[from] LaneDetectError),
    #[error(transparent)]
    LaneIo(#[from] LaneIoError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Encode(#[from] image::ImageError),
}

#[derive(Parser)]
#[command(name = "lane-detect")]
#[command(about = "Detect lane boundaries in road-scene frame sequences")]
#[command(version)]
struct Cli {
    /// Log verbosity.
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every frame in a directory, in file-name order.
    Run(RunArgs),

    /// Write the default detector parameters as JSON.
    InitConfig {
        /// Destination file.
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Directory of input frames (png, jpg, bmp).
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for annotated frames and the default report.
    #[arg(short, long)]
    output: PathBuf,

    /// Detector parameters (JSON). Missing fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report path (default: <output>/lane_report.json).
    #[arg(long)]
    report: Option<PathBuf>,

    /// Do not write annotated frames.
    #[arg(long)]
    no_overlay: bool,

    /// Skip frames the detector rejects instead of aborting.
    #[arg(long)]
    skip_invalid: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let outcome = match cli.command {
        Commands::Run(args) => run(&args),
        Commands::InitConfig { path } => init_config(&path),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_level: LogLevel) {
    lane_detect_core::init_tracing(false);
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LogLevel) {
    let _ = lane_detect_core::init_with_level(level.into());
}

// ── init-config ────────────────────────────────────────────────────────

fn init_config(path: &Path) -> Result<(), CliError> {
    ensure_parent(path)?;
    LaneDetectorParams::default().write_json(path)?;
    info!("default parameters written to {}", path.display());
    Ok(())
}

// ── run ────────────────────────────────────────────────────────────────

fn run(args: &RunArgs) -> Result<(), CliError> {
    let params = match &args.config {
        Some(path) => {
            info!("loading parameters from {}", path.display());
            LaneDetectorParams::load_json(path)?
        }
        None => LaneDetectorParams::default(),
    };
    let mut detector = LaneDetector::new(params.clone())?;

    let frame_paths = frames::list_frames(&args.input)?;
    if frame_paths.is_empty() {
        return Err(CliError::NoFrames(args.input.clone()));
    }
    fs::create_dir_all(&args.output)?;
    let total = frame_paths.len();
    info!("processing {} frames from {}", total, args.input.display());

    let mut records = Vec::with_capacity(total);
    for (idx, path) in frame_paths.iter().enumerate() {
        let img = frames::load_frame(path).map_err(|source| CliError::Image {
            path: path.clone(),
            source,
        })?;
        let name = file_name(path);

        let started = Instant::now();
        let outcome = detector.process(&frame_view_rgb(&img));
        let processing_ms = started.elapsed().as_secs_f64() * 1000.0;

        let result = match outcome {
            Ok(result) => result,
            Err(LaneDetectError::Frame(err)) if args.skip_invalid => {
                warn!("skipping {name}: {err}");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(status) = result.departure.filter(|d| d.is_departing()) {
            warn!("{name}: lane departure {status:?}");
        }
        if !args.no_overlay {
            overlay::render(&img, &result).save(args.output.join(&name))?;
        }
        if (idx + 1) % PROGRESS_EVERY == 0 {
            info!("processed {}/{} frames", idx + 1, total);
        }
        records.push(FrameRecord {
            source: name,
            processing_ms,
            result,
        });
    }

    let config_path = args.config.as_ref().map(|p| p.display().to_string());
    let report = LaneDetectReport::new(config_path, params, records);
    let summary = &report.summary;
    info!(
        "done: {} frames, {:.4} s/frame, {:.1} FPS, left in {} / right in {}, {} departures",
        summary.frames,
        summary.average_seconds_per_frame,
        summary.average_fps,
        summary.left_detected_frames,
        summary.right_detected_frames,
        summary.departures
    );

    let report_path = args
        .report
        .clone()
        .unwrap_or_else(|| args.output.join("lane_report.json"));
    ensure_parent(&report_path)?;
    report.write_json(&report_path)?;
    info!("report written to {}", report_path.display());
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
