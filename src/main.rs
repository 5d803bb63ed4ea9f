//! Gaze Warp - gaze-assisted pointer warping
//!
//! Offline front end: replays recorded session traces through the engine
//! and runs the saliency detector on screenshots.

use gaze_warp::app::cli::{Cli, Commands, ConfigAction};
use gaze_warp::app::config::Config;
use gaze_warp::capture::ring_buffer::InputQueue;
use gaze_warp::capture::screen::{CaptureRegion, FrameCapture, ScreenCapture};
use gaze_warp::capture::types::Point;
use gaze_warp::engine::{EngineWorker, RecordingSink, SaliencyRefiner, WarpEngine};
use gaze_warp::saliency::{SaliencyDetector, VerticalGradientDetector};
use gaze_warp::workflow::trace::{SessionTrace, TraceEvent};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Replay {
            input,
            screen,
            no_saliency,
            json,
            paced,
        } => {
            let input = Cli::resolve_trace(&input);
            run_replay(&input, screen, no_saliency, json, paced, &config)?;
        }
        Commands::Analyse { image, x, y, size } => {
            run_analyse(&image, x, y, size, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct ReplayOutput<'a> {
    trace: &'a str,
    events: u64,
    moves: Vec<gaze_warp::CursorMoveCommand>,
    stats: gaze_warp::engine::EngineStatsSnapshot,
}

fn run_replay(
    input: &Path,
    screen: Option<PathBuf>,
    no_saliency: bool,
    json: bool,
    paced: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let trace = SessionTrace::load(input)?;
    info!(
        name = %trace.metadata.name,
        events = trace.len(),
        samples = trace.sample_count(),
        "Replaying trace"
    );

    let sink = RecordingSink::new();
    let mut engine = WarpEngine::new(config.engine_settings()?, sink.clone())?;

    match screen {
        Some(path) if config.saliency.enabled && !no_saliency => {
            let capture = FrameCapture::open(&path)?;
            engine = engine.with_refiner(SaliencyRefiner::new(
                capture,
                VerticalGradientDetector::new(),
                config.saliency.capture_size_px,
            ));
        }
        Some(_) => debug!("Saliency refinement disabled"),
        None => {
            if config.saliency.enabled && !no_saliency {
                warn!("No --screen given; warps will not be refined");
            }
        }
    }

    let engine = Arc::new(engine);
    let (mut producer, consumer) = InputQueue::with_capacity(config.worker.queue_capacity)?;
    let worker = EngineWorker::spawn(Arc::clone(&engine), consumer)?;
    let poll_interval = config.poll_interval();
    if paced {
        debug!(interval_ms = config.trajectory.poll_interval_ms, "Pacing samples");
    }

    for event in &trace.events {
        if paced && matches!(event, TraceEvent::Sample { .. }) {
            std::thread::sleep(poll_interval);
        }
        // Back off instead of dropping: a trace is replayed in full
        while producer.is_full() {
            std::thread::sleep(Duration::from_micros(100));
        }
        producer.push((*event).into());
    }
    drop(producer);

    let report = worker.stop();
    let moves = sink.drain();

    if json {
        let output = ReplayOutput {
            trace: &trace.metadata.name,
            events: report.events_processed,
            moves,
            stats: engine.stats(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Replayed '{}': {} events, {} warps",
        trace.metadata.name, report.events_processed, report.warps
    );
    for m in &moves {
        if m.was_refined() {
            println!(
                "  t={:>8}  fixation ({}, {})  ->  ({}, {})  refined from ({}, {}) by ({:+}, {:+})",
                m.timestamp_ms,
                m.fixation.x,
                m.fixation.y,
                m.target.x,
                m.target.y,
                m.unrefined.x,
                m.unrefined.y,
                m.offset.dx,
                m.offset.dy
            );
        } else {
            println!(
                "  t={:>8}  fixation ({}, {})  ->  ({}, {})",
                m.timestamp_ms, m.fixation.x, m.fixation.y, m.target.x, m.target.y
            );
        }
    }

    let stats = engine.stats();
    if stats.refinement_failures > 0 {
        warn!(
            failures = stats.refinement_failures,
            "Some warps fell back to unrefined targets"
        );
    }

    Ok(())
}

fn run_analyse(
    image: &Path,
    x: Option<i32>,
    y: Option<i32>,
    size: Option<u32>,
    config: &Config,
) -> anyhow::Result<()> {
    let capture = FrameCapture::open(image)?;
    let (width, height) = capture.dimensions();

    let center = Point::new(
        x.unwrap_or((width / 2) as i32),
        y.unwrap_or((height / 2) as i32),
    );
    let size = size.unwrap_or(config.saliency.capture_size_px);
    let region = CaptureRegion::centered_on(center, size);

    let detector = VerticalGradientDetector::new();
    let offset = detector.analyse(&capture.capture(&region)?)?;
    let refined = center.offset_by(offset);

    info!(detector = detector.name(), size, "Analysed region");
    println!(
        "Center ({}, {})  offset ({:+}, {:+})  ->  ({}, {})",
        center.x, center.y, offset.dx, offset.dy, refined.x, refined.y
    );
    if offset.is_zero() {
        println!("No salient pixel within {}px", size / 2);
    }

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = config.to_toml()?;
            println!("Configuration ({:?}):\n", Config::default_path());
            println!("{}", toml_str);
        }
        ConfigAction::Path => {
            println!("{}", Config::default_path().display());
        }
    }
    Ok(())
}
