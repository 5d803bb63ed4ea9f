//! Warp Engine
//!
//! Owns the trajectory window and the current fixation for one pointer, runs
//! the trigger on every sample and emits cursor moves.
//!
//! All state sits behind one mutex. A warp is committed under the lock (the
//! fixation is consumed, the window reset and the engine marked in flight),
//! then the lock is released while the screen is captured and searched, and
//! re-taken only to hand the move to the sink. Fixation updates that arrive
//! while a warp is in flight are dropped; samples are still recorded but not
//! evaluated.

use super::cursor::{CursorMoveCommand, CursorSink};
use crate::analysis::warp_trigger::{evaluate, Decision, WarpThresholds};
use crate::capture::screen::{CaptureRegion, ScreenCapture};
use crate::capture::trajectory_window::{TrajectoryWindow, DEFAULT_WINDOW_SIZE};
use crate::capture::types::{Offset, Point, Sample};
use crate::saliency::SaliencyDetector;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace, warn};

/// Default side of the region captured around a warp target
pub const DEFAULT_CAPTURE_SIZE: u32 = 100;

/// Per-session engine parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub thresholds: WarpThresholds,
    pub window_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            thresholds: WarpThresholds::default(),
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Capture + detector pair used to refine warp targets
pub struct SaliencyRefiner {
    capture: Box<dyn ScreenCapture>,
    detector: Box<dyn SaliencyDetector>,
    capture_size: u32,
}

impl SaliencyRefiner {
    pub fn new(
        capture: impl ScreenCapture + 'static,
        detector: impl SaliencyDetector + 'static,
        capture_size: u32,
    ) -> Self {
        Self {
            capture: Box::new(capture),
            detector: Box::new(detector),
            capture_size,
        }
    }

    /// Offset from `target` to the nearest salient pixel
    pub fn refine(&self, target: Point) -> crate::Result<Offset> {
        let region = CaptureRegion::centered_on(target, self.capture_size);
        let image = self.capture.capture(&region)?;
        self.detector.analyse(&image)
    }
}

/// Engine counters
#[derive(Debug, Default)]
pub struct EngineStats {
    pub samples: AtomicU64,
    pub warps: AtomicU64,
    pub refined: AtomicU64,
    pub refinement_failures: AtomicU64,
    pub fixations_dropped: AtomicU64,
    pub sink_failures: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatsSnapshot {
    pub samples: u64,
    pub warps: u64,
    pub refined: u64,
    pub refinement_failures: u64,
    pub fixations_dropped: u64,
    pub sink_failures: u64,
}

impl EngineStats {
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            samples: self.samples.load(Ordering::Relaxed),
            warps: self.warps.load(Ordering::Relaxed),
            refined: self.refined.load(Ordering::Relaxed),
            refinement_failures: self.refinement_failures.load(Ordering::Relaxed),
            fixations_dropped: self.fixations_dropped.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

struct EngineState {
    window: TrajectoryWindow,
    fixation: Option<Point>,
    in_flight: bool,
    sink: Box<dyn CursorSink>,
}

/// Composition root of the warp kernel
pub struct WarpEngine {
    thresholds: WarpThresholds,
    state: Mutex<EngineState>,
    refiner: Option<SaliencyRefiner>,
    stats: EngineStats,
}

impl WarpEngine {
    /// Create an engine without saliency refinement
    pub fn new(settings: EngineSettings, sink: impl CursorSink + 'static) -> crate::Result<Self> {
        let window = TrajectoryWindow::with_capacity(settings.window_size)?;
        Ok(Self {
            thresholds: settings.thresholds,
            state: Mutex::new(EngineState {
                window,
                fixation: None,
                in_flight: false,
                sink: Box::new(sink),
            }),
            refiner: None,
            stats: EngineStats::default(),
        })
    }

    /// Refine every warp target with the given refiner
    pub fn with_refiner(mut self, refiner: SaliencyRefiner) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn thresholds(&self) -> &WarpThresholds {
        &self.thresholds
    }

    pub fn has_refiner(&self) -> bool {
        self.refiner.is_some()
    }

    /// Current fixation, if any
    pub fn fixation(&self) -> Option<Point> {
        self.state.lock().fixation
    }

    /// Most recent sample in the window
    pub fn newest_sample(&self) -> Sample {
        *self.state.lock().window.newest()
    }

    /// True while a committed warp is being refined or emitted
    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Store a new fixation
    ///
    /// Returns false if it was dropped because a warp is in flight.
    pub fn on_fixation(&self, point: Point) -> bool {
        let mut state = self.state.lock();
        if state.in_flight {
            self.stats.fixations_dropped.fetch_add(1, Ordering::Relaxed);
            debug!(x = point.x, y = point.y, "Fixation dropped while warp in flight");
            return false;
        }
        state.fixation = Some(point);
        trace!(x = point.x, y = point.y, "Fixation set");
        true
    }

    /// Forget the fixation and the trajectory that led toward it
    pub fn clear_fixation(&self) {
        let mut state = self.state.lock();
        state.fixation = None;
        state.window.reset();
        trace!("Fixation cleared");
    }

    /// Record a cursor sample and warp if the trajectory calls for it
    ///
    /// Returns the command handed to the sink, if a warp fired.
    pub fn on_sample(&self, position: Point, timestamp_ms: u64) -> Option<CursorMoveCommand> {
        self.stats.samples.fetch_add(1, Ordering::Relaxed);

        let (target, fixation) = {
            let mut state = self.state.lock();
            state.window.push_position(position, timestamp_ms);

            if state.in_flight {
                return None;
            }

            match evaluate(&state.window, state.fixation, &self.thresholds) {
                Decision::NoOp(reason) => {
                    trace!(?reason, x = position.x, y = position.y, "No warp");
                    return None;
                }
                Decision::Warp(target) => {
                    let fixation = state.fixation.take()?;
                    state.window.reset();
                    state.in_flight = true;
                    (target, fixation)
                }
            }
        };

        let unrefined = target.to_point();
        let offset = self.refine(unrefined);
        let command = CursorMoveCommand {
            target: unrefined.offset_by(offset),
            unrefined,
            offset,
            fixation,
            timestamp_ms,
        };

        let mut state = self.state.lock();
        if let Err(e) = state.sink.move_cursor(&command) {
            self.stats.sink_failures.fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, "Cursor move failed");
        }
        state.in_flight = false;
        drop(state);

        self.stats.warps.fetch_add(1, Ordering::Relaxed);
        info!(
            x = command.target.x,
            y = command.target.y,
            set_radius = target.set_radius,
            dx = offset.dx,
            dy = offset.dy,
            "Warp"
        );
        Some(command)
    }

    /// Saliency offset for a target, or the identity when unavailable
    fn refine(&self, target: Point) -> Offset {
        let refiner = match &self.refiner {
            Some(r) => r,
            None => return Offset::ZERO,
        };

        match refiner.refine(target) {
            Ok(offset) => {
                self.stats.refined.fetch_add(1, Ordering::Relaxed);
                offset
            }
            Err(e) => {
                self.stats.refinement_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, x = target.x, y = target.y, "Saliency refinement skipped");
                Offset::ZERO
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::screen::FrameCapture;
    use crate::engine::cursor::RecordingSink;
    use crate::saliency::VerticalGradientDetector;
    use image::{DynamicImage, GrayImage, Luma};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    struct FailingSink;

    /// Capture that reports entry, then blocks until released
    struct GatedCapture {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl ScreenCapture for GatedCapture {
        fn capture(&self, _region: &CaptureRegion) -> crate::Result<DynamicImage> {
            let _ = self.entered.lock().send(());
            let _ = self.release.lock().recv();
            Err(crate::Error::Capture("screen unavailable".to_string()))
        }
    }

    impl CursorSink for FailingSink {
        fn move_cursor(&mut self, _command: &CursorMoveCommand) -> crate::Result<()> {
            Err(crate::Error::Cursor("no display".to_string()))
        }
    }

    /// Travel gate of 100 px so the approach below fires on its last sample
    fn settings() -> EngineSettings {
        EngineSettings {
            thresholds: WarpThresholds::new(10.0, 100.0, 20.0).unwrap(),
            window_size: 10,
        }
    }

    fn engine(sink: RecordingSink) -> WarpEngine {
        WarpEngine::new(settings(), sink).unwrap()
    }

    /// Feed ten samples from (0,0) to (100,0)
    fn approach(engine: &WarpEngine) -> Option<CursorMoveCommand> {
        let mut last = None;
        for i in 0..10 {
            let x = (f64::from(i) * 100.0 / 9.0).round() as i32;
            if let Some(cmd) = engine.on_sample(Point::new(x, 0), 1000 + i as u64 * 20) {
                last = Some(cmd);
            }
        }
        last
    }

    #[test]
    fn test_rejects_tiny_window() {
        let settings = EngineSettings {
            window_size: 1,
            ..Default::default()
        };
        assert!(WarpEngine::new(settings, RecordingSink::new()).is_err());
    }

    #[test]
    fn test_no_fixation_never_warps() {
        let sink = RecordingSink::new();
        let engine = engine(sink.clone());
        assert!(approach(&engine).is_none());
        assert!(sink.is_empty());
        assert_eq!(engine.stats().samples, 10);
    }

    #[test]
    fn test_warp_emits_move_and_consumes_fixation() {
        let sink = RecordingSink::new();
        let engine = engine(sink.clone());
        assert!(engine.on_fixation(Point::new(300, 0)));

        let cmd = approach(&engine).expect("warp");
        assert_eq!(cmd.target, Point::new(200, 0));
        assert_eq!(cmd.fixation, Point::new(300, 0));
        assert_eq!(cmd.offset, Offset::ZERO);
        assert_eq!(sink.moves(), vec![cmd]);

        assert_eq!(engine.fixation(), None);
        assert!(!engine.is_in_flight());
        assert_eq!(engine.newest_sample().position, Point::ORIGIN);
        assert_eq!(engine.stats().warps, 1);
    }

    #[test]
    fn test_fixation_fires_only_once() {
        let sink = RecordingSink::new();
        let engine = engine(sink.clone());
        engine.on_fixation(Point::new(300, 0));
        approach(&engine);

        // Same motion again without a new fixation
        for i in 0..10 {
            engine.on_sample(Point::new(100 + i * 12, 0), 2000 + i as u64 * 20);
        }
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_clear_fixation_resets_history() {
        let sink = RecordingSink::new();
        let engine = engine(sink.clone());
        engine.on_fixation(Point::new(300, 0));
        for i in 0..9 {
            engine.on_sample(Point::new(i * 11, 0), 1000 + i as u64 * 20);
        }
        engine.clear_fixation();
        assert_eq!(engine.fixation(), None);
        assert_eq!(engine.newest_sample().position, Point::ORIGIN);

        // Travel is measured from the reseeded origin again
        engine.on_fixation(Point::new(300, 0));
        assert!(engine.on_sample(Point::new(60, 0), 2000).is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_home_radius_suppresses_warp() {
        let sink = RecordingSink::new();
        let engine = engine(sink.clone());
        engine.on_fixation(Point::new(90, 0));
        assert!(approach(&engine).is_none());
        // Fixation is kept for later
        assert_eq!(engine.fixation(), Some(Point::new(90, 0)));
    }

    #[test]
    fn test_sink_failure_is_counted_not_fatal() {
        let engine = WarpEngine::new(settings(), FailingSink).unwrap();
        engine.on_fixation(Point::new(300, 0));
        let cmd = approach(&engine);
        assert!(cmd.is_some());
        assert_eq!(engine.stats().sink_failures, 1);
        assert!(!engine.is_in_flight());
    }

    #[test]
    fn test_refinement_moves_target_onto_edge() {
        // Dark screen with a bright band starting at row 203: edge row 202
        let frame = DynamicImage::ImageLuma8(GrayImage::from_fn(400, 400, |_, y| {
            if y == 203 { Luma([255]) } else { Luma([0]) }
        }));
        let sink = RecordingSink::new();
        let engine = engine(sink.clone()).with_refiner(SaliencyRefiner::new(
            FrameCapture::new(frame),
            VerticalGradientDetector::new(),
            40,
        ));
        engine.on_fixation(Point::new(300, 200));

        let mut cmd = None;
        for i in 0..10 {
            let x = (f64::from(i) * 100.0 / 9.0).round() as i32;
            cmd = cmd.or(engine.on_sample(Point::new(x, 200), 1000 + i as u64 * 20));
        }
        let cmd = cmd.expect("warp");
        assert_eq!(cmd.unrefined, Point::new(200, 200));
        assert_eq!(cmd.offset, Offset::new(1, 2));
        assert_eq!(cmd.target, Point::new(201, 202));
        assert_eq!(engine.stats().refined, 1);
    }

    #[test]
    fn test_capture_failure_falls_back_to_unrefined_target() {
        // Frame too small for a region around (200, 0)
        let frame = DynamicImage::ImageLuma8(GrayImage::new(50, 50));
        let sink = RecordingSink::new();
        let engine = engine(sink.clone()).with_refiner(SaliencyRefiner::new(
            FrameCapture::new(frame),
            VerticalGradientDetector::new(),
            40,
        ));
        engine.on_fixation(Point::new(300, 0));

        let cmd = approach(&engine).expect("warp");
        assert_eq!(cmd.target, Point::new(200, 0));
        assert_eq!(cmd.offset, Offset::ZERO);
        assert_eq!(engine.stats().refinement_failures, 1);
    }

    #[test]
    fn test_state_is_free_while_capture_blocks() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let sink = RecordingSink::new();
        let engine = Arc::new(engine(sink.clone()).with_refiner(SaliencyRefiner::new(
            GatedCapture {
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
            },
            VerticalGradientDetector::new(),
            40,
        )));
        engine.on_fixation(Point::new(300, 0));

        for i in 0..9 {
            let x = (f64::from(i) * 100.0 / 9.0).round() as i32;
            assert!(engine.on_sample(Point::new(x, 0), 1000 + i as u64 * 20).is_none());
        }

        let warping = Arc::clone(&engine);
        let handle = std::thread::spawn(move || warping.on_sample(Point::new(100, 0), 1180));

        entered_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("capture started");

        // Capture is running without the state lock held
        assert!(engine.is_in_flight());
        assert_eq!(engine.fixation(), None);
        assert!(!engine.on_fixation(Point::new(500, 0)));
        assert_eq!(engine.stats().fixations_dropped, 1);

        release_tx.send(()).unwrap();
        let cmd = handle.join().unwrap().expect("warp");

        assert_eq!(cmd.target, Point::new(200, 0));
        assert!(!engine.is_in_flight());
        assert_eq!(engine.fixation(), None);
        assert_eq!(sink.len(), 1);
        assert_eq!(engine.stats().refinement_failures, 1);
    }
}
