//! Engine Worker
//!
//! Background thread that drains the input queue into a [`WarpEngine`].
//! Producers (pointer polling, eye-tracker callbacks) never touch the engine
//! directly; everything arrives through the queue in order.

use super::warp_engine::WarpEngine;
use crate::capture::ring_buffer::{InputConsumer, InputEvent};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Largest batch taken from the queue per iteration
const BATCH_SIZE: usize = 64;

/// Idle back-off when the queue is empty
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Summary returned when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub events_processed: u64,
    pub warps: u64,
}

/// Handle to the running worker thread
pub struct EngineWorker {
    thread_handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
    engine: Arc<WarpEngine>,
}

impl EngineWorker {
    /// Spawn the worker on its own thread
    pub fn spawn(engine: Arc<WarpEngine>, consumer: InputConsumer) -> crate::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let processed = Arc::new(AtomicU64::new(0));

        let handle = {
            let engine = Arc::clone(&engine);
            let running = Arc::clone(&running);
            let processed = Arc::clone(&processed);
            thread::Builder::new()
                .name("gaze-warp-engine".into())
                .spawn(move || run_worker_loop(consumer, engine, running, processed))?
        };

        info!("Engine worker started");
        Ok(Self {
            thread_handle: Some(handle),
            running,
            processed,
            engine,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Events handed to the engine so far
    pub fn events_processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Signal the worker, wait for it to drain the queue and join it
    pub fn stop(mut self) -> WorkerReport {
        self.shutdown();
        let report = WorkerReport {
            events_processed: self.processed.load(Ordering::Relaxed),
            warps: self.engine.stats().warps,
        };
        info!(
            events = report.events_processed,
            warps = report.warps,
            "Engine worker stopped"
        );
        report
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("Engine worker panicked");
            }
        }
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn dispatch(engine: &WarpEngine, event: InputEvent) {
    match event {
        InputEvent::Sample {
            position,
            timestamp_ms,
        } => {
            engine.on_sample(position, timestamp_ms);
        }
        InputEvent::Fixation(point) => {
            engine.on_fixation(point);
        }
        InputEvent::ClearFixation => engine.clear_fixation(),
    }
}

/// Main worker loop
///
/// Keeps draining after a stop request until the queue is empty, so every
/// event pushed before `stop` is seen by the engine.
fn run_worker_loop(
    mut consumer: InputConsumer,
    engine: Arc<WarpEngine>,
    running: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
) {
    loop {
        let batch = consumer.pop_batch(BATCH_SIZE);

        if batch.is_empty() {
            let stopping = !running.load(Ordering::SeqCst) || consumer.is_abandoned();
            if stopping && consumer.is_empty() {
                break;
            }
            thread::sleep(IDLE_SLEEP);
            continue;
        }

        for input in &batch {
            dispatch(&engine, input.event);
        }
        processed.fetch_add(batch.len() as u64, Ordering::Relaxed);
    }

    debug!(
        processed = processed.load(Ordering::Relaxed),
        "Engine worker loop exited"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ring_buffer::InputQueue;
    use crate::capture::types::Point;
    use crate::engine::cursor::RecordingSink;
    use crate::engine::warp_engine::EngineSettings;
    use crate::analysis::warp_trigger::WarpThresholds;

    fn engine(sink: RecordingSink) -> Arc<WarpEngine> {
        let settings = EngineSettings {
            thresholds: WarpThresholds::new(10.0, 100.0, 20.0).unwrap(),
            window_size: 10,
        };
        Arc::new(WarpEngine::new(settings, sink).unwrap())
    }

    #[test]
    fn test_worker_drains_queue_into_engine() {
        let sink = RecordingSink::new();
        let engine = engine(sink.clone());
        let (mut producer, consumer) = InputQueue::new();
        let worker = EngineWorker::spawn(Arc::clone(&engine), consumer).unwrap();

        assert!(producer.set_fixation(300, 0));
        for i in 0..10u64 {
            let x = (i as f64 * 100.0 / 9.0).round() as i32;
            assert!(producer.push_sample(x, 0, 1000 + i * 20));
        }

        let report = worker.stop();
        assert_eq!(report.events_processed, 11);
        assert_eq!(report.warps, 1);
        assert_eq!(sink.moves()[0].target, Point::new(200, 0));
    }

    #[test]
    fn test_worker_exits_when_producer_dropped() {
        let sink = RecordingSink::new();
        let engine = engine(sink);
        let (mut producer, consumer) = InputQueue::new();
        let worker = EngineWorker::spawn(Arc::clone(&engine), consumer).unwrap();

        producer.push_sample(5, 5, 10);
        drop(producer);

        let report = worker.stop();
        assert_eq!(report.events_processed, 1);
        assert_eq!(engine.newest_sample().position, Point::new(5, 5));
    }

    #[test]
    fn test_clear_fixation_is_applied_in_order() {
        let sink = RecordingSink::new();
        let engine = engine(sink.clone());
        let (mut producer, consumer) = InputQueue::new();
        let worker = EngineWorker::spawn(Arc::clone(&engine), consumer).unwrap();

        producer.set_fixation(300, 0);
        producer.clear_fixation();
        for i in 0..10u64 {
            let x = (i as f64 * 100.0 / 9.0).round() as i32;
            producer.push_sample(x, 0, 1000 + i * 20);
        }

        worker.stop();
        assert!(sink.is_empty());
        assert_eq!(engine.fixation(), None);
    }
}
