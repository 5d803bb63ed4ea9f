//! Lock-Free Input Queue
//!
//! SPSC queue carrying cursor samples and fixation updates from the input
//! side (pointer polling, eye-tracker callbacks) to the engine worker.
//!
//! Architecture:
//! - Producer: never blocks; if the queue is full the event is dropped and
//!   counted
//! - Consumer: the engine worker, which drains in batches
//!
//! The core ring buffer is `rtrb`; this module adds sequencing and counters.

use super::types::Point;
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default queue capacity (must be power of 2)
pub const DEFAULT_CAPACITY: usize = 1024;

/// Something the engine must react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Cursor position polled at `timestamp_ms`
    Sample { position: Point, timestamp_ms: u64 },
    /// New fixation reported by the eye tracker
    Fixation(Point),
    /// The eye tracker lost or withdrew the fixation
    ClearFixation,
}

/// Queued event with its arrival sequence number
#[derive(Debug, Clone, Copy)]
pub struct QueuedInput {
    pub event: InputEvent,
    pub sequence: u64,
}

/// Queue statistics for monitoring
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total events pushed
    pub events_pushed: AtomicU64,
    /// Events dropped due to a full queue
    pub events_dropped: AtomicU64,
    /// Events popped by the consumer
    pub events_consumed: AtomicU64,
    /// Peak queue occupancy
    pub peak_occupancy: AtomicU64,
}

/// Constructor for the producer/consumer pair
pub struct InputQueue;

impl InputQueue {
    /// Create a queue with the default capacity
    pub fn new() -> (InputProducer, InputConsumer) {
        let (producer, consumer, _) = Self::build(DEFAULT_CAPACITY);
        (producer, consumer)
    }

    /// Create a queue with the given capacity
    ///
    /// The capacity must be a non-zero power of 2.
    pub fn with_capacity(capacity: usize) -> crate::Result<(InputProducer, InputConsumer)> {
        if !capacity.is_power_of_two() {
            return Err(crate::Error::Config(format!(
                "queue_capacity must be a power of 2, got {}",
                capacity
            )));
        }
        let (producer, consumer, _) = Self::build(capacity);
        Ok((producer, consumer))
    }

    fn build(capacity: usize) -> (InputProducer, InputConsumer, Arc<QueueStats>) {
        let (producer, consumer) = RingBuffer::new(capacity);
        let stats = Arc::new(QueueStats::default());
        (
            InputProducer {
                inner: producer,
                sequence: 0,
                stats: Arc::clone(&stats),
                capacity,
            },
            InputConsumer {
                inner: consumer,
                stats: Arc::clone(&stats),
            },
            stats,
        )
    }
}

/// Producer half (input side)
pub struct InputProducer {
    inner: Producer<QueuedInput>,
    sequence: u64,
    stats: Arc<QueueStats>,
    capacity: usize,
}

impl InputProducer {
    /// Push an event. Returns false if the queue was full and the event dropped.
    #[inline]
    pub fn push(&mut self, event: InputEvent) -> bool {
        let queued = QueuedInput {
            event,
            sequence: self.sequence,
        };

        match self.inner.push(queued) {
            Ok(()) => {
                self.sequence += 1;
                self.stats.events_pushed.fetch_add(1, Ordering::Relaxed);

                let occupied = (self.capacity - self.inner.slots()) as u64;
                self.stats
                    .peak_occupancy
                    .fetch_max(occupied, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.stats.events_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Queue a cursor sample
    pub fn push_sample(&mut self, x: i32, y: i32, timestamp_ms: u64) -> bool {
        self.push(InputEvent::Sample {
            position: Point::new(x, y),
            timestamp_ms,
        })
    }

    /// Queue a fixation update
    pub fn set_fixation(&mut self, x: i32, y: i32) -> bool {
        self.push(InputEvent::Fixation(Point::new(x, y)))
    }

    /// Queue a fixation withdrawal
    pub fn clear_fixation(&mut self) -> bool {
        self.push(InputEvent::ClearFixation)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// True once the consumer half has been dropped
    pub fn is_abandoned(&self) -> bool {
        self.inner.is_abandoned()
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Consumer half (engine worker)
pub struct InputConsumer {
    inner: Consumer<QueuedInput>,
    stats: Arc<QueueStats>,
}

impl InputConsumer {
    #[inline]
    pub fn pop(&mut self) -> Option<QueuedInput> {
        match self.inner.pop() {
            Ok(queued) => {
                self.stats.events_consumed.fetch_add(1, Ordering::Relaxed);
                Some(queued)
            }
            Err(_) => None,
        }
    }

    /// Pop up to `max_count` events
    pub fn pop_batch(&mut self, max_count: usize) -> Vec<QueuedInput> {
        let mut batch = Vec::with_capacity(max_count.min(self.inner.slots()));
        while batch.len() < max_count {
            match self.pop() {
                Some(queued) => batch.push(queued),
                None => break,
            }
        }
        batch
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// True once the producer half has been dropped
    pub fn is_abandoned(&self) -> bool {
        self.inner.is_abandoned()
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}
