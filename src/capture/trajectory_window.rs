//! Trajectory Window
//!
//! Fixed-capacity ring of the most recent cursor samples, ordered by arrival.
//!
//! The window always holds exactly `capacity` samples. A fresh (or reset)
//! window is seeded with origin samples stamped `0..capacity`, so the trigger
//! never has to reason about an "insufficient history" state. Until real
//! samples have displaced them, travel is measured from the origin.
//!
//! Timestamps are stored alongside each sample and are kept strictly
//! increasing: a sample that arrives with a timestamp at or before the newest
//! one is restamped to `newest + 1` (saturating: at `u64::MAX` later samples
//! share that timestamp). Ordering is always by arrival, never by
//! timestamp key.

use super::types::{Point, Sample};
use tracing::trace;

/// Default number of samples kept in the window
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Smallest usable window: the trigger needs distinct oldest, second-newest and newest samples
pub const MIN_WINDOW_SIZE: usize = 2;

/// Rolling history of cursor samples
#[derive(Debug, Clone)]
pub struct TrajectoryWindow {
    /// Backing storage, always `capacity` long
    slots: Vec<Sample>,
    /// Index of the oldest sample (the next slot to be overwritten)
    head: usize,
    /// Timestamp of the newest sample
    clock_ms: u64,
}

impl TrajectoryWindow {
    /// Create a window with the default capacity
    pub fn new() -> Self {
        Self::seeded(DEFAULT_WINDOW_SIZE)
    }

    /// Create a window with the given capacity
    ///
    /// Returns a configuration error for capacities below [`MIN_WINDOW_SIZE`].
    pub fn with_capacity(capacity: usize) -> crate::Result<Self> {
        if capacity < MIN_WINDOW_SIZE {
            return Err(crate::Error::Config(format!(
                "window_size must be at least {}, got {}",
                MIN_WINDOW_SIZE, capacity
            )));
        }
        Ok(Self::seeded(capacity))
    }

    fn seeded(capacity: usize) -> Self {
        let mut window = Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            clock_ms: 0,
        };
        window.fill_origin(capacity);
        window
    }

    fn fill_origin(&mut self, capacity: usize) {
        self.slots.clear();
        self.slots
            .extend((0..capacity as u64).map(|t| Sample::new(Point::ORIGIN, t)));
        self.head = 0;
        self.clock_ms = capacity as u64 - 1;
    }

    /// Reseed with origin samples and rewind the clock reference
    pub fn reset(&mut self) {
        let capacity = self.slots.len();
        self.fill_origin(capacity);
    }

    /// Append a sample, evicting the oldest one
    pub fn push(&mut self, sample: Sample) {
        let timestamp_ms = if sample.timestamp_ms > self.clock_ms {
            sample.timestamp_ms
        } else {
            trace!(
                given = sample.timestamp_ms,
                newest = self.clock_ms,
                "Non-increasing sample timestamp restamped"
            );
            self.clock_ms.saturating_add(1)
        };

        self.slots[self.head] = Sample::new(sample.position, timestamp_ms);
        self.head = (self.head + 1) % self.slots.len();
        self.clock_ms = timestamp_ms;
    }

    /// Record a position observed at `timestamp_ms`
    pub fn push_position(&mut self, position: Point, timestamp_ms: u64) {
        self.push(Sample::new(position, timestamp_ms));
    }

    /// Number of samples held (always equal to the capacity)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: the window is seeded on construction
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Sample at arrival position `i` (0 = oldest)
    fn nth(&self, i: usize) -> &Sample {
        &self.slots[(self.head + i) % self.slots.len()]
    }

    /// Oldest resident sample
    pub fn oldest(&self) -> &Sample {
        self.nth(0)
    }

    /// Most recent sample
    pub fn newest(&self) -> &Sample {
        self.nth(self.slots.len() - 1)
    }

    /// Sample pushed just before the newest one
    pub fn second_newest(&self) -> &Sample {
        self.nth(self.slots.len() - 2)
    }

    pub fn second_newest_timestamp(&self) -> u64 {
        self.second_newest().timestamp_ms
    }

    /// Straight-line distance between two samples
    pub fn distance(a: &Sample, b: &Sample) -> f64 {
        a.distance(b)
    }

    /// Distance between the oldest and newest sample
    pub fn travel(&self) -> f64 {
        Self::distance(self.oldest(), self.newest())
    }

    /// Time covered by the window, oldest to newest
    pub fn span_ms(&self) -> u64 {
        self.newest().timestamp_ms - self.oldest().timestamp_ms
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        (0..self.slots.len()).map(move |i| self.nth(i))
    }
}

impl Default for TrajectoryWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps(window: &TrajectoryWindow) -> Vec<u64> {
        window.iter().map(|s| s.timestamp_ms).collect()
    }

    #[test]
    fn test_new_window_is_seeded_at_origin() {
        let window = TrajectoryWindow::new();
        assert_eq!(window.len(), DEFAULT_WINDOW_SIZE);
        assert!(window.iter().all(|s| s.position == Point::ORIGIN));
        assert_eq!(timestamps(&window), (0..10).collect::<Vec<_>>());
        assert_eq!(window.travel(), 0.0);
    }

    #[test]
    fn test_with_capacity_rejects_tiny_windows() {
        assert!(TrajectoryWindow::with_capacity(0).is_err());
        assert!(TrajectoryWindow::with_capacity(1).is_err());
        assert!(TrajectoryWindow::with_capacity(2).is_ok());
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut window = TrajectoryWindow::with_capacity(3).unwrap();
        window.push_position(Point::new(1, 0), 100);
        window.push_position(Point::new(2, 0), 120);
        window.push_position(Point::new(3, 0), 140);
        window.push_position(Point::new(4, 0), 160);

        assert_eq!(window.len(), 3);
        assert_eq!(window.oldest().position, Point::new(2, 0));
        assert_eq!(window.second_newest().position, Point::new(3, 0));
        assert_eq!(window.newest().position, Point::new(4, 0));
        assert_eq!(window.second_newest_timestamp(), 140);
    }

    #[test]
    fn test_partial_fill_keeps_seed_samples_oldest() {
        let mut window = TrajectoryWindow::new();
        window.push_position(Point::new(50, 50), 1000);

        assert_eq!(window.oldest().position, Point::ORIGIN);
        assert_eq!(window.oldest().timestamp_ms, 1);
        assert_eq!(window.newest().position, Point::new(50, 50));
        assert_eq!(window.second_newest().timestamp_ms, 9);
    }

    #[test]
    fn test_duplicate_timestamps_keep_both_samples() {
        let mut window = TrajectoryWindow::with_capacity(4).unwrap();
        window.push_position(Point::new(1, 1), 500);
        window.push_position(Point::new(2, 2), 500);

        assert_eq!(window.len(), 4);
        assert_eq!(window.second_newest().position, Point::new(1, 1));
        assert_eq!(window.newest().position, Point::new(2, 2));
        assert_eq!(window.second_newest_timestamp(), 500);
        assert_eq!(window.newest().timestamp_ms, 501);
    }

    #[test]
    fn test_timestamps_strictly_increasing_after_regression() {
        let mut window = TrajectoryWindow::with_capacity(5).unwrap();
        window.push_position(Point::new(1, 0), 300);
        window.push_position(Point::new(2, 0), 100);
        window.push_position(Point::new(3, 0), 0);

        let ts = timestamps(&window);
        assert!(ts.windows(2).all(|w| w[0] < w[1]), "timestamps: {:?}", ts);
    }

    #[test]
    fn test_reset_reseeds_and_rewinds_clock() {
        let mut window = TrajectoryWindow::with_capacity(4).unwrap();
        for i in 0..6 {
            window.push_position(Point::new(i * 10, i * 10), 1000 + i as u64 * 20);
        }
        window.reset();

        assert_eq!(window.len(), 4);
        assert!(window.iter().all(|s| s.position == Point::ORIGIN));
        assert_eq!(timestamps(&window), vec![0, 1, 2, 3]);

        // Clock reference rewound: an early timestamp is accepted as-is
        window.push_position(Point::new(5, 5), 4);
        assert_eq!(window.newest().timestamp_ms, 4);
    }

    #[test]
    fn test_travel_and_span() {
        let mut window = TrajectoryWindow::with_capacity(3).unwrap();
        window.push_position(Point::new(0, 0), 100);
        window.push_position(Point::new(10, 0), 120);
        window.push_position(Point::new(30, 40), 140);

        assert!((window.travel() - 50.0).abs() < 1e-9);
        assert_eq!(window.span_ms(), 40);
    }

    #[test]
    fn test_iter_wraps_in_arrival_order() {
        let mut window = TrajectoryWindow::with_capacity(3).unwrap();
        for i in 1..=7 {
            window.push_position(Point::new(i, 0), i as u64 * 10);
        }
        let xs: Vec<i32> = window.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![5, 6, 7]);
    }

    #[test]
    fn test_restamp_saturates_at_max_timestamp() {
        let mut window = TrajectoryWindow::with_capacity(3).unwrap();
        window.push_position(Point::new(1, 1), u64::MAX);
        window.push_position(Point::new(2, 2), 5);

        assert_eq!(window.newest().position, Point::new(2, 2));
        assert_eq!(window.newest().timestamp_ms, u64::MAX);
        assert_eq!(window.second_newest_timestamp(), u64::MAX);
    }
}
