use std::time::{Duration, Instant};

/// Default number of highlighted cells
pub const CALL_TO_ACTION_CELLS: usize = 16;

/// Delay between two successive highlights
pub const CALL_TO_ACTION_INTERVAL: Duration = Duration::from_millis(100);

/// Highlight schedule over a set of interactive cells
///
/// Cell `k` lights up `k * interval` after the start. After the last cell,
/// one more interval elapses, then everything stays lit for
/// `4 * interval * count` before being cleared at once.
#[derive(Debug, Clone)]
pub struct CallToAction {
    indexes: Vec<usize>,
    started: Instant,
    interval: Duration,
}

impl CallToAction {
    pub fn new(indexes: Vec<usize>, started: Instant) -> Self {
        Self {
            indexes,
            started,
            interval: CALL_TO_ACTION_INTERVAL,
        }
    }

    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    /// Instant at which every highlight is removed
    pub fn clear_at(&self) -> Instant {
        let count = self.indexes.len() as u32;
        self.started + self.interval * count + self.interval * 4 * count
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now >= self.clear_at()
    }

    /// Cells highlighted at `now` (may contain duplicates)
    pub fn highlighted_at(&self, now: Instant) -> &[usize] {
        if now < self.started || self.is_finished(now) {
            return &[];
        }
        let elapsed = now - self.started;
        let lit = (elapsed.as_millis() / self.interval.as_millis().max(1)) as usize + 1;
        &self.indexes[..lit.min(self.indexes.len())]
    }
}
