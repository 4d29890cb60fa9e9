use std::time::{Duration, Instant};

/// Trailing-edge debounce for container resizes
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl ResizeDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register a resize. Returns true when the refresh should run right away
    /// (zero delay); otherwise the deadline is re-armed.
    pub fn trigger(&mut self, now: Instant) -> bool {
        if self.delay.is_zero() {
            return true;
        }
        self.deadline = Some(now + self.delay);
        false
    }

    /// True once when the armed deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_delay_fires_immediately() {
        let mut debouncer = ResizeDebouncer::new(Duration::ZERO);
        assert!(debouncer.trigger(Instant::now()));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_retrigger_rearms_deadline() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::new(Duration::from_millis(50));
        assert!(!debouncer.trigger(start));
        assert!(!debouncer.trigger(start + Duration::from_millis(40)));
        assert!(!debouncer.poll(start + Duration::from_millis(60)));
        assert!(debouncer.poll(start + Duration::from_millis(90)));
        assert!(!debouncer.poll(start + Duration::from_millis(200)));
    }
}
