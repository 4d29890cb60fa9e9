//! Shared musical clock
//!
//! The transport is the single authority for tempo, loop region and musical
//! position. Positions are counted in quarter notes; the audio clock counts
//! seconds since the transport was created and keeps running while stopped.
//!
//! Everything is tick-driven: the application calls [`Transport::advance`]
//! with the elapsed wall time, and schedulers query [`Transport::spans_between`]
//! to find which musical region a window of audio-clock time will cover.

/// Default tempo before anything sets one
pub const DEFAULT_TRANSPORT_BPM: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Started,
    Stopped,
}

/// A contiguous musical interval reached within a window of audio-clock time
///
/// A window that crosses the loop end yields two spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSpan {
    /// Start position in quarters (inclusive)
    pub start: f64,
    /// End position in quarters (exclusive)
    pub end: f64,
    /// Audio-clock time (seconds) at which `start` is reached
    pub clock_start: f64,
    seconds_per_quarter: f64,
}

impl TransportSpan {
    /// Audio-clock time at which musical position `quarters` is reached
    pub fn clock_at(&self, quarters: f64) -> f64 {
        self.clock_start + (quarters - self.start) * self.seconds_per_quarter
    }

    pub fn contains(&self, quarters: f64) -> bool {
        quarters >= self.start && quarters < self.end
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    bpm: f64,
    time_signature: (u8, u8),
    looping: bool,
    loop_start: f64,
    loop_end: f64,
    position: f64,
    state: TransportState,
    clock: f64,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSPORT_BPM)
    }
}

impl Transport {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            time_signature: (4, 4),
            looping: false,
            loop_start: 0.0,
            loop_end: 0.0,
            position: 0.0,
            state: TransportState::Stopped,
            clock: 0.0,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set the tempo, returning whether it actually changed
    pub fn set_bpm(&mut self, bpm: f64) -> bool {
        if !(bpm.is_finite() && bpm > 0.0) || bpm == self.bpm {
            return false;
        }
        log::debug!("Transport: bpm {} -> {}", self.bpm, bpm);
        self.bpm = bpm;
        true
    }

    pub fn time_signature(&self) -> (u8, u8) {
        self.time_signature
    }

    pub fn set_time_signature(&mut self, numerator: u8, denominator: u8) {
        if numerator > 0 && denominator > 0 {
            self.time_signature = (numerator, denominator);
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
        self.position = self.wrap(self.position);
    }

    /// Loop region in quarters
    pub fn loop_points(&self) -> (f64, f64) {
        (self.loop_start, self.loop_end)
    }

    pub fn set_loop_points(&mut self, start: f64, end: f64) {
        self.loop_start = start.max(0.0);
        self.loop_end = end.max(self.loop_start);
        self.position = self.wrap(self.position);
    }

    pub fn set_loop_end(&mut self, end: f64) {
        self.set_loop_points(self.loop_start, end);
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.state == TransportState::Started
    }

    pub fn start(&mut self) {
        if !self.is_started() {
            log::info!("Transport: start at {:.3}s", self.clock);
            self.state = TransportState::Started;
        }
    }

    /// Stop and rewind to the beginning
    pub fn stop(&mut self) {
        if self.is_started() {
            log::info!("Transport: stop");
        }
        self.state = TransportState::Stopped;
        self.position = 0.0;
    }

    /// Current position in quarters
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn set_position(&mut self, quarters: f64) {
        self.position = self.wrap(quarters.max(0.0));
    }

    /// Audio clock in seconds
    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn seconds_per_quarter(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn to_seconds(&self, quarters: f64) -> f64 {
        quarters * self.seconds_per_quarter()
    }

    pub fn to_quarters(&self, seconds: f64) -> f64 {
        seconds / self.seconds_per_quarter()
    }

    /// Move the audio clock forward by `dt` seconds
    pub fn advance(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        self.clock += dt;
        if self.is_started() {
            self.position = self.wrap(self.position + self.to_quarters(dt));
        }
    }

    /// Position within the loop region, from 0 to 1
    pub fn progress(&self) -> f64 {
        let length = self.loop_end - self.loop_start;
        if !self.looping || length <= 0.0 {
            return 0.0;
        }
        ((self.position - self.loop_start) / length).clamp(0.0, 1.0)
    }

    /// Index of the quarter note currently playing
    pub fn quarters_progress(&self) -> u32 {
        self.position.max(0.0).floor() as u32
    }

    /// Musical intervals covered by the audio-clock window `[t0, t1)`
    ///
    /// Assumes constant tempo over the window. Empty when stopped.
    pub fn spans_between(&self, t0: f64, t1: f64) -> Vec<TransportSpan> {
        let mut spans = Vec::new();
        if !self.is_started() || t1 <= t0 {
            return spans;
        }

        let spq = self.seconds_per_quarter();
        let mut clock = t0;
        let mut quarters = self.wrap(self.position + (t0 - self.clock) / spq);
        let loop_length = self.loop_end - self.loop_start;

        loop {
            let remaining = (t1 - clock) / spq;
            if self.looping && loop_length > 0.0 {
                let to_wrap = self.loop_end - quarters;
                if to_wrap <= 0.0 {
                    quarters = self.loop_start;
                    continue;
                }
                if remaining > to_wrap {
                    spans.push(TransportSpan {
                        start: quarters,
                        end: self.loop_end,
                        clock_start: clock,
                        seconds_per_quarter: spq,
                    });
                    clock += to_wrap * spq;
                    quarters = self.loop_start;
                    continue;
                }
            }
            spans.push(TransportSpan {
                start: quarters,
                end: quarters + remaining,
                clock_start: clock,
                seconds_per_quarter: spq,
            });
            return spans;
        }
    }

    fn wrap(&self, quarters: f64) -> f64 {
        let length = self.loop_end - self.loop_start;
        if self.looping && length > 0.0 && quarters >= self.loop_end {
            self.loop_start + (quarters - self.loop_start).rem_euclid(length)
        } else {
            quarters
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looping_transport(bpm: f64, end: f64) -> Transport {
        let mut transport = Transport::new(bpm);
        transport.set_loop(true);
        transport.set_loop_points(0.0, end);
        transport.start();
        transport
    }

    #[test]
    fn test_set_bpm_reports_change() {
        let mut transport = Transport::new(100.0);
        assert!(!transport.set_bpm(100.0));
        assert!(transport.set_bpm(120.0));
        assert!(!transport.set_bpm(0.0));
        assert_eq!(transport.bpm(), 120.0);
    }

    #[test]
    fn test_advance_wraps_in_loop() {
        // 120 bpm: one quarter every half second
        let mut transport = looping_transport(120.0, 4.0);
        transport.advance(1.5);
        assert!((transport.position() - 3.0).abs() < 1e-9);
        assert_eq!(transport.quarters_progress(), 3);
        assert!((transport.progress() - 0.75).abs() < 1e-9);

        transport.advance(1.0);
        assert!((transport.position() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stopped_transport_keeps_clock_only() {
        let mut transport = Transport::new(120.0);
        transport.advance(2.0);
        assert_eq!(transport.position(), 0.0);
        assert_eq!(transport.now(), 2.0);
        assert!(transport.spans_between(2.0, 3.0).is_empty());
    }

    #[test]
    fn test_spans_split_at_loop_end() {
        let mut transport = looping_transport(120.0, 4.0);
        transport.advance(1.5);

        let now = transport.now();
        let spans = transport.spans_between(now, now + 1.0);
        assert_eq!(spans.len(), 2);
        assert!((spans[0].start - 3.0).abs() < 1e-9);
        assert!((spans[0].end - 4.0).abs() < 1e-9);
        assert!((spans[1].start - 0.0).abs() < 1e-9);
        assert!((spans[1].end - 1.0).abs() < 1e-9);
        assert!((spans[1].clock_start - (now + 0.5)).abs() < 1e-9);
        assert!((spans[1].clock_at(0.5) - (now + 0.75)).abs() < 1e-9);
    }

    #[test]
    fn test_to_seconds() {
        let transport = Transport::new(60.0);
        assert_eq!(transport.to_seconds(2.0), 2.0);
        assert_eq!(transport.to_quarters(3.0), 3.0);
    }
}
