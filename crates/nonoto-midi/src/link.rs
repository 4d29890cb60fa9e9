//! Tempo-sync session bridge
//!
//! [`LinkClient`] keeps the transport tempo and a shared tempo session in
//! agreement and reports downbeats. The session itself sits behind
//! [`LinkSession`]; [`LocalSession`] is a single-peer clock that runs in
//! process.

use std::time::{Duration, Instant};

/// Beats per bar used for downbeat detection
pub const LINK_QUANTUM: f64 = 4.0;

/// How long the downbeat indicator stays lit
pub const DOWNBEAT_FLASH: Duration = Duration::from_millis(100);

/// A shared tempo/beat timeline
pub trait LinkSession {
    fn tempo(&self) -> f64;

    /// Change the session tempo at clock time `now` (seconds), keeping the
    /// beat position continuous
    fn set_tempo(&mut self, bpm: f64, now: f64);

    /// Beat position at clock time `now`
    fn beat_at(&self, now: f64) -> f64;

    /// Beat position within the bar, `[0, quantum)`
    fn phase_at(&self, now: f64, quantum: f64) -> f64 {
        self.beat_at(now).rem_euclid(quantum)
    }

    fn num_peers(&self) -> usize {
        0
    }
}

/// In-process session with no peers
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSession {
    tempo: f64,
    /// Beat position at `anchor_time`
    anchor_beat: f64,
    anchor_time: f64,
}

impl LocalSession {
    pub fn new(tempo: f64) -> Self {
        Self {
            tempo,
            anchor_beat: 0.0,
            anchor_time: 0.0,
        }
    }
}

impl Default for LocalSession {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl LinkSession for LocalSession {
    fn tempo(&self) -> f64 {
        self.tempo
    }

    fn set_tempo(&mut self, bpm: f64, now: f64) {
        self.anchor_beat = self.beat_at(now);
        self.anchor_time = now;
        self.tempo = bpm;
    }

    fn beat_at(&self, now: f64) -> f64 {
        self.anchor_beat + (now - self.anchor_time) * self.tempo / 60.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkEvent {
    /// The session tempo changed under us
    Tempo(f64),
    /// A new bar started
    Downbeat,
}

pub struct LinkClient<S: LinkSession = LocalSession> {
    session: S,
    enabled: bool,
    quantum: f64,
    /// Last tempo seen from or pushed to the session
    known_tempo: f64,
    last_phase: Option<f64>,
}

impl<S: LinkSession> LinkClient<S> {
    pub fn new(session: S) -> Self {
        let known_tempo = session.tempo();
        Self {
            session,
            enabled: false,
            quantum: LINK_QUANTUM,
            known_tempo,
            last_phase: None,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        if !self.enabled {
            log::info!("Link: enabled ({} peers)", self.session.num_peers());
        }
        self.enabled = true;
        self.known_tempo = self.session.tempo();
        self.last_phase = None;
    }

    /// Leave the session
    pub fn disable(&mut self) {
        if self.enabled {
            log::info!("Link: disabled");
        }
        self.enabled = false;
        self.last_phase = None;
    }

    /// Push a local tempo change to the session
    ///
    /// Only pushed when it differs from the session tempo, so that a tempo
    /// received from the session is not echoed back. Returns whether it was
    /// pushed.
    pub fn update_bpm(&mut self, bpm: f64, now: f64) -> bool {
        if !self.enabled || self.session.tempo() == bpm {
            return false;
        }
        log::debug!("Link: pushing tempo {:.2}", bpm);
        self.session.set_tempo(bpm, now);
        self.known_tempo = bpm;
        true
    }

    /// Check the session for tempo changes and downbeats
    pub fn poll(&mut self, now: f64) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        if !self.enabled {
            return events;
        }

        let tempo = self.session.tempo();
        if tempo != self.known_tempo {
            log::debug!("Link: session tempo now {:.2}", tempo);
            self.known_tempo = tempo;
            events.push(LinkEvent::Tempo(tempo));
        }

        let phase = self.session.phase_at(now, self.quantum);
        if let Some(last) = self.last_phase {
            if phase < last {
                events.push(LinkEvent::Downbeat);
            }
        }
        self.last_phase = Some(phase);
        events
    }
}

impl Default for LinkClient<LocalSession> {
    fn default() -> Self {
        Self::new(LocalSession::default())
    }
}

/// Debounced downbeat indicator: every trigger restarts the timer
#[derive(Debug, Clone, Copy, Default)]
pub struct DownbeatFlash {
    until: Option<Instant>,
}

impl DownbeatFlash {
    pub fn trigger(&mut self, now: Instant) {
        self.until = Some(now + DOWNBEAT_FLASH);
    }

    pub fn is_lit(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_session_keeps_beat_continuous() {
        let mut session = LocalSession::new(120.0);
        assert_eq!(session.beat_at(1.0), 2.0);
        session.set_tempo(60.0, 1.0);
        assert_eq!(session.beat_at(1.0), 2.0);
        assert_eq!(session.beat_at(3.0), 4.0);
        assert_eq!(session.phase_at(3.0, 4.0), 0.0);
    }

    #[test]
    fn test_update_bpm_is_not_echoed() {
        let mut client = LinkClient::new(LocalSession::new(120.0));
        assert!(!client.update_bpm(100.0, 0.0), "disabled client pushes nothing");

        client.enable();
        assert!(client.update_bpm(100.0, 0.0));
        assert!(!client.update_bpm(100.0, 0.5));
        assert_eq!(client.session().tempo(), 100.0);
        // our own push does not come back as a tempo event
        assert!(client.poll(0.5).iter().all(|e| !matches!(e, LinkEvent::Tempo(_))));
    }

    #[test]
    fn test_downbeats_and_remote_tempo() {
        let mut client = LinkClient::new(LocalSession::new(120.0));
        client.enable();

        // 120 bpm, 4 beats per bar: a bar every 2 s
        let mut downbeats = 0;
        for step in 0..=40 {
            let events = client.poll(step as f64 * 0.125);
            downbeats += events.iter().filter(|e| **e == LinkEvent::Downbeat).count();
        }
        assert_eq!(downbeats, 2);

        client.session.set_tempo(90.0, 5.0);
        assert_eq!(client.poll(5.0).first(), Some(&LinkEvent::Tempo(90.0)));

        client.disable();
        assert!(client.poll(10.0).is_empty());
    }

    #[test]
    fn test_downbeat_flash_restarts() {
        let start = Instant::now();
        let mut flash = DownbeatFlash::default();
        assert!(!flash.is_lit(start));

        flash.trigger(start);
        assert!(flash.is_lit(start + Duration::from_millis(50)));
        flash.trigger(start + Duration::from_millis(80));
        assert!(flash.is_lit(start + Duration::from_millis(150)));
        assert!(!flash.is_lit(start + Duration::from_millis(180)));
    }
}
