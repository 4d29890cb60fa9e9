//! Crossfaded double-buffered audio playback for the spectrogram editor
//!
//! Two players (A and B), each with a sampler sharing its buffer, feed a
//! crossfade. Newly generated audio always goes to the idle side, which is
//! then faded in. Rendering the actual audio is left to the host, which reads
//! [`SpectrogramPlaybackManager::gains_at`] and the player/sampler states.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use thiserror::Error;

use super::CrossFade;
use crate::transport::Transport;

/// Duration of a player switch, in seconds
pub const CROSSFADE_DURATION: f64 = 1.0;

/// Look past any ongoing crossfade when deciding which side is current
pub const CROSSFADE_LOOKAHEAD: f64 = 1.1;

/// Fade-in applied to players and samplers when enabled
pub const FADE_IN_DURATION: f64 = 0.01;

pub const MAX_GAIN: f64 = 1.2;

/// Sampler voices per side in the multichannel variant
pub const NUM_VOICES: usize = 16;

#[derive(Debug, Error)]
pub enum AudioClipError {
    #[error("Failed to decode WAV data: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio clip has no samples")]
    Empty,
}

/// Decoded audio, interleaved `f32` samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioClip {
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, AudioClipError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        if samples.is_empty() {
            return Err(AudioClipError::Empty);
        }
        Ok(Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels.max(1),
            samples,
        })
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// A transport-synced clip player
#[derive(Debug, Clone, Default)]
pub struct Player {
    clip: Option<Arc<AudioClip>>,
    synced: bool,
    /// Start offset within the clip, when started
    started_at: Option<f64>,
    fade_in: f64,
}

impl Player {
    pub fn load(&mut self, clip: Arc<AudioClip>) {
        self.clip = Some(clip);
    }

    pub fn clip(&self) -> Option<&Arc<AudioClip>> {
        self.clip.as_ref()
    }

    pub fn duration(&self) -> f64 {
        self.clip.as_ref().map_or(0.0, |c| c.duration())
    }

    pub fn sync(&mut self) {
        self.synced = true;
    }

    /// Unsyncing drops any scheduled start
    pub fn unsync(&mut self) {
        self.synced = false;
        self.started_at = None;
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn start(&mut self, offset: f64) {
        self.started_at = Some(offset.max(0.0));
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn fade_in(&self) -> f64 {
        self.fade_in
    }

    pub fn set_fade_in(&mut self, seconds: f64) {
        self.fade_in = seconds.max(0.0);
    }
}

/// Keyboard-playable sampler over one clip
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    buffer: Option<Arc<AudioClip>>,
    attack: f64,
    /// Held notes and their velocities
    active: BTreeMap<u8, f32>,
}

impl Sampler {
    pub fn add(&mut self, buffer: Arc<AudioClip>) {
        self.buffer = Some(buffer);
    }

    pub fn buffer(&self) -> Option<&Arc<AudioClip>> {
        self.buffer.as_ref()
    }

    pub fn trigger_attack(&mut self, note: u8, velocity: f32) {
        self.active.insert(note, velocity.clamp(0.0, 1.0));
    }

    pub fn trigger_release(&mut self, note: u8) {
        self.active.remove(&note);
    }

    pub fn release_all(&mut self) {
        self.active.clear();
    }

    pub fn active_notes(&self) -> impl Iterator<Item = (u8, f32)> + '_ {
        self.active.iter().map(|(&n, &v)| (n, v))
    }

    pub fn is_playing(&self, note: u8) -> bool {
        self.active.contains_key(&note)
    }

    pub fn attack(&self) -> f64 {
        self.attack
    }

    pub fn set_attack(&mut self, seconds: f64) {
        self.attack = seconds.max(0.0);
    }
}

#[derive(Debug, Clone)]
pub struct SpectrogramPlaybackManager {
    players: [Player; 2],
    buffers: [Option<Arc<AudioClip>>; 2],
    samplers: [Sampler; 2],
    crossfade: CrossFade,
    gain: f64,
}

impl SpectrogramPlaybackManager {
    /// Create the players and start looping the transport
    pub fn new(transport: &mut Transport) -> Self {
        let mut manager = Self {
            players: [Player::default(), Player::default()],
            buffers: [None, None],
            samplers: [Sampler::default(), Sampler::default()],
            crossfade: CrossFade::new(0.0),
            gain: 1.0,
        };
        manager.players.iter_mut().for_each(Player::sync);
        transport.set_loop(true);
        manager
    }

    /// Side audible once any ongoing crossfade has completed
    pub fn current_player_is_a(&self, now: f64) -> bool {
        self.crossfade.value_at(now + CROSSFADE_LOOKAHEAD) <= 0.5
    }

    pub fn current_index(&self, now: f64) -> usize {
        if self.current_player_is_a(now) {
            0
        } else {
            1
        }
    }

    pub fn next_index(&self, now: f64) -> usize {
        1 - self.current_index(now)
    }

    pub fn player(&self, index: usize) -> &Player {
        &self.players[index]
    }

    pub fn sampler(&self, index: usize) -> &Sampler {
        &self.samplers[index]
    }

    pub fn buffer(&self, index: usize) -> Option<&Arc<AudioClip>> {
        self.buffers[index].as_ref()
    }

    pub fn current_player(&self, now: f64) -> &Player {
        &self.players[self.current_index(now)]
    }

    /// Duration of the current clip in seconds
    pub fn duration(&self, now: f64) -> f64 {
        self.current_player(now).duration()
    }

    pub fn crossfade(&self) -> &CrossFade {
        &self.crossfade
    }

    /// Fade over to the other player
    pub fn switch_players(&mut self, now: f64) {
        let scheduled = self.crossfade.value_at(now + CROSSFADE_LOOKAHEAD);
        let target = (1.0 - scheduled).round();
        self.crossfade.linear_ramp_to(target, now, CROSSFADE_DURATION);
        log::debug!("Playback: crossfading to {}", if target < 0.5 { "A" } else { "B" });
    }

    /// Load a generated clip into the idle side and fade to it
    pub fn load_audio(&mut self, now: f64, clip: AudioClip, transport: &mut Transport) {
        let next = self.next_index(now);
        let clip = Arc::new(clip);
        let duration = clip.duration();

        self.players[next].load(Arc::clone(&clip));
        self.buffers[next] = Some(Arc::clone(&clip));
        self.samplers[next].add(clip);

        // resync to drop previously scheduled starts before restarting
        let player = &mut self.players[next];
        player.unsync();
        player.stop();
        player.sync();

        transport.set_loop_points(0.0, transport.to_quarters(duration));
        self.players[next].start(0.0);

        self.switch_players(now);
        log::info!("Playback: loaded {:.2}s clip into player {}", duration, if next == 0 { "A" } else { "B" });
    }

    /// Notes are played on both samplers so that a switch is seamless
    pub fn key_down(&mut self, note: u8, velocity: f32) {
        self.samplers.iter_mut().for_each(|s| s.trigger_attack(note, velocity));
    }

    pub fn key_up(&mut self, note: u8) {
        self.samplers.iter_mut().for_each(|s| s.trigger_release(note));
    }

    pub fn set_fade_in(&mut self, seconds: f64) {
        self.players.iter_mut().for_each(|p| p.set_fade_in(seconds));
        self.samplers.iter_mut().for_each(|s| s.set_attack(seconds));
    }

    pub fn set_fade_in_enabled(&mut self, enabled: bool) {
        self.set_fade_in(if enabled { FADE_IN_DURATION } else { 0.0 });
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f64) {
        self.gain = gain.clamp(0.0, MAX_GAIN);
    }

    /// Output gains of players A and B at `now`, master gain included
    pub fn gains_at(&self, now: f64) -> [f64; 2] {
        let (a, b) = self.crossfade.gains_at(now);
        [a * self.gain, b * self.gain]
    }
}

/// MIDI channels addressed by a keyboard event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSelection {
    All,
    Single(u8),
    Many(Vec<u8>),
}

/// Spectrogram playback with one sampler voice per MIDI channel
#[derive(Debug, Clone)]
pub struct MultiChannelSpectrogramPlaybackManager {
    inner: SpectrogramPlaybackManager,
    voices: [Vec<Sampler>; 2],
}

impl MultiChannelSpectrogramPlaybackManager {
    pub fn new(transport: &mut Transport) -> Self {
        Self {
            inner: SpectrogramPlaybackManager::new(transport),
            voices: [vec![Sampler::default(); NUM_VOICES], vec![Sampler::default(); NUM_VOICES]],
        }
    }

    pub fn voices(&self, index: usize) -> &[Sampler] {
        &self.voices[index]
    }

    pub fn current_voices(&self, now: f64) -> &[Sampler] {
        &self.voices[self.inner.current_index(now)]
    }

    fn voices_for(&mut self, channels: &ChannelSelection, now: f64) -> Vec<&mut Sampler> {
        let current = self.inner.current_index(now);
        let voices = &mut self.voices[current];
        match channels {
            ChannelSelection::All => voices.iter_mut().collect(),
            ChannelSelection::Single(channel) => (*channel as usize)
                .checked_sub(1)
                .and_then(|i| voices.get_mut(i))
                .into_iter()
                .collect(),
            ChannelSelection::Many(list) => voices
                .iter_mut()
                .enumerate()
                .filter(|(i, _)| list.contains(&(*i as u8 + 1)))
                .map(|(_, v)| v)
                .collect(),
        }
    }

    pub fn key_down(&mut self, channels: &ChannelSelection, note: u8, velocity: f32, now: f64) {
        for voice in self.voices_for(channels, now) {
            voice.trigger_attack(note, velocity);
        }
    }

    pub fn key_up(&mut self, channels: &ChannelSelection, note: u8, now: f64) {
        for voice in self.voices_for(channels, now) {
            voice.trigger_release(note);
        }
    }

    pub fn load_audio(&mut self, now: f64, clip: AudioClip, transport: &mut Transport) {
        self.inner.load_audio(now, clip, transport);
        for (side, voices) in self.voices.iter_mut().enumerate() {
            if let Some(buffer) = self.inner.buffers[side].as_ref() {
                voices.iter_mut().for_each(|v| v.add(Arc::clone(buffer)));
            }
        }
    }

    pub fn set_fade_in(&mut self, seconds: f64) {
        self.inner.set_fade_in(seconds);
        self.voices
            .iter_mut()
            .flat_map(|side| side.iter_mut())
            .for_each(|v| v.set_attack(seconds));
    }

    pub fn set_fade_in_enabled(&mut self, enabled: bool) {
        self.set_fade_in(if enabled { FADE_IN_DURATION } else { 0.0 });
    }
}

impl Deref for MultiChannelSpectrogramPlaybackManager {
    type Target = SpectrogramPlaybackManager;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for MultiChannelSpectrogramPlaybackManager {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(seconds: f64) -> AudioClip {
        AudioClip {
            sample_rate: 100,
            channels: 1,
            samples: vec![0.0; (seconds * 100.0) as usize],
        }
    }

    #[test]
    fn test_wav_decoding() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut bytes, spec).unwrap();
            for _ in 0..8000 {
                writer.write_sample(16384i16).unwrap();
                writer.write_sample(-32768i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        let clip = AudioClip::from_wav_bytes(bytes.get_ref()).unwrap();
        assert_eq!(clip.channels, 2);
        assert_eq!(clip.frames(), 8000);
        assert_eq!(clip.duration(), 1.0);
        assert_eq!(clip.samples[0], 0.5);
        assert_eq!(clip.samples[1], -1.0);

        assert!(AudioClip::from_wav_bytes(b"RIFF").is_err());
    }

    #[test]
    fn test_load_audio_alternates_players() {
        let mut transport = Transport::new(120.0);
        let mut manager = SpectrogramPlaybackManager::new(&mut transport);
        assert!(transport.is_looping());
        assert!(manager.current_player_is_a(0.0));

        manager.load_audio(0.0, clip(4.0), &mut transport);
        // 4 seconds at 120 bpm
        assert_eq!(transport.loop_points(), (0.0, 8.0));
        assert!(manager.player(1).is_started());
        assert!(manager.buffer(1).is_some());
        assert_eq!(manager.current_index(0.0), 1);
        assert_eq!(manager.duration(0.0), 4.0);

        // mid-fade, the lookahead already sees the target side
        let [a, b] = manager.gains_at(0.5);
        assert!(a > 0.0 && b > 0.0);

        manager.load_audio(2.0, clip(2.0), &mut transport);
        assert_eq!(manager.current_index(2.0), 0);
        assert_eq!(manager.player(0).duration(), 2.0);
    }

    #[test]
    fn test_keys_and_fade_in_reach_both_samplers() {
        let mut transport = Transport::new(120.0);
        let mut manager = SpectrogramPlaybackManager::new(&mut transport);
        manager.key_down(60, 0.8);
        assert!(manager.sampler(0).is_playing(60) && manager.sampler(1).is_playing(60));
        manager.key_up(60);
        assert!(!manager.sampler(0).is_playing(60) && !manager.sampler(1).is_playing(60));

        manager.set_fade_in_enabled(true);
        assert_eq!(manager.player(1).fade_in(), FADE_IN_DURATION);
        assert_eq!(manager.sampler(0).attack(), FADE_IN_DURATION);
    }

    #[test]
    fn test_gain_is_clamped() {
        let mut transport = Transport::new(120.0);
        let mut manager = SpectrogramPlaybackManager::new(&mut transport);
        manager.set_gain(3.0);
        assert_eq!(manager.gain(), MAX_GAIN);
        manager.set_gain(-1.0);
        assert_eq!(manager.gains_at(0.0), [0.0, 0.0]);
    }

    #[test]
    fn test_multichannel_routing() {
        let mut transport = Transport::new(120.0);
        let mut manager = MultiChannelSpectrogramPlaybackManager::new(&mut transport);

        manager.key_down(&ChannelSelection::Single(3), 60, 1.0, 0.0);
        assert!(manager.voices(0)[2].is_playing(60));
        assert!(!manager.voices(0)[0].is_playing(60));

        manager.key_down(&ChannelSelection::Many(vec![1, 16]), 62, 1.0, 0.0);
        let playing: Vec<usize> = (0..NUM_VOICES)
            .filter(|&i| manager.voices(0)[i].is_playing(62))
            .collect();
        assert_eq!(playing, vec![0, 15]);

        manager.key_down(&ChannelSelection::Single(17), 64, 1.0, 0.0);
        manager.key_up(&ChannelSelection::All, 60, 0.0);
        assert!(manager.current_voices(0.0).iter().all(|v| !v.is_playing(60) && !v.is_playing(64)));

        manager.load_audio(0.0, clip(1.0), &mut transport);
        assert!(manager.voices(1).iter().all(|v| v.buffer().is_some()));
        manager.set_fade_in_enabled(true);
        assert!(manager.voices(1).iter().all(|v| v.attack() == FADE_IN_DURATION));
    }
}
