//! Generation handlers
//!
//! Requests to the generation server are blocking and run through
//! `spawn_blocking`; results come back as `GenerationMessage`s. A failed
//! request is logged and delivered as `None`.

use std::path::PathBuf;

use iced::widget::image;
use iced::Task;

use nonoto_core::config::AnnotationType;
use nonoto_core::generation;
use nonoto_core::locator::sheet::ProportionalLayout;
use nonoto_core::locator::spectrogram::Mask;
use nonoto_core::locator::Locator;
use nonoto_core::playback::{AudioClip, MidiFile};

use crate::ui::app::NonotoApp;
use crate::ui::message::{ControlMessage, GenerationMessage, Message};

/// Endpoint regenerating the masked spectrogram region
const INPAINT_COMMAND: &str = "inpaint";

/// Read a MusicXML score from disk
pub async fn read_score(path: PathBuf) -> Result<String, String> {
    let display = path.display().to_string();
    match tokio::task::spawn_blocking(move || std::fs::read_to_string(&path)).await {
        Ok(Ok(musicxml)) => {
            log::info!("Generation: read score {} ({} bytes)", display, musicxml.len());
            Ok(musicxml)
        }
        Ok(Err(e)) => Err(format!("Failed to read {}: {}", display, e)),
        Err(e) => Err(format!("Failed to read {}: {}", display, e)),
    }
}

/// Run a blocking server call off the UI loop
async fn run_blocking<T, F>(what: &'static str, job: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> generation::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            log::error!("Generation: {} failed: {}", what, e);
            None
        }
        Err(e) => {
            log::error!("Generation: {} task aborted: {}", what, e);
            None
        }
    }
}

pub fn handle(app: &mut NonotoApp, msg: GenerationMessage) -> Task<Message> {
    match msg {
        GenerationMessage::ScoreLoaded(Ok(musicxml)) => install_score(app, musicxml),
        GenerationMessage::ScoreLoaded(Err(e)) => {
            log::error!("Generation: {}", e);
            app.status = e;
            Task::none()
        }
        GenerationMessage::Regenerated(result) => {
            finish_request(app);
            match result {
                Some(musicxml) => install_score(app, musicxml),
                None => {
                    app.status = "Generation failed".to_string();
                    Task::none()
                }
            }
        }
        GenerationMessage::MidiReady(result) => {
            finish_request(app);
            if let Some(bytes) = result {
                load_midi(app, bytes);
            } else {
                app.status = "Could not render the score to MIDI".to_string();
            }
            Task::none()
        }
        GenerationMessage::Inpainted(result) => {
            finish_request(app);
            match result {
                Some(result) => load_inpainting(app, result),
                None => app.status = "Generation failed".to_string(),
            }
            Task::none()
        }
    }
}

fn start_request(app: &mut NonotoApp) {
    app.pending_requests += 1;
    app.status = "Generating...".to_string();
}

fn finish_request(app: &mut NonotoApp) {
    app.pending_requests = app.pending_requests.saturating_sub(1);
}

/// Regenerate the quarters `[start, end)` of the current score
pub fn request_timerange(app: &mut NonotoApp, start: u32, end: u32) -> Task<Message> {
    let Some(musicxml) = app.sheet.as_ref().and_then(|s| s.musicxml.clone()) else {
        return Task::none();
    };
    start_request(app);
    let client = app.client.clone();
    Task::perform(
        run_blocking("timerange-change", move || client.timerange_change(&musicxml, start, end)),
        |result| Message::Generation(GenerationMessage::Regenerated(result)),
    )
}

/// Regenerate the masked region of the spectrogram
pub fn request_inpaint(app: &mut NonotoApp, mask: Mask) -> Task<Message> {
    let Some(codes) = app.spectrogram.as_ref().map(|s| s.codes.clone()) else {
        return Task::none();
    };
    start_request(app);
    let client = app.client.clone();
    Task::perform(
        run_blocking(INPAINT_COMMAND, move || {
            client.inpaint_spectrogram(INPAINT_COMMAND, &mask, &codes)
        }),
        |result| Message::Generation(GenerationMessage::Inpainted(result)),
    )
}

/// Lay out a new score and ask for its MIDI rendering
fn install_score(app: &mut NonotoApp, musicxml: String) -> Task<Message> {
    let Some(sheet) = app.sheet.as_mut() else {
        return Task::none();
    };

    let layout = match ProportionalLayout::from_musicxml(&musicxml) {
        Ok(layout) => layout,
        Err(e) => {
            log::error!("Generation: invalid score: {}", e);
            app.status = format!("Invalid score: {}", e);
            return Task::none();
        }
    };

    let first_score = sheet.musicxml.is_none();
    sheet.locator.load(layout);
    if let Err(e) = sheet.locator.render(()) {
        log::error!("Generation: failed to render score: {}", e);
        app.status = format!("Failed to render score: {}", e);
        return Task::none();
    }
    sheet.locator.set_granularity(app.granularity.value_quarters());
    sheet.musicxml = Some(musicxml.clone());
    app.status = format!(
        "Score loaded: {} quarters",
        sheet.locator.sequence_duration_quarters()
    );

    start_request(app);
    let client = app.client.clone();
    let midi = Task::perform(
        run_blocking("musicxml-to-midi", move || client.musicxml_to_midi(&musicxml)),
        |result| Message::Generation(GenerationMessage::MidiReady(result)),
    );

    if first_score {
        Task::batch([midi, Task::done(Message::Controls(ControlMessage::CallToAction))])
    } else {
        midi
    }
}

fn load_midi(app: &mut NonotoApp, bytes: Vec<u8>) {
    let Some(sheet) = app.sheet.as_mut() else {
        return;
    };
    let midi = match MidiFile::parse(&bytes) {
        Ok(midi) => midi,
        Err(e) => {
            log::error!("Generation: invalid MIDI: {}", e);
            app.status = format!("Invalid MIDI: {}", e);
            return;
        }
    };

    let duration = match sheet.locator.sequence_duration_quarters() {
        d if d > 0.0 => d,
        _ => midi.duration_quarters(),
    };
    if app.config.annotation_types.contains(&AnnotationType::ChordSelector) {
        match chord_channel(midi.tracks.len()) {
            Some(channel) => sheet.playback.enable_chords(channel),
            None => {
                log::warn!(
                    "Generation: {} tracks leave no MIDI channel for chords",
                    midi.tracks.len()
                );
                sheet.playback.disable_chords();
            }
        }
    }
    sheet.playback.load_midi(&mut app.transport, &midi, duration);
    sheet.midi = Some(bytes);
    app.status = "Ready".to_string();
}

/// Chords go on the first channel after the score tracks, if one is left
fn chord_channel(track_count: usize) -> Option<u8> {
    u8::try_from(track_count)
        .ok()
        .and_then(|n| n.checked_add(1))
        .filter(|channel| *channel <= 16)
}

fn load_inpainting(app: &mut NonotoApp, result: generation::InpaintResult) {
    let Some(spectrogram) = app.spectrogram.as_mut() else {
        return;
    };
    match AudioClip::from_wav_bytes(&result.audio) {
        Ok(clip) => {
            let now = app.transport.now();
            spectrogram.playback.load_audio(now, clip, &mut app.transport);
            if !app.transport.is_started() {
                app.transport.start();
            }
        }
        Err(e) => {
            log::error!("Generation: invalid audio: {}", e);
            app.status = format!("Invalid audio: {}", e);
            return;
        }
    }

    spectrogram.locator.load_spectrogram(result.image.clone());
    spectrogram.image = Some(image::Handle::from_bytes(result.image));
    spectrogram.codes = result.codes;
    spectrogram.audio = Some(result.audio);
    spectrogram.locator.clear();
    app.status = "Ready".to_string();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_channel_follows_score_tracks() {
        assert_eq!(chord_channel(0), Some(1));
        assert_eq!(chord_channel(3), Some(4));
        assert_eq!(chord_channel(15), Some(16));
    }

    #[test]
    fn test_chord_channel_none_when_channels_exhausted() {
        assert_eq!(chord_channel(16), None);
        assert_eq!(chord_channel(255), None);
        assert_eq!(chord_channel(300), None);
    }
}
