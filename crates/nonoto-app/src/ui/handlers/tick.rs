//! Tick message handler
//!
//! Handles the ~60Hz periodic tick for:
//! - Transport advance and MIDI clock alignment
//! - Score playback scheduling (lookahead) and the MIDI send queue
//! - MIDI keyboard input routing to the spectrogram samplers
//! - Playing-position highlights and debounced locator resizes
//! - Tempo-sync session polling and the downbeat flash
//! - Call-to-action expiry

use std::time::Instant;

use iced::Task;

use nonoto_core::locator::sheet::Chord;
use nonoto_core::locator::spectrogram::SpectrogramLocator;
use nonoto_core::locator::Locator;
use nonoto_core::playback::ChannelSelection;
use nonoto_midi::{KeyEvent, LinkEvent};

use crate::ui::app::NonotoApp;
use crate::ui::message::Message;

/// Handle the tick message (called ~60fps)
pub fn handle(app: &mut NonotoApp) -> Task<Message> {
    let now = Instant::now();
    let dt = now.duration_since(app.last_tick).as_secs_f64();
    app.last_tick = now;

    app.transport.advance(dt);
    let audio_now = app.transport.now();
    let midi_now = app.midi_output.midi_clock_ms();
    app.midi_output.sync_clocks(midi_now, audio_now);

    if let Some(sheet) = app.sheet.as_mut() {
        let chords: Vec<Chord> = sheet
            .locator
            .chord_selectors()
            .iter()
            .map(|selector| selector.chord)
            .collect();
        sheet.playback.schedule(&app.transport, &chords, &mut app.midi_output);
        if app.transport.is_started() {
            sheet.locator.set_currently_playing_position(app.transport.progress());
        }
        sheet.locator.poll_resize(now);
    }

    if let Some(spectrogram) = app.spectrogram.as_mut() {
        // Collect first, the receiver is only drained here
        let key_events: Vec<KeyEvent> = app.key_events.try_iter().collect();
        for event in key_events {
            match event {
                KeyEvent::NoteOn { channel, note, velocity } => {
                    spectrogram
                        .playback
                        .key_down(&ChannelSelection::Single(channel), note, velocity, audio_now);
                }
                KeyEvent::NoteOff { channel, note } => {
                    spectrogram
                        .playback
                        .key_up(&ChannelSelection::Single(channel), note, audio_now);
                }
            }
        }

        if app.transport.is_started() {
            follow_playhead(&mut spectrogram.locator, app.transport.progress());
        }
        spectrogram.locator.poll_resize(now);
    } else {
        // Keyboard input only feeds the samplers
        app.key_events.try_iter().for_each(drop);
    }

    app.midi_output.flush(midi_now);

    for event in app.link.poll(audio_now) {
        match event {
            LinkEvent::Tempo(bpm) => {
                if let Some(applied) = app.bpm.set_value(bpm, &mut app.transport) {
                    log::debug!("Link: session tempo {:.1}, applied {:.1}", bpm, applied);
                }
            }
            LinkEvent::Downbeat => app.downbeat.trigger(now),
        }
    }

    if app.call_to_action.as_ref().is_some_and(|cta| cta.is_finished(now)) {
        app.call_to_action = None;
    }

    Task::none()
}

/// Highlight the column under the playhead and move the grid stepper with it
fn follow_playhead(locator: &mut SpectrogramLocator, progress: f64) {
    locator.set_currently_playing_position(progress);
    if let Some(column) = locator.playing_column() {
        locator.set_position(column);
    }
}
