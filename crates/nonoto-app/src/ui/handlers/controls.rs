//! Control message handlers: granularity, instrument, pitch, tempo, MIDI
//! output, zoom and spectrogram playback settings

use std::time::Instant;

use iced::Task;

use nonoto_core::locator::{Locator, CALL_TO_ACTION_CELLS};
use nonoto_core::playback::NoteSink;

use super::playback::push_tempo;
use crate::ui::app::NonotoApp;
use crate::ui::message::{ControlMessage, Message};

pub fn handle(app: &mut NonotoApp, msg: ControlMessage) -> Task<Message> {
    use ControlMessage::*;

    match msg {
        NextGranularity => {
            let granularity = app.granularity.select_next();
            if let Some(sheet) = app.sheet.as_mut() {
                sheet.locator.set_granularity(granularity);
            }
            log::debug!("Controls: granularity {} quarters", granularity);
        }
        NextInstrument => {
            let instrument = app.instrument.select_next();
            app.midi_output
                .program_change(app.instrument.channel(), instrument.program());
            app.status = format!("Instrument: {}", instrument.name());
        }
        NextPitch => {
            let options = app.pitch.options();
            let current = options.iter().position(|p| *p == app.pitch.pitch()).unwrap_or(0);
            let next = options[(current + 1) % options.len()];
            app.pitch.set_pitch(next);
        }
        BpmDrag(delta_y) => {
            if let Some(bpm) = app.bpm.drag(delta_y, &mut app.transport) {
                push_tempo(app, bpm);
            }
        }
        SetOctave(octave) => {
            app.pitch.set_octave(octave);
        }
        SelectMidiOutput(name) => match app.midi_output.select(&name) {
            Ok(()) => {
                app.config.midi_output = app.midi_output.current().to_string();
                app.status = format!("MIDI output: {}", app.midi_output.current());
            }
            Err(e) => {
                log::warn!("MIDI: Failed to select {:?}: {}", name, e);
                app.status = format!("MIDI output unavailable: {}", e);
            }
        },
        RefreshMidiOutputs => {
            app.midi_output.refresh_devices();
        }
        ZoomIn => zoom(app, true),
        ZoomOut => zoom(app, false),
        SetGain(gain) => {
            if let Some(spectrogram) = app.spectrogram.as_mut() {
                spectrogram.playback.set_gain(gain);
            }
        }
        ToggleFadeIn(enabled) => {
            app.fade_in = enabled;
            if let Some(spectrogram) = app.spectrogram.as_mut() {
                spectrogram.playback.set_fade_in_enabled(enabled);
            }
        }
        CallToAction => {
            let now = Instant::now();
            let cta = if let Some(sheet) = app.sheet.as_ref() {
                sheet.locator.call_to_action(&mut app.rng, CALL_TO_ACTION_CELLS, now)
            } else if let Some(spectrogram) = app.spectrogram.as_ref() {
                spectrogram.locator.call_to_action(&mut app.rng, CALL_TO_ACTION_CELLS, now)
            } else {
                return Task::none();
            };
            app.call_to_action = Some(cta);
        }
    }
    Task::none()
}

fn zoom(app: &mut NonotoApp, zoom_in: bool) {
    let Some(sheet) = app.sheet.as_mut() else {
        return;
    };
    let result = if zoom_in {
        sheet.locator.zoom_in()
    } else {
        sheet.locator.zoom_out()
    };
    if let Err(e) = result {
        log::warn!("Controls: zoom failed: {}", e);
    }
}
