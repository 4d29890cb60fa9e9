//! Transport and tempo-sync handlers

use iced::Task;

use nonoto_core::locator::Locator;
use nonoto_core::playback::NoteSink;

use crate::ui::app::NonotoApp;
use crate::ui::message::{Message, TransportMessage};

pub fn handle(app: &mut NonotoApp, msg: TransportMessage) -> Task<Message> {
    match msg {
        TransportMessage::Play => {
            if app.sheet.as_ref().is_some_and(|s| s.midi.is_none()) {
                app.status = "Nothing to play yet".to_string();
                return Task::none();
            }
            app.midi_output
                .program_change(app.instrument.channel(), app.instrument.instrument().program());
            app.transport.start();
            app.status = format!("Playing at {:.0} BPM", app.transport.bpm());
        }
        TransportMessage::Stop => {
            app.transport.stop();
            app.midi_output.all_notes_off();
            if let Some(sheet) = app.sheet.as_mut() {
                sheet.locator.set_currently_playing_position(-1.0);
            }
            app.status = "Stopped".to_string();
        }
        TransportMessage::ToggleLink(enabled) => {
            if enabled {
                app.link.enable();
                app.link.update_bpm(app.transport.bpm(), app.transport.now());
            } else {
                app.link.disable();
            }
        }
    }
    Task::none()
}

/// Push a locally changed tempo to the session
pub fn push_tempo(app: &mut NonotoApp, bpm: f64) {
    if app.link.is_enabled() && app.link.update_bpm(bpm, app.transport.now()) {
        log::debug!("Link: pushed tempo {:.1}", bpm);
    }
}
