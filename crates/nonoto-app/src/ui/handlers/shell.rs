//! Desktop shell handlers: saving generations, drag-out and window close

use std::path::PathBuf;

use iced::{clipboard, window, Task};

use nonoto_core::shell::{save_file, storage_path, DragRequest, StorageDirectory};

use crate::ui::app::NonotoApp;
use crate::ui::message::{Message, ShellMessage};

/// Icon shown for a dragged file
const DRAG_ICON: &str = "icons/drag.svg";

pub fn handle(app: &mut NonotoApp, msg: ShellMessage) -> Task<Message> {
    match msg {
        ShellMessage::SaveGeneration => {
            let Some((file_name, contents)) = latest_generation(app) else {
                app.status = "Nothing to save yet".to_string();
                return Task::none();
            };
            let path = storage_path(&file_name, StorageDirectory::Documents);
            Task::perform(write_file(path, contents), |result| {
                Message::Shell(ShellMessage::Saved(result))
            })
        }
        ShellMessage::Saved(result) => {
            match result {
                Ok(path) => {
                    log::info!("Shell: saved generation to {:?}", path);
                    app.status = format!("Saved to {}", path.display());
                }
                Err(e) => {
                    log::error!("Shell: {}", e);
                    app.status = format!("Save failed: {}", e);
                }
            }
            Task::none()
        }
        ShellMessage::DragOut => {
            let Some((file_name, contents)) = latest_generation(app) else {
                return Task::none();
            };
            let path = storage_path(&file_name, StorageDirectory::Temp);
            Task::perform(write_file(path, contents), |result| {
                Message::Shell(ShellMessage::DragReady(result))
            })
        }
        ShellMessage::DragReady(Ok(file)) => {
            let icon = app
                .resources
                .resolve(DRAG_ICON)
                .as_path()
                .map(PathBuf::from)
                .unwrap_or_default();
            let request = DragRequest { file, icon };
            start_drag(app, request)
        }
        ShellMessage::DragReady(Err(e)) => {
            log::error!("Shell: {}", e);
            app.status = format!("Drag failed: {}", e);
            Task::none()
        }
    }
}

/// Native drag-out is not available, so the file path goes to the clipboard
fn start_drag(app: &mut NonotoApp, request: DragRequest) -> Task<Message> {
    log::info!("Shell: drag requested for {:?} (icon {:?})", request.file, request.icon);
    let path = request.file.display().to_string();
    app.status = format!("Copied {} to the clipboard", path);
    clipboard::write(path)
}

/// File name and bytes of the most recent generation, if any
fn latest_generation(app: &NonotoApp) -> Option<(String, Vec<u8>)> {
    if let Some(sheet) = app.sheet.as_ref() {
        return sheet.midi.clone().map(|bytes| ("generation.mid".to_string(), bytes));
    }
    app.spectrogram
        .as_ref()
        .and_then(|s| s.audio.clone())
        .map(|bytes| ("generation.wav".to_string(), bytes))
}

async fn write_file(path: PathBuf, contents: Vec<u8>) -> Result<PathBuf, String> {
    tokio::task::spawn_blocking(move || save_file(&path, &contents).map(|()| path))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

/// Window close: leave the tempo session and silence MIDI before exiting
pub fn handle_close(app: &mut NonotoApp, id: window::Id) -> Task<Message> {
    log::info!("Shell: window closing");
    app.link.disable();
    app.transport.stop();
    app.midi_output.all_notes_off();
    window::close(id)
}
