//! Pointer and resize handlers for the score overlay and the spectrogram grid

use std::time::Instant;

use iced::Task;

use nonoto_core::locator::sheet::DropOutcome;
use nonoto_core::locator::Locator;
use nonoto_widgets::{GridPointer, SheetEvent};

use super::generation;
use crate::ui::app::NonotoApp;
use crate::ui::message::Message;

pub fn handle_sheet(app: &mut NonotoApp, event: SheetEvent) -> Task<Message> {
    let Some(sheet) = app.sheet.as_mut() else {
        return Task::none();
    };

    match event {
        SheetEvent::Select(box_id) => {
            let Some(range) = sheet
                .locator
                .timestamp_box(&box_id)
                .filter(|b| b.active)
                .map(|b| b.contained_quarters.clone())
            else {
                return Task::none();
            };
            return generation::request_timerange(app, range.start, range.end);
        }
        SheetEvent::Drop { source, target } => {
            let Some(payload) = sheet.locator.drag_start(&source) else {
                return Task::none();
            };
            let mut copied = None;
            let outcome = sheet.locator.drop_on(&payload, &target, |from, to| {
                copied = Some((from.id.clone(), to.id.clone()));
            });
            if let (DropOutcome::Accepted, Some((from, to))) = (outcome, copied) {
                sheet.locator.copy_annotations(&from, &to);
                log::debug!("Sheet: copied annotations {} -> {}", from, to);
            } else {
                sheet.locator.drag_leave(&target);
            }
        }
        SheetEvent::DragEnter(box_id) => sheet.locator.drag_enter(&box_id),
        SheetEvent::DragLeave(box_id) => sheet.locator.drag_leave(&box_id),
        SheetEvent::Scroll { increase } => {
            let granularity = app.granularity.step(increase);
            sheet.locator.set_granularity(granularity);
        }
    }
    Task::none()
}

pub fn handle_grid(app: &mut NonotoApp, pointer: GridPointer) -> Task<Message> {
    let Some(spectrogram) = app.spectrogram.as_mut() else {
        return Task::none();
    };

    match pointer {
        GridPointer::Down { x, y } => {
            spectrogram.locator.pointer_down(x, y);
        }
        GridPointer::Move { x, y } => {
            spectrogram.locator.pointer_move(x, y);
        }
        GridPointer::Up => {
            if !spectrogram.locator.pointer_up() {
                return Task::none();
            }
            // The release callback queued the mask
            if let Some(mask) = spectrogram.masks.try_iter().last() {
                return generation::request_inpaint(app, mask);
            }
        }
    }
    Task::none()
}

pub fn handle_resize(app: &mut NonotoApp, size: iced::Size) -> Task<Message> {
    let viewport = NonotoApp::editor_viewport(size);
    let now = Instant::now();
    if let Some(sheet) = app.sheet.as_mut() {
        sheet.locator.container_resized(viewport, now);
    }
    if let Some(spectrogram) = app.spectrogram.as_mut() {
        spectrogram.locator.container_resized(viewport, now);
    }
    Task::none()
}
