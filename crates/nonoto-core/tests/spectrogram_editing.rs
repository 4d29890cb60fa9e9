//! Painting a mask over the spectrogram grid and reacting to the release

use std::sync::{Arc, Mutex};

use nonoto_core::locator::spectrogram::{SpectrogramLocator, SpectrogramRenderParams};
use nonoto_core::locator::{Locator, LocatorState};
use nonoto_core::Size;

fn rendered() -> SpectrogramLocator {
    let mut locator = SpectrogramLocator::new(Size::default());
    locator
        .render(SpectrogramRenderParams {
            rows: 4,
            columns: 8,
            columns_top: 8,
            viewport: Size { width: 800.0, height: 200.0 },
        })
        .unwrap();
    locator
}

#[test]
fn painted_cells_reach_the_release_callback() {
    let mut locator = rendered();
    assert_eq!(locator.state(), LocatorState::Rendered);
    assert_eq!(locator.num_interactive_elements(), 32);

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    locator.register_callback(move |mask| sink.lock().unwrap().push(mask.to_rows()));

    locator.pointer_down(50.0, 25.0);
    locator.pointer_move(150.0, 25.0);
    locator.pointer_move(250.0, 75.0);
    assert!(locator.pointer_up());

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(&received[0][0][..3], &[1, 1, 0]);
    assert_eq!(&received[0][1][..3], &[0, 0, 1]);
}

#[test]
fn release_without_a_selection_is_ignored() {
    let mut locator = rendered();
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    locator.register_callback(move |_| *counter.lock().unwrap() += 1);

    // a release never preceded by a press
    assert!(!locator.pointer_up());

    // a press outside the grid leaves the mask empty
    locator.pointer_down(-10.0, -10.0);
    assert!(!locator.pointer_up());
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn playing_position_highlights_a_column() {
    let mut locator = rendered();
    locator.set_currently_playing_position(0.5);
    assert_eq!(locator.playing_column(), Some(4));
    locator.set_currently_playing_position(1.0);
    assert_eq!(locator.playing_column(), None);
}

#[test]
fn resize_recomputes_geometry_immediately() {
    let mut locator = rendered();
    locator.set_timesteps_top(12);
    locator.container_resized(Size { width: 400.0, height: 100.0 }, std::time::Instant::now());

    let geometry = locator.geometry();
    assert_eq!(geometry.timestep_width, 50.0);
    assert_eq!(geometry.image_width, 600.0);
    assert_eq!(geometry.scroll_steps, 5);
    assert_eq!(geometry.snap_width, 250.0);
    assert!(!geometry.no_scroll);
    assert_eq!(geometry.grid_height, 100.0);
}
