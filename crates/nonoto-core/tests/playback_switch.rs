//! A/B switching keeps playback going without gaps or doubled notes

use nonoto_core::playback::{MidiFile, MidiTrack, NoteEvent, RecordingSink, SheetPlaybackManager};
use nonoto_core::transport::Transport;

const TICK: f64 = 0.0625;

fn quarters_of(note: u8) -> MidiFile {
    let notes = (0..4)
        .map(|q| NoteEvent {
            time: q as f64,
            note,
            velocity: 0.8,
            duration: 0.5,
        })
        .collect();
    MidiFile {
        tracks: vec![MidiTrack {
            name: None,
            notes,
            pedal: Vec::new(),
        }],
        bpm: 120.0,
        time_signature: Some((4, 4)),
    }
}

fn run(manager: &mut SheetPlaybackManager, transport: &mut Transport, sink: &mut RecordingSink, ticks: usize) {
    for _ in 0..ticks {
        manager.schedule(transport, &[], sink);
        transport.advance(TICK);
    }
}

/// Onsets in half seconds, the quarter grid at 120 bpm
fn onsets(sink: &RecordingSink) -> Vec<(i64, u8)> {
    sink.notes
        .iter()
        .map(|&(_, note, _, at, _)| ((at * 2.0).round() as i64, note))
        .collect()
}

#[test]
fn switching_sets_does_not_interrupt_playback() {
    let mut transport = Transport::new(120.0);
    let mut manager = SheetPlaybackManager::new();
    let mut sink = RecordingSink::default();

    manager.load_midi(&mut transport, &quarters_of(60), 4.0);
    assert_eq!(manager.playing_index(), 0);
    assert_eq!(transport.loop_points(), (0.0, 4.0));
    transport.start();

    // one full loop, plus the downbeat of the next one within the lookahead
    run(&mut manager, &mut transport, &mut sink, 32);
    let first: Vec<_> = onsets(&sink);
    assert_eq!(first, (0..=4).map(|i| (i, 60)).collect::<Vec<_>>());

    manager.load_midi(&mut transport, &quarters_of(72), 4.0);
    assert!(manager.a_is_muted());
    assert_eq!(manager.playing_index(), 1);

    run(&mut manager, &mut transport, &mut sink, 32);
    let all = onsets(&sink);
    let expected: Vec<_> = (0..=8).map(|i| (i, if i <= 4 { 60 } else { 72 })).collect();
    assert_eq!(all, expected);
}

#[test]
fn second_switch_returns_to_the_first_set() {
    let mut transport = Transport::new(120.0);
    let mut manager = SheetPlaybackManager::new();

    manager.load_midi(&mut transport, &quarters_of(60), 4.0);
    manager.load_midi(&mut transport, &quarters_of(62), 4.0);
    manager.load_midi(&mut transport, &quarters_of(64), 4.0);

    assert_eq!(manager.playing_index(), 0);
    assert!(manager.set(1).is_muted());
    let part = &manager.playing().notes[&1];
    assert!(part.events().iter().all(|e| e.note == 64));
}

#[test]
fn stopped_transport_schedules_nothing() {
    let mut transport = Transport::new(120.0);
    let mut manager = SheetPlaybackManager::new();
    let mut sink = RecordingSink::default();

    manager.load_midi(&mut transport, &quarters_of(60), 4.0);
    run(&mut manager, &mut transport, &mut sink, 16);
    assert!(sink.notes.is_empty());

    manager.dispose();
    transport.start();
    run(&mut manager, &mut transport, &mut sink, 16);
    assert!(sink.notes.is_empty());
}
