// Host-side tests for the look-ahead step sequencer.

use synth_core::{step_duration, Sequencer, SequencerEvent, STEP_COUNT};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn steps(events: &[SequencerEvent]) -> Vec<(usize, f64)> {
    events
        .iter()
        .filter_map(|e| match e {
            SequencerEvent::Step { index, time } => Some((*index, *time)),
            _ => None,
        })
        .collect()
}

#[test]
fn step_duration_is_a_sixteenth() {
    assert!(close(step_duration(120), 0.125));
    assert!(close(step_duration(60), 0.25));
    assert!(close(step_duration(240), 0.0625));
}

#[test]
fn single_cell_schedules_on_and_off_in_one_pass() {
    let mut seq = Sequencer::new(&["C4"], 120).unwrap();
    assert!(seq.toggle_step("C4", 0).unwrap());
    seq.start(0.0);

    let mut out = Vec::new();
    seq.tick(0.0, &mut out);
    assert_eq!(out.len(), 3);
    assert_eq!(
        out[0],
        SequencerEvent::NoteOn {
            note: "C4".into(),
            time: 0.0
        }
    );
    match &out[1] {
        SequencerEvent::NoteOff { note, time } => {
            assert_eq!(note, "C4");
            assert!(close(*time, 0.11875), "note off at {time}");
        }
        other => panic!("expected NoteOff, got {other:?}"),
    }
    assert_eq!(out[2], SequencerEvent::Step { index: 0, time: 0.0 });
    assert_eq!(seq.current_step(), 1);
    assert!(close(seq.next_step_time(), 0.125));
}

#[test]
fn only_steps_inside_lookahead_are_committed() {
    let mut seq = Sequencer::new(&["C4"], 120).unwrap();
    seq.start(1.0);
    let mut out = Vec::new();
    seq.tick(1.0, &mut out);
    assert_eq!(steps(&out), vec![(0, 1.0)]);

    // Same window again: nothing new.
    out.clear();
    seq.tick(1.0, &mut out);
    assert!(out.is_empty());

    // 1.03 + 0.1 reaches past 1.125.
    seq.tick(1.03, &mut out);
    assert_eq!(steps(&out).len(), 1);
    assert!(close(steps(&out)[0].1, 1.125));
}

#[test]
fn cursor_wraps_after_last_step() {
    let mut seq = Sequencer::new(&["C4", "E4"], 120).unwrap();
    seq.start(0.0);
    let mut out = Vec::new();
    // Steps at 0.0 .. 1.0 all start before 1.0 + lookahead.
    seq.tick(1.0, &mut out);
    let indices: Vec<usize> = steps(&out).into_iter().map(|(i, _)| i).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6, 7, 0]);
    assert_eq!(seq.current_step(), 1);
}

#[test]
fn late_tick_catches_up_without_dropping_steps() {
    let mut seq = Sequencer::new(&["G4"], 120).unwrap();
    for i in 0..STEP_COUNT {
        seq.set_step("G4", i, true).unwrap();
    }
    seq.start(0.0);
    let mut out = Vec::new();
    seq.tick(0.4, &mut out);
    let on = out
        .iter()
        .filter(|e| matches!(e, SequencerEvent::NoteOn { .. }))
        .count();
    assert_eq!(on, 4);
}

#[test]
fn events_follow_row_order() {
    let mut seq = Sequencer::new(&["C5", "A4", "C4"], 120).unwrap();
    seq.set_step("C4", 0, true).unwrap();
    seq.set_step("C5", 0, true).unwrap();
    assert_eq!(seq.notes_at(0).as_slice(), ["C5", "C4"]);
    seq.start(0.0);
    let mut out = Vec::new();
    seq.tick(0.0, &mut out);
    let ons: Vec<&str> = out
        .iter()
        .filter_map(|e| match e {
            SequencerEvent::NoteOn { note, .. } => Some(note.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(ons, vec!["C5", "C4"]);
}

#[test]
fn start_while_playing_is_a_no_op() {
    let mut seq = Sequencer::new(&["C4"], 120).unwrap();
    seq.start(0.0);
    let mut out = Vec::new();
    seq.tick(0.0, &mut out);
    seq.start(5.0);
    assert!(seq.is_playing());
    assert_eq!(seq.current_step(), 1);
    assert!(close(seq.next_step_time(), 0.125));
}

#[test]
fn stop_resets_cursor_and_silences_ticks() {
    let mut seq = Sequencer::new(&["C4"], 120).unwrap();
    seq.toggle_step("C4", 2).unwrap();
    seq.start(0.0);
    let mut out = Vec::new();
    seq.tick(0.3, &mut out);
    seq.stop();
    assert!(!seq.is_playing());
    assert_eq!(seq.current_step(), 0);

    out.clear();
    seq.tick(10.0, &mut out);
    assert!(out.is_empty());
    // Grid survives a stop.
    assert!(seq.is_step_on("C4", 2));
}

#[test]
fn tempo_change_applies_from_next_step() {
    let mut seq = Sequencer::new(&["C4"], 120).unwrap();
    seq.start(0.0);
    let mut out = Vec::new();
    seq.tick(0.0, &mut out);
    assert!(close(seq.next_step_time(), 0.125));

    seq.set_tempo(60).unwrap();
    out.clear();
    seq.tick(0.1, &mut out);
    assert_eq!(steps(&out).len(), 1);
    assert!(close(steps(&out)[0].1, 0.125));
    assert!(close(seq.next_step_time(), 0.375));
}

#[test]
fn grid_editing_rules() {
    let mut seq = Sequencer::new(&["C4", "E4"], 120).unwrap();
    assert!(seq.toggle_step("E4", 7).unwrap());
    assert!(!seq.toggle_step("E4", 7).unwrap());
    assert!(seq.toggle_step("E4", STEP_COUNT).is_err());
    assert!(seq.toggle_step("B4", 0).is_err());
    assert!(!seq.is_step_on("B4", 0));

    seq.set_step("C4", 3, true).unwrap();
    seq.add_row("C4");
    assert_eq!(seq.rows().len(), 2);
    seq.clear();
    assert!(!seq.is_step_on("C4", 3));
}

#[test]
fn zero_tempo_is_rejected() {
    assert!(Sequencer::new(&["C4"], 0).is_err());
    let mut seq = Sequencer::new(&["C4"], 90).unwrap();
    assert!(seq.set_tempo(0).is_err());
    assert_eq!(seq.tempo(), 90);
}
