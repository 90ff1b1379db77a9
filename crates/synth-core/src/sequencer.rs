//! Look-ahead step sequencer.
//!
//! Holds its whole state (`playing`, `current_step`, `next_step_time`) and is
//! advanced only by `tick`, which the host calls every
//! [`SCHEDULER_TICK_MS`](crate::constants::SCHEDULER_TICK_MS). Each tick commits
//! every step whose start falls inside the look-ahead window, so timing is
//! set by the audio clock and not by when the tick happens to run.

use crate::constants::{LOOKAHEAD_SEC, NOTE_OFF_FRACTION, STEPS_PER_BEAT, STEP_COUNT};
use crate::error::{Result, SynthError};
use smallvec::SmallVec;

/// A timed command produced by the sequencer.
#[derive(Clone, Debug, PartialEq)]
pub enum SequencerEvent {
    NoteOn { note: String, time: f64 },
    NoteOff { note: String, time: f64 },
    /// Step `index` begins at `time`; drives the UI step indicator.
    Step { index: usize, time: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridRow {
    pub note: String,
    pub steps: [bool; STEP_COUNT],
}

/// Step duration in seconds: one sixteenth note at `tempo_bpm`.
#[inline]
pub fn step_duration(tempo_bpm: u32) -> f64 {
    (60.0 / tempo_bpm as f64) / STEPS_PER_BEAT
}

pub struct Sequencer {
    rows: Vec<GridRow>,
    tempo_bpm: u32,
    playing: bool,
    current_step: usize,
    next_step_time: f64,
}

impl Sequencer {
    /// Empty grid for `notes`, in row order.
    pub fn new<S: AsRef<str>>(notes: &[S], tempo_bpm: u32) -> Result<Self> {
        let mut seq = Self {
            rows: Vec::with_capacity(notes.len()),
            tempo_bpm: 1,
            playing: false,
            current_step: 0,
            next_step_time: 0.0,
        };
        seq.set_tempo(tempo_bpm)?;
        for note in notes {
            seq.add_row(note.as_ref());
        }
        Ok(seq)
    }

    /// Append a row for `note` unless it already has one.
    pub fn add_row(&mut self, note: &str) {
        if self.row(note).is_none() {
            self.rows.push(GridRow {
                note: note.to_string(),
                steps: [false; STEP_COUNT],
            });
        }
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row(&self, note: &str) -> Option<&GridRow> {
        self.rows.iter().find(|r| r.note == note)
    }

    fn row_mut(&mut self, note: &str, index: usize) -> Result<&mut GridRow> {
        if index >= STEP_COUNT {
            return Err(SynthError::InvalidParameter(format!("step index {index}")));
        }
        self.rows
            .iter_mut()
            .find(|r| r.note == note)
            .ok_or_else(|| SynthError::InvalidParameter(format!("no sequencer row for `{note}`")))
    }

    /// Flip one cell and return its new state.
    pub fn toggle_step(&mut self, note: &str, index: usize) -> Result<bool> {
        let row = self.row_mut(note, index)?;
        row.steps[index] = !row.steps[index];
        log::debug!("[seq] {} step {} -> {}", note, index, row.steps[index]);
        Ok(row.steps[index])
    }

    pub fn set_step(&mut self, note: &str, index: usize, on: bool) -> Result<()> {
        self.row_mut(note, index)?.steps[index] = on;
        Ok(())
    }

    pub fn is_step_on(&self, note: &str, index: usize) -> bool {
        self.row(note)
            .and_then(|r| r.steps.get(index).copied())
            .unwrap_or(false)
    }

    /// Turn every cell off.
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.steps = [false; STEP_COUNT];
        }
    }

    /// Notes whose cell at `index` is on, in row order.
    pub fn notes_at(&self, index: usize) -> SmallVec<[&str; 8]> {
        self.rows
            .iter()
            .filter(|r| r.steps.get(index).copied().unwrap_or(false))
            .map(|r| r.note.as_str())
            .collect()
    }

    pub fn tempo(&self) -> u32 {
        self.tempo_bpm
    }

    /// Takes effect from the next scheduled step; no restart needed.
    pub fn set_tempo(&mut self, bpm: u32) -> Result<()> {
        if bpm == 0 {
            return Err(SynthError::InvalidParameter("tempo must be positive".into()));
        }
        self.tempo_bpm = bpm;
        log::debug!("[seq] tempo {} bpm", bpm);
        Ok(())
    }

    #[inline]
    pub fn step_duration(&self) -> f64 {
        step_duration(self.tempo_bpm)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn next_step_time(&self) -> f64 {
        self.next_step_time
    }

    /// Begin playback with step 0 at audio time `now`. No-op while playing.
    pub fn start(&mut self, now: f64) {
        if self.playing {
            log::debug!("[seq] already playing");
            return;
        }
        self.playing = true;
        self.current_step = 0;
        self.next_step_time = now;
        log::info!("[seq] start at {:.3} ({} bpm)", now, self.tempo_bpm);
    }

    /// Stop scheduling. Notes already committed play out their release.
    pub fn stop(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.current_step = 0;
        log::info!("[seq] stop");
    }

    /// Commit every step that starts before `now + LOOKAHEAD_SEC`.
    pub fn tick(&mut self, now: f64, out: &mut Vec<SequencerEvent>) {
        let horizon = now + LOOKAHEAD_SEC;
        while self.playing && self.next_step_time < horizon {
            let time = self.next_step_time;
            let index = self.current_step;
            let step = self.step_duration();
            for note in self.notes_at(index) {
                out.push(SequencerEvent::NoteOn {
                    note: note.to_string(),
                    time,
                });
                out.push(SequencerEvent::NoteOff {
                    note: note.to_string(),
                    time: time + step * NOTE_OFF_FRACTION,
                });
            }
            out.push(SequencerEvent::Step { index, time });
            self.current_step = (index + 1) % STEP_COUNT;
            self.next_step_time += step;
        }
    }
}
