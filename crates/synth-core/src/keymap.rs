//! Computer keyboard → note mapping (two rows, C4 to F5).

use fnv::FnvHashSet;

pub const KEY_MAP: [(&str, &str); 18] = [
    ("a", "C4"),
    ("w", "C#4"),
    ("s", "D4"),
    ("e", "D#4"),
    ("d", "E4"),
    ("f", "F4"),
    ("t", "F#4"),
    ("g", "G4"),
    ("y", "G#4"),
    ("h", "A4"),
    ("u", "A#4"),
    ("j", "B4"),
    ("k", "C5"),
    ("o", "C#5"),
    ("l", "D5"),
    ("p", "D#5"),
    (";", "E5"),
    ("'", "F5"),
];

/// Note played by a `KeyboardEvent.key` value, case-insensitive.
pub fn note_for_key(key: &str) -> Option<&'static str> {
    let key = key.to_lowercase();
    KEY_MAP.iter().find(|(k, _)| *k == key).map(|(_, n)| *n)
}

/// Tracks held notes so auto-repeat keydowns do not retrigger.
#[derive(Default, Debug)]
pub struct PressedKeys {
    held: FnvHashSet<&'static str>,
}

impl PressedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note to start for this keydown, or `None` if unmapped or already held.
    pub fn press(&mut self, key: &str) -> Option<&'static str> {
        let note = note_for_key(key)?;
        self.held.insert(note).then_some(note)
    }

    /// Note to stop for this keyup, if the key is mapped.
    pub fn release(&mut self, key: &str) -> Option<&'static str> {
        let note = note_for_key(key)?;
        self.held.remove(note);
        Some(note)
    }

    pub fn is_held(&self, note: &str) -> bool {
        self.held.contains(note)
    }
}
