//! Detection event normalizer and bounded chord history
//!
//! Keeps the most-recent-first list of distinct chords the learner has
//! played. The cap and the adjacent-duplicate suppression bound memory
//! regardless of how long a session runs: holding a chord does not create
//! repeated entries, switching away and back does.

use std::collections::VecDeque;

use crate::detection::event::{ChordLabel, DetectionEvent, RawDetectionEvent};

/// Default history capacity when none is configured.
pub const DEFAULT_HISTORY_CAP: usize = 8;

/// Normalizes raw detection payloads and maintains the recent-chord
/// history.
///
/// Events pass through in arrival order; the only transformation beyond
/// canonicalization is the suppression of chords equal to the current
/// history head.
pub struct EventNormalizer {
    history: VecDeque<ChordLabel>,
    cap: usize,
}

impl EventNormalizer {
    /// Create a normalizer with the given history capacity.
    pub fn new(cap: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Create with the default capacity (8 entries).
    pub fn new_default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }

    /// Canonicalize a raw payload and record its chord, if any.
    pub fn normalize(&mut self, raw: RawDetectionEvent) -> DetectionEvent {
        let event = raw.canonicalize();
        self.observe(&event);
        event
    }

    /// Record an already-canonical event's chord, if any.
    ///
    /// A chordless event carries no chord update; it is still useful to
    /// callers for its strum and velocity fields.
    pub fn observe(&mut self, event: &DetectionEvent) {
        if let Some(chord) = &event.chord {
            self.push_chord(chord.clone());
        }
    }

    fn push_chord(&mut self, chord: ChordLabel) {
        if self.history.front() == Some(&chord) {
            return;
        }
        self.history.push_front(chord);
        while self.history.len() > self.cap {
            self.history.pop_back();
        }
    }

    /// The chord most recently recorded, if any.
    pub fn current_chord(&self) -> Option<&ChordLabel> {
        self.history.front()
    }

    /// Recent chords, most recent first.
    pub fn recent_chords(&self) -> Vec<ChordLabel> {
        self.history.iter().cloned().collect()
    }

    /// Recent chord roots for display, most recent first.
    pub fn recent_roots(&self) -> Vec<String> {
        self.history.iter().map(|c| c.root().to_string()).collect()
    }

    /// Drop all recorded history.
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new_default()
    }
}
