//! Detection event payloads
//!
//! The backend pushes one JSON object per observation:
//! `{"chord": "Am" | "None", "strum_direction": "up" | "down" | null,
//!   "strum_detected": bool, "velocity": number, "thumb_extended": bool}`.
//! `RawDetectionEvent` mirrors that wire shape exactly; `DetectionEvent`
//! is the canonical in-process value after sentinel and sign handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire sentinel the backend sends when no chord sensor is pressed.
const NO_CHORD_SENTINEL: &str = "None";

/// Direction of a strum gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrumDirection {
    Up,
    Down,
}

impl StrumDirection {
    /// Parse the wire representation ("up"/"down"), rejecting anything else.
    pub fn parse(raw: &str) -> Option<StrumDirection> {
        match raw {
            "up" => Some(StrumDirection::Up),
            "down" => Some(StrumDirection::Down),
            _ => None,
        }
    }

    /// The opposite direction (alternating strum patterns).
    pub fn flipped(&self) -> StrumDirection {
        match self {
            StrumDirection::Up => StrumDirection::Down,
            StrumDirection::Down => StrumDirection::Up,
        }
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            StrumDirection::Up => "up",
            StrumDirection::Down => "down",
        }
    }
}

impl fmt::Display for StrumDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A detected chord name.
///
/// Labels may carry a qualifier after a `_` separator (the sensor board
/// reports e.g. `C_maj7`). Display-facing consumers get only the root
/// token; exercise matching compares the full label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChordLabel {
    label: String,
}

impl ChordLabel {
    /// Build a label from a wire token. Returns None for the no-chord
    /// sentinel and for empty strings.
    pub fn parse(raw: &str) -> Option<ChordLabel> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == NO_CHORD_SENTINEL {
            return None;
        }
        Some(ChordLabel {
            label: trimmed.to_string(),
        })
    }

    /// The full label, qualifier included. Used for exercise matching.
    pub fn as_str(&self) -> &str {
        &self.label
    }

    /// The root token shown to the learner (everything before the
    /// qualifier separator).
    pub fn root(&self) -> &str {
        match self.label.split_once('_') {
            Some((root, _)) => root,
            None => &self.label,
        }
    }

    /// The qualifier after the separator, if any.
    pub fn qualifier(&self) -> Option<&str> {
        self.label.split_once('_').map(|(_, qual)| qual)
    }
}

impl fmt::Display for ChordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root())
    }
}

impl From<&str> for ChordLabel {
    fn from(raw: &str) -> Self {
        ChordLabel {
            label: raw.to_string(),
        }
    }
}

/// One JSON frame as pushed by the detection backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetectionEvent {
    #[serde(default)]
    pub chord: Option<String>,
    #[serde(default)]
    pub strum_direction: Option<String>,
    #[serde(default)]
    pub strum_detected: bool,
    #[serde(default)]
    pub velocity: f32,
    #[serde(default)]
    pub thumb_extended: bool,
}

impl RawDetectionEvent {
    /// Convert the wire payload into the canonical event.
    ///
    /// The "None" chord sentinel becomes an absent chord, unrecognized
    /// strum directions are dropped, and the signed smoothed velocity the
    /// device reports is stored as its magnitude (direction already
    /// travels in `strum_direction`).
    pub fn canonicalize(self) -> DetectionEvent {
        let chord = self.chord.as_deref().and_then(ChordLabel::parse);
        let strum_direction = self.strum_direction.as_deref().and_then(StrumDirection::parse);
        DetectionEvent {
            chord,
            strum_direction,
            strum_detected: self.strum_detected,
            velocity: self.velocity.abs(),
            thumb_extended: self.thumb_extended,
        }
    }
}

/// Canonical detection event consumed by exercises and the history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionEvent {
    pub chord: Option<ChordLabel>,
    pub strum_direction: Option<StrumDirection>,
    pub strum_detected: bool,
    pub velocity: f32,
    pub thumb_extended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(chord: Option<&str>, direction: Option<&str>, velocity: f32) -> RawDetectionEvent {
        RawDetectionEvent {
            chord: chord.map(str::to_string),
            strum_direction: direction.map(str::to_string),
            strum_detected: direction.is_some(),
            velocity,
            thumb_extended: false,
        }
    }

    #[test]
    fn test_none_sentinel_clears_chord() {
        let event = raw(Some("None"), None, 0.0).canonicalize();
        assert!(event.chord.is_none());

        let event = raw(None, None, 0.0).canonicalize();
        assert!(event.chord.is_none());

        let event = raw(Some(""), None, 0.0).canonicalize();
        assert!(event.chord.is_none());
    }

    #[test]
    fn test_chord_root_and_qualifier() {
        let label = ChordLabel::parse("C_maj7").unwrap();
        assert_eq!(label.root(), "C");
        assert_eq!(label.qualifier(), Some("maj7"));
        assert_eq!(label.as_str(), "C_maj7");
        assert_eq!(format!("{}", label), "C");

        let plain = ChordLabel::parse("Am").unwrap();
        assert_eq!(plain.root(), "Am");
        assert!(plain.qualifier().is_none());
    }

    #[test]
    fn test_velocity_stored_as_magnitude() {
        let event = raw(None, Some("up"), -0.042).canonicalize();
        assert!(event.velocity > 0.0);
        assert!((event.velocity - 0.042).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_direction_dropped() {
        let event = raw(None, Some("sideways"), 0.1).canonicalize();
        assert!(event.strum_direction.is_none());
    }

    #[test]
    fn test_wire_frame_decodes() {
        let frame = r#"{"chord":"G","strum_direction":"down","strum_detected":true,"velocity":0.08,"thumb_extended":false}"#;
        let raw: RawDetectionEvent = serde_json::from_str(frame).unwrap();
        let event = raw.canonicalize();
        assert_eq!(event.chord, Some(ChordLabel::from("G")));
        assert_eq!(event.strum_direction, Some(StrumDirection::Down));
        assert!(event.strum_detected);
    }

    #[test]
    fn test_missing_fields_default() {
        let raw: RawDetectionEvent = serde_json::from_str(r#"{"chord":"C"}"#).unwrap();
        let event = raw.canonicalize();
        assert_eq!(event.chord, Some(ChordLabel::from("C")));
        assert!(!event.strum_detected);
        assert_eq!(event.velocity, 0.0);
    }
}
