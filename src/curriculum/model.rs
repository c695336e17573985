//! Curriculum data model
//!
//! Lessons own an ordered sequence of sublessons; the order is
//! significant, both for in-lesson navigation and for the cross-lesson
//! unlock gating applied by the progression engine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Kind of a sublesson, driving exercise dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SublessonKind {
    Demo,
    Practice,
    Quiz,
    Challenge,
    Freeplay,
}

impl SublessonKind {
    /// Whether this kind carries a gradeable exercise.
    pub fn is_gradeable(&self) -> bool {
        !matches!(self, SublessonKind::Demo | SublessonKind::Freeplay)
    }
}

/// Completion criteria for a gradeable sublesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Minimum correct trials required to pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_correct: Option<u32>,
    /// Number of trials in the exercise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_trials: Option<u32>,
    /// Per-trial time limit in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u64>,
    /// Required accuracy percentage over the exercise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_accuracy: Option<u32>,
}

/// The smallest gradeable unit of curriculum content.
///
/// Carries the original instructional strings: what the learner does
/// (`operation`), what the app shows back (`feedback`), and the passing
/// criterion in prose (`goal`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sublesson {
    pub id: String,
    pub title: String,
    pub operation: String,
    pub feedback: String,
    pub goal: String,
    #[serde(rename = "type")]
    pub kind: SublessonKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CompletionConfig>,
    #[serde(default)]
    pub completed: bool,
}

/// An ordered group of sublessons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub sublessons: Vec<Sublesson>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub progress: f32,
}

impl Lesson {
    /// Look up a sublesson by id.
    pub fn sublesson(&self, sublesson_id: &str) -> Option<&Sublesson> {
        self.sublessons.iter().find(|s| s.id == sublesson_id)
    }

    /// Completion derived from the children: the conjunction over all
    /// sublessons. A lesson with zero sublessons is vacuously complete.
    pub fn derived_completed(&self) -> bool {
        self.sublessons.iter().all(|s| s.completed)
    }

    /// Completed-count over total-count; 1.0 for an empty lesson.
    pub fn derived_progress(&self) -> f32 {
        if self.sublessons.is_empty() {
            return 1.0;
        }
        let done = self.sublessons.iter().filter(|s| s.completed).count();
        done as f32 / self.sublessons.len() as f32
    }
}

/// Ordered sequence of lessons; order defines the unlock gating.
/// Read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    pub lessons: Vec<Lesson>,
}

impl Curriculum {
    /// Look up a lesson by id.
    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    /// Position of a lesson in the unlock order.
    pub fn lesson_index(&self, lesson_id: &str) -> Option<usize> {
        self.lessons.iter().position(|l| l.id == lesson_id)
    }

    /// Total number of sublessons across all lessons.
    pub fn sublesson_count(&self) -> usize {
        self.lessons.iter().map(|l| l.sublessons.len()).sum()
    }

    /// Load a curriculum definition from a JSON file.
    ///
    /// Falls back to the built-in catalog if the file is missing or
    /// invalid; the curriculum is versionable data, not a hard startup
    /// dependency.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(curriculum) => {
                    log::info!("[Curriculum] Loaded curriculum from {:?}", path.as_ref());
                    curriculum
                }
                Err(err) => {
                    log::warn!(
                        "[Curriculum] Failed to parse JSON from {:?}: {}. Using built-in catalog.",
                        path.as_ref(),
                        err
                    );
                    Self::builtin()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Curriculum] Failed to read {:?}: {}. Using built-in catalog.",
                    path.as_ref(),
                    err
                );
                Self::builtin()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(id: &str, completed: bool) -> Sublesson {
        Sublesson {
            id: id.to_string(),
            title: String::new(),
            operation: String::new(),
            feedback: String::new(),
            goal: String::new(),
            kind: SublessonKind::Practice,
            config: None,
            completed,
        }
    }

    #[test]
    fn test_derived_completed_is_conjunction() {
        let lesson = Lesson {
            id: "l".to_string(),
            title: String::new(),
            description: String::new(),
            sublessons: vec![sub("a", true), sub("b", false)],
            completed: false,
            progress: 0.0,
        };
        assert!(!lesson.derived_completed());
        assert!((lesson.derived_progress() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_lesson_is_vacuously_complete() {
        let lesson = Lesson {
            id: "l".to_string(),
            title: String::new(),
            description: String::new(),
            sublessons: vec![],
            completed: false,
            progress: 0.0,
        };
        assert!(lesson.derived_completed());
        assert_eq!(lesson.derived_progress(), 1.0);
    }

    #[test]
    fn test_kind_gradeability() {
        assert!(SublessonKind::Practice.is_gradeable());
        assert!(SublessonKind::Quiz.is_gradeable());
        assert!(SublessonKind::Challenge.is_gradeable());
        assert!(!SublessonKind::Demo.is_gradeable());
        assert!(!SublessonKind::Freeplay.is_gradeable());
    }

    #[test]
    fn test_kind_serde_matches_wire_names() {
        let json = serde_json::to_string(&SublessonKind::Freeplay).unwrap();
        assert_eq!(json, "\"freeplay\"");
        let parsed: SublessonKind = serde_json::from_str("\"challenge\"").unwrap();
        assert_eq!(parsed, SublessonKind::Challenge);
    }

    #[test]
    fn test_curriculum_roundtrip() {
        let curriculum = Curriculum::builtin();
        let json = serde_json::to_string(&curriculum).unwrap();
        let parsed: Curriculum = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.lessons.len(), curriculum.lessons.len());
        assert_eq!(parsed.sublesson_count(), curriculum.sublesson_count());
    }
}
