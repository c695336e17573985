//! ProgressTracker: per-session progression engine
//!
//! Tracks completion per sublesson and lesson against an immutable
//! curriculum. Snapshots are the only mutable projection of the
//! curriculum: created on first access as a deep copy, mutated only
//! through `record_outcome`, and exportable for an external store at
//! session end.
//!
//! Unlock invariant: lesson i (i > 0) is accessible only once the
//! snapshot of lesson i-1 is completed. Lesson 0 is always accessible.
//! Completion is monotonic: once a sublesson is marked complete it is
//! never reset by the engine; a retry can only re-confirm it.

use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::curriculum::{Curriculum, Lesson, Sublesson};
use crate::error::CurriculumError;

/// Mutable completion state of one sublesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SublessonProgress {
    pub sublesson_id: String,
    pub completed: bool,
}

/// Mutable completion state of one lesson: the per-session copy of the
/// curriculum entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    pub completed: bool,
    pub sublessons: Vec<SublessonProgress>,
}

impl LessonProgress {
    fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            lesson_id: lesson.id.clone(),
            completed: lesson.derived_completed(),
            sublessons: lesson
                .sublessons
                .iter()
                .map(|s| SublessonProgress {
                    sublesson_id: s.id.clone(),
                    completed: s.completed,
                })
                .collect(),
        }
    }

    /// Completed-count over total-count; 1.0 for an empty lesson.
    pub fn progress_ratio(&self) -> f32 {
        if self.sublessons.is_empty() {
            return 1.0;
        }
        let done = self.sublessons.iter().filter(|s| s.completed).count();
        done as f32 / self.sublessons.len() as f32
    }

    fn recompute_completed(&mut self) {
        self.completed = self.sublessons.iter().all(|s| s.completed);
    }
}

/// Result of recording an exercise outcome.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    pub lesson_id: String,
    pub sublesson_id: String,
    pub score: u32,
    pub required: u32,
    pub passed: bool,
    /// The sublesson flipped from incomplete to complete on this call
    pub newly_completed: bool,
    /// Owning lesson's completion after recomputation
    pub lesson_completed: bool,
}

/// The progression engine.
pub struct ProgressTracker {
    curriculum: Arc<Curriculum>,
    snapshots: HashMap<String, LessonProgress>,
}

impl ProgressTracker {
    pub fn new(curriculum: Arc<Curriculum>) -> Self {
        Self {
            curriculum,
            snapshots: HashMap::new(),
        }
    }

    /// The immutable curriculum this tracker grades against.
    pub fn curriculum(&self) -> &Arc<Curriculum> {
        &self.curriculum
    }

    fn lesson(&self, lesson_id: &str) -> Result<&Lesson, CurriculumError> {
        self.curriculum
            .lesson(lesson_id)
            .ok_or_else(|| CurriculumError::UnknownLesson {
                lesson_id: lesson_id.to_string(),
            })
    }

    /// Current progress for a lesson; the snapshot is created from the
    /// pristine curriculum copy on first access.
    pub fn snapshot(&mut self, lesson_id: &str) -> Result<&LessonProgress, CurriculumError> {
        let curriculum = Arc::clone(&self.curriculum);
        let lesson =
            curriculum
                .lesson(lesson_id)
                .ok_or_else(|| CurriculumError::UnknownLesson {
                    lesson_id: lesson_id.to_string(),
                })?;
        let entry = self
            .snapshots
            .entry(lesson_id.to_string())
            .or_insert_with(|| LessonProgress::from_lesson(lesson));
        Ok(entry)
    }

    /// Completion of a lesson without forcing snapshot creation.
    fn lesson_completed(&self, lesson: &Lesson) -> bool {
        match self.snapshots.get(&lesson.id) {
            Some(snapshot) => snapshot.completed,
            None => lesson.derived_completed(),
        }
    }

    /// Whether the lesson at `index` is locked.
    ///
    /// Index 0 is always accessible; anything past the end of the
    /// curriculum is locked.
    pub fn is_locked(&self, index: usize) -> bool {
        if index == 0 {
            return false;
        }
        match self.curriculum.lessons.get(index - 1) {
            Some(previous) => !self.lesson_completed(previous),
            None => true,
        }
    }

    /// Record an exercise outcome for a sublesson.
    ///
    /// Marks the sublesson complete iff `score >= required`. A failing
    /// score leaves prior state untouched: no partial credit, no penalty,
    /// and a previously earned completion is never reset. After any mark,
    /// the owning lesson's completion is recomputed as the conjunction of
    /// its sublessons.
    pub fn record_outcome(
        &mut self,
        lesson_id: &str,
        sublesson_id: &str,
        score: u32,
        required: u32,
    ) -> Result<OutcomeRecord, CurriculumError> {
        // Validate the sublesson against the curriculum before touching
        // the snapshot.
        let curriculum = Arc::clone(&self.curriculum);
        let lesson =
            curriculum
                .lesson(lesson_id)
                .ok_or_else(|| CurriculumError::UnknownLesson {
                    lesson_id: lesson_id.to_string(),
                })?;
        if lesson.sublesson(sublesson_id).is_none() {
            return Err(CurriculumError::UnknownSublesson {
                sublesson_id: sublesson_id.to_string(),
            });
        }

        let snapshot = self
            .snapshots
            .entry(lesson_id.to_string())
            .or_insert_with(|| LessonProgress::from_lesson(lesson));

        let passed = score >= required;
        let mut newly_completed = false;
        if passed {
            if let Some(entry) = snapshot
                .sublessons
                .iter_mut()
                .find(|s| s.sublesson_id == sublesson_id)
            {
                if !entry.completed {
                    entry.completed = true;
                    newly_completed = true;
                }
            }
            snapshot.recompute_completed();
        }

        let record = OutcomeRecord {
            lesson_id: lesson_id.to_string(),
            sublesson_id: sublesson_id.to_string(),
            score,
            required,
            passed,
            newly_completed,
            lesson_completed: snapshot.completed,
        };
        info!(
            "[ProgressTracker] Outcome {}/{}: score {}/{} -> passed={} lesson_completed={}",
            lesson_id, sublesson_id, score, required, passed, record.lesson_completed
        );
        Ok(record)
    }

    /// The sublesson to present on entering a lesson: the first
    /// incomplete one, or the first sublesson when everything is complete
    /// (re-entry for review). None for an empty lesson.
    pub fn next_sublesson(&self, lesson_id: &str) -> Result<Option<&Sublesson>, CurriculumError> {
        let lesson = self.lesson(lesson_id)?;
        let next_id: Option<String> = match self.snapshots.get(lesson_id) {
            Some(snapshot) => snapshot
                .sublessons
                .iter()
                .find(|s| !s.completed)
                .map(|s| s.sublesson_id.clone())
                .or_else(|| snapshot.sublessons.first().map(|s| s.sublesson_id.clone())),
            None => lesson
                .sublessons
                .iter()
                .find(|s| !s.completed)
                .map(|s| s.id.clone())
                .or_else(|| lesson.sublessons.first().map(|s| s.id.clone())),
        };
        Ok(next_id.and_then(move |id| lesson.sublesson(&id)))
    }

    /// Aggregate completion ratio across all sublessons in the
    /// curriculum.
    pub fn mastery(&self) -> f32 {
        let total = self.curriculum.sublesson_count();
        if total == 0 {
            return 1.0;
        }
        let done: usize = self
            .curriculum
            .lessons
            .iter()
            .map(|lesson| match self.snapshots.get(&lesson.id) {
                Some(snapshot) => snapshot.sublessons.iter().filter(|s| s.completed).count(),
                None => lesson.sublessons.iter().filter(|s| s.completed).count(),
            })
            .sum();
        done as f32 / total as f32
    }

    /// Export the snapshot map for the external store.
    pub fn export(&self) -> HashMap<String, LessonProgress> {
        self.snapshots.clone()
    }

    /// Restore snapshots from the external store. Entries for lessons no
    /// longer in the curriculum are dropped.
    pub fn restore(&mut self, snapshots: HashMap<String, LessonProgress>) {
        self.snapshots = snapshots
            .into_iter()
            .filter(|(lesson_id, _)| self.curriculum.lesson(lesson_id).is_some())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::{CompletionConfig, SublessonKind};

    fn two_lesson_curriculum() -> Arc<Curriculum> {
        let make_sub = |id: &str| crate::curriculum::Sublesson {
            id: id.to_string(),
            title: String::new(),
            operation: String::new(),
            feedback: String::new(),
            goal: String::new(),
            kind: SublessonKind::Quiz,
            config: Some(CompletionConfig {
                min_correct: Some(1),
                total_trials: Some(2),
                ..CompletionConfig::default()
            }),
            completed: false,
        };
        Arc::new(Curriculum {
            lessons: vec![
                Lesson {
                    id: "a".to_string(),
                    title: String::new(),
                    description: String::new(),
                    sublessons: vec![make_sub("a.1"), make_sub("a.2")],
                    completed: false,
                    progress: 0.0,
                },
                Lesson {
                    id: "b".to_string(),
                    title: String::new(),
                    description: String::new(),
                    sublessons: vec![make_sub("b.1")],
                    completed: false,
                    progress: 0.0,
                },
            ],
        })
    }

    #[test]
    fn test_first_lesson_never_locked() {
        let tracker = ProgressTracker::new(two_lesson_curriculum());
        assert!(!tracker.is_locked(0));
        assert!(tracker.is_locked(1));
        assert!(tracker.is_locked(99));
    }

    #[test]
    fn test_lock_mirrors_predecessor_completion() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        tracker.record_outcome("a", "a.1", 2, 1).unwrap();
        assert!(tracker.is_locked(1));
        let record = tracker.record_outcome("a", "a.2", 1, 1).unwrap();
        assert!(record.lesson_completed);
        assert!(!tracker.is_locked(1));

        // Lock state is exactly the negation of the predecessor's
        // completion.
        let completed = tracker.snapshot("a").unwrap().completed;
        assert_eq!(tracker.is_locked(1), !completed);
    }

    #[test]
    fn test_failing_score_leaves_state_untouched() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        let record = tracker.record_outcome("a", "a.1", 0, 1).unwrap();
        assert!(!record.passed);
        assert!(!record.newly_completed);
        let snapshot = tracker.snapshot("a").unwrap();
        assert!(!snapshot.sublessons[0].completed);
    }

    #[test]
    fn test_completion_is_monotonic() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        tracker.record_outcome("a", "a.1", 2, 1).unwrap();
        // A later, failing attempt cannot reset the earlier pass.
        let record = tracker.record_outcome("a", "a.1", 0, 1).unwrap();
        assert!(!record.passed);
        assert!(tracker.snapshot("a").unwrap().sublessons[0].completed);
    }

    #[test]
    fn test_record_outcome_idempotent_on_repeat_pass() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        let first = tracker.record_outcome("a", "a.1", 1, 1).unwrap();
        assert!(first.newly_completed);
        let again = tracker.record_outcome("a", "a.1", 1, 1).unwrap();
        assert!(again.passed);
        assert!(!again.newly_completed);
        let snapshot = tracker.snapshot("a").unwrap().clone();
        assert!(snapshot.sublessons[0].completed);
        assert!(!snapshot.sublessons[1].completed);
    }

    #[test]
    fn test_lesson_completed_is_conjunction_after_every_outcome() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        let record = tracker.record_outcome("a", "a.1", 1, 1).unwrap();
        assert!(!record.lesson_completed);
        let snapshot = tracker.snapshot("a").unwrap();
        assert_eq!(
            snapshot.completed,
            snapshot.sublessons.iter().all(|s| s.completed)
        );
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        match tracker.record_outcome("nope", "a.1", 1, 1) {
            Err(CurriculumError::UnknownLesson { .. }) => {}
            other => panic!("Expected UnknownLesson, got {:?}", other),
        }
        match tracker.record_outcome("a", "nope", 1, 1) {
            Err(CurriculumError::UnknownSublesson { .. }) => {}
            other => panic!("Expected UnknownSublesson, got {:?}", other),
        }
    }

    #[test]
    fn test_next_sublesson_walks_then_reviews() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        assert_eq!(
            tracker.next_sublesson("a").unwrap().map(|s| s.id.clone()),
            Some("a.1".to_string())
        );
        tracker.record_outcome("a", "a.1", 1, 1).unwrap();
        assert_eq!(
            tracker.next_sublesson("a").unwrap().map(|s| s.id.clone()),
            Some("a.2".to_string())
        );
        tracker.record_outcome("a", "a.2", 1, 1).unwrap();
        // All complete: re-entry points back at the first sublesson.
        assert_eq!(
            tracker.next_sublesson("a").unwrap().map(|s| s.id.clone()),
            Some("a.1".to_string())
        );
    }

    #[test]
    fn test_mastery_ratio() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        assert_eq!(tracker.mastery(), 0.0);
        tracker.record_outcome("a", "a.1", 1, 1).unwrap();
        assert!((tracker.mastery() - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_export_restore_roundtrip() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        tracker.record_outcome("a", "a.1", 1, 1).unwrap();
        let exported = tracker.export();

        let mut fresh = ProgressTracker::new(two_lesson_curriculum());
        fresh.restore(exported);
        assert!(fresh.snapshot("a").unwrap().sublessons[0].completed);
    }

    #[test]
    fn test_restore_drops_unknown_lessons() {
        let mut tracker = ProgressTracker::new(two_lesson_curriculum());
        let mut snapshots = HashMap::new();
        snapshots.insert(
            "ghost".to_string(),
            LessonProgress {
                lesson_id: "ghost".to_string(),
                completed: true,
                sublessons: vec![],
            },
        );
        tracker.restore(snapshots);
        assert!(tracker.export().is_empty());
    }
}
