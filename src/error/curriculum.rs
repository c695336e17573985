// Curriculum and exercise error types

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Log a curriculum error with structured context
pub fn log_curriculum_error(err: &CurriculumError, context: &str) {
    error!(
        "Curriculum error in {}: code={}, component=ProgressTracker, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Curriculum and exercise errors
///
/// These errors cover lesson access gating, progress bookkeeping, and the
/// exercise lifecycle. Locked-access is a boundary rejection, never an
/// exception path; nothing here is fatal to the session.
///
/// Error code range: 2001-2006
#[derive(Debug, Clone, PartialEq)]
pub enum CurriculumError {
    /// Attempt to enter a lesson whose predecessor is not completed
    LessonLocked { index: usize },

    /// Lesson id not present in the curriculum
    UnknownLesson { lesson_id: String },

    /// Sublesson id not present in the given lesson
    UnknownSublesson { sublesson_id: String },

    /// An exercise is already running in this session
    ExerciseActive,

    /// No exercise is currently running
    NoActiveExercise,

    /// The sublesson kind has no gradeable exercise (demo/freeplay)
    NotGradeable { sublesson_id: String },

    /// Mutex/RwLock on progression state was poisoned
    StatePoisoned,

    /// The sublesson must be completed through its exercise, not a
    /// walkthrough
    RequiresExercise { sublesson_id: String },
}

impl CurriculumError {
    pub const LESSON_LOCKED: i32 = 2001;
    pub const UNKNOWN_LESSON: i32 = 2002;
    pub const UNKNOWN_SUBLESSON: i32 = 2003;
    pub const EXERCISE_ACTIVE: i32 = 2004;
    pub const NO_ACTIVE_EXERCISE: i32 = 2005;
    pub const NOT_GRADEABLE: i32 = 2006;
    pub const STATE_POISONED: i32 = 2007;
    pub const REQUIRES_EXERCISE: i32 = 2008;
}

impl ErrorCode for CurriculumError {
    fn code(&self) -> i32 {
        match self {
            CurriculumError::LessonLocked { .. } => Self::LESSON_LOCKED,
            CurriculumError::UnknownLesson { .. } => Self::UNKNOWN_LESSON,
            CurriculumError::UnknownSublesson { .. } => Self::UNKNOWN_SUBLESSON,
            CurriculumError::ExerciseActive => Self::EXERCISE_ACTIVE,
            CurriculumError::NoActiveExercise => Self::NO_ACTIVE_EXERCISE,
            CurriculumError::NotGradeable { .. } => Self::NOT_GRADEABLE,
            CurriculumError::StatePoisoned => Self::STATE_POISONED,
            CurriculumError::RequiresExercise { .. } => Self::REQUIRES_EXERCISE,
        }
    }

    fn message(&self) -> String {
        match self {
            CurriculumError::LessonLocked { index } => {
                format!(
                    "Lesson {} is locked. Complete the previous lesson first.",
                    index + 1
                )
            }
            CurriculumError::UnknownLesson { lesson_id } => {
                format!("Unknown lesson id: {}", lesson_id)
            }
            CurriculumError::UnknownSublesson { sublesson_id } => {
                format!("Unknown sublesson id: {}", sublesson_id)
            }
            CurriculumError::ExerciseActive => {
                "An exercise is already active. Finish or abandon it first.".to_string()
            }
            CurriculumError::NoActiveExercise => {
                "No exercise is currently active.".to_string()
            }
            CurriculumError::NotGradeable { sublesson_id } => {
                format!(
                    "Sublesson {} has no gradeable exercise (demo/freeplay).",
                    sublesson_id
                )
            }
            CurriculumError::StatePoisoned => {
                "Progression state lock poisoned".to_string()
            }
            CurriculumError::RequiresExercise { sublesson_id } => {
                format!(
                    "Sublesson {} is graded through its exercise; run it instead.",
                    sublesson_id
                )
            }
        }
    }
}

impl fmt::Display for CurriculumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CurriculumError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CurriculumError {}
