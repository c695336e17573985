// Exercise runners: per-exercise-kind trial state machines
//
// A runner is constructed from an exercise plan, consumes learner actions
// (explicit button presses or derived detection events), and yields a
// final score for the progression engine. Two advancement disciplines
// exist and must stay distinct: quiz-style runners advance through errors
// against a fixed trial count, practice-style runners require success
// before advancing.

mod plan;
mod quiz;
mod recall;
mod sequence;
mod timer;

pub use plan::ExercisePlan;
pub use quiz::QuizRunner;
pub use recall::RecallRunner;
pub use sequence::SequenceRunner;
pub use timer::{TrialTimeout, TrialTimer};

use std::time::Duration;

use serde::Serialize;

use crate::detection::{ChordLabel, DetectionEvent, StrumDirection};

/// A single learner action evaluated against the current trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LearnerAction {
    /// A strum with no chord held
    Strum(StrumDirection),
    /// A chord press with no strum
    Chord(ChordLabel),
    /// A chord held through a strum
    ChordStrum {
        chord: ChordLabel,
        strum: StrumDirection,
    },
}

impl LearnerAction {
    /// Derive the learner action carried by a detection event, if any.
    ///
    /// Only a detected strum constitutes an action for strum-bearing
    /// trials; a bare chord press is an action on its own (sensor
    /// practice). Events with neither are ignored by runners.
    pub fn from_event(event: &DetectionEvent) -> Option<LearnerAction> {
        match (&event.chord, event.strum_direction, event.strum_detected) {
            (Some(chord), Some(strum), true) => Some(LearnerAction::ChordStrum {
                chord: chord.clone(),
                strum,
            }),
            (None, Some(strum), true) => Some(LearnerAction::Strum(strum)),
            (Some(chord), _, false) => Some(LearnerAction::Chord(chord.clone())),
            _ => None,
        }
    }
}

/// Per-trial verdict shown to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrialFeedback {
    Correct,
    Incorrect,
    TimedOut,
}

/// Result of evaluating one learner action or timeout.
#[derive(Debug, Clone, Serialize)]
pub struct TrialReport {
    pub feedback: TrialFeedback,
    /// Index of the trial that was evaluated
    pub trial_index: usize,
    /// Whether the trial index advanced (practice-style retries do not)
    pub advanced: bool,
    /// Whether the exercise finished with this evaluation
    pub finished: bool,
}

/// Tagged dispatch over the runner kinds.
pub enum ExerciseRunner {
    Sequence(SequenceRunner),
    Quiz(QuizRunner),
    Recall(RecallRunner),
}

impl ExerciseRunner {
    /// Build the runner for a plan.
    pub fn from_plan(plan: ExercisePlan) -> Self {
        match plan {
            ExercisePlan::SequencePractice {
                sequence,
                min_correct,
            } => ExerciseRunner::Sequence(SequenceRunner::new(sequence, min_correct)),
            ExercisePlan::TimedQuiz {
                prompts,
                min_correct,
                time_limit,
            } => ExerciseRunner::Quiz(QuizRunner::new(prompts, min_correct, time_limit)),
            ExercisePlan::SensorRecall {
                rounds,
                min_correct,
                time_limit,
            } => ExerciseRunner::Recall(RecallRunner::new(rounds, min_correct, time_limit)),
        }
    }

    /// Evaluate a learner action against the current trial. None once the
    /// exercise has finished.
    pub fn handle_action(&mut self, action: &LearnerAction) -> Option<TrialReport> {
        match self {
            ExerciseRunner::Sequence(runner) => runner.handle_action(action),
            ExerciseRunner::Quiz(runner) => runner.handle_action(action),
            ExerciseRunner::Recall(runner) => runner.handle_action(action),
        }
    }

    /// Apply a per-trial timeout. The timeout is discarded as stale when
    /// it does not name the currently active trial.
    pub fn handle_timeout(&mut self, trial_index: usize) -> Option<TrialReport> {
        match self {
            ExerciseRunner::Sequence(runner) => runner.handle_timeout(trial_index),
            ExerciseRunner::Quiz(runner) => runner.handle_timeout(trial_index),
            ExerciseRunner::Recall(runner) => runner.handle_timeout(trial_index),
        }
    }

    /// The expected action for the current trial, for display as the
    /// prompt. None once finished.
    pub fn expected(&self) -> Option<&LearnerAction> {
        match self {
            ExerciseRunner::Sequence(runner) => runner.expected(),
            ExerciseRunner::Quiz(runner) => runner.expected(),
            ExerciseRunner::Recall(runner) => runner.expected(),
        }
    }

    /// Index of the currently active trial.
    pub fn current_trial(&self) -> usize {
        match self {
            ExerciseRunner::Sequence(runner) => runner.current_trial(),
            ExerciseRunner::Quiz(runner) => runner.current_trial(),
            ExerciseRunner::Recall(runner) => runner.current_trial(),
        }
    }

    /// Number of correct trials so far; the final score once finished.
    pub fn score(&self) -> u32 {
        match self {
            ExerciseRunner::Sequence(runner) => runner.score(),
            ExerciseRunner::Quiz(runner) => runner.score(),
            ExerciseRunner::Recall(runner) => runner.score(),
        }
    }

    /// Total trial count for the end-of-exercise summary.
    pub fn total_trials(&self) -> usize {
        match self {
            ExerciseRunner::Sequence(runner) => runner.total_trials(),
            ExerciseRunner::Quiz(runner) => runner.total_trials(),
            ExerciseRunner::Recall(runner) => runner.total_trials(),
        }
    }

    /// Whether the exercise has consumed all of its trials.
    pub fn is_finished(&self) -> bool {
        match self {
            ExerciseRunner::Sequence(runner) => runner.is_finished(),
            ExerciseRunner::Quiz(runner) => runner.is_finished(),
            ExerciseRunner::Recall(runner) => runner.is_finished(),
        }
    }

    /// Per-trial time limit, if this runner is a timed variant.
    pub fn time_limit(&self) -> Option<Duration> {
        match self {
            ExerciseRunner::Sequence(_) => None,
            ExerciseRunner::Quiz(runner) => runner.time_limit(),
            ExerciseRunner::Recall(runner) => runner.time_limit(),
        }
    }

    /// Minimum correct trials required to pass.
    pub fn required_score(&self) -> u32 {
        match self {
            ExerciseRunner::Sequence(runner) => runner.required_score(),
            ExerciseRunner::Quiz(runner) => runner.required_score(),
            ExerciseRunner::Recall(runner) => runner.required_score(),
        }
    }
}
