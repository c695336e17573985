//! Exercise plans: tagged dispatch from sublesson kind + config
//!
//! A plan carries only the configuration its runner needs, replacing the
//! original's per-sublesson-id special casing. Prompts are generated
//! here; correctness is always judged by comparison against these
//! expected values, never randomized.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::curriculum::{CompletionConfig, Sublesson, SublessonKind};
use crate::detection::{ChordLabel, StrumDirection};
use crate::exercise::LearnerAction;

/// Chords mapped to the four sensor pads, in pad order.
const SENSOR_CHORDS: [&str; 4] = ["C", "G", "Am", "F"];

/// Steps per round in a sensor-recall exercise.
const RECALL_STEPS_PER_ROUND: usize = 3;

/// Fallback trial count for challenges with no configuration.
const DEFAULT_TRIALS: u32 = 10;

/// An exercise ready to run, keyed by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ExercisePlan {
    /// Practice style: an incorrect action retries the same step; only a
    /// correct action advances.
    SequencePractice {
        sequence: Vec<LearnerAction>,
        min_correct: u32,
    },
    /// Quiz style: a fixed trial count; errors and timeouts advance.
    TimedQuiz {
        prompts: Vec<LearnerAction>,
        min_correct: u32,
        time_limit: Option<Duration>,
    },
    /// Multi-step rounds of chord + strum combinations; a round is
    /// correct only when every step matches.
    SensorRecall {
        rounds: Vec<Vec<LearnerAction>>,
        min_correct: u32,
        time_limit: Option<Duration>,
    },
}

impl ExercisePlan {
    /// Build the plan for a sublesson, or None for kinds with no
    /// gradeable exercise (demo, freeplay).
    pub fn for_sublesson(sublesson: &Sublesson) -> Option<ExercisePlan> {
        let config = sublesson.config.clone().unwrap_or_default();
        let mut rng = rand::thread_rng();
        match sublesson.kind {
            SublessonKind::Demo | SublessonKind::Freeplay => None,
            SublessonKind::Practice => Some(Self::practice_plan(&config)),
            SublessonKind::Quiz => Some(Self::quiz_plan(&config, &mut rng)),
            SublessonKind::Challenge => Some(Self::challenge_plan(&config, &mut rng)),
        }
    }

    /// Practice sublessons become sequence practice. Song-pattern
    /// practices configured with a required accuracy run over the song
    /// pattern with the threshold derived from that accuracy.
    fn practice_plan(config: &CompletionConfig) -> ExercisePlan {
        if config.required_accuracy.is_some() {
            let sequence = song_pattern();
            let min_correct = threshold(config, sequence.len() as u32);
            return ExercisePlan::SequencePractice {
                sequence,
                min_correct,
            };
        }

        let total = config.total_trials.unwrap_or(8);
        let min_correct = threshold(config, total);
        ExercisePlan::SequencePractice {
            sequence: alternating_strums(total as usize),
            min_correct,
        }
    }

    /// Quiz sublessons prompt random single actions: bare strum
    /// directions for untimed quizzes, chord + strum pairs for timed
    /// recall games.
    fn quiz_plan(config: &CompletionConfig, rng: &mut impl Rng) -> ExercisePlan {
        let total = config.total_trials.unwrap_or(DEFAULT_TRIALS);
        let min_correct = threshold(config, total);
        let time_limit = config.time_limit_secs.map(Duration::from_secs);
        let prompts = if time_limit.is_some() {
            random_chord_strums(total as usize, rng)
        } else {
            random_strums(total as usize, rng)
        };
        ExercisePlan::TimedQuiz {
            prompts,
            min_correct,
            time_limit,
        }
    }

    /// Challenge sublessons are sensor-recall rounds.
    fn challenge_plan(config: &CompletionConfig, rng: &mut impl Rng) -> ExercisePlan {
        let rounds_count = config.total_trials.unwrap_or(DEFAULT_TRIALS);
        let min_correct = threshold(config, rounds_count);
        let rounds = (0..rounds_count)
            .map(|_| random_chord_strums(RECALL_STEPS_PER_ROUND, rng))
            .collect();
        ExercisePlan::SensorRecall {
            rounds,
            min_correct,
            time_limit: config.time_limit_secs.map(Duration::from_secs),
        }
    }

    /// The score the progression engine will require for this plan.
    pub fn required_score(&self) -> u32 {
        match self {
            ExercisePlan::SequencePractice { min_correct, .. } => *min_correct,
            ExercisePlan::TimedQuiz { min_correct, .. } => *min_correct,
            ExercisePlan::SensorRecall { min_correct, .. } => *min_correct,
        }
    }
}

/// Resolve the passing threshold from a sublesson config.
///
/// `min_correct` wins when present; otherwise a `required_accuracy`
/// percentage is applied to the trial count (rounded up); otherwise every
/// trial must be correct.
fn threshold(config: &CompletionConfig, total: u32) -> u32 {
    if let Some(min_correct) = config.min_correct {
        return min_correct.min(total);
    }
    if let Some(accuracy) = config.required_accuracy {
        let accuracy = accuracy.min(100) as u64;
        return ((accuracy * total as u64).div_ceil(100)) as u32;
    }
    total
}

/// "Up, Down, Up, Down..." starting with down, the intro practice shape.
fn alternating_strums(len: usize) -> Vec<LearnerAction> {
    let mut direction = StrumDirection::Down;
    (0..len)
        .map(|_| {
            let action = LearnerAction::Strum(direction);
            direction = direction.flipped();
            action
        })
        .collect()
}

/// The walkthrough song pattern: C down, G up, F down, C up, repeated.
fn song_pattern() -> Vec<LearnerAction> {
    let bar = [
        ("C", StrumDirection::Down),
        ("G", StrumDirection::Up),
        ("F", StrumDirection::Down),
        ("C", StrumDirection::Up),
    ];
    bar.iter()
        .cycle()
        .take(8)
        .map(|(chord, strum)| LearnerAction::ChordStrum {
            chord: ChordLabel::from(*chord),
            strum: *strum,
        })
        .collect()
}

fn random_strums(len: usize, rng: &mut impl Rng) -> Vec<LearnerAction> {
    (0..len)
        .map(|_| {
            let direction = if rng.gen_bool(0.5) {
                StrumDirection::Down
            } else {
                StrumDirection::Up
            };
            LearnerAction::Strum(direction)
        })
        .collect()
}

fn random_chord_strums(len: usize, rng: &mut impl Rng) -> Vec<LearnerAction> {
    (0..len)
        .map(|_| {
            let chord = SENSOR_CHORDS
                .choose(rng)
                .copied()
                .unwrap_or(SENSOR_CHORDS[0]);
            let strum = if rng.gen_bool(0.5) {
                StrumDirection::Down
            } else {
                StrumDirection::Up
            };
            LearnerAction::ChordStrum {
                chord: ChordLabel::from(chord),
                strum,
            }
        })
        .collect()
}
