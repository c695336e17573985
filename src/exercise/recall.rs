//! Sensor recall runner
//!
//! Multi-step rounds of chord + strum combinations. Within a round the
//! learner must reproduce every step; the round scores correct only when
//! all steps match. A wrong step or a timeout fails the round and
//! advances to the next one (quiz discipline at the round level).
//!
//! The trial index reported to timers and the UI is the round index.

use std::time::Duration;

use crate::exercise::{LearnerAction, TrialFeedback, TrialReport};

pub struct RecallRunner {
    rounds: Vec<Vec<LearnerAction>>,
    min_correct: u32,
    time_limit: Option<Duration>,
    round: usize,
    step: usize,
    correct_rounds: u32,
    finished: bool,
}

impl RecallRunner {
    pub fn new(
        rounds: Vec<Vec<LearnerAction>>,
        min_correct: u32,
        time_limit: Option<Duration>,
    ) -> Self {
        let finished = rounds.is_empty();
        Self {
            rounds,
            min_correct,
            time_limit,
            round: 0,
            step: 0,
            correct_rounds: 0,
            finished,
        }
    }

    fn fail_round(&mut self, feedback: TrialFeedback) -> TrialReport {
        let trial_index = self.round;
        self.round += 1;
        self.step = 0;
        self.finished = self.round >= self.rounds.len();
        TrialReport {
            feedback,
            trial_index,
            advanced: true,
            finished: self.finished,
        }
    }

    /// Evaluate one learner action against the current step of the
    /// current round.
    pub fn handle_action(&mut self, action: &LearnerAction) -> Option<TrialReport> {
        if self.finished {
            return None;
        }
        let round = &self.rounds[self.round];
        if action != &round[self.step] {
            return Some(self.fail_round(TrialFeedback::Incorrect));
        }

        self.step += 1;
        if self.step < round.len() {
            // Mid-round progress: the round index holds until the last
            // step lands.
            return Some(TrialReport {
                feedback: TrialFeedback::Correct,
                trial_index: self.round,
                advanced: false,
                finished: false,
            });
        }

        self.correct_rounds += 1;
        let trial_index = self.round;
        self.round += 1;
        self.step = 0;
        self.finished = self.round >= self.rounds.len();
        Some(TrialReport {
            feedback: TrialFeedback::Correct,
            trial_index,
            advanced: true,
            finished: self.finished,
        })
    }

    /// Fail the current round on timeout and advance.
    pub fn handle_timeout(&mut self, trial_index: usize) -> Option<TrialReport> {
        if self.finished || trial_index != self.round {
            return None;
        }
        Some(self.fail_round(TrialFeedback::TimedOut))
    }

    /// The expected action for the current step.
    pub fn expected(&self) -> Option<&LearnerAction> {
        if self.finished {
            None
        } else {
            self.rounds.get(self.round).and_then(|r| r.get(self.step))
        }
    }

    pub fn current_trial(&self) -> usize {
        self.round
    }

    pub fn score(&self) -> u32 {
        self.correct_rounds
    }

    pub fn total_trials(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn required_score(&self) -> u32 {
        self.min_correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{ChordLabel, StrumDirection};

    fn round() -> Vec<LearnerAction> {
        vec![
            LearnerAction::ChordStrum {
                chord: ChordLabel::from("C"),
                strum: StrumDirection::Down,
            },
            LearnerAction::ChordStrum {
                chord: ChordLabel::from("G"),
                strum: StrumDirection::Up,
            },
            LearnerAction::ChordStrum {
                chord: ChordLabel::from("Am"),
                strum: StrumDirection::Down,
            },
        ]
    }

    fn wrong() -> LearnerAction {
        LearnerAction::ChordStrum {
            chord: ChordLabel::from("F"),
            strum: StrumDirection::Up,
        }
    }

    #[test]
    fn test_full_round_scores_once() {
        let mut runner = RecallRunner::new(vec![round(), round()], 2, None);
        for (i, step) in round().iter().enumerate() {
            let report = runner.handle_action(step).unwrap();
            assert_eq!(report.feedback, TrialFeedback::Correct);
            assert_eq!(report.trial_index, 0);
            // Only the last step of the round advances the round index.
            assert_eq!(report.advanced, i == 2);
        }
        assert_eq!(runner.score(), 1);
        assert_eq!(runner.current_trial(), 1);
    }

    #[test]
    fn test_wrong_step_fails_whole_round() {
        let mut runner = RecallRunner::new(vec![round(), round()], 2, None);
        runner.handle_action(&round()[0]).unwrap();
        let report = runner.handle_action(&wrong()).unwrap();
        assert_eq!(report.feedback, TrialFeedback::Incorrect);
        assert!(report.advanced);
        assert_eq!(runner.score(), 0);
        // Next round restarts at its first step.
        assert_eq!(runner.current_trial(), 1);
        assert_eq!(runner.expected(), Some(&round()[0]));
    }

    #[test]
    fn test_timeout_fails_round() {
        let mut runner = RecallRunner::new(vec![round(), round()], 2, Some(Duration::from_secs(3)));
        runner.handle_action(&round()[0]).unwrap();
        let report = runner.handle_timeout(0).unwrap();
        assert_eq!(report.feedback, TrialFeedback::TimedOut);
        assert_eq!(runner.current_trial(), 1);
        assert_eq!(runner.score(), 0);
    }

    #[test]
    fn test_stale_round_timeout_ignored() {
        let mut runner = RecallRunner::new(vec![round(), round()], 2, Some(Duration::from_secs(3)));
        for step in round() {
            runner.handle_action(&step).unwrap();
        }
        // Timer for round 0 fires late; round 1 must be unaffected.
        assert!(runner.handle_timeout(0).is_none());
        assert_eq!(runner.score(), 1);
        assert_eq!(runner.current_trial(), 1);
    }

    #[test]
    fn test_completion_and_score() {
        let mut runner = RecallRunner::new(vec![round(), round()], 1, None);
        for step in round() {
            runner.handle_action(&step).unwrap();
        }
        runner.handle_action(&wrong()).unwrap();
        assert!(runner.is_finished());
        assert_eq!(runner.score(), 1);
        assert!(runner.score() >= runner.required_score());
        assert!(runner.handle_action(&wrong()).is_none());
    }
}
