//! Sequence practice runner
//!
//! Practice style: the learner repeats the same step until correct. An
//! incorrect action is a no-op retry of the current step; only a correct
//! action advances. The exercise finishes when the whole sequence has
//! been performed, so the score equals the number of correct responses
//! consumed.

use crate::exercise::{LearnerAction, TrialFeedback, TrialReport};

pub struct SequenceRunner {
    sequence: Vec<LearnerAction>,
    min_correct: u32,
    current: usize,
    correct: u32,
    finished: bool,
}

impl SequenceRunner {
    pub fn new(sequence: Vec<LearnerAction>, min_correct: u32) -> Self {
        let finished = sequence.is_empty();
        Self {
            sequence,
            min_correct,
            current: 0,
            correct: 0,
            finished,
        }
    }

    /// Evaluate one learner action against the current step.
    pub fn handle_action(&mut self, action: &LearnerAction) -> Option<TrialReport> {
        if self.finished {
            return None;
        }
        let trial_index = self.current;
        let expected = &self.sequence[trial_index];
        if action == expected {
            self.correct += 1;
            self.current += 1;
            self.finished = self.current >= self.sequence.len();
            Some(TrialReport {
                feedback: TrialFeedback::Correct,
                trial_index,
                advanced: true,
                finished: self.finished,
            })
        } else {
            // Retry the same step; the index does not move.
            Some(TrialReport {
                feedback: TrialFeedback::Incorrect,
                trial_index,
                advanced: false,
                finished: false,
            })
        }
    }

    /// Practice steps are untimed; timeouts never apply.
    pub fn handle_timeout(&mut self, _trial_index: usize) -> Option<TrialReport> {
        None
    }

    pub fn expected(&self) -> Option<&LearnerAction> {
        if self.finished {
            None
        } else {
            self.sequence.get(self.current)
        }
    }

    pub fn current_trial(&self) -> usize {
        self.current
    }

    pub fn score(&self) -> u32 {
        self.correct
    }

    pub fn total_trials(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn required_score(&self) -> u32 {
        self.min_correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::StrumDirection;

    fn alternating(len: usize) -> Vec<LearnerAction> {
        let mut direction = StrumDirection::Down;
        (0..len)
            .map(|_| {
                let action = LearnerAction::Strum(direction);
                direction = direction.flipped();
                action
            })
            .collect()
    }

    #[test]
    fn test_all_correct_scores_full() {
        let sequence = alternating(8);
        let mut runner = SequenceRunner::new(sequence.clone(), 7);
        for (i, step) in sequence.iter().enumerate() {
            let report = runner.handle_action(step).unwrap();
            assert_eq!(report.feedback, TrialFeedback::Correct);
            assert_eq!(report.trial_index, i);
            assert!(report.advanced);
        }
        assert!(runner.is_finished());
        assert_eq!(runner.score(), 8);
        assert!(runner.score() >= runner.required_score());
    }

    #[test]
    fn test_wrong_strum_retries_same_step() {
        let sequence = alternating(8);
        let mut runner = SequenceRunner::new(sequence.clone(), 7);

        // Correct first step.
        runner.handle_action(&sequence[0]).unwrap();

        // Wrong direction on step 2: no advance, then the corrected strum
        // still counts, so the full run ends at score 8.
        let wrong = LearnerAction::Strum(StrumDirection::Down);
        assert_ne!(wrong, sequence[1]);
        let report = runner.handle_action(&wrong).unwrap();
        assert_eq!(report.feedback, TrialFeedback::Incorrect);
        assert!(!report.advanced);
        assert_eq!(runner.current_trial(), 1);

        for step in &sequence[1..] {
            runner.handle_action(step).unwrap();
        }
        assert!(runner.is_finished());
        assert_eq!(runner.score(), 8);
    }

    #[test]
    fn test_finished_runner_ignores_input() {
        let sequence = alternating(2);
        let mut runner = SequenceRunner::new(sequence.clone(), 2);
        runner.handle_action(&sequence[0]).unwrap();
        let last = runner.handle_action(&sequence[1]).unwrap();
        assert!(last.finished);
        assert!(runner.handle_action(&sequence[0]).is_none());
        assert!(runner.expected().is_none());
    }

    #[test]
    fn test_empty_sequence_is_immediately_finished() {
        let runner = SequenceRunner::new(vec![], 0);
        assert!(runner.is_finished());
        assert_eq!(runner.score(), 0);
    }

    #[test]
    fn test_timeouts_never_apply() {
        let mut runner = SequenceRunner::new(alternating(4), 4);
        assert!(runner.handle_timeout(0).is_none());
        assert_eq!(runner.current_trial(), 0);
    }
}
