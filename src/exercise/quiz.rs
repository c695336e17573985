//! Timed quiz runner
//!
//! Quiz style: a fixed trial count with one prompt per trial. Both
//! correct and incorrect responses advance the index, and an armed
//! per-trial timeout counts as incorrect when it fires for the currently
//! active trial. Timeouts naming any other trial are stale and ignored.

use std::time::Duration;

use crate::exercise::{LearnerAction, TrialFeedback, TrialReport};

pub struct QuizRunner {
    prompts: Vec<LearnerAction>,
    min_correct: u32,
    time_limit: Option<Duration>,
    current: usize,
    correct: u32,
    finished: bool,
}

impl QuizRunner {
    pub fn new(
        prompts: Vec<LearnerAction>,
        min_correct: u32,
        time_limit: Option<Duration>,
    ) -> Self {
        let finished = prompts.is_empty();
        Self {
            prompts,
            min_correct,
            time_limit,
            current: 0,
            correct: 0,
            finished,
        }
    }

    fn advance(&mut self, feedback: TrialFeedback) -> TrialReport {
        let trial_index = self.current;
        self.current += 1;
        self.finished = self.current >= self.prompts.len();
        TrialReport {
            feedback,
            trial_index,
            advanced: true,
            finished: self.finished,
        }
    }

    /// Evaluate one learner action against the current prompt.
    pub fn handle_action(&mut self, action: &LearnerAction) -> Option<TrialReport> {
        if self.finished {
            return None;
        }
        let feedback = if action == &self.prompts[self.current] {
            self.correct += 1;
            TrialFeedback::Correct
        } else {
            TrialFeedback::Incorrect
        };
        Some(self.advance(feedback))
    }

    /// Fail the current trial on timeout and advance.
    pub fn handle_timeout(&mut self, trial_index: usize) -> Option<TrialReport> {
        if self.finished || trial_index != self.current {
            return None;
        }
        Some(self.advance(TrialFeedback::TimedOut))
    }

    pub fn expected(&self) -> Option<&LearnerAction> {
        if self.finished {
            None
        } else {
            self.prompts.get(self.current)
        }
    }

    pub fn current_trial(&self) -> usize {
        self.current
    }

    pub fn score(&self) -> u32 {
        self.correct
    }

    pub fn total_trials(&self) -> usize {
        self.prompts.len()
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
    use crate::detection::StrumDirection;

    fn prompts(len: usize) -> Vec<LearnerAction> {
        (0..len)
            .map(|i| {
                LearnerAction::Strum(if i % 2 == 0 {
                    StrumDirection::Down
                } else {
                    StrumDirection::Up
                })
            })
            .collect()
    }

    fn wrong_answer(prompt: &LearnerAction) -> LearnerAction {
        match prompt {
            LearnerAction::Strum(direction) => LearnerAction::Strum(direction.flipped()),
            other => panic!("strum prompts expected, got {:?}", other),
        }
    }

    #[test]
    fn test_eight_of_ten_passes_threshold() {
        let prompts = prompts(10);
        let mut runner = QuizRunner::new(prompts.clone(), 8, None);
        for (i, prompt) in prompts.iter().enumerate() {
            let answer = if i < 8 {
                prompt.clone()
            } else {
                wrong_answer(prompt)
            };
            let report = runner.handle_action(&answer).unwrap();
            assert!(report.advanced);
        }
        assert!(runner.is_finished());
        assert_eq!(runner.score(), 8);
        assert!(runner.score() >= runner.required_score());
    }

    #[test]
    fn test_seven_of_ten_fails_threshold() {
        let prompts = prompts(10);
        let mut runner = QuizRunner::new(prompts.clone(), 8, None);
        for (i, prompt) in prompts.iter().enumerate() {
            let answer = if i < 7 {
                prompt.clone()
            } else {
                wrong_answer(prompt)
            };
            runner.handle_action(&answer).unwrap();
        }
        assert!(runner.is_finished());
        assert_eq!(runner.score(), 7);
        assert!(runner.score() < runner.required_score());
    }

    #[test]
    fn test_incorrect_advances_the_index() {
        let prompts = prompts(3);
        let mut runner = QuizRunner::new(prompts.clone(), 3, None);
        let report = runner.handle_action(&wrong_answer(&prompts[0])).unwrap();
        assert_eq!(report.feedback, TrialFeedback::Incorrect);
        assert!(report.advanced);
        assert_eq!(runner.current_trial(), 1);
    }

    #[test]
    fn test_timeout_counts_incorrect_and_advances() {
        let prompts = prompts(3);
        let mut runner = QuizRunner::new(prompts, 3, Some(Duration::from_secs(2)));
        let report = runner.handle_timeout(0).unwrap();
        assert_eq!(report.feedback, TrialFeedback::TimedOut);
        assert_eq!(runner.current_trial(), 1);
        assert_eq!(runner.score(), 0);
    }

    #[test]
    fn test_stale_timeout_ignored() {
        let prompts = prompts(3);
        let mut runner = QuizRunner::new(prompts.clone(), 3, Some(Duration::from_secs(2)));
        runner.handle_action(&prompts[0]).unwrap();
        // A timeout armed for trial 0 fires after the learner already
        // answered it; the current trial must not be failed.
        assert!(runner.handle_timeout(0).is_none());
        assert_eq!(runner.current_trial(), 1);
        assert_eq!(runner.score(), 1);
    }

    #[test]
    fn test_finished_runner_ignores_everything() {
        let prompts = prompts(1);
        let mut runner = QuizRunner::new(prompts.clone(), 1, None);
        runner.handle_action(&prompts[0]).unwrap();
        assert!(runner.is_finished());
        assert!(runner.handle_action(&prompts[0]).is_none());
        assert!(runner.handle_timeout(1).is_none());
    }
}
