//! Cancellable per-trial timeout timer
//!
//! Arms one sleep task per trial; re-arming or dropping the timer aborts
//! the pending task. Each timeout carries the trial index it was armed
//! for, so a firing that outlives its trial (the learner answered, the
//! exercise advanced or was abandoned) is recognizably stale and
//! discarded by the runner.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A fired per-trial timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialTimeout {
    pub trial_index: usize,
}

/// Owns at most one pending timeout task.
pub struct TrialTimer {
    handle: Option<JoinHandle<()>>,
}

impl TrialTimer {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Arm the timer for a trial, cancelling any pending timeout first.
    pub fn arm(
        &mut self,
        trial_index: usize,
        limit: Duration,
        tx: mpsc::UnboundedSender<TrialTimeout>,
    ) {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            let _ = tx.send(TrialTimeout { trial_index });
        }));
    }

    /// Abort the pending timeout, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Default for TrialTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TrialTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
