//! TrainerSession: session-scoped orchestration layer
//!
//! Wires the detection link, stream controller, event normalizer,
//! progression engine, and the single active exercise runner into one
//! injectable container. All session state lives here rather than in
//! ambient globals; rendering layers subscribe to the broadcast streams
//! and call the business methods.
//!
//! Concurrency model: one learner, one active exercise. The progress
//! snapshot map is mutated only through `record_outcome`, which is only
//! reached from the active runner's completion path.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::assist::SongAssistClient;
use crate::config::AppConfig;
use crate::curriculum::{Curriculum, Sublesson};
use crate::detection::{
    ChordLabel, ConnectionState, DetectionEvent, DetectionLink, EventNormalizer,
};
use crate::error::{log_curriculum_error, CurriculumError};
use crate::exercise::{
    ExercisePlan, ExerciseRunner, LearnerAction, TrialReport, TrialTimeout, TrialTimer,
};
use crate::media::{StreamController, StreamState};
use crate::progress::{LessonProgress, OutcomeRecord, ProgressTracker};

/// Global session handle for front ends without their own container.
static SESSION_HANDLE: Lazy<TrainerSession> = Lazy::new(TrainerSession::new_default);

/// Access the process-wide session.
pub fn session_handle() -> &'static TrainerSession {
    &SESSION_HANDLE
}

/// One row of the lesson list: the learner-facing summary of a lesson.
#[derive(Debug, Clone, Serialize)]
pub struct LessonOverview {
    pub index: usize,
    pub lesson_id: String,
    pub title: String,
    pub description: String,
    pub locked: bool,
    pub completed: bool,
    pub progress: f32,
}

/// Exercise lifecycle events for UI subscribers.
#[derive(Debug, Clone, Serialize)]
pub enum ExerciseEvent {
    TrialEvaluated {
        sublesson_id: String,
        report: TrialReport,
    },
    Completed {
        outcome: OutcomeRecord,
    },
}

/// The currently running exercise.
struct ActiveExercise {
    lesson_id: String,
    sublesson_id: String,
    runner: ExerciseRunner,
    timer: TrialTimer,
}

/// Session container owning all mutable learner state.
pub struct TrainerSession {
    curriculum: Arc<Curriculum>,
    link: DetectionLink,
    stream: StreamController,
    assist: SongAssistClient,
    normalizer: Mutex<EventNormalizer>,
    progress: Mutex<ProgressTracker>,
    active: Mutex<Option<ActiveExercise>>,
    exercise_tx: broadcast::Sender<ExerciseEvent>,
    timeout_tx: mpsc::UnboundedSender<TrialTimeout>,
    timeout_rx: Mutex<Option<mpsc::UnboundedReceiver<TrialTimeout>>>,
}

impl TrainerSession {
    /// Create a session from a configuration and curriculum.
    pub fn new(config: AppConfig, curriculum: Curriculum) -> Self {
        let curriculum = Arc::new(curriculum);
        let (exercise_tx, _) = broadcast::channel(64);
        let (timeout_tx, timeout_rx) = mpsc::unbounded_channel();
        Self {
            link: DetectionLink::new(&config.link),
            stream: StreamController::new(&config.stream),
            assist: SongAssistClient::new(&config.assist),
            normalizer: Mutex::new(EventNormalizer::new(config.link.chord_history_cap)),
            progress: Mutex::new(ProgressTracker::new(Arc::clone(&curriculum))),
            curriculum,
            active: Mutex::new(None),
            exercise_tx,
            timeout_tx,
            timeout_rx: Mutex::new(Some(timeout_rx)),
        }
    }

    /// Create a session with the default config location and the
    /// built-in curriculum.
    pub fn new_default() -> Self {
        Self::new(AppConfig::load(), Curriculum::builtin())
    }

    // ========================================================================
    // LOCK HELPER METHODS
    // Safe lock acquisition with typed error handling (no unwrap/expect)
    // ========================================================================

    fn lock_progress(&self) -> Result<std::sync::MutexGuard<'_, ProgressTracker>, CurriculumError> {
        self.progress.lock().map_err(|_| CurriculumError::StatePoisoned)
    }

    fn lock_active(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<ActiveExercise>>, CurriculumError> {
        self.active.lock().map_err(|_| CurriculumError::StatePoisoned)
    }

    fn lock_normalizer(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, EventNormalizer>, CurriculumError> {
        self.normalizer
            .lock()
            .map_err(|_| CurriculumError::StatePoisoned)
    }

    // ========================================================================
    // COLLABORATOR ACCESS
    // ========================================================================

    /// The immutable curriculum reference data.
    pub fn curriculum(&self) -> &Arc<Curriculum> {
        &self.curriculum
    }

    /// The detection event channel client.
    pub fn detection(&self) -> &DetectionLink {
        &self.link
    }

    /// The media stream controller.
    pub fn stream(&self) -> &StreamController {
        &self.stream
    }

    /// The song-assistance client.
    pub fn assist(&self) -> &SongAssistClient {
        &self.assist
    }

    /// Current connection state of the detection link.
    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    /// Current state of the media stream.
    pub fn stream_state(&self) -> StreamState {
        self.stream.state()
    }

    /// Subscribe to exercise lifecycle events.
    pub fn subscribe_exercise_events(&self) -> broadcast::Receiver<ExerciseEvent> {
        self.exercise_tx.subscribe()
    }

    /// Take the per-trial timeout receiver. The session driver must pump
    /// it into `handle_timeout`; the receiver can be taken once.
    pub fn take_timeout_events(&self) -> Option<mpsc::UnboundedReceiver<TrialTimeout>> {
        self.timeout_rx.lock().ok().and_then(|mut guard| guard.take())
    }

    // ========================================================================
    // LESSON NAVIGATION
    // ========================================================================

    /// Learner-facing lesson list with lock state and progress.
    pub fn lesson_overviews(&self) -> Result<Vec<LessonOverview>, CurriculumError> {
        let mut tracker = self.lock_progress()?;
        let mut overviews = Vec::with_capacity(self.curriculum.lessons.len());
        for (index, lesson) in self.curriculum.lessons.iter().enumerate() {
            let locked = tracker.is_locked(index);
            let snapshot = tracker.snapshot(&lesson.id)?;
            overviews.push(LessonOverview {
                index,
                lesson_id: lesson.id.clone(),
                title: lesson.title.clone(),
                description: lesson.description.clone(),
                locked,
                completed: snapshot.completed,
                progress: snapshot.progress_ratio(),
            });
        }
        Ok(overviews)
    }

    /// Enter a lesson by index, returning the sublesson to present: the
    /// first incomplete one, or the first for review when all are done.
    ///
    /// # Errors
    /// - `CurriculumError::LessonLocked` when the preceding lesson is not
    ///   completed
    pub fn enter_lesson(&self, index: usize) -> Result<Option<Sublesson>, CurriculumError> {
        let tracker = self.lock_progress()?;
        if tracker.is_locked(index) {
            let err = CurriculumError::LessonLocked { index };
            log_curriculum_error(&err, "enter_lesson");
            return Err(err);
        }
        let lesson = self
            .curriculum
            .lessons
            .get(index)
            .ok_or_else(|| CurriculumError::UnknownLesson {
                lesson_id: format!("#{}", index),
            })?;
        Ok(tracker.next_sublesson(&lesson.id)?.cloned())
    }

    /// Aggregate mastery ratio across the curriculum.
    pub fn mastery(&self) -> Result<f32, CurriculumError> {
        Ok(self.lock_progress()?.mastery())
    }

    /// Export progress snapshots for the external store.
    pub fn export_progress(
        &self,
    ) -> Result<std::collections::HashMap<String, LessonProgress>, CurriculumError> {
        Ok(self.lock_progress()?.export())
    }

    /// Restore progress snapshots from the external store.
    pub fn restore_progress(
        &self,
        snapshots: std::collections::HashMap<String, LessonProgress>,
    ) -> Result<(), CurriculumError> {
        self.lock_progress()?.restore(snapshots);
        Ok(())
    }

    // ========================================================================
    // EXERCISE LIFECYCLE
    // ========================================================================

    /// Start the exercise for a sublesson.
    ///
    /// Builds the exercise plan for the sublesson kind, arms the first
    /// per-trial timeout for timed variants, and makes the runner the
    /// session's single active exercise.
    ///
    /// # Errors
    /// - `CurriculumError::LessonLocked` for a locked lesson
    /// - `CurriculumError::ExerciseActive` when one is already running
    /// - `CurriculumError::NotGradeable` for demo/freeplay sublessons
    pub fn start_exercise(
        &self,
        lesson_id: &str,
        sublesson_id: &str,
    ) -> Result<(), CurriculumError> {
        let index = self
            .curriculum
            .lesson_index(lesson_id)
            .ok_or_else(|| CurriculumError::UnknownLesson {
                lesson_id: lesson_id.to_string(),
            })?;
        {
            let tracker = self.lock_progress()?;
            if tracker.is_locked(index) {
                let err = CurriculumError::LessonLocked { index };
                log_curriculum_error(&err, "start_exercise");
                return Err(err);
            }
        }

        let lesson = &self.curriculum.lessons[index];
        let sublesson =
            lesson
                .sublesson(sublesson_id)
                .ok_or_else(|| CurriculumError::UnknownSublesson {
                    sublesson_id: sublesson_id.to_string(),
                })?;
        let plan =
            ExercisePlan::for_sublesson(sublesson).ok_or_else(|| CurriculumError::NotGradeable {
                sublesson_id: sublesson_id.to_string(),
            })?;

        let mut active_guard = self.lock_active()?;
        if active_guard.is_some() {
            let err = CurriculumError::ExerciseActive;
            log_curriculum_error(&err, "start_exercise");
            return Err(err);
        }

        let runner = ExerciseRunner::from_plan(plan);
        let mut timer = TrialTimer::new();
        if let Some(limit) = runner.time_limit() {
            timer.arm(runner.current_trial(), limit, self.timeout_tx.clone());
        }
        log::info!(
            "[TrainerSession] Exercise started: {}/{} ({} trials, {} required)",
            lesson_id,
            sublesson_id,
            runner.total_trials(),
            runner.required_score()
        );
        *active_guard = Some(ActiveExercise {
            lesson_id: lesson_id.to_string(),
            sublesson_id: sublesson_id.to_string(),
            runner,
            timer,
        });
        Ok(())
    }

    /// Complete a demo or freeplay sublesson by viewing it.
    ///
    /// These kinds carry no runner; the outcome trivially passes so the
    /// progression engine remains the single mutation path.
    pub fn complete_walkthrough(
        &self,
        lesson_id: &str,
        sublesson_id: &str,
    ) -> Result<OutcomeRecord, CurriculumError> {
        let lesson =
            self.curriculum
                .lesson(lesson_id)
                .ok_or_else(|| CurriculumError::UnknownLesson {
                    lesson_id: lesson_id.to_string(),
                })?;
        let sublesson =
            lesson
                .sublesson(sublesson_id)
                .ok_or_else(|| CurriculumError::UnknownSublesson {
                    sublesson_id: sublesson_id.to_string(),
                })?;
        if sublesson.kind.is_gradeable() {
            let err = CurriculumError::RequiresExercise {
                sublesson_id: sublesson_id.to_string(),
            };
            log_curriculum_error(&err, "complete_walkthrough");
            return Err(err);
        }

        let outcome = self
            .lock_progress()?
            .record_outcome(lesson_id, sublesson_id, 0, 0)?;
        let _ = self.exercise_tx.send(ExerciseEvent::Completed {
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    /// Abandon the active exercise, cancelling its pending trial timeout
    /// so a stale "time's up" cannot fire against a later exercise.
    pub fn abandon_exercise(&self) -> Result<(), CurriculumError> {
        let mut active_guard = self.lock_active()?;
        match active_guard.take() {
            Some(mut active) => {
                active.timer.cancel();
                log::info!(
                    "[TrainerSession] Exercise abandoned: {}/{}",
                    active.lesson_id,
                    active.sublesson_id
                );
                Ok(())
            }
            None => Err(CurriculumError::NoActiveExercise),
        }
    }

    /// Whether an exercise is currently running.
    pub fn exercise_in_progress(&self) -> bool {
        self.lock_active().map(|g| g.is_some()).unwrap_or(false)
    }

    /// The prompt for the current trial of the active exercise.
    pub fn current_prompt(&self) -> Option<LearnerAction> {
        self.lock_active()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(|a| a.runner.expected().cloned()))
    }

    /// Current trial index and total trial count of the active exercise.
    pub fn current_trial(&self) -> Option<(usize, usize)> {
        self.lock_active().ok().and_then(|guard| {
            guard
                .as_ref()
                .map(|a| (a.runner.current_trial(), a.runner.total_trials()))
        })
    }

    // ========================================================================
    // EVENT ROUTING
    // ========================================================================

    /// Route a detection event through the session.
    ///
    /// The chord history is updated unconditionally (freeplay feedback);
    /// when an exercise is active, the derived learner action feeds its
    /// current trial.
    pub fn handle_detection(
        &self,
        event: &DetectionEvent,
    ) -> Result<Option<TrialReport>, CurriculumError> {
        self.lock_normalizer()?.observe(event);
        match LearnerAction::from_event(event) {
            Some(action) => self.apply_action(&action),
            None => Ok(None),
        }
    }

    /// Evaluate an explicit button press against the active exercise.
    ///
    /// # Errors
    /// - `CurriculumError::NoActiveExercise` when nothing is running
    pub fn press_button(&self, action: &LearnerAction) -> Result<TrialReport, CurriculumError> {
        match self.apply_action(action)? {
            Some(report) => Ok(report),
            None => Err(CurriculumError::NoActiveExercise),
        }
    }

    /// Apply a fired per-trial timeout. Stale timeouts (the trial already
    /// advanced, or the exercise ended) are discarded.
    pub fn handle_timeout(
        &self,
        timeout: TrialTimeout,
    ) -> Result<Option<TrialReport>, CurriculumError> {
        self.process(|runner| runner.handle_timeout(timeout.trial_index))
    }

    fn apply_action(
        &self,
        action: &LearnerAction,
    ) -> Result<Option<TrialReport>, CurriculumError> {
        self.process(|runner| runner.handle_action(action))
    }

    /// Shared evaluation path for actions and timeouts: report the trial,
    /// re-arm the timer on advancement, record the outcome on completion.
    fn process<F>(&self, evaluate: F) -> Result<Option<TrialReport>, CurriculumError>
    where
        F: FnOnce(&mut ExerciseRunner) -> Option<TrialReport>,
    {
        let mut active_guard = self.lock_active()?;

        let (report, sublesson_id, rearm) = {
            let Some(active) = active_guard.as_mut() else {
                return Ok(None);
            };
            let Some(report) = evaluate(&mut active.runner) else {
                return Ok(None);
            };
            let rearm = if !report.finished && report.advanced {
                active
                    .runner
                    .time_limit()
                    .map(|limit| (active.runner.current_trial(), limit))
            } else {
                None
            };
            (report, active.sublesson_id.clone(), rearm)
        };

        if let Some((trial_index, limit)) = rearm {
            if let Some(active) = active_guard.as_mut() {
                active.timer.arm(trial_index, limit, self.timeout_tx.clone());
            }
        }

        let _ = self.exercise_tx.send(ExerciseEvent::TrialEvaluated {
            sublesson_id,
            report: report.clone(),
        });

        if report.finished {
            let finished = active_guard.take();
            drop(active_guard);
            if let Some(mut finished) = finished {
                finished.timer.cancel();
                let score = finished.runner.score();
                let required = finished.runner.required_score();
                let outcome = self.lock_progress()?.record_outcome(
                    &finished.lesson_id,
                    &finished.sublesson_id,
                    score,
                    required,
                )?;
                let _ = self.exercise_tx.send(ExerciseEvent::Completed {
                    outcome: outcome.clone(),
                });
            }
        }

        Ok(Some(report))
    }

    // ========================================================================
    // CHORD HISTORY
    // ========================================================================

    /// Recent chord roots for display, most recent first.
    pub fn recent_chords(&self) -> Vec<String> {
        self.lock_normalizer()
            .map(|normalizer| normalizer.recent_roots())
            .unwrap_or_default()
    }

    /// Recent full chord labels, most recent first.
    pub fn recent_chord_labels(&self) -> Vec<ChordLabel> {
        self.lock_normalizer()
            .map(|normalizer| normalizer.recent_chords())
            .unwrap_or_default()
    }
}
