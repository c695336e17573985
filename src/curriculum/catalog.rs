//! Built-in curriculum catalog
//!
//! The six-lesson strumming curriculum shipped with the trainer. Serves
//! as the default when no curriculum file is provided and as the pristine
//! source for progress snapshots.

use crate::curriculum::model::{CompletionConfig, Curriculum, Lesson, Sublesson, SublessonKind};

fn sublesson(
    id: &str,
    title: &str,
    operation: &str,
    feedback: &str,
    goal: &str,
    kind: SublessonKind,
    config: Option<CompletionConfig>,
) -> Sublesson {
    Sublesson {
        id: id.to_string(),
        title: title.to_string(),
        operation: operation.to_string(),
        feedback: feedback.to_string(),
        goal: goal.to_string(),
        kind,
        config,
        completed: false,
    }
}

fn trials(min_correct: u32, total_trials: u32) -> Option<CompletionConfig> {
    Some(CompletionConfig {
        min_correct: Some(min_correct),
        total_trials: Some(total_trials),
        ..CompletionConfig::default()
    })
}

fn timed_trials(min_correct: u32, total_trials: u32, time_limit_secs: u64) -> Option<CompletionConfig> {
    Some(CompletionConfig {
        min_correct: Some(min_correct),
        total_trials: Some(total_trials),
        time_limit_secs: Some(time_limit_secs),
        ..CompletionConfig::default()
    })
}

fn accuracy(required_accuracy: u32) -> Option<CompletionConfig> {
    Some(CompletionConfig {
        required_accuracy: Some(required_accuracy),
        ..CompletionConfig::default()
    })
}

fn lesson(id: &str, title: &str, description: &str, sublessons: Vec<Sublesson>) -> Lesson {
    Lesson {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        sublessons,
        completed: false,
        progress: 0.0,
    }
}

impl Curriculum {
    /// The built-in six-lesson curriculum.
    pub fn builtin() -> Self {
        Curriculum {
            lessons: vec![
                lesson(
                    "lesson-1",
                    "Strumming Basics",
                    "Learn the fundamentals of up and down strumming",
                    vec![
                        sublesson(
                            "1.1",
                            "Introduction to Strumming Directions",
                            "Display an animation/demo: What is \"up strum\" and \"down strum\" with the thumb sensor? Show arrow graphics and hand movement. Ask user to try both motions without pressing any chord sensors.",
                            "Visual confirmation (arrow lights up the direction each time input is detected).",
                            "Learner reliably triggers both up and down strum and recognizes each direction.",
                            SublessonKind::Demo,
                            None,
                        ),
                        sublesson(
                            "1.2",
                            "Strum Sequence Practice",
                            "Present a list of strum instructions: \"Up, Down, Up, Down...\" (min. 8 steps). User performs each in sequence; app confirms correct direction before advancing.",
                            "\"Checkmark\" appears for each correct input; error sound or prompt for wrong direction.",
                            "Learner correct on 7 out of 8 strums in order (can repeat until passing).",
                            SublessonKind::Practice,
                            trials(7, 8),
                        ),
                        sublesson(
                            "1.3",
                            "Strum Quiz",
                            "App displays random direction prompts, user must respond correctly to each (10 trials).",
                            "Show correct/incorrect immediately, and a final score at end.",
                            "At least 8/10 correct.",
                            SublessonKind::Quiz,
                            trials(8, 10),
                        ),
                    ],
                ),
                lesson(
                    "lesson-2",
                    "Single Chord Practice",
                    "Master individual chord sensors and basic strumming combinations",
                    vec![
                        sublesson(
                            "2.1",
                            "Meet the Chord Sensors",
                            "Show the breadbox diagram. Light up Sensor 1; prompt: \"Press Sensor 1.\" Repeat for Sensors 2, 3, 4 (each mapped to a chord).",
                            "Visual highlight for correct sensor pressed; message for correct/incorrect touch.",
                            "Learner locates and presses each sensor correctly at least once.",
                            SublessonKind::Practice,
                            trials(4, 4),
                        ),
                        sublesson(
                            "2.2",
                            "Strumming with One Chord",
                            "For each sensor, prompt: \"Press Sensor X, then strum down/up.\" User completes both steps per chord.",
                            "Confirm both correct press and correct strum. Play chord sound.",
                            "Learner successfully pairs each chord sensor with down and up strum.",
                            SublessonKind::Practice,
                            trials(8, 8),
                        ),
                        sublesson(
                            "2.3",
                            "Chord Recall Game",
                            "App randomly requests a chord sensor and strum direction; learner must respond within a time limit (e.g., 4 seconds). 12 rounds in total, covering all sensor/strum pairs.",
                            "Shows correct/incorrect per round and overall score.",
                            "At least 10/12 correct.",
                            SublessonKind::Quiz,
                            timed_trials(10, 12, 4),
                        ),
                    ],
                ),
                lesson(
                    "lesson-3",
                    "Two-Chord Switching",
                    "Learn to seamlessly switch between chords while strumming",
                    vec![
                        sublesson(
                            "3.1",
                            "Chord and Strum Switch Demo",
                            "Show example sequence: \"Sensor 1 + Down → Sensor 2 + Up.\" User watches the demo, then is prompted to repeat.",
                            "Visual timeline with checkmarks for each correct step.",
                            "Learner understands the process of switching chords and strums.",
                            SublessonKind::Demo,
                            None,
                        ),
                        sublesson(
                            "3.2",
                            "Guided Chord Switch Practice",
                            "Sequence prompts: \"Sensor 1 + Down, then Sensor 2 + Up.\" Then repeat for all adjacent pairs (1↔2, 2↔3, 3↔4). Each switch must be completed within a time window.",
                            "Immediate check for correct chord and strum direction.",
                            "At least two successful switches for each pair.",
                            SublessonKind::Practice,
                            trials(6, 6),
                        ),
                        sublesson(
                            "3.3",
                            "Fast Switch Challenge",
                            "Give rapid-fire switch sequences (random pairs, strum directions). User performs in succession, with a 2-second window for each.",
                            "Animated progress bar; error sound for misses.",
                            "8/10 switches correct on first attempt.",
                            SublessonKind::Challenge,
                            timed_trials(8, 10, 2),
                        ),
                    ],
                ),
                lesson(
                    "lesson-4",
                    "Multi-Sensor Chord Practice",
                    "Master chords that require multiple sensor combinations",
                    vec![
                        sublesson(
                            "4.1",
                            "Playing Two-Button Chords",
                            "Explain and show which chords require two sensors (e.g., Sensor 1+3 for a particular chord type). Prompt: \"Press Sensors X and Y together, then strum down.\"",
                            "Highlight both sensors when correct; error if only one pressed or wrong combination.",
                            "Learner can press correct sensor combinations and strum per prompt.",
                            SublessonKind::Practice,
                            trials(4, 4),
                        ),
                        sublesson(
                            "4.2",
                            "Multi-Sensor Chord Recall",
                            "Present a sequence: \"Press Sensors 2+4, strum up; Press Sensors 1+3, strum down,\" etc. Three steps per round.",
                            "Confirm correct presses, strum direction; visual feedback.",
                            "Complete 3/4 rounds without error.",
                            SublessonKind::Practice,
                            trials(3, 4),
                        ),
                        sublesson(
                            "4.3",
                            "Advanced Chord Challenge",
                            "Mix single and multi-sensor chords into random order. Prompt user with each chord/strum pair; time limit per step.",
                            "Full summary at end; badges for perfect recall.",
                            "5/6 rounds correct.",
                            SublessonKind::Challenge,
                            timed_trials(5, 6, 3),
                        ),
                    ],
                ),
                lesson(
                    "lesson-5",
                    "Song Pattern Performance",
                    "Apply your skills to play complete song patterns",
                    vec![
                        sublesson(
                            "5.1",
                            "Simple Song Walkthrough",
                            "Show scrollable timeline (e.g., C major down, G major up, F major down, C major up). User follows along, pressing sensors and strumming as prompted.",
                            "Visual swipe or progress indicator; sounds play for correct input.",
                            "Learner completes pattern in rhythm (e.g., 95% notes on time).",
                            SublessonKind::Practice,
                            accuracy(95),
                        ),
                        sublesson(
                            "5.2",
                            "Speed Round",
                            "Speed up tempo; prompt with song sequence. User must perform in quicker succession.",
                            "Visual score for speed/accuracy.",
                            "Completion with few or no errors at faster pace.",
                            SublessonKind::Challenge,
                            accuracy(90),
                        ),
                        sublesson(
                            "5.3",
                            "Performance Review & Replay",
                            "Replay user's best attempt; highlight any mistakes. Offer option to retry specific segments.",
                            "Show final accuracy, error statistics, and improvement tips.",
                            "Master at least 3 consecutive segments at high accuracy.",
                            SublessonKind::Practice,
                            Some(CompletionConfig {
                                min_correct: Some(3),
                                ..CompletionConfig::default()
                            }),
                        ),
                    ],
                ),
                lesson(
                    "lesson-6",
                    "Free Play and Mastery",
                    "Explore freely and challenge yourself with advanced exercises",
                    vec![
                        sublesson(
                            "6.1",
                            "Free Jam",
                            "Let user select any chord sensor, combination, and strum direction. App identifies played chord and logs strum direction/time.",
                            "Live display of played chords; saves or shares performance if desired.",
                            "Exploration with visible feedback.",
                            SublessonKind::Freeplay,
                            None,
                        ),
                        sublesson(
                            "6.2",
                            "Challenge Mode",
                            "Sequence of randomized chord/strum challenges at increasing speed. Optional leaderboard or badge rewards.",
                            "Scores comparative performance and tracks improvement.",
                            "Achieve personal best or unlock badges.",
                            SublessonKind::Challenge,
                            None,
                        ),
                    ],
                ),
            ],
        }
    }
}
