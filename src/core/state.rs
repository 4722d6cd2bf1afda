//! Shared state and feedback types for the game controllers.
//!
//! These types describe what a view needs to render a round: how the last
//! answer was judged, which face the robot guide shows, which toast is up,
//! and a trace of what happened during the session.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the most recent judged action in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundResult {
    /// Nothing judged yet.
    #[default]
    Pending,
    /// The last answer matched.
    Correct,
    /// The last answer did not match.
    Incorrect,
}

impl RoundResult {
    /// Classify a comparison.
    pub fn from_match(matched: bool) -> Self {
        if matched {
            RoundResult::Correct
        } else {
            RoundResult::Incorrect
        }
    }

    /// Check if an answer has been judged.
    pub fn is_judged(&self) -> bool {
        !matches!(self, RoundResult::Pending)
    }
}

/// Expression of the robot guide that accompanies every game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RobotMood {
    /// Waiting for the player.
    #[default]
    Idle,
    /// Microphone or speaker active.
    Listening,
    /// Answer was close, or the player is mid-exercise.
    Thinking,
    /// Correct answer.
    Happy,
    /// Wrong answer.
    Sad,
    /// Round or level finished.
    Celebrating,
    /// Something unexpected, such as a missing microphone.
    Surprised,
}

impl RobotMood {
    /// Face drawn for this mood.
    pub fn face(&self) -> &'static str {
        match self {
            RobotMood::Idle => "[o_o]",
            RobotMood::Listening => "[o_o]~",
            RobotMood::Thinking => "[o_O]",
            RobotMood::Happy => "[^_^]",
            RobotMood::Sad => "[;_;]",
            RobotMood::Celebrating => "\\[^o^]/",
            RobotMood::Surprised => "[O_O]",
        }
    }
}

/// Kind of toast message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    /// Praise for a correct answer.
    Success,
    /// Wrong answer or capability failure.
    Error,
    /// Neutral notice.
    Info,
}

/// Short message shown on top of a game screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Kind of message.
    pub kind: ToastKind,
    /// Text to show.
    pub message: String,
}

impl Toast {
    /// Create a success toast.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    /// Create an error toast.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    /// Create an info toast.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            message: message.into(),
        }
    }
}

/// Maximum number of trace events kept per session.
pub const MAX_TRACE_EVENTS: usize = 500;

/// In-memory trace of a game session, discarded with the controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    /// Recorded events, oldest first.
    pub events: VecDeque<TraceEvent>,
}

impl SessionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, dropping the oldest once the log is full.
    pub fn record(&mut self, event_type: EventType, details: Option<String>) {
        if self.events.len() >= MAX_TRACE_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(TraceEvent::new(event_type, details));
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Most recent event, if any.
    pub fn last(&self) -> Option<&TraceEvent> {
        self.events.back()
    }

    /// Count events of a given type.
    pub fn count(&self, event_type: EventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

/// Individual trace event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceEvent {
    /// Type of event.
    pub event_type: EventType,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Optional details.
    pub details: Option<String>,
}

impl TraceEvent {
    /// Create a new trace event.
    pub fn new(event_type: EventType, details: Option<String>) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            details,
        }
    }
}

/// Event type enum for trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A new word, sentence, level, page or exercise became active.
    ItemStarted,
    /// The player submitted an answer.
    Submitted,
    /// An answer was judged correct.
    AnswerCorrect,
    /// An answer was judged incorrect.
    AnswerIncorrect,
    /// The attempt limit was reached and the answer revealed.
    AttemptsExhausted,
    /// A whole level or exercise was finished.
    LevelComplete,
    /// Recording started.
    CaptureStarted,
    /// Recording stopped.
    CaptureStopped,
    /// Recording could not start or broke off.
    CaptureFailed,
    /// Speech playback started.
    PlaybackStarted,
    /// Speech playback finished.
    PlaybackFinished,
    /// Speech playback failed or timed out.
    PlaybackFailed,
    /// Moved to another item.
    Navigated,
}
