//! Core building blocks shared by every game controller.
//!
//! Result and feedback types, the robot guide's moods, the cancellable
//! effect scheduler, bounded cursors, and the session trace.

pub mod cursor;
pub mod state;
pub mod timers;

pub use cursor::{Cursor, Step};
pub use state::{
    EventType, RobotMood, RoundResult, SessionLog, Toast, ToastKind, TraceEvent,
    MAX_TRACE_EVENTS,
};
pub use timers::{EffectTimers, TimerToken};
