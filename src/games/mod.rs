//! Per-game controllers.
//!
//! Each controller owns its content, its session state, one effect
//! scheduler and whatever speech capabilities it needs. Views call the
//! transition methods, read the accessors, and drive time with
//! [`Controller::advance`].

pub mod alphabet;
pub mod listening;
pub mod matching;
pub mod reading;
pub mod speaking;
pub mod writing;

pub use alphabet::AlphabetGame;
pub use listening::{Key, ListeningGame, SubmitOutcome};
pub use matching::{ColumnLayout, Connector, MatchOutcome, MatchingGame, Point, Viewport};
pub use reading::{AnswerOutcome, ReadingGame};
pub use speaking::{similarity, RecordingOutcome, SpeakingGame};
pub use writing::{KeyJudgement, WritingGame};

use std::time::Duration;

use crate::config::SpeechConfig;
use crate::core::{EffectTimers, EventType, RobotMood, SessionLog, Toast};
use crate::error::Result;
use crate::speech::{PlaybackGate, PlaybackOutcome, SpeechSynthesizer, Utterance};

/// Surface shared by every game controller.
pub trait Controller {
    /// Let `elapsed` of time pass, firing any transient effects that came due.
    fn advance(&mut self, elapsed: Duration);

    /// Current robot guide expression.
    fn mood(&self) -> RobotMood;

    /// Message currently shown, if any.
    fn toast(&self) -> Option<&Toast>;

    /// Trace of this session.
    fn log(&self) -> &SessionLog;
}

/// A synthesizer behind a single-flight playback gate.
#[derive(Debug)]
pub struct Narrator<S> {
    synthesizer: S,
    gate: PlaybackGate,
    rate: f32,
    timeout: Duration,
}

impl<S: SpeechSynthesizer> Narrator<S> {
    /// Wrap a synthesizer using the rate and timeout from the speech config.
    pub fn new(synthesizer: S, config: &SpeechConfig) -> Self {
        Self {
            synthesizer,
            gate: PlaybackGate::new(),
            rate: config.rate,
            timeout: config.playback_timeout(),
        }
    }

    /// The wrapped synthesizer.
    pub fn synthesizer(&self) -> &S {
        &self.synthesizer
    }

    /// Check if playback is in flight.
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Speak `text`, arming `timeout_effect` on success.
    pub fn play<E: Clone>(
        &mut self,
        text: &str,
        timers: &mut EffectTimers<E>,
        timeout_effect: E,
        log: &mut SessionLog,
    ) -> PlaybackOutcome {
        let utterance = Utterance::new(text, self.rate);
        let outcome = self.gate.request(
            &mut self.synthesizer,
            &utterance,
            timers,
            self.timeout,
            timeout_effect,
        );
        match &outcome {
            PlaybackOutcome::Started => log.record(EventType::PlaybackStarted, Some(text.to_string())),
            PlaybackOutcome::Failed(message) => {
                log.record(EventType::PlaybackFailed, Some(message.clone()))
            }
            PlaybackOutcome::Busy => {}
        }
        outcome
    }

    /// Host reports that playback ended. Returns false for stale callbacks.
    pub fn finished<E: Clone>(&mut self, timers: &mut EffectTimers<E>, log: &mut SessionLog) -> bool {
        let was_busy = self.gate.finish(timers);
        if was_busy {
            log.record(EventType::PlaybackFinished, None);
        }
        was_busy
    }

    /// Host reports a playback error. Returns false for stale callbacks.
    pub fn failed<E: Clone>(
        &mut self,
        timers: &mut EffectTimers<E>,
        message: &str,
        log: &mut SessionLog,
    ) -> bool {
        let was_busy = self.gate.finish(timers);
        if was_busy {
            tracing::warn!(error = message, "speech playback failed");
            log.record(EventType::PlaybackFailed, Some(message.to_string()));
        }
        was_busy
    }

    /// The playback timeout fired.
    pub fn expire(&mut self, log: &mut SessionLog) -> bool {
        let expired = self.gate.expire();
        if expired {
            tracing::warn!(synthesizer = self.synthesizer.name(), "speech playback timed out");
            self.synthesizer.cancel();
            log.record(EventType::PlaybackFailed, Some("timed out".to_string()));
        }
        expired
    }

    /// Ask a polled synthesizer whether in-flight playback has ended.
    pub fn poll(&mut self) -> Option<Result<()>> {
        if !self.gate.is_busy() {
            return None;
        }
        self.synthesizer.poll()
    }

    /// Stop anything in flight. The owner must also cancel its timers.
    pub fn silence(&mut self) {
        if self.gate.is_busy() {
            self.synthesizer.cancel();
        }
        self.gate.reset();
    }
}

/// Mood to show once speech stops, keeping any mood set meanwhile.
pub(crate) fn settle_mood(mood: RobotMood) -> RobotMood {
    if mood == RobotMood::Listening {
        RobotMood::Idle
    } else {
        mood
    }
}
