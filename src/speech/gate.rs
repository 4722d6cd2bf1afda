//! Single-flight guard for speech playback.
//!
//! At most one utterance per controller is in flight. A request while one is
//! playing is refused rather than queued, and every accepted request arms a
//! timeout so a synthesizer that never calls back cannot leave the play
//! button disabled.

use std::time::Duration;

use crate::core::{EffectTimers, TimerToken};
use crate::speech::{SpeechSynthesizer, Utterance};

/// Result of asking for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The synthesizer accepted the utterance.
    Started,
    /// Something is already playing; nothing was requested.
    Busy,
    /// The synthesizer refused; the control stays enabled.
    Failed(String),
}

/// Tracks whether playback is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackGate {
    timeout: Option<TimerToken>,
}

impl PlaybackGate {
    /// Create an idle gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if playback is in flight (the play control is disabled).
    pub fn is_busy(&self) -> bool {
        self.timeout.is_some()
    }

    /// Ask the synthesizer to speak, unless something is already playing.
    ///
    /// On success `timeout_effect` is scheduled after `timeout`; the owner
    /// must call [`PlaybackGate::expire`] when it fires.
    pub fn request<S, E>(
        &mut self,
        synthesizer: &mut S,
        utterance: &Utterance,
        timers: &mut EffectTimers<E>,
        timeout: Duration,
        timeout_effect: E,
    ) -> PlaybackOutcome
    where
        S: SpeechSynthesizer + ?Sized,
        E: Clone,
    {
        if self.is_busy() {
            return PlaybackOutcome::Busy;
        }
        if !synthesizer.is_available() {
            tracing::debug!(synthesizer = synthesizer.name(), "speech unavailable");
            return PlaybackOutcome::Failed(format!(
                "no speech available ({})",
                synthesizer.name()
            ));
        }

        match synthesizer.speak(utterance) {
            Ok(()) => {
                self.timeout = Some(timers.schedule(timeout, timeout_effect));
                PlaybackOutcome::Started
            }
            Err(e) => {
                tracing::warn!(
                    synthesizer = synthesizer.name(),
                    error = %e,
                    "speech playback refused"
                );
                PlaybackOutcome::Failed(e.to_string())
            }
        }
    }

    /// Playback finished or failed; re-enable the control.
    ///
    /// Returns false if nothing was in flight (a late or duplicate callback).
    pub fn finish<E: Clone>(&mut self, timers: &mut EffectTimers<E>) -> bool {
        match self.timeout.take() {
            Some(token) => {
                timers.cancel(token);
                true
            }
            None => false,
        }
    }

    /// The timeout fired; re-enable the control.
    pub fn expire(&mut self) -> bool {
        self.timeout.take().is_some()
    }

    /// Forget any in-flight playback. Used after the owner cancels all timers.
    pub fn reset(&mut self) {
        self.timeout = None;
    }
}
