//! Speech capabilities used by the games.
//!
//! Text-to-speech and speech-to-text are external: the controller asks for
//! playback or capture and the host reports back through the controller's
//! callbacks. Either side may be missing or may fail at any time, so every
//! request the controllers make is paired with a path that re-enables the
//! control (completion, error, or the playback timeout).

pub mod command;
pub mod gate;

pub use command::{CommandSynthesizer, MutedSynthesizer, NoMicrophone, TypedDictation};
pub use gate::{PlaybackGate, PlaybackOutcome};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A piece of text to be spoken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Text to speak.
    pub text: String,
    /// Speaking rate, 1.0 is normal speed.
    pub rate: f32,
}

impl Utterance {
    /// Create a new utterance.
    pub fn new(text: impl Into<String>, rate: f32) -> Self {
        Self {
            text: text.into(),
            rate,
        }
    }
}

/// Text-to-speech capability.
pub trait SpeechSynthesizer {
    /// Check whether speech can be produced at all.
    fn is_available(&self) -> bool;

    /// Start speaking.
    ///
    /// `Ok` means the request was accepted; completion or failure is
    /// reported later through the controller's playback callbacks.
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Stop any speech in progress.
    fn cancel(&mut self) {}

    /// Check, without blocking, whether the last utterance has ended.
    ///
    /// Hosts that cannot deliver callbacks poll this instead. `None` means
    /// still speaking or nothing to report.
    fn poll(&mut self) -> Option<Result<()>> {
        None
    }

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// How a recording session captures the player's voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Live transcription is running; transcripts will arrive.
    Transcribing,
    /// Audio only; no transcript will arrive.
    AudioOnly,
}

/// Microphone and speech-to-text capability.
pub trait SpeechRecognizer {
    /// Check whether live transcription is supported.
    fn transcription_available(&self) -> bool;

    /// Open the microphone and begin capture.
    ///
    /// Fails when the microphone is missing or permission is denied. When
    /// transcription is unsupported, capture still starts in
    /// [`CaptureMode::AudioOnly`].
    fn start(&mut self) -> Result<CaptureMode>;

    /// Stop capture and release the microphone.
    fn stop(&mut self) -> Result<()>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Box<T> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        (**self).speak(utterance)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }

    fn poll(&mut self) -> Option<Result<()>> {
        (**self).poll()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<T: SpeechRecognizer + ?Sized> SpeechRecognizer for Box<T> {
    fn transcription_available(&self) -> bool {
        (**self).transcription_available()
    }

    fn start(&mut self) -> Result<CaptureMode> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
