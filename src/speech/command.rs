//! Terminal implementations of the speech capabilities.

use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::config::SpeechConfig;
use crate::error::{Capability, Result, VentureError};
use crate::speech::{CaptureMode, SpeechRecognizer, SpeechSynthesizer, Utterance};

/// Synthesizer that runs an external speech program such as `espeak` or `say`.
///
/// The program is spawned without waiting; the host collects the exit
/// status with [`SpeechSynthesizer::poll`] and reports it to the game.
#[derive(Debug)]
pub struct CommandSynthesizer {
    program: String,
    base_words_per_minute: u32,
    child: Option<Child>,
}

impl CommandSynthesizer {
    /// Create a synthesizer for the given program.
    pub fn new(program: impl Into<String>, base_words_per_minute: u32) -> Self {
        Self {
            program: program.into(),
            base_words_per_minute,
            child: None,
        }
    }

    /// Create a synthesizer from the speech config section.
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(config.command.clone(), config.base_words_per_minute)
    }

    /// Program that will be run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build the argument list for an utterance.
    ///
    /// espeak and macOS `say` take a words-per-minute flag; anything else
    /// gets the text alone.
    pub fn args_for(&self, utterance: &Utterance) -> Vec<String> {
        let wpm = ((self.base_words_per_minute as f32) * utterance.rate)
            .round()
            .max(1.0) as u32;
        let program = Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.program.as_str());

        match program {
            "espeak" | "espeak-ng" => vec!["-s".to_string(), wpm.to_string(), utterance.text.clone()],
            "say" => vec!["-r".to_string(), wpm.to_string(), utterance.text.clone()],
            _ => vec![utterance.text.clone()],
        }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn is_available(&self) -> bool {
        !self.program.trim().is_empty()
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        if self.child.is_some() {
            return Err(VentureError::invalid_state("speech already in progress"));
        }

        let child = Command::new(&self.program)
            .args(self.args_for(utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                VentureError::capability(
                    Capability::SpeechSynthesis,
                    format!("{} not available: {}", self.program, e),
                )
            })?;

        self.child = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn poll(&mut self) -> Option<Result<()>> {
        let status = match self.child.as_mut()?.try_wait() {
            Ok(Some(status)) => Ok(status),
            Ok(None) => return None,
            Err(e) => Err(e),
        };
        self.child = None;

        Some(match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(VentureError::capability(
                Capability::SpeechSynthesis,
                format!("{} exited with {}", self.program, status),
            )),
            Err(e) => Err(VentureError::capability(
                Capability::SpeechSynthesis,
                e.to_string(),
            )),
        })
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

impl Drop for CommandSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Synthesizer used with `--mute`; every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutedSynthesizer;

impl SpeechSynthesizer for MutedSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&mut self, _utterance: &Utterance) -> Result<()> {
        Err(VentureError::capability(
            Capability::SpeechSynthesis,
            "sound is muted",
        ))
    }

    fn name(&self) -> &'static str {
        "muted"
    }
}

/// Recognizer for terminals: the player types what they said.
///
/// The front-end forwards typed lines to the game as transcripts while a
/// recording is running.
#[derive(Debug, Clone, Default)]
pub struct TypedDictation {
    active: bool,
}

impl TypedDictation {
    /// Create an idle dictation recognizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a capture is running.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl SpeechRecognizer for TypedDictation {
    fn transcription_available(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<CaptureMode> {
        self.active = true;
        Ok(CaptureMode::Transcribing)
    }

    fn stop(&mut self) -> Result<()> {
        self.active = false;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "typed-dictation"
    }
}

/// Recognizer for environments without a microphone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMicrophone;

impl SpeechRecognizer for NoMicrophone {
    fn transcription_available(&self) -> bool {
        false
    }

    fn start(&mut self) -> Result<CaptureMode> {
        Err(VentureError::capability(
            Capability::Microphone,
            "no microphone found",
        ))
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "no-microphone"
    }
}
