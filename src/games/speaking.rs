//! Speaking practice.
//!
//! The player records themselves reading a sentence. While recording, a
//! counter ticks up once per tick period; stopping scores the transcript
//! against the sentence.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::{Config, SpeakingConfig};
use crate::core::{
    Cursor, EffectTimers, EventType, RobotMood, RoundResult, SessionLog, Step, TimerToken, Toast,
};
use crate::error::Result;
use crate::games::{settle_mood, Controller, Narrator};
use crate::speech::{CaptureMode, PlaybackOutcome, SpeechRecognizer, SpeechSynthesizer};

/// Result of toggling the record button.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingOutcome {
    /// Capture started.
    Started(CaptureMode),
    /// Capture stopped and was scored (or left pending for audio-only).
    Stopped(RoundResult),
    /// The microphone could not be opened; nothing is running.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Tick,
    PlaybackTimeout,
}

/// Fraction of expected words found anywhere in the transcript.
///
/// Both texts are lower-cased and split on anything that is not a letter
/// or digit. Repeated expected words count once per occurrence; order is
/// ignored. An empty expected text scores 0.
pub fn similarity(expected: &str, transcript: &str) -> f64 {
    let expected: Vec<String> = tokens(expected).collect();
    if expected.is_empty() {
        return 0.0;
    }
    let heard: HashSet<String> = tokens(transcript).collect();
    let matched = expected.iter().filter(|t| heard.contains(*t)).count();
    matched as f64 / expected.len() as f64
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Controller for the speaking game.
#[derive(Debug)]
pub struct SpeakingGame<S, R> {
    exercises: Vec<String>,
    cursor: Cursor,
    config: SpeakingConfig,
    narrator: Narrator<S>,
    recognizer: R,
    recording: Option<CaptureMode>,
    tick: Option<TimerToken>,
    elapsed_secs: u64,
    transcript: String,
    last_result: RoundResult,
    last_similarity: Option<f64>,
    mood: RobotMood,
    toast: Option<Toast>,
    timers: EffectTimers<Effect>,
    log: SessionLog,
}

impl<S: SpeechSynthesizer, R: SpeechRecognizer> SpeakingGame<S, R> {
    /// Create a game over an ordered list of sentences.
    pub fn new(exercises: Vec<String>, config: &Config, synthesizer: S, recognizer: R) -> Result<Self> {
        let cursor = Cursor::new(exercises.len())?;
        let mut game = Self {
            exercises,
            cursor,
            config: config.speaking.clone(),
            narrator: Narrator::new(synthesizer, &config.speech),
            recognizer,
            recording: None,
            tick: None,
            elapsed_secs: 0,
            transcript: String::new(),
            last_result: RoundResult::Pending,
            last_similarity: None,
            mood: RobotMood::Idle,
            toast: None,
            timers: EffectTimers::new(),
            log: SessionLog::new(),
        };
        game.reset_exercise();
        Ok(game)
    }

    /// The sentence to read.
    pub fn exercise(&self) -> &str {
        &self.exercises[self.cursor.index()]
    }

    /// Index of the current sentence.
    pub fn exercise_index(&self) -> usize {
        self.cursor.index()
    }

    /// Number of sentences.
    pub fn exercise_count(&self) -> usize {
        self.cursor.len()
    }

    /// Check if the microphone is recording.
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// How the current recording captures audio.
    pub fn capture_mode(&self) -> Option<CaptureMode> {
        self.recording
    }

    /// Seconds counted during the current or last recording.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Latest transcript.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Result of the last scored recording.
    pub fn last_result(&self) -> RoundResult {
        self.last_result
    }

    /// Similarity of the last scored recording.
    pub fn last_similarity(&self) -> Option<f64> {
        self.last_similarity
    }

    /// Check if the reference is being spoken.
    pub fn is_playing(&self) -> bool {
        self.narrator.is_busy()
    }

    /// The speech synthesizer.
    pub fn synthesizer(&self) -> &S {
        self.narrator.synthesizer()
    }

    /// The speech recognizer.
    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Start recording, or stop and score if already recording.
    pub fn toggle_recording(&mut self) -> RecordingOutcome {
        if self.recording.is_some() {
            self.stop_recording()
        } else {
            self.start_recording()
        }
    }

    fn start_recording(&mut self) -> RecordingOutcome {
        self.transcript.clear();
        self.last_result = RoundResult::Pending;
        self.last_similarity = None;
        self.elapsed_secs = 0;

        match self.recognizer.start() {
            Ok(mode) => {
                // Recognizers without transcription still record, just without words
                let mode = if self.recognizer.transcription_available() {
                    mode
                } else {
                    CaptureMode::AudioOnly
                };
                self.recording = Some(mode);
                self.tick = Some(
                    self.timers
                        .schedule_repeating(Duration::from_millis(self.config.tick_ms), Effect::Tick),
                );
                self.mood = RobotMood::Listening;
                self.toast = match mode {
                    CaptureMode::Transcribing => None,
                    CaptureMode::AudioOnly => Some(Toast::info(
                        "Recording without live words. Listen back to check yourself!",
                    )),
                };
                self.log.record(
                    EventType::CaptureStarted,
                    Some(format!("{:?}", mode).to_lowercase()),
                );
                tracing::debug!(recognizer = self.recognizer.name(), ?mode, "recording started");
                RecordingOutcome::Started(mode)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(recognizer = self.recognizer.name(), error = %message, "could not start recording");
                self.mood = RobotMood::Surprised;
                self.toast = Some(Toast::error(format!("Can't use the microphone: {}", message)));
                self.log.record(EventType::CaptureFailed, Some(message.clone()));
                RecordingOutcome::Failed(message)
            }
        }
    }

    fn stop_recording(&mut self) -> RecordingOutcome {
        let mode = self.halt_capture();
        self.log.record(EventType::CaptureStopped, Some(self.elapsed_secs.to_string()));

        if mode == Some(CaptureMode::AudioOnly) {
            self.last_result = RoundResult::Pending;
            self.mood = RobotMood::Idle;
            self.toast = Some(Toast::info("Recording saved. Word checking isn't available here."));
            return RecordingOutcome::Stopped(RoundResult::Pending);
        }

        let ratio = similarity(self.exercise(), &self.transcript);
        let result = RoundResult::from_match(ratio >= self.config.success_threshold);
        self.last_similarity = Some(ratio);
        self.last_result = result;
        self.log.record(
            if result == RoundResult::Correct {
                EventType::AnswerCorrect
            } else {
                EventType::AnswerIncorrect
            },
            Some(format!("{:.2}", ratio)),
        );

        if result == RoundResult::Correct {
            self.mood = RobotMood::Happy;
            self.toast = Some(Toast::success("Great reading! You said it clearly!"));
            tracing::info!(exercise = self.cursor.index(), ratio, "speaking exercise passed");
        } else {
            self.mood = RobotMood::Thinking;
            self.toast = Some(Toast::error("Almost! Try reading it again."));
            tracing::debug!(exercise = self.cursor.index(), ratio, "speaking below threshold");
        }
        RecordingOutcome::Stopped(result)
    }

    /// Stop the tick and release the microphone. Returns the mode that was running.
    fn halt_capture(&mut self) -> Option<CaptureMode> {
        if let Some(token) = self.tick.take() {
            self.timers.cancel(token);
        }
        let mode = self.recording.take();
        if mode.is_some() {
            if let Err(e) = self.recognizer.stop() {
                tracing::warn!(recognizer = self.recognizer.name(), error = %e, "failed to stop recording");
            }
        }
        mode
    }

    /// Host callback: a new transcript is available.
    ///
    /// Transcripts replace each other; only the latest counts. Ignored when
    /// not transcribing.
    pub fn on_transcript(&mut self, text: &str) -> bool {
        if self.recording != Some(CaptureMode::Transcribing) {
            return false;
        }
        self.transcript = text.to_string();
        true
    }

    /// Host callback: capture broke off (permission revoked, device lost).
    pub fn on_capture_error(&mut self, message: &str) {
        if self.halt_capture().is_none() {
            return;
        }
        tracing::warn!(error = message, "recording failed");
        self.mood = RobotMood::Surprised;
        self.toast = Some(Toast::error(format!("Recording stopped: {}", message)));
        self.log.record(EventType::CaptureFailed, Some(message.to_string()));
    }

    /// Speak the sentence as a model to copy.
    pub fn play_reference(&mut self) -> PlaybackOutcome {
        let text = self.exercise().to_string();
        let outcome = self
            .narrator
            .play(&text, &mut self.timers, Effect::PlaybackTimeout, &mut self.log);
        match &outcome {
            PlaybackOutcome::Started => {
                if self.recording.is_none() {
                    self.mood = RobotMood::Listening;
                }
            }
            PlaybackOutcome::Failed(message) => {
                self.toast = Some(Toast::error(format!("Can't play sound: {}", message)));
            }
            PlaybackOutcome::Busy => {}
        }
        outcome
    }

    /// Host callback: the reference finished playing.
    pub fn on_playback_finished(&mut self) {
        if self.narrator.finished(&mut self.timers, &mut self.log) && self.recording.is_none() {
            self.mood = settle_mood(self.mood);
        }
    }

    /// Host callback: playback failed.
    pub fn on_playback_error(&mut self, message: &str) {
        if self.narrator.failed(&mut self.timers, message, &mut self.log) {
            if self.recording.is_none() {
                self.mood = settle_mood(self.mood);
            }
            self.toast = Some(Toast::error(format!("Can't play sound: {}", message)));
        }
    }

    /// Deliver the end of playback from a polled synthesizer.
    pub fn poll_playback(&mut self) {
        match self.narrator.poll() {
            Some(Ok(())) => self.on_playback_finished(),
            Some(Err(e)) => self.on_playback_error(&e.to_string()),
            None => {}
        }
    }

    /// Go to the next sentence, starting over after the last one.
    pub fn next_exercise(&mut self) -> Step {
        let step = self.cursor.next_wrapping();
        self.log.record(EventType::Navigated, Some("next".to_string()));
        self.reset_exercise();
        if step == Step::Wrapped {
            self.toast = Some(Toast::info("All done! Starting again from the first one."));
        }
        step
    }

    /// Go to the previous sentence, stopping at the first one.
    pub fn previous_exercise(&mut self) -> Step {
        let step = self.cursor.previous_clamped();
        if step.changed() {
            self.log.record(EventType::Navigated, Some("previous".to_string()));
            self.reset_exercise();
        }
        step
    }

    fn reset_exercise(&mut self) {
        self.halt_capture();
        self.narrator.silence();
        self.timers.cancel_all();

        self.elapsed_secs = 0;
        self.transcript.clear();
        self.last_result = RoundResult::Pending;
        self.last_similarity = None;
        self.mood = RobotMood::Idle;
        self.toast = None;

        let text = self.exercise().to_string();
        self.log.record(EventType::ItemStarted, Some(text));
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Tick => {
                if self.recording.is_some() {
                    self.elapsed_secs += 1;
                }
            }
            Effect::PlaybackTimeout => {
                if self.narrator.expire(&mut self.log) && self.recording.is_none() {
                    self.mood = settle_mood(self.mood);
                }
            }
        }
    }
}

impl<S: SpeechSynthesizer, R: SpeechRecognizer> Controller for SpeakingGame<S, R> {
    fn advance(&mut self, elapsed: Duration) {
        let until = self.timers.now() + elapsed;
        while let Some(effect) = self.timers.fire_next(until) {
            self.apply(effect);
        }
        self.timers.advance_to(until);
    }

    fn mood(&self) -> RobotMood {
        self.mood
    }

    fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    fn log(&self) -> &SessionLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToastKind;
    use crate::speech::testing::{RecordingSynthesizer, ScriptedRecognizer};

    type Game = SpeakingGame<RecordingSynthesizer, ScriptedRecognizer>;

    fn game_with(recognizer: ScriptedRecognizer) -> Game {
        SpeakingGame::new(
            vec![
                "The rocket flies to the moon".to_string(),
                "I see a star".to_string(),
                "Hello robot".to_string(),
            ],
            &Config::default(),
            RecordingSynthesizer::default(),
            recognizer,
        )
        .unwrap()
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_similarity_bag_overlap() {
        assert_eq!(similarity("the cat sat", "sat the cat"), 1.0);
        assert_eq!(similarity("The Cat", "the dog"), 0.5);
        assert_eq!(similarity("", "anything"), 0.0);
        assert_eq!(similarity("moon", ""), 0.0);
    }

    #[test]
    fn test_similarity_ignores_punctuation_and_case() {
        assert_eq!(similarity("Hello, Robot!", "hello robot"), 1.0);
    }

    #[test]
    fn test_similarity_counts_repeated_expected_words() {
        // "the" appears twice in the expected text; both count when heard once
        let ratio = similarity("the rocket flies to the moon", "the rocket moon");
        assert!((ratio - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_start_runs_timer() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        assert_eq!(
            g.toggle_recording(),
            RecordingOutcome::Started(CaptureMode::Transcribing)
        );
        assert!(g.is_recording());
        assert_eq!(g.mood(), RobotMood::Listening);

        g.advance(secs(3));
        assert_eq!(g.elapsed_secs(), 3);
        g.advance(Duration::from_millis(500));
        assert_eq!(g.elapsed_secs(), 3);
    }

    #[test]
    fn test_stop_scores_success_at_threshold() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        g.toggle_recording();
        g.on_transcript("rocket flies to the");

        // 5 of 6 expected words are heard ("the" twice)
        assert_eq!(
            g.toggle_recording(),
            RecordingOutcome::Stopped(RoundResult::Correct)
        );
        assert!(!g.is_recording());
        assert_eq!(g.mood(), RobotMood::Happy);
        assert_eq!(g.recognizer().stops, 1);
    }

    #[test]
    fn test_stop_below_threshold_is_error() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        g.toggle_recording();
        g.on_transcript("the moon");

        assert_eq!(
            g.toggle_recording(),
            RecordingOutcome::Stopped(RoundResult::Incorrect)
        );
        assert_eq!(g.toast().unwrap().kind, ToastKind::Error);
        assert!(g.last_similarity().unwrap() < 0.70);
    }

    #[test]
    fn test_timer_stops_with_recording() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        g.toggle_recording();
        g.advance(secs(2));
        g.toggle_recording();
        g.advance(secs(5));

        assert_eq!(g.elapsed_secs(), 2);
        assert_eq!(g.timers.pending_count(), 0);
    }

    #[test]
    fn test_denied_microphone_leaves_nothing_running() {
        let mut g = game_with(ScriptedRecognizer::denied());

        let outcome = g.toggle_recording();
        assert!(matches!(outcome, RecordingOutcome::Failed(msg) if msg.contains("permission denied")));
        assert!(!g.is_recording());
        assert_eq!(g.mood(), RobotMood::Surprised);
        assert_eq!(g.toast().unwrap().kind, ToastKind::Error);

        g.advance(secs(5));
        assert_eq!(g.elapsed_secs(), 0);
        assert_eq!(g.log().count(EventType::CaptureFailed), 1);
    }

    #[test]
    fn test_audio_only_capture_is_not_scored() {
        let mut g = game_with(ScriptedRecognizer::audio_only());
        assert_eq!(
            g.toggle_recording(),
            RecordingOutcome::Started(CaptureMode::AudioOnly)
        );
        assert_eq!(g.toast().unwrap().kind, ToastKind::Info);
        assert!(!g.on_transcript("the rocket flies to the moon"));

        assert_eq!(
            g.toggle_recording(),
            RecordingOutcome::Stopped(RoundResult::Pending)
        );
        assert_eq!(g.last_similarity(), None);
    }

    #[test]
    fn test_no_transcription_falls_back_to_audio_only() {
        let mut recognizer = ScriptedRecognizer::transcribing();
        recognizer.transcribes = false;
        let mut g = game_with(recognizer);

        assert_eq!(
            g.toggle_recording(),
            RecordingOutcome::Started(CaptureMode::AudioOnly)
        );
        assert_eq!(g.capture_mode(), Some(CaptureMode::AudioOnly));
        assert!(!g.on_transcript("the rocket flies to the moon"));
        assert_eq!(
            g.toggle_recording(),
            RecordingOutcome::Stopped(RoundResult::Pending)
        );
    }

    #[test]
    fn test_transcript_ignored_when_idle() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        assert!(!g.on_transcript("hello"));
        assert_eq!(g.transcript(), "");
    }

    #[test]
    fn test_capture_error_restores_control() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        g.toggle_recording();
        g.advance(secs(1));
        g.on_capture_error("permission revoked");

        assert!(!g.is_recording());
        assert_eq!(g.toast().unwrap().kind, ToastKind::Error);
        g.advance(secs(3));
        assert_eq!(g.elapsed_secs(), 1);

        // The button works again
        assert!(matches!(g.toggle_recording(), RecordingOutcome::Started(_)));
    }

    #[test]
    fn test_stop_failure_still_stops() {
        let mut recognizer = ScriptedRecognizer::transcribing();
        recognizer.fail_stop = true;
        let mut g = game_with(recognizer);
        g.toggle_recording();
        g.toggle_recording();

        assert!(!g.is_recording());
    }

    #[test]
    fn test_next_wraps_with_notice() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        assert_eq!(g.next_exercise(), Step::Moved);
        assert!(g.toast().is_none());
        g.next_exercise();

        assert_eq!(g.next_exercise(), Step::Wrapped);
        assert_eq!(g.exercise_index(), 0);
        assert_eq!(g.toast().unwrap().kind, ToastKind::Info);
    }

    #[test]
    fn test_previous_is_clamped() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        assert_eq!(g.previous_exercise(), Step::Stayed);
        assert_eq!(g.exercise_index(), 0);
    }

    #[test]
    fn test_navigation_resets_recording_state() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        g.toggle_recording();
        g.on_transcript("the rocket");
        g.advance(secs(2));
        g.next_exercise();

        assert!(!g.is_recording());
        assert_eq!(g.recognizer().stops, 1);
        assert_eq!(g.transcript(), "");
        assert_eq!(g.elapsed_secs(), 0);
        assert_eq!(g.last_result(), RoundResult::Pending);

        g.advance(secs(3));
        assert_eq!(g.elapsed_secs(), 0);
    }

    #[test]
    fn test_play_reference_single_flight() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        assert_eq!(g.play_reference(), PlaybackOutcome::Started);
        assert_eq!(g.play_reference(), PlaybackOutcome::Busy);
        assert_eq!(g.synthesizer().spoken[0].text, "The rocket flies to the moon");

        g.on_playback_error("voice missing");
        assert!(!g.is_playing());
        assert_eq!(g.play_reference(), PlaybackOutcome::Started);
    }

    #[test]
    fn test_playback_timeout_reenables() {
        let mut g = game_with(ScriptedRecognizer::transcribing());
        g.play_reference();
        g.advance(secs(10));
        assert!(!g.is_playing());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: result is Correct iff matched/expected >= threshold
            #[test]
            fn prop_threshold_classification(
                expected in prop::collection::vec("[a-z]{1,6}", 1..10),
                keep in prop::collection::vec(any::<bool>(), 10),
            ) {
                let sentence = expected.join(" ");
                let heard: Vec<&str> = expected
                    .iter()
                    .zip(keep.iter())
                    .filter(|(_, k)| **k)
                    .map(|(w, _)| w.as_str())
                    .collect();
                let transcript = heard.join(" ");

                let mut g = SpeakingGame::new(
                    vec![sentence.clone()],
                    &Config::default(),
                    RecordingSynthesizer::default(),
                    ScriptedRecognizer::transcribing(),
                ).unwrap();
                g.toggle_recording();
                g.on_transcript(&transcript);
                let outcome = g.toggle_recording();

                let ratio = similarity(&sentence, &transcript);
                prop_assert!((0.0..=1.0).contains(&ratio));
                let expected_result = RoundResult::from_match(ratio >= 0.70);
                prop_assert_eq!(outcome, RecordingOutcome::Stopped(expected_result));
            }

            // Property: index stays in bounds; next wraps, previous clamps
            #[test]
            fn prop_exercise_index_in_bounds(moves in prop::collection::vec(any::<bool>(), 0..40)) {
                let mut g = SpeakingGame::new(
                    vec!["a".to_string(), "b".to_string(), "c".to_string()],
                    &Config::default(),
                    RecordingSynthesizer::default(),
                    ScriptedRecognizer::transcribing(),
                ).unwrap();
                for forward in moves {
                    let before = g.exercise_index();
                    let step = if forward { g.next_exercise() } else { g.previous_exercise() };
                    prop_assert!(g.exercise_index() < 3);
                    if !forward {
                        prop_assert_ne!(step, Step::Wrapped);
                        if before == 0 {
                            prop_assert_eq!(step, Step::Stayed);
                        }
                    }
                }
            }
        }
    }
}
