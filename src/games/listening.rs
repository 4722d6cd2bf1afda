//! Listening and spelling game.
//!
//! The player hears a word and spells it on a letter keyboard. A wrong
//! spelling shakes the board; after the attempt limit the word is revealed
//! and the round ends.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Config, ListeningConfig};
use crate::core::{EffectTimers, EventType, RobotMood, RoundResult, SessionLog, Toast};
use crate::error::{Result, VentureError};
use crate::games::{settle_mood, Controller, Narrator};
use crate::speech::{PlaybackOutcome, SpeechSynthesizer};

/// A key on the on-screen letter keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A letter key.
    Letter(char),
    /// Remove the last letter.
    Delete,
}

/// Result of submitting a spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing to judge (empty input or round already over).
    Ignored,
    /// Spelled correctly; the round is complete.
    Correct,
    /// Wrong spelling; `attempts` failures so far.
    Incorrect {
        /// Failed attempts this round.
        attempts: u32,
    },
    /// Attempt limit reached; the round is complete and the word shown.
    Revealed {
        /// The target word.
        word: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    ClearShake,
    EndCelebration,
    PlaybackTimeout,
}

/// Controller for the listening game.
#[derive(Debug)]
pub struct ListeningGame<S> {
    words: Vec<String>,
    config: ListeningConfig,
    narrator: Narrator<S>,
    rng: StdRng,
    target: String,
    input: String,
    attempts: u32,
    completed: bool,
    last_result: RoundResult,
    revealed: Option<String>,
    shaking: bool,
    celebrating: bool,
    mood: RobotMood,
    toast: Option<Toast>,
    timers: EffectTimers<Effect>,
    log: SessionLog,
}

impl<S: SpeechSynthesizer> ListeningGame<S> {
    /// Create a game over `words` with a randomly seeded draw.
    pub fn new(words: Vec<String>, config: &Config, synthesizer: S) -> Result<Self> {
        Self::with_rng(words, config, synthesizer, StdRng::from_entropy())
    }

    /// Create a game with a caller-supplied random source.
    pub fn with_rng(
        words: Vec<String>,
        config: &Config,
        synthesizer: S,
        rng: StdRng,
    ) -> Result<Self> {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Err(VentureError::content("listening game needs at least one word"));
        }

        let mut game = Self {
            words,
            config: config.listening.clone(),
            narrator: Narrator::new(synthesizer, &config.speech),
            rng,
            target: String::new(),
            input: String::new(),
            attempts: 0,
            completed: false,
            last_result: RoundResult::Pending,
            revealed: None,
            shaking: false,
            celebrating: false,
            mood: RobotMood::Idle,
            toast: None,
            timers: EffectTimers::new(),
            log: SessionLog::new(),
        };
        game.next();
        Ok(game)
    }

    /// Word the player has to spell.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Letters typed so far.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Failed attempts this round.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempts left before the word is revealed.
    pub fn remaining_attempts(&self) -> u32 {
        self.config.max_attempts.saturating_sub(self.attempts)
    }

    /// Check if the round is over.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// How the last submission was judged.
    pub fn last_result(&self) -> RoundResult {
        self.last_result
    }

    /// The word, once revealed after too many attempts.
    pub fn revealed(&self) -> Option<&str> {
        self.revealed.as_deref()
    }

    /// Check if the shake effect is showing.
    pub fn is_shaking(&self) -> bool {
        self.shaking
    }

    /// Check if the celebration effect is showing.
    pub fn is_celebrating(&self) -> bool {
        self.celebrating
    }

    /// Check if the word is being spoken (the play button is disabled).
    pub fn is_playing(&self) -> bool {
        self.narrator.is_busy()
    }

    /// The speech synthesizer.
    pub fn synthesizer(&self) -> &S {
        self.narrator.synthesizer()
    }

    /// Handle a keyboard key. Returns true if the input changed.
    pub fn press(&mut self, key: Key) -> bool {
        if self.completed {
            return false;
        }
        match key {
            Key::Letter(c) if c.is_alphabetic() => {
                self.input.extend(c.to_lowercase());
            }
            Key::Letter(_) => return false,
            Key::Delete => {
                if self.input.pop().is_none() {
                    return false;
                }
            }
        }
        if self.mood == RobotMood::Idle || self.mood == RobotMood::Sad {
            self.mood = RobotMood::Thinking;
        }
        true
    }

    /// Judge the current input against the target word.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.completed {
            return SubmitOutcome::Ignored;
        }
        let guess = self.input.trim().to_lowercase();
        if guess.is_empty() {
            tracing::debug!("empty spelling ignored");
            return SubmitOutcome::Ignored;
        }

        self.log.record(EventType::Submitted, Some(guess.clone()));

        if guess == self.target {
            self.completed = true;
            self.last_result = RoundResult::Correct;
            self.celebrating = true;
            self.shaking = false;
            self.mood = RobotMood::Celebrating;
            self.toast = Some(Toast::success(format!(
                "Great job! You spelled {}!",
                self.target
            )));
            self.timers.cancel_matching(|e| *e == Effect::ClearShake);
            self.timers.schedule(
                Duration::from_millis(self.config.celebration_ms),
                Effect::EndCelebration,
            );
            self.log.record(EventType::AnswerCorrect, Some(self.target.clone()));
            tracing::info!(word = %self.target, attempts = self.attempts, "word spelled");
            return SubmitOutcome::Correct;
        }

        self.attempts += 1;
        self.last_result = RoundResult::Incorrect;
        self.log.record(EventType::AnswerIncorrect, Some(guess.clone()));
        tracing::debug!(guess = %guess, attempts = self.attempts, "spelling mismatch");

        if self.attempts >= self.config.max_attempts {
            self.completed = true;
            self.shaking = false;
            self.revealed = Some(self.target.clone());
            self.mood = RobotMood::Thinking;
            self.toast = Some(Toast::info(format!("The word was {}.", self.target)));
            self.timers.cancel_matching(|e| *e == Effect::ClearShake);
            self.log
                .record(EventType::AttemptsExhausted, Some(self.target.clone()));
            return SubmitOutcome::Revealed {
                word: self.target.clone(),
            };
        }

        self.shaking = true;
        self.mood = RobotMood::Sad;
        self.toast = Some(Toast::error("Not quite. Try again!"));
        self.timers.cancel_matching(|e| *e == Effect::ClearShake);
        self.timers.schedule(
            Duration::from_millis(self.config.shake_ms),
            Effect::ClearShake,
        );
        SubmitOutcome::Incorrect {
            attempts: self.attempts,
        }
    }

    /// Draw a new word and start a fresh round.
    ///
    /// Draws are independent, so the same word can come up again.
    pub fn next(&mut self) {
        self.timers.cancel_all();
        self.narrator.silence();

        let index = self.rng.gen_range(0..self.words.len());
        self.target = self.words[index].clone();
        self.input.clear();
        self.attempts = 0;
        self.completed = false;
        self.last_result = RoundResult::Pending;
        self.revealed = None;
        self.shaking = false;
        self.celebrating = false;
        self.mood = RobotMood::Idle;
        self.toast = None;

        self.log.record(EventType::ItemStarted, Some(self.target.clone()));
    }

    /// Speak the target word.
    pub fn play_word(&mut self) -> PlaybackOutcome {
        let outcome = self.narrator.play(
            &self.target,
            &mut self.timers,
            Effect::PlaybackTimeout,
            &mut self.log,
        );
        match &outcome {
            PlaybackOutcome::Started => self.mood = RobotMood::Listening,
            PlaybackOutcome::Failed(message) => {
                self.toast = Some(Toast::error(format!("Can't play sound: {}", message)));
            }
            PlaybackOutcome::Busy => {}
        }
        outcome
    }

    /// Host callback: the word finished playing.
    pub fn on_playback_finished(&mut self) {
        if self.narrator.finished(&mut self.timers, &mut self.log) {
            self.mood = settle_mood(self.mood);
        }
    }

    /// Host callback: playback failed.
    pub fn on_playback_error(&mut self, message: &str) {
        if self.narrator.failed(&mut self.timers, message, &mut self.log) {
            self.mood = settle_mood(self.mood);
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

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ClearShake => self.shaking = false,
            Effect::EndCelebration => {
                self.celebrating = false;
                if self.mood == RobotMood::Celebrating {
                    self.mood = RobotMood::Happy;
                }
            }
            Effect::PlaybackTimeout => {
                if self.narrator.expire(&mut self.log) {
                    self.mood = settle_mood(self.mood);
                }
            }
        }
    }
}

impl<S: SpeechSynthesizer> Controller for ListeningGame<S> {
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
    use crate::speech::testing::RecordingSynthesizer;

    fn game_with(words: &[&str]) -> ListeningGame<RecordingSynthesizer> {
        ListeningGame::with_rng(
            words.iter().map(|w| w.to_string()).collect(),
            &Config::default(),
            RecordingSynthesizer::default(),
            StdRng::seed_from_u64(7),
        )
        .unwrap()
    }

    fn type_word(game: &mut ListeningGame<RecordingSynthesizer>, word: &str) {
        for c in word.chars() {
            game.press(Key::Letter(c));
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_new_rejects_empty_word_list() {
        let result = ListeningGame::new(
            vec!["  ".to_string()],
            &Config::default(),
            RecordingSynthesizer::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_correct_spelling_completes_round() {
        let mut game = game_with(&["cat"]);
        type_word(&mut game, "cat");

        assert_eq!(game.submit(), SubmitOutcome::Correct);
        assert!(game.is_completed());
        assert_eq!(game.last_result(), RoundResult::Correct);
        assert!(game.is_celebrating());
        assert_eq!(game.mood(), RobotMood::Celebrating);
        assert_eq!(game.toast().unwrap().kind, crate::core::ToastKind::Success);
    }

    #[test]
    fn test_celebration_ends_after_three_seconds() {
        let mut game = game_with(&["cat"]);
        type_word(&mut game, "cat");
        game.submit();

        game.advance(ms(2999));
        assert!(game.is_celebrating());
        game.advance(ms(1));
        assert!(!game.is_celebrating());
        assert_eq!(game.mood(), RobotMood::Happy);
    }

    #[test]
    fn test_wrong_spelling_counts_attempt_and_shakes() {
        let mut game = game_with(&["cat"]);
        type_word(&mut game, "dog");

        assert_eq!(game.submit(), SubmitOutcome::Incorrect { attempts: 1 });
        assert_eq!(game.attempts(), 1);
        assert!(game.is_shaking());
        assert!(!game.is_completed());
        assert_eq!(game.input(), "dog");
        assert_eq!(game.remaining_attempts(), 4);
    }

    #[test]
    fn test_shake_clears_after_500ms() {
        let mut game = game_with(&["cat"]);
        type_word(&mut game, "dog");
        game.submit();

        game.advance(ms(499));
        assert!(game.is_shaking());
        game.advance(ms(1));
        assert!(!game.is_shaking());
    }

    #[test]
    fn test_resubmit_restarts_shake_window() {
        let mut game = game_with(&["cat"]);
        type_word(&mut game, "dog");
        game.submit();
        game.advance(ms(400));
        game.submit();

        game.advance(ms(400));
        assert!(game.is_shaking());
        game.advance(ms(100));
        assert!(!game.is_shaking());
    }

    #[test]
    fn test_fifth_failure_reveals_word() {
        let mut game = game_with(&["cat"]);
        type_word(&mut game, "cot");
        for attempt in 1..5 {
            assert_eq!(game.submit(), SubmitOutcome::Incorrect { attempts: attempt });
        }

        assert_eq!(
            game.submit(),
            SubmitOutcome::Revealed {
                word: "cat".to_string()
            }
        );
        assert!(game.is_completed());
        assert_eq!(game.revealed(), Some("cat"));
        assert_eq!(game.last_result(), RoundResult::Incorrect);
        assert_eq!(game.log().count(EventType::AttemptsExhausted), 1);
        assert!(!game.is_shaking());
    }

    #[test]
    fn test_empty_submit_is_ignored() {
        let mut game = game_with(&["cat"]);
        assert_eq!(game.submit(), SubmitOutcome::Ignored);

        game.press(Key::Letter(' '));
        assert_eq!(game.submit(), SubmitOutcome::Ignored);
        assert_eq!(game.attempts(), 0);
        assert_eq!(game.log().count(EventType::Submitted), 0);
    }

    #[test]
    fn test_keys_are_lowercased_and_filtered() {
        let mut game = game_with(&["cat"]);
        assert!(game.press(Key::Letter('C')));
        assert!(!game.press(Key::Letter('1')));
        assert!(game.press(Key::Letter('a')));
        assert!(game.press(Key::Delete));
        assert_eq!(game.input(), "c");

        game.press(Key::Delete);
        assert!(!game.press(Key::Delete));
    }

    #[test]
    fn test_keys_ignored_after_completion() {
        let mut game = game_with(&["cat"]);
        type_word(&mut game, "CAT");
        game.submit();

        assert!(!game.press(Key::Letter('x')));
        assert_eq!(game.submit(), SubmitOutcome::Ignored);
    }

    #[test]
    fn test_next_resets_round() {
        let mut game = game_with(&["cat", "dog"]);
        type_word(&mut game, "zzz");
        game.submit();
        game.next();

        assert_eq!(game.input(), "");
        assert_eq!(game.attempts(), 0);
        assert!(!game.is_completed());
        assert_eq!(game.last_result(), RoundResult::Pending);
        assert!(!game.is_shaking());
        assert!(game.toast().is_none());
        assert!(["cat", "dog"].contains(&game.target()));
    }

    #[test]
    fn test_stale_shake_does_not_reach_next_round() {
        let mut game = game_with(&["cat"]);
        type_word(&mut game, "dog");
        game.submit();
        game.advance(ms(300));

        game.next();
        type_word(&mut game, "dog");
        game.submit();

        // The first round's timer would have fired at 500ms
        game.advance(ms(300));
        assert!(game.is_shaking());
    }

    #[test]
    fn test_seeded_games_draw_same_words() {
        let words = ["sun", "moon", "star", "comet", "orbit"];
        let mut a = game_with(&words);
        let mut b = game_with(&words);
        for _ in 0..10 {
            assert_eq!(a.target(), b.target());
            a.next();
            b.next();
        }
    }

    #[test]
    fn test_play_word_blocks_until_finished() {
        let mut game = game_with(&["moon"]);

        assert_eq!(game.play_word(), PlaybackOutcome::Started);
        assert!(game.is_playing());
        assert_eq!(game.mood(), RobotMood::Listening);
        assert_eq!(game.play_word(), PlaybackOutcome::Busy);
        assert_eq!(game.synthesizer().spoken.len(), 1);
        assert_eq!(game.synthesizer().spoken[0].text, "moon");

        game.on_playback_finished();
        assert!(!game.is_playing());
        assert_eq!(game.mood(), RobotMood::Idle);
        assert_eq!(game.play_word(), PlaybackOutcome::Started);
    }

    #[test]
    fn test_playback_error_reenables() {
        let mut game = game_with(&["moon"]);
        game.play_word();
        game.on_playback_error("audio device lost");

        assert!(!game.is_playing());
        assert!(game.toast().unwrap().message.contains("audio device lost"));
    }

    #[test]
    fn test_playback_timeout_reenables() {
        let mut game = game_with(&["moon"]);
        game.play_word();

        game.advance(Duration::from_secs(10));
        assert!(!game.is_playing());
        assert_eq!(game.synthesizer().cancelled, 1);
        assert_eq!(game.log().count(EventType::PlaybackFailed), 1);
    }

    #[test]
    fn test_unavailable_synthesizer_keeps_button_enabled() {
        let mut game = ListeningGame::with_rng(
            vec!["moon".to_string()],
            &Config::default(),
            RecordingSynthesizer::failing(),
            StdRng::seed_from_u64(1),
        )
        .unwrap();

        assert!(matches!(game.play_word(), PlaybackOutcome::Failed(_)));
        assert!(!game.is_playing());
        assert_eq!(game.toast().unwrap().kind, crate::core::ToastKind::Error);
    }

    #[test]
    fn test_next_during_playback_ignores_late_callback() {
        let mut game = game_with(&["moon", "star"]);
        game.play_word();
        game.next();

        assert!(!game.is_playing());
        assert_eq!(game.synthesizer().cancelled, 1);
        game.on_playback_finished();
        assert_eq!(game.log().count(EventType::PlaybackFinished), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: after max_attempts wrong guesses the revealed word is the target
            #[test]
            fn prop_attempt_cap_reveals_target(
                target in "[a-z]{1,8}",
                guesses in prop::collection::vec("[a-z]{1,8}", 5),
            ) {
                let mut game = ListeningGame::with_rng(
                    vec![target.clone()],
                    &Config::default(),
                    RecordingSynthesizer::default(),
                    StdRng::seed_from_u64(0),
                ).unwrap();

                let mut last = SubmitOutcome::Ignored;
                for guess in guesses.iter().filter(|g| **g != target) {
                    if game.is_completed() {
                        break;
                    }
                    while game.press(Key::Delete) {}
                    for c in guess.chars() {
                        game.press(Key::Letter(c));
                    }
                    last = game.submit();
                }

                prop_assert!(game.attempts() <= 5);
                if game.attempts() == 5 {
                    prop_assert!(game.is_completed());
                    prop_assert_eq!(game.revealed(), Some(target.as_str()));
                    prop_assert_eq!(last, SubmitOutcome::Revealed { word: target.clone() });
                } else {
                    prop_assert!(!game.is_completed());
                }
            }

            // Property: submitting blank input never changes the attempt count
            #[test]
            fn prop_blank_submit_never_counts(
                wrong in 0u32..4,
                blanks in 1usize..10,
            ) {
                let mut game = ListeningGame::with_rng(
                    vec!["cat".to_string()],
                    &Config::default(),
                    RecordingSynthesizer::default(),
                    StdRng::seed_from_u64(0),
                ).unwrap();

                for _ in 0..wrong {
                    game.press(Key::Letter('x'));
                    game.submit();
                }
                while game.press(Key::Delete) {}

                for _ in 0..blanks {
                    prop_assert_eq!(game.submit(), SubmitOutcome::Ignored);
                }
                prop_assert_eq!(game.attempts(), wrong);
            }
        }
    }
}
