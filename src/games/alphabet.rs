//! Alphabet explorer: flip through letter cards and hear each one.

use std::time::Duration;

use crate::config::Config;
use crate::content::LetterCard;
use crate::core::{Cursor, EffectTimers, EventType, RobotMood, SessionLog, Step, Toast};
use crate::error::{Result, VentureError};
use crate::games::{settle_mood, Controller, Narrator};
use crate::speech::{PlaybackOutcome, SpeechSynthesizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    PlaybackTimeout,
}

/// Controller for the alphabet explorer.
#[derive(Debug)]
pub struct AlphabetGame<S> {
    cards: Vec<LetterCard>,
    cursor: Cursor,
    narrator: Narrator<S>,
    mood: RobotMood,
    toast: Option<Toast>,
    timers: EffectTimers<Effect>,
    log: SessionLog,
}

impl<S: SpeechSynthesizer> AlphabetGame<S> {
    /// Create an explorer over `cards`, showing the first one.
    pub fn new(cards: Vec<LetterCard>, config: &Config, synthesizer: S) -> Result<Self> {
        let cursor = Cursor::new(cards.len())?;
        let mut game = Self {
            cards,
            cursor,
            narrator: Narrator::new(synthesizer, &config.speech),
            mood: RobotMood::Idle,
            toast: None,
            timers: EffectTimers::new(),
            log: SessionLog::new(),
        };
        game.show_card();
        Ok(game)
    }

    /// The card on screen.
    pub fn current(&self) -> &LetterCard {
        &self.cards[self.cursor.index()]
    }

    /// All cards in order.
    pub fn cards(&self) -> &[LetterCard] {
        &self.cards
    }

    /// Check if the card is being read aloud.
    pub fn is_playing(&self) -> bool {
        self.narrator.is_busy()
    }

    /// The speech synthesizer.
    pub fn synthesizer(&self) -> &S {
        self.narrator.synthesizer()
    }

    /// Jump to a letter, ignoring case.
    pub fn select(&mut self, letter: char) -> Result<()> {
        let wanted = letter.to_ascii_uppercase();
        let index = self
            .cards
            .iter()
            .position(|c| c.letter.to_ascii_uppercase() == wanted)
            .ok_or_else(|| VentureError::unknown_item("letter", letter))?;
        self.cursor.jump(index)?;
        self.log.record(EventType::Navigated, Some(wanted.to_string()));
        self.show_card();
        Ok(())
    }

    /// Next letter, back to the first after the last.
    pub fn next(&mut self) -> Step {
        let step = self.cursor.next_wrapping();
        self.log.record(EventType::Navigated, Some("next".to_string()));
        self.show_card();
        step
    }

    /// Previous letter, on to the last before the first.
    pub fn previous(&mut self) -> Step {
        let step = self.cursor.previous_wrapping();
        self.log.record(EventType::Navigated, Some("previous".to_string()));
        self.show_card();
        step
    }

    /// Phrase read aloud for the current card.
    pub fn phrase(&self) -> String {
        let card = self.current();
        format!("{}. {} is for {}.", card.letter, card.letter, card.word)
    }

    /// Read the current card aloud.
    pub fn play_letter(&mut self) -> PlaybackOutcome {
        let phrase = self.phrase();
        let outcome = self
            .narrator
            .play(&phrase, &mut self.timers, Effect::PlaybackTimeout, &mut self.log);
        match &outcome {
            PlaybackOutcome::Started => self.mood = RobotMood::Listening,
            PlaybackOutcome::Failed(message) => {
                self.toast = Some(Toast::error(format!("Can't play sound: {}", message)));
            }
            PlaybackOutcome::Busy => {}
        }
        outcome
    }

    /// Host callback: the card finished playing.
    pub fn on_playback_finished(&mut self) {
        if self.narrator.finished(&mut self.timers, &mut self.log) {
            self.mood = RobotMood::Happy;
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

    fn show_card(&mut self) {
        self.timers.cancel_all();
        self.narrator.silence();
        self.mood = RobotMood::Idle;
        self.toast = None;
        let letter = self.current().letter.to_string();
        self.log.record(EventType::ItemStarted, Some(letter));
    }
}

impl<S: SpeechSynthesizer> Controller for AlphabetGame<S> {
    fn advance(&mut self, elapsed: Duration) {
        let until = self.timers.now() + elapsed;
        while let Some(effect) = self.timers.fire_next(until) {
            match effect {
                Effect::PlaybackTimeout => {
                    if self.narrator.expire(&mut self.log) {
                        self.mood = settle_mood(self.mood);
                    }
                }
            }
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
    use crate::content::ContentPack;
    use crate::speech::testing::RecordingSynthesizer;

    fn game() -> AlphabetGame<RecordingSynthesizer> {
        AlphabetGame::new(
            ContentPack::builtin().alphabet,
            &Config::default(),
            RecordingSynthesizer::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_starts_at_a() {
        assert_eq!(game().current().letter, 'A');
    }

    #[test]
    fn test_wraps_both_ways() {
        let mut g = game();
        assert_eq!(g.previous(), Step::Wrapped);
        assert_eq!(g.current().letter, 'Z');
        assert_eq!(g.next(), Step::Wrapped);
        assert_eq!(g.current().letter, 'A');
        assert_eq!(g.next(), Step::Moved);
        assert_eq!(g.current().letter, 'B');
    }

    #[test]
    fn test_select_ignores_case() {
        let mut g = game();
        g.select('r').unwrap();
        assert_eq!(g.current().word, "rocket");
        assert_eq!(g.select('?').unwrap_err().to_string(), "unknown letter: ?");
        assert_eq!(g.current().letter, 'R');
    }

    #[test]
    fn test_play_letter() {
        let mut g = game();
        g.select('m').unwrap();

        assert_eq!(g.play_letter(), PlaybackOutcome::Started);
        assert_eq!(g.synthesizer().spoken[0].text, "M. M is for moon.");
        assert_eq!(g.play_letter(), PlaybackOutcome::Busy);

        g.on_playback_finished();
        assert!(!g.is_playing());
        assert_eq!(g.mood(), RobotMood::Happy);
    }

    #[test]
    fn test_navigation_silences_playback() {
        let mut g = game();
        g.play_letter();
        g.next();

        assert!(!g.is_playing());
        assert_eq!(g.synthesizer().cancelled, 1);
        g.advance(Duration::from_secs(20));
        assert_eq!(g.log().count(EventType::PlaybackFailed), 0);
    }

    #[test]
    fn test_playback_error_reenables() {
        let mut g = game();
        g.play_letter();
        g.on_playback_error("speaker unplugged");
        assert!(!g.is_playing());
        assert_eq!(g.mood(), RobotMood::Idle);
    }
}
