//! Typing practice.
//!
//! The player types a sentence one key at a time. Keys are forward-only:
//! every press is judged against the character under the cursor and the
//! cursor moves on whether or not it matched.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::core::{Cursor, EventType, RobotMood, SessionLog, Step, Toast};
use crate::error::Result;
use crate::games::Controller;

/// How one key press was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyJudgement {
    /// Position in the sentence.
    pub position: usize,
    /// Character that was expected.
    pub expected: char,
    /// Character that was pressed.
    pub pressed: char,
    /// Whether they matched.
    pub correct: bool,
}

/// Controller for the typing game.
#[derive(Debug, Clone)]
pub struct WritingGame {
    exercises: Vec<String>,
    cursor: Cursor,
    target: Vec<char>,
    typed: Vec<KeyJudgement>,
    incorrect: BTreeSet<usize>,
    score: usize,
    mood: RobotMood,
    toast: Option<Toast>,
    log: SessionLog,
}

impl WritingGame {
    /// Create a game over an ordered list of sentences.
    pub fn new(exercises: Vec<String>) -> Result<Self> {
        let cursor = Cursor::new(exercises.len())?;
        let mut game = Self {
            exercises,
            cursor,
            target: Vec::new(),
            typed: Vec::new(),
            incorrect: BTreeSet::new(),
            score: 0,
            mood: RobotMood::Idle,
            toast: None,
            log: SessionLog::new(),
        };
        game.reset_exercise();
        Ok(game)
    }

    /// Index of the current sentence.
    pub fn exercise_index(&self) -> usize {
        self.cursor.index()
    }

    /// Number of sentences.
    pub fn exercise_count(&self) -> usize {
        self.cursor.len()
    }

    /// The sentence to type.
    pub fn target(&self) -> &str {
        &self.exercises[self.cursor.index()]
    }

    /// Position of the next character to type.
    pub fn position(&self) -> usize {
        self.typed.len()
    }

    /// Every key judged so far, in order.
    pub fn typed(&self) -> &[KeyJudgement] {
        &self.typed
    }

    /// The pressed keys as text.
    pub fn typed_text(&self) -> String {
        self.typed.iter().map(|k| k.pressed).collect()
    }

    /// Positions typed wrong.
    pub fn incorrect_positions(&self) -> &BTreeSet<usize> {
        &self.incorrect
    }

    /// Characters typed right on the first try.
    pub fn score(&self) -> usize {
        self.score
    }

    /// Fraction of typed keys that were right; 1.0 before the first key.
    pub fn accuracy(&self) -> f64 {
        if self.typed.is_empty() {
            return 1.0;
        }
        self.score as f64 / self.typed.len() as f64
    }

    /// Check if the whole sentence has been typed.
    pub fn is_complete(&self) -> bool {
        self.typed.len() >= self.target.len()
    }

    /// Judge a key against the character under the cursor.
    ///
    /// Returns `None` once the sentence is complete.
    pub fn press(&mut self, pressed: char) -> Option<KeyJudgement> {
        let position = self.typed.len();
        let expected = *self.target.get(position)?;
        let correct = pressed == expected;

        if !correct {
            self.incorrect.insert(position);
            self.mood = RobotMood::Sad;
            tracing::debug!(position, %expected, %pressed, "typing mismatch");
        } else if !self.incorrect.contains(&position) {
            self.score += 1;
            self.mood = RobotMood::Happy;
        }

        let judgement = KeyJudgement {
            position,
            expected,
            pressed,
            correct,
        };
        self.typed.push(judgement);

        if self.is_complete() {
            self.mood = RobotMood::Celebrating;
            self.toast = Some(Toast::success(format!(
                "Sentence done! {} of {} right.",
                self.score,
                self.target.len()
            )));
            self.log.record(
                EventType::LevelComplete,
                Some(format!("{}/{}", self.score, self.target.len())),
            );
            tracing::info!(
                exercise = self.cursor.index(),
                score = self.score,
                "typing exercise complete"
            );
        }

        Some(judgement)
    }

    /// Type every character of `text`, stopping when the sentence is complete.
    pub fn press_str(&mut self, text: &str) -> Vec<KeyJudgement> {
        text.chars().map_while(|c| self.press(c)).collect()
    }

    /// Move to the next sentence, stopping at the last one.
    pub fn next_exercise(&mut self) -> Step {
        let step = self.cursor.next_clamped();
        if step.changed() {
            self.log.record(EventType::Navigated, Some("next".to_string()));
            self.reset_exercise();
        }
        step
    }

    /// Move to the previous sentence, stopping at the first one.
    ///
    /// Progress resets the same way as moving forward.
    pub fn previous_exercise(&mut self) -> Step {
        let step = self.cursor.previous_clamped();
        if step.changed() {
            self.log.record(EventType::Navigated, Some("previous".to_string()));
            self.reset_exercise();
        }
        step
    }

    fn reset_exercise(&mut self) {
        let sentence = self.exercises[self.cursor.index()].clone();
        self.target = sentence.chars().collect();
        self.typed.clear();
        self.incorrect.clear();
        self.score = 0;
        self.mood = RobotMood::Idle;
        self.toast = None;
        self.log.record(EventType::ItemStarted, Some(sentence));
    }
}

impl Controller for WritingGame {
    fn advance(&mut self, _elapsed: Duration) {}

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

    fn game(sentences: &[&str]) -> WritingGame {
        WritingGame::new(sentences.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_list() {
        assert!(WritingGame::new(Vec::new()).is_err());
    }

    #[test]
    fn test_correct_keys_score() {
        let mut g = game(&["cat"]);
        let j = g.press('c').unwrap();

        assert!(j.correct);
        assert_eq!(j.position, 0);
        assert_eq!(g.score(), 1);
        assert_eq!(g.position(), 1);
    }

    #[test]
    fn test_wrong_key_advances_without_score() {
        let mut g = game(&["cat"]);
        let j = g.press('x').unwrap();

        assert!(!j.correct);
        assert_eq!(j.expected, 'c');
        assert_eq!(g.position(), 1);
        assert_eq!(g.score(), 0);
        assert!(g.incorrect_positions().contains(&0));
        assert_eq!(g.mood(), RobotMood::Sad);
    }

    #[test]
    fn test_completion_is_derived() {
        let mut g = game(&["hi!"]);
        g.press_str("hx!");

        assert!(g.is_complete());
        assert_eq!(g.score(), 2);
        assert_eq!(g.typed_text(), "hx!");
        assert!((g.accuracy() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(g.mood(), RobotMood::Celebrating);
        assert_eq!(g.log().count(EventType::LevelComplete), 1);

        assert!(g.press('z').is_none());
        assert_eq!(g.position(), 3);
    }

    #[test]
    fn test_press_str_stops_at_end() {
        let mut g = game(&["ab"]);
        let judged = g.press_str("abcdef");
        assert_eq!(judged.len(), 2);
    }

    #[test]
    fn test_next_and_previous_are_clamped() {
        let mut g = game(&["one", "two"]);

        assert_eq!(g.previous_exercise(), Step::Stayed);
        assert_eq!(g.next_exercise(), Step::Moved);
        assert_eq!(g.target(), "two");
        assert_eq!(g.next_exercise(), Step::Stayed);
        assert_eq!(g.exercise_index(), 1);
    }

    #[test]
    fn test_navigation_resets_progress_both_ways() {
        let mut g = game(&["one", "two"]);
        g.next_exercise();
        g.press_str("tx");

        assert_eq!(g.previous_exercise(), Step::Moved);
        assert_eq!(g.position(), 0);
        assert_eq!(g.score(), 0);
        assert!(g.incorrect_positions().is_empty());
        assert!(g.typed().is_empty());
    }

    #[test]
    fn test_clamped_navigation_keeps_progress() {
        let mut g = game(&["one", "two"]);
        g.press_str("on");
        g.previous_exercise();

        assert_eq!(g.position(), 2);
        assert_eq!(g.score(), 2);
    }

    #[test]
    fn test_accuracy_starts_perfect() {
        assert_eq!(game(&["a"]).accuracy(), 1.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: at completion score == len - |incorrect| and position == len
            #[test]
            fn prop_score_identity(
                target in "[a-z ]{1,30}",
                keys in prop::collection::vec(prop::char::range('a', 'z'), 30..40),
            ) {
                let mut g = WritingGame::new(vec![target.clone()]).unwrap();
                let mut last_position = 0;
                for c in keys {
                    if g.press(c).is_none() {
                        break;
                    }
                    prop_assert!(g.position() > last_position);
                    last_position = g.position();
                }

                let len = target.chars().count();
                prop_assert!(g.is_complete());
                prop_assert_eq!(g.position(), len);
                prop_assert_eq!(g.score(), len - g.incorrect_positions().len());
            }

            // Property: index stays in bounds under any navigation
            #[test]
            fn prop_exercise_index_in_bounds(
                count in 1usize..6,
                moves in prop::collection::vec(any::<bool>(), 0..40),
            ) {
                let sentences: Vec<String> = (0..count).map(|i| format!("s{}", i)).collect();
                let mut g = WritingGame::new(sentences).unwrap();
                for forward in moves {
                    if forward { g.next_exercise(); } else { g.previous_exercise(); }
                    prop_assert!(g.exercise_index() < count);
                    prop_assert_eq!(g.score(), 0);
                }
            }
        }
    }
}
