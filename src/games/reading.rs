//! Reading comprehension quiz.
//!
//! A story is read page by page. Each page asks independent
//! multiple-choice questions; the first answer to a question is final.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::ReadingConfig;
use crate::content::{Page, Question, Story};
use crate::core::{Cursor, EffectTimers, EventType, RobotMood, RoundResult, SessionLog, Step, Toast};
use crate::error::{Result, VentureError};
use crate::games::Controller;

/// Result of choosing an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The designated answer.
    Correct,
    /// Any other answer.
    Incorrect,
    /// The question was already answered; the first answer stands.
    AlreadyAnswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    ClearFeedback,
}

/// Controller for the reading quiz.
#[derive(Debug)]
pub struct ReadingGame {
    stories: Vec<Story>,
    story: usize,
    page: Cursor,
    config: ReadingConfig,
    selections: BTreeMap<u32, u32>,
    feedback: Option<(u32, RoundResult)>,
    mood: RobotMood,
    toast: Option<Toast>,
    timers: EffectTimers<Effect>,
    log: SessionLog,
}

impl ReadingGame {
    /// Create a quiz opened on the first story.
    pub fn new(stories: Vec<Story>, config: &ReadingConfig) -> Result<Self> {
        let first = stories
            .first()
            .ok_or_else(|| VentureError::content("reading quiz needs at least one story"))?;
        let page = Cursor::new(first.pages.len())?;

        let mut game = Self {
            stories,
            story: 0,
            page,
            config: config.clone(),
            selections: BTreeMap::new(),
            feedback: None,
            mood: RobotMood::Idle,
            toast: None,
            timers: EffectTimers::new(),
            log: SessionLog::new(),
        };
        game.reset_page();
        Ok(game)
    }

    /// All stories, for a picker.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// The open story.
    pub fn story(&self) -> &Story {
        &self.stories[self.story]
    }

    /// The page being read.
    pub fn page(&self) -> &Page {
        &self.story().pages[self.page.index()]
    }

    /// Index of the page being read.
    pub fn page_index(&self) -> usize {
        self.page.index()
    }

    /// Number of pages in the open story.
    pub fn page_count(&self) -> usize {
        self.page.len()
    }

    /// Answers chosen on this page, by question id.
    pub fn selections(&self) -> &BTreeMap<u32, u32> {
        &self.selections
    }

    /// Whether a question on this page was answered right.
    pub fn is_correct(&self, question_id: u32) -> Option<bool> {
        let answer = self.selections.get(&question_id)?;
        let question = self.page().question(question_id)?;
        Some(*answer == question.correct_answer_id)
    }

    /// The question whose feedback is showing, and how it was judged.
    pub fn feedback(&self) -> Option<(u32, RoundResult)> {
        self.feedback
    }

    /// Right answers and total questions on this page.
    pub fn page_score(&self) -> (usize, usize) {
        let correct = self
            .page()
            .questions
            .iter()
            .filter(|q| self.selections.get(&q.id) == Some(&q.correct_answer_id))
            .count();
        (correct, self.page().questions.len())
    }

    /// Open a story by id at its first page.
    pub fn select_story(&mut self, id: u32) -> Result<()> {
        let index = self
            .stories
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| VentureError::unknown_item("story", id))?;
        self.page = Cursor::new(self.stories[index].pages.len())?;
        self.story = index;
        self.log
            .record(EventType::Navigated, Some(format!("story {}", id)));
        self.reset_page();
        Ok(())
    }

    /// Answer a question on the current page.
    pub fn select_answer(&mut self, question_id: u32, answer_id: u32) -> Result<AnswerOutcome> {
        let question: &Question = self
            .page()
            .question(question_id)
            .ok_or_else(|| VentureError::unknown_item("question", question_id))?;
        if question.answer(answer_id).is_none() {
            return Err(VentureError::unknown_item("answer", answer_id));
        }
        let correct = question.correct_answer_id == answer_id;

        if self.selections.contains_key(&question_id) {
            tracing::debug!(question_id, "question already answered");
            return Ok(AnswerOutcome::AlreadyAnswered);
        }
        self.selections.insert(question_id, answer_id);

        let result = RoundResult::from_match(correct);
        self.feedback = Some((question_id, result));
        self.log.record(
            if correct {
                EventType::AnswerCorrect
            } else {
                EventType::AnswerIncorrect
            },
            Some(format!("q{} a{}", question_id, answer_id)),
        );

        if correct {
            self.mood = RobotMood::Happy;
            self.toast = Some(Toast::success("That's right! Great reading!"));
        } else {
            self.mood = RobotMood::Sad;
            self.toast = Some(Toast::error("Not quite. Read the page again!"));
            tracing::debug!(question_id, answer_id, "wrong answer");
        }

        self.timers.cancel_matching(|e| *e == Effect::ClearFeedback);
        self.timers.schedule(
            Duration::from_millis(self.config.feedback_clear_ms),
            Effect::ClearFeedback,
        );

        if self.selections.len() == self.page().questions.len() {
            let (right, total) = self.page_score();
            tracing::info!(page = self.page.index(), right, total, "page answered");
        }

        Ok(if correct {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        })
    }

    /// Turn to the next page, stopping at the last one.
    pub fn next_page(&mut self) -> Step {
        let step = self.page.next_clamped();
        if step.changed() {
            self.log.record(EventType::Navigated, Some("next page".to_string()));
            self.reset_page();
        }
        step
    }

    /// Turn to the previous page, stopping at the first one.
    pub fn previous_page(&mut self) -> Step {
        let step = self.page.previous_clamped();
        if step.changed() {
            self.log
                .record(EventType::Navigated, Some("previous page".to_string()));
            self.reset_page();
        }
        step
    }

    fn reset_page(&mut self) {
        self.timers.cancel_all();
        self.selections.clear();
        self.feedback = None;
        self.mood = RobotMood::Idle;
        self.toast = None;
        let label = format!("{} p{}", self.story().title, self.page.index() + 1);
        self.log.record(EventType::ItemStarted, Some(label));
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ClearFeedback => {
                self.feedback = None;
                self.toast = None;
                self.mood = RobotMood::Idle;
            }
        }
    }
}

impl Controller for ReadingGame {
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
