//! Word-picture matching game.
//!
//! Each level shows a column of words and a column of pictures. The player
//! connects a word dot to a picture dot; a word matches the picture that
//! shares its id.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::MatchingConfig;
use crate::content::MatchLevel;
use crate::core::{Cursor, EffectTimers, EventType, RobotMood, SessionLog, Step, TimerToken, Toast};
use crate::error::{Result, VentureError};
use crate::games::Controller;

/// Result of clicking a dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// First half of a pair selected.
    Selected,
    /// Clicked the selected dot again; selection removed.
    Deselected,
    /// Pair matched.
    Matched,
    /// Pair matched and it was the last one in the level.
    LevelComplete,
    /// Pair did not match; the selection clears after a short delay.
    Mismatched,
    /// The item is already matched.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Word,
    Image,
}

impl Side {
    fn kind(self) -> &'static str {
        match self {
            Side::Word => "word",
            Side::Image => "image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    ClearMismatch,
    AnnounceLevelComplete,
}

/// Controller for the matching game.
#[derive(Debug)]
pub struct MatchingGame {
    levels: Vec<MatchLevel>,
    cursor: Cursor,
    config: MatchingConfig,
    rng: StdRng,
    image_order: Vec<u32>,
    selected_word: Option<u32>,
    selected_image: Option<u32>,
    completed: BTreeSet<u32>,
    mismatch: Option<TimerToken>,
    announced: bool,
    mood: RobotMood,
    toast: Option<Toast>,
    timers: EffectTimers<Effect>,
    log: SessionLog,
}

impl MatchingGame {
    /// Create a game over `levels`.
    pub fn new(levels: Vec<MatchLevel>, config: &MatchingConfig) -> Result<Self> {
        Self::with_rng(levels, config, StdRng::from_entropy())
    }

    /// Create a game with a caller-supplied random source for picture order.
    pub fn with_rng(levels: Vec<MatchLevel>, config: &MatchingConfig, rng: StdRng) -> Result<Self> {
        let cursor = Cursor::new(levels.len())?;
        if let Some(i) = levels.iter().position(|l| l.items.is_empty()) {
            return Err(VentureError::content(format!(
                "matching level {} has no items",
                i
            )));
        }

        let mut game = Self {
            levels,
            cursor,
            config: config.clone(),
            rng,
            image_order: Vec::new(),
            selected_word: None,
            selected_image: None,
            completed: BTreeSet::new(),
            mismatch: None,
            announced: false,
            mood: RobotMood::Idle,
            toast: None,
            timers: EffectTimers::new(),
            log: SessionLog::new(),
        };
        game.reset_level();
        Ok(game)
    }

    /// Current level.
    pub fn level(&self) -> &MatchLevel {
        &self.levels[self.cursor.index()]
    }

    /// Index of the current level.
    pub fn level_index(&self) -> usize {
        self.cursor.index()
    }

    /// Number of levels.
    pub fn level_count(&self) -> usize {
        self.cursor.len()
    }

    /// Word ids in display order (top to bottom).
    pub fn word_order(&self) -> Vec<u32> {
        self.level().items.iter().map(|i| i.id).collect()
    }

    /// Picture ids in display order (top to bottom).
    pub fn image_order(&self) -> &[u32] {
        &self.image_order
    }

    /// Selected word, if any.
    pub fn selected_word(&self) -> Option<u32> {
        self.selected_word
    }

    /// Selected picture, if any.
    pub fn selected_image(&self) -> Option<u32> {
        self.selected_image
    }

    /// Ids matched in this level.
    pub fn completed_pairs(&self) -> &BTreeSet<u32> {
        &self.completed
    }

    /// Check if a wrong pair is on screen waiting to clear.
    pub fn is_mismatch_showing(&self) -> bool {
        self.mismatch.is_some()
    }

    /// Check if every pair in the level is matched.
    pub fn is_level_complete(&self) -> bool {
        self.completed.len() == self.level().items.len()
    }

    /// Check if the level-complete message has been shown.
    pub fn is_level_announced(&self) -> bool {
        self.announced
    }

    /// Click a word dot.
    pub fn select_word(&mut self, id: u32) -> Result<MatchOutcome> {
        self.select(Side::Word, id)
    }

    /// Click a picture dot.
    pub fn select_image(&mut self, id: u32) -> Result<MatchOutcome> {
        self.select(Side::Image, id)
    }

    fn select(&mut self, side: Side, id: u32) -> Result<MatchOutcome> {
        if self.level().item(id).is_none() {
            return Err(VentureError::unknown_item(side.kind(), id));
        }
        if self.completed.contains(&id) {
            return Ok(MatchOutcome::Ignored);
        }

        // A new click ends the mismatch display early
        if let Some(token) = self.mismatch.take() {
            self.timers.cancel(token);
            self.selected_word = None;
            self.selected_image = None;
        }

        let (slot, other) = match side {
            Side::Word => (&mut self.selected_word, self.selected_image),
            Side::Image => (&mut self.selected_image, self.selected_word),
        };
        if *slot == Some(id) {
            *slot = None;
            return Ok(MatchOutcome::Deselected);
        }
        *slot = Some(id);

        if other.is_some() {
            Ok(self.evaluate())
        } else {
            self.mood = RobotMood::Thinking;
            Ok(MatchOutcome::Selected)
        }
    }

    fn evaluate(&mut self) -> MatchOutcome {
        let (Some(word), Some(image)) = (self.selected_word, self.selected_image) else {
            return MatchOutcome::Ignored;
        };

        if word != image {
            self.log
                .record(EventType::AnswerIncorrect, Some(format!("{} -> {}", word, image)));
            tracing::debug!(word, image, "pictures do not match");
            self.mood = RobotMood::Sad;
            self.toast = Some(Toast::error("Oops, those don't match. Try again!"));
            self.mismatch = Some(self.timers.schedule(
                Duration::from_millis(self.config.mismatch_clear_ms),
                Effect::ClearMismatch,
            ));
            return MatchOutcome::Mismatched;
        }

        self.completed.insert(word);
        self.selected_word = None;
        self.selected_image = None;

        let name = self
            .level()
            .item(word)
            .map(|i| i.word.clone())
            .unwrap_or_default();
        self.log.record(EventType::AnswerCorrect, Some(name.clone()));
        self.mood = RobotMood::Happy;
        self.toast = Some(Toast::success(format!("Yes! That's the {}!", name)));

        if self.is_level_complete() {
            self.timers.schedule(
                Duration::from_millis(self.config.level_complete_delay_ms),
                Effect::AnnounceLevelComplete,
            );
            let title = self.level().title.clone();
            self.log.record(EventType::LevelComplete, Some(title));
            tracing::info!(level = self.cursor.index(), "matching level complete");
            return MatchOutcome::LevelComplete;
        }
        MatchOutcome::Matched
    }

    /// Go to the next level, or back to the first after the last.
    pub fn next_level(&mut self) -> Step {
        let step = self.cursor.next_wrapping();
        self.log.record(EventType::Navigated, Some("next level".to_string()));
        self.reset_level();
        step
    }

    fn reset_level(&mut self) {
        self.timers.cancel_all();
        self.selected_word = None;
        self.selected_image = None;
        self.completed.clear();
        self.mismatch = None;
        self.announced = false;
        self.mood = RobotMood::Idle;
        self.toast = None;

        let mut order = self.word_order();
        if self.config.shuffle_images {
            order.shuffle(&mut self.rng);
        }
        self.image_order = order;

        let title = self.level().title.clone();
        self.log.record(EventType::ItemStarted, Some(title));
    }

    /// Layout for the current level in the given viewport.
    pub fn layout(&self, viewport: Viewport) -> ColumnLayout {
        ColumnLayout::new(viewport, self.level().items.len())
    }

    /// Lines to draw between the columns.
    ///
    /// Matched pairs are solid; a mismatched pair is drawn while it is
    /// still on screen. Recompute whenever the layout changes.
    pub fn connectors(&self, layout: &ColumnLayout) -> Vec<Connector> {
        let words = self.word_order();
        let row_of = |ids: &[u32], id: u32| ids.iter().position(|&x| x == id);

        let mut connectors: Vec<Connector> = self
            .completed
            .iter()
            .filter_map(|&id| {
                let from = layout.word_anchor(row_of(&words, id)?);
                let to = layout.image_anchor(row_of(&self.image_order, id)?);
                Some(Connector {
                    word_id: id,
                    image_id: id,
                    from,
                    to,
                    matched: true,
                })
            })
            .collect();

        if let (Some(word), Some(image)) = (self.selected_word, self.selected_image) {
            if let (Some(w), Some(i)) = (row_of(&words, word), row_of(&self.image_order, image)) {
                connectors.push(Connector {
                    word_id: word,
                    image_id: image,
                    from: layout.word_anchor(w),
                    to: layout.image_anchor(i),
                    matched: false,
                });
            }
        }
        connectors
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ClearMismatch => {
                self.mismatch = None;
                self.selected_word = None;
                self.selected_image = None;
                if self.mood == RobotMood::Sad {
                    self.mood = RobotMood::Idle;
                }
            }
            Effect::AnnounceLevelComplete => {
                self.announced = true;
                self.mood = RobotMood::Celebrating;
                self.toast = Some(Toast::success("Level complete! Great matching!"));
            }
        }
    }
}

impl Controller for MatchingGame {
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

// ============================================================================
// Geometry
// ============================================================================

/// Size of the drawing area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

/// Dot positions for a two-column level.
///
/// Words sit on the left, pictures on the right, rows evenly spaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnLayout {
    viewport: Viewport,
    rows: usize,
}

impl ColumnLayout {
    /// Word dots sit at this fraction of the width.
    pub const WORD_COLUMN: f32 = 0.25;
    /// Picture dots sit at this fraction of the width.
    pub const IMAGE_COLUMN: f32 = 0.75;

    /// Lay out `rows` rows in a viewport.
    pub fn new(viewport: Viewport, rows: usize) -> Self {
        Self {
            viewport,
            rows: rows.max(1),
        }
    }

    /// The viewport this layout was computed for.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn row_center(&self, row: usize) -> f32 {
        self.viewport.height * (row as f32 + 0.5) / self.rows as f32
    }

    /// Dot next to the word in `row`.
    pub fn word_anchor(&self, row: usize) -> Point {
        Point {
            x: self.viewport.width * Self::WORD_COLUMN,
            y: self.row_center(row),
        }
    }

    /// Dot next to the picture in `row`.
    pub fn image_anchor(&self, row: usize) -> Point {
        Point {
            x: self.viewport.width * Self::IMAGE_COLUMN,
            y: self.row_center(row),
        }
    }
}

/// A line between a word dot and a picture dot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    /// Word end.
    pub word_id: u32,
    /// Picture end.
    pub image_id: u32,
    /// Start point (word side).
    pub from: Point,
    /// End point (picture side).
    pub to: Point,
    /// Whether the pair is matched.
    pub matched: bool,
}
