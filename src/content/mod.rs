//! Content packs: the static exercise tables every game reads from.
//!
//! A pack is loaded once at startup, validated, and then handed to each
//! controller by value. Controllers never mutate content.

pub mod builtin;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{FailOpen, Result, VentureError};
use crate::util::read_to_string_limited;

/// Every exercise table used by the games.
///
/// Sections missing from a pack file are filled from the built-in pack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPack {
    /// Words for the listening/spelling game.
    pub words: Vec<String>,
    /// Sentences for the typing game.
    pub typing: Vec<String>,
    /// Levels for the word-picture matching game.
    pub matching: Vec<MatchLevel>,
    /// Sentences for speaking practice.
    pub speaking: Vec<String>,
    /// Stories for the reading quiz.
    pub stories: Vec<Story>,
    /// Cards for the alphabet explorer.
    pub alphabet: Vec<LetterCard>,
}

/// One level of the matching game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchLevel {
    /// Level title.
    #[serde(default)]
    pub title: String,
    /// Word/picture pairs; a word matches the picture with the same id.
    pub items: Vec<MatchItem>,
}

impl MatchLevel {
    /// Find an item by id.
    pub fn item(&self, id: u32) -> Option<&MatchItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// A word and its picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchItem {
    /// Shared id of the word and the picture.
    pub id: u32,
    /// The word.
    pub word: String,
    /// The picture (an emoji in the built-in pack).
    pub image: String,
}

/// A reading story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Story id.
    pub id: u32,
    /// Story title.
    pub title: String,
    /// Pages in reading order.
    pub pages: Vec<Page>,
}

/// A page of a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Paragraphs of text.
    pub paragraphs: Vec<String>,
    /// Illustrations.
    #[serde(default)]
    pub images: Vec<String>,
    /// Questions about this page.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Page {
    /// Find a question by id.
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question id, unique within its page.
    pub id: u32,
    /// Question text.
    pub prompt: String,
    /// Possible answers.
    pub answers: Vec<Answer>,
    /// Id of the right answer.
    pub correct_answer_id: u32,
}

impl Question {
    /// Find an answer by id.
    pub fn answer(&self, id: u32) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == id)
    }
}

/// One answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer id, unique within its question.
    pub id: u32,
    /// Answer text.
    pub text: String,
}

/// An alphabet explorer card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterCard {
    /// The letter.
    pub letter: char,
    /// Example word starting with the letter.
    pub word: String,
    /// Picture of the word.
    pub image: String,
}

impl ContentPack {
    /// The built-in space-themed pack.
    pub fn builtin() -> Self {
        builtin::pack()
    }

    /// Load a pack from a JSON or TOML file, chosen by extension.
    ///
    /// Missing sections are filled from the built-in pack and the result is
    /// validated.
    pub fn load(path: &Path) -> Result<Self> {
        let text = read_to_string_limited(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let pack: ContentPack = if is_toml {
            toml::from_str(&text)?
        } else {
            serde_json::from_str(&text)?
        };

        let pack = pack.fill_missing_from(Self::builtin());
        pack.validate()?;
        tracing::debug!(path = %path.display(), "loaded content pack");
        Ok(pack)
    }

    /// Load the pack named in the config, falling back to built-in content.
    pub fn load_or_builtin(config: &Config) -> Self {
        match &config.content.path {
            Some(path) => Self::load(path).fail_open_with("loading content pack", Self::builtin()),
            None => Self::builtin(),
        }
    }

    /// Replace empty sections with the ones from `fallback`.
    pub fn fill_missing_from(mut self, fallback: ContentPack) -> Self {
        if self.words.is_empty() {
            self.words = fallback.words;
        }
        if self.typing.is_empty() {
            self.typing = fallback.typing;
        }
        if self.matching.is_empty() {
            self.matching = fallback.matching;
        }
        if self.speaking.is_empty() {
            self.speaking = fallback.speaking;
        }
        if self.stories.is_empty() {
            self.stories = fallback.stories;
        }
        if self.alphabet.is_empty() {
            self.alphabet = fallback.alphabet;
        }
        self
    }

    /// Check every table for the shapes the controllers rely on.
    pub fn validate(&self) -> Result<()> {
        validate_words(&self.words)?;
        validate_sentences("typing", &self.typing)?;
        validate_sentences("speaking", &self.speaking)?;
        validate_matching(&self.matching)?;
        validate_stories(&self.stories)?;
        validate_alphabet(&self.alphabet)?;
        Ok(())
    }

    /// Find a story by id.
    pub fn story(&self, id: u32) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == id)
    }
}

fn validate_words(words: &[String]) -> Result<()> {
    if words.is_empty() {
        return Err(VentureError::content("word list is empty"));
    }
    for word in words {
        let trimmed = word.trim();
        if trimmed.is_empty() || !trimmed.chars().all(char::is_alphabetic) {
            return Err(VentureError::content(format!(
                "word '{}' must be letters only",
                word
            )));
        }
    }
    Ok(())
}

fn validate_sentences(section: &str, sentences: &[String]) -> Result<()> {
    if sentences.is_empty() {
        return Err(VentureError::content(format!("{} list is empty", section)));
    }
    if let Some(i) = sentences.iter().position(|s| s.trim().is_empty()) {
        return Err(VentureError::content(format!(
            "{} exercise {} is blank",
            section, i
        )));
    }
    Ok(())
}

fn validate_matching(levels: &[MatchLevel]) -> Result<()> {
    if levels.is_empty() {
        return Err(VentureError::content("matching has no levels"));
    }
    for (i, level) in levels.iter().enumerate() {
        if level.items.is_empty() {
            return Err(VentureError::content(format!(
                "matching level {} has no items",
                i
            )));
        }
        ensure_unique(
            level.items.iter().map(|item| item.id),
            &format!("matching level {} item", i),
        )?;
    }
    Ok(())
}

fn validate_stories(stories: &[Story]) -> Result<()> {
    if stories.is_empty() {
        return Err(VentureError::content("no stories"));
    }
    ensure_unique(stories.iter().map(|s| s.id), "story")?;

    for story in stories {
        if story.pages.is_empty() {
            return Err(VentureError::content(format!(
                "story '{}' has no pages",
                story.title
            )));
        }
        for (p, page) in story.pages.iter().enumerate() {
            ensure_unique(
                page.questions.iter().map(|q| q.id),
                &format!("story '{}' page {} question", story.title, p),
            )?;
            for question in &page.questions {
                if question.answers.is_empty() {
                    return Err(VentureError::content(format!(
                        "question {} in story '{}' has no answers",
                        question.id, story.title
                    )));
                }
                ensure_unique(
                    question.answers.iter().map(|a| a.id),
                    &format!("question {} answer", question.id),
                )?;
                if question.answer(question.correct_answer_id).is_none() {
                    return Err(VentureError::content(format!(
                        "question {} in story '{}' names missing answer {} as correct",
                        question.id, story.title, question.correct_answer_id
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_alphabet(cards: &[LetterCard]) -> Result<()> {
    if cards.is_empty() {
        return Err(VentureError::content("alphabet has no cards"));
    }
    ensure_unique(
        cards.iter().map(|c| c.letter.to_ascii_uppercase()),
        "alphabet letter",
    )
}

fn ensure_unique<T>(ids: impl Iterator<Item = T>, what: &str) -> Result<()>
where
    T: std::hash::Hash + Eq + std::fmt::Display,
{
    let mut seen = HashSet::new();
    for id in ids {
        if let Some(dup) = seen.replace(id) {
            return Err(VentureError::content(format!(
                "duplicate {} id {}",
                what, dup
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_pack_is_valid() {
        let pack = ContentPack::builtin();
        pack.validate().unwrap();
        assert!(!pack.words.is_empty());
        assert_eq!(pack.alphabet.len(), 26);
    }

    #[test]
    fn test_validate_rejects_empty_words() {
        let mut pack = ContentPack::builtin();
        pack.words.clear();
        assert!(pack.validate().unwrap_err().to_string().contains("word list"));
    }

    #[test]
    fn test_validate_rejects_non_letter_word() {
        let mut pack = ContentPack::builtin();
        pack.words.push("r2d2".to_string());
        assert!(pack.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_match_ids() {
        let mut pack = ContentPack::builtin();
        let dup_id = pack.matching[0].items[0].id;
        pack.matching[0].items.push(MatchItem {
            id: dup_id,
            word: "dup".to_string(),
            image: "?".to_string(),
        });
        let err = pack.validate().unwrap_err().to_string();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_validate_rejects_missing_correct_answer() {
        let mut pack = ContentPack::builtin();
        pack.stories[0].pages[0].questions[0].correct_answer_id = 999;
        let err = pack.validate().unwrap_err().to_string();
        assert!(err.contains("missing answer 999"));
    }

    #[test]
    fn test_validate_rejects_duplicate_story_ids() {
        let mut pack = ContentPack::builtin();
        let copy = pack.stories[0].clone();
        pack.stories.push(copy);
        assert!(pack.validate().is_err());
    }

    #[test]
    fn test_load_json_fills_missing_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.json");
        fs::write(&path, r#"{ "words": ["moon", "star"] }"#).unwrap();

        let pack = ContentPack::load(&path).unwrap();
        assert_eq!(pack.words, vec!["moon", "star"]);
        assert_eq!(pack.typing, ContentPack::builtin().typing);
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.toml");
        fs::write(
            &path,
            r#"
speaking = ["The moon is bright"]

[[matching]]
title = "Tiny"
items = [{ id = 1, word = "sun", image = "☀️" }]
"#,
        )
        .unwrap();

        let pack = ContentPack::load(&path).unwrap();
        assert_eq!(pack.speaking, vec!["The moon is bright"]);
        assert_eq!(pack.matching.len(), 1);
        assert_eq!(pack.matching[0].item(1).unwrap().word, "sun");
    }

    #[test]
    fn test_load_invalid_pack_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pack.json");
        fs::write(&path, r#"{ "words": ["two words"] }"#).unwrap();

        assert!(matches!(
            ContentPack::load(&path),
            Err(VentureError::Content { .. })
        ));
    }

    #[test]
    fn test_load_or_builtin_falls_back() {
        let mut config = Config::default();
        config.content.path = Some("/nonexistent/pack.json".into());

        let pack = ContentPack::load_or_builtin(&config);
        assert_eq!(pack, ContentPack::builtin());
    }

    #[test]
    fn test_story_lookup() {
        let pack = ContentPack::builtin();
        let first = &pack.stories[0];
        assert_eq!(pack.story(first.id).unwrap().title, first.title);
        assert!(pack.story(9999).is_none());
    }
}
