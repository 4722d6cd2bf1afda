//! Built-in space-themed content.

use super::{Answer, ContentPack, LetterCard, MatchItem, MatchLevel, Page, Question, Story};

const WORDS: &[&str] = &[
    "cat", "dog", "sun", "moon", "star", "rocket", "planet", "comet", "robot", "alien",
    "orbit", "space", "earth", "mars", "light",
];

const TYPING: &[&str] = &[
    "the cat sat on the moon",
    "a big red rocket",
    "stars shine at night",
    "the robot can fly",
    "we land on mars",
];

const SPEAKING: &[&str] = &[
    "The rocket flies to the moon",
    "I can see a bright star",
    "The robot waves hello",
    "Planets spin around the sun",
    "We are space explorers",
];

const MATCHING: &[(&str, &[(u32, &str, &str)])] = &[
    (
        "Launch Pad",
        &[
            (1, "sun", "☀️"),
            (2, "moon", "🌙"),
            (3, "star", "⭐"),
            (4, "rocket", "🚀"),
        ],
    ),
    (
        "Deep Space",
        &[
            (1, "planet", "🪐"),
            (2, "alien", "👽"),
            (3, "comet", "☄️"),
            (4, "earth", "🌍"),
        ],
    ),
    (
        "Robot Base",
        &[
            (1, "robot", "🤖"),
            (2, "satellite", "🛰️"),
            (3, "telescope", "🔭"),
            (4, "astronaut", "🧑‍🚀"),
            (5, "ufo", "🛸"),
        ],
    ),
];

const ALPHABET: &[(char, &str, &str)] = &[
    ('A', "alien", "👽"),
    ('B', "balloon", "🎈"),
    ('C', "comet", "☄️"),
    ('D', "dog", "🐶"),
    ('E', "earth", "🌍"),
    ('F', "fish", "🐟"),
    ('G', "globe", "🌐"),
    ('H', "house", "🏠"),
    ('I', "ice", "🧊"),
    ('J', "jellyfish", "🪼"),
    ('K', "kite", "🪁"),
    ('L', "lion", "🦁"),
    ('M', "moon", "🌙"),
    ('N', "nest", "🪺"),
    ('O', "owl", "🦉"),
    ('P', "planet", "🪐"),
    ('Q', "queen", "👑"),
    ('R', "rocket", "🚀"),
    ('S', "star", "⭐"),
    ('T', "telescope", "🔭"),
    ('U', "ufo", "🛸"),
    ('V', "volcano", "🌋"),
    ('W', "whale", "🐋"),
    ('X', "xylophone", "🎵"),
    ('Y', "yoyo", "🪀"),
    ('Z', "zebra", "🦓"),
];

/// Build the built-in pack.
pub fn pack() -> ContentPack {
    ContentPack {
        words: strings(WORDS),
        typing: strings(TYPING),
        matching: MATCHING
            .iter()
            .map(|(title, items)| MatchLevel {
                title: title.to_string(),
                items: items
                    .iter()
                    .map(|&(id, word, image)| MatchItem {
                        id,
                        word: word.to_string(),
                        image: image.to_string(),
                    })
                    .collect(),
            })
            .collect(),
        speaking: strings(SPEAKING),
        stories: stories(),
        alphabet: ALPHABET
            .iter()
            .map(|&(letter, word, image)| LetterCard {
                letter,
                word: word.to_string(),
                image: image.to_string(),
            })
            .collect(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn question(id: u32, prompt: &str, answers: &[&str], correct: u32) -> Question {
    Question {
        id,
        prompt: prompt.to_string(),
        answers: answers
            .iter()
            .zip(1..)
            .map(|(text, id)| Answer {
                id,
                text: text.to_string(),
            })
            .collect(),
        correct_answer_id: correct,
    }
}

fn page(paragraphs: &[&str], images: &[&str], questions: Vec<Question>) -> Page {
    Page {
        paragraphs: strings(paragraphs),
        images: strings(images),
        questions,
    }
}

fn stories() -> Vec<Story> {
    vec![
        Story {
            id: 1,
            title: "Robo's Trip to the Moon".to_string(),
            pages: vec![
                page(
                    &[
                        "Robo is a little robot who lives on Earth.",
                        "One morning Robo builds a shiny red rocket.",
                    ],
                    &["🤖", "🚀"],
                    vec![
                        question(1, "Who is Robo?", &["A cat", "A robot", "A star"], 2),
                        question(2, "What color is the rocket?", &["Red", "Blue", "Green"], 1),
                    ],
                ),
                page(
                    &[
                        "Three, two, one, blast off!",
                        "The rocket zooms past the clouds and into space.",
                    ],
                    &["☁️", "✨"],
                    vec![question(
                        1,
                        "Where does the rocket go?",
                        &["Under the sea", "Into space", "To school"],
                        2,
                    )],
                ),
                page(
                    &[
                        "Robo lands on the moon.",
                        "The moon is quiet and gray. Robo jumps high!",
                    ],
                    &["🌙"],
                    vec![
                        question(1, "Where does Robo land?", &["The moon", "Mars", "A tree"], 1),
                        question(2, "What color is the moon?", &["Pink", "Gray", "Yellow"], 2),
                    ],
                ),
            ],
        },
        Story {
            id: 2,
            title: "The Lost Star".to_string(),
            pages: vec![
                page(
                    &[
                        "A small star fell out of the sky.",
                        "It landed softly in Mia's garden.",
                    ],
                    &["⭐", "🌷"],
                    vec![question(
                        1,
                        "Where did the star land?",
                        &["In a garden", "In a river", "On a roof"],
                        1,
                    )],
                ),
                page(
                    &[
                        "Mia gave the star a ride on her kite.",
                        "Up, up it went, back home to the night sky.",
                    ],
                    &["🪁", "🌌"],
                    vec![
                        question(1, "How did the star get home?", &["By bus", "On a kite", "By boat"], 2),
                        question(2, "Who helped the star?", &["Mia", "Robo", "A dog"], 1),
                    ],
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_ids_start_at_one() {
        let q = question(1, "?", &["a", "b"], 2);
        assert_eq!(q.answers[0].id, 1);
        assert_eq!(q.answer(2).unwrap().text, "b");
    }

    #[test]
    fn test_alphabet_is_ordered() {
        let letters: String = pack().alphabet.iter().map(|c| c.letter).collect();
        assert_eq!(letters, "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    }

    #[test]
    fn test_words_are_lowercase_letters() {
        for word in pack().words {
            assert!(word.chars().all(|c| c.is_ascii_lowercase()), "{}", word);
        }
    }
}
