//! Letter Venture - space-themed literacy mini-games for kids.
//!
//! Six games (listening, typing, word-picture matching, speaking, reading
//! and an alphabet explorer) reached from a central hub. Each game is a
//! self-contained controller that owns its content, its session state and
//! its transient effects; speech playback and capture are external
//! capabilities behind traits. A line-oriented terminal front-end drives the
//! controllers.

pub mod cli;
pub mod config;
pub mod content;
pub mod core;
pub mod error;
pub mod games;
pub mod hub;
pub mod speech;
pub mod util;

pub use config::Config;
pub use content::ContentPack;
pub use core::{EffectTimers, RobotMood, RoundResult, SessionLog, Toast};
pub use error::{Result, VentureError};
pub use games::{
    AlphabetGame, Controller, ListeningGame, MatchingGame, ReadingGame, SpeakingGame, WritingGame,
};
pub use hub::{Hub, Route};
pub use speech::{SpeechRecognizer, SpeechSynthesizer};

// CLI commands
pub use cli::{ConfigCommand, ContentCommand, HubCommand, InitCommand, PlaySession};
