//! Configuration loading for Letter Venture.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.letter-venture/config.toml`)
//! 3. User config (`~/.letter-venture/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. Every game runs with the built-in timings
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FailOpen, Result, VentureError};

/// Name of the per-project and per-user config directory.
pub const CONFIG_DIR_NAME: &str = ".letter-venture";

/// Main configuration struct for Letter Venture.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Text-to-speech settings shared by every game.
    pub speech: SpeechConfig,
    /// Listening/spelling game settings.
    pub listening: ListeningConfig,
    /// Word-picture matching game settings.
    pub matching: MatchingConfig,
    /// Speaking practice settings.
    pub speaking: SpeakingConfig,
    /// Reading quiz settings.
    pub reading: ReadingConfig,
    /// Content pack selection.
    pub content: ContentConfig,
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speaking rate, 1.0 is the voice's normal speed.
    pub rate: f32,
    /// How long a playback may stay in flight before the control is re-enabled.
    pub playback_timeout_ms: u64,
    /// External program used for speech synthesis in the terminal.
    pub command: String,
    /// Words per minute at rate 1.0, passed to the speech program.
    pub base_words_per_minute: u32,
}

impl SpeechConfig {
    /// Check if a speech rate is valid (finite, in (0.0, 4.0]).
    pub fn is_valid_rate(value: f32) -> bool {
        value.is_finite() && value > 0.0 && value <= 4.0
    }

    /// Playback timeout as a duration.
    pub fn playback_timeout(&self) -> Duration {
        Duration::from_millis(self.playback_timeout_ms)
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            // Slightly slower than normal speech for young listeners
            rate: 0.8,
            playback_timeout_ms: 10_000,
            command: "espeak".to_string(),
            base_words_per_minute: 175,
        }
    }
}

/// Listening/spelling game configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListeningConfig {
    /// Failed submissions before the word is revealed.
    pub max_attempts: u32,
    /// How long the shake cue stays on after a wrong spelling.
    pub shake_ms: u64,
    /// How long the celebration effect stays on after a correct spelling.
    pub celebration_ms: u64,
}

/// Minimum valid max_attempts value.
pub const MIN_MAX_ATTEMPTS: u32 = 1;

impl ListeningConfig {
    /// Check if max_attempts is valid (must be >= 1).
    pub fn is_valid_max_attempts(value: u32) -> bool {
        value >= MIN_MAX_ATTEMPTS
    }
}

impl Default for ListeningConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            shake_ms: 500,
            celebration_ms: 3_000,
        }
    }
}

/// Matching game configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    /// How long a wrong pair stays selected before it is cleared.
    pub mismatch_clear_ms: u64,
    /// Delay between the last match and the level-complete message.
    pub level_complete_delay_ms: u64,
    /// Whether pictures are shown in a different order than words.
    pub shuffle_images: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            mismatch_clear_ms: 800,
            level_complete_delay_ms: 1_500,
            shuffle_images: true,
        }
    }
}

/// Speaking practice configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeakingConfig {
    /// Fraction of expected words that must be heard for a success.
    pub success_threshold: f64,
    /// Resolution of the elapsed recording timer.
    pub tick_ms: u64,
}

impl SpeakingConfig {
    /// Check if a success threshold is valid (finite, in [0.0, 1.0]).
    pub fn is_valid_threshold(value: f64) -> bool {
        value.is_finite() && (0.0..=1.0).contains(&value)
    }
}

impl Default for SpeakingConfig {
    fn default() -> Self {
        Self {
            success_threshold: 0.70,
            tick_ms: 1_000,
        }
    }
}

/// Reading quiz configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReadingConfig {
    /// How long the answer feedback stays visible.
    pub feedback_clear_ms: u64,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            feedback_clear_ms: 2_000,
        }
    }
}

/// Content pack configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    /// Path to a JSON or TOML content pack. Built-in content when unset.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration with full precedence chain.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `<venture_home>/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = venture_home()?;
        Self::load_layer(&home.join("config.toml"))
    }

    /// Load project config from `.letter-venture/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_layer(&cwd.join(CONFIG_DIR_NAME).join("config.toml"))
    }

    /// A missing layer is skipped quietly; a broken one is skipped with a warning.
    fn load_layer(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        Self::load_from_file(path)
            .map(Some)
            .fail_open_default("loading config")
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| VentureError::storage(path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| VentureError::config(e.to_string()))?;
        Ok(config.sanitized(path))
    }

    /// Replace out-of-range file values with defaults, the same bounds the
    /// env overrides enforce.
    fn sanitized(mut self, path: &Path) -> Self {
        if !SpeechConfig::is_valid_rate(self.speech.rate) {
            let fallback = SpeechConfig::default().rate;
            tracing::warn!(
                path = %path.display(),
                "speech.rate {} must be in (0.0, 4.0], using {}",
                self.speech.rate,
                fallback
            );
            self.speech.rate = fallback;
        }
        if self.speech.command.trim().is_empty() {
            let fallback = SpeechConfig::default().command;
            tracing::warn!(path = %path.display(), "speech.command is empty, using {}", fallback);
            self.speech.command = fallback;
        }
        if !ListeningConfig::is_valid_max_attempts(self.listening.max_attempts) {
            let fallback = ListeningConfig::default().max_attempts;
            tracing::warn!(
                path = %path.display(),
                "listening.max_attempts {} must be >= {}, using {}",
                self.listening.max_attempts,
                MIN_MAX_ATTEMPTS,
                fallback
            );
            self.listening.max_attempts = fallback;
        }
        if !SpeakingConfig::is_valid_threshold(self.speaking.success_threshold) {
            let fallback = SpeakingConfig::default().success_threshold;
            tracing::warn!(
                path = %path.display(),
                "speaking.success_threshold {} must be in [0.0, 1.0], using {}",
                self.speaking.success_threshold,
                fallback
            );
            self.speaking.success_threshold = fallback;
        }
        self
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("LETTER_VENTURE_SPEECH_RATE") {
            match val.parse::<f32>() {
                Ok(n) if SpeechConfig::is_valid_rate(n) => self.speech.rate = n,
                Ok(n) => eprintln!(
                    "Warning: Invalid LETTER_VENTURE_SPEECH_RATE value '{}'. \
                    Must be in range (0.0, 4.0]. Using default '{}'.",
                    n, self.speech.rate
                ),
                Err(_) => eprintln!(
                    "Warning: Invalid LETTER_VENTURE_SPEECH_RATE value '{}'. \
                    Expected a decimal number. Using default '{}'.",
                    val, self.speech.rate
                ),
            }
        }

        if let Ok(val) = env::var("LETTER_VENTURE_SPEECH_COMMAND") {
            if val.trim().is_empty() {
                eprintln!(
                    "Warning: LETTER_VENTURE_SPEECH_COMMAND is empty. Using default '{}'.",
                    self.speech.command
                );
            } else {
                self.speech.command = val;
            }
        }

        if let Ok(val) = env::var("LETTER_VENTURE_MAX_ATTEMPTS") {
            match val.parse::<u32>() {
                Ok(n) if ListeningConfig::is_valid_max_attempts(n) => {
                    self.listening.max_attempts = n
                }
                Ok(n) => eprintln!(
                    "Warning: Invalid LETTER_VENTURE_MAX_ATTEMPTS value '{}'. \
                    Must be >= {}. Using default '{}'.",
                    n, MIN_MAX_ATTEMPTS, self.listening.max_attempts
                ),
                Err(_) => eprintln!(
                    "Warning: Invalid LETTER_VENTURE_MAX_ATTEMPTS value '{}'. \
                    Expected a positive integer. Using default '{}'.",
                    val, self.listening.max_attempts
                ),
            }
        }

        if let Ok(val) = env::var("LETTER_VENTURE_SUCCESS_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) if SpeakingConfig::is_valid_threshold(n) => {
                    self.speaking.success_threshold = n
                }
                Ok(n) => eprintln!(
                    "Warning: Invalid LETTER_VENTURE_SUCCESS_THRESHOLD value '{}'. \
                    Must be in range [0.0, 1.0]. Using default '{}'.",
                    n, self.speaking.success_threshold
                ),
                Err(_) => eprintln!(
                    "Warning: Invalid LETTER_VENTURE_SUCCESS_THRESHOLD value '{}'. \
                    Expected a decimal number. Using default '{}'.",
                    val, self.speaking.success_threshold
                ),
            }
        }

        if let Ok(val) = env::var("LETTER_VENTURE_CONTENT_PATH") {
            if !val.is_empty() {
                self.content.path = Some(PathBuf::from(val));
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// Field-by-field: every value in `other` that differs from the default
    /// wins. A layer cannot set a value back to the default over a
    /// lower-precedence customization.
    fn merge(mut self, other: Config) -> Self {
        let default_speech = SpeechConfig::default();
        if other.speech.rate != default_speech.rate {
            self.speech.rate = other.speech.rate;
        }
        if other.speech.playback_timeout_ms != default_speech.playback_timeout_ms {
            self.speech.playback_timeout_ms = other.speech.playback_timeout_ms;
        }
        if other.speech.command != default_speech.command {
            self.speech.command = other.speech.command;
        }
        if other.speech.base_words_per_minute != default_speech.base_words_per_minute {
            self.speech.base_words_per_minute = other.speech.base_words_per_minute;
        }

        let default_listening = ListeningConfig::default();
        if other.listening.max_attempts != default_listening.max_attempts {
            self.listening.max_attempts = other.listening.max_attempts;
        }
        if other.listening.shake_ms != default_listening.shake_ms {
            self.listening.shake_ms = other.listening.shake_ms;
        }
        if other.listening.celebration_ms != default_listening.celebration_ms {
            self.listening.celebration_ms = other.listening.celebration_ms;
        }

        let default_matching = MatchingConfig::default();
        if other.matching.mismatch_clear_ms != default_matching.mismatch_clear_ms {
            self.matching.mismatch_clear_ms = other.matching.mismatch_clear_ms;
        }
        if other.matching.level_complete_delay_ms != default_matching.level_complete_delay_ms {
            self.matching.level_complete_delay_ms = other.matching.level_complete_delay_ms;
        }
        if other.matching.shuffle_images != default_matching.shuffle_images {
            self.matching.shuffle_images = other.matching.shuffle_images;
        }

        let default_speaking = SpeakingConfig::default();
        if other.speaking.success_threshold != default_speaking.success_threshold {
            self.speaking.success_threshold = other.speaking.success_threshold;
        }
        if other.speaking.tick_ms != default_speaking.tick_ms {
            self.speaking.tick_ms = other.speaking.tick_ms;
        }

        if other.reading.feedback_clear_ms != ReadingConfig::default().feedback_clear_ms {
            self.reading.feedback_clear_ms = other.reading.feedback_clear_ms;
        }

        if other.content.path.is_some() {
            self.content.path = other.content.path;
        }

        self
    }

    /// Save configuration to the project config file.
    ///
    /// Writes `.letter-venture/config.toml` through a temp file and rename.
    pub fn save_project(&self, cwd: &Path) -> Result<PathBuf> {
        let config_dir = cwd.join(CONFIG_DIR_NAME);

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| VentureError::storage(&config_dir, e))?;
        }

        let config_path = config_dir.join("config.toml");
        let content =
            toml::to_string_pretty(self).map_err(|e| VentureError::config(e.to_string()))?;

        let temp_path = config_dir.join(".config.toml.tmp");
        fs::write(&temp_path, &content).map_err(|e| VentureError::storage(&temp_path, e))?;

        let file = fs::File::open(&temp_path).map_err(|e| VentureError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| VentureError::storage(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &config_path)
            .map_err(|e| VentureError::storage(&config_path, e))?;

        Ok(config_path)
    }

    /// Generate a diff of changed values between two configs.
    ///
    /// Returns a list of (key, old_value, new_value) tuples for changed fields.
    pub fn diff(&self, other: &Config) -> Vec<(String, String, String)> {
        let mut changes = Vec::new();
        let mut push = |key: &str, old: String, new: String| {
            if old != new {
                changes.push((key.to_string(), old, new));
            }
        };

        push(
            "speech.rate",
            format!("{:.2}", self.speech.rate),
            format!("{:.2}", other.speech.rate),
        );
        push(
            "speech.playback_timeout_ms",
            self.speech.playback_timeout_ms.to_string(),
            other.speech.playback_timeout_ms.to_string(),
        );
        push(
            "speech.command",
            self.speech.command.clone(),
            other.speech.command.clone(),
        );
        push(
            "speech.base_words_per_minute",
            self.speech.base_words_per_minute.to_string(),
            other.speech.base_words_per_minute.to_string(),
        );
        push(
            "listening.max_attempts",
            self.listening.max_attempts.to_string(),
            other.listening.max_attempts.to_string(),
        );
        push(
            "listening.shake_ms",
            self.listening.shake_ms.to_string(),
            other.listening.shake_ms.to_string(),
        );
        push(
            "listening.celebration_ms",
            self.listening.celebration_ms.to_string(),
            other.listening.celebration_ms.to_string(),
        );
        push(
            "matching.mismatch_clear_ms",
            self.matching.mismatch_clear_ms.to_string(),
            other.matching.mismatch_clear_ms.to_string(),
        );
        push(
            "matching.level_complete_delay_ms",
            self.matching.level_complete_delay_ms.to_string(),
            other.matching.level_complete_delay_ms.to_string(),
        );
        push(
            "matching.shuffle_images",
            self.matching.shuffle_images.to_string(),
            other.matching.shuffle_images.to_string(),
        );
        push(
            "speaking.success_threshold",
            format!("{:.2}", self.speaking.success_threshold),
            format!("{:.2}", other.speaking.success_threshold),
        );
        push(
            "speaking.tick_ms",
            self.speaking.tick_ms.to_string(),
            other.speaking.tick_ms.to_string(),
        );
        push(
            "reading.feedback_clear_ms",
            self.reading.feedback_clear_ms.to_string(),
            other.reading.feedback_clear_ms.to_string(),
        );
        push(
            "content.path",
            display_path(self.content.path.as_deref()),
            display_path(other.content.path.as_deref()),
        );

        changes
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(built-in)".to_string())
}

/// Get the Letter Venture home directory.
///
/// Checks `LETTER_VENTURE_HOME` first, then falls back to
/// `~/.letter-venture`. An empty env value is ignored.
pub fn venture_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("LETTER_VENTURE_HOME") {
        if home.is_empty() {
            tracing::warn!("LETTER_VENTURE_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("LETTER_VENTURE_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(CONFIG_DIR_NAME));
    }

    let fallback = env::temp_dir().join("letter-venture");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback.display()
    );
    Some(fallback)
}

/// Get the crash log path.
///
/// Returns `<venture_home>/crash.log`.
pub fn crash_log_path() -> Option<PathBuf> {
    venture_home().map(|h| h.join("crash.log"))
}
