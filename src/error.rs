//! Unified error types for Letter Venture.
//!
//! Most failures in a game session are recoverable: a wrong answer is not an
//! error at all, and a missing speaker or microphone only disables one
//! control. Errors that reach a controller are turned into a toast plus a
//! re-enabled control; only configuration and content problems at startup
//! are allowed to stop the program.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// External capabilities a controller may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Text-to-speech playback.
    SpeechSynthesis,
    /// Live speech-to-text transcription.
    SpeechRecognition,
    /// Raw microphone capture.
    Microphone,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::SpeechSynthesis => "speech synthesis",
            Capability::SpeechRecognition => "speech recognition",
            Capability::Microphone => "microphone",
        };
        f.write_str(name)
    }
}

/// The main error type for Letter Venture operations.
#[derive(Error, Debug)]
pub enum VentureError {
    /// I/O errors while reading config or content files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Content pack validation errors.
    #[error("content error: {message}")]
    Content { message: String },

    /// Controller operation not allowed in the current state.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// An id that does not exist in the active content.
    #[error("unknown {kind}: {id}")]
    UnknownItem { kind: &'static str, id: String },

    /// A speech or microphone capability is missing or failed.
    #[error("{capability} unavailable: {message}")]
    Capability {
        capability: Capability,
        message: String,
    },
}

/// A specialized Result type for Letter Venture operations.
pub type Result<T> = std::result::Result<T, VentureError>;

impl VentureError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a content error.
    pub fn content(message: impl Into<String>) -> Self {
        Self::Content {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an unknown item error.
    pub fn unknown_item(kind: &'static str, id: impl ToString) -> Self {
        Self::UnknownItem {
            kind,
            id: id.to_string(),
        }
    }

    /// Create a capability error.
    pub fn capability(capability: Capability, message: impl Into<String>) -> Self {
        Self::Capability {
            capability,
            message: message.into(),
        }
    }

    /// Check whether a running game can carry on after this error.
    ///
    /// Capability failures fall back to a message, and unknown ids or
    /// rejected operations leave the controller untouched. Broken config or
    /// content is only reported at startup.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VentureError::Capability { .. }
                | VentureError::UnknownItem { .. }
                | VentureError::InvalidState { .. }
        )
    }
}

impl From<io::Error> for VentureError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for VentureError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for VentureError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Logs the error and substitutes a safe value so the session keeps going.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the letter-venture binary.
pub mod exit_codes {
    /// Normal exit.
    pub const SUCCESS: i32 = 0;

    /// A command failed (bad content file, invalid arguments).
    pub const ERROR: i32 = 1;

    /// The process panicked.
    pub const CRASH: i32 = 3;
}
