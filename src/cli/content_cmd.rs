//! Content command for Letter Venture.
//!
//! Summarises the active content pack, or validates a pack file without
//! falling back to built-in content.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::content::ContentPack;

/// Options for the content command.
#[derive(Debug, Clone, Default)]
pub struct ContentOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Validate this file instead of summarising the active pack.
    pub validate: Option<PathBuf>,
}

/// Output format for the content command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentOutput {
    /// Whether the pack loaded and validated.
    pub success: bool,
    /// Where the pack came from: a file path or "built-in".
    pub source: String,
    /// Item counts, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<ContentCounts>,
    /// Error message if loading or validation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How much of each kind of content a pack holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCounts {
    pub words: usize,
    pub typing: usize,
    pub matching_levels: usize,
    pub matching_pairs: usize,
    pub speaking: usize,
    pub stories: usize,
    pub pages: usize,
    pub questions: usize,
    pub letters: usize,
}

impl From<&ContentPack> for ContentCounts {
    fn from(pack: &ContentPack) -> Self {
        let pages = pack.stories.iter().flat_map(|s| &s.pages);
        Self {
            words: pack.words.len(),
            typing: pack.typing.len(),
            matching_levels: pack.matching.len(),
            matching_pairs: pack.matching.iter().map(|l| l.items.len()).sum(),
            speaking: pack.speaking.len(),
            stories: pack.stories.len(),
            pages: pages.clone().count(),
            questions: pages.map(|p| p.questions.len()).sum(),
            letters: pack.alphabet.len(),
        }
    }
}

impl ContentOutput {
    /// Create a successful output.
    pub fn success(source: impl Into<String>, pack: &ContentPack) -> Self {
        Self {
            success: true,
            source: source.into(),
            counts: Some(ContentCounts::from(pack)),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            source: source.into(),
            counts: None,
            error: Some(error.into()),
        }
    }
}

/// The content command implementation.
pub struct ContentCommand {
    config: Config,
}

impl ContentCommand {
    /// Create a new content command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the content command.
    pub fn run(&self, options: &ContentOptions) -> ContentOutput {
        if let Some(path) = &options.validate {
            let source = path.display().to_string();
            return match ContentPack::load(path) {
                Ok(pack) => ContentOutput::success(source, &pack),
                Err(e) => ContentOutput::failure(source, e.to_string()),
            };
        }

        let source = self
            .config
            .content
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string());
        let pack = ContentPack::load_or_builtin(&self.config);
        ContentOutput::success(source, &pack)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ContentOutput, options: &ContentOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ContentOutput) -> String {
        if !output.success {
            return format!(
                "Content check failed for {}: {}\n",
                output.source,
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let Some(counts) = &output.counts else {
            return format!("Content pack: {}\n", output.source);
        };

        let lines = [
            format!("Content pack: {}", output.source),
            String::new(),
            format!("  Spelling words:     {}", counts.words),
            format!("  Typing sentences:   {}", counts.typing),
            format!(
                "  Matching levels:    {} ({} pairs)",
                counts.matching_levels, counts.matching_pairs
            ),
            format!("  Speaking sentences: {}", counts.speaking),
            format!(
                "  Stories:            {} ({} pages, {} questions)",
                counts.stories, counts.pages, counts.questions
            ),
            format!("  Alphabet cards:     {}", counts.letters),
        ];
        lines.join("\n") + "\n"
    }
}
