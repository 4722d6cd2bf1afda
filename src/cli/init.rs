//! Init command for Letter Venture.
//!
//! Scaffolds the project config file and the user-level home directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{venture_home, CONFIG_DIR_NAME};

/// Options for the init command.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Force overwrite existing files.
    pub force: bool,
}

/// Output format for the init command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitOutput {
    /// Whether initialization was successful.
    pub success: bool,
    /// Files and directories created.
    pub created: Vec<String>,
    /// Files that already existed (skipped).
    pub skipped: Vec<String>,
    /// Error message if initialization failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InitOutput {
    /// Create a successful output.
    pub fn success(created: Vec<String>, skipped: Vec<String>) -> Self {
        Self {
            success: true,
            created,
            skipped,
            error: None,
        }
    }

    /// Create a failed output, keeping what was created before the failure.
    pub fn failure(error: impl Into<String>, created: Vec<String>, skipped: Vec<String>) -> Self {
        Self {
            success: false,
            created,
            skipped,
            error: Some(error.into()),
        }
    }
}

/// Default config.toml content.
const DEFAULT_CONFIG: &str = r#"# Letter Venture Configuration
#
# Every setting is optional; delete a line to use the built-in default.

# Text-to-speech. `command` is run as `<command> -s <words per minute> <text>`.
[speech]
rate = 0.8
playback_timeout_ms = 10000
command = "espeak"
base_words_per_minute = 175

# Listen-and-spell. The word is revealed after max_attempts wrong tries.
[listening]
max_attempts = 5
shake_ms = 500
celebration_ms = 3000

# Word-picture matching.
[matching]
mismatch_clear_ms = 800
level_complete_delay_ms = 1500
shuffle_images = true

# Speaking practice. A recording passes when this share of words is heard.
[speaking]
success_threshold = 0.7
tick_ms = 1000

# Reading quiz.
[reading]
feedback_clear_ms = 2000

# Custom content pack (JSON or TOML). Leave unset for the built-in pack.
[content]
# path = "my-pack.toml"
"#;

/// The init command implementation.
pub struct InitCommand {
    cwd: PathBuf,
    home: Option<PathBuf>,
}

impl InitCommand {
    /// Create a new init command for a project directory.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home: venture_home(),
        }
    }

    /// Create an init command with an explicit user home directory.
    pub fn with_home(cwd: impl Into<PathBuf>, home: Option<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home,
        }
    }

    /// Run the init command.
    pub fn run(&self, options: &InitOptions) -> InitOutput {
        let mut created = Vec::new();
        let mut skipped = Vec::new();

        let project_dir = self.cwd.join(CONFIG_DIR_NAME);
        match self.ensure_dir(&project_dir) {
            Ok(true) => created.push(project_dir.display().to_string()),
            Ok(false) => skipped.push(project_dir.display().to_string()),
            Err(e) => return InitOutput::failure(e, created, skipped),
        }

        let config_path = project_dir.join("config.toml");
        match self.ensure_file(&config_path, DEFAULT_CONFIG, options.force) {
            Ok(true) => created.push(config_path.display().to_string()),
            Ok(false) => skipped.push(config_path.display().to_string()),
            Err(e) => return InitOutput::failure(e, created, skipped),
        }

        // The crash log lives here.
        if let Some(home) = &self.home {
            match self.ensure_dir(home) {
                Ok(true) => created.push(home.display().to_string()),
                Ok(false) => skipped.push(home.display().to_string()),
                Err(e) => return InitOutput::failure(e, created, skipped),
            }
        }

        tracing::debug!(created = created.len(), skipped = skipped.len(), "init finished");
        InitOutput::success(created, skipped)
    }

    /// Returns Ok(true) if created, Ok(false) if it already exists.
    fn ensure_dir(&self, path: &Path) -> Result<bool, String> {
        if path.exists() {
            if path.is_dir() {
                return Ok(false);
            }
            return Err(format!("{} exists but is not a directory", path.display()));
        }

        fs::create_dir_all(path)
            .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))?;

        Ok(true)
    }

    /// Returns Ok(true) if written, Ok(false) if left alone.
    fn ensure_file(&self, path: &Path, content: &str, force: bool) -> Result<bool, String> {
        if path.exists() && !force {
            return Ok(false);
        }

        fs::write(path, content)
            .map_err(|e| format!("Failed to write file {}: {}", path.display(), e))?;

        Ok(true)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &InitOutput, options: &InitOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &InitOutput) -> String {
        let mut lines = Vec::new();

        if !output.success {
            lines.push(format!(
                "Init failed: {}",
                output.error.as_deref().unwrap_or("unknown error")
            ));
            if !output.created.is_empty() {
                lines.push(String::new());
                lines.push("Partially created before failure:".to_string());
                lines.extend(output.created.iter().map(|p| format!("  {}", p)));
            }
            return lines.join("\n") + "\n";
        }

        if output.created.is_empty() {
            return "Letter Venture already initialized.\n".to_string();
        }

        lines.push("Created:".to_string());
        lines.extend(output.created.iter().map(|p| format!("  {}", p)));

        if !output.skipped.is_empty() {
            lines.push("Already exists (skipped):".to_string());
            lines.extend(output.skipped.iter().map(|p| format!("  {}", p)));
        }

        lines.push(String::new());
        lines.push("Letter Venture initialized. Edit the config to change game timings.".to_string());

        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn command(temp: &TempDir) -> InitCommand {
        InitCommand::with_home(temp.path(), Some(temp.path().join("home")))
    }

    #[test]
    fn test_init_creates_config_and_home() {
        let temp = TempDir::new().unwrap();
        let output = command(&temp).run(&InitOptions::default());

        assert!(output.success);
        assert_eq!(output.created.len(), 3);
        assert!(temp.path().join(".letter-venture/config.toml").exists());
        assert!(temp.path().join("home").is_dir());
    }

    #[test]
    fn test_init_idempotent() {
        let temp = TempDir::new().unwrap();
        let cmd = command(&temp);

        cmd.run(&InitOptions::default());
        let second = cmd.run(&InitOptions::default());

        assert!(second.success);
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 3);
        assert_eq!(
            cmd.format_output(&second, &InitOptions::default()),
            "Letter Venture already initialized.\n"
        );
    }

    #[test]
    fn test_init_with_force_rewrites_config() {
        let temp = TempDir::new().unwrap();
        let cmd = command(&temp);
        cmd.run(&InitOptions::default());

        let config_path = temp.path().join(".letter-venture/config.toml");
        fs::write(&config_path, "# modified").unwrap();

        let output = cmd.run(&InitOptions {
            force: true,
            ..Default::default()
        });

        assert!(output.success);
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("Letter Venture Configuration"));
    }

    #[test]
    fn test_init_fails_when_dir_is_a_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".letter-venture"), "not a dir").unwrap();

        let output = command(&temp).run(&InitOptions::default());

        assert!(!output.success);
        assert!(output.error.unwrap().contains("not a directory"));
    }

    #[test]
    fn test_default_config_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_format_output_human_readable() {
        let temp = TempDir::new().unwrap();
        let cmd = command(&temp);
        let output = InitOutput::success(
            vec!["created.toml".to_string()],
            vec!["skipped".to_string()],
        );

        let formatted = cmd.format_output(&output, &InitOptions::default());
        assert!(formatted.contains("Created:\n  created.toml"));
        assert!(formatted.contains("Already exists (skipped):\n  skipped"));
    }

    #[test]
    fn test_format_output_partial_failure() {
        let temp = TempDir::new().unwrap();
        let cmd = command(&temp);
        let output =
            InitOutput::failure("permission denied", vec!["created_dir".to_string()], vec![]);

        let formatted = cmd.format_output(&output, &InitOptions::default());
        assert!(formatted.contains("Init failed: permission denied"));
        assert!(formatted.contains("Partially created before failure:"));
    }

    #[test]
    fn test_format_output_json_and_quiet() {
        let temp = TempDir::new().unwrap();
        let cmd = command(&temp);
        let output = InitOutput::success(vec!["x".to_string()], vec![]);

        let json = cmd.format_output(
            &output,
            &InitOptions {
                json: true,
                ..Default::default()
            },
        );
        assert!(json.contains("\"success\": true"));

        let quiet = cmd.format_output(
            &output,
            &InitOptions {
                quiet: true,
                ..Default::default()
            },
        );
        assert!(quiet.is_empty());
    }
}
