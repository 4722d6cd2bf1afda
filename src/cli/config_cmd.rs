//! Config command for Letter Venture.
//!
//! Shows the effective configuration and which keys differ from the
//! built-in defaults.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Options for the config show command.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// A key whose effective value differs from the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChange {
    /// Dotted key, e.g. `speech.rate`.
    pub key: String,
    /// Built-in default.
    pub default: String,
    /// Effective value.
    pub value: String,
}

/// Output format for the config show command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOutput {
    /// Effective configuration after all layers.
    pub config: Config,
    /// Keys changed from the defaults.
    pub changes: Vec<ConfigChange>,
}

/// The config show command implementation.
pub struct ConfigCommand {
    config: Config,
}

impl ConfigCommand {
    /// Create a new config command over an already loaded config.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the config show command.
    pub fn run(&self) -> ConfigOutput {
        let changes = Config::default()
            .diff(&self.config)
            .into_iter()
            .map(|(key, default, value)| ConfigChange {
                key,
                default,
                value,
            })
            .collect();
        ConfigOutput {
            config: self.config.clone(),
            changes,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ConfigOutput, options: &ConfigOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ConfigOutput) -> String {
        let mut lines = Vec::new();

        if output.changes.is_empty() {
            lines.push("All settings use defaults.".to_string());
        } else {
            lines.push("Changed from defaults:".to_string());
            for change in &output.changes {
                lines.push(format!(
                    "  {} = {} (default {})",
                    change.key, change.value, change.default
                ));
            }
        }

        match toml::to_string_pretty(&output.config) {
            Ok(text) => {
                lines.push(String::new());
                lines.push(text.trim_end().to_string());
            }
            Err(e) => tracing::warn!(error = %e, "could not render config as TOML"),
        }

        lines.join("\n") + "\n"
    }
}
