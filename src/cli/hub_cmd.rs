//! Hub command for Letter Venture.
//!
//! Lists the games reachable from the hub.

use serde::{Deserialize, Serialize};

use crate::hub::Route;

/// Options for the hub command.
#[derive(Debug, Clone, Default)]
pub struct HubOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the hub command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubOutput {
    /// Screen title.
    pub title: String,
    /// Games in hub order.
    pub games: Vec<GameInfo>,
}

/// One game tile on the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    /// Name used by `play`.
    pub name: String,
    /// Route path.
    pub path: String,
    /// Tile title.
    pub title: String,
    /// Tile description.
    pub description: String,
}

impl From<Route> for GameInfo {
    fn from(route: Route) -> Self {
        Self {
            name: route.name().to_string(),
            path: route.path().to_string(),
            title: route.title().to_string(),
            description: route.description().to_string(),
        }
    }
}

/// The hub command implementation.
#[derive(Debug, Default)]
pub struct HubCommand;

impl HubCommand {
    /// Create a new hub command.
    pub fn new() -> Self {
        Self
    }

    /// Run the hub command.
    pub fn run(&self) -> HubOutput {
        HubOutput {
            title: Route::Hub.title().to_string(),
            games: Route::games().iter().copied().map(GameInfo::from).collect(),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &HubOutput, options: &HubOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &HubOutput) -> String {
        let mut lines = vec![output.title.clone(), String::new()];
        for (i, game) in output.games.iter().enumerate() {
            lines.push(format!(
                "  {}. {:<18} {:<10} {}",
                i + 1,
                game.title,
                game.name,
                game.description
            ));
        }
        lines.push(String::new());
        lines.push("Start one with: letter-venture play <name>".to_string());
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_lists_every_game() {
        let output = HubCommand::new().run();
        assert_eq!(output.title, "Mission Control");
        assert_eq!(output.games.len(), 6);
        assert_eq!(output.games[0].name, "reading");
        assert_eq!(output.games[5].path, "/alphabet");
    }

    #[test]
    fn test_format_output_human_readable() {
        let cmd = HubCommand::new();
        let formatted = cmd.format_output(&cmd.run(), &HubOptions::default());
        assert!(formatted.contains("1. Story Station"));
        assert!(formatted.contains("Hear a word and spell it"));
        assert!(formatted.contains("letter-venture play <name>"));
    }

    #[test]
    fn test_format_output_json() {
        let cmd = HubCommand::new();
        let options = HubOptions {
            json: true,
            ..Default::default()
        };
        let formatted = cmd.format_output(&cmd.run(), &options);
        assert!(formatted.contains("\"name\": \"matching\""));
    }

    #[test]
    fn test_format_output_quiet() {
        let cmd = HubCommand::new();
        let options = HubOptions {
            quiet: true,
            ..Default::default()
        };
        assert!(cmd.format_output(&cmd.run(), &options).is_empty());
    }
}
