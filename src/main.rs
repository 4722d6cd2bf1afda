//! Letter Venture - space-themed literacy mini-games
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use letter_venture::cli::config_cmd::{ConfigCommand, ConfigOptions};
use letter_venture::cli::content_cmd::{ContentCommand, ContentOptions};
use letter_venture::cli::hub_cmd::{HubCommand, HubOptions};
use letter_venture::cli::init::{InitCommand, InitOptions};
use letter_venture::cli::play::{PlayOptions, PlaySession};
use letter_venture::config::{crash_log_path, Config};
use letter_venture::content::ContentPack;
use letter_venture::error::exit_codes;
use letter_venture::hub::Route;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "LETTER_VENTURE_LOG";

// =============================================================================
// CLI Definition
// =============================================================================

/// Letter Venture - space-themed literacy mini-games
#[derive(Parser)]
#[command(name = "letter-venture")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the games on the hub
    Hub {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Play a game in the terminal (or "hub" to pick one)
    Play {
        /// Game name or path, e.g. listening or /matching
        game: Route,
        /// Never play sound
        #[arg(long)]
        mute: bool,
        /// Print the session trace as JSON when done
        #[arg(long)]
        trace: bool,
        /// Seed for word draws and picture shuffles
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Summarise the content pack, or validate a pack file
    Content {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Validate this JSON or TOML pack instead
        #[arg(long, value_name = "PATH")]
        validate: Option<PathBuf>,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },
    /// Write a commented config file for this project
    Init {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Overwrite an existing config file
        #[arg(long, short)]
        force: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("letter-venture error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Log to stderr so game output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// On panic, append to `<venture_home>/crash.log` and exit with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("letter-venture panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Some(dir) = crash_log.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Hub { json } => run_hub(json),
        Commands::Play {
            game,
            mute,
            trace,
            seed,
        } => run_play(game, PlayOptions { mute, trace, seed }, &cwd),
        Commands::Content { json, validate } => run_content(json, validate, &cwd),
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => run_config_show(json, &cwd),
            ConfigAction::Init { json, force } => run_config_init(json, force, &cwd),
        },
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        print!("{}", formatted);
    }
}

fn run_hub(json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = HubCommand::new();
    let options = HubOptions { json, quiet: false };
    print_formatted(&cmd.format_output(&cmd.run(), &options));
    Ok(success_to_exit_code(true))
}

fn run_play(
    game: Route,
    options: PlayOptions,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load_from_cwd(cwd);
    let content = ContentPack::load_or_builtin(&config);
    let mut session = PlaySession::new(config, content, options);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    session.run(game, stdin.lock(), &mut stdout)?;
    stdout.flush()?;

    Ok(success_to_exit_code(true))
}

fn run_content(
    json: bool,
    validate: Option<PathBuf>,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = ContentCommand::new(Config::load_from_cwd(cwd));
    let options = ContentOptions {
        json,
        quiet: false,
        validate,
    };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_config_show(json: bool, cwd: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = ConfigCommand::new(Config::load_from_cwd(cwd));
    let options = ConfigOptions { json, quiet: false };
    print_formatted(&cmd.format_output(&cmd.run(), &options));
    Ok(success_to_exit_code(true))
}

fn run_config_init(
    json: bool,
    force: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = InitCommand::new(cwd);
    let options = InitOptions {
        json,
        quiet: false,
        force,
    };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}
