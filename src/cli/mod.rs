//! CLI commands for Letter Venture.
//!
//! - **Play**: the interactive line-oriented game loop
//! - **Inspection**: hub, content, config show, trace formatting
//! - **Setup**: init

// Play
pub mod play;

// Inspection
pub mod config_cmd;
pub mod content_cmd;
pub mod hub_cmd;
pub mod trace;

// Setup
pub mod init;

pub use config_cmd::ConfigCommand;
pub use content_cmd::ContentCommand;
pub use hub_cmd::HubCommand;
pub use init::InitCommand;
pub use play::{Flow, PlayOptions, PlaySession};
pub use trace::{format_traces, TraceEventInfo, TraceOutput};
