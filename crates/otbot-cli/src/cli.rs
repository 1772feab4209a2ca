//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser, Debug)]
#[command(name = "ot-bot", version, about = "Session manager and room lister for the ot-bot service")]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .multiple(true)
        .args(["info", "socket", "unauth"])
))]
pub struct Cli {
    /// Get room info of user
    #[arg(long)]
    pub info: bool,

    /// Run a signal socket to notify the telegram bot
    #[arg(long, value_name = "ROOM_ID")]
    pub socket: Option<String>,

    /// Logout and clear session
    #[arg(long)]
    pub unauth: bool,

    /// Read settings from this env file instead of the default locations
    #[arg(long, value_name = "PATH", env = "OT_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a single invocation does, in order of precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Logout,
    ListRooms,
    Notify(String),
}

impl Cli {
    pub fn action(&self) -> Action {
        if self.unauth {
            Action::Logout
        } else if self.info {
            Action::ListRooms
        } else {
            // The argument group guarantees one of the three is set
            Action::Notify(self.socket.clone().unwrap_or_default())
        }
    }
}
