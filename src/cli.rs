//! Command-line argument parsing
//!
//! Supports:
//! - Checking a keymap and printing what it resolves to
//! - Replaying key strings through the engine

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Modal keyboard shortcut engine
#[derive(Parser, Debug)]
#[command(name = "keymode", version, about = "Inspect and exercise keyboard shortcut maps")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Load the keymap and print a summary of every mode
    Check {
        /// Keymap file layered on the built-in defaults instead of the
        /// project and user keymaps
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Feed key strings through the engine and print what happens
    Replay {
        /// Keymap file layered on the built-in defaults instead of the
        /// project and user keymaps
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Keys to press in order, e.g. "ctrl+shift+a" "m"
        #[arg(value_name = "KEY", required = true)]
        keys: Vec<String>,
    },
}

impl Command {
    pub fn config(&self) -> Option<&PathBuf> {
        match self {
            Command::Check { config } | Command::Replay { config, .. } => config.as_ref(),
        }
    }
}
