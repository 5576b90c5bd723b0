//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use vivarium_types::DeviceStatus;

/// Requested device state on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    On,
    Off,
}

impl From<StateArg> for DeviceStatus {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::On => DeviceStatus::On,
            StateArg::Off => DeviceStatus::Off,
        }
    }
}

/// Backend connection arguments shared by every networked command.
#[derive(Debug, Clone, Default, Args)]
pub struct BackendArgs {
    /// Backend base URL (e.g. http://vivarium.local:5000)
    #[arg(long, global = true, env = "VIVARIUM_URL")]
    pub url: Option<String>,

    /// Session cookie sent with every request (e.g. "session=...")
    #[arg(long, global = true, env = "VIVARIUM_SESSION", hide_env_values = true)]
    pub session: Option<String>,
}

#[derive(Parser)]
#[command(name = "vivarium")]
#[command(author, version, about = "Terminal dashboard for a vivarium controller", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow new readings and device changes until Ctrl+C
    Watch {
        /// Hours of history to keep visible
        #[arg(long)]
        hours: Option<u32>,

        /// Poll interval in milliseconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Switch a device on or off
    Toggle {
        /// Device name as known to the backend (e.g. pump)
        device: String,

        /// State to request; defaults to the opposite of the current state
        #[arg(short, long, value_enum)]
        state: Option<StateArg>,
    },

    /// Submit controller settings
    Settings {
        /// Settings as NAME=VALUE pairs
        #[arg(required = true, value_name = "NAME=VALUE")]
        pairs: Vec<String>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
