//! Command implementations for the CLI.

mod config;
mod settings;
mod toggle;
mod watch;

pub use config::cmd_config;
pub use settings::cmd_settings;
pub use toggle::cmd_toggle;
pub use watch::{WatchArgs, cmd_watch};
