//! Terminal front end for the vivarium monitoring dashboard.
//!
//! The binary lives in `main.rs`; the pieces are exposed here so they can be
//! tested without a terminal:
//!
//! - [`cli`]: argument definitions
//! - [`config`]: the config file and flag/env/file resolution
//! - [`terminal`]: a dashboard view that prints changes as lines
//! - [`commands`]: one function per subcommand

pub mod cli;
pub mod commands;
pub mod config;
pub mod style;
pub mod terminal;
pub mod util;

pub use vivarium_core;
pub use vivarium_types;
