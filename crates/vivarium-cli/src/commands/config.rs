//! Config command implementation.

use std::io::{self, Write};

use anyhow::{Context, Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;

pub fn cmd_config(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", Config::path().display());
        }
        ConfigAction::Show => {
            let mut shown = config.clone();
            if shown.session_cookie.is_some() {
                shown.session_cookie = Some("<hidden>".to_string());
            }
            let content = toml::to_string_pretty(&shown).context("Failed to serialize config")?;
            io::stdout().write_all(content.as_bytes())?;
        }
        ConfigAction::Init { force } => {
            let path = Config::path();
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::template().save()?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
