use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use time::UtcOffset;
use tracing_subscriber::EnvFilter;
use vivarium_cli::cli::{Cli, Commands};
use vivarium_cli::commands::{WatchArgs, cmd_config, cmd_settings, cmd_toggle, cmd_watch};
use vivarium_cli::config::{Config, resolve_backend};
use vivarium_types::timestamp::local_offset;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "vivarium", &mut io::stdout());
        return Ok(());
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    // Must be read before the runtime spawns its worker threads.
    let local = local_offset();

    tokio::runtime::Runtime::new()?.block_on(run(cli, local))
}

async fn run(cli: Cli, local: UtcOffset) -> Result<()> {
    let config = Config::load();
    let no_color = cli.no_color || config.no_color;

    match cli.command {
        Commands::Watch { hours, interval } => {
            let backend = resolve_backend(&cli.backend, &config, local)?;
            let args = WatchArgs {
                hours,
                interval,
                no_color,
                quiet: cli.quiet,
            };
            cmd_watch(args, &backend, &config).await?;
        }
        Commands::Toggle { device, state } => {
            let backend = resolve_backend(&cli.backend, &config, local)?;
            cmd_toggle(&device, state.map(Into::into), &backend, no_color).await?;
        }
        Commands::Settings { pairs } => {
            let backend = resolve_backend(&cli.backend, &config, local)?;
            cmd_settings(&pairs, &backend, no_color).await?;
        }
        Commands::Config { action } => {
            cmd_config(action, &config)?;
        }
        Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }

    Ok(())
}
