//! Watch command implementation.
//!
//! Loads the retention window once, then polls until Ctrl+C or until the
//! backend reports the session as expired. Readings and changed tiles are
//! printed by the terminal dashboard as they arrive.

use anyhow::{Result, bail};
use futures::StreamExt;
use tracing::{debug, info, warn};
use vivarium_core::{PollOutcome, SyncOptions};

use crate::config::{Backend, Config, resolve_interval, resolve_retention};
use crate::util::connect;

/// Arguments for the watch command.
pub struct WatchArgs {
    pub hours: Option<u32>,
    pub interval: Option<u64>,
    pub no_color: bool,
    pub quiet: bool,
}

pub async fn cmd_watch(args: WatchArgs, backend: &Backend, config: &Config) -> Result<()> {
    let retention = resolve_retention(args.hours, config);
    let options = SyncOptions::with_interval(resolve_interval(args.interval, config));
    options.validate()?;

    let session = connect(backend, retention, args.no_color, true)?;
    let engine = session.engine;

    if !args.quiet {
        eprintln!(
            "Watching {} (retention: {}, every {}ms). Press Ctrl+C to stop.",
            backend.url,
            retention,
            options.poll_interval.as_millis()
        );
    }

    {
        let mut ctx = engine.context().lock().await;
        ctx.view_mut().set_echo(!args.quiet);
        ctx.view_mut().print_header();
    }

    match engine.bootstrap().await {
        PollOutcome::Merged(report) => {
            debug!("Initial load done, watermark {}", report.watermark);
        }
        PollOutcome::Unauthenticated | PollOutcome::Skipped => {
            bail!("Session expired. Update the session cookie and try again.");
        }
        PollOutcome::Unchanged => info!("No readings in the retention window yet"),
        PollOutcome::Ignored => warn!("Initial load failed; continuing with live updates"),
    }

    engine.context().lock().await.view_mut().set_echo(true);

    let mut polls = engine.spawn_poll_loop(options)?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nShutting down...");
                return Ok(());
            }
            _ = session.shutdown.cancelled() => {
                bail!("Session expired. Update the session cookie and try again.");
            }
            outcome = polls.next() => match outcome {
                Some(PollOutcome::Ignored) => debug!("Poll returned nothing usable"),
                Some(outcome) => debug!("Poll: {:?}", outcome),
                None => {
                    if engine.is_session_expired() {
                        bail!("Session expired. Update the session cookie and try again.");
                    }
                    return Ok(());
                }
            },
        }
    }
}
