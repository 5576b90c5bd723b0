//! Settings command implementation.

use anyhow::{Result, bail};
use vivarium_core::{RetentionWindow, SettingsForm, SettingsOutcome, Tile};

use crate::config::Backend;
use crate::style;
use crate::util::connect;

pub async fn cmd_settings(pairs: &[String], backend: &Backend, no_color: bool) -> Result<()> {
    let form = SettingsForm::from_pairs(pairs)?;
    let session = connect(backend, RetentionWindow::default(), no_color, false)?;

    match session.engine.submit_settings(&form).await {
        SettingsOutcome::Saved => {
            let status = session
                .engine
                .inspect(|ctx| ctx.view().state().tile(&Tile::Status).cloned())
                .await;
            if let Some(status) = status {
                println!("{}", style::tile_value(&status, no_color));
            }
            Ok(())
        }
        SettingsOutcome::Unauthenticated => {
            bail!("Session expired. Update the session cookie and try again.")
        }
        SettingsOutcome::Ignored => bail!("The controller did not accept the settings"),
    }
}
