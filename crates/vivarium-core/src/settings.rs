//! Settings submission.
//!
//! The settings endpoint has no payload worth decoding; a 200 is the whole
//! answer. It goes through the same session guard as the other endpoints.

use tracing::debug;

use crate::context::SETTINGS_SAVED_MESSAGE;
use crate::engine::SyncEngine;
use crate::protocol::SettingsForm;
use crate::session::{Classified, Endpoint, classify_with};
use crate::transport::{SETTINGS_PATH, Transport};
use crate::view::DashboardView;

/// What a settings submission did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOutcome {
    /// The backend accepted the settings.
    Saved,
    /// The session expired; the login redirect has fired.
    Unauthenticated,
    /// No usable response.
    Ignored,
}

impl<V, T> SyncEngine<V, T>
where
    V: DashboardView + 'static,
    T: Transport + 'static,
{
    /// Submit `form` to the settings endpoint.
    ///
    /// On success the status tile reads "Settings updated successfully.".
    pub async fn submit_settings(&self, form: &SettingsForm) -> SettingsOutcome {
        debug!("Submitting {} setting(s)", form.len());
        let response = self
            .transport
            .post_form(SETTINGS_PATH, &form.to_fields())
            .await;
        let classified = classify_with(response, |_| Ok(()));
        let unauthenticated = matches!(classified, Classified::Unauthenticated);

        match self.guard.admit(Endpoint::Settings, classified) {
            Some(()) => {
                self.context.lock().await.set_status(SETTINGS_SAVED_MESSAGE);
                SettingsOutcome::Saved
            }
            None if unauthenticated => SettingsOutcome::Unauthenticated,
            None => SettingsOutcome::Ignored,
        }
    }
}
