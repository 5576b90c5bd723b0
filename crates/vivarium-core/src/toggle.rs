//! The toggle coordinator.
//!
//! A toggle raises the watermark to "now" before its request goes out and
//! only ever shows the state the backend confirms. Nothing is applied
//! optimistically; if the request is lost, the control keeps its old state.

use tracing::{debug, info, warn};
use vivarium_types::{DeviceId, DeviceState, DeviceStatus};

use crate::engine::SyncEngine;
use crate::protocol::toggle_form;
use crate::session::{Classified, Endpoint, classify};
use crate::transport::{TOGGLE_PATH, Transport};
use crate::view::DashboardView;

/// What a toggle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The backend confirmed a state, which may differ from the one requested.
    Confirmed(DeviceState),
    /// The session expired; the login redirect has fired.
    Unauthenticated,
    /// No usable response. The control is unchanged.
    Ignored,
}

impl ToggleOutcome {
    /// The confirmed state, if any.
    pub fn confirmed(&self) -> Option<DeviceStatus> {
        match self {
            ToggleOutcome::Confirmed(state) => Some(state.state),
            _ => None,
        }
    }
}

impl<V, T> SyncEngine<V, T>
where
    V: DashboardView + 'static,
    T: Transport + 'static,
{
    /// Ask the backend to put `device` into the `requested` state.
    pub async fn toggle_device(&self, device: &DeviceId, requested: DeviceStatus) -> ToggleOutcome {
        let watermark = self.context.lock().await.begin_toggle();
        debug!("Toggling {} to {}, watermark {}", device, requested, watermark);

        let response = self
            .transport
            .post_form(TOGGLE_PATH, &toggle_form(device, requested))
            .await;
        let classified = classify::<DeviceState>(response);
        let unauthenticated = matches!(classified, Classified::Unauthenticated);

        let Some(confirmed) = self.guard.admit(Endpoint::Toggle, classified) else {
            return if unauthenticated {
                ToggleOutcome::Unauthenticated
            } else {
                ToggleOutcome::Ignored
            };
        };

        if confirmed.device_id != *device {
            warn!(
                "Toggle for {} confirmed state of {} instead",
                device, confirmed.device_id
            );
        }
        if confirmed.state != requested {
            info!(
                "{} requested {} but backend confirmed {}",
                device, requested, confirmed.state
            );
        }

        self.context
            .lock()
            .await
            .apply_confirmed_state(confirmed.clone());
        ToggleOutcome::Confirmed(confirmed)
    }

    /// Flip `device` relative to its last known state.
    ///
    /// A device that has never been reported counts as off.
    pub async fn toggle(&self, device: &DeviceId) -> ToggleOutcome {
        let current = self
            .context
            .lock()
            .await
            .device_state(device)
            .unwrap_or_default();
        self.toggle_device(device, current.toggled()).await
    }
}
