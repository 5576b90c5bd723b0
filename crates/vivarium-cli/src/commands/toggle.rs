//! Toggle command implementation.

use anyhow::{Result, bail};
use vivarium_core::{
    DashboardView, PollOutcome, RetentionWindow, SyncEngine, ToggleOutcome, Transport,
};
use vivarium_types::{DeviceId, DeviceState, DeviceStatus};

use crate::config::Backend;
use crate::style;
use crate::util::connect;

const SESSION_EXPIRED: &str = "Session expired. Update the session cookie and try again.";

pub async fn cmd_toggle(
    device: &str,
    requested: Option<DeviceStatus>,
    backend: &Backend,
    no_color: bool,
) -> Result<()> {
    let device = DeviceId::new(device)?;
    let session = connect(backend, RetentionWindow::default(), no_color, false)?;

    let state = set_device_state(&session.engine, &device, requested).await?;

    let rendered = style::device_state(state.state.as_str(), no_color);
    println!("{}", style::labelled(state.device_id.as_str(), &rendered, no_color));
    if let Some(requested) = requested
        && requested != state.state
    {
        eprintln!(
            "Requested {} but the controller kept {} {}",
            requested, state.device_id, state.state
        );
    }
    Ok(())
}

/// Put `device` into `requested`, or flip it when no state is given.
///
/// Flipping needs the device's current state, and a fresh engine has none,
/// so the window's history and device states are loaded first.
pub async fn set_device_state<V, T>(
    engine: &SyncEngine<V, T>,
    device: &DeviceId,
    requested: Option<DeviceStatus>,
) -> Result<DeviceState>
where
    V: DashboardView + 'static,
    T: Transport + 'static,
{
    let requested = match requested {
        Some(state) => state,
        None => {
            if let PollOutcome::Unauthenticated | PollOutcome::Skipped = engine.bootstrap().await {
                bail!(SESSION_EXPIRED);
            }
            let Some(current) = engine.inspect(|ctx| ctx.device_state(device)).await else {
                bail!(
                    "The controller did not report {}; pass --state on or --state off",
                    device
                );
            };
            current.toggled()
        }
    };

    match engine.toggle_device(device, requested).await {
        ToggleOutcome::Confirmed(state) => Ok(state),
        ToggleOutcome::Unauthenticated => bail!(SESSION_EXPIRED),
        ToggleOutcome::Ignored => bail!("No confirmation from the controller; {} unchanged", device),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use time::macros::datetime;
    use time::{Duration, OffsetDateTime, UtcOffset};
    use vivarium_core::mock::{ManualClock, MockTransport, RecordingNavigator, flip_toggle};
    use vivarium_core::transport::{RELOAD_PATH, TOGGLE_PATH};
    use vivarium_core::{MemoryDashboard, RawResponse, SyncContext};

    const NOW: OffsetDateTime = datetime!(2024-05-01 12:00 UTC);

    fn pump() -> DeviceId {
        DeviceId::new("pump").unwrap()
    }

    fn engine() -> (SyncEngine<MemoryDashboard, MockTransport>, Arc<MockTransport>) {
        let clock = Arc::new(ManualClock::new(NOW));
        let context =
            SyncContext::with_clock(MemoryDashboard::new(), RetentionWindow::default(), clock)
                .with_backend_offset(UtcOffset::UTC);
        let transport = Arc::new(MockTransport::new());
        let engine = SyncEngine::new(context, transport.clone(), Arc::new(RecordingNavigator::new()));
        (engine, transport)
    }

    /// Answer reloads the way the backend does: device states only come back
    /// when the database changed after `last`.
    fn reload_reporting(transport: &MockTransport, pump_state: &'static str) {
        let changed_at = (NOW - Duration::minutes(1)).unix_timestamp();
        transport.respond_with(RELOAD_PATH, move |fields| {
            let last = fields
                .iter()
                .find(|(k, _)| k == "last")
                .and_then(|(_, v)| v.parse::<i64>().ok());
            match last {
                Some(last) if last < changed_at => RawResponse::new(
                    200,
                    format!(
                        r#"{{"device_states":[{{"device":"pump","state":"{}"}}],"backend_running":true}}"#,
                        pump_state
                    ),
                ),
                _ => RawResponse::empty(304),
            }
        });
    }

    #[tokio::test]
    async fn test_flip_learns_current_state_first() {
        let (engine, transport) = engine();
        reload_reporting(&transport, "On");
        transport.respond_with(TOGGLE_PATH, flip_toggle);

        let state = set_device_state(&engine, &pump(), None).await.unwrap();
        assert_eq!(state, DeviceState::new(pump(), DeviceStatus::Off));

        let reloads = transport.requests_to(RELOAD_PATH);
        assert_eq!(reloads.len(), 1);
        let from = RetentionWindow::default().retain_from(NOW).unix_timestamp();
        assert_eq!(reloads[0].field("last"), Some(from.to_string().as_str()));
        let toggles = transport.requests_to(TOGGLE_PATH);
        assert_eq!(toggles[0].field("state"), Some("On"));
    }

    #[tokio::test]
    async fn test_flip_of_off_device_turns_it_on() {
        let (engine, transport) = engine();
        reload_reporting(&transport, "Off");
        transport.respond_with(TOGGLE_PATH, flip_toggle);

        let state = set_device_state(&engine, &pump(), None).await.unwrap();
        assert_eq!(state.state, DeviceStatus::On);
    }

    #[tokio::test]
    async fn test_flip_of_unreported_device_fails() {
        let (engine, transport) = engine();
        reload_reporting(&transport, "On");

        let lamp = DeviceId::new("lamp").unwrap();
        let err = set_device_state(&engine, &lamp, None).await.unwrap_err();
        assert!(err.to_string().contains("lamp"));
        assert!(err.to_string().contains("--state"));
        assert_eq!(transport.request_count(TOGGLE_PATH), 0);
    }

    #[tokio::test]
    async fn test_explicit_state_skips_reload() {
        let (engine, transport) = engine();
        transport.respond_with(TOGGLE_PATH, flip_toggle);

        let state = set_device_state(&engine, &pump(), Some(DeviceStatus::On))
            .await
            .unwrap();
        assert_eq!(state.state, DeviceStatus::On);
        assert_eq!(transport.request_count(RELOAD_PATH), 0);
    }

    #[tokio::test]
    async fn test_expired_session_stops_before_toggle() {
        let (engine, transport) = engine();
        transport.respond(RELOAD_PATH, RawResponse::empty(401));

        let err = set_device_state(&engine, &pump(), None).await.unwrap_err();
        assert!(err.to_string().contains("Session expired"));
        assert_eq!(transport.request_count(TOGGLE_PATH), 0);
    }

    #[tokio::test]
    async fn test_lost_toggle_is_an_error() {
        let (engine, transport) = engine();
        transport.fail(TOGGLE_PATH, "connection reset");

        let err = set_device_state(&engine, &pump(), Some(DeviceStatus::Off))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No confirmation"));
    }
}
