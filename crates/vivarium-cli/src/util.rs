//! Utility functions for CLI operations.

use std::io::{self, Stdout};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use vivarium_core::{HttpTransport, RetentionWindow, SyncContext, SyncEngine};

use crate::config::Backend;
use crate::terminal::{TerminalDashboard, TerminalNavigator};

/// The engine every networked command drives.
pub type TerminalEngine = SyncEngine<TerminalDashboard<Stdout>, HttpTransport>;

/// A connected engine plus the token cancelled when the session expires.
pub struct Session {
    pub engine: TerminalEngine,
    pub shutdown: CancellationToken,
}

/// Build the HTTP transport for `backend`.
pub fn transport(backend: &Backend) -> Result<HttpTransport> {
    let mut builder = HttpTransport::builder(&backend.url).timeout(backend.timeout);
    if let Some(cookie) = &backend.session_cookie {
        builder = builder.session_cookie(cookie.clone());
    }
    builder
        .build()
        .with_context(|| format!("Failed to set up backend {}", backend.url))
}

/// Connect a terminal dashboard to `backend`.
///
/// With `echo` off the dashboard stays silent and the caller prints results.
pub fn connect(
    backend: &Backend,
    retention: RetentionWindow,
    no_color: bool,
    echo: bool,
) -> Result<Session> {
    let transport = transport(backend)?;

    let mut dashboard = TerminalDashboard::new(io::stdout(), no_color);
    dashboard.set_echo(echo);

    let shutdown = CancellationToken::new();
    let navigator = Arc::new(TerminalNavigator::new(shutdown.clone()));
    let context = SyncContext::new(dashboard, retention).with_backend_offset(backend.utc_offset);
    let engine = SyncEngine::new(context, Arc::new(transport), navigator);

    Ok(Session { engine, shutdown })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use time::macros::offset;

    fn backend(url: &str, cookie: Option<&str>) -> Backend {
        Backend {
            url: url.to_string(),
            session_cookie: cookie.map(String::from),
            timeout: Duration::from_secs(2),
            utc_offset: offset!(+1),
        }
    }

    #[test]
    fn test_transport_normalizes_url() {
        let transport = transport(&backend("http://localhost:5000/", Some("session=abc"))).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_transport_rejects_bad_url() {
        let err = transport(&backend("localhost:5000", None)).unwrap_err();
        assert!(err.to_string().contains("localhost:5000"));
    }

    #[tokio::test]
    async fn test_connect_starts_with_empty_dashboard() {
        let session = connect(
            &backend("http://localhost:5000", None),
            RetentionWindow::default(),
            true,
            false,
        )
        .unwrap();
        assert!(!session.engine.is_session_expired());
        assert!(!session.shutdown.is_cancelled());
        let (rows, backend_offset) = session
            .engine
            .inspect(|ctx| (ctx.view().state().rows().count(), ctx.backend_offset()))
            .await;
        assert_eq!(rows, 0);
        assert_eq!(backend_offset, offset!(+1));
    }
}
