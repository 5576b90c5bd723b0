//! The sync engine handle.
//!
//! [`SyncEngine`] ties a [`SyncContext`] to a [`Transport`] and a
//! [`SessionGuard`]. It is cheap to clone; every clone drives the same
//! context. The operations live next to the rules they implement:
//! polling in [`crate::scheduler`], toggles in [`crate::toggle`] and
//! settings in [`crate::settings`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::context::SyncContext;
use crate::session::{Navigator, SessionGuard};
use crate::transport::Transport;
use crate::view::DashboardView;
use crate::watermark::SyncWatermark;

/// Shared handle to the dashboard's sync state.
pub struct SyncEngine<V, T> {
    pub(crate) context: Arc<Mutex<SyncContext<V>>>,
    pub(crate) transport: Arc<T>,
    pub(crate) guard: Arc<SessionGuard>,
}

impl<V, T> Clone for SyncEngine<V, T> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            transport: Arc::clone(&self.transport),
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<V, T> fmt::Debug for SyncEngine<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl<V, T> SyncEngine<V, T>
where
    V: DashboardView + 'static,
    T: Transport + 'static,
{
    /// Create an engine over `context`, redirecting through `navigator` when
    /// the session expires.
    pub fn new(context: SyncContext<V>, transport: Arc<T>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            context: Arc::new(Mutex::new(context)),
            transport,
            guard: Arc::new(SessionGuard::new(navigator)),
        }
    }

    /// The shared context.
    pub fn context(&self) -> &Arc<Mutex<SyncContext<V>>> {
        &self.context
    }

    /// The transport requests go through.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Whether the session has expired.
    pub fn is_session_expired(&self) -> bool {
        self.guard.is_expired()
    }

    /// Current watermark.
    pub async fn watermark(&self) -> SyncWatermark {
        self.context.lock().await.watermark()
    }

    /// Run `f` against the context while holding the lock.
    pub async fn inspect<R>(&self, f: impl FnOnce(&SyncContext<V>) -> R) -> R {
        let context = self.context.lock().await;
        f(&context)
    }
}
