//! Listener capability for snapshot batches.

use std::sync::Arc;

use crate::stats::EntitySnapshot;

/// Receives every successful poll's snapshot batch.
#[async_trait::async_trait]
pub trait MetricsListener: Send + Sync + 'static {
    /// Handle one batch. Called once per successful poll, in registration
    /// order, on the polling task.
    async fn on_snapshot_batch(&self, batch: &[EntitySnapshot]);
}

/// Registry of [`MetricsListener`]s.
#[async_trait::async_trait]
pub trait MetricsNotifier: Send + Sync {
    /// Add a listener. Registering the same listener twice is a no-op.
    fn register_listener(&self, listener: Arc<dyn MetricsListener>);

    /// Remove a listener. Unknown listeners are ignored.
    fn deregister_listener(&self, listener: &Arc<dyn MetricsListener>);

    /// Deliver `batch` to every registered listener.
    async fn notify_listeners(&self, batch: &[EntitySnapshot]);
}

/// Identity comparison on the data pointer only.
pub(crate) fn same_listener(a: &Arc<dyn MetricsListener>, b: &Arc<dyn MetricsListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
