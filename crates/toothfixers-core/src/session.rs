//! Per-user session shared by all screens.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::ClinicApi;
use crate::inflight::{InFlight, Operation, Ticket};
use crate::store::ClinicStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

/// A transient notification raised by a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Gateway, entity store, in-flight tracker and toast queue.
///
/// Cloning is cheap; all clones share the same state.
#[derive(Clone)]
pub struct Session {
    api: Arc<dyn ClinicApi>,
    store: Arc<Mutex<ClinicStore>>,
    inflight: Arc<InFlight>,
    toasts: Arc<Mutex<VecDeque<Toast>>>,
}

impl Session {
    pub fn new(api: Arc<dyn ClinicApi>) -> Self {
        Self {
            api,
            store: Arc::new(Mutex::new(ClinicStore::new())),
            inflight: Arc::new(InFlight::new()),
            toasts: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn api(&self) -> &dyn ClinicApi {
        self.api.as_ref()
    }

    /// Lock the entity store. Never hold the guard across a request.
    pub fn store(&self) -> MutexGuard<'_, ClinicStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self, operation: Operation) -> Ticket {
        self.inflight.begin(operation)
    }

    /// Release a ticket. False when a newer request for the same operation
    /// has started; the caller must drop its response.
    pub fn finish(&self, ticket: Ticket) -> bool {
        self.inflight.finish(ticket)
    }

    pub fn inflight(&self) -> &InFlight {
        &self.inflight
    }

    pub fn toast_success(&self, message: impl Into<String>) {
        self.push_toast(ToastLevel::Success, message.into());
    }

    pub fn toast_error(&self, message: impl Into<String>) {
        self.push_toast(ToastLevel::Error, message.into());
    }

    fn push_toast(&self, level: ToastLevel, message: String) {
        tracing::info!(?level, message = %message, "Toast");
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Toast { level, message });
    }

    /// Take every pending toast, oldest first.
    pub fn drain_toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockClinicApi;

    #[test]
    fn test_toasts_drain_in_order() {
        let session = Session::new(Arc::new(MockClinicApi::new()));
        session.toast_success("saved");
        session.toast_error("failed");

        let toasts = session.drain_toasts();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].level, ToastLevel::Success);
        assert_eq!(toasts[1].message, "failed");
        assert!(session.drain_toasts().is_empty());
    }

    #[test]
    fn test_clones_share_store() {
        let session = Session::new(Arc::new(MockClinicApi::new()));
        let other = session.clone();
        session.store().patients.invalidate();
        assert!(other.store().patients.revision() > 0);
    }
}
