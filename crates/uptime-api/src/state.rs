use std::sync::Arc;

use uptime_core::{Checker, Notifier, Scheduler, TargetStore};

/// Shared handles for the request handlers. The scheduler is owned by the
/// composition root; the API only reads its state.
#[derive(Clone)]
pub struct AppState {
    pub checker: Checker,
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(checker: Checker, scheduler: Arc<Scheduler>) -> Self {
        Self { checker, scheduler }
    }

    pub fn store(&self) -> &Arc<dyn TargetStore> {
        self.checker.store()
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        self.checker.notifier()
    }
}
