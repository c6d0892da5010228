use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps the number of requests in flight across one run.
#[derive(Clone)]
pub struct ConcurrencyLimits {
    global: Arc<Semaphore>,
}

impl ConcurrencyLimits {
    pub fn new(global_limit: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(global_limit.max(1))),
        }
    }

    /// `None` once the limiter has been closed.
    pub async fn acquire(&self) -> Option<ConcurrencyPermit> {
        let global = self.global.clone().acquire_owned().await.ok()?;
        Some(ConcurrencyPermit { _global: global })
    }

    pub fn available(&self) -> usize {
        self.global.available_permits()
    }

    pub fn close(&self) {
        self.global.close();
    }
}

pub struct ConcurrencyPermit {
    _global: OwnedSemaphorePermit,
}
