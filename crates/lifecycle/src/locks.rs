use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::OrderId;
use tokio::sync::OwnedMutexGuard;

/// Per-order mutual exclusion.
///
/// Status transitions for one order must be linearized; holding the
/// order's lock across load, side effects, and the conditional save
/// guarantees no two transitions interleave in this process. The
/// repository's version check remains the backstop against writers in
/// other processes.
#[derive(Clone, Default)]
pub struct OrderLocks {
    inner: Arc<Mutex<HashMap<OrderId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl OrderLocks {
    /// Creates a new empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one order, waiting if a transition on the
    /// same order is in flight.
    pub async fn acquire(&self, id: OrderId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap();
            map.entry(id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
