//! Seam for whatever persists the reconciler's durable state. Persistence
//! is out of scope beyond a trait and an in-memory double; a real
//! embedder backs this with etcd/zookeeper/a database, keeping storage
//! behind a trait object rather than baking a specific backend into
//! business logic.

use crate::model::TaskStatus;

pub trait StateStore: Send + Sync {
    /// Returns every task status this store currently believes is current,
    /// used to seed an explicit reconciliation pass.
    fn fetch_statuses(&self) -> Vec<TaskStatus>;
}

/// In-memory double, adequate for tests and for a single-process demo.
#[derive(Default)]
pub struct InMemoryStateStore {
    statuses: parking_lot::Mutex<Vec<TaskStatus>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, status: TaskStatus) {
        let mut statuses = self.statuses.lock();
        statuses.retain(|s| s.task_id != status.task_id);
        statuses.push(status);
    }
}

impl StateStore for InMemoryStateStore {
    fn fetch_statuses(&self) -> Vec<TaskStatus> {
        self.statuses.lock().clone()
    }
}
