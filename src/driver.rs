//! The cluster-manager driver handle (C1).
//!
//! The original design exposes this as process-wide singleton state so
//! every subsystem can reach it without being handed a reference. We keep
//! the "set once at registration, read-only after" lifecycle but drop the
//! singleton: `DriverHandle` is a small `Arc<OnceLock<D>>`-backed context
//! value that the scheduler runtime constructs once and shares explicitly
//! with the offer processor and the reconciler, the way
//! `eosin_storage_operator::ContextData` is shared via `Arc` with the
//! reconcile callback rather than read from a global.

use std::sync::{Arc, OnceLock};

use crate::error::{Result, SchedulerError};
use crate::model::{DeclineFilters, OfferId, OfferRecommendation, TaskStatus};

/// Operations the core calls against the cluster-manager driver. A real
/// implementation talks to the cluster manager over the network; the core
/// only depends on this trait.
pub trait ClusterDriver: Send + Sync {
    fn decline_offer(&self, offer_id: &OfferId, filters: DeclineFilters) -> Result<()>;

    fn accept_offers(
        &self,
        offer_ids: &[OfferId],
        operations: &[OfferRecommendation],
        filters: DeclineFilters,
    ) -> Result<()>;

    fn reconcile_tasks(&self, statuses: &[TaskStatus]) -> Result<()>;
}

/// Read-only-after-registration handle to the driver. Absence when a call
/// requires it is a fatal programming error, never a recoverable one.
#[derive(Clone)]
pub struct DriverHandle {
    inner: Arc<OnceLock<Arc<dyn ClusterDriver>>>,
}

impl Default for DriverHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(OnceLock::new()),
        }
    }

    /// Registers the driver. Called exactly once, at cluster-manager
    /// registration time. Subsequent calls are no-ops: the lifecycle is
    /// "set once, never reset".
    pub fn register(&self, driver: Arc<dyn ClusterDriver>) {
        let _ = self.inner.set(driver);
    }

    pub fn is_registered(&self) -> bool {
        self.inner.get().is_some()
    }

    fn get(&self) -> Result<&Arc<dyn ClusterDriver>> {
        self.inner.get().ok_or(SchedulerError::DriverNotRegistered)
    }

    pub fn decline_offer(&self, offer_id: &OfferId, filters: DeclineFilters) -> Result<()> {
        self.get()?.decline_offer(offer_id, filters)
    }

    pub fn accept_offers(
        &self,
        offer_ids: &[OfferId],
        operations: &[OfferRecommendation],
        filters: DeclineFilters,
    ) -> Result<()> {
        self.get()?.accept_offers(offer_ids, operations, filters)
    }

    pub fn reconcile_tasks(&self, statuses: &[TaskStatus]) -> Result<()> {
        self.get()?.reconcile_tasks(statuses)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct RecordingDriver {
        pub declines: Mutex<Vec<(OfferId, f64)>>,
        pub accepts: Mutex<Vec<(Vec<OfferId>, Vec<OfferRecommendation>)>>,
        pub reconciles: Mutex<Vec<Vec<TaskStatus>>>,
    }

    impl ClusterDriver for RecordingDriver {
        fn decline_offer(&self, offer_id: &OfferId, filters: DeclineFilters) -> Result<()> {
            self.declines
                .lock()
                .push((offer_id.clone(), filters.refuse_seconds));
            Ok(())
        }

        fn accept_offers(
            &self,
            offer_ids: &[OfferId],
            operations: &[OfferRecommendation],
            _filters: DeclineFilters,
        ) -> Result<()> {
            self.accepts
                .lock()
                .push((offer_ids.to_vec(), operations.to_vec()));
            Ok(())
        }

        fn reconcile_tasks(&self, statuses: &[TaskStatus]) -> Result<()> {
            self.reconciles.lock().push(statuses.to_vec());
            Ok(())
        }
    }
}
