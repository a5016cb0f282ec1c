//! Framework runner (C9): the thin composition root tying the offer
//! processor and the reconciler to the three callbacks a cluster-manager
//! client library actually invokes.

use std::sync::Arc;

use crate::client::MesosEventClient;
use crate::model::{Offer, TaskStatus};
use crate::offers::OfferProcessor;
use crate::reconciler::Reconciler;

pub struct FrameworkRunner {
    processor: Arc<OfferProcessor>,
    reconciler: Arc<Reconciler>,
    client: Arc<dyn MesosEventClient>,
}

impl FrameworkRunner {
    pub fn new(processor: Arc<OfferProcessor>, reconciler: Arc<Reconciler>, client: Arc<dyn MesosEventClient>) -> Self {
        Self {
            processor,
            reconciler,
            client,
        }
    }

    pub fn start(&self) {
        self.processor.start();
        self.reconciler.start();
        self.processor.mark_initialized();
    }

    /// Entry point for a batch of resource offers from the cluster manager.
    #[tracing::instrument(skip(self, offers))]
    pub fn on_offers(&self, offers: Vec<Offer>) {
        if let Err(err) = self.processor.enqueue(offers) {
            tracing::error!(error = %err, "failed to enqueue offer batch");
        }
    }

    /// Entry point for a single task status update.
    #[tracing::instrument(skip(self, status), fields(task_id = %status.task_id))]
    pub fn on_status(&self, status: TaskStatus) {
        self.reconciler.update(status.clone());
        self.client.status(&status);
    }

    /// Entry point for the periodic reconciliation tick (driven by
    /// whatever scheduling loop the embedder runs).
    #[tracing::instrument(skip(self))]
    pub fn on_reconcile_tick(&self) {
        if let Err(err) = self.reconciler.reconcile_tick() {
            tracing::warn!(error = %err, "reconcile tick failed");
        }
    }
}
