//! The client contract (C8) the offer processor calls into. The core treats
//! the client as an opaque evaluator — placement algorithms are entirely
//! out of scope here; this trait is the seam.

use crate::model::{Offer, OfferResponse, TaskStatus, UnexpectedResourcesResponse};

/// Adapter the offer processor calls once per drained batch, and the
/// reconciler/plan hierarchy calls on every task status update.
pub trait MesosEventClient: Send + Sync {
    /// Evaluates a batch of offers, returning which are unused and which
    /// operations to apply against the rest. A `NotReady` result means the
    /// client could not look at the offers at all (not yet initialized,
    /// leadership lost); the processor then declines everything short.
    fn offers(&self, batch: &[Offer]) -> OfferResponse;

    /// Given the offers the client didn't use, returns the subset of
    /// reserved resources on them that the client doesn't recognize as its
    /// own — candidates for the cleanup planner.
    fn get_unexpected_resources(&self, unused_offers: &[Offer]) -> UnexpectedResourcesResponse;

    /// Callback for task status updates. Implementations typically forward
    /// this to the reconciler (`Reconciler::update`) and to the owning
    /// plan step.
    fn status(&self, status: &TaskStatus);
}
