//! Offer processor (C4): owns the queue, runs the consumer loop, invokes
//! the client, declines unused offers, executes recommendations.

use std::collections::{BTreeSet, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::Mutex;

use crate::client::MesosEventClient;
use crate::config::Config;
use crate::driver::DriverHandle;
use crate::error::{Result, SchedulerError, fatal};
use crate::metrics;
use crate::model::{ClientResult, DeclineFilters, Offer, OfferId, OfferRecommendation, OfferResources, UnexpectedResourcesResponse};
use crate::offers::cleanup::plan_cleanup;
use crate::offers::queue::OfferQueue;

pub struct OfferProcessor {
    config: Config,
    queue: OfferQueue,
    driver: DriverHandle,
    client: Arc<dyn MesosEventClient>,
    offers_in_progress: Mutex<HashSet<OfferId>>,
    initialized: AtomicBool,
    started: AtomicBool,
    stopping: AtomicBool,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl OfferProcessor {
    pub fn new(config: Config, driver: DriverHandle, client: Arc<dyn MesosEventClient>) -> Arc<Self> {
        let queue = OfferQueue::new(config.offer_queue_capacity);
        Arc::new(Self {
            config,
            queue,
            driver,
            client,
            offers_in_progress: Mutex::new(HashSet::new()),
            initialized: AtomicBool::new(false),
            started: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            consumer: Mutex::new(None),
        })
    }

    /// Marks the scheduler as having finished registration. Before this,
    /// an empty drained batch is treated as a no-op rather than a signal
    /// to start evaluating.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    /// Idempotent. In multithreaded mode spawns the single consumer
    /// thread; in single-threaded mode there is no background thread and
    /// `enqueue` drives evaluation synchronously instead.
    pub fn start(self: &Arc<Self>) {
        if self.config.single_threaded {
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = Arc::clone(self);
        let handle = std::thread::Builder::new()
            .name("offer-consumer".to_string())
            .spawn(move || this.consumer_loop())
            .expect("spawn offer consumer thread");
        *self.consumer.lock() = Some(handle);
    }

    /// Requests the consumer loop to exit and waits for it to stop. Used
    /// by tests and graceful-shutdown wiring; the design itself has no
    /// concept of tearing the scheduler down.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.queue.shutdown();
        if let Some(handle) = self.consumer.lock().take() {
            let _ = handle.join();
        }
    }

    fn consumer_loop(self: Arc<Self>) {
        loop {
            let batch = self.queue.take_all();
            if batch.is_empty() {
                if self.stopping.load(Ordering::SeqCst) {
                    return;
                }
                if !self.initialized.load(Ordering::SeqCst) {
                    continue;
                }
                // Shutdown-unrelated spurious wake: nothing to do.
                continue;
            }
            if let Err(err) = self.evaluate_batch(&batch) {
                if err.is_fatal() {
                    match fatal::<()>(err, self.config.test_mode) {
                        Ok(()) => {}
                        Err(_) => return,
                    }
                }
            }
        }
    }

    /// Atomically adds each offer id to `offers_in_progress`, then tries to
    /// enqueue each offer. On rejection (queue full), declines that single
    /// offer short *first*, then removes its id — decline strictly
    /// precedes removal, per the in-progress invariant.
    pub fn enqueue(self: &Arc<Self>, offers: Vec<Offer>) -> Result<()> {
        {
            let mut in_progress = self.offers_in_progress.lock();
            for offer in &offers {
                in_progress.insert(offer.id.clone());
            }
        }
        metrics::offers_enqueued(offers.len() as u64);

        for offer in offers {
            if self.queue.offer(offer.clone()) {
                continue;
            }
            tracing::warn!(offer_id = %offer.id, "offer queue overflow, declining");
            let decline_result = self.driver.decline_offer(
                &offer.id,
                DeclineFilters {
                    refuse_seconds: self.config.short_refuse_seconds,
                },
            );
            metrics::decline_short(1);
            self.offers_in_progress.lock().remove(&offer.id);
            decline_result?;
        }
        metrics::offer_queue_depth(self.queue.len());

        if self.config.single_threaded {
            self.drain_once();
        }
        Ok(())
    }

    /// Single-threaded-mode helper: drains and evaluates whatever is
    /// currently buffered, once, synchronously. Never blocks in practice
    /// since the caller just enqueued at least one offer.
    fn drain_once(self: &Arc<Self>) {
        let batch = self.queue.take_all();
        if batch.is_empty() {
            return;
        }
        if let Err(err) = self.evaluate_batch(&batch) {
            if err.is_fatal() {
                let _ = fatal::<()>(err, self.config.test_mode);
            }
        }
    }

    /// Best-effort removal from the queue, used when the cluster manager
    /// rescinds an offer before it's drained.
    pub fn dequeue(&self, id: &OfferId) -> bool {
        self.queue.remove(id)
    }

    /// Polls `offers_in_progress` every `config.await_poll` until empty or
    /// `config.await_timeout` elapses, whichever comes first. Testing aid.
    pub fn await_offers_processed(&self) -> Result<()> {
        let deadline = Instant::now() + self.config.await_timeout;
        loop {
            if self.offers_in_progress.lock().is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return fatal(SchedulerError::AwaitTimeout, self.config.test_mode);
            }
            std::thread::sleep(self.config.await_poll);
        }
    }

    pub fn offers_in_progress_len(&self) -> usize {
        self.offers_in_progress.lock().len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    fn evaluate_batch(&self, batch: &[Offer]) -> Result<()> {
        let start = Instant::now();
        let batch_ids: Vec<OfferId> = batch.iter().map(|o| o.id.clone()).collect();
        let span = tracing::info_span!("offer_batch", batch_len = batch.len());
        let _enter = span.enter();

        // The in-progress set must be cleared no matter how evaluation
        // turns out, otherwise `await_offers_processed` deadlocks. Rust has
        // no try/finally, so the cleanup runs via this guard's Drop rather
        // than being duplicated on every early return.
        struct ClearInProgress<'a> {
            processor: &'a OfferProcessor,
            ids: &'a [OfferId],
        }
        impl Drop for ClearInProgress<'_> {
            fn drop(&mut self) {
                let mut in_progress = self.processor.offers_in_progress.lock();
                for id in self.ids {
                    in_progress.remove(id);
                }
            }
        }
        let _guard = ClearInProgress {
            processor: self,
            ids: &batch_ids,
        };

        let result = self.evaluate_inner(batch);
        metrics::offers_processed(batch.len() as u64);
        metrics::offer_batch_duration(start.elapsed());
        result
    }

    fn evaluate_inner(&self, batch: &[Offer]) -> Result<()> {
        let offer_response = self.call_offers(batch)?;
        let unexpected_response = self.call_unexpected_resources(&offer_response.unused_offers)?;
        let cleanup_recs = plan_cleanup(&unexpected_response.offer_resources);

        let referenced: BTreeSet<&OfferId> = cleanup_recs.iter().map(|r| r.offer_id()).collect();
        let final_unused: Vec<&Offer> = offer_response
            .unused_offers
            .iter()
            .filter(|o| !referenced.contains(&o.id))
            .collect();

        if !final_unused.is_empty() {
            let both_processed = offer_response.result == ClientResult::Processed
                && unexpected_response.result == ClientResult::Processed;
            let refuse_seconds = if both_processed {
                self.config.long_refuse_seconds
            } else {
                self.config.short_refuse_seconds
            };
            for offer in &final_unused {
                self.driver.decline_offer(&offer.id, DeclineFilters { refuse_seconds })?;
            }
            if both_processed {
                metrics::decline_long(final_unused.len() as u64);
            } else {
                metrics::decline_short(final_unused.len() as u64);
            }
        }

        let mut all_recs = offer_response.recommendations.clone();
        all_recs.extend(cleanup_recs);
        if !all_recs.is_empty() {
            let mut offer_ids = Vec::new();
            for rec in &all_recs {
                if !offer_ids.contains(rec.offer_id()) {
                    offer_ids.push(rec.offer_id().clone());
                }
            }
            self.driver.accept_offers(
                &offer_ids,
                &all_recs,
                DeclineFilters { refuse_seconds: 0.0 },
            )?;
            for rec in &all_recs {
                metrics::recommendation_applied(recommendation_kind(rec), 1);
            }
        }

        Ok(())
    }

    fn call_offers(&self, batch: &[Offer]) -> Result<crate::model::OfferResponse> {
        let client = Arc::clone(&self.client);
        let batch = batch.to_vec();
        catch_unwind(AssertUnwindSafe(|| client.offers(&batch)))
            .map_err(|_| SchedulerError::ClientEvaluation("client.offers panicked".to_string()))
    }

    fn call_unexpected_resources(&self, unused: &[Offer]) -> Result<UnexpectedResourcesResponse> {
        let client = Arc::clone(&self.client);
        let unused = unused.to_vec();
        catch_unwind(AssertUnwindSafe(|| client.get_unexpected_resources(&unused))).map_err(|_| {
            SchedulerError::ClientEvaluation("client.get_unexpected_resources panicked".to_string())
        })
    }
}

fn recommendation_kind(rec: &OfferRecommendation) -> &'static str {
    match rec {
        OfferRecommendation::Launch { .. } => "launch",
        OfferRecommendation::Reserve { .. } => "reserve",
        OfferRecommendation::Create { .. } => "create",
        OfferRecommendation::Destroy { .. } => "destroy",
        OfferRecommendation::Unreserve { .. } => "unreserve",
        OfferRecommendation::Store { .. } => "store",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MesosEventClient;
    use crate::driver::test_support::RecordingDriver;
    use crate::model::*;
    use std::sync::Arc;

    struct StubClient {
        result: ClientResult,
        unused: Vec<Offer>,
        recommendations: Vec<OfferRecommendation>,
        unexpected: Vec<OfferResources>,
    }

    impl MesosEventClient for StubClient {
        fn offers(&self, _batch: &[Offer]) -> OfferResponse {
            OfferResponse {
                result: self.result,
                unused_offers: self.unused.clone(),
                recommendations: self.recommendations.clone(),
            }
        }

        fn get_unexpected_resources(&self, _unused_offers: &[Offer]) -> UnexpectedResourcesResponse {
            UnexpectedResourcesResponse {
                result: self.result,
                offer_resources: self.unexpected.clone(),
            }
        }

        fn status(&self, _status: &TaskStatus) {}
    }

    fn offer(id: &str) -> Offer {
        Offer::new(id, "agent-1", vec![])
    }

    fn test_config(capacity: usize) -> Config {
        let mut config = Config::default();
        config.offer_queue_capacity = capacity;
        config.single_threaded = true;
        config.test_mode = true;
        config.await_poll = std::time::Duration::from_millis(5);
        config.await_timeout = std::time::Duration::from_millis(500);
        config
    }

    fn registered_driver() -> (DriverHandle, Arc<RecordingDriver>) {
        let handle = DriverHandle::new();
        let driver = Arc::new(RecordingDriver::default());
        handle.register(driver.clone());
        (handle, driver)
    }

    /// Client launches into the only offer; no declines, one accept call
    /// carrying the launch.
    #[test]
    fn accepts_launch_recommendation_with_no_declines() {
        let (handle, driver) = registered_driver();
        let client = Arc::new(StubClient {
            result: ClientResult::Processed,
            unused: vec![],
            recommendations: vec![OfferRecommendation::Launch {
                offer_id: "a".to_string(),
                task: TaskSpec {
                    task_id: "t1".to_string(),
                    name: "task-x".to_string(),
                },
            }],
            unexpected: vec![],
        });
        let processor = OfferProcessor::new(test_config(0), handle, client);
        processor.mark_initialized();
        processor.enqueue(vec![offer("a")]).unwrap();
        assert_eq!(driver.accepts.lock().len(), 1);
        assert!(driver.declines.lock().is_empty());
        assert_eq!(processor.offers_in_progress_len(), 0);
    }

    /// NotReady on both calls forces short declines of all offers and no
    /// accept call.
    #[test]
    fn not_ready_result_declines_short() {
        let (handle, driver) = registered_driver();
        let client = Arc::new(StubClient {
            result: ClientResult::NotReady,
            unused: vec![offer("a"), offer("b")],
            recommendations: vec![],
            unexpected: vec![],
        });
        let processor = OfferProcessor::new(test_config(0), handle, client);
        processor.mark_initialized();
        processor.enqueue(vec![offer("a"), offer("b")]).unwrap();
        assert!(driver.accepts.lock().is_empty());
        let declines = driver.declines.lock();
        assert_eq!(declines.len(), 2);
        assert!(declines.iter().all(|(_, secs)| *secs == test_config(0).short_refuse_seconds));
    }

    /// A persistent volume plus its reservation produce
    /// Destroy/Unreserve/Unreserve in one accept call, no decline of the
    /// offer.
    #[test]
    fn cleanup_recommendations_ordered_and_accepted() {
        let (handle, driver) = registered_driver();
        let client = Arc::new(StubClient {
            result: ClientResult::Processed,
            unused: vec![offer("a")],
            recommendations: vec![],
            unexpected: vec![OfferResources {
                offer: offer("a"),
                unexpected: vec![
                    Resource::reserved_volume("vol-1", "res-1"),
                    Resource::reserved("res-2"),
                ],
            }],
        });
        let processor = OfferProcessor::new(test_config(0), handle, client);
        processor.mark_initialized();
        processor.enqueue(vec![offer("a")]).unwrap();
        assert!(driver.declines.lock().is_empty());
        let accepts = driver.accepts.lock();
        assert_eq!(accepts.len(), 1);
        let ops = &accepts[0].1;
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], OfferRecommendation::Destroy { .. }));
        assert!(matches!(ops[1], OfferRecommendation::Unreserve { .. }));
        assert!(matches!(ops[2], OfferRecommendation::Unreserve { .. }));
    }

    /// Capacity-1 queue, three offers enqueued at once: two are declined
    /// short and removed from in-progress immediately; exactly one is
    /// left queued.
    #[test]
    fn overflow_declines_before_removing_from_in_progress() {
        let (handle, driver) = registered_driver();
        let client = Arc::new(StubClient {
            result: ClientResult::Processed,
            unused: vec![],
            recommendations: vec![],
            unexpected: vec![],
        });
        let mut config = test_config(1);
        config.single_threaded = false; // drive queue mechanics, not evaluation
        let processor = OfferProcessor::new(config, handle, client);
        processor.mark_initialized();
        processor.enqueue(vec![offer("a"), offer("b"), offer("c")]).unwrap();
        assert_eq!(driver.declines.lock().len(), 2);
        assert_eq!(processor.queue_len(), 1);
        // The two declined offers must already be out of in-progress.
        assert_eq!(processor.offers_in_progress_len(), 1);
    }

    #[test]
    fn dequeue_removes_rescinded_offer() {
        let (handle, _driver) = registered_driver();
        let client = Arc::new(StubClient {
            result: ClientResult::Processed,
            unused: vec![],
            recommendations: vec![],
            unexpected: vec![],
        });
        let mut config = test_config(0);
        config.single_threaded = false;
        let processor = OfferProcessor::new(config, handle, client);
        processor.enqueue(vec![offer("a")]).unwrap();
        assert!(processor.dequeue(&"a".to_string()));
        assert_eq!(processor.queue_len(), 0);
    }
}
