//! Minimal demo binary: wires an in-memory driver and client into a
//! `FrameworkRunner`, offers it a handful of fake resources, and prints
//! the resulting plan summary. Not a production entry point.

use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Result;
use clap::Parser;
use parking_lot::Mutex;

use eosin_scheduler::client::MesosEventClient;
use eosin_scheduler::clock::SystemClock;
use eosin_scheduler::config::Config;
use eosin_scheduler::driver::{ClusterDriver, DriverHandle};
use eosin_scheduler::model::*;
use eosin_scheduler::offers::OfferProcessor;
use eosin_scheduler::reconciler::Reconciler;
use eosin_scheduler::runner::FrameworkRunner;
use eosin_scheduler::state_store::InMemoryStateStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of fake offers to simulate on startup.
    #[arg(long, env = "DEMO_OFFER_COUNT", default_value_t = 3)]
    offer_count: u32,

    /// Enable the Prometheus metrics endpoint on this port.
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,
}

struct LoggingDriver;

impl ClusterDriver for LoggingDriver {
    fn decline_offer(&self, offer_id: &OfferId, filters: DeclineFilters) -> eosin_scheduler::Result<()> {
        tracing::info!(offer_id = %offer_id, refuse_seconds = filters.refuse_seconds, "decline");
        Ok(())
    }

    fn accept_offers(
        &self,
        offer_ids: &[OfferId],
        operations: &[OfferRecommendation],
        _filters: DeclineFilters,
    ) -> eosin_scheduler::Result<()> {
        tracing::info!(?offer_ids, op_count = operations.len(), "accept");
        Ok(())
    }

    fn reconcile_tasks(&self, statuses: &[TaskStatus]) -> eosin_scheduler::Result<()> {
        tracing::info!(count = statuses.len(), "reconcile");
        Ok(())
    }
}

struct EchoClient {
    launched: Mutex<Vec<TaskId>>,
}

impl MesosEventClient for EchoClient {
    fn offers(&self, batch: &[Offer]) -> OfferResponse {
        let recommendations = batch
            .iter()
            .enumerate()
            .map(|(i, offer)| {
                let task_id = format!("task-{i}");
                self.launched.lock().push(task_id.clone());
                OfferRecommendation::Launch {
                    offer_id: offer.id.clone(),
                    task: TaskSpec {
                        task_id,
                        name: format!("demo-{i}"),
                    },
                }
            })
            .collect();
        OfferResponse {
            result: ClientResult::Processed,
            unused_offers: vec![],
            recommendations,
        }
    }

    fn get_unexpected_resources(&self, unused_offers: &[Offer]) -> UnexpectedResourcesResponse {
        UnexpectedResourcesResponse {
            result: ClientResult::Processed,
            offer_resources: unused_offers
                .iter()
                .map(|o| OfferResources {
                    offer: o.clone(),
                    unexpected: vec![],
                })
                .collect(),
        }
    }

    fn status(&self, status: &TaskStatus) {
        tracing::info!(task_id = %status.task_id, state = ?status.state, "status");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if let Some(port) = args.metrics_port {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .install_recorder()
            .expect("install global metrics recorder");
        tracing::info!(port, "metrics recorder installed (serve `handle.render()` yourself)");
        let _ = handle;
    }

    let mut config = Config::default();
    config.single_threaded = true;
    config.test_mode = true;

    let driver_handle = DriverHandle::new();
    driver_handle.register(Arc::new(LoggingDriver));
    let client: Arc<dyn MesosEventClient> = Arc::new(EchoClient {
        launched: Mutex::new(Vec::new()),
    });

    let processor = OfferProcessor::new(config.clone(), driver_handle.clone(), client.clone());
    let reconciler = Arc::new(Reconciler::new(
        config,
        driver_handle,
        Arc::new(SystemClock),
        Arc::new(InMemoryStateStore::new()),
    ));
    let runner = FrameworkRunner::new(processor, reconciler, client);
    runner.start();

    let offers: Vec<Offer> = (0..args.offer_count)
        .map(|i| Offer::new(format!("offer-{i}"), format!("agent-{i}"), vec![Resource::cpus(1.0)]))
        .collect();
    runner.on_offers(offers);

    runner.on_status(TaskStatus {
        task_id: "task-0".to_string(),
        state: TaskState::Running,
        agent_id: Some("agent-0".to_string()),
        timestamp: SystemTime::now(),
        message: None,
    });

    runner.on_reconcile_tick();

    Ok(())
}
