//! Cluster resource scheduler core: an offer-processing pipeline, two-phase
//! task-status reconciliation, and a Plan/Phase/Step work hierarchy, built
//! against a `ClusterDriver`/`MesosEventClient` seam so the cluster-manager
//! wire protocol and the placement algorithm both stay pluggable.

pub mod artifact;
pub mod client;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod metrics;
pub mod model;
pub mod offers;
pub mod plan;
pub mod reconciler;
pub mod runner;
pub mod state_store;
pub mod status;

pub use config::Config;
pub use error::{Result, SchedulerError};
pub use runner::FrameworkRunner;
