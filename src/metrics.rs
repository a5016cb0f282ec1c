//! Metrics (C11): counters, gauges and histograms for the offer pipeline
//! and the reconciler, recorded through the `metrics` facade the way the
//! teacher's `common::metrics` module records HTTP request metrics — this
//! crate never installs a recorder itself, so any embedder can plug in
//! `metrics-exporter-prometheus` (or anything else) without the core
//! depending on it directly.

use std::time::Duration;

use metrics::{counter, gauge, histogram};

pub fn offers_enqueued(count: u64) {
    counter!("scheduler_offers_enqueued_total").increment(count);
}

pub fn offers_processed(count: u64) {
    counter!("scheduler_offers_processed_total").increment(count);
}

pub fn offer_queue_depth(depth: usize) {
    gauge!("scheduler_offer_queue_depth").set(depth as f64);
}

pub fn decline_short(count: u64) {
    counter!("scheduler_declines_total", "interval" => "short").increment(count);
}

pub fn decline_long(count: u64) {
    counter!("scheduler_declines_total", "interval" => "long").increment(count);
}

pub fn recommendation_applied(kind: &'static str, count: u64) {
    counter!("scheduler_recommendations_total", "kind" => kind).increment(count);
}

pub fn offer_batch_duration(duration: Duration) {
    histogram!("scheduler_offer_batch_duration_seconds").record(duration.as_secs_f64());
}

pub fn reconciler_unreconciled(len: usize) {
    gauge!("scheduler_reconciler_unreconciled").set(len as f64);
}

pub fn reconcile_call(phase: &'static str) {
    counter!("scheduler_reconcile_calls_total", "phase" => phase).increment(1);
}
