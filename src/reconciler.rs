//! Task-status reconciler (C5): two-phase reconciliation against the
//! cluster manager, explicit first, falling back to implicit on a growing
//! backoff. Mirrors the offer processor's rule of never calling the
//! driver while holding a lock — state is snapshotted, the lock released,
//! then the driver is called.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::Clock;
use crate::config::Config;
use crate::driver::DriverHandle;
use crate::error::Result;
use crate::metrics;
use crate::model::{TaskId, TaskStatus};
use crate::state_store::StateStore;

struct ReconcilerState {
    unreconciled: HashMap<TaskId, TaskStatus>,
    /// Latches once an implicit (empty) reconcile has been sent for the
    /// current drain cycle, so an empty `unreconciled` map doesn't keep
    /// re-sending implicit reconciles forever. Cleared by `start()`.
    implicit_triggered: bool,
    next_attempt_at_ms: u64,
    backoff_ms: u64,
}

pub struct Reconciler {
    config: Config,
    driver: DriverHandle,
    clock: Arc<dyn Clock>,
    state_store: Arc<dyn StateStore>,
    state: Mutex<ReconcilerState>,
}

impl Reconciler {
    pub fn new(
        config: Config,
        driver: DriverHandle,
        clock: Arc<dyn Clock>,
        state_store: Arc<dyn StateStore>,
    ) -> Self {
        let base_backoff_ms = config.base_backoff.as_millis() as u64;
        Self {
            state: Mutex::new(ReconcilerState {
                unreconciled: HashMap::new(),
                implicit_triggered: false,
                next_attempt_at_ms: clock.now_ms(),
                backoff_ms: base_backoff_ms,
            }),
            config,
            driver,
            clock,
            state_store,
        }
    }

    /// Seeds `unreconciled` from every status the store currently holds for
    /// a non-terminal task, and arms the first explicit attempt for "now".
    pub fn start(&self) {
        let statuses = self.state_store.fetch_statuses();
        let mut state = self.state.lock();
        state.unreconciled.clear();
        for status in statuses {
            if !status.is_terminal() {
                state.unreconciled.insert(status.task_id.clone(), status);
            }
        }
        state.implicit_triggered = false;
        state.next_attempt_at_ms = self.clock.now_ms();
        state.backoff_ms = self.config.base_backoff.as_millis() as u64;
        metrics::reconciler_unreconciled(state.unreconciled.len());
    }

    /// A status arriving from the client counts as confirmation: the
    /// cluster manager has told us (again) what it believes about this
    /// task, which is exactly what explicit/implicit reconciliation was
    /// waiting for.
    pub fn update(&self, status: TaskStatus) {
        let mut state = self.state.lock();
        state.unreconciled.remove(&status.task_id);
        metrics::reconciler_unreconciled(state.unreconciled.len());
    }

    pub fn is_reconciled(&self) -> bool {
        self.state.lock().unreconciled.is_empty()
    }

    pub fn unreconciled_len(&self) -> usize {
        self.state.lock().unreconciled.len()
    }

    /// One tick of the reconciliation loop. No-op if the current backoff
    /// window hasn't elapsed yet. Otherwise the phase is picked by whether
    /// `unreconciled` is empty, not by alternating: while it's non-empty,
    /// every expired tick resends the current snapshot explicitly; once it
    /// drains to empty, exactly one implicit (empty) reconcile is sent and
    /// latched, so a settled reconciler stops calling the driver until the
    /// next `start()`. Snapshots the statuses to send and advances the
    /// backoff under the lock, releases it, then makes at most one driver
    /// call.
    pub fn reconcile_tick(&self) -> Result<()> {
        let now = self.clock.now_ms();
        let decision = {
            let mut state = self.state.lock();
            if now < state.next_attempt_at_ms {
                return Ok(());
            }

            let call = if !state.unreconciled.is_empty() {
                state.implicit_triggered = false;
                Some((
                    "explicit",
                    state.unreconciled.values().cloned().collect::<Vec<_>>(),
                ))
            } else if !state.implicit_triggered {
                state.implicit_triggered = true;
                Some(("implicit", Vec::new()))
            } else {
                None
            };

            let Some((label, statuses)) = call else {
                return Ok(());
            };

            let next_backoff_ms = (state.backoff_ms * self.config.backoff_multiplier)
                .min(self.config.max_backoff.as_millis() as u64);
            state.backoff_ms = next_backoff_ms;
            state.next_attempt_at_ms = now + next_backoff_ms;

            (label, statuses)
        };

        let (label, statuses) = decision;
        metrics::reconcile_call(label);
        self.driver.reconcile_tasks(&statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::driver::test_support::RecordingDriver;
    use crate::model::TaskState;
    use std::time::SystemTime;

    fn status(task_id: &str, state: TaskState) -> TaskStatus {
        TaskStatus {
            task_id: task_id.to_string(),
            state,
            agent_id: Some("agent-1".to_string()),
            timestamp: SystemTime::now(),
            message: None,
        }
    }

    fn setup() -> (Reconciler, Arc<RecordingDriver>, Arc<ManualClock>, Arc<crate::state_store::InMemoryStateStore>) {
        let driver_handle = DriverHandle::new();
        let driver = Arc::new(RecordingDriver::default());
        driver_handle.register(driver.clone());
        let clock = Arc::new(ManualClock::new(1_000));
        let store = Arc::new(crate::state_store::InMemoryStateStore::new());
        let config = Config::default();
        let reconciler = Reconciler::new(config, driver_handle, clock.clone(), store.clone());
        (reconciler, driver, clock, store)
    }

    #[test]
    fn start_seeds_unreconciled_from_non_terminal_statuses_only() {
        let (reconciler, _driver, _clock, store) = setup();
        store.put(status("t1", TaskState::Running));
        store.put(status("t2", TaskState::Finished));
        reconciler.start();
        assert_eq!(reconciler.unreconciled_len(), 1);
    }

    #[test]
    fn first_tick_sends_explicit_reconcile_immediately() {
        let (reconciler, driver, _clock, store) = setup();
        store.put(status("t1", TaskState::Running));
        reconciler.start();
        reconciler.reconcile_tick().unwrap();
        let calls = driver.reconciles.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
    }

    #[test]
    fn tick_within_backoff_window_is_a_no_op() {
        let (reconciler, driver, clock, store) = setup();
        store.put(status("t1", TaskState::Running));
        reconciler.start();
        reconciler.reconcile_tick().unwrap();
        clock.advance(1);
        reconciler.reconcile_tick().unwrap();
        assert_eq!(driver.reconciles.lock().len(), 1);
    }

    #[test]
    fn second_tick_after_backoff_resends_explicit_snapshot_while_unreconciled() {
        // t1 and t2 are both outstanding after the first tick; t1 confirms
        // before the backoff elapses, so the next tick must still go out
        // explicit with the current snapshot ({t2}), not an empty reconcile.
        let (reconciler, driver, clock, store) = setup();
        store.put(status("t1", TaskState::Running));
        store.put(status("t2", TaskState::Running));
        reconciler.start();
        reconciler.reconcile_tick().unwrap();
        reconciler.update(status("t1", TaskState::Running));
        clock.advance(
            Config::default().base_backoff.as_millis() as u64 * Config::default().backoff_multiplier,
        );
        reconciler.reconcile_tick().unwrap();
        let calls = driver.reconciles.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[1].len(), 1);
        assert_eq!(calls[1][0].task_id, "t2");
    }

    #[test]
    fn draining_to_empty_triggers_one_implicit_reconcile_then_latches() {
        let (reconciler, driver, clock, store) = setup();
        store.put(status("t1", TaskState::Running));
        reconciler.start();
        reconciler.reconcile_tick().unwrap();
        reconciler.update(status("t1", TaskState::Running));

        let step_ms =
            Config::default().base_backoff.as_millis() as u64 * Config::default().backoff_multiplier;
        clock.advance(step_ms);
        reconciler.reconcile_tick().unwrap();
        clock.advance(step_ms * 4);
        reconciler.reconcile_tick().unwrap();

        let calls = driver.reconciles.lock();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].is_empty());
    }

    #[test]
    fn start_resets_the_implicit_latch() {
        let (reconciler, driver, clock, store) = setup();
        store.put(status("t1", TaskState::Running));
        reconciler.start();
        reconciler.reconcile_tick().unwrap();
        reconciler.update(status("t1", TaskState::Running));
        let step_ms =
            Config::default().base_backoff.as_millis() as u64 * Config::default().backoff_multiplier;
        clock.advance(step_ms);
        reconciler.reconcile_tick().unwrap();
        assert_eq!(driver.reconciles.lock().len(), 2);

        store.put(status("t1", TaskState::Finished));
        store.put(status("t2", TaskState::Running));
        reconciler.start();
        reconciler.reconcile_tick().unwrap();
        let calls = driver.reconciles.lock();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].len(), 1);
        assert_eq!(calls[2][0].task_id, "t2");
    }

    #[test]
    fn update_clears_task_and_reports_reconciled_when_empty() {
        let (reconciler, _driver, _clock, store) = setup();
        store.put(status("t1", TaskState::Running));
        reconciler.start();
        assert!(!reconciler.is_reconciled());
        reconciler.update(status("t1", TaskState::Running));
        assert!(reconciler.is_reconciled());
    }

    #[test]
    fn backoff_saturates_at_configured_maximum() {
        let (reconciler, _driver, clock, store) = setup();
        store.put(status("t1", TaskState::Running));
        reconciler.start();
        let max_ms = Config::default().max_backoff.as_millis() as u64;
        for _ in 0..10 {
            reconciler.reconcile_tick().unwrap();
            clock.advance(max_ms * 2);
        }
        let state = reconciler.state.lock();
        assert!(state.backoff_ms <= max_ms);
    }
}
