//! Periodic polling with at-most-one in-flight invocation per source.
//!
//! Every source gets a ticker task that fires its job on a fixed interval,
//! starting immediately. A tick (or a manual [`PollScheduler::trigger`]) that
//! finds the previous invocation still running is skipped. Failed invocations
//! are logged and the schedule carries on.

use crate::core::error::FetchError;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// Spot price plus the derived historical change.
    Conversion,
    /// Asset metadata and market ranking.
    MarketList,
}

impl Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SourceId::Conversion => "conversion",
                SourceId::MarketList => "market-list",
            }
        )
    }
}

/// Cleared when a poll is stopped. Completions must check it before writing state.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the in-flight flag when an invocation ends, including by panic.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

type Job = Arc<dyn Fn(Liveness) -> BoxFuture<'static, Result<(), FetchError>> + Send + Sync>;

struct PollSlot {
    id: SourceId,
    job: Job,
    liveness: Liveness,
    in_flight: AtomicBool,
}

impl PollSlot {
    /// Spawns one invocation unless the previous one is still running.
    fn fire(self: &Arc<Self>) -> bool {
        if !self.liveness.is_alive() {
            return false;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(source = %self.id, "Previous poll still in flight, skipping tick");
            return false;
        }

        let slot = Arc::clone(self);
        tokio::spawn(async move {
            let _in_flight = InFlight(&slot.in_flight);
            if let Err(e) = (slot.job)(slot.liveness.clone()).await {
                warn!(
                    source = %slot.id,
                    transient = e.is_transient(),
                    error = %e,
                    "Poll failed, keeping previous data"
                );
            }
        });
        true
    }
}

struct Poll {
    slot: Arc<PollSlot>,
    ticker: JoinHandle<()>,
}

impl Poll {
    fn cancel(self) {
        self.slot.liveness.revoke();
        self.ticker.abort();
    }
}

/// Owns every periodic poll in the process; nothing else starts timers.
#[derive(Default)]
pub struct PollScheduler {
    polls: Mutex<HashMap<SourceId, Poll>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn polls(&self) -> MutexGuard<'_, HashMap<SourceId, Poll>> {
        self.polls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `job` now and then every `every`. Restarting a running source replaces it.
    pub fn start<F, Fut>(&self, id: SourceId, every: Duration, job: F)
    where
        F: Fn(Liveness) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), FetchError>> + Send + 'static,
    {
        let job: Job = Arc::new(
            move |liveness: Liveness| -> BoxFuture<'static, Result<(), FetchError>> {
                job(liveness).boxed()
            },
        );
        let slot = Arc::new(PollSlot {
            id,
            job,
            liveness: Liveness::new(),
            in_flight: AtomicBool::new(false),
        });

        // tokio rejects a zero period
        let every = every.max(Duration::from_millis(1));
        let ticker_slot = Arc::clone(&slot);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                ticker_slot.fire();
            }
        });

        info!(source = %id, interval_ms = every.as_millis() as u64, "Polling started");
        if let Some(previous) = self.polls().insert(id, Poll { slot, ticker }) {
            previous.cancel();
        }
    }

    /// Fires an out-of-band invocation through the same overlap guard as the ticks.
    /// Returns `false` if the source is not running or an invocation is in flight.
    pub fn trigger(&self, id: SourceId) -> bool {
        self.polls().get(&id).is_some_and(|poll| poll.slot.fire())
    }

    /// Cancels future invocations and invalidates in-flight ones. Idempotent.
    pub fn stop(&self, id: SourceId) {
        if let Some(poll) = self.polls().remove(&id) {
            poll.cancel();
            info!(source = %id, "Polling stopped");
        }
    }

    pub fn stop_all(&self) {
        for (id, poll) in self.polls().drain() {
            poll.cancel();
            info!(source = %id, "Polling stopped");
        }
    }

    pub fn is_running(&self, id: SourceId) -> bool {
        self.polls().contains_key(&id)
    }

    pub fn is_in_flight(&self, id: SourceId) -> bool {
        self.polls()
            .get(&id)
            .is_some_and(|poll| poll.slot.in_flight.load(Ordering::Acquire))
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    #[derive(Default)]
    struct Counters {
        started: AtomicUsize,
        completed: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        applied: AtomicUsize,
    }

    fn slow_job(
        counters: Arc<Counters>,
        takes: Duration,
    ) -> impl Fn(Liveness) -> BoxFuture<'static, Result<(), FetchError>> + Send + Sync + 'static
    {
        move |liveness| {
            let counters = Arc::clone(&counters);
            async move {
                counters.started.fetch_add(1, Ordering::SeqCst);
                let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
                sleep(takes).await;
                counters.in_flight.fetch_sub(1, Ordering::SeqCst);
                counters.completed.fetch_add(1, Ordering::SeqCst);
                if liveness.is_alive() {
                    counters.applied.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_invocation_is_immediate() {
        let scheduler = PollScheduler::new();
        let counters = Arc::new(Counters::default());
        scheduler.start(
            SourceId::Conversion,
            Duration::from_secs(3600),
            slow_job(Arc::clone(&counters), Duration::ZERO),
        );

        sleep(Duration::from_millis(1)).await;
        assert_eq!(counters.completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_ticks_are_skipped() {
        let scheduler = PollScheduler::new();
        let counters = Arc::new(Counters::default());
        scheduler.start(
            SourceId::Conversion,
            Duration::from_millis(10),
            slow_job(Arc::clone(&counters), Duration::from_millis(50)),
        );

        sleep(Duration::from_millis(100)).await;
        assert_eq!(counters.in_flight.load(Ordering::SeqCst), 1);
        assert!(counters.completed.load(Ordering::SeqCst) <= 2);

        sleep(Duration::from_millis(25)).await;
        assert_eq!(counters.in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(counters.completed.load(Ordering::SeqCst), 2);
        assert_eq!(counters.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_in_flight(SourceId::Conversion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_schedule() {
        let scheduler = PollScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let job_calls = Arc::clone(&calls);
        scheduler.start(SourceId::MarketList, Duration::from_millis(10), move |_| {
            let calls = Arc::clone(&job_calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Transient("connection reset".to_string()))
            }
        });

        sleep(Duration::from_millis(35)).await;
        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert!(scheduler.is_running(SourceId::MarketList));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_job_does_not_wedge_source() {
        let scheduler = PollScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let job_calls = Arc::clone(&calls);
        scheduler.start(SourceId::Conversion, Duration::from_millis(10), move |_| {
            let calls = Arc::clone(&job_calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("malformed response");
                }
                Ok(())
            }
        });

        sleep(Duration::from_millis(35)).await;
        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert!(!scheduler.is_in_flight(SourceId::Conversion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_tick() {
        let scheduler = PollScheduler::new();
        let counters = Arc::new(Counters::default());
        scheduler.start(
            SourceId::Conversion,
            Duration::from_millis(10),
            slow_job(Arc::clone(&counters), Duration::ZERO),
        );
        scheduler.stop(SourceId::Conversion);
        scheduler.stop(SourceId::Conversion);
        scheduler.stop(SourceId::MarketList);

        sleep(Duration::from_millis(50)).await;
        assert_eq!(counters.started.load(Ordering::SeqCst), 0);
        assert!(!scheduler.is_running(SourceId::Conversion));
        assert!(!scheduler.trigger(SourceId::Conversion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_completion() {
        let scheduler = PollScheduler::new();
        let counters = Arc::new(Counters::default());
        scheduler.start(
            SourceId::Conversion,
            Duration::from_millis(10),
            slow_job(Arc::clone(&counters), Duration::from_millis(50)),
        );

        sleep(Duration::from_millis(20)).await;
        scheduler.stop(SourceId::Conversion);
        sleep(Duration::from_millis(100)).await;

        assert_eq!(counters.started.load(Ordering::SeqCst), 1);
        assert_eq!(counters.completed.load(Ordering::SeqCst), 1);
        assert_eq!(counters.applied.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_trigger_shares_overlap_guard() {
        let scheduler = PollScheduler::new();
        let counters = Arc::new(Counters::default());
        scheduler.start(
            SourceId::Conversion,
            Duration::from_secs(3600),
            slow_job(Arc::clone(&counters), Duration::from_millis(50)),
        );

        sleep(Duration::from_millis(1)).await;
        assert!(!scheduler.trigger(SourceId::Conversion));

        sleep(Duration::from_millis(60)).await;
        assert!(scheduler.trigger(SourceId::Conversion));
        sleep(Duration::from_millis(60)).await;
        assert_eq!(counters.completed.load(Ordering::SeqCst), 2);
    }
}
