/// Background polling of live match data
///
/// One scheduler per live view. Each tick asks whether anything is live and
/// only then pays for a refresh. Results are published on a `watch` channel;
/// a failed refresh keeps the previous snapshot.
use chrono::Utc;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::match_state::MatchState;
use crate::types::{Match, Origin};

/// Buffer size for manual refresh trigger channel
const REFRESH_CHANNEL_BUFFER_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Polling,
}

/// Last published result
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub matches: Arc<Vec<Match>>,
    pub refreshed_at: Option<SystemTime>,
    /// Number of successful publishes so far
    pub generation: u64,
}

struct Shared {
    state: SchedulerState,
    last_known: Arc<Vec<Match>>,
    generation: u64,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    refreshes: AtomicU64,
    failures: AtomicU64,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// How long after kickoff a feed match still marked scheduled is worth polling
const KICKOFF_GRACE_HOURS: i64 = 3;

/// True while a match is in play, or when a feed match should have kicked
/// off within the last few hours. Stored rows never count on kickoff alone.
pub fn needs_polling(matches: &[Match]) -> bool {
    let now = Utc::now();
    let grace_start = now - chrono::Duration::hours(KICKOFF_GRACE_HOURS);
    matches.iter().any(|m| {
        let state = m.state();
        state.is_live()
            || (state == MatchState::Scheduled
                && m.origin == Origin::External
                && m.kickoff_time <= now
                && m.kickoff_time >= grace_start)
    })
}

pub struct LiveRefreshScheduler;

impl LiveRefreshScheduler {
    /// Poll every `interval`, calling `refresh` only when `has_live` says so
    pub fn start<H, R, Fut>(interval: Duration, has_live: H, refresh: R) -> RefreshHandle
    where
        H: Fn() -> bool + Send + Sync + 'static,
        R: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<Match>>> + Send + 'static,
    {
        spawn(interval, Vec::new(), move |_: &[Match]| has_live(), refresh)
    }

    /// Like `start`, but decides liveness from the scheduler's own last-known
    /// matches, starting from `seed`
    pub fn start_tracked<R, Fut>(interval: Duration, seed: Vec<Match>, refresh: R) -> RefreshHandle
    where
        R: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<Match>>> + Send + 'static,
    {
        spawn(interval, seed, needs_polling, refresh)
    }
}

fn spawn<H, R, Fut>(interval: Duration, seed: Vec<Match>, has_live: H, refresh: R) -> RefreshHandle
where
    H: Fn(&[Match]) -> bool + Send + Sync + 'static,
    R: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Vec<Match>>> + Send + 'static,
{
    let seed = Arc::new(seed);
    let shared = Arc::new(Mutex::new(Shared {
        state: SchedulerState::Polling,
        last_known: Arc::clone(&seed),
        generation: 0,
    }));
    let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot {
        matches: seed,
        refreshed_at: None,
        generation: 0,
    });
    let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(REFRESH_CHANNEL_BUFFER_SIZE);
    let token = CancellationToken::new();
    let counters = Arc::new(Counters::default());

    let task_shared = Arc::clone(&shared);
    let task_token = token.clone();
    let task_counters = Arc::clone(&counters);
    info!("SCHEDULER: Starting live refresh every {:?}", interval);

    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await; // First tick completes immediately

        loop {
            let forced = tokio::select! {
                biased;
                _ = task_token.cancelled() => break,
                _ = timer.tick() => false,
                Some(()) = trigger_rx.recv() => true,
            };
            task_counters.ticks.fetch_add(1, Ordering::SeqCst);

            if !forced {
                let last_known = Arc::clone(&lock(&task_shared).last_known);
                if !has_live(last_known.as_slice()) {
                    debug!("SCHEDULER: Nothing live, skipping refresh");
                    continue;
                }
            }

            // stop() may have landed while liveness was checked; the refresh
            // future must not even be created then
            if task_token.is_cancelled() {
                break;
            }
            task_counters.refreshes.fetch_add(1, Ordering::SeqCst);
            let pending = refresh();
            let result = tokio::select! {
                biased;
                _ = task_token.cancelled() => break,
                result = pending => result,
            };

            match result {
                Ok(matches) => {
                    let mut guard = lock(&task_shared);
                    // stop() flips state under this lock, so nothing lands after it
                    if guard.state == SchedulerState::Idle {
                        debug!("SCHEDULER: Discarding refresh that finished after stop");
                        break;
                    }
                    let matches = Arc::new(matches);
                    guard.generation += 1;
                    guard.last_known = Arc::clone(&matches);
                    debug!(
                        "SCHEDULER: Published {} matches (generation {})",
                        matches.len(),
                        guard.generation
                    );
                    snapshot_tx.send_replace(Snapshot {
                        matches,
                        refreshed_at: Some(SystemTime::now()),
                        generation: guard.generation,
                    });
                }
                Err(e) => {
                    task_counters.failures.fetch_add(1, Ordering::SeqCst);
                    warn!("SCHEDULER: Refresh failed, keeping last snapshot: {:#}", e);
                }
            }
        }

        lock(&task_shared).state = SchedulerState::Idle;
        debug!("SCHEDULER: Polling loop ended");
    });

    RefreshHandle {
        token,
        shared,
        snapshot_rx,
        trigger: trigger_tx,
        counters,
    }
}

/// Cancellation handle for a running scheduler; dropping it stops polling
pub struct RefreshHandle {
    token: CancellationToken,
    shared: Arc<Mutex<Shared>>,
    snapshot_rx: watch::Receiver<Snapshot>,
    trigger: mpsc::Sender<()>,
    counters: Arc<Counters>,
}

impl RefreshHandle {
    /// Stop polling. Once this returns no further result is published.
    pub fn stop(&self) {
        let mut guard = lock(&self.shared);
        if guard.state == SchedulerState::Polling {
            info!("SCHEDULER: Stopping live refresh");
        }
        guard.state = SchedulerState::Idle;
        self.token.cancel();
    }

    /// Ask for a refresh now, regardless of whether anything is live
    pub fn refresh_now(&self) -> bool {
        if self.state() == SchedulerState::Idle {
            return false;
        }
        self.trigger.try_send(()).is_ok()
    }

    pub fn state(&self) -> SchedulerState {
        lock(&self.shared).state
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    pub fn latest(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// External codes of the matches live in the last published snapshot
    pub fn live_set(&self) -> BTreeSet<String> {
        lock(&self.shared)
            .last_known
            .iter()
            .filter(|m| m.is_live())
            .map(|m| m.external_code.clone())
            .collect()
    }

    pub fn tick_count(&self) -> u64 {
        self.counters.ticks.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> u64 {
        self.counters.refreshes.load(Ordering::SeqCst)
    }

    pub fn failure_count(&self) -> u64 {
        self.counters.failures.load(Ordering::SeqCst)
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{feed_match, local_match};
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    const INTERVAL: Duration = Duration::from_millis(100);

    fn live_matches() -> Vec<Match> {
        vec![
            feed_match("A", "1H", Some((0, 0))),
            feed_match("B", "HT", Some((1, 1))),
            feed_match("C", "2H", Some((2, 0))),
        ]
    }

    fn counting_refresh(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> futures::future::BoxFuture<'static, anyhow::Result<Vec<Match>>> + Send + Sync + 'static
    {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(live_matches()) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_tick_one_refresh_then_none_after_stop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = LiveRefreshScheduler::start(INTERVAL, || true, counting_refresh(Arc::clone(&calls)));

        tokio::time::sleep(INTERVAL + Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.latest().matches.len(), 3);
        assert_eq!(handle.live_set().len(), 3);

        handle.stop();
        assert_eq!(handle.state(), SchedulerState::Idle);
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!handle.refresh_now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_refresh_when_nothing_live_and_resumes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let live = Arc::new(AtomicBool::new(false));
        let live_flag = Arc::clone(&live);
        let handle = LiveRefreshScheduler::start(
            INTERVAL,
            move || live_flag.load(Ordering::SeqCst),
            counting_refresh(Arc::clone(&calls)),
        );

        tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(handle.tick_count(), 3);
        assert_eq!(handle.state(), SchedulerState::Polling);

        live.store(true, Ordering::SeqCst);
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_loop_and_last_snapshot() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let handle = LiveRefreshScheduler::start(INTERVAL, || true, move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 1 {
                    anyhow::bail!("feed timed out");
                }
                Ok(live_matches())
            }
        });

        tokio::time::sleep(INTERVAL + Duration::from_millis(50)).await;
        assert_eq!(handle.latest().generation, 1);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(handle.failure_count(), 1);
        assert_eq!(handle.latest().generation, 1);
        assert_eq!(handle.latest().matches.len(), 3);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(handle.latest().generation, 2);
        assert_eq!(handle.state(), SchedulerState::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_discarded_after_stop() {
        let handle = LiveRefreshScheduler::start(INTERVAL, || true, || async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(live_matches())
        });

        // Tick fires at 100ms; refresh still running at 200ms
        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(handle.refresh_count(), 1);
        handle.stop();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.latest().generation, 0);
        assert!(handle.latest().matches.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_liveness_check_prevents_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<RefreshHandle>>> = Arc::new(Mutex::new(None));
        let stopper = Arc::clone(&slot);
        let handle = LiveRefreshScheduler::start(
            INTERVAL,
            move || {
                if let Some(handle) = lock_slot(&stopper).as_ref() {
                    handle.stop();
                }
                true
            },
            counting_refresh(Arc::clone(&calls)),
        );
        *lock_slot(&slot) = Some(handle);

        tokio::time::sleep(INTERVAL * 3).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let guard = lock_slot(&slot);
        let handle = guard.as_ref().unwrap();
        assert_eq!(handle.tick_count(), 1);
        assert_eq!(handle.refresh_count(), 0);
        assert_eq!(handle.state(), SchedulerState::Idle);
    }

    fn lock_slot(slot: &Mutex<Option<RefreshHandle>>) -> MutexGuard<'_, Option<RefreshHandle>> {
        slot.lock().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_ignores_liveness() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = LiveRefreshScheduler::start(INTERVAL * 10, || false, counting_refresh(Arc::clone(&calls)));

        assert!(handle.refresh_now());
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.latest().generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracked_scheduler_uses_own_live_set() {
        let calls = Arc::new(AtomicUsize::new(0));
        let finished = vec![feed_match("Z", "FT", Some((1, 0)))];
        let handle = LiveRefreshScheduler::start_tracked(INTERVAL, finished, counting_refresh(Arc::clone(&calls)));

        tokio::time::sleep(INTERVAL * 2 + Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(handle.live_set().is_empty());

        handle.refresh_now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.live_set().len(), 3);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_drop_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = LiveRefreshScheduler::start(Duration::from_millis(5), || true, counting_refresh(Arc::clone(&calls)));
        drop(handle);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_needs_polling_for_overdue_kickoff() {
        let mut overdue = feed_match("A", "NS", None);
        overdue.kickoff_time = Utc::now() - chrono::Duration::minutes(30);
        assert!(needs_polling(&[overdue]));

        let mut future = feed_match("B", "NS", None);
        future.kickoff_time = Utc::now() + chrono::Duration::hours(2);
        assert!(!needs_polling(&[future]));
        assert!(!needs_polling(&[feed_match("C", "FT", Some((0, 0)))]));
    }

    #[test]
    fn test_needs_polling_ignores_stale_scheduled_rows() {
        // Kicked off in 2024 and never updated
        assert!(!needs_polling(&[feed_match("OLD", "NS", None)]));

        let mut stored = local_match(1, "", "NS", None);
        stored.kickoff_time = Utc::now() - chrono::Duration::minutes(30);
        assert!(!needs_polling(&[stored]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracked_scheduler_idle_with_finished_feed_and_stale_store_row() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seed = vec![
            feed_match("F1", "FT", Some((2, 1))),
            feed_match("F2", "FT", Some((0, 0))),
            local_match(1, "", "NS", None),
        ];
        let handle = LiveRefreshScheduler::start_tracked(INTERVAL, seed, counting_refresh(Arc::clone(&calls)));

        tokio::time::sleep(INTERVAL * 5 + Duration::from_millis(50)).await;

        assert_eq!(handle.tick_count(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(handle.live_set().is_empty());
    }
}
