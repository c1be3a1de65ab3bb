//! Trading-window scheduler
//!
//! Drives the poll -> diff -> persist -> interpret cycle while the market
//! is open. Before the window it idles with a fixed recheck delay; past the
//! window end it halts for the day and the loop exits. A watch channel lets
//! a hosting process stop the loop cleanly between sleeps.

use crate::alert::{deliver_all, Notifier};
use crate::delta::compute_deltas;
use crate::signal::{Alert, Interpreter};
use crate::sink::SnapshotSink;
use crate::source::{ChainSource, Poller};
use crate::store::SnapshotStore;
use chrono::{Local, NaiveTime};
use rand::Rng;
use std::time::Duration;
use tokio::sync::watch;

/// Scheduler lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Before the window opens; recheck on a fixed delay
    Waiting,
    /// Inside the trading window; cycles run
    Active,
    /// Past the window end; terminal for this process
    Halted,
}

/// Daily trading window in local time
#[derive(Debug, Clone, Copy)]
pub struct TradingWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl TradingWindow {
    /// Scheduler state implied by a local clock time
    pub fn state_at(&self, now: NaiveTime) -> SchedulerState {
        if now > self.close {
            SchedulerState::Halted
        } else if now >= self.open {
            SchedulerState::Active
        } else {
            SchedulerState::Waiting
        }
    }
}

impl Default for TradingWindow {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
        }
    }
}

/// Timing configuration for the scheduler loop
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub window: TradingWindow,
    /// Base delay between active cycles
    pub base_interval: Duration,
    /// Upper bound (exclusive) of the uniform jitter added per cycle
    pub jitter_max: Duration,
    /// Recheck delay while waiting for the window to open
    pub idle_check: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            window: TradingWindow::default(),
            base_interval: Duration::from_secs(55),
            jitter_max: Duration::from_secs(10),
            idle_check: Duration::from_secs(10),
        }
    }
}

/// What one cycle did, for logging and the one-shot CLI path
#[derive(Debug)]
pub struct CycleReport {
    /// A snapshot was fetched and processed
    pub polled: bool,
    /// The poll burst saw at least one transient failure
    pub had_failure: bool,
    /// Alerts raised by the interpreter this cycle
    pub alerts: Vec<Alert>,
}

/// Owns the per-cycle collaborators and the previous-baseline state
pub struct Scheduler<S: ChainSource> {
    poller: Poller<S>,
    store: SnapshotStore,
    interpreter: Interpreter,
    sink: Box<dyn SnapshotSink>,
    notifier: Box<dyn Notifier>,
    config: SchedulerConfig,
}

impl<S: ChainSource> Scheduler<S> {
    pub fn new(
        poller: Poller<S>,
        store: SnapshotStore,
        interpreter: Interpreter,
        sink: Box<dyn SnapshotSink>,
        notifier: Box<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            poller,
            store,
            interpreter,
            sink,
            notifier,
            config,
        }
    }

    /// Run the daily loop until the window closes or shutdown is signalled
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        loop {
            if *shutdown.borrow() {
                tracing::info!("Shutdown requested, stopping scheduler");
                return Ok(());
            }

            let now = Local::now().time();
            match self.config.window.state_at(now) {
                SchedulerState::Halted => {
                    tracing::info!("Market closed, scheduler halted");
                    return Ok(());
                }
                SchedulerState::Waiting => {
                    tracing::debug!(%now, "Waiting for window to open");
                    self.sleep_or_shutdown(self.config.idle_check, &mut shutdown)
                        .await;
                }
                SchedulerState::Active => {
                    let report = self.run_cycle().await;
                    tracing::info!(
                        polled = report.polled,
                        had_failure = report.had_failure,
                        alerts = report.alerts.len(),
                        "Cycle complete"
                    );
                    self.sleep_or_shutdown(self.cycle_delay(), &mut shutdown)
                        .await;
                }
            }
        }
    }

    /// Base interval plus uniform jitter so cycles don't land on a fixed beat
    fn cycle_delay(&self) -> Duration {
        let jitter_max = self.config.jitter_max.as_millis() as u64;
        let jitter = if jitter_max == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_max)
        };
        self.config.base_interval + Duration::from_millis(jitter)
    }

    async fn sleep_or_shutdown(&self, delay: Duration, shutdown: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => {}
        }
    }

    /// One full poll -> diff -> persist -> export -> interpret -> notify pass.
    ///
    /// Never propagates an error: any failure inside a cycle is logged and
    /// the next cycle starts fresh.
    pub async fn run_cycle(&self) -> CycleReport {
        metrics::counter!("chainpulse_cycles_total").increment(1);

        let outcome = match self.poller.poll().await {
            Ok(outcome) => outcome,
            Err(e) => {
                // No snapshot this cycle; the stored baseline stays as-is.
                tracing::error!(error = %e, "Poll failed, skipping cycle");
                metrics::counter!("chainpulse_cycle_failures_total").increment(1);
                return CycleReport {
                    polled: false,
                    had_failure: true,
                    alerts: Vec::new(),
                };
            }
        };

        // A burst that needed retries cannot be trusted to sit one clean
        // cycle after the stored baseline; drop the comparison.
        let previous = if outcome.had_failure {
            tracing::warn!("Poll burst had failures, invalidating delta baseline");
            None
        } else {
            match self.store.load() {
                Ok(previous) => previous,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not load baseline, treating as first run");
                    None
                }
            }
        };

        let deltas = compute_deltas(&outcome.snapshot, previous.as_ref());

        let mut export = true;
        if let Err(e) = self.store.save(&deltas) {
            tracing::error!(error = %e, "Failed to persist snapshot, skipping export");
            export = false;
        }
        if export {
            if let Err(e) = self.sink.write(&deltas) {
                tracing::error!(error = %e, "Failed to export datasets");
            }
        }

        let alerts = self.interpreter.evaluate(&deltas);
        deliver_all(self.notifier.as_ref(), &alerts).await;

        CycleReport {
            polled: true,
            had_failure: outcome.had_failure,
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{NotifyError, Notifier};
    use crate::chain::{ChainSnapshot, OptionRow};
    use crate::signal::AlertKind;
    use crate::sink::NullSink;
    use crate::source::{PollerConfig, SourceError};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn row(buy: i64, sell: i64, oi_change: i64) -> OptionRow {
        OptionRow {
            strike_price: dec!(48000),
            open_interest: 100,
            change_in_open_interest: oi_change,
            total_traded_volume: 0,
            implied_volatility: dec!(12),
            last_price: dec!(100),
            total_buy_quantity: buy,
            total_sell_quantity: sell,
        }
    }

    /// Scripted source: returns canned snapshots, optionally failing first
    struct ScriptedSource {
        snapshots: Vec<ChainSnapshot>,
        calls: AtomicUsize,
        transient_failures: AtomicU32,
    }

    impl ScriptedSource {
        fn new(snapshots: Vec<ChainSnapshot>) -> Self {
            Self {
                snapshots,
                calls: AtomicUsize::new(0),
                transient_failures: AtomicU32::new(0),
            }
        }

        fn failing_first(self, failures: u32) -> Self {
            self.transient_failures.store(failures, Ordering::SeqCst);
            self
        }
    }

    #[async_trait]
    impl ChainSource for ScriptedSource {
        async fn warm_up(&self) -> Result<(), SourceError> {
            Ok(())
        }

        async fn fetch(&self) -> Result<ChainSnapshot, SourceError> {
            if self.transient_failures.load(Ordering::SeqCst) > 0 {
                self.transient_failures.fetch_sub(1, Ordering::SeqCst);
                return Err(SourceError::EmptyBody);
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let idx = n.min(self.snapshots.len() - 1);
            Ok(self.snapshots[idx].clone())
        }
    }

    struct CountingNotifier {
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send(&self, _alert: &Alert) -> Result<(), NotifyError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn snapshot(ce_buy: i64, ce_oi: i64) -> ChainSnapshot {
        ChainSnapshot {
            expiry: "28-Aug-2026".to_string(),
            fetched_at: Utc::now(),
            ce: vec![row(ce_buy, 0, ce_oi)],
            pe: vec![row(0, 0, 0)],
        }
    }

    fn scheduler(
        source: ScriptedSource,
        dir: &TempDir,
        sent: Arc<AtomicUsize>,
    ) -> Scheduler<ScriptedSource> {
        Scheduler::new(
            Poller::with_config(
                source,
                PollerConfig {
                    max_attempts: 5,
                    backoff_base: Duration::from_millis(1),
                },
            ),
            SnapshotStore::new(dir.path().join("prev_data.json")),
            Interpreter::default(),
            Box::new(NullSink),
            Box::new(CountingNotifier { sent }),
            SchedulerConfig::default(),
        )
    }

    #[test]
    fn test_window_states() {
        let window = TradingWindow::default();
        let t = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();
        assert_eq!(window.state_at(t(9, 0, 0)), SchedulerState::Waiting);
        assert_eq!(window.state_at(t(9, 15, 0)), SchedulerState::Active);
        assert_eq!(window.state_at(t(12, 0, 0)), SchedulerState::Active);
        assert_eq!(window.state_at(t(15, 30, 0)), SchedulerState::Active);
        assert_eq!(window.state_at(t(15, 30, 1)), SchedulerState::Halted);
    }

    #[test]
    fn test_cycle_delay_bounds() {
        let dir = TempDir::new().unwrap();
        let sched = scheduler(
            ScriptedSource::new(vec![snapshot(0, 0)]),
            &dir,
            Arc::new(AtomicUsize::new(0)),
        );
        for _ in 0..50 {
            let d = sched.cycle_delay();
            assert!(d >= Duration::from_secs(55));
            assert!(d < Duration::from_secs(65));
        }
    }

    #[tokio::test]
    async fn test_first_cycle_persists_zero_delta_baseline() {
        let dir = TempDir::new().unwrap();
        let sched = scheduler(
            ScriptedSource::new(vec![snapshot(500_000, 100)]),
            &dir,
            Arc::new(AtomicUsize::new(0)),
        );

        let report = sched.run_cycle().await;
        assert!(report.polled);
        assert!(!report.had_failure);
        // First run: deltas are zero, nothing above threshold
        assert!(report.alerts.is_empty());

        let stored = sched.store.load().unwrap().unwrap();
        assert_eq!(stored.ce[0].buy_change, 0);
    }

    #[tokio::test]
    async fn test_second_cycle_raises_alert_from_delta() {
        let dir = TempDir::new().unwrap();
        let sent = Arc::new(AtomicUsize::new(0));
        let sched = scheduler(
            ScriptedSource::new(vec![snapshot(100_000, 100), snapshot(300_000, 600)]),
            &dir,
            sent.clone(),
        );

        sched.run_cycle().await;
        let report = sched.run_cycle().await;

        // CE buy delta = 200,000 with positive OI change
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(
            report.alerts[0].kind,
            AlertKind::SingleMetric(crate::signal::Metric::CeBuy)
        );
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flaky_burst_invalidates_baseline() {
        let dir = TempDir::new().unwrap();
        let sched = scheduler(
            ScriptedSource::new(vec![snapshot(100_000, 100), snapshot(900_000, 600)])
                .failing_first(0),
            &dir,
            Arc::new(AtomicUsize::new(0)),
        );
        sched.run_cycle().await;

        // Second cycle's burst needs a retry: baseline must be ignored
        sched
            .poller
            .source()
            .transient_failures
            .store(1, Ordering::SeqCst);
        let report = sched.run_cycle().await;
        assert!(report.had_failure);
        assert!(report.alerts.is_empty());

        let stored = sched.store.load().unwrap().unwrap();
        assert_eq!(stored.ce[0].buy_change, 0);
    }

    #[tokio::test]
    async fn test_exhausted_poll_leaves_baseline_untouched() {
        let dir = TempDir::new().unwrap();
        let sched = scheduler(
            ScriptedSource::new(vec![snapshot(100_000, 100)]).failing_first(99),
            &dir,
            Arc::new(AtomicUsize::new(0)),
        );

        // Seed a baseline, then make every attempt fail
        let seeded = crate::delta::compute_deltas(&snapshot(100_000, 100), None);
        sched.store.save(&seeded).unwrap();
        let before = std::fs::read_to_string(sched.store.path()).unwrap();

        let report = sched.run_cycle().await;
        assert!(!report.polled);
        assert!(report.had_failure);
        assert!(report.alerts.is_empty());

        let after = std::fs::read_to_string(sched.store.path()).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_run_halts_after_window_close() {
        let dir = TempDir::new().unwrap();
        let mut config = SchedulerConfig::default();
        // Window already closed for today
        config.window = TradingWindow {
            open: NaiveTime::from_hms_opt(0, 0, 1).unwrap(),
            close: NaiveTime::from_hms_opt(0, 0, 2).unwrap(),
        };
        let sched = Scheduler::new(
            Poller::new(ScriptedSource::new(vec![snapshot(0, 0)])),
            SnapshotStore::new(dir.path().join("prev_data.json")),
            Interpreter::default(),
            Box::new(NullSink),
            Box::new(NoopCounting),
            config,
        );
        let (_tx, rx) = watch::channel(false);
        sched.run(rx).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_signal() {
        let dir = TempDir::new().unwrap();
        let sched = Scheduler::new(
            Poller::new(ScriptedSource::new(vec![snapshot(0, 0)])),
            SnapshotStore::new(dir.path().join("prev_data.json")),
            Interpreter::default(),
            Box::new(NullSink),
            Box::new(NoopCounting),
            SchedulerConfig::default(),
        );
        let (tx, rx) = watch::channel(true);
        sched.run(rx).await.unwrap();
        drop(tx);
    }

    struct NoopCounting;

    #[async_trait]
    impl Notifier for NoopCounting {
        async fn send(&self, _alert: &Alert) -> Result<(), NotifyError> {
            Ok(())
        }
    }
}
