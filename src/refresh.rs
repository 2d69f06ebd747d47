//! Background refresh scheduling.
//!
//! A [`Scheduler`] owns a task that starts a fetch cycle on every interval
//! tick and on every manual trigger. Each cycle runs as its own task, so a
//! slow cycle never delays the next one; finished cycles are delivered in
//! completion order and the [`Dashboard`](crate::Dashboard) drops the stale
//! ones by sequence stamp.
//!
//! ```text
//!  interval ─┐                 ┌─▶ cycle task ─┐
//!  trigger() ├─▶ scheduler ────┼─▶ cycle task ─┼─▶ RefreshEvent ─▶ poll()
//!  period ───┘     task        └─▶ ...         ┘
//! ```

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, error};

use crate::notify::panic_message;
use crate::source::{CycleOutcome, DataFetcher, Period};

/// What the scheduler reports back.
#[derive(Debug)]
pub enum RefreshEvent {
    /// A cycle settled; apply it.
    Cycle(CycleOutcome),
    /// A cycle task panicked or was cancelled.
    Failed(String),
}

/// Handle to the background refresh task. Dropping it stops the task.
#[derive(Debug)]
pub struct Scheduler {
    trigger: mpsc::UnboundedSender<()>,
    period: watch::Sender<Period>,
    events: mpsc::UnboundedReceiver<RefreshEvent>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the scheduler and start the first cycle immediately.
    ///
    /// With `interval` set to `None` only manual triggers start cycles.
    /// Must be called from within a tokio runtime.
    pub fn spawn(fetcher: DataFetcher, period: Period, interval: Option<Duration>) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let (period_tx, period_rx) = watch::channel(period);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let ticker = interval.map(|every| {
            let mut ticker = time::interval_at(time::Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        let handle = tokio::spawn(run(fetcher, ticker, trigger_rx, period_rx, events_tx));

        Self {
            trigger: trigger_tx,
            period: period_tx,
            events: events_rx,
            handle,
        }
    }

    /// Start a cycle now.
    pub fn trigger(&self) {
        if self.trigger.send(()).is_err() {
            error!("Refresh scheduler is not running");
        }
    }

    /// Scope subsequent cycles to `period`.
    pub fn set_period(&self, period: Period) {
        self.period.send_replace(period);
    }

    /// Next finished event without blocking.
    pub fn poll(&mut self) -> Option<RefreshEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next finished event.
    pub async fn next(&mut self) -> Option<RefreshEvent> {
        self.events.recv().await
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn launch(cycles: &mut JoinSet<CycleOutcome>, fetcher: &DataFetcher, period: Period) {
    let fetcher = fetcher.clone();
    cycles.spawn(async move { fetcher.run_cycle(period).await });
}

async fn run(
    fetcher: DataFetcher,
    mut ticker: Option<Interval>,
    mut trigger: mpsc::UnboundedReceiver<()>,
    period: watch::Receiver<Period>,
    events: mpsc::UnboundedSender<RefreshEvent>,
) {
    let mut cycles = JoinSet::new();
    launch(&mut cycles, &fetcher, *period.borrow());

    loop {
        tokio::select! {
            _ = tick(&mut ticker) => {
                debug!("Refresh tick");
                launch(&mut cycles, &fetcher, *period.borrow());
            }
            msg = trigger.recv() => match msg {
                Some(()) => {
                    debug!("Manual refresh");
                    launch(&mut cycles, &fetcher, *period.borrow());
                }
                // Every handle dropped
                None => break,
            },
            Some(joined) = cycles.join_next() => {
                let event = match joined {
                    Ok(outcome) => RefreshEvent::Cycle(outcome),
                    Err(e) if e.is_panic() => {
                        let message = panic_message(e.into_panic().as_ref());
                        error!("Refresh cycle panicked: {}", message);
                        RefreshEvent::Failed(message)
                    }
                    Err(e) => RefreshEvent::Failed(e.to_string()),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        }
    }
    cycles.abort_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::MockClient;
    use crate::source::Endpoints;
    use serde_json::json;
    use std::sync::Arc;

    fn fetcher(client: Arc<MockClient>) -> DataFetcher {
        DataFetcher::new(client, Endpoints::default())
    }

    fn backend() -> MockClient {
        MockClient::new().respond("/api/violations", json!([]))
    }

    async fn next_cycle(scheduler: &mut Scheduler) -> CycleOutcome {
        match scheduler.next().await {
            Some(RefreshEvent::Cycle(outcome)) => outcome,
            other => panic!("expected a cycle, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_cycle_then_interval() {
        let client = Arc::new(backend());
        let mut scheduler = Scheduler::spawn(
            fetcher(client.clone()),
            Period::default(),
            Some(Duration::from_secs(30)),
        );

        let first = next_cycle(&mut scheduler).await;
        assert!(first.violations.is_ok());

        // Paused clock auto-advances to the next tick
        let second = next_cycle(&mut scheduler).await;
        assert!(second.seq > first.seq);
        assert!(scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_trigger_uses_current_period() {
        let client = Arc::new(backend());
        let mut scheduler = Scheduler::spawn(fetcher(client.clone()), Period::default(), None);
        next_cycle(&mut scheduler).await;

        scheduler.set_period(Period {
            days: 7,
            limit: 50,
            ..Period::default()
        });
        scheduler.trigger();
        let outcome = next_cycle(&mut scheduler).await;

        assert_eq!(outcome.period.days, 7);
        assert!(client
            .calls()
            .contains(&"/api/violations?days=7&limit=50".to_string()));
        assert!(scheduler.poll().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_cycles_deliver_in_completion_order() {
        let client = Arc::new(backend().with_delay(Duration::from_millis(100)));
        let mut scheduler = Scheduler::spawn(fetcher(client), Period::default(), None);
        scheduler.trigger();

        let a = next_cycle(&mut scheduler).await;
        let b = next_cycle(&mut scheduler).await;
        let mut seqs = vec![a.seq, b.seq];
        seqs.sort_unstable();
        assert_eq!(seqs, vec![1, 2]);
    }
}
