//! Periodic background worker (the "T2" role).
//!
//! The ticker waits a fixed interval, reports a tick, and repeats. It
//! never terminates on its own. Two escape hatches exist for callers and
//! tests: a [`StopSignal`] that ends the loop deterministically, and a
//! [`TickLimit`] that makes the ticker complete after a fixed number of
//! ticks.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use tokio::sync::{Notify, mpsc, watch};
use tracing::debug;

use crate::error::HandoffError;
use crate::event::WorkerEvent;

const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Cooperative stop flag shared with a running worker.
///
/// `stop` latches the flag and wakes the worker out of its timed wait, so
/// termination does not have to wait for the current interval to elapse.
#[derive(Debug, Clone)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    async fn triggered(&self) {
        self.wake.notified().await;
    }
}

/// How many ticks the ticker runs for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TickLimit {
    /// Run until stopped or the process exits.
    #[default]
    Unbounded,
    /// Complete after exactly this many ticks.
    Count(u64),
}

impl TickLimit {
    fn reached(self, ticks: u64) -> bool {
        match self {
            TickLimit::Unbounded => false,
            TickLimit::Count(max) => ticks >= max,
        }
    }
}

/// Periodic worker definition; [`Ticker::spawn`] starts it.
#[derive(Debug, Clone)]
pub struct Ticker {
    name: String,
    interval: Duration,
    limit: TickLimit,
}

impl Ticker {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            limit: TickLimit::Unbounded,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: TickLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Start the ticker on the current runtime.
    pub fn spawn(self, events: mpsc::Sender<WorkerEvent>) -> TickerHandle {
        let (done_tx, done_rx) = watch::channel(false);
        let stop = StopSignal::new();
        let join = tokio::spawn(self.run(events, stop.clone(), done_tx));
        TickerHandle {
            stop,
            done: done_rx,
            join: Some(join),
        }
    }

    async fn run(
        self,
        events: mpsc::Sender<WorkerEvent>,
        stop: StopSignal,
        done: watch::Sender<bool>,
    ) {
        let mut ticks: u64 = 0;
        loop {
            if self.limit.reached(ticks) {
                debug!(worker = %self.name, ticks, "tick limit reached");
                break;
            }
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = stop.triggered() => {}
            }
            if stop.is_stopped() {
                debug!(worker = %self.name, ticks, "stop requested");
                break;
            }
            if events
                .send(WorkerEvent::Tick {
                    worker: self.name.clone(),
                })
                .await
                .is_err()
            {
                // every observer is gone; nothing left to tick for
                break;
            }
            ticks += 1;
        }
        let _ = done.send(true);
    }
}

/// Owning handle to a spawned ticker.
#[derive(Debug)]
pub struct TickerHandle {
    stop: StopSignal,
    done: watch::Receiver<bool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl TickerHandle {
    /// Whether the ticker's run has not yet fully ended.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !*self.done.borrow()
    }

    /// A clonable stop control, detached from the handle's lifetime.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Suspend until the ticker's run has fully ended.
    ///
    /// With `limit: None` this waits indefinitely; against an unbounded,
    /// never-stopped ticker it never returns. A `Some` limit converts an
    /// overlong wait into [`HandoffError::JoinTimeout`].
    pub async fn await_completion(&mut self, limit: Option<Duration>) -> Result<(), HandoffError> {
        let done = self.done.wait_for(|done| *done);
        match limit {
            None => match done.await {
                Ok(_) => Ok(()),
                Err(_) => Err(HandoffError::TickerGone),
            },
            Some(limit) => match tokio::time::timeout(limit, done).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(_)) => Err(HandoffError::TickerGone),
                Err(_) => Err(HandoffError::JoinTimeout { waited: limit }),
            },
        }
    }

    /// Stop the ticker and join its task, bounded so shutdown cannot hang.
    pub async fn shutdown(&mut self) {
        self.stop.stop();
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, join).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_INTERVAL: Duration = Duration::from_millis(5);
    const WAIT_BUDGET: Duration = Duration::from_secs(5);

    fn test_ticker(limit: TickLimit) -> (TickerHandle, mpsc::Receiver<WorkerEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let handle = Ticker::new("T2", TEST_INTERVAL).with_limit(limit).spawn(tx);
        (handle, rx)
    }

    #[tokio::test]
    async fn limited_ticker_completes_after_its_last_tick() {
        let (mut handle, mut rx) = test_ticker(TickLimit::Count(3));
        assert!(handle.is_alive());

        let mut ticks = 0;
        while let Some(event) = tokio::time::timeout(WAIT_BUDGET, rx.recv())
            .await
            .expect("ticker should keep ticking")
        {
            assert_eq!(
                event,
                WorkerEvent::Tick {
                    worker: "T2".to_string()
                }
            );
            ticks += 1;
        }
        assert_eq!(ticks, 3);

        tokio::time::timeout(WAIT_BUDGET, handle.await_completion(None))
            .await
            .expect("completion should be quick")
            .expect("ticker completed cleanly");
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn zero_limit_completes_without_ticking() {
        let (mut handle, mut rx) = test_ticker(TickLimit::Count(0));
        tokio::time::timeout(WAIT_BUDGET, handle.await_completion(None))
            .await
            .expect("completion should be immediate")
            .expect("ticker completed cleanly");
        assert!(!handle.is_alive());
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn stop_signal_terminates_unbounded_ticker() {
        let (mut handle, mut rx) = test_ticker(TickLimit::Unbounded);
        let first = tokio::time::timeout(WAIT_BUDGET, rx.recv())
            .await
            .expect("first tick should arrive");
        assert!(first.is_some());

        handle.stop_signal().stop();
        tokio::time::timeout(WAIT_BUDGET, handle.await_completion(None))
            .await
            .expect("stop should end the run promptly")
            .expect("ticker completed cleanly");
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn await_completion_times_out_while_running() {
        let (mut handle, _rx) = test_ticker(TickLimit::Unbounded);
        let waited = Duration::from_millis(50);

        let result = handle.await_completion(Some(waited)).await;
        assert_eq!(result, Err(HandoffError::JoinTimeout { waited }));
        assert!(handle.is_alive());

        handle.shutdown().await;
        assert!(!handle.is_alive());
    }
}
