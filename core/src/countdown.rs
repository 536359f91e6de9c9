//! Decrementing worker (the "T1" role) and its handoff to the ticker.
//!
//! # State machine
//! ```text
//! ┌─────────┐  counter below threshold  ┌──────────────────┐
//! │ Running │ ────────────────────────> │ WaitingForTicker │
//! └─────────┘                           └──────────────────┘
//!      │    <────────────────────────────────────┘
//!      │      ticker completed, or join timeout
//!      │ counter below zero
//!      v
//! ┌────────────┐
//! │ Terminated │
//! └────────────┘
//! ```
//!
//! With an unbounded ticker and no join timeout, `WaitingForTicker` never
//! releases, so `Terminated` becomes unreachable once the threshold is
//! crossed. That trap is documented behavior; supplying a join timeout is
//! the opt-in way around it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, warn};

use crate::config::HandoffConfig;
use crate::error::HandoffError;
use crate::event::WorkerEvent;
use crate::ticker::TickerHandle;

/// Countdown lifecycle phase, published on a watch channel for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    WaitingForTicker,
    Terminated,
}

/// Countdown worker definition; [`Countdown::spawn`] starts it.
#[derive(Debug, Clone)]
pub struct Countdown {
    name: String,
    value: i64,
    threshold: i64,
    interval: Duration,
    join_timeout: Option<Duration>,
}

impl Countdown {
    pub fn new(name: impl Into<String>, value: i64, threshold: i64, interval: Duration) -> Self {
        Self {
            name: name.into(),
            value,
            threshold,
            interval,
            join_timeout: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &HandoffConfig) -> Self {
        Self {
            name: config.workers.countdown.clone(),
            value: config.initial_count,
            threshold: config.handoff_threshold,
            interval: config.tick_interval(),
            join_timeout: config.join_timeout(),
        }
    }

    /// Bound each wait on the ticker instead of waiting forever.
    #[must_use]
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = Some(timeout);
        self
    }

    /// Start the countdown on the current runtime. The ticker handle is
    /// owned by the countdown from here on; use [`TickerHandle::stop_signal`]
    /// first if external stop control is needed.
    pub fn spawn(self, events: mpsc::Sender<WorkerEvent>, ticker: TickerHandle) -> CountdownHandle {
        let (phase_tx, phase_rx) = watch::channel(Phase::Running);
        let interrupt = Arc::new(Notify::new());
        let join = tokio::spawn(self.run(events, ticker, phase_tx, Arc::clone(&interrupt)));
        CountdownHandle {
            interrupt,
            phase: phase_rx,
            join: Some(join),
        }
    }

    /// One cycle: timed wait, report the counter, decrement, hand off to
    /// the ticker once below the threshold, report ticker liveness, stop
    /// below zero. Returns the final counter value.
    async fn run(
        mut self,
        events: mpsc::Sender<WorkerEvent>,
        mut ticker: TickerHandle,
        phase: watch::Sender<Phase>,
        interrupt: Arc<Notify>,
    ) -> i64 {
        loop {
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = interrupt.notified() => {
                    // interruptions are logged, never fatal
                    warn!(worker = %self.name, "timed wait interrupted; continuing");
                }
            }

            if events
                .send(WorkerEvent::Count {
                    worker: self.name.clone(),
                    value: self.value,
                })
                .await
                .is_err()
            {
                break;
            }
            self.value -= 1;

            if self.value < self.threshold {
                let _ = phase.send(Phase::WaitingForTicker);
                match ticker.await_completion(self.join_timeout).await {
                    Ok(()) => debug!(worker = %self.name, "ticker completed; resuming"),
                    Err(HandoffError::JoinTimeout { waited }) => {
                        warn!(worker = %self.name, ?waited, "ticker still running; resuming");
                    }
                    Err(err) => warn!(worker = %self.name, %err, "wait for ticker failed"),
                }
                let _ = phase.send(Phase::Running);
            }

            let alive = ticker.is_alive();
            if events.send(WorkerEvent::TickerAlive { alive }).await.is_err() {
                break;
            }

            if self.value < 0 {
                break;
            }
        }

        let _ = phase.send(Phase::Terminated);
        debug!(worker = %self.name, value = self.value, "countdown finished");
        self.value
    }
}

/// Owning handle to a spawned countdown.
#[derive(Debug)]
pub struct CountdownHandle {
    interrupt: Arc<Notify>,
    phase: watch::Receiver<Phase>,
    join: Option<tokio::task::JoinHandle<i64>>,
}

impl CountdownHandle {
    /// Wake the countdown out of its current timed wait. The interruption
    /// is logged and the cycle proceeds; the loop never aborts over it.
    pub fn interrupt(&self) {
        self.interrupt.notify_one();
    }

    /// Latest published phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Suspend until the countdown publishes `target`.
    pub async fn wait_for_phase(&mut self, target: Phase) {
        let _ = self.phase.wait_for(|phase| *phase == target).await;
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join
            .as_ref()
            .is_none_or(tokio::task::JoinHandle::is_finished)
    }

    /// Join the countdown task; `None` if it panicked or was already joined.
    pub async fn join(&mut self) -> Option<i64> {
        match self.join.take() {
            Some(join) => join.await.ok(),
            None => None,
        }
    }
}
