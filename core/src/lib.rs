//! Two-worker countdown/handoff runtime.
//!
//! A [`Ticker`] reports a periodic tick forever; a [`Countdown`] decrements
//! its own counter once per interval and, after the counter falls below a
//! threshold, waits for the ticker's run to end before going on. Everything
//! observable leaves the workers as [`WorkerEvent`] snapshots on one
//! bounded channel; no state is shared.
//!
//! [`spawn_handoff`] wires the pair up the way the `handoff` binary runs
//! them. It must be called from within a Tokio runtime.

mod config;
mod countdown;
mod error;
mod event;
mod ticker;

pub use config::{ConfigError, HandoffConfig, WorkerNames};
pub use countdown::{Countdown, CountdownHandle, Phase};
pub use error::HandoffError;
pub use event::WorkerEvent;
pub use ticker::{StopSignal, TickLimit, Ticker, TickerHandle};

use tokio::sync::mpsc;

/// Bounded event queue; ample headroom for two interval-paced producers.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Everything a caller needs to observe and wind down a running pair.
#[derive(Debug)]
pub struct HandoffHandles {
    pub events: mpsc::Receiver<WorkerEvent>,
    pub countdown: CountdownHandle,
    /// Stops the ticker; its completion releases a blocked countdown.
    pub ticker_stop: StopSignal,
}

/// Spawn the ticker and countdown pair described by `config`.
#[must_use]
pub fn spawn_handoff(config: &HandoffConfig) -> HandoffHandles {
    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let ticker = Ticker::new(config.workers.ticker.clone(), config.tick_interval())
        .spawn(events_tx.clone());
    let ticker_stop = ticker.stop_signal();
    let countdown = Countdown::from_config(config).spawn(events_tx, ticker);

    HandoffHandles {
        events: events_rx,
        countdown,
        ticker_stop,
    }
}
