//! Observable worker events.
//!
//! The counter is owned by the countdown task; nothing else can read it
//! directly. Every externally visible fact about a worker travels as a
//! value snapshot on the event channel, so consumers never share state
//! with the workers.

/// One externally observable worker action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Countdown cycle snapshot, emitted before the decrement.
    Count { worker: String, value: i64 },
    /// One ticker cycle completed its wait.
    Tick { worker: String },
    /// Ticker liveness as observed by the countdown after its wait branch.
    TickerAlive { alive: bool },
}
