//! Error types for the handoff workers.

use std::time::Duration;

use thiserror::Error;

/// Failures that can surface while waiting on the ticker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandoffError {
    /// The ticker was still running when the caller-supplied wait budget ran out.
    #[error("ticker did not complete within {waited:?}")]
    JoinTimeout { waited: Duration },

    /// The ticker task went away without ever publishing completion.
    #[error("ticker task ended without reporting completion")]
    TickerGone,
}
