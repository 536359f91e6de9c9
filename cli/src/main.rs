//! Handoff CLI - runs the countdown/ticker pair and prints their events.
//!
//! Worker output goes to stdout in a fixed format (`T1: 10`, `T2...`,
//! `true`); logs go to stderr so the two streams stay separable.
//!
//! With the default configuration the countdown blocks on the ticker after
//! crossing its threshold and the ticker never ends, so the process keeps
//! printing ticks until interrupted. Ctrl-C stops the ticker, which
//! releases the countdown to run below zero and terminate, draining the
//! whole pair cleanly.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use handoff_core::{HandoffConfig, WorkerEvent, spawn_handoff};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    // Logs stay off stdout so worker output remains machine-readable.
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config() -> HandoffConfig {
    match HandoffConfig::load() {
        Ok(Some(config)) => config,
        Ok(None) => HandoffConfig::default(),
        Err(err) => {
            tracing::warn!(path = %err.path().display(), "using default config: {err}");
            HandoffConfig::default()
        }
    }
}

fn print_event(event: &WorkerEvent) {
    match event {
        WorkerEvent::Count { worker, value } => println!("{worker}: {value}"),
        WorkerEvent::Tick { worker } => println!("{worker}..."),
        WorkerEvent::TickerAlive { alive } => println!("{alive}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config();
    tracing::info!(
        initial_count = config.initial_count,
        handoff_threshold = config.handoff_threshold,
        tick_interval_ms = config.tick_interval_ms,
        join_timeout_ms = config.join_timeout_ms,
        "starting countdown/ticker pair"
    );

    let mut handles = spawn_handoff(&config);
    let mut stopping = false;

    loop {
        tokio::select! {
            event = handles.events.recv() => match event {
                Some(event) => print_event(&event),
                // both workers are gone; nothing further can be observed
                None => break,
            },
            result = tokio::signal::ctrl_c(), if !stopping => {
                result?;
                tracing::info!("interrupt received; stopping ticker");
                handles.ticker_stop.stop();
                stopping = true;
            }
        }
    }

    if let Some(value) = handles.countdown.join().await {
        tracing::info!(value, "countdown terminated");
    }
    Ok(())
}
