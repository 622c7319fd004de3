//! Live sync: a periodic wait/proceed heartbeat pushed to every connected viewer.

use std::time::Duration;

use actix_web::web;
use anyhow::ensure;
use clap::Args;
use tokio_util::sync::CancellationToken;

pub use broadcaster::{Broadcaster, Subscription, TickReport};
pub use viewer::{serve_viewer, ViewerDeadlines, ViewerExit, ViewerTransport};

mod broadcaster;
mod pause;
mod viewer;
mod web_socket;

#[cfg(test)]
mod tests;

#[derive(Args, Clone, Debug)]
pub struct SyncOpts {
    /// Interval between two heartbeat frames, in milliseconds
    #[clap(long, env, default_value = "500")]
    pub sync_tick_ms: u64,

    /// Frames buffered per viewer before further frames are dropped for that viewer
    #[clap(long, env, default_value = "16")]
    pub sync_queue_capacity: usize,

    /// Deadline for delivering the initial `sub` frame, in milliseconds
    #[clap(long, env, default_value = "1000")]
    pub sync_subscribe_timeout_ms: u64,

    /// Deadline for delivering any later frame, in milliseconds
    #[clap(long, env, default_value = "5000")]
    pub sync_send_timeout_ms: u64,
}

impl SyncOpts {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.sync_tick_ms > 0, "--sync-tick-ms must be greater than zero");
        ensure!(self.sync_queue_capacity > 0, "--sync-queue-capacity must be greater than zero");
        ensure!(self.sync_subscribe_timeout_ms > 0,
                "--sync-subscribe-timeout-ms must be greater than zero");
        ensure!(self.sync_send_timeout_ms > 0, "--sync-send-timeout-ms must be greater than zero");

        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.sync_tick_ms)
    }

    pub fn deadlines(&self) -> ViewerDeadlines {
        ViewerDeadlines { subscribe: Duration::from_millis(self.sync_subscribe_timeout_ms),
                          send:      Duration::from_millis(self.sync_send_timeout_ms), }
    }
}

/// Everything the live-sync routes need, shared as app data.
#[derive(Clone)]
pub struct LiveSync {
    pub broadcaster: Broadcaster,
    pub deadlines:   ViewerDeadlines,
    /// Cancelled when the server shuts down; every viewer runs on a child of it.
    pub shutdown:    CancellationToken,
}

impl LiveSync {
    pub fn new(opts: &SyncOpts, shutdown: CancellationToken) -> Self {
        Self { broadcaster: Broadcaster::new(opts.sync_queue_capacity),
               deadlines: opts.deadlines(),
               shutdown }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    web_socket::configure(cfg);
    pause::configure(cfg);
}
