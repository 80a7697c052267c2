// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Fixed-duration waits.
//!
//! Every place the harness waits without an observable signal goes through
//! [`Settler::settle`], so the waits can be swapped for real confirmations
//! without touching call sites.

use std::time::Duration;

use crate::config::SettleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleReason {
    /// Let block production pick up submitted transactions.
    BlockInclusion,
    /// Wait before re-checking the faucet's balance.
    FaucetPoll,
    /// Let a freshly launched node open its IPC socket.
    NodeStartup,
    /// Let a `--save-snapshot` launch finish writing the file.
    SnapshotWrite,
}

#[derive(Debug, Clone)]
pub struct Settler {
    config: SettleConfig,
}

impl Settler {
    pub fn new(config: SettleConfig) -> Self {
        Self { config }
    }

    pub fn duration(&self, reason: SettleReason) -> Duration {
        let ms = match reason {
            SettleReason::BlockInclusion => self.config.block_ms,
            SettleReason::FaucetPoll => self.config.faucet_poll_ms,
            SettleReason::NodeStartup => self.config.startup_ms,
            SettleReason::SnapshotWrite => self.config.snapshot_write_ms,
        };
        Duration::from_millis(ms)
    }

    pub async fn settle(&self, reason: SettleReason) {
        let wait = self.duration(reason);
        if wait.is_zero() {
            return;
        }
        tracing::debug!(?reason, ?wait, "settling");
        tokio::time::sleep(wait).await;
    }
}
