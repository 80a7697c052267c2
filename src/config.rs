// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Workload constants and tunables.

use serde::{Deserialize, Serialize};

use crate::types::{units, U256};

/// Rounds the workload runs before the reference state is captured.
pub const ROUNDS: u32 = 30;

/// Account selections per round.
pub const INNER_ITERATIONS: u32 = 20;

/// Whole units an account must strictly exceed before it may send a peer transfer.
pub const TRANSFER_THRESHOLD_UNITS: u64 = 1;

/// Random strings are drawn with length in `0..MAX_STRING_LEN`.
pub const MAX_STRING_LEN: usize = 96;

pub const STRING_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Fractional transfers send `0.<k>` units with `k` in this half-open range.
pub const FRACTION_DIGITS_RANGE: core::ops::Range<u32> = 1..98;

/// Root top-ups send this many whole units (half-open).
pub const TOPUP_UNITS_RANGE: core::ops::Range<u64> = 1..5;

// Gas limits handed to the node for each kind of submission.
pub const TRANSFER_GAS: u64 = 21_000;
pub const STRING_DEPLOY_GAS: u64 = 500_000;
pub const DAC_DEPLOY_GAS: u64 = 1_000_000;
pub const NESTED_DEPLOY_GAS: u64 = 800_000;
pub const STRING_UPDATE_GAS: u64 = 300_000;

/// Shape of one workload run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadParams {
    pub rounds: u32,
    pub inner_iterations: u32,
    /// Strict lower bound (wei) on the live balance of a peer-transfer source.
    pub transfer_threshold: U256,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            rounds: ROUNDS,
            inner_iterations: INNER_ITERATIONS,
            transfer_threshold: units(TRANSFER_THRESHOLD_UNITS),
        }
    }
}
