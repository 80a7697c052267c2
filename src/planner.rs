// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Randomized decisions behind each workload step.
//!
//! The planner only rolls dice; it never talks to the node. Execution order
//! of the rolls matters for reproducibility, so callers must consult it in
//! the same order for a given seed to replay a run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{FRACTION_DIGITS_RANGE, MAX_STRING_LEN, STRING_ALPHABET, TOPUP_UNITS_RANGE};
use crate::types::{fractional_units, units, U256};

#[derive(Debug)]
pub struct WorkloadPlanner<R: Rng = StdRng> {
    rng: R,
}

impl WorkloadPlanner<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> WorkloadPlanner<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Index of the account acting in this iteration.
    pub fn pick_account(&mut self, active: usize) -> usize {
        self.rng.gen_range(0..active)
    }

    /// 1 in 2: send from the picked account, if it can afford to.
    pub fn wants_peer_transfer(&mut self) -> bool {
        self.rng.gen_range(0..2) == 0
    }

    /// Destination index and fractional amount of a peer transfer.
    /// The destination may be the sender itself.
    pub fn peer_transfer(&mut self, active: usize) -> (usize, U256) {
        let to = self.rng.gen_range(0..active);
        let digits = self.rng.gen_range(FRACTION_DIGITS_RANGE);
        (to, fractional_units(digits))
    }

    /// 1 in 4: whole units the root account sends to the picked account.
    pub fn root_topup(&mut self) -> Option<U256> {
        if self.rng.gen_range(0..4) != 0 {
            return None;
        }
        Some(units(self.rng.gen_range(TOPUP_UNITS_RANGE)))
    }

    /// 1 in 4: seed value for a fresh string-store deployment.
    pub fn string_deploy(&mut self) -> Option<String> {
        if self.rng.gen_range(0..4) != 0 {
            return None;
        }
        Some(self.random_string())
    }

    /// 1 in 8: deploy the self-deploying contract this round.
    pub fn wants_nested_deploy(&mut self) -> bool {
        self.rng.gen_range(0..8) == 0
    }

    /// 1 in 3 per tracked contract: replacement value.
    pub fn string_update(&mut self) -> Option<String> {
        if self.rng.gen_range(0..3) != 0 {
            return None;
        }
        Some(self.random_string())
    }

    /// Alphanumeric string with length in `0..MAX_STRING_LEN`.
    pub fn random_string(&mut self) -> String {
        let len = self.rng.gen_range(0..MAX_STRING_LEN);
        (0..len)
            .map(|_| STRING_ALPHABET[self.rng.gen_range(0..STRING_ALPHABET.len())] as char)
            .collect()
    }
}
