// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Expected-state mirror and the frozen reference snapshot.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoreError, CoreResult};
use crate::gateway::RpcGateway;
use crate::types::{Address, U256};

/// Expected view of everything the harness wrote.
///
/// The harness is the only writer of contract storage, so the last value it
/// wrote is the value the chain holds. Balances are not mirrored; they are
/// read live, once, at capture time.
#[derive(Debug, Default)]
pub struct StateOracle {
    strings: BTreeMap<Address, String>,
    captured: bool,
}

impl StateOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_string(&mut self, contract: Address, value: String) {
        self.strings.insert(contract, value);
    }

    pub fn tracked_strings(&self) -> &BTreeMap<Address, String> {
        &self.strings
    }

    /// Tracked contract addresses, detached from the map so callers can
    /// record while iterating.
    pub fn tracked_contracts(&self) -> Vec<Address> {
        self.strings.keys().copied().collect()
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Query each address's live balance once and freeze the result,
    /// together with the current tracked strings, into a reference snapshot.
    pub async fn capture_balances<G>(
        &mut self,
        addresses: &[Address],
        gateway: &G,
    ) -> CoreResult<ReferenceSnapshot>
    where
        G: RpcGateway + ?Sized,
    {
        if self.captured {
            return Err(CoreError::AlreadyCaptured);
        }

        let mut seen = BTreeSet::new();
        let mut balances = Vec::with_capacity(addresses.len());
        for address in addresses {
            if !seen.insert(*address) {
                continue;
            }
            let balance = gateway.get_balance(*address).await?;
            balances.push((*address, balance));
        }

        Ok(self.freeze(balances))
    }

    fn freeze(&mut self, balances: Vec<(Address, U256)>) -> ReferenceSnapshot {
        self.captured = true;
        ReferenceSnapshot {
            balances,
            strings: self.strings.clone(),
        }
    }
}

/// Expected post-restore state. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSnapshot {
    balances: Vec<(Address, U256)>,
    strings: BTreeMap<Address, String>,
}

impl ReferenceSnapshot {
    /// Captured balances in capture order.
    pub fn balances(&self) -> &[(Address, U256)] {
        &self.balances
    }

    pub fn strings(&self) -> &BTreeMap<Address, String> {
        &self.strings
    }

    pub fn balance_of(&self, address: &Address) -> Option<U256> {
        self.balances
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, b)| *b)
    }
}
