// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Fixed-answer gateway for exercising read paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::abi::{encode_strings, GET_STRING};
use crate::error::{RpcError, RpcResult};
use crate::gateway::RpcGateway;
use crate::oracle::{ReferenceSnapshot, StateOracle};
use crate::types::{Address, Bytes, Receipt, TxHash, U256};

#[derive(Debug, Default)]
pub struct FixedGateway {
    pub balances: BTreeMap<Address, U256>,
    pub strings: BTreeMap<Address, String>,
    /// Raw `getString` answers that take precedence over `strings`.
    pub return_data: BTreeMap<Address, Bytes>,
    /// Fail every balance query with a transport error.
    pub offline: bool,
    pub balance_queries: AtomicUsize,
}

impl FixedGateway {
    pub fn with_balance(mut self, address: Address, balance: U256) -> Self {
        self.balances.insert(address, balance);
        self
    }

    pub fn with_string(mut self, address: Address, value: &str) -> Self {
        self.strings.insert(address, value.to_string());
        self
    }

    pub fn with_return_data(mut self, address: Address, data: Bytes) -> Self {
        self.return_data.insert(address, data);
        self
    }

    pub fn queries(&self) -> usize {
        self.balance_queries.load(Ordering::SeqCst)
    }
}

/// Reference captured live from a gateway holding `balances`, with
/// `strings` as the last values written.
pub async fn captured_reference(balances: &[(Address, U256)], strings: &[(Address, &str)]) -> ReferenceSnapshot {
    let mut oracle = StateOracle::new();
    for (contract, value) in strings {
        oracle.record_string(*contract, value.to_string());
    }
    let mut live = FixedGateway::default();
    for (address, balance) in balances {
        live = live.with_balance(*address, *balance);
    }
    let addresses: Vec<Address> = balances.iter().map(|(a, _)| *a).collect();
    oracle.capture_balances(&addresses, &live).await.unwrap()
}

fn unsupported<T>() -> RpcResult<T> {
    Err(RpcError::Transport("unsupported by FixedGateway".into()))
}

#[async_trait]
impl RpcGateway for FixedGateway {
    async fn get_balance(&self, address: Address) -> RpcResult<U256> {
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(RpcError::Transport("connection refused".into()));
        }
        Ok(self.balances.get(&address).copied().unwrap_or_default())
    }

    async fn send_value(&self, _: Address, _: Address, _: U256) -> RpcResult<TxHash> {
        unsupported()
    }

    async fn deploy_contract(&self, _: Address, _: &[u8], _: &[&str], _: u64) -> RpcResult<Address> {
        unsupported()
    }

    async fn transact_contract(
        &self,
        _: Address,
        _: Address,
        _: &str,
        _: &[&str],
        _: u64,
    ) -> RpcResult<Receipt> {
        unsupported()
    }

    async fn call_contract(&self, contract: Address, method: &str, _: &[&str]) -> RpcResult<Bytes> {
        assert_eq!(method, GET_STRING);
        if let Some(data) = self.return_data.get(&contract) {
            return Ok(data.clone());
        }
        Ok(match self.strings.get(&contract) {
            Some(value) => Bytes::from(encode_strings(&[value.as_str()])),
            None => Bytes::new(),
        })
    }

    async fn fund_from_faucet(&self, _: Address, _: U256) -> RpcResult<TxHash> {
        unsupported()
    }

    async fn faucet_account(&self) -> RpcResult<Address> {
        unsupported()
    }

    async fn new_account(&self) -> RpcResult<Address> {
        unsupported()
    }
}
