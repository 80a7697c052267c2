// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The capability set the harness needs from a running node.

use async_trait::async_trait;

use crate::error::RpcResult;
use crate::types::{Address, Bytes, Receipt, TxHash, U256};

/// Balance queries, transaction submission and contract access against one
/// node instance.
///
/// A gateway is bound to a single process lifetime; after a restart the
/// caller obtains a fresh one. Submissions resolve only once the transaction
/// has been included and succeeded.
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// Live balance of `address` in wei, read against the pending state.
    async fn get_balance(&self, address: Address) -> RpcResult<U256>;

    async fn send_value(&self, from: Address, to: Address, amount: U256) -> RpcResult<TxHash>;

    /// Deploy `code` with string constructor arguments, returning the new
    /// contract's address.
    async fn deploy_contract(
        &self,
        from: Address,
        code: &[u8],
        args: &[&str],
        gas: u64,
    ) -> RpcResult<Address>;

    /// State-changing call of `method` (canonical signature) on `contract`.
    async fn transact_contract(
        &self,
        from: Address,
        contract: Address,
        method: &str,
        args: &[&str],
        gas: u64,
    ) -> RpcResult<Receipt>;

    /// Read-only call of `method`; returns raw ABI return data.
    async fn call_contract(&self, contract: Address, method: &str, args: &[&str])
        -> RpcResult<Bytes>;

    /// Transfer from the node's pre-funded account.
    async fn fund_from_faucet(&self, to: Address, amount: U256) -> RpcResult<TxHash>;

    /// The node's pre-funded (coinbase) account.
    async fn faucet_account(&self) -> RpcResult<Address>;

    /// Create a fresh signable account and return its address.
    async fn new_account(&self) -> RpcResult<Address>;
}
