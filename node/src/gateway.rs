// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! `RpcGateway` over Ethereum-style JSON-RPC.
//!
//! Transactions are signed by the node from its keystore
//! (`personal_sendTransaction`), then followed to their receipt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use snapcheck_core::abi::{encode_call, encode_strings};
use snapcheck_core::config::TRANSFER_GAS;
use snapcheck_core::{Address, Bytes, Receipt, RpcError, RpcGateway, RpcResult, TxHash, U256};
use tokio::sync::OnceCell;

use crate::config::{HarnessConfig, SettleConfig};
use crate::transport::{JsonRpcRequest, Transport};

/// Block tag for reads: include transactions not yet finalized.
const PENDING: &str = "pending";

pub struct EthGateway<T: Transport> {
    transport: T,
    faucet_password: String,
    account_password: String,
    receipt_poll: Duration,
    receipt_attempts: u32,
    next_id: AtomicU64,
    faucet: OnceCell<Address>,
}

impl<T: Transport> EthGateway<T> {
    pub fn new(transport: T, config: &HarnessConfig) -> Self {
        Self::with_settings(
            transport,
            config.faucet_password.clone(),
            config.account_password.clone(),
            &config.settle,
        )
    }

    pub fn with_settings(
        transport: T,
        faucet_password: String,
        account_password: String,
        settle: &SettleConfig,
    ) -> Self {
        Self {
            transport,
            faucet_password,
            account_password,
            receipt_poll: settle.receipt_poll(),
            receipt_attempts: settle.receipt_attempts.max(1),
            next_id: AtomicU64::new(1),
            faucet: OnceCell::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn request<R: DeserializeOwned>(&self, method: &str, params: Value) -> RpcResult<R> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(method, params, id);
        tracing::trace!(method, id, "rpc request");

        let resp = self.transport.send(&req).await?;
        if let Some(err) = resp.error {
            return Err(RpcError::JsonRpc { code: err.code, message: err.message });
        }
        if resp.id != id {
            return Err(RpcError::InvalidResponse(format!(
                "{}: response id {} for request {}",
                method, resp.id, id
            )));
        }
        serde_json::from_value(resp.result.unwrap_or(Value::Null))
            .map_err(|e| RpcError::InvalidResponse(format!("{}: {}", method, e)))
    }

    /// Submit a node-signed transaction and wait for a successful receipt.
    async fn submit(&self, tx: Value, password: &str) -> RpcResult<Receipt> {
        let hash: TxHash = self
            .request("personal_sendTransaction", json!([tx, password]))
            .await?;
        tracing::debug!(%hash, "transaction submitted");

        for attempt in 0..self.receipt_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.receipt_poll).await;
            }
            let receipt: Option<Receipt> = self
                .request("eth_getTransactionReceipt", json!([hash]))
                .await?;
            if let Some(receipt) = receipt {
                if !receipt.status() {
                    return Err(RpcError::Reverted(hash));
                }
                return Ok(receipt);
            }
        }
        Err(RpcError::ReceiptTimeout { hash, attempts: self.receipt_attempts })
    }

    async fn password_for(&self, from: Address) -> RpcResult<&str> {
        if from == self.faucet_account().await? {
            Ok(&self.faucet_password)
        } else {
            Ok(&self.account_password)
        }
    }
}

fn gas_hex(gas: u64) -> String {
    format!("{:#x}", gas)
}

#[async_trait]
impl<T: Transport> RpcGateway for EthGateway<T> {
    async fn get_balance(&self, address: Address) -> RpcResult<U256> {
        self.request("eth_getBalance", json!([address, PENDING])).await
    }

    async fn send_value(&self, from: Address, to: Address, amount: U256) -> RpcResult<TxHash> {
        let tx = json!({ "from": from, "to": to, "value": amount, "gas": gas_hex(TRANSFER_GAS) });
        let password = self.password_for(from).await?;
        let receipt = self.submit(tx, password).await?;
        Ok(receipt.transaction_hash)
    }

    async fn deploy_contract(
        &self,
        from: Address,
        code: &[u8],
        args: &[&str],
        gas: u64,
    ) -> RpcResult<Address> {
        let mut data = code.to_vec();
        data.extend_from_slice(&encode_strings(args));
        let tx = json!({ "from": from, "data": Bytes::from(data), "gas": gas_hex(gas) });
        let password = self.password_for(from).await?;
        let receipt = self.submit(tx, password).await?;
        receipt.contract_address.ok_or_else(|| {
            RpcError::InvalidResponse(format!(
                "deployment {} has no contract address",
                receipt.transaction_hash
            ))
        })
    }

    async fn transact_contract(
        &self,
        from: Address,
        contract: Address,
        method: &str,
        args: &[&str],
        gas: u64,
    ) -> RpcResult<Receipt> {
        let data = Bytes::from(encode_call(method, args));
        let tx = json!({ "from": from, "to": contract, "data": data, "gas": gas_hex(gas) });
        let password = self.password_for(from).await?;
        self.submit(tx, password).await
    }

    async fn call_contract(
        &self,
        contract: Address,
        method: &str,
        args: &[&str],
    ) -> RpcResult<Bytes> {
        let data = Bytes::from(encode_call(method, args));
        self.request("eth_call", json!([{ "to": contract, "data": data }, PENDING]))
            .await
    }

    async fn fund_from_faucet(&self, to: Address, amount: U256) -> RpcResult<TxHash> {
        let faucet = self.faucet_account().await?;
        self.send_value(faucet, to, amount).await
    }

    async fn faucet_account(&self) -> RpcResult<Address> {
        self.faucet
            .get_or_try_init(|| async {
                let accounts: Vec<Address> = self.request("eth_accounts", json!([])).await?;
                accounts
                    .first()
                    .copied()
                    .ok_or_else(|| RpcError::InvalidResponse("node reports no accounts".into()))
            })
            .await
            .copied()
    }

    async fn new_account(&self) -> RpcResult<Address> {
        self.request("personal_newAccount", json!([self.account_password])).await
    }
}
