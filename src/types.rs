// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger value types shared by every crate in the workspace.

use alloy_consensus::{Eip658Value, Receipt as ConsensusReceipt, ReceiptEnvelope, ReceiptWithBloom};
use alloy_primitives::Bloom;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use alloy_rpc_types_eth::{Log, TransactionReceipt};

pub type TxHash = B256;

/// Wei in one whole unit of the native currency.
pub const WEI_PER_UNIT: u128 = 1_000_000_000_000_000_000;

const UNIT_DECIMALS: u32 = 18;

/// `n` whole units, in wei.
pub fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(WEI_PER_UNIT)
}

/// The amount written as the decimal string `0.<digits>` units, in wei.
///
/// `fractional_units(5)` is 0.5 units and `fractional_units(12)` is 0.12 units,
/// matching how a human would type the amount.
pub fn fractional_units(digits: u32) -> U256 {
    if digits == 0 {
        return U256::ZERO;
    }
    let width = digits.ilog10() + 1;
    let scale = 10u128.pow(UNIT_DECIMALS.saturating_sub(width));
    U256::from(digits) * U256::from(scale)
}

/// Receipt of an included transaction: the node's full JSON-RPC receipt.
pub type Receipt = TransactionReceipt;

/// Logs carried by `receipt`.
pub fn receipt_logs(receipt: &Receipt) -> &[Log] {
    receipt.inner.logs()
}

/// A log emitted by `address`, with no block metadata attached.
pub fn event_log(address: Address, topics: Vec<B256>, data: Bytes) -> Log {
    Log {
        inner: alloy_primitives::Log::new_unchecked(address, topics, data),
        ..Default::default()
    }
}

/// Successful legacy receipt for a transaction executed in-process, where no
/// block exists to report.
pub fn included_receipt(
    transaction_hash: TxHash,
    from: Address,
    to: Option<Address>,
    contract_address: Option<Address>,
    logs: Vec<Log>,
) -> Receipt {
    let receipt = ConsensusReceipt {
        status: Eip658Value::Eip658(true),
        cumulative_gas_used: 0,
        logs,
    };
    TransactionReceipt {
        inner: ReceiptEnvelope::Legacy(ReceiptWithBloom { receipt, logs_bloom: Bloom::ZERO }),
        transaction_hash,
        transaction_index: None,
        block_hash: None,
        block_number: None,
        gas_used: 0,
        effective_gas_price: 0,
        blob_gas_used: None,
        blob_gas_price: None,
        from,
        to,
        contract_address,
        authorization_list: None,
    }
}

/// Keccak-256, as used for selectors and event topics.
pub fn keccak(bytes: &[u8]) -> B256 {
    alloy_primitives::keccak256(bytes)
}
