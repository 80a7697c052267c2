// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

use crate::lifecycle::Phase;
use crate::types::TxHash;

/// Failures crossing the node's RPC boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON-RPC error (code {code}): {message}")]
    JsonRpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Transaction {0} reverted")]
    Reverted(TxHash),

    #[error("No receipt for transaction {hash} after {attempts} polls")]
    ReceiptTimeout { hash: TxHash, attempts: u32 },
}

pub type RpcResult<T> = core::result::Result<T, RpcError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Balances may be frozen into the reference snapshot only once.
    #[error("Reference balances already captured")]
    AlreadyCaptured,

    #[error("Illegal phase transition {from} -> {to}")]
    IllegalTransition { from: Phase, to: Phase },

    #[error("ABI decode error: {0}")]
    Abi(String),
}

pub type CoreResult<T> = core::result::Result<T, CoreError>;
