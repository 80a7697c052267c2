// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! snapcheck-core: the harness-side model of a ledger snapshot cycle.
//!
//! Holds everything that does not touch a live process: the RPC capability
//! trait, the state oracle and its frozen reference snapshot, the randomized
//! workload planner, the lifecycle phase tracker and the post-restore
//! equivalence check.

pub mod abi;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod oracle;
pub mod planner;
pub mod types;
pub mod verify;

pub use error::{CoreError, CoreResult, RpcError, RpcResult};
pub use gateway::RpcGateway;
pub use lifecycle::{Phase, PhaseTracker};
pub use oracle::{ReferenceSnapshot, StateOracle};
pub use planner::WorkloadPlanner;
pub use types::{Address, Bytes, Log, Receipt, TxHash, B256, U256};
pub use verify::{verify_reference, Mismatch, MismatchKind, Verdict};

#[cfg(test)]
pub mod tests;
