// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Post-restore equivalence check against the reference snapshot.

use core::fmt;

use alloy_primitives::hex;
use serde::Serialize;

use crate::abi::{decode_string, GET_STRING};
use crate::error::CoreResult;
use crate::gateway::RpcGateway;
use crate::oracle::ReferenceSnapshot;
use crate::types::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MismatchKind {
    Balance,
    String,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchKind::Balance => f.write_str("balance"),
            MismatchKind::String => f.write_str("string"),
        }
    }
}

/// First observed divergence between restored and reference state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub address: Address,
    pub expected: String,
    pub observed: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mismatch at {}: expected {:?}, observed {:?}",
            self.kind, self.address, self.expected, self.observed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed { balances: usize, strings: usize },
    Failed(Mismatch),
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed { .. })
    }
}

/// Placeholder for a contract that answered with no return data at all.
pub const EMPTY_RETURN: &str = "<no return data>";

/// Start of the observed value for return data that is not an ABI string.
pub const UNDECODABLE_PREFIX: &str = "<undecodable ";

/// Compare every reference balance, then every reference string, against the
/// live node. Stops at the first mismatch.
///
/// An RPC failure aborts the check with an error; it is never reported as a
/// mismatch. A contract that returns nothing (its code is gone) or returns
/// something other than a string is a string mismatch.
pub async fn verify_reference<G>(reference: &ReferenceSnapshot, gateway: &G) -> CoreResult<Verdict>
where
    G: RpcGateway + ?Sized,
{
    for (address, expected) in reference.balances() {
        let observed = gateway.get_balance(*address).await?;
        if observed != *expected {
            return Ok(Verdict::Failed(Mismatch {
                kind: MismatchKind::Balance,
                address: *address,
                expected: expected.to_string(),
                observed: observed.to_string(),
            }));
        }
    }

    for (address, expected) in reference.strings() {
        let data = gateway.call_contract(*address, GET_STRING, &[]).await?;
        let observed = if data.is_empty() {
            EMPTY_RETURN.to_string()
        } else {
            decode_string(&data)
                .unwrap_or_else(|_| format!("{}{}>", UNDECODABLE_PREFIX, hex::encode_prefixed(&data)))
        };
        if observed != *expected {
            return Ok(Verdict::Failed(Mismatch {
                kind: MismatchKind::String,
                address: *address,
                expected: expected.clone(),
                observed,
            }));
        }
    }

    Ok(Verdict::Passed {
        balances: reference.balances().len(),
        strings: reference.strings().len(),
    })
}
