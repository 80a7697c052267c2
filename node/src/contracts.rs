// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Compiled contract bytecode.

use std::path::Path;

use alloy_primitives::hex;
use snapcheck_core::Bytes;

use crate::errors::{HarnessError, HarnessResult};

pub const STRING_STORAGE_BIN: &str = "StringStorage.bin";
pub const DEPLOY_ANOTHER_BIN: &str = "DeployAnotherContract.bin";

/// Creation bytecode of the two contracts the workload deploys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifacts {
    /// Stores one string; constructor takes the initial value.
    pub string_storage: Bytes,
    /// Deploys a nested string store from `deploy(string)` and emits
    /// `NewString(address)`.
    pub deploy_another: Bytes,
}

impl ContractArtifacts {
    pub fn new(string_storage: impl Into<Bytes>, deploy_another: impl Into<Bytes>) -> Self {
        Self {
            string_storage: string_storage.into(),
            deploy_another: deploy_another.into(),
        }
    }

    /// Read the hex-encoded `.bin` files from `dir`.
    pub fn load(dir: &Path) -> HarnessResult<Self> {
        Ok(Self {
            string_storage: read_bin(&dir.join(STRING_STORAGE_BIN))?,
            deploy_another: read_bin(&dir.join(DEPLOY_ANOTHER_BIN))?,
        })
    }
}

fn read_bin(path: &Path) -> HarnessResult<Bytes> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| HarnessError::Artifact(format!("{}: {}", path.display(), e)))?;
    let text = text.trim();
    let text = text.strip_prefix("0x").unwrap_or(text);
    if text.is_empty() {
        return Err(HarnessError::Artifact(format!("{} is empty", path.display())));
    }
    hex::decode(text)
        .map(Bytes::from)
        .map_err(|e| HarnessError::Artifact(format!("{}: {}", path.display(), e)))
}
