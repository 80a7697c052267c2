// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use snapcheck_core::config::WorkloadParams;

use crate::errors::{HarnessError, HarnessResult};

/// How the node-under-test is launched for a given phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    Normal,
    SaveSnapshot(PathBuf),
    LoadSnapshot(PathBuf),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub node_binary: PathBuf,
    /// Arguments selecting the single-validator test network.
    pub node_args: Vec<String>,
    pub datadir: PathBuf,
    /// Kept outside `datadir` so accounts stay signable after the wipe.
    pub keystore: Option<PathBuf>,
    /// Defaults to `<datadir>/opera.ipc`.
    pub ipc_path: Option<PathBuf>,
    pub snapshot_file: PathBuf,
    /// Directory holding `StringStorage.bin` and `DeployAnotherContract.bin`.
    pub contracts_dir: PathBuf,
    pub faucet_password: String,
    pub account_password: String,
    pub seed: Option<u64>,
    pub workload: WorkloadParams,
    pub settle: SettleConfig,
    pub post_restore_probe: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            node_binary: PathBuf::from("../../build/opera"),
            node_args: vec!["--nousb".into(), "--fakenet".into(), "1/1".into()],
            datadir: PathBuf::from("snapshot-test-data"),
            keystore: Some(PathBuf::from("snapshot-test-keystore")),
            ipc_path: None,
            snapshot_file: PathBuf::from("snapshot-test-file"),
            contracts_dir: PathBuf::from("./contracts/StringStorage"),
            faucet_password: "fakepassword".into(),
            account_password: String::new(),
            seed: None,
            workload: WorkloadParams::default(),
            settle: SettleConfig::default(),
            post_restore_probe: true,
        }
    }
}

impl HarnessConfig {
    /// Load from a JSON file; absent fields keep their defaults.
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let raw = std::fs::read(path)?;
        serde_json::from_slice(&raw)
            .map_err(|e| HarnessError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn ipc_path(&self) -> PathBuf {
        self.ipc_path
            .clone()
            .unwrap_or_else(|| self.datadir.join("opera.ipc"))
    }

    /// Full argument list for one launch of the node.
    pub fn launch_args(&self, mode: &LaunchMode) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.node_args.iter().map(OsString::from).collect();
        args.push("--datadir".into());
        args.push(self.datadir.clone().into_os_string());
        if let Some(keystore) = &self.keystore {
            args.push("--keystore".into());
            args.push(keystore.clone().into_os_string());
        }
        match mode {
            LaunchMode::Normal => {}
            LaunchMode::SaveSnapshot(file) => {
                args.push("--save-snapshot".into());
                args.push(file.clone().into_os_string());
            }
            LaunchMode::LoadSnapshot(file) => {
                args.push("--load-snapshot".into());
                args.push(file.clone().into_os_string());
            }
        }
        args
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.workload.inner_iterations > 0 && self.workload.rounds == 0 {
            tracing::warn!("inner_iterations set but rounds is 0; no transfers will run");
        }
        let datadir = normalize(&self.datadir);
        if let Some(keystore) = &self.keystore {
            if normalize(keystore).starts_with(&datadir) {
                return Err(HarnessError::Config(format!(
                    "keystore {} lies inside datadir {} and would be wiped",
                    keystore.display(),
                    self.datadir.display()
                )));
            }
        }
        if normalize(&self.snapshot_file).starts_with(&datadir) {
            return Err(HarnessError::Config(format!(
                "snapshot file {} lies inside datadir {} and would be wiped",
                self.snapshot_file.display(),
                self.datadir.display()
            )));
        }
        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` resolved lexically. Symlinks
/// are not followed since the paths need not exist yet.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Fixed waits standing in for confirmation and completion signals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    /// Time for block production to include the round's transactions.
    pub block_ms: u64,
    /// Grace period after launch before the IPC socket is used.
    pub startup_ms: u64,
    /// Dwell after launching with `--save-snapshot`.
    pub snapshot_write_ms: u64,
    pub exit_poll_ms: u64,
    pub faucet_poll_ms: u64,
    pub receipt_poll_ms: u64,
    pub receipt_attempts: u32,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            block_ms: 1_500,
            startup_ms: 15_000,
            snapshot_write_ms: 30_000,
            exit_poll_ms: 1_000,
            faucet_poll_ms: 1_000,
            receipt_poll_ms: 500,
            receipt_attempts: 1_500,
        }
    }
}

impl SettleConfig {
    /// No waiting at all; for in-process backends.
    pub fn immediate() -> Self {
        Self {
            block_ms: 0,
            startup_ms: 0,
            snapshot_write_ms: 0,
            exit_poll_ms: 0,
            faucet_poll_ms: 0,
            receipt_poll_ms: 0,
            receipt_attempts: 1,
        }
    }

    pub fn exit_poll(&self) -> Duration {
        Duration::from_millis(self.exit_poll_ms)
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }
}
