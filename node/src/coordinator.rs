// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Snapshot-cycle coordination.
//!
//! Drives one node through:
//! RUNNING → CAPTURING → STOPPING_1 → SNAPSHOTTING → STOPPING_2 → WIPING →
//! RESTORING → VERIFYING → (PROBING) → PASSED | FAILED.
//!
//! Phases never overlap: each stop blocks until the process exit is
//! observed before the next launch.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use rand::rngs::StdRng;
use serde::Serialize;
use snapcheck_core::types::fractional_units;
use snapcheck_core::{
    verify_reference, Address, Mismatch, Phase, PhaseTracker, RpcGateway, StateOracle, TxHash,
    Verdict, WorkloadPlanner,
};

use crate::backend::NodeBackend;
use crate::config::{HarnessConfig, LaunchMode};
use crate::contracts::ContractArtifacts;
use crate::errors::{HarnessResult, PhaseContext};
use crate::settle::{SettleReason, Settler};
use crate::telemetry::PHASE_DURATION;
use crate::workload::{WorkloadEngine, WorkloadSummary};

/// Digits of the probe transfer amount: 0.1 units.
const PROBE_DIGITS: u32 = 1;

/// The transfer submitted after a successful restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeTransfer {
    pub from: Address,
    pub to: Address,
    pub hash: TxHash,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub workload: WorkloadSummary,
    /// Generated accounts that submitted before the snapshot.
    pub senders: Vec<Address>,
    pub balances_checked: usize,
    pub strings_checked: usize,
    /// Post-restore transfer, when one was submitted.
    pub probe: Option<ProbeTransfer>,
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Passed(RunReport),
    Failed { mismatch: Mismatch, report: RunReport },
}

impl RunOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, RunOutcome::Passed(_))
    }

    pub fn report(&self) -> &RunReport {
        match self {
            RunOutcome::Passed(report) => report,
            RunOutcome::Failed { report, .. } => report,
        }
    }

    /// Process exit code: 0 on pass, 1 on a detected mismatch.
    pub fn exit_code(&self) -> i32 {
        if self.is_passed() {
            0
        } else {
            1
        }
    }
}

pub struct SnapshotCoordinator<B: NodeBackend> {
    backend: B,
    config: HarnessConfig,
    artifacts: ContractArtifacts,
    settler: Settler,
    tracker: PhaseTracker,
    phase_started: Instant,
}

impl<B: NodeBackend> SnapshotCoordinator<B> {
    pub fn new(backend: B, config: HarnessConfig, artifacts: ContractArtifacts) -> Self {
        let settler = Settler::new(config.settle.clone());
        Self {
            backend,
            config,
            artifacts,
            settler,
            tracker: PhaseTracker::new(),
            phase_started: Instant::now(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.tracker.current()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run the whole cycle once.
    ///
    /// `Ok` carries the verdict; `Err` means the run was aborted (RPC,
    /// process or filesystem failure) and says nothing about the node's
    /// snapshot support.
    pub async fn run(mut self) -> HarnessResult<RunOutcome> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        tracing::info!(seed, rounds = self.config.workload.rounds, "Starting snapshot cycle");

        self.preflight().await.during(Phase::Running)?;

        // RUNNING
        self.backend.launch(&LaunchMode::Normal).await.during(Phase::Running)?;
        let gateway = self.reconnect().await.during(Phase::Running)?;

        let mut oracle = StateOracle::new();
        let mut engine = WorkloadEngine::new(
            WorkloadPlanner::<StdRng>::seeded(seed),
            self.config.workload.clone(),
            self.artifacts.clone(),
            self.settler.clone(),
        );
        engine.bootstrap(&gateway).await.during(Phase::Running)?;
        let summary = engine.run(&gateway, &mut oracle).await.during(Phase::Running)?;
        tracing::info!(?summary, "Workload finished");

        // CAPTURING
        self.enter(Phase::Capturing)?;
        let addresses = engine.balance_addresses();
        let reference = oracle
            .capture_balances(&addresses, &gateway)
            .await
            .during(Phase::Capturing)?;
        tracing::info!(
            balances = reference.balances().len(),
            strings = reference.strings().len(),
            "Reference state captured"
        );
        drop(gateway);

        // STOPPING_1
        self.enter(Phase::Stopping1)?;
        self.backend.stop().await.during(Phase::Stopping1)?;

        // SNAPSHOTTING
        self.enter(Phase::Snapshotting)?;
        let snapshot = LaunchMode::SaveSnapshot(self.config.snapshot_file.clone());
        self.backend.launch(&snapshot).await.during(Phase::Snapshotting)?;
        self.settler.settle(SettleReason::SnapshotWrite).await;

        // STOPPING_2
        self.enter(Phase::Stopping2)?;
        self.backend.stop().await.during(Phase::Stopping2)?;

        // WIPING
        self.enter(Phase::Wiping)?;
        let datadir = self.backend.datadir().to_path_buf();
        remove_dir_if_present(&datadir).await.during(Phase::Wiping)?;
        tracing::info!(datadir = %datadir.display(), "Data directory wiped");

        // RESTORING
        self.enter(Phase::Restoring)?;
        let restore = LaunchMode::LoadSnapshot(self.config.snapshot_file.clone());
        self.backend.launch(&restore).await.during(Phase::Restoring)?;
        let gateway = self.reconnect().await.during(Phase::Restoring)?;

        // VERIFYING
        self.enter(Phase::Verifying)?;
        let verdict = verify_reference(&reference, &gateway)
            .await
            .during(Phase::Verifying)?;

        let (balances_checked, strings_checked) = match verdict {
            Verdict::Passed { balances, strings } => (balances, strings),
            Verdict::Failed(mismatch) => {
                tracing::error!(
                    kind = %mismatch.kind,
                    address = %mismatch.address,
                    expected = %mismatch.expected,
                    observed = %mismatch.observed,
                    "Restored state diverges from reference"
                );
                self.enter(Phase::Failed)?;
                drop(gateway);
                self.backend.stop().await.during(Phase::Failed)?;
                let report = self.report(seed, summary, &engine, 0, 0, None);
                return Ok(RunOutcome::Failed { mismatch, report });
            }
        };
        tracing::info!(balances_checked, strings_checked, "Restored state matches reference");

        // PROBING
        let mut probe = None;
        if self.config.post_restore_probe {
            self.enter(Phase::Probing)?;
            probe = self.probe(&gateway, &engine).await.during(Phase::Probing)?;
        }

        self.enter(Phase::Passed)?;
        drop(gateway);
        self.backend.stop().await.during(Phase::Passed)?;
        tracing::info!("Snapshot cycle passed");

        let report = self.report(seed, summary, &engine, balances_checked, strings_checked, probe);
        Ok(RunOutcome::Passed(report))
    }

    /// Remove leftovers of an earlier run so the first launch starts fresh.
    async fn preflight(&self) -> HarnessResult<()> {
        remove_dir_if_present(self.backend.datadir()).await?;
        match tokio::fs::remove_file(&self.config.snapshot_file).await {
            Ok(()) => tracing::info!(file = %self.config.snapshot_file.display(), "Removed stale snapshot"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn reconnect(&mut self) -> HarnessResult<B::Gateway> {
        self.settler.settle(SettleReason::NodeStartup).await;
        self.backend.connect().await
    }

    /// Submit one transfer from an account that already sent before the
    /// snapshot. Snapshots clear nonces, so this shows the restored node
    /// accepts a fresh nonce for an account with history.
    ///
    /// The root is tried first and pays the faucet; any other sender pays
    /// the root.
    async fn probe<G>(&self, gateway: &G, engine: &WorkloadEngine<StdRng>) -> HarnessResult<Option<ProbeTransfer>>
    where
        G: RpcGateway + ?Sized,
    {
        let (Some(root), Some(faucet)) = (engine.root(), engine.faucet()) else {
            return Ok(None);
        };
        let threshold = self.config.workload.transfer_threshold;

        let senders = engine.senders();
        let candidates = senders
            .iter()
            .filter(|a| **a == root)
            .chain(senders.iter().filter(|a| **a != root));

        let mut source: Option<Address> = None;
        for account in candidates {
            if gateway.get_balance(*account).await? > threshold {
                source = Some(*account);
                break;
            }
        }
        let Some(from) = source else {
            tracing::warn!(senders = senders.len(), "No prior sender above the transfer threshold; probe skipped");
            return Ok(None);
        };

        let to = if from == root { faucet } else { root };
        let hash = gateway.send_value(from, to, fractional_units(PROBE_DIGITS)).await?;
        tracing::info!(%from, %to, %hash, "Post-restore transfer accepted");
        Ok(Some(ProbeTransfer { from, to, hash }))
    }

    fn enter(&mut self, next: Phase) -> HarnessResult<()> {
        let previous = self.tracker.advance(next)?;
        let elapsed = self.phase_started.elapsed().as_secs_f64();
        metrics::histogram!(PHASE_DURATION, elapsed, "phase" => previous.as_str());
        self.phase_started = Instant::now();
        tracing::info!(from = %previous, to = %next, "Phase transition");
        Ok(())
    }

    fn report(
        &self,
        seed: u64,
        workload: WorkloadSummary,
        engine: &WorkloadEngine<StdRng>,
        balances_checked: usize,
        strings_checked: usize,
        probe: Option<ProbeTransfer>,
    ) -> RunReport {
        RunReport {
            seed,
            workload,
            senders: engine.senders().to_vec(),
            balances_checked,
            strings_checked,
            probe,
            phases: self.tracker.history().to_vec(),
        }
    }
}

async fn remove_dir_if_present(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
