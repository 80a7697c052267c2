// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use snapcheck_node::backend::ProcessBackend;
use snapcheck_node::config::HarnessConfig;
use snapcheck_node::contracts::ContractArtifacts;
use snapcheck_node::coordinator::{RunOutcome, SnapshotCoordinator};
use snapcheck_node::telemetry::init_telemetry;

/// Exit code for a run aborted before a verdict was reached.
const EXIT_ABORTED: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "snapcheck", author, version)]
#[command(about = "Drive a randomized workload against a node, snapshot it, reload it and prove nothing changed")]
struct Args {
    /// JSON configuration file; flags below override it
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Node executable
    #[arg(long)]
    node_binary: Option<PathBuf>,

    /// Node data directory (wiped during the cycle)
    #[arg(long)]
    datadir: Option<PathBuf>,

    /// Keystore directory, kept outside the data directory
    #[arg(long)]
    keystore: Option<PathBuf>,

    /// Snapshot file written and then loaded by the node
    #[arg(long)]
    snapshot_file: Option<PathBuf>,

    /// Directory with StringStorage.bin and DeployAnotherContract.bin
    #[arg(long)]
    contracts_dir: Option<PathBuf>,

    /// Workload RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Number of workload rounds
    #[arg(long)]
    rounds: Option<u32>,

    /// Skip the post-restore transfer
    #[arg(long)]
    no_probe: bool,
}

fn build_config(args: Args) -> Result<HarnessConfig> {
    let mut cfg = match &args.config {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    if let Some(v) = args.node_binary {
        cfg.node_binary = v;
    }
    if let Some(v) = args.datadir {
        cfg.datadir = v;
    }
    if let Some(v) = args.keystore {
        cfg.keystore = Some(v);
    }
    if let Some(v) = args.snapshot_file {
        cfg.snapshot_file = v;
    }
    if let Some(v) = args.contracts_dir {
        cfg.contracts_dir = v;
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    if let Some(v) = args.rounds {
        cfg.workload.rounds = v;
    }
    if args.no_probe {
        cfg.post_restore_probe = false;
    }

    cfg.validate().context("Invalid configuration")?;
    Ok(cfg)
}

async fn run(args: Args) -> Result<RunOutcome> {
    let cfg = build_config(args)?;
    tracing::info!(?cfg, "Configuration loaded");

    let artifacts = ContractArtifacts::load(&cfg.contracts_dir)
        .context("Failed to load contract bytecode")?;
    let backend = ProcessBackend::new(cfg.clone());

    let outcome = SnapshotCoordinator::new(backend, cfg, artifacts)
        .run()
        .await
        .context("Snapshot cycle aborted")?;
    Ok(outcome)
}

/// Map a finished or aborted run to the process exit code.
fn exit_code(result: &Result<RunOutcome>) -> i32 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(_) => EXIT_ABORTED,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_telemetry();
    let args = Args::parse();

    let result = run(args).await;
    match &result {
        Ok(RunOutcome::Passed(report)) => println!(
            "Test passed. seed={} balances={} strings={}",
            report.seed, report.balances_checked, report.strings_checked
        ),
        Ok(RunOutcome::Failed { mismatch, report }) => {
            println!("Test failed (seed={}): {}", report.seed, mismatch)
        }
        Err(e) => eprintln!("Error: {:?}", e),
    }

    process::exit(exit_code(&result));
}
