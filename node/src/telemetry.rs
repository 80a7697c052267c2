// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const TRANSFERS_SUBMITTED: &str = "snapcheck_transfers_submitted_total";
pub const TRANSFERS_SKIPPED: &str = "snapcheck_transfers_skipped_total";
pub const CONTRACTS_DEPLOYED: &str = "snapcheck_contracts_deployed_total";
pub const STRINGS_UPDATED: &str = "snapcheck_strings_updated_total";
pub const PHASE_DURATION: &str = "snapcheck_phase_duration_seconds";

/// Initialize telemetry (logs + metric descriptions)
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_telemetry() {
    // 1. Initialize Tracing (Logs)
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "snapcheck_node=info,snapcheck_verify=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    // 2. Describe metrics. No exporter is installed here; an embedding
    // program may install a recorder before calling this.
    metrics::describe_counter!(TRANSFERS_SUBMITTED, "Value transfers submitted by the workload");
    metrics::describe_counter!(TRANSFERS_SKIPPED, "Peer transfers skipped by the balance gate");
    metrics::describe_counter!(CONTRACTS_DEPLOYED, "String-store contracts deployed, nested included");
    metrics::describe_counter!(STRINGS_UPDATED, "setString calls submitted");
    metrics::describe_histogram!(PHASE_DURATION, "Wall time spent in each lifecycle phase");
}
