// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Snapshot-cycle lifecycle phases.

use core::fmt;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// Node up, workload mutating state.
    Running,
    /// Freezing reference balances and strings.
    Capturing,
    /// Stopping the node that ran the workload.
    Stopping1,
    /// Node relaunched to write the snapshot file.
    Snapshotting,
    /// Stopping the snapshot writer.
    Stopping2,
    /// Data directory being removed.
    Wiping,
    /// Node relaunched from the snapshot file.
    Restoring,
    /// Comparing live state with the reference.
    Verifying,
    /// Submitting one transaction from a restored account.
    Probing,
    Passed,
    Failed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Running => "RUNNING",
            Phase::Capturing => "CAPTURING",
            Phase::Stopping1 => "STOPPING_1",
            Phase::Snapshotting => "SNAPSHOTTING",
            Phase::Stopping2 => "STOPPING_2",
            Phase::Wiping => "WIPING",
            Phase::Restoring => "RESTORING",
            Phase::Verifying => "VERIFYING",
            Phase::Probing => "PROBING",
            Phase::Passed => "PASSED",
            Phase::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Passed | Phase::Failed)
    }

    /// Whether `next` directly follows `self` in the cycle.
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Running, Capturing)
                | (Capturing, Stopping1)
                | (Stopping1, Snapshotting)
                | (Snapshotting, Stopping2)
                | (Stopping2, Wiping)
                | (Wiping, Restoring)
                | (Restoring, Verifying)
                | (Verifying, Probing)
                | (Verifying, Passed)
                | (Verifying, Failed)
                | (Probing, Passed)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase plus the path taken to reach it.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: Phase,
    history: Vec<Phase>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self {
            current: Phase::Running,
            history: vec![Phase::Running],
        }
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// Move to `next`, rejecting anything but the immediate successor.
    pub fn advance(&mut self, next: Phase) -> CoreResult<Phase> {
        if !self.current.can_advance_to(next) {
            return Err(CoreError::IllegalTransition {
                from: self.current,
                to: next,
            });
        }
        let previous = self.current;
        self.current = next;
        self.history.push(next);
        Ok(previous)
    }
}
