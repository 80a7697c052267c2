// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use snapcheck_core::{CoreError, Phase, RpcError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Process error: {0}")]
    Process(String),
    #[error("Invalid config: {0}")]
    Config(String),
    #[error("Contract artifact error: {0}")]
    Artifact(String),
    #[error("Workload run before bootstrap")]
    NotBootstrapped,
    #[error("{phase} aborted: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<HarnessError>,
    },
}

pub type HarnessResult<T> = Result<T, HarnessError>;

impl HarnessError {
    /// Attach the lifecycle phase. The innermost phase wins.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            HarnessError::Phase { .. } => self,
            other => HarnessError::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// Phase the failure happened in, if known.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            HarnessError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

/// Tag the error side of a result with the phase it occurred in.
pub trait PhaseContext<T> {
    fn during(self, phase: Phase) -> HarnessResult<T>;
}

impl<T, E: Into<HarnessError>> PhaseContext<T> for Result<T, E> {
    fn during(self, phase: Phase) -> HarnessResult<T> {
        self.map_err(|e| e.into().in_phase(phase))
    }
}
