// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Process lifecycle of the node-under-test, behind one seam.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snapcheck_core::RpcGateway;

use crate::config::{HarnessConfig, LaunchMode};
use crate::errors::{HarnessError, HarnessResult};
use crate::gateway::EthGateway;
use crate::process::ProcessController;
use crate::transport::ipc::IpcTransport;

/// Launching, stopping and connecting to one node instance at a time.
///
/// `connect` hands out a fresh gateway for the current process; gateways
/// from an earlier launch must not be reused after a restart.
#[async_trait]
pub trait NodeBackend: Send {
    type Gateway: RpcGateway;

    /// Directory holding all of the node's live state.
    fn datadir(&self) -> &Path;

    async fn launch(&mut self, mode: &LaunchMode) -> HarnessResult<()>;

    /// Terminate the running node and block until its exit is observed.
    async fn stop(&mut self) -> HarnessResult<()>;

    async fn connect(&mut self) -> HarnessResult<Self::Gateway>;
}

/// A real node binary, reached over its IPC socket.
pub struct ProcessBackend {
    config: HarnessConfig,
    process: Option<ProcessController>,
}

impl ProcessBackend {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config, process: None }
    }

    pub fn process(&self) -> Option<&ProcessController> {
        self.process.as_ref()
    }

    pub fn ipc_path(&self) -> PathBuf {
        self.config.ipc_path()
    }
}

#[async_trait]
impl NodeBackend for ProcessBackend {
    type Gateway = EthGateway<IpcTransport>;

    fn datadir(&self) -> &Path {
        &self.config.datadir
    }

    async fn launch(&mut self, mode: &LaunchMode) -> HarnessResult<()> {
        if self.process.is_some() {
            return Err(HarnessError::Process("node already running; stop it first".into()));
        }
        let args = self.config.launch_args(mode);
        tracing::info!(?mode, ?args, "Launching node");
        let process = ProcessController::spawn(
            &self.config.node_binary,
            &args,
            self.config.settle.exit_poll(),
        )?;
        self.process = Some(process);
        Ok(())
    }

    async fn stop(&mut self) -> HarnessResult<()> {
        let Some(mut process) = self.process.take() else {
            return Err(HarnessError::Process("no node running".into()));
        };
        process.stop().await?;
        Ok(())
    }

    async fn connect(&mut self) -> HarnessResult<Self::Gateway> {
        let Some(process) = self.process.as_mut() else {
            return Err(HarnessError::Process("cannot connect: no node running".into()));
        };
        if !process.is_running()? {
            return Err(HarnessError::Process(format!(
                "node exited before connect with {:?}",
                process.exit_status()
            )));
        }
        let path = self.config.ipc_path();
        tracing::info!(ipc = %path.display(), "Connecting to node");
        Ok(EthGateway::new(IpcTransport::new(path), &self.config))
    }
}
