// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Spawning and stopping the node-under-test.
//!
//! Exit is detected by polling `try_wait` at a fixed interval; no exit
//! notification is relied upon.

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::errors::{HarnessError, HarnessResult};

pub struct ProcessController {
    child: Child,
    pid: Option<u32>,
    exit_status: Option<ExitStatus>,
    poll_interval: Duration,
}

impl ProcessController {
    /// Launch `program` with `args`. Output is discarded.
    ///
    /// The child is killed if the controller is dropped while it still runs.
    pub fn spawn(program: &Path, args: &[OsString], poll_interval: Duration) -> HarnessResult<Self> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HarnessError::Process(format!("failed to spawn {}: {}", program.display(), e)))?;

        let pid = child.id();
        tracing::info!(?pid, program = %program.display(), "Node process spawned");

        Ok(Self {
            child,
            pid,
            exit_status: None,
            poll_interval,
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Non-blocking liveness check.
    pub fn is_running(&mut self) -> HarnessResult<bool> {
        Ok(self.poll_exit()?.is_none())
    }

    /// Ask the process to terminate, then block until its exit is observed.
    pub async fn stop(&mut self) -> HarnessResult<ExitStatus> {
        if let Some(status) = self.poll_exit()? {
            tracing::warn!(pid = ?self.pid, %status, "Node had already exited");
            return Ok(status);
        }

        self.terminate().await?;

        loop {
            if let Some(status) = self.poll_exit()? {
                tracing::info!(pid = ?self.pid, %status, "Node process exited");
                return Ok(status);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn poll_exit(&mut self) -> HarnessResult<Option<ExitStatus>> {
        if self.exit_status.is_none() {
            self.exit_status = self.child.try_wait()?;
        }
        Ok(self.exit_status)
    }

    /// SIGTERM so the node can flush its database; SIGKILL loses writes.
    #[cfg(unix)]
    async fn terminate(&mut self) -> HarnessResult<()> {
        let Some(pid) = self.pid else {
            return Ok(());
        };
        let status = Command::new("kill")
            .arg("-TERM")
            .arg(pid.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| HarnessError::Process(format!("failed to signal pid {}: {}", pid, e)))?;
        if !status.success() && self.poll_exit()?.is_none() {
            return Err(HarnessError::Process(format!("kill -TERM {} exited with {}", pid, status)));
        }
        Ok(())
    }

    #[cfg(not(unix))]
    async fn terminate(&mut self) -> HarnessResult<()> {
        self.child.start_kill()?;
        Ok(())
    }
}
