// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snapcheck_core::{RpcError, RpcResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use super::{JsonRpcRequest, JsonRpcResponse, Transport};

/// JSON-RPC over the node's IPC socket, one connection per request.
///
/// No timeout is applied: a node that never answers stalls the caller.
#[derive(Debug, Clone)]
pub struct IpcTransport {
    path: PathBuf,
}

impl IpcTransport {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Transport for IpcTransport {
    async fn send(&self, req: &JsonRpcRequest) -> RpcResult<JsonRpcResponse> {
        let mut stream = UnixStream::connect(&self.path).await.map_err(|e| {
            RpcError::Transport(format!("connect {}: {}", self.path.display(), e))
        })?;

        let mut req_bytes =
            serde_json::to_vec(req).map_err(|e| RpcError::Transport(e.to_string()))?;
        req_bytes.push(b'\n');
        stream
            .write_all(&req_bytes)
            .await
            .map_err(|e| RpcError::Transport(format!("write {}: {}", req.method, e)))?;

        // The server keeps the connection open, so read until one complete
        // JSON value has arrived rather than to EOF.
        let mut resp_bytes = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| RpcError::Transport(format!("read {}: {}", req.method, e)))?;
            if n == 0 {
                return Err(RpcError::Transport(format!(
                    "connection closed after {} bytes of {} response",
                    resp_bytes.len(),
                    req.method
                )));
            }
            resp_bytes.extend_from_slice(&chunk[..n]);

            let mut values =
                serde_json::Deserializer::from_slice(&resp_bytes).into_iter::<JsonRpcResponse>();
            match values.next() {
                Some(Ok(resp)) => return Ok(resp),
                Some(Err(e)) if e.is_eof() => continue,
                Some(Err(e)) => return Err(RpcError::InvalidResponse(e.to_string())),
                None => continue,
            }
        }
    }
}
