//! Unix socket listener: one task per client, one JSON line per request.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::commands::handle_request;
use super::messages::Response;
use crate::engine::InventoryEngine;

pub struct IpcServer {
    socket_path: PathBuf,
    engine: Arc<InventoryEngine>,
}

impl IpcServer {
    pub fn new(socket_path: impl Into<PathBuf>, engine: Arc<InventoryEngine>) -> Self {
        Self {
            socket_path: socket_path.into(),
            engine,
        }
    }

    /// Bind the socket, replacing a stale one left by a previous run.
    pub fn bind(&self) -> Result<UnixListener> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .with_context(|| format!("Failed to remove stale socket {:?}", self.socket_path))?;
        }
        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind IPC socket {:?}", self.socket_path))?;
        info!("IPC listening on {:?}", self.socket_path);
        Ok(listener)
    }

    /// Accept clients until `shutdown` fires, then remove the socket file.
    pub async fn run(self, listener: UnixListener, shutdown: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let engine = Arc::clone(&self.engine);
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_client(stream, engine, shutdown).await {
                                warn!("IPC client error: {:#}", e);
                            }
                        });
                    }
                    Err(e) => error!("IPC accept failed: {}", e),
                },
            }
        }

        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            debug!("Socket cleanup for {:?}: {}", self.socket_path, e);
        }
        info!("IPC server stopped");
        Ok(())
    }
}

async fn serve_client(stream: UnixStream, engine: Arc<InventoryEngine>, shutdown: CancellationToken) -> Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    debug!("IPC client connected");

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line.context("Failed to read request")?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(request) => handle_request(&engine, &request).await,
            Err(e) => Response::fail(format!("Invalid JSON: {}", e)),
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        write.write_all(&out).await.context("Failed to write response")?;
    }

    debug!("IPC client disconnected");
    Ok(())
}
