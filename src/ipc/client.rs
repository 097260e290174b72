//! # IPC Client
//!
//! Unix socket client used by `chime-ctl` to talk to the daemon.

use crate::ipc::protocol::{read_message, write_message, ControlRequest, ControlResponse};
use anyhow::{anyhow, Result};
use log::{info, warn};
use std::path::Path;
use tokio::net::UnixStream;
use tokio::time::{timeout, Duration};

/// Connection timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for the daemon to answer one request
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct IpcClient {
    stream: UnixStream,
}

impl IpcClient {
    /// Connect to the daemon's IPC server
    pub async fn connect(socket_path: impl AsRef<Path>) -> Result<Self> {
        let socket_path = socket_path.as_ref();
        info!("Connecting to IPC server at {}", socket_path.display());

        let stream = timeout(CONNECT_TIMEOUT, UnixStream::connect(socket_path))
            .await
            .map_err(|_| anyhow!("Connection timeout"))?
            .map_err(|e| anyhow!("Failed to connect to {}: {}", socket_path.display(), e))?;

        Ok(IpcClient { stream })
    }

    /// Send one request and wait for its response
    pub async fn request(&mut self, request: ControlRequest) -> Result<ControlResponse> {
        let request_id = request.request_id().to_string();
        write_message(&mut self.stream, &request).await?;

        let response: ControlResponse = timeout(RESPONSE_TIMEOUT, read_message(&mut self.stream))
            .await
            .map_err(|_| anyhow!("Timed out waiting for response to {request_id}"))??
            .ok_or_else(|| anyhow!("Daemon closed the connection"))?;

        if response.request_id != request_id {
            return Err(anyhow!(
                "Response id mismatch: sent {request_id}, got {}",
                response.request_id
            ));
        }
        Ok(response)
    }
}

/// Try to connect with retries
pub async fn connect_with_retry(
    socket_path: impl AsRef<Path>,
    max_attempts: u32,
    delay: Duration,
) -> Result<IpcClient> {
    let socket_path = socket_path.as_ref();
    let mut last_error = anyhow!("No connection attempts made");

    for attempt in 1..=max_attempts {
        match IpcClient::connect(socket_path).await {
            Ok(client) => return Ok(client),
            Err(e) => {
                if attempt < max_attempts {
                    warn!("Connection attempt {attempt} failed: {e}. Retrying in {delay:?}...");
                    tokio::time::sleep(delay).await;
                }
                last_error = e;
            }
        }
    }

    Err(anyhow!(
        "Failed to connect after {max_attempts} attempts: {last_error}"
    ))
}
