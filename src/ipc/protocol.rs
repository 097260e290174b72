//! # IPC Protocol
//!
//! Message types for controller <-> daemon communication over Unix socket.
//!
//! Uses length-prefixed JSON framing:
//! - 4 bytes: message length (big-endian u32)
//! - N bytes: JSON payload
//!
//! Every request carries a `request_id`; the daemon answers each request
//! with exactly one [`ControlResponse`] echoing it.

use crate::core::{NewReminder, ReminderUpdate};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Frames larger than this are rejected
pub const MAX_FRAME_LEN: usize = 10 * 1024 * 1024;

// ============================================================================
// Client -> Daemon Requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlRequest {
    /// Start the background monitor (defaults come from daemon config)
    StartMonitoring {
        request_id: String,
        user_scope: Option<String>,
        check_interval_secs: Option<u64>,
    },
    StopMonitoring {
        request_id: String,
    },
    GetStatus {
        request_id: String,
    },
    ListReminders {
        request_id: String,
        user_id: Option<String>,
        #[serde(default = "default_true")]
        active_only: bool,
    },
    /// Reminders due at the moment the daemon handles the request
    DueReminders {
        request_id: String,
        user_id: Option<String>,
    },
    CreateReminder {
        request_id: String,
        reminder: NewReminder,
    },
    UpdateReminder {
        request_id: String,
        reminder_id: String,
        update: ReminderUpdate,
    },
    DeleteReminder {
        request_id: String,
        reminder_id: String,
    },
    SnoozeReminder {
        request_id: String,
        reminder_id: String,
        minutes: Option<i64>,
    },
    CompleteReminder {
        request_id: String,
        reminder_id: String,
        medication_id: Option<String>,
    },
}

fn default_true() -> bool {
    true
}

impl ControlRequest {
    pub fn request_id(&self) -> &str {
        match self {
            ControlRequest::StartMonitoring { request_id, .. }
            | ControlRequest::StopMonitoring { request_id }
            | ControlRequest::GetStatus { request_id }
            | ControlRequest::ListReminders { request_id, .. }
            | ControlRequest::DueReminders { request_id, .. }
            | ControlRequest::CreateReminder { request_id, .. }
            | ControlRequest::UpdateReminder { request_id, .. }
            | ControlRequest::DeleteReminder { request_id, .. }
            | ControlRequest::SnoozeReminder { request_id, .. }
            | ControlRequest::CompleteReminder { request_id, .. } => request_id,
        }
    }
}

/// Generate a fresh request id
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// Daemon -> Client Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResponse {
    pub request_id: String,
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl ControlResponse {
    pub fn ok(request_id: &str, message: Option<String>, data: Option<serde_json::Value>) -> Self {
        ControlResponse {
            request_id: request_id.to_string(),
            success: true,
            message,
            data,
        }
    }

    pub fn error(request_id: &str, message: String) -> Self {
        ControlResponse {
            request_id: request_id.to_string(),
            success: false,
            message: Some(message),
            data: None,
        }
    }
}

// ============================================================================
// Framing - Length-prefixed JSON messages
// ============================================================================

/// Encode a message with length prefix
pub fn encode_message<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_FRAME_LEN {
        return Err(anyhow!("Message too large: {} bytes", json.len()));
    }
    let len = json.len() as u32;
    let mut buf = Vec::with_capacity(4 + json.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&json);
    Ok(buf)
}

/// Read one framed message. `Ok(None)` means the peer closed cleanly
/// before sending another frame.
pub async fn read_message<T, R>(reader: &mut R) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(anyhow!("Message too large: {} bytes", len));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;

    Ok(Some(serde_json::from_slice(&buf)?))
}

/// Write a framed message and flush
pub async fn write_message<T, W>(writer: &mut W, msg: &T) -> Result<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let encoded = encode_message(msg)?;
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}
