//! # IPC Server
//!
//! Unix socket server the daemon uses to accept control requests.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Reminder CRUD, snooze and complete requests
//! - 1.0.0: Monitor start/stop/status over Unix socket

use crate::features::reminders::{MonitorController, MonitorSettings, ReminderService};
use crate::ipc::protocol::{read_message, write_message, ControlRequest, ControlResponse};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

/// Maximum number of simultaneously connected clients
const MAX_CLIENTS: usize = 10;

/// One counted client connection, released on drop even if its handler panics
struct ClientSlot(Arc<AtomicUsize>);

impl ClientSlot {
    /// Take a slot, returning it with the number of clients held before it
    fn acquire(count: &Arc<AtomicUsize>) -> (Self, usize) {
        let before = count.fetch_add(1, Ordering::SeqCst);
        (ClientSlot(count.clone()), before)
    }
}

impl Drop for ClientSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct IpcServer {
    controller: Arc<MonitorController>,
    service: ReminderService,
    /// Used when a request leaves scope or interval unset
    defaults: MonitorSettings,
    client_count: Arc<AtomicUsize>,
}

impl IpcServer {
    pub fn new(
        controller: Arc<MonitorController>,
        service: ReminderService,
        defaults: MonitorSettings,
    ) -> Self {
        IpcServer {
            controller,
            service,
            defaults,
            client_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind `socket_path` and serve clients on a background task
    pub async fn start(self: Arc<Self>, socket_path: impl AsRef<Path>) -> Result<JoinHandle<()>> {
        let socket_path: PathBuf = socket_path.as_ref().to_path_buf();

        // Remove a stale socket left behind by a previous run
        if socket_path.exists() {
            std::fs::remove_file(&socket_path).with_context(|| {
                format!("Failed to remove stale socket {}", socket_path.display())
            })?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind {}", socket_path.display()))?;
        info!("IPC server listening on {}", socket_path.display());

        let server = self.clone();
        Ok(tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _addr)) => {
                        let (slot, count) = ClientSlot::acquire(&server.client_count);
                        if count >= MAX_CLIENTS {
                            drop(slot);
                            warn!(
                                "Maximum IPC clients reached ({MAX_CLIENTS}), rejecting connection"
                            );
                            continue;
                        }
                        debug!("Control client connected (total: {})", count + 1);

                        let server_clone = server.clone();
                        tokio::spawn(async move {
                            let _slot = slot;
                            if let Err(e) = server_clone.handle_client(stream).await {
                                debug!("Client handler ended: {e}");
                            }
                            debug!("Control client disconnected");
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept IPC connection: {e}");
                    }
                }
            }
        }))
    }

    /// Serve requests from one client until it disconnects
    async fn handle_client(&self, stream: UnixStream) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        while let Some(request) = read_message::<ControlRequest, _>(&mut reader).await? {
            let response = self.dispatch(request).await;
            write_message(&mut writer, &response).await?;
        }
        Ok(())
    }

    /// Execute one request and build its response
    pub async fn dispatch(&self, request: ControlRequest) -> ControlResponse {
        let request_id = request.request_id().to_string();
        debug!("Handling control request {request_id}");

        match self.execute(request).await {
            Ok((message, data)) => ControlResponse::ok(&request_id, message, data),
            Err(e) => {
                warn!("Control request {request_id} failed: {e:#}");
                ControlResponse::error(&request_id, format!("{e:#}"))
            }
        }
    }

    async fn execute(
        &self,
        request: ControlRequest,
    ) -> Result<(Option<String>, Option<serde_json::Value>)> {
        match request {
            ControlRequest::StartMonitoring {
                user_scope,
                check_interval_secs,
                ..
            } => {
                let settings = MonitorSettings::new(
                    user_scope.unwrap_or_else(|| self.defaults.user_scope.clone()),
                    check_interval_secs
                        .map(Duration::from_secs)
                        .unwrap_or(self.defaults.check_interval),
                );
                let outcome = self.controller.start(settings).await;
                Ok((Some(outcome.message().to_string()), Some(to_json(&outcome)?)))
            }
            ControlRequest::StopMonitoring { .. } => {
                let outcome = self.controller.stop().await;
                Ok((Some(outcome.message().to_string()), Some(to_json(&outcome)?)))
            }
            ControlRequest::GetStatus { .. } => {
                let status = self.controller.status().await;
                Ok((None, Some(to_json(&status)?)))
            }
            ControlRequest::ListReminders {
                user_id,
                active_only,
                ..
            } => {
                let user_id = user_id.unwrap_or_else(|| self.defaults.user_scope.clone());
                let reminders = self.service.list(&user_id, active_only).await?;
                Ok((None, Some(to_json(&reminders)?)))
            }
            ControlRequest::DueReminders { user_id, .. } => {
                let user_id = user_id.unwrap_or_else(|| self.defaults.user_scope.clone());
                let reminders = self.service.due_reminders(&user_id).await?;
                Ok((None, Some(to_json(&reminders)?)))
            }
            ControlRequest::CreateReminder { reminder, .. } => {
                let reminder = self.service.create(reminder).await?;
                Ok((Some("Reminder created".to_string()), Some(to_json(&reminder)?)))
            }
            ControlRequest::UpdateReminder {
                reminder_id,
                update,
                ..
            } => {
                let reminder = self.service.update(&reminder_id, update).await?;
                Ok((Some("Reminder updated".to_string()), Some(to_json(&reminder)?)))
            }
            ControlRequest::DeleteReminder { reminder_id, .. } => {
                self.service.delete(&reminder_id).await?;
                Ok((Some("Reminder deleted successfully".to_string()), None))
            }
            ControlRequest::SnoozeReminder {
                reminder_id,
                minutes,
                ..
            } => {
                let minutes =
                    minutes.unwrap_or(crate::features::reminders::DEFAULT_SNOOZE_MINUTES);
                let reminder = self.service.snooze(&reminder_id, minutes).await?;
                Ok((
                    Some(format!("Reminder snoozed for {minutes} minutes")),
                    Some(to_json(&reminder)?),
                ))
            }
            ControlRequest::CompleteReminder {
                reminder_id,
                medication_id,
                ..
            } => {
                let completion = self
                    .service
                    .complete(&reminder_id, medication_id.as_deref())
                    .await?;
                Ok((
                    Some("Reminder marked as completed".to_string()),
                    Some(to_json(&completion)?),
                ))
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}
