//! Start/stop/status control over the reminder monitor
//!
//! The controller owns the process's [`MonitorState`] and guarantees that at
//! most one monitor loop runs at a time. Misuse (starting twice, stopping
//! when idle) is answered with an informational outcome, never an error.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::database::ReminderStore;
use crate::features::reminders::monitor::{
    Clock, MonitorSettings, NotificationSink, ReminderMonitor, SystemClock,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Result of a start or stop request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ControlOutcome {
    Started {
        user_scope: String,
        check_interval_secs: u64,
    },
    AlreadyRunning,
    Stopped,
    NotRunning,
}

impl ControlOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ControlOutcome::Started { .. } => "Reminder monitoring started",
            ControlOutcome::AlreadyRunning => "Reminder monitoring is already running",
            ControlOutcome::Stopped => "Reminder monitoring stopped",
            ControlOutcome::NotRunning => "Reminder monitoring is not running",
        }
    }
}

impl std::fmt::Display for ControlOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Snapshot returned by [`MonitorController::status`].
///
/// `running` and `task_active` can briefly disagree right after a stop,
/// while the cancelled task is still unwinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub running: bool,
    pub task_active: bool,
}

/// Handle to a spawned monitor loop
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Ask the loop to exit at its next sleep boundary
    fn cancel(&self) {
        // Err only means the loop already exited and dropped its receiver
        let _ = self.shutdown.send(true);
    }
}

#[derive(Default)]
pub struct MonitorState {
    running: bool,
    handle: Option<MonitorHandle>,
}

pub struct MonitorController {
    store: Arc<dyn ReminderStore>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    state: Mutex<MonitorState>,
}

impl MonitorController {
    pub fn new(store: Arc<dyn ReminderStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_clock(store, sink, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn ReminderStore>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        MonitorController {
            store,
            sink,
            clock,
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Spawn the monitor loop unless one is already running.
    ///
    /// A loop signalled by an earlier [`stop`](Self::stop) may still be
    /// finishing its last tick, so for a moment both can touch the store.
    /// Call [`shutdown`](Self::shutdown) first when that overlap matters.
    pub async fn start(&self, settings: MonitorSettings) -> ControlOutcome {
        let mut state = self.state.lock().await;
        if state.running {
            info!("Start requested but reminder monitoring is already running");
            return ControlOutcome::AlreadyRunning;
        }

        let outcome = ControlOutcome::Started {
            user_scope: settings.user_scope.clone(),
            check_interval_secs: settings.check_interval.as_secs(),
        };

        let monitor = ReminderMonitor::new(
            self.store.clone(),
            self.sink.clone(),
            self.clock.clone(),
            settings,
        );
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(monitor.run(shutdown_rx));

        state.running = true;
        state.handle = Some(MonitorHandle { shutdown, task });

        outcome
    }

    /// Signal the running loop to stop and forget its handle.
    ///
    /// Does not wait for the task to exit: a tick already in flight runs to
    /// completion, and an immediate [`start`](Self::start) can overlap it.
    /// Use [`shutdown`](Self::shutdown) to stop and wait.
    pub async fn stop(&self) -> ControlOutcome {
        let mut state = self.state.lock().await;
        if !state.running {
            return ControlOutcome::NotRunning;
        }

        state.running = false;
        if let Some(handle) = state.handle.take() {
            handle.cancel();
        }

        info!("Reminder monitoring stop requested");
        ControlOutcome::Stopped
    }

    pub async fn status(&self) -> MonitorStatus {
        let state = self.state.lock().await;
        MonitorStatus {
            running: state.running,
            task_active: state.handle.as_ref().is_some_and(MonitorHandle::is_active),
        }
    }

    /// Stop the loop and wait for it to exit; used at process teardown
    pub async fn shutdown(&self) {
        let handle = {
            let mut state = self.state.lock().await;
            state.running = false;
            state.handle.take()
        };

        if let Some(handle) = handle {
            handle.cancel();
            if let Err(e) = handle.task.await {
                warn!("Reminder monitor task ended abnormally: {e}");
            }
        }
    }
}
