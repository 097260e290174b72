//! # Chime Daemon
//!
//! Owns the reminder store and monitor, and serves control requests on a
//! Unix socket until Ctrl-C.
//!
//! Usage: `cargo run --bin chimed`

use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use chime::core::Config;
use chime::database::{Database, ReminderStore};
use chime::features::reminders::{LogSink, MonitorController, MonitorSettings, ReminderService};
use chime::ipc::IpcServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting chime reminder daemon...");

    let database = Database::new(&config.database_path).await?;
    let store: Arc<dyn ReminderStore> = Arc::new(database);

    let controller = Arc::new(MonitorController::new(store.clone(), Arc::new(LogSink)));
    let service = ReminderService::new(store);
    let defaults = MonitorSettings::new(config.user_scope.clone(), config.check_interval());

    if config.autostart {
        let outcome = controller.start(defaults.clone()).await;
        info!("Autostart: {outcome}");
    }

    let ipc_server = Arc::new(IpcServer::new(controller.clone(), service, defaults));
    let accept_task = match ipc_server.start(&config.socket_path).await {
        Ok(task) => {
            info!("📡 Control socket ready at {}", config.socket_path);
            Some(task)
        }
        Err(e) => {
            error!("Failed to start IPC server: {e:#}. Remote control will be unavailable.");
            None
        }
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, stopping reminder monitor...");

    if let Some(task) = accept_task {
        task.abort();
    }
    controller.shutdown().await;

    if let Err(e) = std::fs::remove_file(&config.socket_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            error!("Failed to remove socket {}: {e}", config.socket_path);
        }
    }

    info!("Chime daemon stopped");
    Ok(())
}
