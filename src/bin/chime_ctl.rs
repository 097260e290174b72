//! # Chime Control
//!
//! Command-line client for a running `chimed`.
//!
//! Usage: `cargo run --bin chime-ctl -- status`

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::time::Duration;

use chime::core::{Config, NewReminder, ReminderUpdate};
use chime::ipc::{connect_with_retry, new_request_id, ControlRequest};

#[derive(Parser)]
#[command(name = "chime-ctl", about = "Control the chime reminder daemon")]
struct Cli {
    /// Daemon socket (defaults to CHIME_IPC_SOCKET or /tmp/chime.sock)
    #[arg(long, global = true)]
    socket: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start background monitoring
    Start {
        #[arg(long)]
        user: Option<String>,
        /// Seconds between checks
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Stop background monitoring
    Stop,
    /// Show monitor status
    Status,
    /// List reminders
    List {
        #[arg(long)]
        user: Option<String>,
        /// Include inactive reminders
        #[arg(long)]
        all: bool,
    },
    /// List reminders due right now
    Due {
        #[arg(long)]
        user: Option<String>,
    },
    /// Create a reminder
    Add {
        #[arg(long)]
        title: String,
        /// Time of day, HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        medication: Option<String>,
        /// Comma-separated weekdays; makes the reminder recurring
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,
        /// Recurring every day
        #[arg(long)]
        daily: bool,
    },
    /// Change fields of a reminder
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long, value_delimiter = ',')]
        days: Option<Vec<String>>,
    },
    /// Delete a reminder
    Delete { id: String },
    /// Snooze a reminder
    Snooze {
        id: String,
        #[arg(long)]
        minutes: Option<i64>,
    },
    /// Mark a reminder done for today
    Complete {
        id: String,
        /// Also log this medication as taken
        #[arg(long)]
        medication: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let socket = cli.socket.unwrap_or(config.socket_path.clone());

    let request = build_request(cli.command, &config);
    let mut client = connect_with_retry(&socket, 3, Duration::from_millis(500)).await?;
    let response = client.request(request).await?;

    if let Some(message) = &response.message {
        println!("{message}");
    }
    if let Some(data) = &response.data {
        println!("{}", serde_json::to_string_pretty(data)?);
    }

    if response.success {
        Ok(())
    } else {
        Err(anyhow!("Request failed"))
    }
}

fn build_request(command: Command, config: &Config) -> ControlRequest {
    let request_id = new_request_id();
    match command {
        Command::Start { user, interval } => ControlRequest::StartMonitoring {
            request_id,
            user_scope: user,
            check_interval_secs: interval,
        },
        Command::Stop => ControlRequest::StopMonitoring { request_id },
        Command::Status => ControlRequest::GetStatus { request_id },
        Command::List { user, all } => ControlRequest::ListReminders {
            request_id,
            user_id: user,
            active_only: !all,
        },
        Command::Due { user } => ControlRequest::DueReminders {
            request_id,
            user_id: user,
        },
        Command::Add {
            title,
            time,
            user,
            description,
            medication,
            days,
            daily,
        } => {
            let mut reminder = NewReminder::new(
                user.unwrap_or_else(|| config.user_scope.clone()),
                title,
                time,
            );
            reminder.description = description;
            reminder.medication_id = medication;
            reminder.is_recurring = daily || !days.is_empty();
            reminder.days_of_week = days;
            ControlRequest::CreateReminder {
                request_id,
                reminder,
            }
        }
        Command::Update {
            id,
            title,
            time,
            active,
            days,
        } => ControlRequest::UpdateReminder {
            request_id,
            reminder_id: id,
            update: ReminderUpdate {
                title,
                reminder_time: time,
                is_active: active,
                is_recurring: days.as_ref().map(|_| true),
                days_of_week: days,
                ..Default::default()
            },
        },
        Command::Delete { id } => ControlRequest::DeleteReminder {
            request_id,
            reminder_id: id,
        },
        Command::Snooze { id, minutes } => ControlRequest::SnoozeReminder {
            request_id,
            reminder_id: id,
            minutes,
        },
        Command::Complete { id, medication } => ControlRequest::CompleteReminder {
            request_id,
            reminder_id: id,
            medication_id: medication,
        },
    }
}
