//! # IPC Module
//!
//! Local control surface: `chime-ctl` talks to the daemon over a Unix socket.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Reminder management requests
//! - 1.0.0: Initial IPC implementation with Unix socket protocol

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{connect_with_retry, IpcClient};
pub use protocol::{new_request_id, ControlRequest, ControlResponse};
pub use server::IpcServer;
