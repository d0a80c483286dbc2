//! PrivGate Daemon library
//!
//! This module provides the core components for the PrivGate daemon:
//! - REST API handlers over the policy engine
//! - Layered configuration
//! - Server lifecycle management

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use server::Server;
