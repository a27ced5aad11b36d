//! API module
//!
//! This module provides the gateway clients the editor persists through and
//! the reference navigation server.

pub mod client;
pub mod server;

// Re-export commonly used types
pub use client::{AnalyticsSink, ClientConfig, Gateway, GatewayError, HttpGateway, MemoryGateway};
pub use server::{router, serve, ServerConfig};
