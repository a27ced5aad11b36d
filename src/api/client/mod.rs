//! Client module
//!
//! This module provides the persistence and analytics gateways the editor talks to.

mod http;
mod memory;
mod trait_def;

// Re-export the traits and implementations
pub use http::{ClientConfig, HttpGateway};
pub use memory::MemoryGateway;
pub use trait_def::{AnalyticsSink, Gateway, GatewayError};
