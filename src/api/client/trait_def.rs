//! Gateway trait definitions
//!
//! This module defines the persistence and analytics contracts the editor
//! depends on, independent of their transport.

use crate::models::{MoveRecord, NavTree};

/// Failures reported by a gateway
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The backing service could not be reached at all
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a non-success status
    #[error("Server error: {status} - {reason}")]
    Server { status: u16, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_))
    }
}

/// Fetches and stores the navigation tree
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// Loads the persisted tree
    async fn fetch_tree(&self) -> Result<NavTree, GatewayError>;

    /// Replaces the persisted tree
    async fn store_tree(&self, tree: &NavTree) -> Result<(), GatewayError>;
}

/// Receives reorder analytics. Callers treat every failure as best-effort.
#[async_trait::async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record_move(&self, record: &MoveRecord) -> Result<(), GatewayError>;
}
