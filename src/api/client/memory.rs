//! In-memory gateway
//!
//! This module provides a gateway that keeps the tree and the received
//! analytics in process. It backs the reference server and serves as a
//! transport-free gateway in tests.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{AnalyticsSink, Gateway, GatewayError};
use crate::models::{MoveRecord, NavTree};

/// A gateway that stores everything in shared memory
#[derive(Clone, Default)]
pub struct MemoryGateway {
    tree: Arc<Mutex<NavTree>>,
    moves: Arc<Mutex<Vec<MoveRecord>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MemoryGateway {
    /// Create a new gateway holding the given tree
    pub fn new(tree: NavTree) -> Self {
        Self {
            tree: Arc::new(Mutex::new(tree)),
            moves: Arc::default(),
        }
    }

    /// The currently stored tree
    pub fn tree(&self) -> NavTree {
        lock(&self.tree).clone()
    }

    /// Every move record received so far, oldest first
    pub fn moves(&self) -> Vec<MoveRecord> {
        lock(&self.moves).clone()
    }
}

#[async_trait::async_trait]
impl Gateway for MemoryGateway {
    async fn fetch_tree(&self) -> Result<NavTree, GatewayError> {
        Ok(self.tree())
    }

    async fn store_tree(&self, tree: &NavTree) -> Result<(), GatewayError> {
        *lock(&self.tree) = tree.clone();
        Ok(())
    }
}

#[async_trait::async_trait]
impl AnalyticsSink for MemoryGateway {
    async fn record_move(&self, record: &MoveRecord) -> Result<(), GatewayError> {
        lock(&self.moves).push(record.clone());
        Ok(())
    }
}
