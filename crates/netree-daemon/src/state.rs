//! Application state management

use netree_core::{DeviceStore, Tree};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::Config;

/// Shared application state
pub struct AppState {
    /// Device tree; writers hold the lock across mutation and save
    pub tree: RwLock<Tree>,
    /// JSON inventory backing the tree
    pub store: DeviceStore,
}

impl AppState {
    /// Create application state, loading the inventory from disk
    pub fn new(config: &Config) -> Arc<Self> {
        let store = DeviceStore::new(&config.storage.path);
        let mut tree = Tree::new();
        if !store.load_tree(&mut tree) {
            info!(path = %store.path().display(), "Starting with an empty inventory");
        }

        Self::with_tree(store, tree)
    }

    pub fn with_tree(store: DeviceStore, tree: Tree) -> Arc<Self> {
        Arc::new(Self {
            tree: RwLock::new(tree),
            store,
        })
    }

    /// Write the tree to disk after a successful mutation
    ///
    /// A failed save is logged by the store and does not undo the mutation.
    pub fn persist(&self, tree: &Tree) {
        if !self.store.save_tree(tree) {
            warn!(
                path = %self.store.path().display(),
                "In-memory inventory now differs from disk"
            );
        }
    }
}
