//! Lifecycle-scoped owner of the current snapshot.

use crate::broker::{Message, MessageBroker, TREE_SYNCED};
use crate::error::BuildError;
use crate::tree::{NodeTree, TreeBuilder};
use crate::types::hash_hex;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Holds the published snapshot and replaces it on rebuild.
///
/// Readers take an `Arc` to the snapshot and keep using it for as long as
/// they need; a concurrent rebuild never changes what they see.
pub struct TreeHandle {
    current: RwLock<Arc<NodeTree>>,
    builder: TreeBuilder,
    broker: Arc<MessageBroker>,
    rebuilding: Mutex<()>,
}

impl TreeHandle {
    /// Build the initial snapshot. Fails when the first build fails.
    pub fn open(builder: TreeBuilder, broker: Arc<MessageBroker>) -> Result<Self, BuildError> {
        let tree = builder.build()?;
        Ok(Self {
            current: RwLock::new(Arc::new(tree)),
            builder,
            broker,
            rebuilding: Mutex::new(()),
        })
    }

    /// The snapshot published at the moment of the call.
    pub fn current(&self) -> Arc<NodeTree> {
        Arc::clone(&self.current.read())
    }

    pub fn broker(&self) -> &Arc<MessageBroker> {
        &self.broker
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    /// Build a fresh snapshot, publish it and notify subscribers.
    ///
    /// On failure the previous snapshot stays current and nothing is sent.
    pub fn rebuild(&self) -> Result<Arc<NodeTree>, BuildError> {
        let _serial = self.rebuilding.lock();
        let started = Instant::now();
        info!(root = %self.builder.root().display(), "Rebuilding tree");

        let tree = match self.builder.build() {
            Ok(tree) => Arc::new(tree),
            Err(e) => {
                error!(
                    root = %self.builder.root().display(),
                    error = %e,
                    "Rebuild failed, keeping previous tree"
                );
                return Err(e);
            }
        };

        let hash = hash_hex(tree.hash());
        let previous = {
            let mut current = self.current.write();
            std::mem::replace(&mut *current, Arc::clone(&tree))
        };

        info!(
            hash = %hash,
            changed = previous.hash() != tree.hash(),
            nodes = tree.total_nodes(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tree synced"
        );
        self.broker.publish(Message::new(TREE_SYNCED, hash));
        Ok(tree)
    }

    /// Close the broker; every subscriber's inbox ends.
    pub fn shutdown(&self) {
        self.broker.shutdown();
    }
}
