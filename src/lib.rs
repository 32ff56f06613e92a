//! dsk: design documentation trees
//!
//! Serves a hierarchy of documentation directories as an immutable, hashed
//! snapshot with fuzzy search, and announces rebuilt snapshots to live
//! subscribers through a fan-out message broker.

pub mod api;
pub mod authors;
pub mod broker;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod search;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod watch;

pub use broker::{Message, MessageBroker};
pub use error::{ApiError, BuildError};
pub use tree::{NodeTree, TreeBuilder, TreeHandle};
