//! Rebuild trigger: watches the tree root and rebuilds on change.

mod events;
mod runtime;

pub use events::{ChangeEvent, EventBatcher};
pub use runtime::{WatchDaemon, WatchStopper};
