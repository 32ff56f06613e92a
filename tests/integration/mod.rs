//! Integration tests for tree building, rebuilding, search and fan-out

mod api_shapes;
mod broker_fanout;
mod rebuild;
mod support;
mod tree_structure;
mod watch_daemon;
