//! pipedb - persistent state for partitioned pipeline workflows
//!
//! Tracks how each axis of a workflow was split into chunks, enumerates the
//! resulting nodes, maps logical resources to files with creation times and
//! aliases, and keeps concurrent runs of one workflow instance apart with a
//! directory lock.

pub mod address;
pub mod cli;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod nodes;
pub mod resources;
pub mod storage;
pub mod store;
pub mod ui;
pub mod workflow;

pub use error::{PipedbError, PipedbResult};
