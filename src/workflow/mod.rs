//! Workflow instances: run locks and per-instance databases

pub mod database;
pub mod factory;
pub mod lock;

pub use database::{InstanceDirs, WorkflowDatabase};
pub use factory::{force_unlock, lock_path, lock_status, WorkflowDatabaseFactory};
pub use lock::{AdvisoryLock, DirLock, LockOwner, LockState};
