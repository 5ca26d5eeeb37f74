//! Resource tracking: logical (name, node) handles to physical files

pub mod id;
pub mod manager;

pub use id::{FilenameCreator, ResourceId};
pub use manager::{CleanupSummary, ResourceManager};
