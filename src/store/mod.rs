//! Durable stores backing the node and resource managers
//!
//! Two seams keep the managers independent of where state actually lives:
//!
//! | Trait | Used by | Implementations |
//! |-------|---------|-----------------|
//! | [`ChunkObjectStore`] | `NodeManager` | [`FsChunkStore`], [`MemoryChunkStore`] |
//! | [`KeyValueStore`] | `ResourceManager` (creation times) | [`JsonFileStore`], [`MemoryStore`] |
//!
//! File-backed implementations write through a temporary sibling and only
//! replace the target when its bytes change, so a rewrite of identical state
//! never bumps a modification time.

pub mod chunk;
pub mod kv;

pub use chunk::{ChunkObjectStore, FsChunkStore, MemoryChunkStore};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
