//! Per-(axis, node) chunk set persistence

use crate::address::{escape_component, Axis, Chunk, Node};
use crate::error::{PipedbError, PipedbResult};
use crate::fsutil;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Durable store of the sorted chunk set split out along an axis at a node
pub trait ChunkObjectStore: Send {
    /// Load the chunk set, `None` if the axis was never split at `node`
    fn load(&self, axis: &Axis, node: &Node) -> PipedbResult<Option<Vec<Chunk>>>;

    /// Persist a sorted chunk set; returns whether stored content changed
    fn store(&mut self, axis: &Axis, node: &Node, chunks: &[Chunk]) -> PipedbResult<bool>;

    /// Time the chunk set last changed, `None` if never stored
    fn modified(&self, axis: &Axis, node: &Node) -> PipedbResult<Option<f64>>;
}

/// Chunk sets stored as JSON arrays under a `nodes` root
///
/// The set for `axis` at `node` lives at `<root>/<node subdir>/<axis>.chunks`.
#[derive(Debug, Clone)]
pub struct FsChunkStore {
    root: PathBuf,
}

impl FsChunkStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the chunk file for `axis` at `node`
    pub fn chunks_filename(&self, axis: &Axis, node: &Node) -> PathBuf {
        self.root
            .join(node.subdir())
            .join(format!("{}.chunks", escape_component(axis.as_str())))
    }
}

impl ChunkObjectStore for FsChunkStore {
    fn load(&self, axis: &Axis, node: &Node) -> PipedbResult<Option<Vec<Chunk>>> {
        let path = self.chunks_filename(axis, node);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PipedbError::io(format!("reading chunks {}", path.display()), e)),
        };
        let chunks = serde_json::from_slice(&bytes)
            .map_err(|source| PipedbError::Decode { path: path.clone(), source })?;
        debug!("Loaded chunks from {}", path.display());
        Ok(Some(chunks))
    }

    fn store(&mut self, axis: &Axis, node: &Node, chunks: &[Chunk]) -> PipedbResult<bool> {
        let path = self.chunks_filename(axis, node);
        let content = serde_json::to_vec(chunks)?;
        let changed = fsutil::write_if_different(&path, &content)?;
        if !changed {
            debug!("Chunks unchanged at {}", path.display());
        }
        Ok(changed)
    }

    fn modified(&self, axis: &Axis, node: &Node) -> PipedbResult<Option<f64>> {
        fsutil::modified_time(&self.chunks_filename(axis, node))
    }
}

/// Chunk sets held in memory, for tests
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    sets: HashMap<(Axis, Node), (Vec<Chunk>, f64)>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkObjectStore for MemoryChunkStore {
    fn load(&self, axis: &Axis, node: &Node) -> PipedbResult<Option<Vec<Chunk>>> {
        Ok(self
            .sets
            .get(&(axis.clone(), node.clone()))
            .map(|(chunks, _)| chunks.clone()))
    }

    fn store(&mut self, axis: &Axis, node: &Node, chunks: &[Chunk]) -> PipedbResult<bool> {
        let key = (axis.clone(), node.clone());
        if let Some((existing, _)) = self.sets.get(&key) {
            if existing.as_slice() == chunks {
                return Ok(false);
            }
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.sets.insert(key, (chunks.to_vec(), now));
        Ok(true)
    }

    fn modified(&self, axis: &Axis, node: &Node) -> PipedbResult<Option<f64>> {
        Ok(self
            .sets
            .get(&(axis.clone(), node.clone()))
            .map(|(_, modified)| *modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AxisInstance;
    use tempfile::TempDir;

    fn chunks(values: &[&str]) -> Vec<Chunk> {
        values.iter().map(|v| Chunk::from(*v)).collect()
    }

    #[test]
    fn missing_chunks_load_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FsChunkStore::new(dir.path());
        let loaded = store.load(&Axis::from("sample"), &Node::root()).unwrap();
        assert!(loaded.is_none());
        assert!(store.modified(&Axis::from("sample"), &Node::root()).unwrap().is_none());
    }

    #[test]
    fn chunks_file_layout() {
        let store = FsChunkStore::new("/work/nodes/run1");
        let node = Node::root().extend(AxisInstance::new("sample", Some("A".into())));
        assert_eq!(
            store.chunks_filename(&Axis::from("region"), &node),
            PathBuf::from("/work/nodes/run1/sample/A/region.chunks")
        );
        assert_eq!(
            store.chunks_filename(&Axis::from(""), &Node::root()),
            PathBuf::from("/work/nodes/run1/%.chunks")
        );
    }

    #[test]
    fn store_then_load() {
        let dir = TempDir::new().unwrap();
        let mut store = FsChunkStore::new(dir.path());
        let axis = Axis::from("sample");

        assert!(store.store(&axis, &Node::root(), &chunks(&["A", "B"])).unwrap());
        let loaded = store.load(&axis, &Node::root()).unwrap().unwrap();
        assert_eq!(loaded, chunks(&["A", "B"]));
    }

    #[test]
    fn identical_store_is_byte_identical_and_keeps_mtime() {
        let dir = TempDir::new().unwrap();
        let mut store = FsChunkStore::new(dir.path());
        let axis = Axis::from("sample");
        let path = store.chunks_filename(&axis, &Node::root());

        store.store(&axis, &Node::root(), &chunks(&["A", "B"])).unwrap();
        let bytes = fs::read(&path).unwrap();
        let mtime = store.modified(&axis, &Node::root()).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!store.store(&axis, &Node::root(), &chunks(&["A", "B"])).unwrap());
        assert_eq!(fs::read(&path).unwrap(), bytes);
        assert_eq!(store.modified(&axis, &Node::root()).unwrap(), mtime);
    }

    #[test]
    fn corrupt_chunk_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let store = FsChunkStore::new(dir.path());
        let axis = Axis::from("sample");
        fs::write(store.chunks_filename(&axis, &Node::root()), b"{oops").unwrap();

        let err = store.load(&axis, &Node::root()).unwrap_err();
        assert!(matches!(err, PipedbError::Decode { .. }));
    }

    #[test]
    fn memory_store_reports_changes() {
        let mut store = MemoryChunkStore::new();
        let axis = Axis::from("sample");
        assert!(store.store(&axis, &Node::root(), &chunks(&["A"])).unwrap());
        assert!(!store.store(&axis, &Node::root(), &chunks(&["A"])).unwrap());
        assert!(store.modified(&axis, &Node::root()).unwrap().is_some());
    }
}
