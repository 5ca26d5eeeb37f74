//! Node management for split/merge pipelines
//!
//! The [`NodeManager`] owns the chunk sets that define the address space of a
//! workflow instance: which chunks each axis was split into, at which node.
//! It enumerates that space lazily (see [`walk`]) and derives the
//! chunk-selection resources that split and merge jobs produce and consume.
//!
//! # Chunk sets
//!
//! | Situation | `retrieve_axis_chunks` |
//! |-----------|------------------------|
//! | Axis split at node | sorted chunks |
//! | Never split, or split into nothing | `[None]` |
//!
//! An unsplit axis therefore still enumerates exactly one node, carrying a
//! null-chunk instance, so un-split stages run once.

pub mod walk;

pub use walk::{ChunkIter, ChunkSet, NodeIter, NodeSet};

use crate::address::axis::describe_axes;
use crate::address::{Axis, AxisInstance, Chunk, ChunkKey, Node};
use crate::error::{PipedbError, PipedbResult};
use crate::fsutil;
use crate::resources::ResourceId;
use crate::store::{ChunkObjectStore, FsChunkStore};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Whether a chunk resource is consumed or produced by a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkResourceKind {
    /// Read by merge jobs and by every job addressed below the split
    Input,
    /// Written by the split job
    Output,
}

/// Handle on the chunk set of `axis` at `node`
///
/// Its identity is the axis name at the node, so re-splitting the axis is
/// visible to the executor as a change of this resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkResource {
    pub axis: Axis,
    pub node: Node,
    pub kind: ChunkResourceKind,
}

impl ChunkResource {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.axis.as_str(), self.node.clone())
    }
}

/// Enumerates nodes and persists per-axis chunk sets
pub struct NodeManager {
    temps_dir: PathBuf,
    store: Box<dyn ChunkObjectStore>,
    cached_chunks: RefCell<HashMap<(Axis, Node), Arc<[Option<Chunk>]>>>,
}

impl NodeManager {
    /// Manager persisting chunk sets under `nodes_dir`
    pub fn new(nodes_dir: impl Into<PathBuf>, temps_dir: impl Into<PathBuf>) -> Self {
        Self::with_store(temps_dir, Box::new(FsChunkStore::new(nodes_dir)))
    }

    /// Manager over an arbitrary chunk store
    pub fn with_store(temps_dir: impl Into<PathBuf>, store: Box<dyn ChunkObjectStore>) -> Self {
        Self {
            temps_dir: temps_dir.into(),
            store,
            cached_chunks: RefCell::new(HashMap::new()),
        }
    }

    pub fn temps_dir(&self) -> &Path {
        &self.temps_dir
    }

    /// Every node reached from `base` by taking one chunk per axis
    pub fn retrieve_nodes(&self, axes: &[Axis], base: &Node) -> NodeSet<'_> {
        NodeSet::new(self, axes, base)
    }

    /// Same walk as [`NodeManager::retrieve_nodes`], yielding chunk tuples
    pub fn retrieve_chunks(&self, axes: &[Axis], node: &Node) -> ChunkSet<'_> {
        ChunkSet::new(self, axes, node)
    }

    /// Chunk set of `axis` at `node`, `[None]` if the axis was not split there
    pub fn retrieve_axis_chunks(
        &self,
        axis: &Axis,
        node: &Node,
    ) -> PipedbResult<Arc<[Option<Chunk>]>> {
        let key = (axis.clone(), node.clone());
        if let Some(chunks) = self.cached_chunks.borrow().get(&key) {
            return Ok(Arc::clone(chunks));
        }

        match self.store.load(axis, node)? {
            Some(chunks) if !chunks.is_empty() => {
                let chunks: Arc<[Option<Chunk>]> = chunks.into_iter().map(Some).collect();
                self.cached_chunks
                    .borrow_mut()
                    .insert(key, Arc::clone(&chunks));
                Ok(chunks)
            }
            _ => Ok(Arc::from(vec![None])),
        }
    }

    /// Persist the chunk membership implied by a flat multi-axis split
    ///
    /// Each key holds one chunk per axis. For every level in `subset` (all
    /// levels when `None`) the keys are grouped by their prefix up to that
    /// level, and the distinct values at the level are stored as the chunk set
    /// of that axis at the node reached by the prefix.
    pub fn store_chunks<I, K>(
        &mut self,
        axes: &[Axis],
        node: &Node,
        chunks: I,
        subset: Option<&[usize]>,
    ) -> PipedbResult<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<ChunkKey>,
    {
        let keys: Vec<ChunkKey> = chunks.into_iter().map(Into::into).collect();

        if keys.is_empty() {
            return Err(PipedbError::EmptyChunks {
                axes: describe_axes(axes),
            });
        }
        for (index, key) in keys.iter().enumerate() {
            if key.len() != axes.len() {
                return Err(PipedbError::ChunkArity {
                    axes: describe_axes(axes),
                    index,
                    expected: axes.len(),
                    found: key.len(),
                });
            }
        }
        if let Some(levels) = subset {
            if let Some(&level) = levels.iter().find(|&&level| level >= axes.len()) {
                return Err(PipedbError::InvalidLevel {
                    axes: describe_axes(axes),
                    level,
                });
            }
        }

        let keys: BTreeSet<Vec<Chunk>> = keys.into_iter().map(|key| key.0).collect();

        for (level, axis) in axes.iter().enumerate() {
            if !in_subset(subset, level) {
                continue;
            }

            let mut groups: BTreeMap<&[Chunk], BTreeSet<Chunk>> = BTreeMap::new();
            for key in &keys {
                groups
                    .entry(&key[..level])
                    .or_default()
                    .insert(key[level].clone());
            }

            for (prefix, level_chunks) in groups {
                let level_node = prefix.iter().zip(axes).fold(node.clone(), |n, (chunk, a)| {
                    n.extend(AxisInstance::new(a.clone(), Some(chunk.clone())))
                });
                self.store_axis_chunks(axis, &level_node, level_chunks)?;
            }
        }

        Ok(())
    }

    /// Persist the chunk set of `axis` at `node`
    ///
    /// Temp directories for every child node are created up front so jobs
    /// never race on creating them. Returns whether the persisted set changed;
    /// storing an identical set leaves the chunk file untouched.
    pub fn store_axis_chunks(
        &mut self,
        axis: &Axis,
        node: &Node,
        chunks: impl IntoIterator<Item = Chunk>,
    ) -> PipedbResult<bool> {
        let chunks: Vec<Chunk> = chunks
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for chunk in &chunks {
            let child = node.extend(AxisInstance::new(axis.clone(), Some(chunk.clone())));
            fsutil::makedirs(&self.temps_dir.join(child.subdir()))?;
        }

        let key = (axis.clone(), node.clone());
        if chunks.is_empty() {
            self.cached_chunks.borrow_mut().remove(&key);
        } else {
            self.cached_chunks
                .borrow_mut()
                .insert(key, chunks.iter().cloned().map(Some).collect());
        }

        let changed = self.store.store(axis, node, &chunks)?;
        if changed {
            info!("Stored {} chunk(s) for axis {} at {}", chunks.len(), axis, node);
        } else {
            debug!("Chunks for axis {} at {} unchanged", axis, node);
        }
        Ok(changed)
    }

    /// Chunk resources a merge over `axes` at `node` depends on
    pub fn get_merge_inputs(
        &self,
        axes: &[Axis],
        node: &Node,
        subset: Option<&[usize]>,
    ) -> PipedbResult<Vec<ChunkResource>> {
        self.get_splitmerge(axes, node, subset, ChunkResourceKind::Input)
    }

    /// Chunk resources a split over `axes` at `node` produces
    pub fn get_split_outputs(
        &self,
        axes: &[Axis],
        node: &Node,
        subset: Option<&[usize]>,
    ) -> PipedbResult<Vec<ChunkResource>> {
        self.get_splitmerge(axes, node, subset, ChunkResourceKind::Output)
    }

    fn get_splitmerge(
        &self,
        axes: &[Axis],
        node: &Node,
        subset: Option<&[usize]>,
        kind: ChunkResourceKind,
    ) -> PipedbResult<Vec<ChunkResource>> {
        let mut resources = Vec::new();
        for (level, axis) in axes.iter().enumerate() {
            if !in_subset(subset, level) {
                continue;
            }
            if level == 0 {
                resources.push(ChunkResource {
                    axis: axis.clone(),
                    node: node.clone(),
                    kind,
                });
                continue;
            }
            for level_node in &self.retrieve_nodes(&axes[..level], node) {
                resources.push(ChunkResource {
                    axis: axis.clone(),
                    node: level_node?,
                    kind,
                });
            }
        }
        Ok(resources)
    }

    /// Implicit input of every job at a non-root node
    ///
    /// The node depends on the chunk set that produced its last component, so
    /// re-splitting an axis invalidates everything addressed beneath it.
    pub fn get_node_inputs(&self, node: &Node) -> Option<ChunkResource> {
        let last = node.last()?;
        Some(ChunkResource {
            axis: last.axis.clone(),
            node: node.parent()?,
            kind: ChunkResourceKind::Input,
        })
    }

    /// When the chunk set of `axis` at `node` last changed
    pub fn chunks_createtime(&self, axis: &Axis, node: &Node) -> PipedbResult<Option<f64>> {
        self.store.modified(axis, node)
    }
}

fn in_subset(subset: Option<&[usize]>, level: usize) -> bool {
    subset.map_or(true, |levels| levels.contains(&level))
}
