//! Lazy, restartable enumeration of the node address space
//!
//! A [`NodeSet`] describes a walk (axes plus a base node); every call to
//! [`NodeSet::iter`] starts a fresh depth-first traversal that reads chunk
//! sets through the manager's cache, so it sees chunk sets stored since the
//! previous traversal.

use crate::address::{Axis, AxisInstance, Chunk, Node};
use crate::error::PipedbResult;
use crate::nodes::NodeManager;
use std::sync::Arc;

/// Every node reached by taking one chunk per axis from `base`
#[derive(Clone)]
pub struct NodeSet<'m> {
    manager: &'m NodeManager,
    axes: Vec<Axis>,
    base: Node,
}

impl<'m> NodeSet<'m> {
    pub(crate) fn new(manager: &'m NodeManager, axes: &[Axis], base: &Node) -> Self {
        Self {
            manager,
            axes: axes.to_vec(),
            base: base.clone(),
        }
    }

    /// Start a new traversal
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter {
            manager: self.manager,
            axes: &self.axes,
            pending: Some(self.base.clone()),
            stack: Vec::new(),
        }
    }

    /// Run a traversal to completion
    pub fn to_vec(&self) -> PipedbResult<Vec<Node>> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a NodeSet<'_> {
    type Item = PipedbResult<Node>;
    type IntoIter = NodeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct Frame {
    node: Node,
    chunks: Arc<[Option<Chunk>]>,
    next: usize,
}

/// Depth-first traversal over the chunk sets of a [`NodeSet`]
///
/// Yields an error at most once; the iterator is exhausted afterwards.
pub struct NodeIter<'a> {
    manager: &'a NodeManager,
    axes: &'a [Axis],
    pending: Option<Node>,
    stack: Vec<Frame>,
}

impl NodeIter<'_> {
    fn descend(&mut self, node: Node) -> PipedbResult<()> {
        let axis = &self.axes[self.stack.len()];
        let chunks = self.manager.retrieve_axis_chunks(axis, &node)?;
        self.stack.push(Frame {
            node,
            chunks,
            next: 0,
        });
        Ok(())
    }
}

impl Iterator for NodeIter<'_> {
    type Item = PipedbResult<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(base) = self.pending.take() {
            if self.axes.is_empty() {
                return Some(Ok(base));
            }
            if let Err(e) = self.descend(base) {
                return Some(Err(e));
            }
        }

        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let frame = &mut self.stack[depth];
            let Some(chunk) = frame.chunks.get(frame.next).cloned() else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;

            let child = frame
                .node
                .extend(AxisInstance::new(self.axes[depth].clone(), chunk));
            if depth + 1 == self.axes.len() {
                return Some(Ok(child));
            }
            if let Err(e) = self.descend(child) {
                self.stack.clear();
                return Some(Err(e));
            }
        }
    }
}

/// Chunk tuples (one value per axis) reached from a base node
#[derive(Clone)]
pub struct ChunkSet<'m> {
    nodes: NodeSet<'m>,
}

impl<'m> ChunkSet<'m> {
    pub(crate) fn new(manager: &'m NodeManager, axes: &[Axis], base: &Node) -> Self {
        Self {
            nodes: NodeSet::new(manager, axes, base),
        }
    }

    /// Start a new traversal
    pub fn iter(&self) -> ChunkIter<'_> {
        ChunkIter {
            offset: self.nodes.base.len(),
            nodes: self.nodes.iter(),
        }
    }

    /// Run a traversal to completion
    pub fn to_vec(&self) -> PipedbResult<Vec<Vec<Option<Chunk>>>> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a ChunkSet<'_> {
    type Item = PipedbResult<Vec<Option<Chunk>>>;
    type IntoIter = ChunkIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Traversal yielding the chunk part of each node below the base
pub struct ChunkIter<'a> {
    nodes: NodeIter<'a>,
    offset: usize,
}

impl Iterator for ChunkIter<'_> {
    type Item = PipedbResult<Vec<Option<Chunk>>>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset;
        self.nodes.next().map(|node| {
            node.map(|node| {
                node.instances()[offset..]
                    .iter()
                    .map(|instance| instance.chunk.clone())
                    .collect()
            })
        })
    }
}
