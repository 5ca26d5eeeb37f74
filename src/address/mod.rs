//! Multi-axis addressing primitives
//!
//! A pipeline splits work along named axes. Every job instance is addressed
//! by a [`Node`]: the ordered path of [`AxisInstance`]s taken through nested
//! splits. Nodes render to unique directory paths, which is what ties the
//! address space to the on-disk layout of a workflow.

pub mod axis;
pub mod node;

pub use axis::{Axis, AxisInstance, Chunk, ChunkKey};
pub use node::{escape_component, Node};
