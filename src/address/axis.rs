//! Axes, chunks and axis instances

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named dimension along which work is split
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Axis(String);

impl Axis {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Axis {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Axis {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a list of axes for error messages
pub(crate) fn describe_axes(axes: &[Axis]) -> String {
    axes.iter()
        .map(Axis::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One addressable item along an axis
///
/// Chunks are opaque to the engine apart from their ordering. Integers sort
/// before strings so mixed sets still enumerate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Chunk {
    Int(i64),
    Str(String),
}

impl Chunk {
    /// Parse a chunk from command-line text
    ///
    /// Only canonical integer text becomes `Int`; `"01"` and `"+1"` stay
    /// strings so they remain distinct from `1`.
    pub fn parse(text: &str) -> Self {
        match text.parse::<i64>() {
            Ok(n) if n.to_string() == text => Self::Int(n),
            _ => Self::Str(text.to_string()),
        }
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Chunk {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Chunk {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<usize> for Chunk {
    fn from(n: usize) -> Self {
        Self::Int(n as i64)
    }
}

impl From<&str> for Chunk {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Chunk {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// A chunk tuple with one value per axis of a multi-axis split
///
/// Single chunks convert into 1-tuples, so single-axis callers can pass plain
/// values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkKey(pub Vec<Chunk>);

impl ChunkKey {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Chunk> for ChunkKey {
    fn from(chunk: Chunk) -> Self {
        Self(vec![chunk])
    }
}

impl From<Vec<Chunk>> for ChunkKey {
    fn from(chunks: Vec<Chunk>) -> Self {
        Self(chunks)
    }
}

impl From<&str> for ChunkKey {
    fn from(s: &str) -> Self {
        Chunk::from(s).into()
    }
}

impl From<String> for ChunkKey {
    fn from(s: String) -> Self {
        Chunk::from(s).into()
    }
}

impl From<i64> for ChunkKey {
    fn from(n: i64) -> Self {
        Chunk::from(n).into()
    }
}

impl From<i32> for ChunkKey {
    fn from(n: i32) -> Self {
        Chunk::from(n).into()
    }
}

impl<A: Into<Chunk>, B: Into<Chunk>> From<(A, B)> for ChunkKey {
    fn from((a, b): (A, B)) -> Self {
        Self(vec![a.into(), b.into()])
    }
}

impl<A: Into<Chunk>, B: Into<Chunk>, C: Into<Chunk>> From<(A, B, C)> for ChunkKey {
    fn from((a, b, c): (A, B, C)) -> Self {
        Self(vec![a.into(), b.into(), c.into()])
    }
}

/// A concrete point on an axis
///
/// A `None` chunk means the axis was never split at this point, so the stage
/// runs as a single logical instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AxisInstance {
    pub axis: Axis,
    pub chunk: Option<Chunk>,
}

impl AxisInstance {
    pub fn new(axis: impl Into<Axis>, chunk: Option<Chunk>) -> Self {
        Self {
            axis: axis.into(),
            chunk,
        }
    }
}

impl fmt::Display for AxisInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chunk {
            Some(chunk) => write!(f, "{}:{}", self.axis, chunk),
            None => write!(f, "{}:_", self.axis),
        }
    }
}
