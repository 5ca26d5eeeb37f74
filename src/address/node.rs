//! Nodes: immutable paths through nested splits

use crate::address::axis::{AxisInstance, Chunk};
use std::fmt;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

/// Ordered sequence of axis instances identifying one point in the split
/// address space
///
/// Nodes are values: extending one returns a new node and leaves the original
/// untouched. The empty node is the root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Node(Arc<[AxisInstance]>);

impl Node {
    /// The root node
    pub fn root() -> Self {
        Self(Arc::from(Vec::new()))
    }

    pub fn from_instances(instances: impl IntoIterator<Item = AxisInstance>) -> Self {
        Self(instances.into_iter().collect())
    }

    /// Return a new node with `instance` appended
    pub fn extend(&self, instance: AxisInstance) -> Self {
        let mut instances = Vec::with_capacity(self.0.len() + 1);
        instances.extend_from_slice(&self.0);
        instances.push(instance);
        Self(instances.into())
    }

    pub fn instances(&self) -> &[AxisInstance] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&AxisInstance> {
        self.0.last()
    }

    /// The node this one was extended from, `None` for the root
    pub fn parent(&self) -> Option<Node> {
        match self.0.split_last() {
            Some((_, rest)) => Some(Self(rest.into())),
            None => None,
        }
    }

    /// Relative directory for this node
    ///
    /// Each instance contributes an axis component and a chunk component.
    /// Rendering is injective: distinct nodes never share a path.
    pub fn subdir(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for instance in self.0.iter() {
            path.push(escape_component(instance.axis.as_str()));
            path.push(render_chunk(instance.chunk.as_ref()));
        }
        path
    }

    /// Slash-joined form of [`Node::subdir`], stable across platforms
    pub fn key(&self) -> String {
        let mut key = String::new();
        for (idx, instance) in self.0.iter().enumerate() {
            if idx > 0 {
                key.push('/');
            }
            key.push_str(&escape_component(instance.axis.as_str()));
            key.push('/');
            key.push_str(&render_chunk(instance.chunk.as_ref()));
        }
        key
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for instance in self.0.iter() {
            write!(f, "/{}", instance)?;
        }
        Ok(())
    }
}

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

/// Percent-encode every byte outside `[A-Za-z0-9_-]`
///
/// Escaped names never contain `.` or `/`, which leaves `.` free for file
/// suffixes next to node directories. The empty name renders as a lone `%`,
/// which no non-empty name can produce, so it still occupies a path component.
pub fn escape_component(name: &str) -> String {
    if name.is_empty() {
        return "%".to_string();
    }
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if is_plain(byte) {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{:02X}", byte);
        }
    }
    out
}

fn render_chunk(chunk: Option<&Chunk>) -> String {
    match chunk {
        None => "_".to_string(),
        Some(Chunk::Int(n)) => n.to_string(),
        Some(Chunk::Str(s)) => {
            let escaped = escape_component(s);
            // keep strings from colliding with the null marker or integers
            if escaped == "_" || (!s.is_empty() && s.parse::<i64>().is_ok()) {
                let first = s.as_bytes()[0];
                format!("%{:02X}{}", first, escape_component(&s[1..]))
            } else {
                escaped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn inst(axis: &str, chunk: Option<Chunk>) -> AxisInstance {
        AxisInstance::new(axis, chunk)
    }

    #[test]
    fn extend_is_append_only() {
        let root = Node::root();
        let child = root.extend(inst("sample", Some("A".into())));
        assert!(root.is_root());
        assert_eq!(child.len(), 1);
        assert_eq!(child.parent(), Some(root.clone()));
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn equality_is_structural() {
        let a = Node::root().extend(inst("sample", Some(1.into())));
        let b = Node::from_instances([inst("sample", Some(1.into()))]);
        assert_eq!(a, b);
        assert_ne!(a, Node::root().extend(inst("sample", Some("1".into()))));
    }

    #[test]
    fn subdir_layout() {
        let node = Node::root()
            .extend(inst("sample", Some("A".into())))
            .extend(inst("region", None));
        assert_eq!(node.subdir(), PathBuf::from("sample/A/region/_"));
        assert_eq!(node.key(), "sample/A/region/_");
        assert_eq!(Node::root().subdir(), PathBuf::new());
    }

    #[test]
    fn rendering_is_injective() {
        let chunks = [
            None,
            Some(Chunk::from(1)),
            Some(Chunk::from(-1)),
            Some(Chunk::from("1")),
            Some(Chunk::from("-1")),
            Some(Chunk::from("_")),
            Some(Chunk::from("")),
            Some(Chunk::from("%")),
            Some(Chunk::from("a/b")),
            Some(Chunk::from("a%2Fb")),
            Some(Chunk::from("..")),
        ];
        let mut seen = HashSet::new();
        for axis in ["x", "", "%"] {
            for chunk in chunks.iter().cloned() {
                let node = Node::root().extend(inst(axis, chunk));
                assert!(seen.insert(node.key()), "collision for {}", node);
            }
        }
    }

    #[test]
    fn empty_axis_names_keep_their_component() {
        let empty_axes = Node::from_instances([
            inst("", Some("A".into())),
            inst("", Some("B".into())),
        ]);
        let named = Node::from_instances([inst("A", Some("B".into()))]);
        assert_ne!(empty_axes.subdir(), named.subdir());
        assert_ne!(empty_axes.key(), named.key());
        assert_eq!(empty_axes.subdir(), PathBuf::from("%/A/%/B"));
    }

    #[test]
    fn escape_leaves_no_dots_or_slashes() {
        let escaped = escape_component("../etc/passwd");
        assert!(!escaped.contains('.'));
        assert!(!escaped.contains('/'));
    }

    #[test]
    fn display_root_and_child() {
        assert_eq!(Node::root().to_string(), "/");
        let node = Node::root().extend(inst("sample", Some("A".into())));
        assert_eq!(node.to_string(), "/sample:A");
    }
}
