use iobj_parser::PositionRange;
use std::fmt;
use std::hash;
use triomphe::Arc;

/// Smart pointer to a compiled artifact.
///
/// Thread-safe and reference-counted, and additionally carries an optional
/// [`PositionRange`] pointing at the source the artifact was compiled from.
/// Compiled schemas are shared through this pointer: the definitions table,
/// nested member definitions and schema references all hold the same
/// allocation instead of cloning the tree.
pub struct Node<T>(Arc<NodeInner<T>>);

#[derive(Clone)]
struct NodeInner<T> {
    range: Option<PositionRange>,
    node: T,
}

impl<T> Node<T> {
    /// Create a new `Node` for something compiled from the given source
    /// range.
    pub fn new_parsed(node: T, range: PositionRange) -> Self {
        Self(Arc::new(NodeInner {
            range: Some(range),
            node,
        }))
    }

    /// Create a new `Node` for something created programmatically, not
    /// compiled from a source file.
    pub fn new_synthetic(node: T) -> Self {
        Self(Arc::new(NodeInner { range: None, node }))
    }

    pub fn range(&self) -> Option<PositionRange> {
        self.0.range
    }

    /// Returns the given `node` at the same source range as `self` (e.g.
    /// for a type conversion).
    pub fn same_range<U>(&self, node: U) -> Node<U> {
        Node(Arc::new(NodeInner {
            range: self.0.range,
            node,
        }))
    }

    /// Returns whether two `Node`s point to the same memory allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns a mutable reference to `T`, cloning it if necessary.
    pub fn make_mut(&mut self) -> &mut T
    where
        T: Clone,
    {
        &mut Arc::make_mut(&mut self.0).node
    }
}

impl<T> std::ops::Deref for Node<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0.node
    }
}

impl<T> AsRef<T> for Node<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(range) = self.range() {
            write!(f, "@{}..{} ", range.start.pos, range.end.pos)?;
        }
        self.0.node.fmt(f)
    }
}

impl<T: PartialEq> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.node == other.0.node // range not included
    }
}

impl<T: Eq> Eq for Node<T> {}

impl<T: hash::Hash> hash::Hash for Node<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.node.hash(state) // range not included
    }
}
