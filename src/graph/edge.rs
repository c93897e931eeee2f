use std::collections::HashMap;

use ahash::RandomState;

use super::NodeId;

/// Unordered node pair, stored with the smaller endpoint first, so that a pair
/// has exactly one key regardless of traversal direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    a: NodeId,
    b: NodeId,
}

impl EdgeKey {
    pub fn new(u: NodeId, v: NodeId) -> Self {
        if u <= v { Self { a: u, b: v } } else { Self { a: v, b: u } }
    }

    /// Both endpoints, smaller first.
    #[inline] pub fn endpoints(&self) -> (&NodeId, &NodeId) { (&self.a, &self.b) }

    /// True if both endpoints are the same node.
    #[inline] pub fn is_loop(&self) -> bool { self.a == self.b }

    /// The endpoint opposite `node`, if `node` is an endpoint.
    pub fn other(&self, node: &NodeId) -> Option<&NodeId> {
        if *node == self.a { Some(&self.b) } else if *node == self.b { Some(&self.a) } else { None }
    }
}

/// Sparse symmetric edge storage: one flat map from canonical pair to value.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap<V> {
    edges: HashMap<EdgeKey, V, RandomState>,
}

impl<V> Default for EdgeMap<V> {
    fn default() -> Self {
        Self { edges: HashMap::default() }
    }
}

impl<V> EdgeMap<V> {
    #[inline] pub fn len(&self) -> usize { self.edges.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.edges.is_empty() }

    #[inline] pub fn get(&self, key: &EdgeKey) -> Option<&V> { self.edges.get(key) }

    #[inline] pub fn insert(&mut self, key: EdgeKey, value: V) -> Option<V> { self.edges.insert(key, value) }

    /// Get the value for `key`, inserting a default first if the pair is new.
    #[inline]
    pub fn get_or_insert(&mut self, key: EdgeKey) -> &mut V where V: Default {
        self.edges.entry(key).or_default()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, &V)> { self.edges.iter() }

    #[inline]
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> { self.edges.values_mut() }

    /// Entries ordered by key.
    pub fn sorted(&self) -> Vec<(&EdgeKey, &V)> {
        let mut entries = self.edges.iter().collect::<Vec<_>>();
        entries.sort_unstable_by(|x, y| x.0.cmp(y.0));
        entries
    }
}

impl<V> IntoIterator for EdgeMap<V> {
    type Item = (EdgeKey, V);
    type IntoIter = std::collections::hash_map::IntoIter<EdgeKey, V>;

    fn into_iter(self) -> Self::IntoIter { self.edges.into_iter() }
}
