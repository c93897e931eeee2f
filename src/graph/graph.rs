use ahash::AHashMap;
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};

use crate::attributes::Attributes;

use super::{EdgeKey, EdgeMap, NodeId, NodeKind};

/// Edge payloads that can be folded together when two graphs are merged.
pub trait Accumulable {
    fn absorb(&mut self, other: Self);
}

impl Accumulable for f64 {
    #[inline] fn absorb(&mut self, other: Self) { *self += other }
}

/// An undirected graph with attributed nodes and one accumulated value per
/// unordered node pair. Node order is insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph<V> {
    nodes: IndexMap<NodeId, Attributes>,
    edges: EdgeMap<V>,
}

/// Graph whose edges carry a single accumulated weight.
pub type WeightedGraph = Graph<f64>;

impl<V> Default for Graph<V> {
    fn default() -> Self {
        Self { nodes: IndexMap::new(), edges: EdgeMap::default() }
    }
}

impl<V> Graph<V> {
    pub fn new() -> Self { Self::default() }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.nodes.len() }

    /// Get the number of edges in the graph (self-loops included).
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    #[inline] pub fn contains_node(&self, node: &NodeId) -> bool { self.nodes.contains_key(node) }

    /// Register a node if it is new; returns its attributes either way.
    pub fn add_node(&mut self, node: NodeId) -> &mut Attributes {
        self.nodes.entry(node).or_default()
    }

    #[inline] pub fn attributes(&self, node: &NodeId) -> Option<&Attributes> { self.nodes.get(node) }

    #[inline] pub fn attributes_mut(&mut self, node: &NodeId) -> Option<&mut Attributes> { self.nodes.get_mut(node) }

    /// Iterate over nodes and their attributes in insertion order.
    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Attributes)> { self.nodes.iter() }

    /// Iterate mutably over nodes and their attributes in insertion order.
    #[inline]
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (&NodeId, &mut Attributes)> { self.nodes.iter_mut() }

    /// Nodes of a single kind, in insertion order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = (&NodeId, &Attributes)> {
        self.nodes.iter().filter(move |(node, _)| node.kind() == kind)
    }

    #[inline] pub fn edge(&self, u: &NodeId, v: &NodeId) -> Option<&V> {
        self.edges.get(&EdgeKey::new(u.clone(), v.clone()))
    }

    #[inline] pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &V)> { self.edges.iter() }

    /// Edges ordered by key, for deterministic traversal.
    #[inline] pub fn edges_sorted(&self) -> Vec<(&EdgeKey, &V)> { self.edges.sorted() }

    #[inline] pub fn edge_values_mut(&mut self) -> impl Iterator<Item = &mut V> { self.edges.values_mut() }

    /// Get the edge value for the pair, registering both nodes and inserting a
    /// default value first if needed.
    pub fn edge_entry(&mut self, u: NodeId, v: NodeId) -> &mut V where V: Default {
        if !self.nodes.contains_key(&u) { self.nodes.insert(u.clone(), Attributes::new()); }
        if !self.nodes.contains_key(&v) { self.nodes.insert(v.clone(), Attributes::new()); }
        self.edges.get_or_insert(EdgeKey::new(u, v))
    }

    /// Neighbor lists for every node with at least one edge, each sorted by
    /// neighbor. A self-loop is listed once.
    pub fn neighbors(&self) -> AHashMap<&NodeId, Vec<(&NodeId, &V)>> {
        let mut adj: AHashMap<&NodeId, Vec<(&NodeId, &V)>> = AHashMap::new();
        for (key, value) in self.edges.iter() {
            let (a, b) = key.endpoints();
            adj.entry(a).or_default().push((b, value));
            if !key.is_loop() {
                adj.entry(b).or_default().push((a, value));
            }
        }
        adj.values_mut().for_each(|list| list.sort_unstable_by(|x, y| x.0.cmp(y.0)));
        adj
    }
}

impl<V: Accumulable + Default> Graph<V> {
    /// Fold another graph into this one: nodes are unioned (existing attributes
    /// win), edge values are accumulated, never replaced.
    pub fn merge(&mut self, other: Graph<V>) {
        for (node, attrs) in other.nodes {
            self.nodes.entry(node).or_insert(attrs);
        }
        for (key, value) in other.edges {
            self.edges.get_or_insert(key).absorb(value);
        }
    }
}

impl WeightedGraph {
    /// Add `weight` to the edge between `u` and `v`, creating it if needed.
    #[inline]
    pub fn add_weight(&mut self, u: NodeId, v: NodeId, weight: f64) {
        *self.edge_entry(u, v) += weight;
    }

    /// Weight of the edge between `u` and `v`, if present.
    #[inline]
    pub fn weight(&self, u: &NodeId, v: &NodeId) -> Option<f64> {
        self.edge(u, v).copied()
    }

    /// Sum of all edge weights.
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|(_, w)| *w).sum()
    }
}

/// Serialized form: nodes in insertion order, edges sorted by key.
#[derive(Serialize)]
struct SnapshotRef<'a, V> {
    nodes: Vec<NodeEntryRef<'a>>,
    edges: Vec<(&'a NodeId, &'a NodeId, &'a V)>,
}

#[derive(Serialize)]
struct NodeEntryRef<'a> {
    id: &'a NodeId,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    attributes: &'a Attributes,
}

#[derive(Deserialize)]
struct Snapshot<V> {
    nodes: Vec<NodeEntry>,
    edges: Vec<(NodeId, NodeId, V)>,
}

#[derive(Deserialize)]
struct NodeEntry {
    id: NodeId,
    #[serde(default)]
    attributes: Attributes,
}

impl<V: Serialize> Serialize for Graph<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SnapshotRef {
            nodes: self.nodes.iter()
                .map(|(id, attributes)| NodeEntryRef { id, attributes })
                .collect(),
            edges: self.edges.sorted().into_iter()
                .map(|(key, value)| {
                    let (a, b) = key.endpoints();
                    (a, b, value)
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, V: DeserializeOwned> Deserialize<'de> for Graph<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = Snapshot::<V>::deserialize(deserializer)?;
        let mut graph = Graph {
            nodes: snapshot.nodes.into_iter().map(|entry| (entry.id, entry.attributes)).collect(),
            edges: EdgeMap::default(),
        };
        for (a, b, value) in snapshot.edges {
            if !graph.nodes.contains_key(&a) || !graph.nodes.contains_key(&b) {
                return Err(serde::de::Error::custom(format!("edge {a} - {b} references an unknown node")));
            }
            if graph.edges.insert(EdgeKey::new(a.clone(), b.clone()), value).is_some() {
                return Err(serde::de::Error::custom(format!("duplicate edge {a} - {b}")));
            }
        }
        Ok(graph)
    }
}
