use std::{fmt, str::FromStr, sync::Arc};

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

use crate::region::RegionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Cell,       // Source-partition grid cell
    Block,      // Target-partition census block
    Category,   // Non-spatial node, e.g. a calling code
}

impl NodeKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            NodeKind::Cell => "cell",
            NodeKind::Block => "block",
            NodeKind::Category => "category",
        }
    }
}

impl FromStr for NodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cell" => Ok(NodeKind::Cell),
            "block" => Ok(NodeKind::Block),
            "category" => Ok(NodeKind::Category),
            other => Err(anyhow!("Unknown node kind: {other:?}")),
        }
    }
}

/// Graph node key: the kind tag plus the element's own identifier.
/// Written as `kind:id`, e.g. `cell:4455` or `category:39`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId {
    kind: NodeKind,
    id: Arc<str>,
}

impl NodeId {
    pub fn new(kind: NodeKind, id: impl Into<Arc<str>>) -> Self {
        Self { kind, id: id.into() }
    }

    #[inline] pub fn cell(id: &RegionId) -> Self { Self::new(NodeKind::Cell, id.shared()) }

    #[inline] pub fn block(id: &RegionId) -> Self { Self::new(NodeKind::Block, id.shared()) }

    #[inline] pub fn category(code: &str) -> Self { Self::new(NodeKind::Category, code) }

    #[inline] pub fn kind(&self) -> NodeKind { self.kind }

    #[inline] pub fn id(&self) -> &str { &self.id }

    /// The identifier as a region id (meaningful for cells and blocks).
    #[inline] pub fn region(&self) -> RegionId { RegionId::from(self.id.clone()) }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.to_str(), self.id)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s.split_once(':')
            .ok_or_else(|| anyhow!("Node id must look like kind:id, got {s:?}"))?;
        Ok(Self::new(kind.parse()?, id))
    }
}

impl TryFrom<String> for NodeId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<NodeId> for String {
    fn from(node: NodeId) -> Self { node.to_string() }
}
