mod edge;
mod graph;
mod node;
mod tally;

pub use edge::{EdgeKey, EdgeMap};
pub use graph::{Accumulable, Graph, WeightedGraph};
pub use node::{NodeId, NodeKind};
pub use tally::{Activity, ActivityTally, Channel, DirectionalSum, TallyGraph};
