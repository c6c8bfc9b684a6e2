//! 图核心模块
//!
//! 定义顶点、边、图以及拥有顶点的 Arena

mod arena;
mod edge;
mod graph;
mod vertex;

pub use arena::Arena;
pub use edge::{Edge, EdgeId, UnlinkOutcome};
pub use graph::{Graph, GraphConfig};
pub use vertex::{Vertex, VertexId};
