//! multigraph - 内存无向多重图基础结构
//!
//! 为上层图算法（遍历、着色、最短路径等）提供顶点、边和图：
//! - 连接/断开时强制维护双向邻接与度数
//! - 支持自环与平行边，自环计 2 度
//! - 顶点按身份比较，内容可变且不影响哈希
//! - 邻接与度数不一致时返回不可恢复的错误

pub mod error;
pub mod graph;

// 重导出常用类型
pub use error::{Error, Result};
pub use graph::{Arena, Edge, EdgeId, Graph, GraphConfig, UnlinkOutcome, Vertex, VertexId};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
