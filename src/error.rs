//! 错误类型定义

use crate::graph::{EdgeId, VertexId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("顶点不存在: {0}")]
    VertexNotFound(VertexId),

    #[error("边 {edge} 的端点 {vertex} 不在图中")]
    ClosureViolation { edge: EdgeId, vertex: VertexId },

    /// 邻接集合与度数不一致，数据模型已损坏，不可恢复
    #[error("内部一致性被破坏: {0}")]
    BrokenInvariant(String),
}

impl Error {
    /// 是否为不可恢复的内部一致性错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::BrokenInvariant(_))
    }
}
