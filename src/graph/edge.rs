//! 边定义
//!
//! 无向边：两个端点组成的无序对，允许自环和平行边。
//! 边只能通过 [`Edge::link`] 创建，创建时同时更新两个端点的邻接状态；
//! [`Edge::unlink`] 是其逆操作。

use super::arena::Arena;
use super::vertex::VertexId;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::cell::Cell;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::debug;

/// 边 ID（实例身份，同一 Arena 内不复用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl EdgeId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for EdgeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// 断开操作的正常结果（不可恢复的错误走 `Err`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlinkOutcome {
    /// 已断开
    Unlinked,
    /// 两个顶点并未相连，或该边已被断开
    NotLinked,
    /// 顶点或边不属于该图
    NotFound,
}

impl UnlinkOutcome {
    pub fn is_unlinked(&self) -> bool {
        matches!(self, UnlinkOutcome::Unlinked)
    }
}

/// 边
///
/// 克隆得到的是同一条边实例的另一个句柄（`same_instance` 为真），
/// 所有句柄共享存活状态：任一句柄断开后，其余句柄都不再存活。
pub struct Edge<T> {
    /// 边 ID
    id: EdgeId,
    /// 签发该边的 Arena
    arena: u64,
    /// 存活标记，克隆间共享
    alive: Rc<Cell<bool>>,
    /// 端点 1
    endpoint1: VertexId,
    /// 端点 2
    endpoint2: VertexId,
    _content: PhantomData<fn() -> T>,
}

impl<T> Edge<T> {
    /// 连接两个顶点并返回新边。
    ///
    /// 不检查已有邻接，平行边与自环都允许。只在端点不属于 `arena` 时失败。
    pub fn link(arena: &mut Arena<T>, v1: VertexId, v2: VertexId) -> Result<Self> {
        let id = arena.register_edge(v1, v2)?;
        debug!(edge = %id, %v1, %v2, "连接");
        Ok(Self {
            id,
            arena: arena.tag(),
            alive: Rc::new(Cell::new(true)),
            endpoint1: v1,
            endpoint2: v2,
            _content: PhantomData,
        })
    }

    /// 断开这条边，撤销两端的邻接。
    ///
    /// 边已断开或不属于 `arena` 时返回 `NotLinked`；
    /// 邻接与度数不一致时返回 `BrokenInvariant`。
    /// 断开后持有该边的图不再报告它。
    pub fn unlink(self, arena: &mut Arena<T>) -> Result<UnlinkOutcome> {
        let outcome = arena.revoke_edge(&self)?;
        if outcome.is_unlinked() {
            self.alive.set(false);
        }
        debug!(edge = %self.id, ?outcome, "断开");
        Ok(outcome)
    }

    /// 是否尚未断开
    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub(super) fn arena_tag(&self) -> u64 {
        self.arena
    }

    /// 绕过 `link` 构造任意 ID 的边，用于测试登记校验
    #[cfg(test)]
    pub(super) fn forge(arena: &Arena<T>, id: EdgeId, v1: VertexId, v2: VertexId) -> Self {
        Self {
            id,
            arena: arena.tag(),
            alive: Rc::new(Cell::new(true)),
            endpoint1: v1,
            endpoint2: v2,
            _content: PhantomData,
        }
    }

    /// 获取边 ID
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// 获取端点 1
    pub fn endpoint1(&self) -> VertexId {
        self.endpoint1
    }

    /// 获取端点 2
    pub fn endpoint2(&self) -> VertexId {
        self.endpoint2
    }

    /// 按存储顺序获取两个端点
    pub fn endpoints(&self) -> (VertexId, VertexId) {
        (self.endpoint1, self.endpoint2)
    }

    /// 给定一个端点，返回另一个端点
    pub fn other_endpoint(&self, v: VertexId) -> Option<VertexId> {
        if v == self.endpoint1 {
            Some(self.endpoint2)
        } else if v == self.endpoint2 {
            Some(self.endpoint1)
        } else {
            None
        }
    }

    /// 是否关联到顶点 `v`
    pub fn is_incident_to(&self, v: VertexId) -> bool {
        self.endpoint1 == v || self.endpoint2 == v
    }

    /// 是否为自环
    pub fn is_self_loop(&self) -> bool {
        self.endpoint1 == self.endpoint2
    }

    /// 是否连接同一对（无序）顶点
    pub fn connects(&self, v1: VertexId, v2: VertexId) -> bool {
        self.pair() == ordered(v1, v2)
    }

    /// 是否为同一条边实例
    pub fn same_instance(&self, other: &Edge<T>) -> bool {
        self.id == other.id
    }

    /// 是否与另一条边平行：不同实例，端点对相同
    pub fn is_parallel_to(&self, other: &Edge<T>) -> bool {
        !self.same_instance(other) && self == other
    }

    fn pair(&self) -> (VertexId, VertexId) {
        ordered(self.endpoint1, self.endpoint2)
    }
}

fn ordered(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl<T> Clone for Edge<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            arena: self.arena,
            alive: Rc::clone(&self.alive),
            endpoint1: self.endpoint1,
            endpoint2: self.endpoint2,
            _content: PhantomData,
        }
    }
}

impl<T> PartialEq for Edge<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pair() == other.pair()
    }
}

impl<T> Eq for Edge<T> {}

impl<T> Hash for Edge<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // (a, b) 与 (b, a) 哈希相同
        self.pair().hash(state);
    }
}

impl<T> fmt::Debug for Edge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("id", &self.id)
            .field("endpoint1", &self.endpoint1)
            .field("endpoint2", &self.endpoint2)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<T> fmt::Display for Edge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({} - {})", self.endpoint1, self.endpoint2)
    }
}
