//! 顶点定义
//!
//! 顶点以句柄 `VertexId` 作为身份，内容可变且不参与相等性与哈希。
//! 度数与邻居集合只能由边的连接/断开协议修改。

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{error, trace};

/// 顶点 ID（在所属 Arena 内全局唯一，不复用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u64);

impl VertexId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VertexId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// 顶点
#[derive(Debug)]
pub struct Vertex<T> {
    /// 顶点 ID
    id: VertexId,
    /// 顶点内容
    content: T,
    /// 度数：作为边端点出现的次数，自环计 2 次
    degree: usize,
    /// 邻居 -> 连接该邻居的边数（对外只暴露为集合）
    neighbours: IndexMap<VertexId, usize>,
}

impl<T> Vertex<T> {
    /// 创建新顶点，度数为 0，无邻居
    pub(super) fn new(id: VertexId, content: T) -> Self {
        Self {
            id,
            content,
            degree: 0,
            neighbours: IndexMap::new(),
        }
    }

    /// 获取顶点 ID
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// 获取内容
    pub fn content(&self) -> &T {
        &self.content
    }

    /// 获取可变内容
    pub fn content_mut(&mut self) -> &mut T {
        &mut self.content
    }

    /// 替换内容，返回旧值
    pub fn set_content(&mut self, content: T) -> T {
        std::mem::replace(&mut self.content, content)
    }

    /// 获取度数
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// 邻居集合（按首次连接顺序，每个邻居只出现一次）
    pub fn neighbours(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.neighbours.keys().copied()
    }

    /// 邻居数量
    pub fn neighbour_count(&self) -> usize {
        self.neighbours.len()
    }

    /// 本顶点的邻居集合中是否记录了 `other`。
    ///
    /// 只看单侧记录，不检查对称性；对称检查见 [`Arena::is_adjacent`](super::Arena::is_adjacent)。
    pub fn has_neighbour(&self, other: VertexId) -> bool {
        self.neighbours.contains_key(&other)
    }

    /// 是否孤立
    pub fn is_isolated(&self) -> bool {
        self.degree == 0
    }

    /// 比较两个顶点的内容，与身份相等无关
    pub fn content_equals(&self, other: &Vertex<T>) -> bool
    where
        T: PartialEq,
    {
        self.content == other.content
    }

    fn incidence(&self, other: VertexId) -> usize {
        if other == self.id {
            2
        } else {
            1
        }
    }

    /// 登记一条连接到 `other` 的边。
    ///
    /// 自环只调用一次，度数加 2，并把自己加入邻居集合。
    pub(super) fn register_adjacency(&mut self, other: VertexId) {
        self.degree += self.incidence(other);
        *self.neighbours.entry(other).or_insert(0) += 1;
        trace!(vertex = %self.id, neighbour = %other, degree = self.degree, "登记邻接");
    }

    /// 检查撤销一条到 `other` 的边是否合法，不修改状态
    pub(super) fn check_revoke(&self, other: VertexId) -> Result<()> {
        let delta = self.incidence(other);
        if self.degree < delta {
            let msg = format!(
                "顶点 {} 度数为 {}，无法撤销到 {} 的邻接",
                self.id, self.degree, other
            );
            error!("{}", msg);
            return Err(Error::BrokenInvariant(msg));
        }
        if !self.neighbours.contains_key(&other) {
            let msg = format!("顶点 {} 的邻居集合中没有 {}", self.id, other);
            error!("{}", msg);
            return Err(Error::BrokenInvariant(msg));
        }
        Ok(())
    }

    /// 撤销一条连接到 `other` 的边，`register_adjacency` 的逆操作。
    ///
    /// 最后一条边被撤销时才移除邻居记录。
    pub(super) fn revoke_adjacency(&mut self, other: VertexId) -> Result<()> {
        self.check_revoke(other)?;
        self.degree -= self.incidence(other);
        if let Some(count) = self.neighbours.get_mut(&other) {
            *count -= 1;
            if *count == 0 {
                self.neighbours.shift_remove(&other);
            }
        }
        trace!(vertex = %self.id, neighbour = %other, degree = self.degree, "撤销邻接");
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn force_neighbour(&mut self, other: VertexId) {
        *self.neighbours.entry(other).or_insert(0) += 1;
    }

    #[cfg(test)]
    pub(super) fn force_forget_neighbour(&mut self, other: VertexId) {
        self.neighbours.shift_remove(&other);
    }

    #[cfg(test)]
    pub(super) fn force_degree(&mut self, degree: usize) {
        self.degree = degree;
    }
}

impl<T> PartialEq for Vertex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Vertex<T> {}

impl<T> Hash for Vertex<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: fmt::Display> fmt::Display for Vertex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}
