//! 顶点仓库
//!
//! `Arena` 拥有所有顶点的生命周期，并登记仍然存活的边。
//! 边和图只持有 `VertexId` 句柄，不持有顶点本身。

use super::edge::{Edge, EdgeId, UnlinkOutcome};
use super::vertex::{Vertex, VertexId};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error};

/// 下一个 Arena 标识，用于区分不同仓库签发的边
static NEXT_ARENA_TAG: AtomicU64 = AtomicU64::new(1);

/// 顶点仓库
#[derive(Debug)]
pub struct Arena<T> {
    /// 仓库标识
    tag: u64,
    /// 顶点表
    vertices: IndexMap<VertexId, Vertex<T>>,
    /// 存活的边 -> 端点
    live_edges: IndexMap<EdgeId, (VertexId, VertexId)>,
    /// 下一个顶点 ID
    next_vertex_id: u64,
    /// 下一个边 ID
    next_edge_id: u64,
}

impl<T> Arena<T> {
    /// 创建空仓库
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// 预分配顶点容量
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            tag: NEXT_ARENA_TAG.fetch_add(1, Ordering::Relaxed),
            vertices: IndexMap::with_capacity(vertices),
            live_edges: IndexMap::new(),
            next_vertex_id: 1,
            next_edge_id: 1,
        }
    }

    // ==================== 顶点操作 ====================

    /// 添加顶点
    pub fn add_vertex(&mut self, content: T) -> VertexId {
        let id = VertexId::new(self.next_vertex_id);
        self.next_vertex_id += 1;
        self.vertices.insert(id, Vertex::new(id, content));
        debug!(vertex = %id, "添加顶点");
        id
    }

    /// 获取顶点
    pub fn get(&self, id: VertexId) -> Option<&Vertex<T>> {
        self.vertices.get(&id)
    }

    /// 获取顶点，不存在时报错
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex<T>> {
        self.vertices.get(&id).ok_or(Error::VertexNotFound(id))
    }

    fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex<T>> {
        self.vertices.get_mut(&id).ok_or(Error::VertexNotFound(id))
    }

    /// 是否包含顶点
    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// 获取内容
    pub fn content(&self, id: VertexId) -> Result<&T> {
        Ok(self.vertex(id)?.content())
    }

    /// 获取可变内容
    pub fn content_mut(&mut self, id: VertexId) -> Result<&mut T> {
        Ok(self.vertex_mut(id)?.content_mut())
    }

    /// 替换内容，返回旧值
    pub fn set_content(&mut self, id: VertexId, content: T) -> Result<T> {
        Ok(self.vertex_mut(id)?.set_content(content))
    }

    /// 按插入顺序遍历所有顶点
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex<T>> + '_ {
        self.vertices.values()
    }

    /// 获取顶点数量
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    // ==================== 邻接查询 ====================

    /// 获取度数
    pub fn degree(&self, id: VertexId) -> Result<usize> {
        Ok(self.vertex(id)?.degree())
    }

    /// 获取邻居集合
    pub fn neighbours(&self, id: VertexId) -> Result<Vec<VertexId>> {
        Ok(self.vertex(id)?.neighbours().collect())
    }

    /// 是否孤立
    pub fn is_isolated(&self, id: VertexId) -> Result<bool> {
        Ok(self.vertex(id)?.is_isolated())
    }

    /// 两个顶点是否相邻。
    ///
    /// 只有一侧记录了邻接时返回 `BrokenInvariant`。
    pub fn is_adjacent(&self, u: VertexId, v: VertexId) -> Result<bool> {
        let forward = self.vertex(u)?.has_neighbour(v);
        let backward = self.vertex(v)?.has_neighbour(u);
        if forward != backward {
            let msg = format!(
                "邻接不对称: {} -> {} 为 {}，{} -> {} 为 {}",
                u, v, forward, v, u, backward
            );
            error!("{}", msg);
            return Err(Error::BrokenInvariant(msg));
        }
        Ok(forward)
    }

    /// 比较两个顶点的内容
    pub fn content_equals(&self, u: VertexId, v: VertexId) -> Result<bool>
    where
        T: PartialEq,
    {
        Ok(self.vertex(u)?.content_equals(self.vertex(v)?))
    }

    // ==================== 边登记 ====================

    /// 存活的边数量
    pub fn edge_count(&self) -> usize {
        self.live_edges.len()
    }

    /// 边是否仍然存活
    pub fn is_live(&self, edge: EdgeId) -> bool {
        self.live_edges.contains_key(&edge)
    }

    pub(super) fn tag(&self) -> u64 {
        self.tag
    }

    /// 登记一条新边并建立双向邻接，只由 `Edge::link` 调用
    pub(super) fn register_edge(&mut self, v1: VertexId, v2: VertexId) -> Result<EdgeId> {
        // 先校验两个端点，避免只修改一侧
        self.vertex(v1)?;
        self.vertex(v2)?;

        let id = EdgeId::new(self.next_edge_id);
        self.next_edge_id += 1;

        self.vertex_mut(v1)?.register_adjacency(v2);
        if v1 != v2 {
            self.vertex_mut(v2)?.register_adjacency(v1);
        }
        self.live_edges.insert(id, (v1, v2));

        Ok(id)
    }

    /// 撤销一条边的邻接，只由 `Edge::unlink` 调用
    ///
    /// 边不是本仓库签发的，或登记的端点与边不符时返回 `NotLinked`。
    pub(super) fn revoke_edge(&mut self, edge: &Edge<T>) -> Result<UnlinkOutcome> {
        let id = edge.id();
        let (v1, v2) = edge.endpoints();
        if edge.arena_tag() != self.tag || self.live_edges.get(&id) != Some(&(v1, v2)) {
            return Ok(UnlinkOutcome::NotLinked);
        }
        if !self.is_adjacent(v1, v2)? {
            let msg = format!("边 {} 仍存活，但 {} 与 {} 不相邻", id, v1, v2);
            error!("{}", msg);
            return Err(Error::BrokenInvariant(msg));
        }

        let (a, b) = (self.vertex(v1)?, self.vertex(v2)?);
        if a.degree() == 0 || b.degree() == 0 {
            let msg = format!(
                "{} 与 {} 相邻但度数为 ({}, {})",
                v1,
                v2,
                a.degree(),
                b.degree()
            );
            error!("{}", msg);
            return Err(Error::BrokenInvariant(msg));
        }
        a.check_revoke(v2)?;
        b.check_revoke(v1)?;

        self.vertex_mut(v1)?.revoke_adjacency(v2)?;
        if v1 != v2 {
            self.vertex_mut(v2)?.revoke_adjacency(v1)?;
        }
        self.live_edges.shift_remove(&id);

        Ok(UnlinkOutcome::Unlinked)
    }

    /// 只在一侧登记邻接，绕过 `Edge::link`，用于构造损坏状态
    #[cfg(test)]
    pub(crate) fn force_one_way_adjacency(&mut self, from: VertexId, to: VertexId) -> Result<()> {
        self.vertex_mut(from)?.force_neighbour(to);
        Ok(())
    }

    /// 只在一侧删除邻接记录，用于构造损坏状态
    #[cfg(test)]
    pub(crate) fn force_forget_neighbour(&mut self, from: VertexId, to: VertexId) -> Result<()> {
        self.vertex_mut(from)?.force_forget_neighbour(to);
        Ok(())
    }

    /// 直接改写度数，用于构造损坏状态
    #[cfg(test)]
    pub(crate) fn force_degree(&mut self, id: VertexId, degree: usize) -> Result<()> {
        self.vertex_mut(id)?.force_degree(degree);
        Ok(())
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
