//! 图数据结构
//!
//! 图只是边与顶点句柄的聚合，不创建顶点或边，只负责结构查询和断开。

use super::arena::Arena;
use super::edge::{Edge, UnlinkOutcome};
use super::vertex::VertexId;
use crate::error::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 图配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// 插入边时要求两个端点都已是图中的顶点
    pub enforce_closure: bool,
}

/// 图
///
/// 通过 [`Edge::unlink`] 在图外断开的边不再计入图中。
#[derive(Debug, Clone)]
pub struct Graph<T> {
    config: GraphConfig,
    /// 边（保持插入顺序，可能残留已断开的句柄）
    edges: Vec<Edge<T>>,
    /// 顶点（可包含孤立顶点）
    vertices: IndexSet<VertexId>,
}

impl<T> Graph<T> {
    /// 创建空图
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// 按配置创建空图
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            config,
            edges: Vec::new(),
            vertices: IndexSet::new(),
        }
    }

    /// 由已有的边和顶点创建图，不做闭包检查
    pub fn from_parts<E, V>(edges: E, vertices: V) -> Self
    where
        E: IntoIterator<Item = Edge<T>>,
        V: IntoIterator<Item = VertexId>,
    {
        let mut graph = Self::new();
        graph.vertices.extend(vertices);
        for edge in edges {
            if edge.is_alive() && !graph.contains_edge(&edge) {
                graph.edges.push(edge);
            }
        }
        graph
    }

    /// 获取配置
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ==================== 成员 ====================

    /// 加入顶点，返回是否为新加入
    pub fn insert_vertex(&mut self, id: VertexId) -> bool {
        self.vertices.insert(id)
    }

    /// 加入边。同一实例重复加入或边已断开时忽略。
    pub fn insert_edge(&mut self, edge: Edge<T>) -> Result<()> {
        self.prune();
        if self.config.enforce_closure {
            for v in [edge.endpoint1(), edge.endpoint2()] {
                if !self.vertices.contains(&v) {
                    return Err(Error::ClosureViolation {
                        edge: edge.id(),
                        vertex: v,
                    });
                }
            }
        }
        if edge.is_alive() && !self.contains_edge(&edge) {
            self.edges.push(edge);
        }
        Ok(())
    }

    /// 丢弃已在图外断开的边
    fn prune(&mut self) {
        self.edges.retain(|e| e.is_alive());
    }

    /// 所有存活的边
    pub fn edges(&self) -> impl Iterator<Item = &Edge<T>> + '_ {
        self.edges.iter().filter(|e| e.is_alive())
    }

    /// 所有顶点
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().copied()
    }

    /// 获取边数量
    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    /// 获取顶点数量
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 是否包含顶点
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains(&id)
    }

    /// 是否包含该边实例（按实例身份，而非端点对）
    pub fn contains_edge(&self, edge: &Edge<T>) -> bool {
        self.edges().any(|e| e.same_instance(edge))
    }

    // ==================== 结构查询 ====================

    /// 零图：没有边（孤立顶点不影响）
    pub fn is_null_graph(&self) -> bool {
        self.edges().next().is_none()
    }

    /// 边数等于顶点数（结构计数，不做环检测）
    pub fn is_cycle_graph(&self) -> bool {
        self.edge_count() == self.vertices.len()
    }

    /// 所有边的端点是否都在顶点集合中
    pub fn is_closed(&self) -> bool {
        self.edges().all(|e| {
            self.vertices.contains(&e.endpoint1()) && self.vertices.contains(&e.endpoint2())
        })
    }

    fn member(&self, id: VertexId) -> Result<VertexId> {
        if self.vertices.contains(&id) {
            Ok(id)
        } else {
            Err(Error::VertexNotFound(id))
        }
    }

    /// 图中的顶点是否孤立
    pub fn is_isolated(&self, arena: &Arena<T>, id: VertexId) -> Result<bool> {
        arena.is_isolated(self.member(id)?)
    }

    /// 图中的两个顶点是否相邻
    pub fn are_adjacent(&self, arena: &Arena<T>, u: VertexId, v: VertexId) -> Result<bool> {
        arena.is_adjacent(self.member(u)?, self.member(v)?)
    }

    /// 所有孤立顶点
    pub fn isolated_vertices(&self, arena: &Arena<T>) -> Result<Vec<VertexId>> {
        let mut isolated = Vec::new();
        for &id in &self.vertices {
            if arena.is_isolated(id)? {
                isolated.push(id);
            }
        }
        Ok(isolated)
    }

    // ==================== 断开 ====================

    /// 断开图中连接 `v1` 与 `v2` 的一条边（按插入顺序取第一条）。
    ///
    /// 顶点不在图中返回 `NotFound`；两点不相邻返回 `NotLinked`；
    /// 相邻但连接它们的边都不在本图中时返回 `NotFound`。
    pub fn unlink(
        &mut self,
        arena: &mut Arena<T>,
        v1: VertexId,
        v2: VertexId,
    ) -> Result<UnlinkOutcome> {
        if !self.vertices.contains(&v1) || !self.vertices.contains(&v2) {
            return Ok(UnlinkOutcome::NotFound);
        }
        if !arena.is_adjacent(v1, v2)? {
            return Ok(UnlinkOutcome::NotLinked);
        }
        self.prune();
        match self.edges.iter().position(|e| e.connects(v1, v2)) {
            Some(index) => self.unlink_at(arena, index),
            None => Ok(UnlinkOutcome::NotFound),
        }
    }

    /// 断开并移除指定的边实例，不在图中时返回 `NotFound`
    pub fn unlink_edge(&mut self, arena: &mut Arena<T>, edge: &Edge<T>) -> Result<UnlinkOutcome> {
        self.prune();
        match self.edges.iter().position(|e| e.same_instance(edge)) {
            Some(index) => self.unlink_at(arena, index),
            None => Ok(UnlinkOutcome::NotFound),
        }
    }

    fn unlink_at(&mut self, arena: &mut Arena<T>, index: usize) -> Result<UnlinkOutcome> {
        // 先撤销邻接，失败时图保持不变
        let outcome = self.edges[index].clone().unlink(arena)?;
        let edge = self.edges.remove(index);
        debug!(edge = %edge.id(), ?outcome, "从图中移除边");
        Ok(outcome)
    }
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn triangle() -> (Arena<&'static str>, Graph<&'static str>, [VertexId; 3]) {
        let mut arena = Arena::new();
        let a = arena.add_vertex("a");
        let b = arena.add_vertex("b");
        let c = arena.add_vertex("c");
        let edges = vec![
            Edge::link(&mut arena, a, b).unwrap(),
            Edge::link(&mut arena, b, c).unwrap(),
            Edge::link(&mut arena, c, a).unwrap(),
        ];
        let graph = Graph::from_parts(edges, [a, b, c]);
        (arena, graph, [a, b, c])
    }

    #[test]
    fn test_null_graph() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(1);
        let b = arena.add_vertex(2);

        let empty: Graph<i32> = Graph::new();
        assert!(empty.is_null_graph());

        let graph: Graph<i32> = Graph::from_parts(Vec::new(), [a, b]);
        assert!(graph.is_null_graph());
        assert_eq!(graph.isolated_vertices(&arena).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_cycle_graph() {
        let (mut arena, mut graph, [a, b, _]) = triangle();

        assert!(graph.is_cycle_graph());
        assert!(!graph.is_null_graph());
        assert!(graph.is_closed());

        assert!(graph.unlink(&mut arena, a, b).unwrap().is_unlinked());
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.vertex_count(), 3);
        assert!(!graph.is_cycle_graph());
    }

    #[test]
    fn test_single_self_loop_is_cycle_graph() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(());
        let e = Edge::link(&mut arena, a, a).unwrap();

        let graph = Graph::from_parts([e], [a]);
        assert!(graph.is_cycle_graph());
    }

    #[test]
    fn test_unlink_pair() {
        let (mut arena, mut graph, [a, b, c]) = triangle();

        assert!(graph.unlink(&mut arena, b, a).unwrap().is_unlinked());

        assert!(!graph.are_adjacent(&arena, a, b).unwrap());
        assert!(graph.are_adjacent(&arena, a, c).unwrap());
        assert_eq!(arena.degree(a).unwrap(), 1);
        assert_eq!(arena.degree(b).unwrap(), 1);
        assert_eq!(arena.degree(c).unwrap(), 2);
        assert!(graph.edges().all(|e| !e.connects(a, b)));
    }

    #[test]
    fn test_unlink_not_linked() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(());
        let b = arena.add_vertex(());
        let mut graph: Graph<()> = Graph::from_parts(Vec::new(), [a, b]);

        assert_eq!(
            graph.unlink(&mut arena, a, b).unwrap(),
            UnlinkOutcome::NotLinked
        );
        assert_eq!(arena.degree(a).unwrap(), 0);
        assert_eq!(arena.degree(b).unwrap(), 0);
        assert!(arena.neighbours(a).unwrap().is_empty());
        assert!(arena.neighbours(b).unwrap().is_empty());
    }

    #[test]
    fn test_unlink_vertex_not_in_graph() {
        let (mut arena, mut graph, [a, _, _]) = triangle();
        let outsider = arena.add_vertex("d");
        let e = Edge::link(&mut arena, a, outsider).unwrap();

        assert_eq!(
            graph.unlink(&mut arena, a, outsider).unwrap(),
            UnlinkOutcome::NotFound
        );
        assert_eq!(arena.degree(outsider).unwrap(), 1);
        assert!(e.unlink(&mut arena).unwrap().is_unlinked());
    }

    #[test]
    fn test_unlink_edge_outside_graph() {
        let (mut arena, mut graph, [a, b, _]) = triangle();
        let extra = Edge::link(&mut arena, a, b).unwrap();

        assert_eq!(
            graph.unlink_edge(&mut arena, &extra).unwrap(),
            UnlinkOutcome::NotFound
        );
        assert_eq!(arena.degree(a).unwrap(), 3);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_unlink_edge() {
        let (mut arena, mut graph, [a, b, _]) = triangle();
        let ab = graph.edges().next().unwrap().clone();

        assert!(graph.unlink_edge(&mut arena, &ab).unwrap().is_unlinked());
        assert!(!graph.contains_edge(&ab));
        assert!(!arena.is_live(ab.id()));
        assert!(!arena.is_adjacent(a, b).unwrap());

        assert_eq!(
            graph.unlink_edge(&mut arena, &ab).unwrap(),
            UnlinkOutcome::NotFound
        );
    }

    #[test]
    fn test_unlink_one_of_parallel_edges() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(());
        let b = arena.add_vertex(());
        let first = Edge::link(&mut arena, a, b).unwrap();
        let second = Edge::link(&mut arena, a, b).unwrap();
        let mut graph = Graph::from_parts([first.clone(), second.clone()], [a, b]);

        assert!(graph.unlink(&mut arena, a, b).unwrap().is_unlinked());
        assert!(!graph.contains_edge(&first));
        assert!(graph.contains_edge(&second));
        assert!(graph.are_adjacent(&arena, a, b).unwrap());
        assert_eq!(arena.degree(a).unwrap(), 1);

        assert!(graph.unlink(&mut arena, a, b).unwrap().is_unlinked());
        assert!(graph.is_null_graph());
        assert!(graph.is_isolated(&arena, a).unwrap());
    }

    #[test]
    fn test_unlink_one_way_adjacency_is_fatal() {
        init_tracing();
        let mut arena = Arena::new();
        let a = arena.add_vertex(());
        let b = arena.add_vertex(());
        let mut graph: Graph<()> = Graph::from_parts(Vec::new(), [a, b]);

        arena.force_one_way_adjacency(a, b).unwrap();

        let err = graph.unlink(&mut arena, a, b).unwrap_err();
        assert!(matches!(err, Error::BrokenInvariant(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unlink_zero_degree_is_fatal() {
        init_tracing();
        let (mut arena, mut graph, [a, b, _]) = triangle();
        arena.force_degree(a, 0).unwrap();

        let err = graph.unlink(&mut arena, a, b).unwrap_err();
        assert!(err.is_fatal());
        // 失败时图保持不变
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(arena.degree(b).unwrap(), 2);
    }

    #[test]
    fn test_edge_unlinked_outside_graph_is_dropped() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(());
        let b = arena.add_vertex(());
        let e = Edge::link(&mut arena, a, b).unwrap();
        let mut graph = Graph::from_parts([e.clone()], [a, b]);
        assert!(!graph.is_null_graph());

        assert!(e.clone().unlink(&mut arena).unwrap().is_unlinked());

        assert!(graph.is_null_graph());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.edges().count(), 0);
        assert!(!graph.is_cycle_graph());
        assert!(!graph.contains_edge(&e));
        assert_eq!(
            graph.unlink_edge(&mut arena, &e).unwrap(),
            UnlinkOutcome::NotFound
        );

        // 已断开的边不能再加入
        graph.insert_edge(e).unwrap();
        assert!(graph.is_null_graph());
    }

    #[test]
    fn test_unlink_pair_skips_edge_unlinked_outside_graph() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(());
        let b = arena.add_vertex(());
        let first = Edge::link(&mut arena, a, b).unwrap();
        let second = Edge::link(&mut arena, a, b).unwrap();
        let mut graph = Graph::from_parts([first.clone(), second.clone()], [a, b]);

        assert!(first.unlink(&mut arena).unwrap().is_unlinked());
        assert_eq!(graph.edge_count(), 1);

        assert_eq!(
            graph.unlink(&mut arena, a, b).unwrap(),
            UnlinkOutcome::Unlinked
        );
        assert!(!second.is_alive());
        assert_eq!(arena.degree(a).unwrap(), 0);
        assert!(!arena.is_adjacent(a, b).unwrap());
        assert!(graph.is_null_graph());
    }

    #[test]
    fn test_enforce_closure() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(());
        let b = arena.add_vertex(());
        let e = Edge::link(&mut arena, a, b).unwrap();

        let mut graph = Graph::with_config(GraphConfig {
            enforce_closure: true,
        });
        graph.insert_vertex(a);

        let err = graph.insert_edge(e.clone()).unwrap_err();
        assert_eq!(
            err,
            Error::ClosureViolation {
                edge: e.id(),
                vertex: b,
            }
        );

        assert!(graph.insert_vertex(b));
        graph.insert_edge(e.clone()).unwrap();
        graph.insert_edge(e).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.is_closed());
    }

    #[test]
    fn test_open_graph_is_not_closed() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(());
        let b = arena.add_vertex(());
        let e = Edge::link(&mut arena, a, b).unwrap();

        let mut graph = Graph::new();
        graph.insert_edge(e).unwrap();
        assert!(!graph.is_closed());
        assert!(graph.is_isolated(&arena, a).is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config: GraphConfig = serde_json::from_str(r#"{"enforce_closure": true}"#).unwrap();
        assert!(config.enforce_closure);

        let config: GraphConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GraphConfig::default());
    }

    #[test]
    fn test_random_link_unlink_keeps_invariants() {
        init_tracing();
        let mut rng = StdRng::seed_from_u64(7);
        let mut arena = Arena::new();
        let ids: Vec<_> = (0..6).map(|i| arena.add_vertex(i)).collect();
        let mut graph: Graph<i32> = Graph::from_parts(Vec::new(), ids.clone());

        for _ in 0..500 {
            let u = ids[rng.gen_range(0..ids.len())];
            let v = ids[rng.gen_range(0..ids.len())];
            let before = (arena.degree(u).unwrap(), arena.degree(v).unwrap());

            if rng.gen_bool(0.6) {
                let e = Edge::link(&mut arena, u, v).unwrap();
                graph.insert_edge(e).unwrap();
                if u == v {
                    assert_eq!(arena.degree(u).unwrap(), before.0 + 2);
                } else {
                    assert_eq!(arena.degree(u).unwrap(), before.0 + 1);
                    assert_eq!(arena.degree(v).unwrap(), before.1 + 1);
                }
            } else {
                match graph.unlink(&mut arena, u, v).unwrap() {
                    UnlinkOutcome::Unlinked if u == v => {
                        assert_eq!(arena.degree(u).unwrap(), before.0 - 2);
                    }
                    UnlinkOutcome::Unlinked => {
                        assert_eq!(arena.degree(u).unwrap(), before.0 - 1);
                        assert_eq!(arena.degree(v).unwrap(), before.1 - 1);
                    }
                    UnlinkOutcome::NotLinked => {
                        assert_eq!(arena.degree(u).unwrap(), before.0);
                        assert_eq!(arena.degree(v).unwrap(), before.1);
                    }
                    UnlinkOutcome::NotFound => panic!("所有顶点都在图中"),
                }
            }

            for &x in &ids {
                for &y in &ids {
                    assert_eq!(
                        arena.is_adjacent(x, y).unwrap(),
                        arena.is_adjacent(y, x).unwrap()
                    );
                    let linked = graph.edges().any(|e| e.connects(x, y));
                    assert_eq!(arena.is_adjacent(x, y).unwrap(), linked);
                }
            }
            // 握手定理
            let total: usize = ids.iter().map(|&x| arena.degree(x).unwrap()).sum();
            assert_eq!(total, 2 * graph.edge_count());
            assert_eq!(arena.edge_count(), graph.edge_count());
        }
    }
}
