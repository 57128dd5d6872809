//! # Graph 模块
//!
//! 显式的场景树：父节点拥有子节点，子节点只保存指回父节点的 ID。
//!
//! ```rust,ignore
//! let mut scene = SceneGraph::new();
//! let ball = scene.add_child(scene.root(), Node::named("ball"))?;
//! let sprite = scene.add_child(ball, Node::new())?;
//! assert_eq!(scene.child_by_name(scene.root(), "ball"), Some(ball));
//! ```

use std::collections::HashMap;

use tracing::debug;

use super::{Node, NodeId};
use crate::error::SceneError;
use crate::math::{Color, Vec2};

/// 场景图
///
/// 节点存放在 `NodeId -> Node` 表中，ID 永不复用。
/// 根节点即场景本身，它的坐标系就是"场景坐标"（接触点所在的坐标系）。
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_node_id: u64,
    /// 场景背景色
    background: Color,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("background", &self.background)
            .finish()
    }
}

impl SceneGraph {
    /// 创建只含根节点的场景
    pub fn new() -> Self {
        let root = NodeId::new(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::named("scene"));
        Self {
            nodes,
            root,
            next_node_id: 1,
            background: Color::BLACK,
        }
    }

    fn next_node_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// 根节点
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    /// 节点数量（含根节点）
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// 获取节点，不存在时返回 `NodeNotFound`
    pub fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))
    }

    /// 可变获取节点，不存在时返回 `NodeNotFound`
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))
    }

    /// 父节点
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// 子节点列表；节点不存在时为空
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    // ========== 结构修改 ==========

    /// 创建节点并挂到 `parent` 末尾（最上层）
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        node.parent = Some(parent);
        node.children.clear();

        let id = self.next_node_id();
        self.nodes.insert(id, node);
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// 把已有节点移动到新的父节点下
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        if !self.contains(id) {
            return Err(SceneError::NodeNotFound(id));
        }
        if !self.contains(new_parent) {
            return Err(SceneError::NodeNotFound(new_parent));
        }
        if id == new_parent || self.is_ancestor(id, new_parent) {
            return Err(SceneError::CycleDetected {
                parent: new_parent,
                child: id,
            });
        }

        self.detach(id);
        self.node_mut(new_parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(new_parent);
        Ok(())
    }

    /// `ancestor` 是否是 `id` 的祖先
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// 把节点移到兄弟节点中的最上层
    pub fn bring_to_front(&mut self, id: NodeId) -> Result<(), SceneError> {
        let parent = match self.node(id)?.parent {
            Some(parent) => parent,
            None => return Ok(()),
        };
        let siblings = &mut self.node_mut(parent)?.children;
        siblings.retain(|&child| child != id);
        siblings.push(id);
        Ok(())
    }

    /// 移除节点及其整棵子树
    ///
    /// 返回被移除的所有节点 ID（先序），调用方据此取消它们的动作与回调。
    pub fn remove_from_parent(&mut self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        if id == self.root {
            return Err(SceneError::RootRemoval);
        }
        if !self.contains(id) {
            return Err(SceneError::NodeNotFound(id));
        }

        self.detach(id);
        let removed = self.subtree(id);
        for node in &removed {
            self.nodes.remove(node);
        }
        debug!(node = %id, count = removed.len(), "移除节点子树");
        Ok(removed)
    }

    /// 从父节点的子列表中摘除（不删除节点本身）
    fn detach(&mut self, id: NodeId) {
        let parent = self.nodes.get_mut(&id).and_then(|n| n.parent.take());
        if let Some(parent_node) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent_node.children.retain(|&child| child != id);
        }
    }

    /// 以 `id` 为根的子树（先序，含自身）
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    // ========== 按名查找 ==========

    /// 直接子节点中第一个叫 `name` 的
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.nodes.get(&child).is_some_and(|n| n.has_name(name)))
    }

    /// 深度优先查找第一个叫 `name` 的后代（不含 `from` 自身）
    pub fn find_by_name(&self, from: NodeId, name: &str) -> Option<NodeId> {
        self.subtree(from)
            .into_iter()
            .skip(1)
            .find(|&id| self.nodes.get(&id).is_some_and(|n| n.has_name(name)))
    }

    /// 直接子节点中所有叫 `name` 的，按绘制顺序
    pub fn enumerate_by_name(&self, parent: NodeId, name: &str) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|&child| self.nodes.get(&child).is_some_and(|n| n.has_name(name)))
            .collect()
    }

    // ========== 坐标转换 ==========

    /// 从根（不含）到 `id`（含）的祖先链
    fn chain_from_root(&self, id: NodeId) -> Option<Vec<NodeId>> {
        if !self.contains(id) {
            return None;
        }
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                chain.reverse();
                return Some(chain);
            }
            chain.push(current);
            cursor = self.parent(current);
        }
        // 不在根下的孤立链
        None
    }

    /// 把节点局部坐标转换为场景坐标
    pub fn convert_point_from_node(&self, point: Vec2, id: NodeId) -> Option<Vec2> {
        let chain = self.chain_from_root(id)?;
        let mut p = point;
        for current in chain.iter().rev() {
            let node = self.nodes.get(current)?;
            p = p.mul_components(node.scale).rotate(node.rotation) + node.position;
        }
        Some(p)
    }

    /// 把场景坐标转换为节点局部坐标
    ///
    /// 某个祖先的缩放分量为 0 时结果不是有限值，返回 `None`。
    pub fn convert_point_to_node(&self, point: Vec2, id: NodeId) -> Option<Vec2> {
        let chain = self.chain_from_root(id)?;
        let mut p = point;
        for current in &chain {
            let node = self.nodes.get(current)?;
            p = (p - node.position)
                .rotate(-node.rotation)
                .div_components(node.scale);
        }
        p.is_finite().then_some(p)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_add_child_and_lookup() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let ball = scene.add_child(root, Node::named("ball")).unwrap();
        let sprite = scene.add_child(ball, Node::named("sprite")).unwrap();

        assert_eq!(scene.parent(sprite), Some(ball));
        assert_eq!(scene.children(ball), &[sprite]);
        assert_eq!(scene.child_by_name(root, "ball"), Some(ball));
        assert_eq!(scene.child_by_name(root, "sprite"), None);
        assert_eq!(scene.find_by_name(root, "sprite"), Some(sprite));
    }

    #[test]
    fn test_add_child_to_missing_parent() {
        let mut scene = SceneGraph::new();
        let ghost = scene.add_child(scene.root(), Node::new()).unwrap();
        scene.remove_from_parent(ghost).unwrap();
        let err = scene.add_child(ghost, Node::new()).unwrap_err();
        assert_eq!(err, SceneError::NodeNotFound(ghost));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut scene = SceneGraph::new();
        let a = scene.add_child(scene.root(), Node::new()).unwrap();
        scene.remove_from_parent(a).unwrap();
        let b = scene.add_child(scene.root(), Node::new()).unwrap();
        assert_ne!(a, b);
        assert!(!scene.contains(a));
    }

    #[test]
    fn test_remove_subtree() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let pivot = scene.add_child(root, Node::named("pivot")).unwrap();
        let child = scene.add_child(pivot, Node::new()).unwrap();
        let grandchild = scene.add_child(child, Node::new()).unwrap();

        let removed = scene.remove_from_parent(pivot).unwrap();
        assert_eq!(removed, vec![pivot, child, grandchild]);
        assert!(scene.children(root).is_empty());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        assert_eq!(
            scene.remove_from_parent(root).unwrap_err(),
            SceneError::RootRemoval
        );
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut scene = SceneGraph::new();
        let a = scene.add_child(scene.root(), Node::new()).unwrap();
        let b = scene.add_child(a, Node::new()).unwrap();
        let err = scene.reparent(a, b).unwrap_err();
        assert_eq!(err, SceneError::CycleDetected { parent: b, child: a });

        scene.reparent(b, scene.root()).unwrap();
        assert_eq!(scene.parent(b), Some(scene.root()));
        assert!(scene.children(a).is_empty());
    }

    #[test]
    fn test_bring_to_front() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.add_child(root, Node::new()).unwrap();
        let b = scene.add_child(root, Node::new()).unwrap();
        let c = scene.add_child(root, Node::new()).unwrap();

        scene.bring_to_front(a).unwrap();
        assert_eq!(scene.children(root), &[b, c, a]);
    }

    #[test]
    fn test_enumerate_by_name() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.add_child(root, Node::named("ball")).unwrap();
        scene.add_child(root, Node::named("barrier")).unwrap();
        let c = scene.add_child(root, Node::named("ball")).unwrap();
        assert_eq!(scene.enumerate_by_name(root, "ball"), vec![a, c]);
    }

    #[test]
    fn test_convert_point_round_trip_through_chain() {
        let mut scene = SceneGraph::new();
        let world = scene
            .add_child(scene.root(), Node::new().with_position(Vec2::new(-100.0, -50.0)))
            .unwrap();
        let pivot = scene
            .add_child(
                world,
                Node::new()
                    .with_position(Vec2::new(10.0, 20.0))
                    .with_rotation(FRAC_PI_2)
                    .with_scale(Vec2::new(2.0, 1.0)),
            )
            .unwrap();

        let local = Vec2::new(3.0, 4.0);
        let in_scene = scene.convert_point_from_node(local, pivot).unwrap();
        // (3,4) 缩放 → (6,4)，旋转 90° → (-4,6)，平移 → (6,26)，再平移 → (-94,-24)
        assert!(approx(in_scene, Vec2::new(-94.0, -24.0)));

        let back = scene.convert_point_to_node(in_scene, pivot).unwrap();
        assert!(approx(back, local));
    }

    #[test]
    fn test_convert_point_with_zero_scale() {
        let mut scene = SceneGraph::new();
        let flat = scene
            .add_child(scene.root(), Node::new().with_scale(Vec2::new(0.0, 1.0)))
            .unwrap();
        assert!(scene.convert_point_to_node(Vec2::new(1.0, 1.0), flat).is_none());
    }
}
