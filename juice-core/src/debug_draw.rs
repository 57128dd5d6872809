//! # Debug Draw 模块
//!
//! 在节点上叠加 1 像素描边的调试图形（物理体轮廓、朝向线）。
//!
//! 开关来自 [`FeatureFlags::debug_draw`](crate::response::FeatureFlags)，
//! 关闭时所有 `attach_*` 都返回 `Ok(None)` 且不修改场景。

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::math::{Color, Vec2};
use crate::scene::{Node, NodeId, SceneGraph};

/// 描边线宽
pub const DEBUG_LINE_WIDTH: f32 = 1.0;

/// 调试路径（节点局部坐标）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugPath {
    /// 闭合多边形
    Polygon(Vec<Vec2>),
    Circle { radius: f32 },
    Line { from: Vec2, to: Vec2 },
}

/// 描边调试图形
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugShape {
    pub path: DebugPath,
    pub stroke: Color,
    pub line_width: f32,
}

/// 调试图形绘制器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugDraw {
    enabled: bool,
}

impl DebugDraw {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 在 `node` 上叠加任意描边路径
    pub fn attach_debug_frame(
        &self,
        scene: &mut SceneGraph,
        node: NodeId,
        path: DebugPath,
        color: Color,
    ) -> Result<Option<NodeId>, SceneError> {
        if !self.enabled {
            return Ok(None);
        }
        let mut shape = Node::named("debug_shape");
        shape.debug_shape = Some(DebugShape {
            path,
            stroke: color,
            line_width: DEBUG_LINE_WIDTH,
        });
        scene.add_child(node, shape).map(Some)
    }

    /// 以节点原点为中心的矩形
    pub fn attach_debug_rect(
        &self,
        scene: &mut SceneGraph,
        node: NodeId,
        size: Vec2,
        color: Color,
    ) -> Result<Option<NodeId>, SceneError> {
        let half = size / 2.0;
        let corners = vec![
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ];
        self.attach_debug_frame(scene, node, DebugPath::Polygon(corners), color)
    }

    /// 以节点原点为圆心的圆
    pub fn attach_debug_circle(
        &self,
        scene: &mut SceneGraph,
        node: NodeId,
        radius: f32,
        color: Color,
    ) -> Result<Option<NodeId>, SceneError> {
        self.attach_debug_frame(scene, node, DebugPath::Circle { radius }, color)
    }

    pub fn attach_debug_line(
        &self,
        scene: &mut SceneGraph,
        node: NodeId,
        from: Vec2,
        to: Vec2,
        color: Color,
    ) -> Result<Option<NodeId>, SceneError> {
        self.attach_debug_frame(scene, node, DebugPath::Line { from, to }, color)
    }
}
