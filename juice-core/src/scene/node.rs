//! # Node 模块
//!
//! 场景节点：只保存每帧会被动画修改的视觉状态与层级关系。

use std::f32::consts::{FRAC_PI_2, PI};

use crate::debug_draw::DebugShape;
use crate::math::{Color, Vec2};
use crate::physics::PhysicsBody;

/// 节点唯一标识符
///
/// 由 `SceneGraph` 在节点创建时分配，单调递增、永不复用，
/// 因此已移除节点的 ID 不会误指向新节点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// 创建节点 ID（仅供 SceneGraph 内部使用）
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// 场景节点
///
/// 层级关系（`parent` / `children`）只能通过 [`SceneGraph`](super::SceneGraph) 修改，
/// 以保证父子两侧始终同步。
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// 节点名（用于按名查找）
    pub name: Option<String>,
    /// 相对父节点的位置
    pub position: Vec2,
    /// 非均匀缩放
    pub scale: Vec2,
    /// 旋转角度（弧度，逆时针）
    pub rotation: f32,
    /// 透明度 (0.0 - 1.0)
    pub alpha: f32,
    /// 着色颜色（精灵）
    pub color: Color,
    /// 着色混合系数，0 表示不着色
    pub color_blend_factor: f32,
    /// 填充颜色（形状节点）
    pub fill_color: Option<Color>,
    /// 文本（标签节点）
    pub text: Option<String>,
    /// 物理体元数据
    pub body: Option<PhysicsBody>,
    /// 调试图形
    pub debug_shape: Option<DebugShape>,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            alpha: 1.0,
            color: Color::WHITE,
            color_blend_factor: 0.0,
            fill_color: None,
            text: None,
            body: None,
            debug_shape: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Node {
    /// 创建默认节点
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带名字的节点
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_body(mut self, body: PhysicsBody) -> Self {
        self.body = Some(body);
        self
    }

    /// 父节点
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// 子节点（按绘制顺序，最后一个在最上层）
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// 名字是否匹配
    pub fn has_name(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// 让节点朝向速度方向（0 弧度表示朝上）
    ///
    /// `rate` 取值 0.0 - 1.0，越大转得越快，1.0 为立即对齐。
    /// 跨越 ±π 时先把当前角度平移一圈，保证走最短路径。
    pub fn rotate_to_velocity(&mut self, velocity: Vec2, rate: f32) {
        let new_angle = velocity.to_angle() - FRAC_PI_2;

        if new_angle - self.rotation > PI {
            self.rotation += PI * 2.0;
        } else if self.rotation - new_angle > PI {
            self.rotation -= PI * 2.0;
        }

        self.rotation += (new_angle - self.rotation) * rate;
    }
}
