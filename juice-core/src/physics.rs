//! # Physics 模块
//!
//! 物理体元数据与接触事件。碰撞检测与求解由宿主完成，这里只描述
//! "谁是什么"（类别位掩码）以及宿主上报的接触。

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::math::Vec2;
use crate::scene::{NodeId, SceneGraph};

bitflags! {
    /// 物理体类别位掩码
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Category: u32 {
        const BALL    = 1 << 0;
        const BORDER  = 1 << 1;
        const BARRIER = 1 << 2;
    }
}

/// 物理体形状（节点局部坐标）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyShape {
    Circle { radius: f32 },
    Rect { origin: Vec2, size: Vec2 },
}

/// 挂在节点上的物理体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    /// 自身类别
    pub category: Category,
    /// 与哪些类别发生碰撞求解
    pub collision_mask: Category,
    /// 与哪些类别接触时上报事件
    pub contact_test_mask: Category,
    /// 当前速度（每秒）
    pub velocity: Vec2,
    /// 是否受力运动
    pub dynamic: bool,
    pub shape: BodyShape,
}

impl PhysicsBody {
    fn with_shape(shape: BodyShape) -> Self {
        Self {
            category: Category::empty(),
            collision_mask: Category::all(),
            contact_test_mask: Category::empty(),
            velocity: Vec2::ZERO,
            dynamic: true,
            shape,
        }
    }

    /// 圆形物理体
    pub fn circle(radius: f32) -> Self {
        Self::with_shape(BodyShape::Circle { radius })
    }

    /// 矩形物理体，`origin` 为左下角
    pub fn rect(origin: Vec2, size: Vec2) -> Self {
        Self::with_shape(BodyShape::Rect { origin, size })
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_collision_mask(mut self, mask: Category) -> Self {
        self.collision_mask = mask;
        self
    }

    pub fn with_contact_test_mask(mut self, mask: Category) -> Self {
        self.contact_test_mask = mask;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// 静态物理体（不受力，位置只由动画驱动）
    pub fn fixed(mut self) -> Self {
        self.dynamic = false;
        self
    }

    /// 是否会为与 `other` 的接触上报事件
    pub fn reports_contact_with(&self, other: &PhysicsBody) -> bool {
        self.contact_test_mask.intersects(other.category)
            || other.contact_test_mask.intersects(self.category)
    }
}

/// 一次接触开始事件
///
/// `point` 为场景坐标。两个排列 (a, b) / (b, a) 由碰撞反馈层自行推导。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub category_a: Category,
    pub category_b: Category,
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub point: Vec2,
}

impl Contact {
    /// 由两个节点构造接触，类别取自各自的物理体（没有物理体视为空类别）
    pub fn between(
        scene: &SceneGraph,
        node_a: NodeId,
        node_b: NodeId,
        point: Vec2,
    ) -> Result<Self, SceneError> {
        let category_of = |id: NodeId| -> Result<Category, SceneError> {
            Ok(scene
                .node(id)?
                .body
                .as_ref()
                .map_or(Category::empty(), |b| b.category))
        };
        Ok(Self {
            category_a: category_of(node_a)?,
            category_b: category_of(node_b)?,
            node_a,
            node_b,
            point,
        })
    }

    /// 交换 a / b
    pub fn swapped(&self) -> Self {
        Self {
            category_a: self.category_b,
            category_b: self.category_a,
            node_a: self.node_b,
            node_b: self.node_a,
            point: self.point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    #[test]
    fn test_category_bits() {
        let mask = Category::BORDER | Category::BARRIER;
        assert!(mask.contains(Category::BORDER));
        assert!(!mask.contains(Category::BALL));
        assert_eq!(Category::BALL.bits(), 1);
    }

    #[test]
    fn test_reports_contact_with() {
        let ball = PhysicsBody::circle(10.0)
            .with_category(Category::BALL)
            .with_contact_test_mask(Category::BORDER);
        let border = PhysicsBody::rect(Vec2::ZERO, Vec2::new(20.0, 100.0))
            .with_category(Category::BORDER)
            .fixed();
        let barrier = PhysicsBody::rect(Vec2::ZERO, Vec2::new(40.0, 140.0))
            .with_category(Category::BARRIER);

        assert!(ball.reports_contact_with(&border));
        assert!(border.reports_contact_with(&ball));
        assert!(!ball.reports_contact_with(&barrier));
        assert!(!border.dynamic);
    }

    #[test]
    fn test_contact_between_reads_categories() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let ball = scene
            .add_child(
                root,
                Node::named("ball").with_body(PhysicsBody::circle(5.0).with_category(Category::BALL)),
            )
            .unwrap();
        let plain = scene.add_child(root, Node::new()).unwrap();

        let contact = Contact::between(&scene, ball, plain, Vec2::new(1.0, 2.0)).unwrap();
        assert_eq!(contact.category_a, Category::BALL);
        assert!(contact.category_b.is_empty());

        let swapped = contact.swapped();
        assert_eq!(swapped.node_a, plain);
        assert_eq!(swapped.category_b, Category::BALL);
    }
}
