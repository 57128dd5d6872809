//! # Policy 模块
//!
//! 碰撞反馈策略：每个接触事件求值一次的纯决策函数。
//!
//! 对 (a, b) 与 (b, a) 两个排列分别判断：
//!
//! 1. 自己是球 → 对这个球执行球体效果组
//! 2. 对方是边框 → 边框效果组；否则对方是障碍 → 障碍效果组
//!
//! 每个效果由各自的开关控制；单个效果失败只记日志，不影响同组其他效果。

use tracing::{debug, warn};

use super::config::ResponseConfig;
use super::effects;
use crate::error::JuiceResult;
use crate::math::Vec2;
use crate::physics::{Category, Contact};
use crate::scene::NodeId;
use crate::stage::Stage;

/// 被触发的效果组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bundle {
    Ball(NodeId),
    Border(NodeId),
    Barrier(NodeId),
}

/// 碰撞反馈器
#[derive(Debug, Clone)]
pub struct CollisionResponder {
    config: ResponseConfig,
    /// 位于屏幕中心的枢轴节点（缩放 / 翻滚）
    world_pivot: NodeId,
    /// 世界层（震动；按名查找障碍）
    world_layer: NodeId,
}

impl CollisionResponder {
    pub fn new(config: ResponseConfig, world_pivot: NodeId, world_layer: NodeId) -> Self {
        Self {
            config,
            world_pivot,
            world_layer,
        }
    }

    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    pub fn world_pivot(&self) -> NodeId {
        self.world_pivot
    }

    pub fn world_layer(&self) -> NodeId {
        self.world_layer
    }

    /// 处理一次接触开始事件，返回被选中的效果组
    pub fn on_contact(&self, stage: &mut Stage, contact: &Contact) -> Vec<Bundle> {
        let mut bundles = Vec::new();
        self.check_contact(stage, contact, &mut bundles);
        self.check_contact(stage, &contact.swapped(), &mut bundles);
        debug!(
            node_a = %contact.node_a,
            node_b = %contact.node_b,
            bundles = ?bundles,
            "处理接触事件"
        );
        bundles
    }

    fn check_contact(&self, stage: &mut Stage, contact: &Contact, bundles: &mut Vec<Bundle>) {
        if !contact.category_a.contains(Category::BALL) {
            return;
        }
        self.ball_bundle(stage, contact.node_a);
        bundles.push(Bundle::Ball(contact.node_a));

        if contact.category_b.contains(Category::BORDER) {
            self.border_bundle(stage, contact.node_b, contact.point);
            bundles.push(Bundle::Border(contact.node_b));
        } else if contact.category_b.contains(Category::BARRIER) {
            self.barrier_bundle(stage, contact.node_b);
            bundles.push(Bundle::Barrier(contact.node_b));
        }
    }

    /// 点击：对球体精灵执行拉长
    pub fn on_tap(&self, stage: &mut Stage, ball: NodeId) {
        if self.config.flags.stretch_ball {
            let sprite = ball_sprite(stage, ball);
            report("stretch_ball", effects::stretch(stage, sprite));
        }
    }

    // ========== 效果组 ==========

    fn ball_bundle(&self, stage: &mut Stage, ball: NodeId) {
        let flags = &self.config.flags;
        let sprite = ball_sprite(stage, ball);

        if flags.flash_ball {
            report(
                "flash_ball",
                effects::flash_sprite(stage, sprite, self.config.palette.ball_flash),
            );
        }
        if flags.scale_ball {
            report("scale_ball", effects::scale_pulse(stage, sprite));
        }
        if flags.squash_ball {
            report("squash_ball", effects::squash(stage, sprite));
        }

        let velocity = ball_velocity(stage, ball);
        if flags.screen_shake {
            report(
                "screen_shake",
                effects::screen_shake(stage, self.world_layer, velocity),
            );
        }
        if flags.screen_zoom {
            report("screen_zoom", effects::screen_zoom(stage, self.world_pivot));
        }
    }

    fn border_bundle(&self, stage: &mut Stage, border: NodeId, point: Vec2) {
        let flags = &self.config.flags;
        let palette = &self.config.palette;

        if flags.flash_border {
            // 让正在闪烁的边框画在其他边框之上
            report(
                "bring_to_front",
                stage.scene_mut().bring_to_front(border).map_err(Into::into),
            );
            report(
                "flash_border",
                effects::flash_shape(stage, border, palette.border_flash, palette.border),
            );
        }
        if flags.barrier_jelly {
            match stage.scene().child_by_name(self.world_layer, "barrier") {
                Some(barrier) => report("barrier_jelly", effects::jelly(stage, barrier)),
                None => debug!("障碍尚未出现，跳过果冻效果"),
            }
        }
        if flags.screen_tumble {
            let angle = self.tumble_angle_at(stage, border, point);
            report(
                "screen_tumble",
                effects::screen_tumble(stage, self.world_pivot, angle),
            );
        }
        if flags.scale_border {
            report("scale_border", effects::scale_border(stage, border));
        }
    }

    fn barrier_bundle(&self, stage: &mut Stage, barrier: NodeId) {
        let flags = &self.config.flags;
        let palette = &self.config.palette;

        if flags.scale_barrier {
            report("scale_barrier", effects::scale_barrier(stage, barrier));
        }
        if flags.flash_barrier {
            // 物理体挂在枢轴上，填充色在第一个子节点（形状）上
            let shape = first_child_or_self(stage, barrier);
            report(
                "flash_barrier",
                effects::flash_shape(stage, shape, palette.barrier_flash, palette.barrier),
            );
        }
        if flags.color_glitch {
            report(
                "color_glitch",
                effects::color_glitch(stage, palette.background),
            );
        }
    }

    /// 接触点转换到边框局部坐标后计算翻滚角度；无法计算时为 0
    pub fn tumble_angle_at(&self, stage: &Stage, border: NodeId, point: Vec2) -> f32 {
        let scene = stage.scene();
        let shape = scene.get(border).and_then(|n| n.body.as_ref()).map(|b| b.shape);
        let local = scene.convert_point_to_node(point, border);
        match (shape, local) {
            (Some(shape), Some(local)) => effects::tumble_angle(local, &shape),
            _ => {
                debug!(node = %border, "边框缺少物理体或坐标不可逆，翻滚角度取 0");
                0.0
            }
        }
    }
}

/// 球体的精灵：第一个子节点，没有子节点时就是自身
fn ball_sprite(stage: &Stage, ball: NodeId) -> NodeId {
    first_child_or_self(stage, ball)
}

fn first_child_or_self(stage: &Stage, node: NodeId) -> NodeId {
    stage
        .scene()
        .children(node)
        .first()
        .copied()
        .unwrap_or(node)
}

fn ball_velocity(stage: &Stage, ball: NodeId) -> Vec2 {
    stage
        .scene()
        .get(ball)
        .and_then(|n| n.body.as_ref())
        .map_or(Vec2::ZERO, |b| b.velocity)
}

/// 效果失败只记日志
fn report(effect: &'static str, result: JuiceResult<()>) {
    if let Err(e) = result {
        warn!(effect, error = %e, "碰撞效果执行失败，已跳过");
    }
}
