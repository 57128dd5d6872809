//! # Effect 模块
//!
//! 叠加式属性插值器。
//!
//! 每个 [`Effect`] 只把"自己上一帧以来的增量"叠加到节点当前值上，
//! 而不是直接覆盖。因此同一属性上可以同时跑任意多个效果：
//!
//! - 位置 / 旋转 / 透明度 / 颜色：加法增量 `new - previous`
//! - 缩放：乘法增量 `new / previous`
//!
//! 同一帧内多个效果的执行顺序不影响最终结果。
//!
//! `previous` 在构造时取自节点当前值，所以效果跑完后节点值会精确地
//! 落到 `end`（在没有其他效果干扰时）。

use tracing::trace;

use crate::error::EffectError;
use crate::math::{Color, Vec2, clamp};
use crate::scene::{NodeId, SceneGraph};
use crate::timing::TimingFunction;

/// 缩放分量的最小绝对值，防止乘法增量除零
pub const SCALE_EPSILON: f32 = 1.0e-4;

/// 效果作用的属性及其插值端点
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectKind {
    /// 位置（加法）
    Move { start: Vec2, end: Vec2, previous: Vec2 },
    /// 缩放（乘法，X/Y 可不同）
    Scale { start: Vec2, end: Vec2, previous: Vec2 },
    /// 旋转（加法，弧度；不做 ±π 修正）
    Rotate { start: f32, end: f32, previous: f32 },
    /// 透明度（加法）
    Alpha { start: f32, end: f32, previous: f32 },
    /// 着色颜色（逐分量加法）
    Color {
        start: Color,
        end: Color,
        previous: Color,
    },
}

impl EffectKind {
    /// 属性名（日志用）
    pub fn property(&self) -> &'static str {
        match self {
            Self::Move { .. } => "position",
            Self::Scale { .. } => "scale",
            Self::Rotate { .. } => "rotation",
            Self::Alpha { .. } => "alpha",
            Self::Color { .. } => "color",
        }
    }
}

/// 一次进行中的属性插值
///
/// 效果本身不知道何时结束：由承载它的动作在 `elapsed >= duration` 时停止调用 `tick`。
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    target: NodeId,
    duration: f32,
    timing: TimingFunction,
    kind: EffectKind,
}

impl Effect {
    fn validate(scene: &SceneGraph, target: NodeId, duration: f32) -> Result<(), EffectError> {
        if !(duration > 0.0 && duration.is_finite()) {
            return Err(EffectError::InvalidDuration(duration));
        }
        if !scene.contains(target) {
            return Err(EffectError::DanglingTarget(target));
        }
        Ok(())
    }

    fn create(target: NodeId, duration: f32, kind: EffectKind) -> Self {
        Self {
            target,
            duration,
            timing: TimingFunction::Linear,
            kind,
        }
    }

    /// 位置效果：`start → end`
    pub fn translate(
        scene: &SceneGraph,
        target: NodeId,
        duration: f32,
        start: Vec2,
        end: Vec2,
    ) -> Result<Self, EffectError> {
        Self::validate(scene, target, duration)?;
        let previous = scene.node(target).map_err(|_| EffectError::DanglingTarget(target))?.position;
        Ok(Self::create(target, duration, EffectKind::Move { start, end, previous }))
    }

    /// 缩放效果：`start → end`
    pub fn scale(
        scene: &SceneGraph,
        target: NodeId,
        duration: f32,
        start: Vec2,
        end: Vec2,
    ) -> Result<Self, EffectError> {
        Self::validate(scene, target, duration)?;
        let previous = scene.node(target).map_err(|_| EffectError::DanglingTarget(target))?.scale;
        Ok(Self::create(target, duration, EffectKind::Scale { start, end, previous }))
    }

    /// 旋转效果：`start → end`（弧度）
    pub fn rotate(
        scene: &SceneGraph,
        target: NodeId,
        duration: f32,
        start: f32,
        end: f32,
    ) -> Result<Self, EffectError> {
        Self::validate(scene, target, duration)?;
        let previous = scene.node(target).map_err(|_| EffectError::DanglingTarget(target))?.rotation;
        Ok(Self::create(target, duration, EffectKind::Rotate { start, end, previous }))
    }

    /// 透明度效果：`start → end`
    pub fn alpha(
        scene: &SceneGraph,
        target: NodeId,
        duration: f32,
        start: f32,
        end: f32,
    ) -> Result<Self, EffectError> {
        Self::validate(scene, target, duration)?;
        let previous = scene.node(target).map_err(|_| EffectError::DanglingTarget(target))?.alpha;
        Ok(Self::create(target, duration, EffectKind::Alpha { start, end, previous }))
    }

    /// 着色颜色效果：`start → end`
    pub fn color(
        scene: &SceneGraph,
        target: NodeId,
        duration: f32,
        start: Color,
        end: Color,
    ) -> Result<Self, EffectError> {
        Self::validate(scene, target, duration)?;
        let previous = scene.node(target).map_err(|_| EffectError::DanglingTarget(target))?.color;
        Ok(Self::create(target, duration, EffectKind::Color { start, end, previous }))
    }

    /// 替换缓动函数（默认 Linear）
    pub fn with_timing(mut self, timing: TimingFunction) -> Self {
        self.timing = timing;
        self
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn timing(&self) -> TimingFunction {
        self.timing
    }

    pub fn kind(&self) -> &EffectKind {
        &self.kind
    }

    /// 推进到 `elapsed` 秒
    ///
    /// 进度 `elapsed / duration` 先限制在 `[0, 1]`，再经过缓动函数，
    /// 然后把相对上一次的增量叠加到节点上。
    pub fn tick(&mut self, scene: &mut SceneGraph, elapsed: f32) -> Result<(), EffectError> {
        let target = self.target;
        let node = scene
            .get_mut(target)
            .ok_or(EffectError::DanglingTarget(target))?;

        let t = self.timing.apply(clamp(elapsed / self.duration, 0.0, 1.0));

        match &mut self.kind {
            EffectKind::Move { start, end, previous } => {
                let new = *start + (*end - *start) * t;
                node.position += new - *previous;
                *previous = new;
            }
            EffectKind::Scale { start, end, previous } => {
                // 0 不能作为中间值，否则之后的比例全部被吸收
                let raw = *start + (*end - *start) * t;
                let new = Vec2::new(guard_scale(raw.x, target), guard_scale(raw.y, target));
                let guarded = Vec2::new(guard_scale(previous.x, target), guard_scale(previous.y, target));
                node.scale = node.scale.mul_components(new.div_components(guarded));
                *previous = new;
            }
            EffectKind::Rotate { start, end, previous } => {
                let new = *start + (*end - *start) * t;
                node.rotation += new - *previous;
                *previous = new;
            }
            EffectKind::Alpha { start, end, previous } => {
                let new = *start + (*end - *start) * t;
                node.alpha += new - *previous;
                *previous = new;
            }
            EffectKind::Color { start, end, previous } => {
                let new = start.lerp(*end, t);
                node.color.r += new.r - previous.r;
                node.color.g += new.g - previous.g;
                node.color.b += new.b - previous.b;
                node.color.a += new.a - previous.a;
                *previous = new;
            }
        }
        Ok(())
    }
}

/// 把接近 0 的缩放分量推到 `±SCALE_EPSILON`
fn guard_scale(value: f32, target: NodeId) -> f32 {
    if value.abs() >= SCALE_EPSILON {
        return value;
    }
    trace!(node = %target, value, "缩放分量过小，已钳制");
    if value < 0.0 { -SCALE_EPSILON } else { SCALE_EPSILON }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    fn scene_with(node: Node) -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let id = scene.add_child(scene.root(), node).unwrap();
        (scene, id)
    }

    /// 以 `steps` 个等长步推进效果到结束
    fn run(effect: &mut Effect, scene: &mut SceneGraph, steps: u32) {
        let dt = effect.duration() / steps as f32;
        for i in 1..=steps {
            effect.tick(scene, dt * i as f32).unwrap();
        }
    }

    // ========== 构造校验 ==========

    #[test]
    fn test_rejects_non_positive_duration() {
        let (scene, id) = scene_with(Node::new());
        for bad in [0.0, -1.0, f32::NAN] {
            let err = Effect::translate(&scene, id, bad, Vec2::ZERO, Vec2::ONE).unwrap_err();
            assert!(matches!(err, EffectError::InvalidDuration(_)));
        }
    }

    #[test]
    fn test_rejects_missing_target() {
        let (mut scene, id) = scene_with(Node::new());
        scene.remove_from_parent(id).unwrap();
        let err = Effect::rotate(&scene, id, 1.0, 0.0, 1.0).unwrap_err();
        assert_eq!(err, EffectError::DanglingTarget(id));
    }

    #[test]
    fn test_default_timing_is_linear() {
        let (scene, id) = scene_with(Node::new());
        let effect = Effect::alpha(&scene, id, 1.0, 0.0, 1.0).unwrap();
        assert_eq!(effect.timing(), TimingFunction::Linear);
        let effect = effect.with_timing(TimingFunction::BounceEaseOut);
        assert_eq!(effect.timing(), TimingFunction::BounceEaseOut);
    }

    // ========== 增量语义 ==========

    #[test]
    fn test_move_reaches_end() {
        let (mut scene, id) = scene_with(Node::new().with_position(Vec2::new(5.0, 5.0)));
        let mut effect =
            Effect::translate(&scene, id, 0.5, Vec2::new(5.0, 5.0), Vec2::new(15.0, -5.0)).unwrap();
        run(&mut effect, &mut scene, 7);
        let pos = scene.get(id).unwrap().position;
        assert!((pos - Vec2::new(15.0, -5.0)).length() < 1e-4);
    }

    #[test]
    fn test_move_first_tick_jumps_to_start() {
        // 起点与节点当前值不同：第一帧把节点带到起点附近，最终落到终点
        let (mut scene, id) = scene_with(Node::new().with_position(Vec2::new(100.0, 100.0)));
        let mut effect = Effect::translate(
            &scene,
            id,
            1.0,
            Vec2::new(110.0, 100.0),
            Vec2::new(100.0, 100.0),
        )
        .unwrap();
        effect.tick(&mut scene, 0.0).unwrap();
        assert_eq!(scene.get(id).unwrap().position, Vec2::new(110.0, 100.0));
        effect.tick(&mut scene, 1.0).unwrap();
        assert_eq!(scene.get(id).unwrap().position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_scale_telescopes_independent_of_tick_count() {
        for steps in [1, 3, 10, 60, 240] {
            let (mut scene, id) = scene_with(Node::new());
            let mut effect = Effect::scale(&scene, id, 1.5, Vec2::new(1.2, 1.2), Vec2::ONE)
                .unwrap()
                .with_timing(TimingFunction::ElasticEaseOut);
            run(&mut effect, &mut scene, steps);
            let scale = scene.get(id).unwrap().scale;
            assert!((scale - Vec2::ONE).length() < 1e-5, "steps = {steps}, scale = {scale:?}");
        }
    }

    #[test]
    fn test_concurrent_moves_sum() {
        let (mut scene, id) = scene_with(Node::new());
        let mut a = Effect::translate(&scene, id, 1.0, Vec2::ZERO, Vec2::new(10.0, 0.0)).unwrap();
        let mut b = Effect::translate(&scene, id, 1.0, Vec2::ZERO, Vec2::new(0.0, 4.0))
            .unwrap()
            .with_timing(TimingFunction::QuadraticEaseIn);

        for i in 1..=10 {
            let t = i as f32 / 10.0;
            // 交替顺序
            if i % 2 == 0 {
                a.tick(&mut scene, t).unwrap();
                b.tick(&mut scene, t).unwrap();
            } else {
                b.tick(&mut scene, t).unwrap();
                a.tick(&mut scene, t).unwrap();
            }
        }
        let pos = scene.get(id).unwrap().position;
        assert!((pos - Vec2::new(10.0, 4.0)).length() < 1e-4);
    }

    #[test]
    fn test_concurrent_scales_multiply() {
        let (mut scene, id) = scene_with(Node::new().with_scale(Vec2::splat(2.0)));
        let mut a = Effect::scale(&scene, id, 1.0, Vec2::splat(2.0), Vec2::splat(4.0)).unwrap();
        let mut b = Effect::scale(&scene, id, 0.5, Vec2::splat(2.0), Vec2::splat(1.0)).unwrap();
        for i in 1..=20 {
            let t = i as f32 / 20.0;
            a.tick(&mut scene, t).unwrap();
            b.tick(&mut scene, t).unwrap();
        }
        // 2 · (4/2) · (1/2) = 2
        let scale = scene.get(id).unwrap().scale;
        assert!((scale - Vec2::splat(2.0)).length() < 1e-4);
    }

    #[test]
    fn test_scale_never_produces_nan_near_zero() {
        let (mut scene, id) = scene_with(Node::new().with_scale(Vec2::ZERO));
        let mut effect = Effect::scale(&scene, id, 1.0, Vec2::ZERO, Vec2::new(1.0, -1.0)).unwrap();
        for i in 0..=50 {
            effect.tick(&mut scene, i as f32 / 50.0).unwrap();
            assert!(scene.get(id).unwrap().scale.is_finite());
        }
    }

    #[test]
    fn test_scale_from_zero_reaches_end() {
        let (mut scene, id) = scene_with(Node::new());
        let mut effect = Effect::scale(&scene, id, 1.0, Vec2::ZERO, Vec2::ONE).unwrap();
        for i in 0..=10 {
            effect.tick(&mut scene, i as f32 / 10.0).unwrap();
            assert!(scene.get(id).unwrap().scale.is_finite());
        }
        let scale = scene.get(id).unwrap().scale;
        assert!((scale - Vec2::ONE).length() < 1e-4, "scale = {scale:?}");

        // 穿过 0 翻转符号
        let (mut scene, id) = scene_with(Node::new());
        let mut effect = Effect::scale(&scene, id, 1.0, Vec2::ZERO, Vec2::new(1.0, -1.0)).unwrap();
        for i in 0..=50 {
            effect.tick(&mut scene, i as f32 / 50.0).unwrap();
        }
        let scale = scene.get(id).unwrap().scale;
        assert!((scale - Vec2::new(1.0, -1.0)).length() < 1e-4, "scale = {scale:?}");
    }

    #[test]
    fn test_scale_down_to_zero_and_back() {
        let (mut scene, id) = scene_with(Node::new());
        let mut shrink = Effect::scale(&scene, id, 1.0, Vec2::ONE, Vec2::ZERO).unwrap();
        for i in 0..=50 {
            shrink.tick(&mut scene, i as f32 / 50.0).unwrap();
        }
        // 停在 SCALE_EPSILON 而不是 0
        let scale = scene.get(id).unwrap().scale;
        assert!((scale - Vec2::splat(SCALE_EPSILON)).length() < 1e-6, "scale = {scale:?}");

        let mut grow = Effect::scale(&scene, id, 1.0, Vec2::ZERO, Vec2::ONE).unwrap();
        for i in 0..=50 {
            grow.tick(&mut scene, i as f32 / 50.0).unwrap();
            assert!(scene.get(id).unwrap().scale.is_finite());
        }
        let scale = scene.get(id).unwrap().scale;
        assert!((scale - Vec2::ONE).length() < 1e-3, "scale = {scale:?}");
    }

    #[test]
    fn test_rotate_and_alpha_are_additive() {
        let (mut scene, id) = scene_with(Node::new().with_rotation(1.0).with_alpha(0.5));
        let mut rot = Effect::rotate(&scene, id, 1.0, 1.0, 2.0).unwrap();
        let mut extra = Effect::rotate(&scene, id, 1.0, 0.0, 0.5).unwrap();
        let mut fade = Effect::alpha(&scene, id, 1.0, 0.5, 0.0).unwrap();
        for i in 1..=4 {
            let t = i as f32 / 4.0;
            rot.tick(&mut scene, t).unwrap();
            extra.tick(&mut scene, t).unwrap();
            fade.tick(&mut scene, t).unwrap();
        }
        let node = scene.get(id).unwrap();
        // extra 的 previous 快照是 1.0，第一帧先把旋转拉回 0 附近再往上走
        assert!((node.rotation - 1.5).abs() < 1e-5);
        assert!(node.alpha.abs() < 1e-6);
    }

    #[test]
    fn test_color_effect() {
        let (mut scene, id) = scene_with(Node::new());
        let mut effect = Effect::color(&scene, id, 0.2, Color::WHITE, Color::RED).unwrap();
        effect.tick(&mut scene, 0.2).unwrap();
        let color = scene.get(id).unwrap().color;
        assert!((color.g).abs() < 1e-6);
        assert_eq!(color.r, 1.0);
    }

    #[test]
    fn test_tick_after_removal_reports_dangling() {
        let (mut scene, id) = scene_with(Node::new());
        let mut effect = Effect::translate(&scene, id, 1.0, Vec2::ZERO, Vec2::ONE).unwrap();
        scene.remove_from_parent(id).unwrap();
        assert_eq!(
            effect.tick(&mut scene, 0.5).unwrap_err(),
            EffectError::DanglingTarget(id)
        );
    }
}
