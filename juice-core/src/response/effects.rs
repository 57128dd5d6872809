//! # Effects 模块
//!
//! 碰撞反馈用到的各个视觉效果。
//!
//! 每个函数构造一个动作并在目标节点上启动，参数全部来自 [`defaults`]。
//! 缩放类效果都是"从当前值的某个倍数回到当前值"，所以连续触发会在
//! 已经放大的基础上继续放大。

use crate::action::Action;
use crate::effect::Effect;
use crate::error::JuiceResult;
use crate::math::{Color, Vec2, clamp, degrees_to_radians};
use crate::physics::BodyShape;
use crate::scene::NodeId;
use crate::stage::Stage;
use crate::timing::TimingFunction;

/// 各效果的默认参数
///
/// 这些常量是效果参数的唯一来源。
pub mod defaults {
    /// 精灵闪烁：着色时长
    pub const FLASH_COLORIZE_DURATION: f32 = 0.025;
    /// 精灵闪烁：保持时长
    pub const FLASH_HOLD_DURATION: f32 = 0.05;
    /// 精灵闪烁：褪色时长
    pub const FLASH_FADE_DURATION: f32 = 0.1;
    /// 形状闪烁：多久后恢复原色
    pub const SHAPE_FLASH_DURATION: f32 = 0.15;

    pub const BALL_PULSE_FACTOR: f32 = 1.2;
    pub const BALL_PULSE_DURATION: f32 = 1.5;

    /// 压扁 / 拉长的宽高比
    pub const SQUASH_RATIO: f32 = 1.5;
    pub const SQUASH_DURATION: f32 = 1.5;
    pub const STRETCH_DURATION: f32 = 0.5;

    pub const BORDER_SCALE_X: f32 = 2.0;
    pub const BORDER_SCALE_DURATION: f32 = 1.0;

    pub const BARRIER_SCALE_FACTOR: f32 = 0.5;
    pub const BARRIER_SCALE_DURATION: f32 = 0.5;

    pub const JELLY_SCALE: f32 = 1.25;
    pub const JELLY_DURATION: f32 = 0.25;

    /// 屏幕震动位移 = -速度 / 该值
    pub const SHAKE_VELOCITY_DIVISOR: f32 = 50.0;
    pub const SHAKE_OSCILLATIONS: u32 = 10;
    pub const SHAKE_DURATION: f32 = 3.0;

    pub const ZOOM_AMOUNT: f32 = 1.02;
    pub const ZOOM_OSCILLATIONS: u32 = 10;
    pub const ZOOM_DURATION: f32 = 3.0;

    /// 接触点在边框端点时的翻滚角度（度）
    pub const TUMBLE_MAX_DEGREES: f32 = 10.0;
    pub const TUMBLE_OSCILLATIONS: u32 = 1;
    pub const TUMBLE_DURATION: f32 = 1.0;

    pub const COLOR_GLITCH_DURATION: f32 = 0.1;
}

/// 当前缩放
fn current_scale(stage: &Stage, node: NodeId) -> JuiceResult<Vec2> {
    Ok(stage.scene().node(node)?.scale)
}

/// 从 `start` 缩放回当前值
fn scale_back_from(
    stage: &mut Stage,
    node: NodeId,
    start: Vec2,
    duration: f32,
    timing: TimingFunction,
) -> JuiceResult<()> {
    let end = current_scale(stage, node)?;
    let effect = Effect::scale(stage.scene(), node, duration, start, end)?.with_timing(timing);
    stage.run(node, Action::run_effect(effect))?;
    Ok(())
}

// ========== 闪烁 ==========

/// 精灵着色闪烁：着色 → 保持 → 褪回
pub fn flash_sprite(stage: &mut Stage, sprite: NodeId, color: Color) -> JuiceResult<()> {
    let action = Action::sequence(vec![
        Action::colorize(color, 1.0, defaults::FLASH_COLORIZE_DURATION),
        Action::wait(defaults::FLASH_HOLD_DURATION),
        Action::colorize_blend(0.0, defaults::FLASH_FADE_DURATION),
    ]);
    stage.run(sprite, action)?;
    Ok(())
}

/// 形状填充色硬切换：立即换成 `flash`，一段时间后换回 `base`
pub fn flash_shape(stage: &mut Stage, shape: NodeId, flash: Color, base: Color) -> JuiceResult<()> {
    stage.scene_mut().node_mut(shape)?.fill_color = Some(flash);
    stage.perform_after(shape, defaults::SHAPE_FLASH_DURATION, move |stage| {
        if let Some(node) = stage.scene_mut().get_mut(shape) {
            node.fill_color = Some(base);
        }
    })?;
    Ok(())
}

// ========== 缩放 ==========

/// 球体放大脉冲（可累积）
pub fn scale_pulse(stage: &mut Stage, node: NodeId) -> JuiceResult<()> {
    let start = current_scale(stage, node)? * defaults::BALL_PULSE_FACTOR;
    scale_back_from(
        stage,
        node,
        start,
        defaults::BALL_PULSE_DURATION,
        TimingFunction::ElasticEaseOut,
    )
}

/// 压扁：更宽更扁
pub fn squash(stage: &mut Stage, node: NodeId) -> JuiceResult<()> {
    let ratio = defaults::SQUASH_RATIO;
    let start = current_scale(stage, node)?.mul_components(Vec2::new(ratio, 1.0 / ratio));
    scale_back_from(
        stage,
        node,
        start,
        defaults::SQUASH_DURATION,
        TimingFunction::ElasticEaseOut,
    )
}

/// 拉长：更窄更高
pub fn stretch(stage: &mut Stage, node: NodeId) -> JuiceResult<()> {
    let ratio = defaults::SQUASH_RATIO;
    let start = current_scale(stage, node)?.mul_components(Vec2::new(1.0 / ratio, ratio));
    scale_back_from(
        stage,
        node,
        start,
        defaults::STRETCH_DURATION,
        TimingFunction::CubicEaseOut,
    )
}

/// 边框沿 X 方向拉伸
pub fn scale_border(stage: &mut Stage, node: NodeId) -> JuiceResult<()> {
    let current = current_scale(stage, node)?;
    let start = Vec2::new(current.x * defaults::BORDER_SCALE_X, current.y);
    scale_back_from(
        stage,
        node,
        start,
        defaults::BORDER_SCALE_DURATION,
        TimingFunction::ElasticEaseOut,
    )
}

/// 障碍缩小后回弹
pub fn scale_barrier(stage: &mut Stage, node: NodeId) -> JuiceResult<()> {
    let start = current_scale(stage, node)? * defaults::BARRIER_SCALE_FACTOR;
    scale_back_from(
        stage,
        node,
        start,
        defaults::BARRIER_SCALE_DURATION,
        TimingFunction::ElasticEaseOut,
    )
}

/// 果冻抖动：从固定的 1.25 倍弹回当前值
pub fn jelly(stage: &mut Stage, node: NodeId) -> JuiceResult<()> {
    scale_back_from(
        stage,
        node,
        Vec2::splat(defaults::JELLY_SCALE),
        defaults::JELLY_DURATION,
        TimingFunction::BounceEaseOut,
    )
}

// ========== 屏幕 ==========

/// 屏幕震动：位移方向与碰撞后速度相反，幅度与速度成正比
pub fn screen_shake(stage: &mut Stage, world_layer: NodeId, velocity: Vec2) -> JuiceResult<()> {
    let amount = -velocity / defaults::SHAKE_VELOCITY_DIVISOR;
    let current = stage.scene().node(world_layer)?.position;
    let effect = Effect::translate(
        stage.scene(),
        world_layer,
        defaults::SHAKE_DURATION,
        current + amount,
        current,
    )?
    .with_timing(TimingFunction::shake(defaults::SHAKE_OSCILLATIONS));
    stage.run(world_layer, Action::run_effect(effect))?;
    Ok(())
}

/// 屏幕轻微放大后回弹
pub fn screen_zoom(stage: &mut Stage, world_pivot: NodeId) -> JuiceResult<()> {
    let current = current_scale(stage, world_pivot)?;
    let effect = Effect::scale(
        stage.scene(),
        world_pivot,
        defaults::ZOOM_DURATION,
        current * defaults::ZOOM_AMOUNT,
        current,
    )?
    .with_timing(TimingFunction::shake(defaults::ZOOM_OSCILLATIONS));
    stage.run(world_pivot, Action::run_effect(effect))?;
    Ok(())
}

/// 屏幕绕中心翻滚 `angle` 弧度后回摆
pub fn screen_tumble(stage: &mut Stage, world_pivot: NodeId, angle: f32) -> JuiceResult<()> {
    let current = stage.scene().node(world_pivot)?.rotation;
    let effect = Effect::rotate(
        stage.scene(),
        world_pivot,
        defaults::TUMBLE_DURATION,
        current + angle,
        current,
    )?
    .with_timing(TimingFunction::shake(defaults::TUMBLE_OSCILLATIONS));
    stage.run(world_pivot, Action::run_effect(effect))?;
    Ok(())
}

/// 翻滚角度
///
/// `local_point` 为接触点在边框节点局部坐标下的位置。沿边框长轴（局部 Y）
/// 相对中心的偏移按半长归一化到 `[-1, 1]`，再乘以最大角度。中心处恰好为 0。
pub fn tumble_angle(local_point: Vec2, shape: &BodyShape) -> f32 {
    let (center, half_length) = match *shape {
        BodyShape::Rect { origin, size } => (origin.y + size.y / 2.0, size.y / 2.0),
        BodyShape::Circle { radius } => (0.0, radius),
    };
    if half_length <= 0.0 {
        return 0.0;
    }
    let offset = clamp((local_point.y - center) / half_length, -1.0, 1.0);
    degrees_to_radians(defaults::TUMBLE_MAX_DEGREES) * offset
}

/// 背景随机色闪烁，结束后恢复 `original`
pub fn color_glitch(stage: &mut Stage, original: Color) -> JuiceResult<()> {
    let root = stage.scene().root();
    stage.run(
        root,
        Action::color_glitch(original, defaults::COLOR_GLITCH_DURATION),
    )?;
    Ok(())
}
