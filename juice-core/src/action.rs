//! # Action 模块
//!
//! 动作组合层：把等待 / 顺序 / 并行 / 无限重复 / 回调 / 效果组合成一棵树，
//! 由 [`Stage`] 每帧推进。
//!
//! [`Action`] 是可克隆的模板；交给 `Stage::run` 时展开为运行态 [`Running`]。
//! 每次推进返回 [`ActionStatus`]：子动作在帧中途结束时，剩余时间会继续
//! 交给下一个子动作，所以顺序动作的总时长与帧率无关。
//!
//! ```rust,ignore
//! let bounce = Action::sequence(vec![
//!     Action::wait(0.5),
//!     Action::run_effect(Effect::translate(stage.scene(), border, 0.5, start, end)?
//!         .with_timing(TimingFunction::BounceEaseOut)),
//! ]);
//! stage.run(border, bounce)?;
//! ```

use std::rc::Rc;

use rand::RngExt;
use tracing::{debug, warn};

use crate::effect::Effect;
use crate::math::{Color, Vec2, clamp};
use crate::scene::NodeId;
use crate::stage::Stage;

/// 回调：同步执行一次，可以访问整个舞台
pub type Callback = Rc<dyn Fn(&mut Stage)>;

/// 动作模板
#[derive(Clone)]
pub enum Action {
    /// 被动等待
    Wait(f32),
    /// 按顺序执行，前一个结束后才开始下一个
    Sequence(Vec<Action>),
    /// 同时开始，全部结束后才结束
    Group(Vec<Action>),
    /// 子动作结束后立即重新开始，永不结束
    RepeatForever(Box<Action>),
    /// 每帧推进一个效果直到时长用完
    RunEffect(Effect),
    /// 执行一次回调后立即结束
    RunCallback(Callback),
    /// 着色颜色 / 混合系数的绝对插值（`color` 为 `None` 时只改混合系数）
    Colorize {
        color: Option<Color>,
        blend: f32,
        duration: f32,
    },
    /// 透明度的绝对插值
    FadeAlpha { to: f32, duration: f32 },
    /// 抛物线跳跃：`y = origin.y + height·4·f·(1-f)`
    Jump {
        height: f32,
        duration: f32,
        origin: Vec2,
    },
    /// 持续期间每帧把背景设为随机色，结束时恢复 `original`
    ColorGlitch { original: Color, duration: f32 },
    /// 把所属节点从场景中移除
    RemoveFromParent,
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wait(d) => f.debug_tuple("Wait").field(d).finish(),
            Self::Sequence(list) => f.debug_tuple("Sequence").field(list).finish(),
            Self::Group(list) => f.debug_tuple("Group").field(list).finish(),
            Self::RepeatForever(child) => f.debug_tuple("RepeatForever").field(child).finish(),
            Self::RunEffect(effect) => f.debug_tuple("RunEffect").field(effect).finish(),
            Self::RunCallback(_) => f.write_str("RunCallback(..)"),
            Self::Colorize {
                color,
                blend,
                duration,
            } => f
                .debug_struct("Colorize")
                .field("color", color)
                .field("blend", blend)
                .field("duration", duration)
                .finish(),
            Self::FadeAlpha { to, duration } => f
                .debug_struct("FadeAlpha")
                .field("to", to)
                .field("duration", duration)
                .finish(),
            Self::Jump {
                height,
                duration,
                origin,
            } => f
                .debug_struct("Jump")
                .field("height", height)
                .field("duration", duration)
                .field("origin", origin)
                .finish(),
            Self::ColorGlitch { original, duration } => f
                .debug_struct("ColorGlitch")
                .field("original", original)
                .field("duration", duration)
                .finish(),
            Self::RemoveFromParent => f.write_str("RemoveFromParent"),
        }
    }
}

impl Action {
    pub fn wait(duration: f32) -> Self {
        Self::Wait(duration)
    }

    pub fn sequence(actions: Vec<Action>) -> Self {
        Self::Sequence(actions)
    }

    pub fn group(actions: Vec<Action>) -> Self {
        Self::Group(actions)
    }

    pub fn repeat_forever(action: Action) -> Self {
        Self::RepeatForever(Box::new(action))
    }

    pub fn run_effect(effect: Effect) -> Self {
        Self::RunEffect(effect)
    }

    pub fn run_callback(callback: impl Fn(&mut Stage) + 'static) -> Self {
        Self::RunCallback(Rc::new(callback))
    }

    /// 延迟 `delay` 秒后执行 `action`
    pub fn after_delay(delay: f32, action: Action) -> Self {
        Self::sequence(vec![Self::wait(delay), action])
    }

    /// 延迟 `delay` 秒后执行回调
    pub fn after_delay_run(delay: f32, callback: impl Fn(&mut Stage) + 'static) -> Self {
        Self::after_delay(delay, Self::run_callback(callback))
    }

    pub fn remove_from_parent() -> Self {
        Self::RemoveFromParent
    }

    pub fn remove_from_parent_after_delay(delay: f32) -> Self {
        Self::after_delay(delay, Self::RemoveFromParent)
    }

    pub fn fade_alpha_to(alpha: f32, duration: f32) -> Self {
        Self::FadeAlpha {
            to: alpha,
            duration,
        }
    }

    pub fn fade_in(duration: f32) -> Self {
        Self::fade_alpha_to(1.0, duration)
    }

    pub fn fade_out(duration: f32) -> Self {
        Self::fade_alpha_to(0.0, duration)
    }

    /// 插值到指定着色颜色与混合系数
    pub fn colorize(color: Color, blend: f32, duration: f32) -> Self {
        Self::Colorize {
            color: Some(color),
            blend,
            duration,
        }
    }

    /// 只插值混合系数，保留当前着色颜色
    pub fn colorize_blend(blend: f32, duration: f32) -> Self {
        Self::Colorize {
            color: None,
            blend,
            duration,
        }
    }

    pub fn jump(height: f32, duration: f32, origin: Vec2) -> Self {
        Self::Jump {
            height,
            duration,
            origin,
        }
    }

    pub fn color_glitch(original: Color, duration: f32) -> Self {
        Self::ColorGlitch { original, duration }
    }

    /// 总时长；包含无限重复时为 `None`
    pub fn duration(&self) -> Option<f32> {
        match self {
            Self::Wait(d) => Some(*d),
            Self::Sequence(list) => list.iter().map(Action::duration).sum(),
            Self::Group(list) => list
                .iter()
                .map(Action::duration)
                .try_fold(0.0f32, |acc, d| d.map(|d| acc.max(d))),
            Self::RepeatForever(_) => None,
            Self::RunEffect(effect) => Some(effect.duration()),
            Self::RunCallback(_) | Self::RemoveFromParent => Some(0.0),
            Self::Colorize { duration, .. }
            | Self::FadeAlpha { duration, .. }
            | Self::Jump { duration, .. }
            | Self::ColorGlitch { duration, .. } => Some(*duration),
        }
    }

    /// 展开为运行态
    pub(crate) fn instantiate(&self) -> Running {
        match self {
            Self::Wait(duration) => Running::Wait {
                duration: *duration,
                elapsed: 0.0,
            },
            Self::Sequence(list) => Running::Sequence {
                children: list.iter().map(Action::instantiate).collect(),
                index: 0,
            },
            Self::Group(list) => Running::Group {
                children: list.iter().map(Action::instantiate).collect(),
                done: vec![false; list.len()],
            },
            Self::RepeatForever(child) => Running::RepeatForever(Box::new(child.instantiate())),
            Self::RunEffect(effect) => Running::Effect {
                effect: effect.clone(),
                elapsed: 0.0,
            },
            Self::RunCallback(callback) => Running::Callback(Rc::clone(callback)),
            Self::Colorize {
                color,
                blend,
                duration,
            } => Running::Colorize {
                color: *color,
                blend: *blend,
                duration: *duration,
                elapsed: 0.0,
                from: None,
            },
            Self::FadeAlpha { to, duration } => Running::FadeAlpha {
                to: *to,
                duration: *duration,
                elapsed: 0.0,
                from: None,
            },
            Self::Jump {
                height,
                duration,
                origin,
            } => Running::Jump {
                height: *height,
                duration: *duration,
                origin: *origin,
                elapsed: 0.0,
            },
            Self::ColorGlitch { original, duration } => Running::ColorGlitch {
                original: *original,
                duration: *duration,
                elapsed: 0.0,
            },
            Self::RemoveFromParent => Running::RemoveFromParent,
        }
    }
}

/// 一次推进的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionStatus {
    Running,
    /// 已结束；`leftover` 是本帧未用完的时间
    Finished { leftover: f32 },
}

/// 运行态动作树
pub(crate) enum Running {
    Wait {
        duration: f32,
        elapsed: f32,
    },
    Sequence {
        children: Vec<Running>,
        index: usize,
    },
    Group {
        children: Vec<Running>,
        done: Vec<bool>,
    },
    RepeatForever(Box<Running>),
    Effect {
        effect: Effect,
        elapsed: f32,
    },
    Callback(Callback),
    Colorize {
        color: Option<Color>,
        blend: f32,
        duration: f32,
        elapsed: f32,
        from: Option<(Color, f32)>,
    },
    FadeAlpha {
        to: f32,
        duration: f32,
        elapsed: f32,
        from: Option<f32>,
    },
    Jump {
        height: f32,
        duration: f32,
        origin: Vec2,
        elapsed: f32,
    },
    ColorGlitch {
        original: Color,
        duration: f32,
        elapsed: f32,
    },
    RemoveFromParent,
}

/// 累加时间并判断是否到期
fn advance(elapsed: &mut f32, duration: f32, dt: f32) -> ActionStatus {
    *elapsed += dt;
    if *elapsed >= duration {
        ActionStatus::Finished {
            leftover: *elapsed - duration.max(0.0),
        }
    } else {
        ActionStatus::Running
    }
}

/// 归一化进度，时长非正时视为已完成
fn fraction(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        clamp(elapsed / duration, 0.0, 1.0)
    }
}

impl Running {
    /// 推进 `dt` 秒；`owner` 为运行该动作的节点
    pub(crate) fn tick(&mut self, stage: &mut Stage, owner: NodeId, dt: f32) -> ActionStatus {
        if !stage.scene().contains(owner) {
            return ActionStatus::Finished { leftover: 0.0 };
        }

        match self {
            Self::Wait { duration, elapsed } => advance(elapsed, *duration, dt),

            Self::Sequence { children, index } => {
                let mut remaining = dt;
                while let Some(child) = children.get_mut(*index) {
                    match child.tick(stage, owner, remaining) {
                        ActionStatus::Running => return ActionStatus::Running,
                        ActionStatus::Finished { leftover } => {
                            *index += 1;
                            remaining = leftover;
                        }
                    }
                }
                ActionStatus::Finished {
                    leftover: remaining,
                }
            }

            Self::Group { children, done } => {
                let mut min_leftover: Option<f32> = None;
                for (child, done) in children.iter_mut().zip(done.iter_mut()) {
                    if *done {
                        continue;
                    }
                    if let ActionStatus::Finished { leftover } = child.tick(stage, owner, dt) {
                        *done = true;
                        min_leftover = Some(min_leftover.map_or(leftover, |m| m.min(leftover)));
                    }
                }
                if done.iter().all(|d| *d) {
                    ActionStatus::Finished {
                        leftover: min_leftover.unwrap_or(dt),
                    }
                } else {
                    ActionStatus::Running
                }
            }

            Self::RepeatForever(child) => {
                let mut remaining = dt;
                loop {
                    match child.tick(stage, owner, remaining) {
                        ActionStatus::Running => return ActionStatus::Running,
                        ActionStatus::Finished { leftover } => {
                            child.reset();
                            // 时间恰好用完，或本轮没有消耗时间：下一轮留到下一帧
                            if leftover <= 0.0
                                || leftover >= remaining
                                || !stage.scene().contains(owner)
                            {
                                return ActionStatus::Running;
                            }
                            remaining = leftover;
                        }
                    }
                }
            }

            Self::Effect { effect, elapsed } => {
                *elapsed += dt;
                let duration = effect.duration();
                if let Err(e) = effect.tick(stage.scene_mut(), elapsed.min(duration)) {
                    debug!(error = %e, "效果目标已移除，停止推进");
                    return ActionStatus::Finished { leftover: 0.0 };
                }
                if *elapsed >= duration {
                    ActionStatus::Finished {
                        leftover: *elapsed - duration,
                    }
                } else {
                    ActionStatus::Running
                }
            }

            Self::Callback(callback) => {
                let callback = Rc::clone(callback);
                callback(stage);
                ActionStatus::Finished { leftover: dt }
            }

            Self::Colorize {
                color,
                blend,
                duration,
                elapsed,
                from,
            } => {
                let status = advance(elapsed, *duration, dt);
                let f = fraction(*elapsed, *duration);
                if let Some(node) = stage.scene_mut().get_mut(owner) {
                    let (from_color, from_blend) =
                        *from.get_or_insert((node.color, node.color_blend_factor));
                    if let Some(target) = color {
                        node.color = from_color.lerp(*target, f);
                    }
                    node.color_blend_factor = from_blend + (*blend - from_blend) * f;
                }
                status
            }

            Self::FadeAlpha {
                to,
                duration,
                elapsed,
                from,
            } => {
                let status = advance(elapsed, *duration, dt);
                let f = fraction(*elapsed, *duration);
                if let Some(node) = stage.scene_mut().get_mut(owner) {
                    let from_alpha = *from.get_or_insert(node.alpha);
                    node.alpha = from_alpha + (*to - from_alpha) * f;
                }
                status
            }

            Self::Jump {
                height,
                duration,
                origin,
                elapsed,
            } => {
                let status = advance(elapsed, *duration, dt);
                let f = fraction(*elapsed, *duration);
                if let Some(node) = stage.scene_mut().get_mut(owner) {
                    let y_offset = *height * 4.0 * f * (1.0 - f);
                    node.position = Vec2::new(origin.x, origin.y + y_offset);
                }
                status
            }

            Self::ColorGlitch {
                original,
                duration,
                elapsed,
            } => {
                let status = advance(elapsed, *duration, dt);
                let color = match status {
                    ActionStatus::Running => {
                        let rng = stage.rng_mut();
                        Color::from_rgb8(
                            rng.random_range(0..255),
                            rng.random_range(0..255),
                            rng.random_range(0..255),
                        )
                    }
                    ActionStatus::Finished { .. } => *original,
                };
                stage.scene_mut().set_background(color);
                status
            }

            Self::RemoveFromParent => {
                if let Err(e) = stage.remove_node(owner) {
                    warn!(node = %owner, error = %e, "移除节点失败");
                }
                ActionStatus::Finished { leftover: dt }
            }
        }
    }

    /// 回到初始状态以便重复执行
    ///
    /// 效果保留自己的 `previous`，所以重复的位移 / 缩放会从上一轮的终点
    /// 跳回起点而不是累积漂移。
    pub(crate) fn reset(&mut self) {
        match self {
            Self::Wait { elapsed, .. }
            | Self::Effect { elapsed, .. }
            | Self::Jump { elapsed, .. }
            | Self::ColorGlitch { elapsed, .. } => *elapsed = 0.0,
            Self::Sequence { children, index } => {
                *index = 0;
                children.iter_mut().for_each(Running::reset);
            }
            Self::Group { children, done } => {
                done.iter_mut().for_each(|d| *d = false);
                children.iter_mut().for_each(Running::reset);
            }
            Self::RepeatForever(child) => child.reset(),
            Self::Colorize { elapsed, from, .. } => {
                *elapsed = 0.0;
                *from = None;
            }
            Self::FadeAlpha { elapsed, from, .. } => {
                *elapsed = 0.0;
                *from = None;
            }
            Self::Callback(_) | Self::RemoveFromParent => {}
        }
    }
}
