//! # Timing 模块
//!
//! 缓动函数库：把归一化进度 `t ∈ [0, 1]` 映射为缓动后的进度。
//!
//! - 标准曲线满足 `f(0) = 0`、`f(1) = 1`；back / elastic 系列中途可能越界（回弹）
//! - [`TimingFunction::Shake`] 是衰减振荡曲线，起止都在 1.0 附近，
//!   用于屏幕震动 / 缩放 / 翻滚

use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

/// back 系列的回弹常数
const BACK_OVERSHOOT: f32 = 1.70158;

/// elastic 系列的角频率系数（13·π/2）
const ELASTIC_FREQUENCY: f32 = 13.0 * FRAC_PI_2;

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingFunction {
    /// 线性（匀速）
    #[default]
    Linear,
    QuadraticEaseIn,
    QuadraticEaseOut,
    QuadraticEaseInOut,
    CubicEaseIn,
    CubicEaseOut,
    CubicEaseInOut,
    QuarticEaseIn,
    QuarticEaseOut,
    QuarticEaseInOut,
    QuinticEaseIn,
    QuinticEaseOut,
    QuinticEaseInOut,
    SineEaseIn,
    SineEaseOut,
    SineEaseInOut,
    CircularEaseIn,
    CircularEaseOut,
    CircularEaseInOut,
    ExponentialEaseIn,
    ExponentialEaseOut,
    ExponentialEaseInOut,
    ElasticEaseIn,
    ElasticEaseOut,
    ElasticEaseInOut,
    BackEaseIn,
    BackEaseOut,
    BackEaseInOut,
    /// 由 `sin(t·π)` 驱动的强回弹
    ExtremeBackEaseIn,
    ExtremeBackEaseOut,
    ExtremeBackEaseInOut,
    BounceEaseIn,
    BounceEaseOut,
    BounceEaseInOut,
    /// `3t² - 2t³`
    Smoothstep,
    /// 衰减振荡：`-2^(-10t)·sin(t·2π·oscillations) + 1`
    Shake {
        /// 振荡次数
        oscillations: u32,
    },
}

impl TimingFunction {
    /// 所有满足 `f(0) = 0`、`f(1) = 1` 的标准曲线
    pub const STANDARD: [TimingFunction; 35] = [
        Self::Linear,
        Self::QuadraticEaseIn,
        Self::QuadraticEaseOut,
        Self::QuadraticEaseInOut,
        Self::CubicEaseIn,
        Self::CubicEaseOut,
        Self::CubicEaseInOut,
        Self::QuarticEaseIn,
        Self::QuarticEaseOut,
        Self::QuarticEaseInOut,
        Self::QuinticEaseIn,
        Self::QuinticEaseOut,
        Self::QuinticEaseInOut,
        Self::SineEaseIn,
        Self::SineEaseOut,
        Self::SineEaseInOut,
        Self::CircularEaseIn,
        Self::CircularEaseOut,
        Self::CircularEaseInOut,
        Self::ExponentialEaseIn,
        Self::ExponentialEaseOut,
        Self::ExponentialEaseInOut,
        Self::ElasticEaseIn,
        Self::ElasticEaseOut,
        Self::ElasticEaseInOut,
        Self::BackEaseIn,
        Self::BackEaseOut,
        Self::BackEaseInOut,
        Self::ExtremeBackEaseIn,
        Self::ExtremeBackEaseOut,
        Self::ExtremeBackEaseInOut,
        Self::BounceEaseIn,
        Self::BounceEaseOut,
        Self::BounceEaseInOut,
        Self::Smoothstep,
    ];

    /// 创建衰减振荡曲线
    pub const fn shake(oscillations: u32) -> Self {
        Self::Shake { oscillations }
    }

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度，超出 `[0, 1]` 的输入会被截断
    ///
    /// # 返回
    /// - 缓动后的进度值（回弹类曲线可能越界）
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match *self {
            Self::Linear => t,

            Self::QuadraticEaseIn => t * t,
            Self::QuadraticEaseOut => t * (2.0 - t),
            Self::QuadraticEaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - 2.0 * (t - 1.0).powi(2)
                }
            }

            Self::CubicEaseIn => t.powi(3),
            Self::CubicEaseOut => 1.0 + (t - 1.0).powi(3),
            Self::CubicEaseInOut => {
                if t < 0.5 {
                    4.0 * t.powi(3)
                } else {
                    1.0 + 4.0 * (t - 1.0).powi(3)
                }
            }

            Self::QuarticEaseIn => t.powi(4),
            Self::QuarticEaseOut => 1.0 - (t - 1.0).powi(4),
            Self::QuarticEaseInOut => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - 8.0 * (t - 1.0).powi(4)
                }
            }

            Self::QuinticEaseIn => t.powi(5),
            Self::QuinticEaseOut => 1.0 + (t - 1.0).powi(5),
            Self::QuinticEaseInOut => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 + 16.0 * (t - 1.0).powi(5)
                }
            }

            Self::SineEaseIn => ((t - 1.0) * FRAC_PI_2).sin() + 1.0,
            Self::SineEaseOut => (t * FRAC_PI_2).sin(),
            Self::SineEaseInOut => 0.5 * (1.0 - (t * PI).cos()),

            Self::CircularEaseIn => 1.0 - (1.0 - t * t).sqrt(),
            Self::CircularEaseOut => ((2.0 - t) * t).sqrt(),
            Self::CircularEaseInOut => {
                if t < 0.5 {
                    0.5 * (1.0 - (1.0 - 4.0 * t * t).sqrt())
                } else {
                    0.5 * (-4.0 * t * t + 8.0 * t - 3.0).max(0.0).sqrt() + 0.5
                }
            }

            Self::ExponentialEaseIn => endpoints_or(t, || 2.0_f32.powf(10.0 * (t - 1.0))),
            Self::ExponentialEaseOut => endpoints_or(t, || 1.0 - 2.0_f32.powf(-10.0 * t)),
            Self::ExponentialEaseInOut => endpoints_or(t, || {
                if t < 0.5 {
                    0.5 * 2.0_f32.powf(20.0 * t - 10.0)
                } else {
                    1.0 - 0.5 * 2.0_f32.powf(-20.0 * t + 10.0)
                }
            }),

            Self::ElasticEaseIn => endpoints_or(t, || {
                (ELASTIC_FREQUENCY * t).sin() * 2.0_f32.powf(10.0 * (t - 1.0))
            }),
            Self::ElasticEaseOut => endpoints_or(t, || {
                (-ELASTIC_FREQUENCY * (t + 1.0)).sin() * 2.0_f32.powf(-10.0 * t) + 1.0
            }),
            Self::ElasticEaseInOut => endpoints_or(t, || {
                if t < 0.5 {
                    0.5 * (13.0 * PI * t).sin() * 2.0_f32.powf(20.0 * t - 10.0)
                } else {
                    0.5 * (-13.0 * PI * t).sin() * 2.0_f32.powf(-20.0 * t + 10.0) + 1.0
                }
            }),

            Self::BackEaseIn => back_ease_in(t),
            Self::BackEaseOut => 1.0 - back_ease_in(1.0 - t),
            Self::BackEaseInOut => {
                if t < 0.5 {
                    0.5 * back_ease_in(2.0 * t)
                } else {
                    1.0 - 0.5 * back_ease_in(2.0 * (1.0 - t))
                }
            }

            Self::ExtremeBackEaseIn => extreme_back_ease_in(t),
            Self::ExtremeBackEaseOut => 1.0 - extreme_back_ease_in(1.0 - t),
            Self::ExtremeBackEaseInOut => {
                if t < 0.5 {
                    0.5 * extreme_back_ease_in(2.0 * t)
                } else {
                    1.0 - 0.5 * extreme_back_ease_in(2.0 * (1.0 - t))
                }
            }

            Self::BounceEaseIn => bounce_ease_in(t),
            Self::BounceEaseOut => bounce_ease_out(t),
            Self::BounceEaseInOut => {
                if t < 0.5 {
                    0.5 * bounce_ease_in(t * 2.0)
                } else {
                    0.5 * bounce_ease_out(t * 2.0 - 1.0) + 0.5
                }
            }

            Self::Smoothstep => t * t * (3.0 - 2.0 * t),

            Self::Shake { oscillations } => shake(t, oscillations),
        }
    }

    /// 是否为衰减振荡曲线
    pub fn is_shake(&self) -> bool {
        matches!(self, Self::Shake { .. })
    }
}

/// 端点直接返回，避免 `2^(-x)` 一类表达式在边界上的精度问题
fn endpoints_or(t: f32, curve: impl FnOnce() -> f32) -> f32 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        curve()
    }
}

fn back_ease_in(t: f32) -> f32 {
    ((BACK_OVERSHOOT + 1.0) * t - BACK_OVERSHOOT) * t * t
}

fn extreme_back_ease_in(t: f32) -> f32 {
    (t * t - (t * PI).sin()) * t
}

fn bounce_ease_in(t: f32) -> f32 {
    1.0 - bounce_ease_out(1.0 - t)
}

/// 弹跳缓出（四段二次函数）
fn bounce_ease_out(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

fn shake(t: f32, oscillations: u32) -> f32 {
    let oscillations = oscillations as f32;
    -(2.0_f32.powf(-10.0 * t)) * (t * PI * oscillations * 2.0).sin() + 1.0
}
