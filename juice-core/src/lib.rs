//! # Juice Core
//!
//! 2D 场景的"手感"层：缓动曲线、叠加式属性动画、动作组合与碰撞反馈策略。
//!
//! ## 架构概述
//!
//! `juice-core` 是纯逻辑库，不做 IO、不渲染、不模拟物理。
//! 宿主负责物理与绘制，每帧把时间和接触事件交给它：
//!
//! ```text
//! Host                               juice-core
//!   │                                     │
//!   │──── Contact / tap ────────────────►│ CollisionResponder
//!   │                                     │   └─ effects → Stage::run
//!   │──── Stage::update(dt) ────────────►│ Scheduler → Action → Effect
//!   │                                     │              └─ TimingFunction
//!   │◄─── SceneGraph（位置/缩放/颜色）────│
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! let mut stage = Stage::new(scene, seed);
//! let responder = CollisionResponder::new(ResponseConfig::default(), pivot, world);
//!
//! loop {
//!     for contact in host.contacts() {
//!         responder.on_contact(&mut stage, &contact);
//!     }
//!     stage.update(dt);
//!     host.draw(stage.scene());
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`timing`]：缓动函数库
//! - [`effect`]：叠加式属性插值器
//! - [`action`]：动作组合（顺序 / 并行 / 重复 / 回调）
//! - [`scheduler`]：延迟回调队列
//! - [`stage`]：每帧驱动器
//! - [`response`]：碰撞反馈策略、效果开关与配色
//! - [`scene`]：场景图替身
//! - [`physics`]：物理体元数据与接触事件
//! - [`debug_draw`]：调试图形
//! - [`math`]：向量、颜色与角度工具
//! - [`error`]：错误类型定义

pub mod action;
pub mod debug_draw;
pub mod effect;
pub mod error;
pub mod math;
pub mod physics;
pub mod response;
pub mod scene;
pub mod scheduler;
pub mod stage;
pub mod timing;

// 重导出核心类型
pub use action::{Action, ActionStatus};
pub use debug_draw::{DebugDraw, DebugPath, DebugShape};
pub use effect::{Effect, EffectKind, SCALE_EPSILON};
pub use error::{ConfigError, EffectError, JuiceError, JuiceResult, SceneError};
pub use math::{Color, Vec2};
pub use physics::{BodyShape, Category, Contact, PhysicsBody};
pub use response::{Bundle, CollisionResponder, FeatureFlags, Palette, ResponseConfig};
pub use scene::{Node, NodeId, SceneGraph};
pub use stage::Stage;
pub use timing::TimingFunction;
