//! # Response 模块
//!
//! 碰撞反馈层：把物理接触事件映射为一组视觉效果。
//!
//! ## 组成
//!
//! - [`config`]：效果开关表与配色，启动时构造后只读
//! - [`effects`]：各个效果的构造函数与默认参数
//! - [`policy`]：按接触双方类别选择效果组

pub mod config;
pub mod effects;
pub mod policy;

pub use config::{FeatureFlags, Palette, ResponseConfig};
pub use policy::{Bundle, CollisionResponder};
