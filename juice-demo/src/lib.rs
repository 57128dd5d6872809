//! # Juice Demo
//!
//! `juice-core` 的无头宿主：搭建演示场景（边框、障碍、两个球、提示文字），
//! 以固定帧率回放接触 / 点击脚本，输出场景快照。
//!
//! 真实宿主负责的物理模拟在这里只做最简单的速度积分，
//! 接触事件完全来自脚本。
//!
//! ## 模块结构
//!
//! - [`config`]：演示配置（文件 + 默认值）
//! - [`scene_setup`]：演示场景与入场动画
//! - [`replay`]：脚本回放与快照

pub mod config;
pub mod replay;
pub mod scene_setup;

pub use config::DemoConfig;
pub use replay::{Event, Replay, SceneSnapshot, ScriptEvent, load_script};
pub use scene_setup::DemoScene;
