//! # Error 模块
//!
//! 定义 juice-core 中使用的错误类型。
//!
//! 运行期的视觉效果是"尽力而为"的：构造阶段的错误通过 `Result` 返回，
//! 碰撞反馈层遇到错误只记日志、不中断同一组里的其他效果。

use thiserror::Error;

use crate::scene::NodeId;

/// 效果构造 / 推进错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    /// 时长必须为正
    #[error("效果时长无效：{0}（必须大于 0）")]
    InvalidDuration(f32),

    /// 目标节点已从场景中移除
    #[error("效果目标 {0} 已不在场景中")]
    DanglingTarget(NodeId),
}

/// 场景图错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// 节点不存在（或已被移除）
    #[error("节点 {0} 不存在")]
    NodeNotFound(NodeId),

    /// 挂载后会形成环
    #[error("无法把 {child} 挂到 {parent} 下：会形成环")]
    CycleDetected { parent: NodeId, child: NodeId },

    /// 根节点不能被移除
    #[error("根节点不能被移除")]
    RootRemoval,
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读写失败
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析 / 序列化失败
    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    /// 校验失败
    #[error("配置验证失败: {0}")]
    Validation(String),
}

/// juice-core 统一错误类型
#[derive(Error, Debug)]
pub enum JuiceError {
    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// juice-core 统一 Result 类型
pub type JuiceResult<T> = Result<T, JuiceError>;
