//! # Config 模块
//!
//! 演示宿主的运行配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (juice.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use juice_core::{ConfigError, ResponseConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 演示配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// 场景宽度
    #[serde(default = "default_width")]
    pub width: f32,

    /// 场景高度
    #[serde(default = "default_height")]
    pub height: f32,

    /// 回放帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 随机种子（颜色故障、球的初速度、点击冲量）
    #[serde(default)]
    pub seed: u64,

    /// 回放帧数
    #[serde(default = "default_frames")]
    pub frames: u32,

    /// 碰撞反馈配置
    #[serde(default)]
    pub response: ResponseConfig,
}

// 默认值函数
fn default_width() -> f32 {
    667.0
}

fn default_height() -> f32 {
    375.0
}

fn default_fps() -> u32 {
    60
}

fn default_frames() -> u32 {
    600
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            seed: 0,
            frames: default_frames(),
            response: ResponseConfig::default(),
        }
    }
}

impl DemoConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.width.is_finite())
            || !(self.height > 0.0 && self.height.is_finite())
        {
            return Err(ConfigError::Validation(format!(
                "场景尺寸必须为正: {} x {}",
                self.width, self.height
            )));
        }

        if self.fps == 0 {
            return Err(ConfigError::Validation("帧率必须大于 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DemoConfig::default();
        assert_eq!(config.width, 667.0);
        assert_eq!(config.height, 375.0);
        assert_eq!(config.fps, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DemoConfig = serde_json::from_str(
            r#"{ "fps": 30, "response": { "flags": { "color_glitch": false } } }"#,
        )
        .unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.width, 667.0);
        assert!(!config.response.flags.color_glitch);
        assert!(config.response.flags.flash_ball);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DemoConfig {
            fps: 0,
            ..DemoConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = DemoConfig {
            width: -1.0,
            ..DemoConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DemoConfig {
            height: f32::NAN,
            ..DemoConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
