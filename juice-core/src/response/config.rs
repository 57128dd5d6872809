//! # Config 模块
//!
//! 碰撞反馈的静态配置：效果开关表与配色。
//!
//! 启动时构造一次，作为 [`CollisionResponder`](super::CollisionResponder)
//! 的构造参数传入，运行期只读。缺省字段按默认值补齐。

use serde::{Deserialize, Serialize};

use crate::debug_draw::DebugDraw;
use crate::math::Color;

/// 效果开关表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// 球体闪红
    #[serde(default = "enabled")]
    pub flash_ball: bool,
    /// 边框闪白
    #[serde(default = "enabled")]
    pub flash_border: bool,
    /// 障碍闪白
    #[serde(default = "enabled")]
    pub flash_barrier: bool,
    /// 球体放大脉冲
    #[serde(default = "enabled")]
    pub scale_ball: bool,
    /// 边框横向拉伸
    #[serde(default)]
    pub scale_border: bool,
    /// 障碍缩小回弹
    #[serde(default = "enabled")]
    pub scale_barrier: bool,
    /// 球体压扁
    #[serde(default = "enabled")]
    pub squash_ball: bool,
    /// 点击时球体拉长
    #[serde(default = "enabled")]
    pub stretch_ball: bool,
    #[serde(default = "enabled")]
    pub screen_shake: bool,
    #[serde(default = "enabled")]
    pub screen_zoom: bool,
    #[serde(default = "enabled")]
    pub screen_tumble: bool,
    /// 背景随机色闪烁
    #[serde(default = "enabled")]
    pub color_glitch: bool,
    /// 撞边框时障碍果冻抖动
    #[serde(default = "enabled")]
    pub barrier_jelly: bool,
    /// 调试图形
    #[serde(default)]
    pub debug_draw: bool,
}

fn enabled() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            flash_ball: true,
            flash_border: true,
            flash_barrier: true,
            scale_ball: true,
            scale_border: false,
            scale_barrier: true,
            squash_ball: true,
            stretch_ball: true,
            screen_shake: true,
            screen_zoom: true,
            screen_tumble: true,
            color_glitch: true,
            barrier_jelly: true,
            debug_draw: false,
        }
    }
}

impl FeatureFlags {
    /// 全部关闭：碰撞不产生任何修改
    pub fn all_disabled() -> Self {
        Self {
            flash_ball: false,
            flash_border: false,
            flash_barrier: false,
            scale_ball: false,
            scale_border: false,
            scale_barrier: false,
            squash_ball: false,
            stretch_ball: false,
            screen_shake: false,
            screen_zoom: false,
            screen_tumble: false,
            color_glitch: false,
            barrier_jelly: false,
            debug_draw: false,
        }
    }

    /// 按 `debug_draw` 开关构造调试图形绘制器
    pub fn debug_drawer(&self) -> DebugDraw {
        DebugDraw::new(self.debug_draw)
    }
}

/// 配色
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    #[serde(default = "default_background")]
    pub background: Color,
    #[serde(default = "default_border")]
    pub border: Color,
    #[serde(default = "default_flash")]
    pub border_flash: Color,
    #[serde(default = "default_barrier")]
    pub barrier: Color,
    #[serde(default = "default_flash")]
    pub barrier_flash: Color,
    #[serde(default = "default_ball_flash")]
    pub ball_flash: Color,
}

// 默认值函数
fn default_background() -> Color {
    Color::from_rgb8(8, 57, 71)
}

fn default_border() -> Color {
    Color::from_rgb8(160, 160, 160)
}

fn default_barrier() -> Color {
    Color::from_rgb8(212, 212, 212)
}

fn default_flash() -> Color {
    Color::WHITE
}

fn default_ball_flash() -> Color {
    Color::RED
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: default_background(),
            border: default_border(),
            border_flash: default_flash(),
            barrier: default_barrier(),
            barrier_flash: default_flash(),
            ball_flash: default_ball_flash(),
        }
    }
}

/// 碰撞反馈配置
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseConfig {
    #[serde(default)]
    pub flags: FeatureFlags,
    #[serde(default)]
    pub palette: Palette,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        insta::assert_yaml_snapshot!("default_flags", FeatureFlags::default());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let flags: FeatureFlags =
            serde_json::from_str(r#"{ "scale_border": true, "screen_shake": false }"#).unwrap();
        assert!(flags.scale_border);
        assert!(!flags.screen_shake);
        assert!(flags.flash_ball);
        assert!(!flags.debug_draw);
    }

    #[test]
    fn test_all_disabled() {
        let flags = FeatureFlags::all_disabled();
        let json = serde_json::to_value(flags).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 14);
        assert!(object.values().all(|v| v == &serde_json::Value::Bool(false)));
    }

    #[test]
    fn test_palette_defaults() {
        let palette = Palette::default();
        assert_eq!(palette.background, Color::from_rgb8(8, 57, 71));
        assert_eq!(palette.barrier_flash, Color::WHITE);
        assert_eq!(palette.ball_flash, Color::RED);

        let config: ResponseConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ResponseConfig::default());
    }
}
