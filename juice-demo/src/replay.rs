//! # Replay 模块
//!
//! 以固定帧率回放一段事件脚本，替代真实的物理 / 渲染宿主。
//!
//! 每帧顺序：
//!
//! 1. 派发时间已到的脚本事件（接触、点击、改速度）
//! 2. `Stage::update`（延迟回调 → 动作）
//! 3. 按速度积分球的位置（不做碰撞检测）
//! 4. 球朝向速度方向
//!
//! 脚本是 JSON 数组：
//!
//! ```json
//! [
//!   { "at": 3.0, "event": { "contact": { "a": "ball", "b": "barrier", "point": [333, 187] } } },
//!   { "at": 3.5, "event": { "tap": null } },
//!   { "at": 4.0, "event": { "set_velocity": { "node": "ball", "velocity": [0, 200] } } }
//! ]
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use juice_core::{Color, Contact, NodeId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scene_setup::DemoScene;

/// 脚本事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// 两个节点（按名称查找）开始接触，`point` 为场景坐标
    Contact { a: String, b: String, point: Vec2 },
    /// 点击屏幕
    Tap,
    /// 直接设置节点物理体的速度
    SetVelocity { node: String, velocity: Vec2 },
}

/// 带时间戳的脚本事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    /// 触发时间（秒）
    pub at: f32,
    pub event: Event,
}

/// 从 JSON 文件读取脚本，按时间排序
pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<ScriptEvent>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取脚本文件: {}", path.display()))?;
    let mut events: Vec<ScriptEvent> = serde_json::from_str(&content)
        .with_context(|| format!("脚本解析失败: {}", path.display()))?;
    events.sort_by(|a, b| a.at.total_cmp(&b.at));
    info!(path = %path.display(), events = events.len(), "脚本加载成功");
    Ok(events)
}

/// 单个命名节点的快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub id: u64,
    pub name: String,
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub alpha: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

/// 场景快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub time: f64,
    pub background: Color,
    pub nodes: Vec<NodeSnapshot>,
}

/// 回放器
pub struct Replay {
    demo: DemoScene,
    pending: VecDeque<ScriptEvent>,
    frame_time: f32,
    frames: u64,
}

impl Replay {
    pub fn new(demo: DemoScene, mut events: Vec<ScriptEvent>, fps: u32) -> Self {
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            demo,
            pending: events.into(),
            frame_time: 1.0 / fps.max(1) as f32,
            frames: 0,
        }
    }

    pub fn demo(&self) -> &DemoScene {
        &self.demo
    }

    /// 尚未派发的事件数
    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    /// 推进 `frames` 帧
    pub fn run(&mut self, frames: u32) {
        for _ in 0..frames {
            self.step();
        }
        info!(
            frames = self.frames,
            time = self.demo.stage.time(),
            pending = self.pending.len(),
            "回放结束"
        );
    }

    /// 推进一帧
    pub fn step(&mut self) {
        let now = self.demo.stage.time();
        while self
            .pending
            .front()
            .is_some_and(|e| f64::from(e.at) <= now)
        {
            if let Some(event) = self.pending.pop_front() {
                self.dispatch(&event);
            }
        }

        let dt = self.frame_time;
        self.demo.stage.update(dt);
        self.integrate(dt);
        self.demo.orient_balls();
        self.frames += 1;
    }

    fn dispatch(&mut self, event: &ScriptEvent) {
        debug!(at = event.at, event = ?event.event, "派发脚本事件");
        match &event.event {
            Event::Contact { a, b, point } => {
                let (Some(node_a), Some(node_b)) = (self.find(a), self.find(b)) else {
                    warn!(a = %a, b = %b, "接触事件引用了不存在的节点，已忽略");
                    return;
                };
                match Contact::between(self.demo.stage.scene(), node_a, node_b, *point) {
                    Ok(contact) => {
                        self.demo
                            .responder
                            .on_contact(&mut self.demo.stage, &contact);
                    }
                    Err(e) => warn!(error = %e, "无法构造接触事件"),
                }
            }
            Event::Tap => self.demo.tap(),
            Event::SetVelocity { node, velocity } => {
                let body = self
                    .find(node)
                    .and_then(|id| self.demo.stage.scene_mut().get_mut(id))
                    .and_then(|n| n.body.as_mut());
                match body {
                    Some(body) => body.velocity = *velocity,
                    None => warn!(node = %node, "节点不存在或没有物理体，已忽略"),
                }
            }
        }
    }

    /// 按名称查找（深度优先，第一个匹配）
    fn find(&self, name: &str) -> Option<NodeId> {
        let scene = self.demo.stage.scene();
        scene.find_by_name(scene.root(), name)
    }

    /// 动态物理体按速度移动
    fn integrate(&mut self, dt: f32) {
        for ball in self.demo.balls() {
            if let Some(node) = self.demo.stage.scene_mut().get_mut(ball) {
                if let Some(velocity) = node.body.as_ref().filter(|b| b.dynamic).map(|b| b.velocity) {
                    node.position += velocity * dt;
                }
            }
        }
    }

    /// 当前场景中所有命名节点的快照（先序）
    pub fn snapshot(&self) -> SceneSnapshot {
        let scene = self.demo.stage.scene();
        let nodes = scene
            .subtree(scene.root())
            .into_iter()
            .filter_map(|id| {
                let node = scene.get(id)?;
                let name = node.name.clone()?;
                Some(NodeSnapshot {
                    id: id.value(),
                    name,
                    position: node.position,
                    scale: node.scale,
                    rotation: node.rotation,
                    alpha: node.alpha,
                    fill: node.fill_color,
                })
            })
            .collect();

        SceneSnapshot {
            time: self.demo.stage.time(),
            background: scene.background(),
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_formats() {
        let events: Vec<ScriptEvent> = serde_json::from_str(
            r#"[
                { "at": 1.0, "event": { "contact": { "a": "ball", "b": "barrier", "point": [1, 2] } } },
                { "at": 2.0, "event": { "tap": null } },
                { "at": 3.0, "event": "tap" },
                { "at": 4.0, "event": { "set_velocity": { "node": "ball", "velocity": [0, 5] } } }
            ]"#,
        )
        .unwrap();

        assert_eq!(
            events[0].event,
            Event::Contact {
                a: "ball".to_string(),
                b: "barrier".to_string(),
                point: Vec2::new(1.0, 2.0),
            }
        );
        assert_eq!(events[1].event, Event::Tap);
        assert_eq!(events[2].event, Event::Tap);
        assert_eq!(
            events[3].event,
            Event::SetVelocity {
                node: "ball".to_string(),
                velocity: Vec2::new(0.0, 5.0),
            }
        );
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result: Result<Vec<ScriptEvent>, _> =
            serde_json::from_str(r#"[{ "at": 1.0, "event": { "explode": {} } }]"#);
        assert!(result.is_err());
    }
}
