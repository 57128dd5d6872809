//! # Stage 模块
//!
//! 每帧驱动器：持有场景、运行中的动作、延迟回调队列、时钟与随机数源。
//!
//! 单线程、单队列：一帧内先执行到期的延迟回调，再按启动顺序推进所有动作。
//! 本帧内新启动的动作从下一帧开始推进。
//!
//! 没有显式的取消接口：移除节点会取消它（以及整棵子树）名下的动作和回调。

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use crate::action::{Action, ActionStatus, Running};
use crate::error::SceneError;
use crate::math::Vec2;
use crate::scene::{NodeId, SceneGraph};
use crate::scheduler::Scheduler;

struct RunningAction {
    owner: NodeId,
    action: Running,
}

/// 舞台
pub struct Stage {
    scene: SceneGraph,
    running: Vec<RunningAction>,
    scheduler: Scheduler,
    /// 累计时间（秒）
    clock: f64,
    rng: StdRng,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("scene", &self.scene)
            .field("running", &self.running.len())
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Stage {
    /// 创建舞台；`seed` 决定颜色故障等随机效果的序列
    pub fn new(scene: SceneGraph, seed: u64) -> Self {
        Self {
            scene,
            running: Vec::new(),
            scheduler: Scheduler::new(),
            clock: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// 累计时间（秒）
    pub fn time(&self) -> f64 {
        self.clock
    }

    // ========== 动作 ==========

    /// 在节点上启动动作（下一帧开始推进）
    pub fn run(&mut self, node: NodeId, action: Action) -> Result<(), SceneError> {
        if !self.scene.contains(node) {
            return Err(SceneError::NodeNotFound(node));
        }
        trace!(node = %node, action = ?action, "启动动作");
        self.running.push(RunningAction {
            owner: node,
            action: action.instantiate(),
        });
        Ok(())
    }

    /// 节点名下是否还有运行中的动作
    pub fn has_actions(&self, node: NodeId) -> bool {
        self.running.iter().any(|r| r.owner == node)
    }

    /// 运行中的动作数量
    pub fn action_count(&self) -> usize {
        self.running.len()
    }

    /// `delay` 秒后执行回调；节点被移除则取消
    pub fn perform_after(
        &mut self,
        node: NodeId,
        delay: f32,
        callback: impl FnOnce(&mut Stage) + 'static,
    ) -> Result<(), SceneError> {
        if !self.scene.contains(node) {
            return Err(SceneError::NodeNotFound(node));
        }
        let fire_at = self.clock + f64::from(delay.max(0.0));
        self.scheduler.schedule(node, fire_at, Box::new(callback));
        Ok(())
    }

    /// 待执行的延迟回调数量
    pub fn pending_callbacks(&self) -> usize {
        self.scheduler.pending()
    }

    // ========== 节点 ==========

    /// 移除节点子树，并取消这些节点名下的动作与延迟回调
    pub fn remove_node(&mut self, node: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let removed = self.scene.remove_from_parent(node)?;
        let owners: HashSet<NodeId> = removed.iter().copied().collect();

        let before = self.running.len();
        self.running.retain(|r| !owners.contains(&r.owner));
        let cancelled_callbacks = self.scheduler.cancel_owned_by(&owners);

        debug!(
            node = %node,
            actions = before - self.running.len(),
            callbacks = cancelled_callbacks,
            "节点移除，取消其动作"
        );
        Ok(removed)
    }

    /// 让节点朝向速度方向（0 弧度朝上），`rate` 为每次调用的跟随比例
    pub fn rotate_to_velocity(
        &mut self,
        node: NodeId,
        velocity: Vec2,
        rate: f32,
    ) -> Result<(), SceneError> {
        self.scene.node_mut(node)?.rotate_to_velocity(velocity, rate);
        Ok(())
    }

    // ========== 帧推进 ==========

    /// 推进一帧
    pub fn update(&mut self, dt: f32) {
        if !(dt >= 0.0 && dt.is_finite()) {
            warn!(dt, "帧间隔无效，跳过本帧");
            return;
        }
        self.clock += f64::from(dt);

        let mut active = std::mem::take(&mut self.running);

        for (owner, callback) in self.scheduler.drain_due(self.clock) {
            if self.scene.contains(owner) {
                callback(self);
            }
        }

        active.retain_mut(|entry| {
            if !self.scene.contains(entry.owner) {
                return false;
            }
            matches!(
                entry.action.tick(self, entry.owner, dt),
                ActionStatus::Running
            )
        });

        // 回调里可能移除了前面已经推进过的节点
        let scene = &self.scene;
        active.retain(|entry| scene.contains(entry.owner));

        let spawned = std::mem::replace(&mut self.running, active);
        self.running.extend(
            spawned
                .into_iter()
                .filter(|entry| self.scene.contains(entry.owner)),
        );
    }

    /// 以固定步长推进 `seconds` 秒
    pub fn advance(&mut self, seconds: f32, step: f32) {
        if step <= 0.0 {
            return;
        }
        let frames = (seconds / step).round() as u32;
        for _ in 0..frames {
            self.update(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::effect::Effect;
    use crate::math::Color;
    use crate::scene::Node;
    use crate::timing::TimingFunction;

    fn stage_with(node: Node) -> (Stage, NodeId) {
        let mut scene = SceneGraph::new();
        let id = scene.add_child(scene.root(), node).unwrap();
        (Stage::new(scene, 7), id)
    }

    // ========== 组合语义 ==========

    #[test]
    fn test_sequence_runs_in_order() {
        let (mut stage, id) = stage_with(Node::new());
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        let (a, b) = (Rc::clone(&log), Rc::clone(&log));
        stage
            .run(
                id,
                Action::sequence(vec![
                    Action::after_delay_run(0.1, move |_| a.borrow_mut().push("a")),
                    Action::after_delay_run(0.1, move |_| b.borrow_mut().push("b")),
                ]),
            )
            .unwrap();

        stage.update(0.15);
        assert_eq!(*log.borrow(), vec!["a"]);
        stage.update(0.1);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert!(!stage.has_actions(id));
    }

    #[test]
    fn test_sequence_carries_leftover_time() {
        // 同一帧里 wait 结束后剩余时间继续推进后面的效果
        let (mut stage, id) = stage_with(Node::new());
        let effect =
            Effect::translate(stage.scene(), id, 1.0, Vec2::ZERO, Vec2::new(10.0, 0.0)).unwrap();
        stage
            .run(id, Action::after_delay(0.5, Action::run_effect(effect)))
            .unwrap();
        stage.update(1.0);
        let pos = stage.scene().get(id).unwrap().position;
        assert!((pos.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_group_finishes_when_last_child_finishes() {
        let (mut stage, id) = stage_with(Node::new());
        stage
            .run(
                id,
                Action::group(vec![Action::wait(0.2), Action::fade_out(0.5)]),
            )
            .unwrap();
        stage.update(0.3);
        assert!(stage.has_actions(id));
        stage.update(0.3);
        assert!(!stage.has_actions(id));
        assert_eq!(stage.scene().get(id).unwrap().alpha, 0.0);
    }

    #[test]
    fn test_repeat_forever_repeats() {
        let (mut stage, id) = stage_with(Node::new());
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        stage
            .run(
                id,
                Action::repeat_forever(Action::after_delay_run(0.25, move |_| {
                    counter.set(counter.get() + 1)
                })),
            )
            .unwrap();

        stage.advance(1.0, 0.125);
        assert_eq!(count.get(), 4);
        assert!(stage.has_actions(id));
    }

    #[test]
    fn test_repeat_forever_zero_duration_child_does_not_hang() {
        let (mut stage, id) = stage_with(Node::new());
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        stage
            .run(
                id,
                Action::repeat_forever(Action::run_callback(move |_| {
                    counter.set(counter.get() + 1)
                })),
            )
            .unwrap();
        stage.update(0.1);
        stage.update(0.1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_repeat_forever_effect_restarts_from_start() {
        let (mut stage, id) = stage_with(Node::new());
        let effect =
            Effect::translate(stage.scene(), id, 0.5, Vec2::ZERO, Vec2::new(4.0, 0.0)).unwrap();
        stage
            .run(id, Action::repeat_forever(Action::run_effect(effect)))
            .unwrap();
        for _ in 0..4 {
            stage.advance(0.5, 0.125);
            let pos = stage.scene().get(id).unwrap().position;
            assert!((pos.x - 4.0).abs() < 1e-4, "pos = {pos:?}");
        }
    }

    #[test]
    fn test_new_actions_start_next_frame_in_insertion_order() {
        let (mut stage, id) = stage_with(Node::new());
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            stage
                .run(id, Action::run_callback(move |_| log.borrow_mut().push(name)))
                .unwrap();
        }
        stage.update(0.016);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    // ========== 动作种类 ==========

    #[test]
    fn test_fade_and_colorize_are_absolute() {
        let (mut stage, id) = stage_with(Node::new().with_alpha(0.0));
        stage.run(id, Action::fade_in(1.0)).unwrap();
        stage
            .run(id, Action::colorize(Color::RED, 1.0, 0.5))
            .unwrap();
        stage.update(0.5);
        let node = stage.scene().get(id).unwrap();
        assert!((node.alpha - 0.5).abs() < 1e-6);
        assert_eq!(node.color_blend_factor, 1.0);
        assert_eq!(node.color, Color::RED);

        stage.run(id, Action::colorize_blend(0.0, 0.1)).unwrap();
        stage.advance(0.6, 0.1);
        let node = stage.scene().get(id).unwrap();
        assert_eq!(node.alpha, 1.0);
        assert_eq!(node.color_blend_factor, 0.0);
        assert_eq!(node.color, Color::RED);
    }

    #[test]
    fn test_jump_returns_to_origin() {
        let origin = Vec2::new(10.0, 10.0);
        let (mut stage, id) = stage_with(Node::new().with_position(origin));
        stage.run(id, Action::jump(20.0, 1.0, origin)).unwrap();
        stage.update(0.5);
        assert!((stage.scene().get(id).unwrap().position.y - 30.0).abs() < 1e-4);
        stage.update(0.5);
        assert_eq!(stage.scene().get(id).unwrap().position, origin);
    }

    #[test]
    fn test_color_glitch_restores_background() {
        let (mut stage, id) = stage_with(Node::new());
        let original = Color::from_rgb8(8, 57, 71);
        stage.scene_mut().set_background(original);
        stage.run(id, Action::color_glitch(original, 0.1)).unwrap();

        stage.update(0.05);
        assert!(stage.has_actions(id));
        stage.update(0.05);
        assert_eq!(stage.scene().background(), original);
        assert!(!stage.has_actions(id));
    }

    #[test]
    fn test_color_glitch_is_reproducible_with_seed() {
        let run = || {
            let (mut stage, id) = stage_with(Node::new());
            stage.run(id, Action::color_glitch(Color::BLACK, 1.0)).unwrap();
            stage.update(0.1);
            stage.scene().background()
        };
        assert_eq!(run(), run());
    }

    // ========== 取消 ==========

    #[test]
    fn test_remove_from_parent_after_delay() {
        let (mut stage, id) = stage_with(Node::new());
        stage
            .run(id, Action::remove_from_parent_after_delay(0.2))
            .unwrap();
        stage.update(0.1);
        assert!(stage.scene().contains(id));
        stage.update(0.1);
        assert!(!stage.scene().contains(id));
        assert_eq!(stage.action_count(), 0);
    }

    #[test]
    fn test_removing_node_cancels_actions_and_callbacks() {
        let (mut stage, id) = stage_with(Node::new());
        let child = stage.scene_mut().add_child(id, Node::new()).unwrap();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);

        stage
            .run(child, Action::repeat_forever(Action::wait(0.1)))
            .unwrap();
        stage
            .perform_after(child, 0.5, move |_| flag.set(true))
            .unwrap();

        let removed = stage.remove_node(id).unwrap();
        assert_eq!(removed, vec![id, child]);
        assert_eq!(stage.action_count(), 0);
        assert_eq!(stage.pending_callbacks(), 0);

        stage.advance(1.0, 0.1);
        assert!(!fired.get());
    }

    #[test]
    fn test_effect_on_removed_target_stops_silently() {
        let (mut stage, owner) = stage_with(Node::new());
        let root = stage.scene().root();
        let target = stage.scene_mut().add_child(root, Node::new()).unwrap();
        let effect = Effect::scale(stage.scene(), target, 1.0, Vec2::splat(2.0), Vec2::ONE)
            .unwrap()
            .with_timing(TimingFunction::ElasticEaseOut);
        stage.run(owner, Action::run_effect(effect)).unwrap();
        stage.update(0.1);
        stage.remove_node(target).unwrap();
        stage.update(0.1);
        assert!(!stage.has_actions(owner));
    }

    #[test]
    fn test_perform_after_fires_once() {
        let (mut stage, id) = stage_with(Node::new());
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        stage
            .perform_after(id, 0.3, move |stage| {
                counter.set(counter.get() + 1);
                stage.scene_mut().get_mut(id).unwrap().alpha = 0.25;
            })
            .unwrap();
        stage.advance(1.0, 0.1);
        assert_eq!(count.get(), 1);
        assert_eq!(stage.scene().get(id).unwrap().alpha, 0.25);
    }

    #[test]
    fn test_run_on_missing_node() {
        let (mut stage, id) = stage_with(Node::new());
        stage.remove_node(id).unwrap();
        assert_eq!(
            stage.run(id, Action::wait(1.0)).unwrap_err(),
            SceneError::NodeNotFound(id)
        );
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let (mut stage, _) = stage_with(Node::new());
        stage.update(f32::NAN);
        stage.update(-1.0);
        assert_eq!(stage.time(), 0.0);
    }
}
