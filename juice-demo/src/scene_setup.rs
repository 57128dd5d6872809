//! # Scene Setup 模块
//!
//! 搭建演示场景：四条边框、中央障碍、两个球与提示文字。
//!
//! ```text
//! scene (root)
//!   ├─ world_pivot        屏幕中心，缩放 / 翻滚
//!        └─ world_layer   震动；坐标与场景一致
//!             ├─ 边框枢轴 ×4 ─ vertical_border / horizontal_border
//!             ├─ barrier ─ 形状        （1.5 秒后出现）
//!             └─ ball ─ sprite ×2     （2.5 秒后出现）
//!   └─ hint               （6 秒后出现，不随世界层运动）
//! ```
//!
//! 入场动画都通过 [`Stage::perform_after`] 延迟挂载，挂在世界层名下。

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use juice_core::{
    Action, Category, CollisionResponder, Color, DebugDraw, Effect, JuiceResult, Node, NodeId,
    PhysicsBody, ResponseConfig, SceneGraph, Stage, TimingFunction, Vec2,
};
use rand::RngExt;
use tracing::{debug, info, warn};

use crate::config::DemoConfig;

/// 场景布局参数
pub mod layout {
    pub const BORDER_THICKNESS: f32 = 20.0;
    /// 边框入场前位于屏幕外的距离
    pub const BORDER_OFFSCREEN: f32 = 50.0;
    pub const BORDER_ENTER_DURATION: f32 = 0.5;
    pub const SIDE_BORDER_DELAY: f32 = 0.5;
    pub const CAP_BORDER_DELAY: f32 = 1.0;

    pub const BARRIER_DELAY: f32 = 1.5;
    pub const BARRIER_WIDTH: f32 = 40.0;
    pub const BARRIER_LENGTH: f32 = 140.0;
    pub const BARRIER_START_SCALE: f32 = 0.15;
    pub const BARRIER_ENTER_DURATION: f32 = 1.0;
    /// 障碍开始周期旋转的时间
    pub const BARRIER_SPIN_DELAY: f32 = 4.0;
    pub const BARRIER_SPIN_PAUSE: f32 = 0.75;
    pub const BARRIER_SPIN_DURATION: f32 = 0.25;

    pub const BALL_DELAY: f32 = 2.5;
    pub const BALL_RADIUS: f32 = 13.5;
    pub const BALL_SPEED: f32 = 200.0;
    /// 球距左右边缘的距离
    pub const BALL_INSET: f32 = 100.0;
    pub const BALL_START_SCALE: f32 = 0.2;
    pub const BALL_ENTER_DURATION: f32 = 0.5;

    pub const HINT_DELAY: f32 = 6.0;
    pub const HINT_TEXT: &str = "Tap to nudge the balls";
    /// 提示相对场景中心的纵向偏移
    pub const HINT_OFFSET: f32 = 100.0;
    pub const HINT_RISE: f32 = 20.0;
    pub const HINT_RISE_DURATION: f32 = 4.0;

    /// 点击冲量的分量范围
    pub const TAP_IMPULSE: f32 = 50.0;
    /// 球朝向速度方向的跟随比例
    pub const HEADING_RATE: f32 = 0.1;
}

/// 调试图形颜色
const DEBUG_COLOR: Color = Color::YELLOW;

/// 演示场景
#[derive(Debug)]
pub struct DemoScene {
    pub stage: Stage,
    pub responder: CollisionResponder,
}

impl DemoScene {
    /// 搭建场景并安排所有入场动画
    pub fn build(config: &DemoConfig) -> JuiceResult<Self> {
        let response = config.response;
        let (width, height) = (config.width, config.height);

        let mut scene = SceneGraph::new();
        scene.set_background(response.palette.background);
        let root = scene.root();
        let world_pivot = scene.add_child(
            root,
            Node::named("world_pivot").with_position(Vec2::new(width / 2.0, height / 2.0)),
        )?;
        let world_layer = scene.add_child(
            world_pivot,
            Node::named("world_layer").with_position(Vec2::new(-width / 2.0, -height / 2.0)),
        )?;

        let mut stage = Stage::new(scene, config.seed);
        add_borders(&mut stage, world_layer, width, height, &response)?;

        stage.perform_after(world_layer, layout::BARRIER_DELAY, move |stage| {
            report("barrier", add_barrier(stage, world_layer, width, height, &response));
        })?;
        stage.perform_after(world_layer, layout::BALL_DELAY, move |stage| {
            report("balls", add_balls(stage, world_layer, width, height, &response));
        })?;
        stage.perform_after(world_layer, layout::BARRIER_SPIN_DELAY, move |stage| {
            report("barrier_spin", spin_barrier(stage, world_layer));
        })?;
        stage.perform_after(world_layer, layout::HINT_DELAY, move |stage| {
            report("hint", add_hint(stage, width, height));
        })?;

        info!(width, height, seed = config.seed, "演示场景搭建完成");

        Ok(Self {
            stage,
            responder: CollisionResponder::new(response, world_pivot, world_layer),
        })
    }

    pub fn world_layer(&self) -> NodeId {
        self.responder.world_layer()
    }

    /// 当前场景中的所有球
    pub fn balls(&self) -> Vec<NodeId> {
        self.stage
            .scene()
            .enumerate_by_name(self.world_layer(), "ball")
    }

    /// 点击：给每个球一个随机冲量并触发拉长效果
    pub fn tap(&mut self) {
        for ball in self.balls() {
            let impulse = {
                let rng = self.stage.rng_mut();
                Vec2::new(
                    rng.random_range(-layout::TAP_IMPULSE..=layout::TAP_IMPULSE),
                    rng.random_range(-layout::TAP_IMPULSE..=layout::TAP_IMPULSE),
                )
            };
            if let Some(body) = self
                .stage
                .scene_mut()
                .get_mut(ball)
                .and_then(|n| n.body.as_mut())
            {
                body.velocity += impulse;
            }
            self.responder.on_tap(&mut self.stage, ball);
        }
        debug!(impulse_range = layout::TAP_IMPULSE, "点击");
    }

    /// 物理推进之后：球朝向速度方向
    pub fn orient_balls(&mut self) {
        for ball in self.balls() {
            let velocity = self
                .stage
                .scene()
                .get(ball)
                .and_then(|n| n.body.as_ref())
                .map(|b| b.velocity);
            if let Some(velocity) = velocity {
                report(
                    "orient_ball",
                    self.stage
                        .rotate_to_velocity(ball, velocity, layout::HEADING_RATE)
                        .map_err(Into::into),
                );
            }
        }
    }
}

// ========== 边框 ==========

struct BorderSpec {
    name: &'static str,
    length: f32,
    position: Vec2,
    rotation: f32,
    /// 指向屏幕外的方向
    outward: Vec2,
    delay: f32,
}

fn add_borders(
    stage: &mut Stage,
    world_layer: NodeId,
    width: f32,
    height: f32,
    response: &ResponseConfig,
) -> JuiceResult<()> {
    let half = layout::BORDER_THICKNESS / 2.0;
    let specs = [
        BorderSpec {
            name: "vertical_border",
            length: height,
            position: Vec2::new(half, height / 2.0),
            rotation: 0.0,
            outward: Vec2::new(-1.0, 0.0),
            delay: layout::SIDE_BORDER_DELAY,
        },
        BorderSpec {
            name: "vertical_border",
            length: height,
            position: Vec2::new(width - half, height / 2.0),
            rotation: PI,
            outward: Vec2::new(1.0, 0.0),
            delay: layout::SIDE_BORDER_DELAY,
        },
        BorderSpec {
            name: "horizontal_border",
            length: width,
            position: Vec2::new(width / 2.0, height - half),
            rotation: -FRAC_PI_2,
            outward: Vec2::new(0.0, 1.0),
            delay: layout::CAP_BORDER_DELAY,
        },
        BorderSpec {
            name: "horizontal_border",
            length: width,
            position: Vec2::new(width / 2.0, half),
            rotation: FRAC_PI_2,
            outward: Vec2::new(0.0, -1.0),
            delay: layout::CAP_BORDER_DELAY,
        },
    ];

    for spec in &specs {
        add_border(stage, world_layer, spec, response)?;
    }
    Ok(())
}

/// 边框 = 枢轴 + 形状；形状以左下角为原点沿局部 Y 延伸，居中于枢轴
fn add_border(
    stage: &mut Stage,
    world_layer: NodeId,
    spec: &BorderSpec,
    response: &ResponseConfig,
) -> JuiceResult<()> {
    let thickness = layout::BORDER_THICKNESS;
    let start = spec.position + spec.outward * layout::BORDER_OFFSCREEN;

    let scene = stage.scene_mut();
    let pivot = scene.add_child(
        world_layer,
        Node::new().with_position(start).with_rotation(spec.rotation),
    )?;
    scene.add_child(
        pivot,
        Node::named(spec.name)
            .with_position(Vec2::new(-thickness / 2.0, -spec.length / 2.0))
            .with_fill(response.palette.border)
            .with_body(
                PhysicsBody::rect(Vec2::ZERO, Vec2::new(thickness, spec.length))
                    .with_category(Category::BORDER)
                    .with_collision_mask(Category::BALL)
                    .with_contact_test_mask(Category::BALL)
                    .fixed(),
            ),
    )?;
    response.flags.debug_drawer().attach_debug_rect(
        scene,
        pivot,
        Vec2::new(thickness, spec.length),
        DEBUG_COLOR,
    )?;

    let enter = Effect::translate(
        stage.scene(),
        pivot,
        layout::BORDER_ENTER_DURATION,
        start,
        spec.position,
    )?
    .with_timing(TimingFunction::BounceEaseOut);
    stage.run(pivot, Action::after_delay(spec.delay, Action::run_effect(enter)))?;
    Ok(())
}

// ========== 障碍 ==========

fn add_barrier(
    stage: &mut Stage,
    world_layer: NodeId,
    width: f32,
    height: f32,
    response: &ResponseConfig,
) -> JuiceResult<()> {
    let size = Vec2::new(layout::BARRIER_WIDTH, layout::BARRIER_LENGTH);
    let origin = -size / 2.0;
    let start_scale = Vec2::splat(layout::BARRIER_START_SCALE);

    let scene = stage.scene_mut();
    let barrier = scene.add_child(
        world_layer,
        Node::named("barrier")
            .with_position(Vec2::new(width / 2.0, height / 2.0))
            .with_rotation(FRAC_PI_2)
            .with_scale(start_scale)
            .with_alpha(0.0)
            .with_body(
                PhysicsBody::rect(origin, size)
                    .with_category(Category::BARRIER)
                    .with_collision_mask(Category::BALL)
                    .with_contact_test_mask(Category::BALL)
                    .fixed(),
            ),
    )?;
    scene.add_child(
        barrier,
        Node::new()
            .with_position(origin)
            .with_fill(response.palette.barrier),
    )?;
    response
        .flags
        .debug_drawer()
        .attach_debug_rect(scene, barrier, size, DEBUG_COLOR)?;

    let spin_from = stage.rng_mut().random_range(0.0..FRAC_PI_4);
    let duration = layout::BARRIER_ENTER_DURATION;
    let grow = Effect::scale(stage.scene(), barrier, duration, start_scale, Vec2::ONE)?
        .with_timing(TimingFunction::BackEaseOut);
    let turn = Effect::rotate(stage.scene(), barrier, duration, spin_from, FRAC_PI_2)?
        .with_timing(TimingFunction::BackEaseOut);
    stage.run(
        barrier,
        Action::group(vec![
            Action::fade_in(duration),
            Action::run_effect(grow),
            Action::run_effect(turn),
        ]),
    )?;

    debug!(node = %barrier, spin_from, "障碍入场");
    Ok(())
}

/// 每隔一段时间把障碍再转 45°
fn spin_barrier(stage: &mut Stage, world_layer: NodeId) -> JuiceResult<()> {
    let Some(barrier) = stage.scene().child_by_name(world_layer, "barrier") else {
        warn!("障碍不存在，跳过周期旋转");
        return Ok(());
    };

    let spin = Action::run_callback(move |stage| {
        report("barrier_spin", spin_once(stage, barrier));
    });
    stage.run(
        barrier,
        Action::repeat_forever(Action::sequence(vec![
            Action::wait(layout::BARRIER_SPIN_PAUSE),
            spin,
        ])),
    )?;
    Ok(())
}

fn spin_once(stage: &mut Stage, barrier: NodeId) -> JuiceResult<()> {
    let current = stage.scene().node(barrier)?.rotation;
    let effect = Effect::rotate(
        stage.scene(),
        barrier,
        layout::BARRIER_SPIN_DURATION,
        current,
        current + FRAC_PI_4,
    )?
    .with_timing(TimingFunction::BackEaseInOut);
    stage.run(barrier, Action::run_effect(effect))?;
    Ok(())
}

// ========== 球 ==========

fn add_balls(
    stage: &mut Stage,
    world_layer: NodeId,
    width: f32,
    height: f32,
    response: &ResponseConfig,
) -> JuiceResult<()> {
    let positions = [
        Vec2::new(layout::BALL_INSET, height / 2.0),
        Vec2::new(width - layout::BALL_INSET, height / 2.0),
    ];
    for position in positions {
        add_ball(stage, world_layer, position, response)?;
    }
    Ok(())
}

fn add_ball(
    stage: &mut Stage,
    world_layer: NodeId,
    position: Vec2,
    response: &ResponseConfig,
) -> JuiceResult<NodeId> {
    let heading = stage.rng_mut().random_range(0.0..TAU);
    let velocity = Vec2::for_angle(heading) * layout::BALL_SPEED;
    let start_scale = Vec2::splat(layout::BALL_START_SCALE);

    let scene = stage.scene_mut();
    let ball = scene.add_child(
        world_layer,
        Node::named("ball")
            .with_position(position)
            .with_scale(start_scale)
            .with_body(
                PhysicsBody::circle(layout::BALL_RADIUS)
                    .with_category(Category::BALL)
                    .with_collision_mask(Category::all())
                    .with_contact_test_mask(Category::all())
                    .with_velocity(velocity),
            ),
    )?;
    scene.add_child(ball, Node::named("sprite"))?;

    let drawer: DebugDraw = response.flags.debug_drawer();
    drawer.attach_debug_circle(scene, ball, layout::BALL_RADIUS, DEBUG_COLOR)?;
    drawer.attach_debug_line(
        scene,
        ball,
        Vec2::ZERO,
        Vec2::new(0.0, layout::BALL_RADIUS),
        DEBUG_COLOR,
    )?;

    let grow = Effect::scale(
        stage.scene(),
        ball,
        layout::BALL_ENTER_DURATION,
        start_scale,
        Vec2::ONE,
    )?
    .with_timing(TimingFunction::BackEaseOut);
    stage.run(ball, Action::run_effect(grow))?;

    debug!(node = %ball, velocity = ?velocity, "球入场");
    Ok(ball)
}

// ========== 提示文字 ==========

/// 提示文字挂在场景根上，不随世界层震动、缩放与翻滚
fn add_hint(stage: &mut Stage, width: f32, height: f32) -> JuiceResult<()> {
    let position = Vec2::new(width / 2.0, height / 2.0 + layout::HINT_OFFSET);
    let root = stage.scene().root();
    let hint = stage.scene_mut().add_child(
        root,
        Node::named("hint")
            .with_position(position)
            .with_alpha(0.0)
            .with_text(layout::HINT_TEXT),
    )?;

    let rise = Effect::translate(
        stage.scene(),
        hint,
        layout::HINT_RISE_DURATION,
        position,
        position + Vec2::new(0.0, layout::HINT_RISE),
    )?
    .with_timing(TimingFunction::Smoothstep);
    stage.run(
        hint,
        Action::group(vec![
            Action::run_effect(rise),
            Action::sequence(vec![
                Action::wait(0.5),
                Action::fade_in(2.0),
                Action::wait(1.0),
                Action::fade_out(1.0),
            ]),
        ]),
    )?;
    Ok(())
}

/// 延迟挂载失败只记日志
fn report(step: &'static str, result: JuiceResult<()>) {
    if let Err(e) = result {
        warn!(step, error = %e, "演示场景步骤失败");
    }
}
