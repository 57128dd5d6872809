//! juice-demo 命令行入口
//!
//! ```bash
//! cargo run -p juice-demo
//! cargo run -p juice-demo -- --config juice.json --script hits.json --frames 480 -vv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use juice_demo::{DemoConfig, DemoScene, Replay, load_script};

#[derive(Parser)]
#[command(name = "juice-demo")]
#[command(about = "回放碰撞脚本并输出场景快照")]
#[command(version)]
struct Cli {
    /// 配置文件（默认：juice.json）
    #[arg(short, long, default_value = "juice.json")]
    config: PathBuf,

    /// 事件脚本（JSON 数组）
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// 回放帧数（覆盖配置文件）
    #[arg(short, long)]
    frames: Option<u32>,

    /// 帧率（覆盖配置文件）
    #[arg(long)]
    fps: Option<u32>,

    /// 随机种子（覆盖配置文件）
    #[arg(long)]
    seed: Option<u64>,

    /// 日志详细程度（-v info，-vv debug，-vvv trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = DemoConfig::load(&cli.config);
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    config.validate().context("配置无效")?;

    let events = match &cli.script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };

    let demo = DemoScene::build(&config).context("演示场景搭建失败")?;
    let mut replay = Replay::new(demo, events, config.fps);
    replay.run(config.frames);

    let snapshot = serde_json::to_string_pretty(&replay.snapshot()).context("快照序列化失败")?;
    println!("{snapshot}");
    Ok(())
}
