// 录制回放工具入口
// 把 JSON 录制逐帧送入 InputManager，打印每帧产生的命令

use anyhow::{bail, Context};
use clap::Parser;
use kinetic_input::core::time::format_duration;
use kinetic_input::replay::{demo_recording, replay, Recording, ReplayOptions};
use kinetic_input::{ConfigManager, InputConfig, InputManager};
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "kinetic-replay", version, about = "Replay recorded input through the gesture and command pipeline")]
struct Cli {
    /// JSON recording to replay
    recording: Option<PathBuf>,

    /// TOML input configuration; created with defaults when missing
    #[arg(long)]
    config: Option<PathBuf>,

    /// Allow the Exit command
    #[arg(long)]
    allow_reset: bool,

    /// Allow the Place command
    #[arg(long)]
    allow_edit: bool,

    /// Print replay steps as JSON
    #[arg(long)]
    json: bool,

    /// Replay the built-in synthetic session instead of a file
    #[arg(long, conflicts_with = "recording")]
    demo: bool,

    /// Write the replayed recording to this path
    #[arg(long)]
    save_recording: Option<PathBuf>,
}

fn main() {
    if let Err(e) = kinetic_input::init() {
        eprintln!("初始化失败: {}", e);
        std::process::exit(1);
    }

    let result = run(Cli::parse());
    kinetic_input::cleanup();

    if let Err(e) = result {
        error!("回放失败: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigManager::new(path)
            .with_context(|| format!("无法加载配置 {}", path.display()))?
            .config()
            .clone(),
        None => InputConfig::default(),
    };

    let recording = match (&cli.recording, cli.demo) {
        (_, true) => demo_recording(),
        (Some(path), false) => Recording::load(path)
            .with_context(|| format!("无法读取录制 {}", path.display()))?,
        (None, false) => bail!("需要指定录制文件或 --demo"),
    };

    if let Some(path) = &cli.save_recording {
        recording
            .save(path)
            .with_context(|| format!("无法保存录制 {}", path.display()))?;
    }

    let mut manager = InputManager::new(config)?;
    let options = ReplayOptions {
        allow_reset: cli.allow_reset,
        allow_edit: cli.allow_edit,
    };
    let steps = replay(&mut manager, &recording, options)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
    } else {
        for step in &steps {
            let commands: Vec<String> = step.commands.iter().map(|c| format!("{:?}", c)).collect();
            match step.pointer {
                Some([x, y]) => println!(
                    "{}  {}  @({:.3}, {:.3})",
                    format_duration(Duration::from_millis(step.t_ms)),
                    commands.join(" "),
                    x,
                    y
                ),
                None => println!(
                    "{}  {}",
                    format_duration(Duration::from_millis(step.t_ms)),
                    commands.join(" ")
                ),
            }
        }
    }

    let stats = manager.gestures().stats();
    info!(
        "回放时长 {}: 确认 {} 冷却丢弃 {} 跳跃 {} 奔跑 {} 未融合抬脚 {}",
        format_duration(recording.duration()),
        stats.confirmed,
        stats.suppressed,
        stats.jumps,
        stats.runs,
        stats.unfused_lifts
    );
    Ok(())
}
