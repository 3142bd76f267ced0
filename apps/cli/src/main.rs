//! # Diffbot CLI
//!
//! 差速底盘混合驾驶的命令行驱动。
//!
//! ```bash
//! # 缺省参数跑起来（监听 0.0.0.0:8400）
//! diffbot-cli run
//!
//! # 指定参数文件与监听地址
//! diffbot-cli run --listen 0.0.0.0:8400 --config drive.toml
//!
//! # 只校验参数文件
//! diffbot-cli check-config drive.toml
//! ```
//!
//! 键位：W/↑ 前进，S/↓ 后退，A/← 左转，D/→ 右转，空格急停，Q 退出。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use diffbot_core::DriveConfig;
use diffbot_link::UdpLink;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

mod keys;
mod runner;

use keys::TerminalKeys;

/// Diffbot CLI - 差速底盘混合驾驶工具
#[derive(Parser, Debug)]
#[command(name = "diffbot-cli")]
#[command(about = "Hybrid teleop/autonomy driver for diffbot differential-drive robots", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 启动混合驾驶循环
    Run {
        /// UDP 监听地址
        ///
        /// 格式: IP:PORT，默认: 0.0.0.0:8400
        #[arg(long, default_value = "0.0.0.0:8400")]
        listen: SocketAddr,

        /// 固定发送目标（可选）
        ///
        /// 不指定时回给最近一次来报的对端
        #[arg(long)]
        target: Option<SocketAddr>,

        /// 驱动参数文件（TOML，可选；缺省用内置参数）
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// 校验驱动参数文件
    CheckConfig {
        /// 参数文件路径
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("diffbot_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            listen,
            target,
            config,
        } => run_command(listen, target, config.as_deref()),

        Commands::CheckConfig { path } => {
            let config = load_config(Some(&path))?;
            println!("OK: {}", path.display());
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn run_command(listen: SocketAddr, target: Option<SocketAddr>, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;

    // Ctrl+C / SIGINT：只置标志，零命令写出由循环的退出路径负责
    let running = Arc::new(AtomicBool::new(true));
    let running_in_handler = running.clone();
    ctrlc::set_handler(move || {
        running_in_handler.store(false, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let mut link = UdpLink::bind(listen);
    if let Some(target) = target {
        link = link.with_target(target);
    }

    info!(%listen, "Starting diffbot hybrid pilot");
    let mut keys = TerminalKeys::new().context("Failed to enter raw terminal mode")?;
    runner::run(&mut link, &mut keys, config, running)
}

/// 读取并校验参数文件；None 时用内置缺省
fn load_config(path: Option<&Path>) -> Result<DriveConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            DriveConfig::from_toml_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))
        }
        None => Ok(DriveConfig::default()),
    }
}
