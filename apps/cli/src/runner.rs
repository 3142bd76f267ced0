//! Tick 循环驱动
//!
//! 单线程协作式循环，每个 tick 严格按次序：读 stopinput -> 排空
//! 键盘 -> `HybridPilot::tick` 裁决 -> 写 left/right -> 按活动模式
//! 休眠。唯一的安全保证在退出路径上：不管是 Q 键、外部中断还是
//! tick 内的致命错误，通道释放前都恰好写出一次 {0,0}。

use crate::keys::KeySource;
use anyhow::{Context, Result};
use diffbot_core::{DriveConfig, HybridPilot, WheelCommand};
use diffbot_link::{Link, VarType, VarValue};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// HUD 状态行的节流周期
const HUD_PERIOD: Duration = Duration::from_millis(300);

/// 核心消费/生产的变量名
const VAR_LEFT: &str = "left_speed";
const VAR_RIGHT: &str = "right_speed";
const VAR_STOP: &str = "stopinput";
const VAR_SENSOR: &str = "sensor";

/// 运行混合驾驶循环直到退出请求或致命错误
///
/// # 参数
///
/// - `link`: 已构造（未启动）的传输通道
/// - `keys`: 键盘事件源
/// - `config`: 驱动参数
/// - `running`: 外部中断标志（ctrlc 处理器置 false）
///
/// # 退出语义
///
/// 返回前无条件执行停机路径：写一次零命令、`close()` 通道。
/// 循环内的错误原样向上传播，但不会跳过停机路径。
pub fn run<L, K>(
    link: &mut L,
    keys: &mut K,
    config: DriveConfig,
    running: Arc<AtomicBool>,
) -> Result<()>
where
    L: Link,
    K: KeySource,
{
    link.declare(VAR_LEFT, VarType::Float, VarValue::Float(0.0))?;
    link.declare(VAR_RIGHT, VarType::Float, VarValue::Float(0.0))?;
    link.declare(VAR_STOP, VarType::Text, VarValue::Text(String::new()))?;
    link.declare(VAR_SENSOR, VarType::Text, VarValue::Text(String::new()))?;
    link.start()?;

    info!(
        cruise = config.forward_speed,
        idle_back_to_auto = config.idle_back_to_auto,
        lockout_after = config.lockout_after,
        "Hybrid pilot running (AUTO cruise; any key -> MANUAL; Q quits)"
    );

    let result = drive_loop(link, keys, config, &running);

    // 停机路径：任何退出都要走到这里，先归零再释放
    shutdown(link);
    result
}

/// 主循环本体（错误直接向上抛，停机路径由调用方兜底）
fn drive_loop<L, K>(
    link: &mut L,
    keys: &mut K,
    config: DriveConfig,
    running: &AtomicBool,
) -> Result<()>
where
    L: Link,
    K: KeySource,
{
    let mut pilot = HybridPilot::new(config);
    let sleeper = spin_sleep::SpinSleeper::default();
    let mut last_hud = Instant::now();
    let mut last_stop = String::new();
    let mut last_sensor = String::new();

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();

        // 1. 读外部信号（最近已知值，可能陈旧）
        let raw_stop = link.read(VAR_STOP)?.to_string();
        if raw_stop != last_stop {
            debug!(payload = %raw_stop, "stopinput changed");
            last_stop = raw_stop.clone();
        }
        let sensor = link.read(VAR_SENSOR)?.to_string();
        if sensor != last_sensor {
            // 信息性数据，不参与仲裁
            trace!(payload = %sensor, "sensor changed");
            last_sensor = sensor;
        }

        // 2. 排空键盘（序列活动时核心内部丢弃运动增量）
        let pending = keys.drain().context("keyboard drain failed")?;

        // 3. 仲裁
        let out = pilot.tick(now, &raw_stop, &pending);

        // 4. 无条件写出本 tick 命令；写失败视为瞬态
        publish(link, out.command);

        // 5. HUD（节流）
        if now.duration_since(last_hud) >= HUD_PERIOD {
            info!(
                mode = ?pilot.mode(),
                lockout = pilot.is_blocked(),
                sequence = ?pilot.sequence_state(),
                left = format_args!("{:+.2}", out.command.left),
                right = format_args!("{:+.2}", out.command.right),
                "status"
            );
            last_hud = now;
        }

        if out.quit {
            info!("Quit requested by operator");
            return Ok(());
        }

        // 6. 按活动模式休眠（手动更快，自主更省）
        sleeper.sleep(out.next_sleep);
    }

    info!("Interrupted, shutting down");
    Ok(())
}

/// 发布一对轮速；失败只告警（由协作方兜底最近好值）
fn publish<L: Link>(link: &mut L, command: WheelCommand) {
    if let Err(e) = link.write(VAR_LEFT, VarValue::Float(command.left)) {
        warn!(error = %e, "Failed to publish left_speed");
    }
    if let Err(e) = link.write(VAR_RIGHT, VarValue::Float(command.right)) {
        warn!(error = %e, "Failed to publish right_speed");
    }
}

/// 停机路径：恰好一次零命令写出，然后幂等关闭
fn shutdown<L: Link>(link: &mut L) {
    publish(link, WheelCommand::zero());
    if let Err(e) = link.close() {
        warn!(error = %e, "Failed to close link");
    }
    info!("Stopped (final zero command published)");
}
