//! 运动混合
//!
//! 把当前模式变成最终的轮速命令：自主模式是恒定巡航（无斜坡），
//! 手动模式是先衰减滑行、再叠加本 tick 的按键步进。下一次 tick
//! 的休眠时长作为显式返回值给出，而不是散落在循环里的分支——
//! 手动模式用更短的周期换手感，自主模式用更长的周期降负载。

use crate::arbiter::ControlMode;
use crate::command::WheelCommand;
use crate::config::DriveConfig;
use crate::teleop::{Key, apply_key_deltas};
use std::time::Duration;

/// 一次混合的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixOutput {
    pub command: WheelCommand,
    /// 本 tick 结束后应当休眠多久
    pub next_sleep: Duration,
}

/// 计算当前模式下的输出命令
///
/// 手动模式下：先对上一 tick 的命令做几何衰减（带吸附归零），
/// 再把本 tick 的按键事件逐个叠加、逐个钳位。
pub fn mix(
    mode: ControlMode,
    blocked: bool,
    current: WheelCommand,
    keys: &[Key],
    config: &DriveConfig,
) -> MixOutput {
    match mode {
        ControlMode::Auto => {
            // 锁定后 AUTO 本不可达；真到了这里也只输出零，不巡航
            let command = if blocked {
                WheelCommand::zero()
            } else {
                WheelCommand::new(config.forward_speed, config.forward_speed)
            };
            MixOutput {
                command,
                next_sleep: config.auto_period(),
            }
        }
        ControlMode::Manual => {
            let decayed = current.decayed(config.decay, config.decay_epsilon);
            let command = apply_key_deltas(decayed, keys, config.step, config.max_speed);
            MixOutput {
                command,
                next_sleep: config.manual_period(),
            }
        }
    }
}
