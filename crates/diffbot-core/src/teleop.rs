//! 手动遥控输入
//!
//! 核心只认识逻辑按键，不关心底层输入后端（终端、SSH、管道）。
//! 每个 tick 由驱动层把积压的按键事件一次性排空后交给这里；
//! 每个事件映射为一对轮速增量，逐事件累加、逐事件钳位。

use crate::command::WheelCommand;

/// 逻辑按键
///
/// W/↑、S/↓、A/←、D/→、空格、Q 之外的键一律映射为 `Unknown`，
/// 不产生增量，但仍算作"看到了按键"（和原始行为一致）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Forward,
    Back,
    TurnLeft,
    TurnRight,
    Stop,
    Quit,
    Unknown,
}

/// 一个 tick 的按键扫描结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyReport {
    /// 本 tick 是否观察到任何按键事件（包括未识别的键）
    pub key_seen: bool,
    /// 是否请求退出（Q 键）
    pub quit: bool,
}

impl KeyReport {
    /// 扫描事件列表，不产生任何运动副作用
    pub fn scan(keys: &[Key]) -> Self {
        Self {
            key_seen: !keys.is_empty(),
            quit: keys.contains(&Key::Quit),
        }
    }
}

/// 把按键事件逐个叠加到轮速命令上
///
/// 每个事件之后立即钳位到 `[-max_speed, +max_speed]`，所以再长的
/// 事件队列也不会把命令推出界。空格直接把双轮清零。
pub fn apply_key_deltas(
    mut command: WheelCommand,
    keys: &[Key],
    step: f64,
    max_speed: f64,
) -> WheelCommand {
    for key in keys {
        command = match key {
            Key::Forward => command.offset_clamped(step, step, max_speed),
            Key::Back => command.offset_clamped(-step, -step, max_speed),
            Key::TurnLeft => command.offset_clamped(-step, step, max_speed),
            Key::TurnRight => command.offset_clamped(step, -step, max_speed),
            Key::Stop => WheelCommand::zero(),
            Key::Quit | Key::Unknown => command,
        };
    }
    command
}
