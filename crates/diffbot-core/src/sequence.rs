//! 一次性规避序列状态机
//!
//! `IDLE -> STOP -> TURN -> STRAIGHT -> IDLE`，由上升沿触发，之后完全
//! 按进入各段的时刻推进。闩锁进程生命周期内只允许消耗一次：触发即
//! 永久撤防，序列跑完后也不会再接受第二次触发。
//!
//! 序列处于活动状态时对 `WheelCommand` 拥有独占权——手动和自主
//! 控制源在该 tick 完全不被咨询。

use crate::command::WheelCommand;
use crate::config::DriveConfig;
use std::time::Instant;
use tracing::info;

/// 序列状态
///
/// 状态只能沿 `Idle -> Stop -> Turn -> Straight -> Idle` 推进，
/// 且每个 tick 至多前进一段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Idle,
    Stop,
    Turn,
    Straight,
}

/// 一次性序列控制器
#[derive(Debug)]
pub struct SequenceController {
    state: SequenceState,
    /// 一次性闩锁：初始 true，首次触发后永久 false
    armed: bool,
    /// 当前段的进入时刻（Idle 时为 None）
    entered_at: Option<Instant>,
}

impl SequenceController {
    pub fn new() -> Self {
        Self {
            state: SequenceState::Idle,
            armed: true,
            entered_at: None,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// 序列是否正在执行（state != Idle）
    pub fn is_active(&self) -> bool {
        self.state != SequenceState::Idle
    }

    /// 闩锁是否仍然待命
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// 尝试用一个上升沿触发序列
    ///
    /// 只有闩锁待命且当前空闲时才会进入 STOP 段；触发即消耗闩锁。
    ///
    /// # 返回
    ///
    /// 触发成功返回 `true`（调用方据此记录锁定起点）。
    pub fn try_trigger(&mut self, rising: bool, now: Instant) -> bool {
        if !(rising && self.armed && self.state == SequenceState::Idle) {
            return false;
        }
        self.armed = false;
        self.state = SequenceState::Stop;
        self.entered_at = Some(now);
        info!("Maneuver sequence triggered (one-shot latch consumed)");
        true
    }

    /// 按时间推进状态机并给出本段的轮速输出
    ///
    /// 每个 tick 至多推进一段。从 STRAIGHT 回到 IDLE 的那个 tick
    /// 返回 `None`，仲裁在同一 tick 恢复接管。
    ///
    /// # 返回
    ///
    /// - `Some(cmd)`: 序列仍在执行，`cmd` 即本 tick 的独占输出
    /// - `None`: 序列空闲（或刚刚结束）
    pub fn update(&mut self, now: Instant, config: &DriveConfig) -> Option<WheelCommand> {
        let entered = self.entered_at?;
        let elapsed = now.duration_since(entered);

        match self.state {
            SequenceState::Idle => return None,
            SequenceState::Stop if elapsed >= config.stop_leg() => {
                self.state = SequenceState::Turn;
                self.entered_at = Some(now);
                info!("Sequence leg: STOP -> TURN");
            }
            SequenceState::Turn if elapsed >= config.turn_leg() => {
                self.state = SequenceState::Straight;
                self.entered_at = Some(now);
                info!("Sequence leg: TURN -> STRAIGHT");
            }
            SequenceState::Straight if elapsed >= config.straight_leg() => {
                self.state = SequenceState::Idle;
                self.entered_at = None;
                info!("Maneuver sequence finished (latch stays disarmed)");
                return None;
            }
            _ => {}
        }

        match self.state {
            SequenceState::Idle => None,
            SequenceState::Stop => Some(WheelCommand::zero()),
            // 原地顺时针旋转：左正右负
            SequenceState::Turn => Some(WheelCommand::new(config.turn_speed, -config.turn_speed)),
            SequenceState::Straight => {
                Some(WheelCommand::new(config.straight_speed, config.straight_speed))
            }
        }
    }
}

impl Default for SequenceController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> DriveConfig {
        DriveConfig::default()
    }

    #[test]
    fn test_trigger_requires_armed_latch() {
        let mut seq = SequenceController::new();
        let t0 = Instant::now();

        assert!(!seq.try_trigger(false, t0));
        assert!(seq.try_trigger(true, t0));
        assert!(!seq.is_armed());
        assert_eq!(seq.state(), SequenceState::Stop);
    }

    #[test]
    fn test_legs_advance_by_elapsed_time() {
        let config = config();
        let mut seq = SequenceController::new();
        let t0 = Instant::now();
        seq.try_trigger(true, t0);

        // STOP 段内：双轮为 0
        let out = seq.update(t0 + Duration::from_millis(500), &config).unwrap();
        assert!(out.is_zero());

        // 1.0s 后进入 TURN：等量反向
        let t1 = t0 + Duration::from_millis(1000);
        let out = seq.update(t1, &config).unwrap();
        assert_eq!(out, WheelCommand::new(3.0, -3.0));

        // 再 1.5s 进入 STRAIGHT：同向前进
        let t2 = t1 + Duration::from_millis(1500);
        let out = seq.update(t2, &config).unwrap();
        assert_eq!(out, WheelCommand::new(3.0, 3.0));

        // 再 2.0s 回到 IDLE：返回 None，当 tick 即交还仲裁
        let t3 = t2 + Duration::from_millis(2000);
        assert!(seq.update(t3, &config).is_none());
        assert!(!seq.is_active());
    }

    #[test]
    fn test_sequence_runs_at_most_once() {
        let config = config();
        let mut seq = SequenceController::new();
        let t0 = Instant::now();
        seq.try_trigger(true, t0);

        // 跑完整个序列
        let mut now = t0;
        for _ in 0..1000 {
            now += Duration::from_millis(20);
            if seq.update(now, &config).is_none() && !seq.is_active() {
                break;
            }
        }
        assert!(!seq.is_active());

        // 之后再多的上升沿都不再触发
        for i in 1..10 {
            let later = now + Duration::from_secs(i);
            assert!(!seq.try_trigger(true, later));
            assert!(seq.update(later, &config).is_none());
        }
    }

    #[test]
    fn test_retrigger_during_active_sequence_ignored() {
        let mut seq = SequenceController::new();
        let t0 = Instant::now();
        assert!(seq.try_trigger(true, t0));
        assert!(!seq.try_trigger(true, t0 + Duration::from_millis(100)));
    }
}
