//! 混合驾驶主体
//!
//! `HybridPilot` 是把全部可变状态（模式、序列、闩锁、计时器、当前
//! 命令）收拢到一起的仲裁上下文，由 tick 循环独占持有——没有任何
//! 模块级隐藏状态。每个 tick 调用一次 [`HybridPilot::tick`]，内部
//! 严格按固定次序执行：
//!
//! 1. 边沿检测（解析 stopinput）
//! 2. 序列触发 / 锁定计时更新
//! 3. 序列活动 => 序列独占输出；否则：按键扫描 -> 模式仲裁 -> 运动混合
//!
//! 时刻 `now` 由调用方显式传入，核心不读墙钟，便于用模拟时钟做
//! 单元测试。

use crate::arbiter::{ControlMode, ModeArbiter};
use crate::command::WheelCommand;
use crate::config::DriveConfig;
use crate::lockout::LockoutTimer;
use crate::mixer::{self, MixOutput};
use crate::sequence::{SequenceController, SequenceState};
use crate::signal::EdgeDetector;
use crate::teleop::{Key, KeyReport};
use std::time::{Duration, Instant};
use tracing::debug;

/// 一个 tick 的最终裁决
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// 本 tick 要发布的轮速命令
    pub command: WheelCommand,
    /// 本 tick 结束后的休眠时长（由活动模式决定）
    pub next_sleep: Duration,
    /// 操作员是否请求退出（Q 键）
    pub quit: bool,
}

/// 混合驾驶仲裁上下文
#[derive(Debug)]
pub struct HybridPilot {
    config: DriveConfig,
    edge: EdgeDetector,
    sequence: SequenceController,
    lockout: LockoutTimer,
    arbiter: ModeArbiter,
    command: WheelCommand,
}

impl HybridPilot {
    /// 以缺省状态创建：AUTO 模式、序列空闲、闩锁待命、零命令
    pub fn new(config: DriveConfig) -> Self {
        let edge = EdgeDetector::new(config.trigger_threshold, config.edge_debounce());
        Self {
            config,
            edge,
            sequence: SequenceController::new(),
            lockout: LockoutTimer::new(),
            arbiter: ModeArbiter::new(),
            command: WheelCommand::zero(),
        }
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn mode(&self) -> ControlMode {
        self.arbiter.mode()
    }

    pub fn sequence_state(&self) -> SequenceState {
        self.sequence.state()
    }

    pub fn is_sequence_active(&self) -> bool {
        self.sequence.is_active()
    }

    pub fn is_blocked(&self) -> bool {
        self.lockout.is_blocked()
    }

    /// 当前命令（上一个 tick 的输出）
    pub fn command(&self) -> WheelCommand {
        self.command
    }

    /// 执行一个控制 tick
    ///
    /// # 参数
    ///
    /// - `now`: 本 tick 的时刻（由循环驱动层提供）
    /// - `raw_stop`: 通道里 `stopinput` 的当前原始载荷
    /// - `keys`: 本 tick 排空的全部按键事件（序列活动时也要排空，
    ///   运动增量会被丢弃，避免序列结束后的陈旧事件爆发）
    pub fn tick(&mut self, now: Instant, raw_stop: &str, keys: &[Key]) -> TickOutput {
        // 1. 边沿检测
        let sample = self.edge.sample(raw_stop, now);

        // 2. 序列触发（消耗闩锁）并记录锁定起点
        if self.sequence.try_trigger(sample.rising, now) {
            self.lockout.record_trigger(now);
        }

        // 3. 锁定翻转的那个 tick：强制清零一次并钉死手动模式。
        //    对已经在执行的序列没有影响（序列输出在后面覆盖）。
        if self.lockout.update(now, self.config.lockout_delay()) {
            self.command = WheelCommand::zero();
            self.arbiter.force_manual();
        }

        // 4. 序列活动：独占输出，按键排空后丢弃（Quit 仍然生效）
        if let Some(command) = self.sequence.update(now, &self.config) {
            let report = KeyReport::scan(keys);
            if report.key_seen {
                debug!(count = keys.len(), "Discarding operator input during maneuver sequence");
            }
            self.command = command;
            return TickOutput {
                command,
                next_sleep: self.config.auto_period(),
                quit: report.quit,
            };
        }

        // 5. 按键扫描 -> 模式仲裁
        let report = KeyReport::scan(keys);
        let mode = self.arbiter.decide(
            report.key_seen,
            self.lockout.is_blocked(),
            now,
            self.config.idle_timeout(),
        );

        // 6. 运动混合
        let MixOutput {
            command,
            next_sleep,
        } = mixer::mix(mode, self.lockout.is_blocked(), self.command, keys, &self.config);
        self.command = command;

        TickOutput {
            command,
            next_sleep,
            quit: report.quit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 固定的模拟时钟步进
    fn pilot() -> HybridPilot {
        HybridPilot::new(DriveConfig::default())
    }

    #[test]
    fn test_defaults_match_spec() {
        let pilot = pilot();
        assert_eq!(pilot.mode(), ControlMode::Auto);
        assert_eq!(pilot.sequence_state(), SequenceState::Idle);
        assert!(!pilot.is_blocked());
        assert!(pilot.command().is_zero());
    }

    #[test]
    fn test_auto_tick_outputs_cruise() {
        let mut pilot = pilot();
        let out = pilot.tick(Instant::now(), "", &[]);
        assert_eq!(out.command, WheelCommand::new(6.0, 6.0));
        assert!(!out.quit);
        assert_eq!(out.next_sleep, Duration::from_millis(20));
    }

    #[test]
    fn test_quit_propagates_from_key_queue() {
        let mut pilot = pilot();
        let out = pilot.tick(Instant::now(), "", &[Key::Quit]);
        assert!(out.quit);
    }

    #[test]
    fn test_quit_honored_during_sequence() {
        let mut pilot = pilot();
        let t0 = Instant::now();
        pilot.tick(t0, "[24,0,0]", &[]);
        assert!(pilot.is_sequence_active());

        let out = pilot.tick(t0 + Duration::from_millis(20), "[24,0,0]", &[Key::Quit]);
        assert!(out.quit);
        // 但运动增量被丢弃：输出仍是序列的 STOP 段
        assert!(out.command.is_zero());
    }

    #[test]
    fn test_sequence_discards_motion_keys() {
        let mut pilot = pilot();
        let t0 = Instant::now();
        pilot.tick(t0, "[24,0,0]", &[]);

        // 序列前 4 秒狂按前进（序列总时长 4.5 秒，此时仍在执行）
        let mut now = t0;
        for _ in 0..200 {
            now += Duration::from_millis(20);
            let out = pilot.tick(now, "[0,0,0]", &[Key::Forward; 4]);
            assert!(out.command.within(pilot.config().max_speed));
        }
        assert!(pilot.is_sequence_active());

        // 放开按键等序列自然结束：没有陈旧事件爆发，
        // 序列期间的按键也从未进入空闲时钟
        while pilot.is_sequence_active() {
            now += Duration::from_millis(20);
            pilot.tick(now, "[0,0,0]", &[]);
        }
        let out = pilot.tick(now + Duration::from_millis(20), "[0,0,0]", &[]);
        assert_eq!(pilot.mode(), ControlMode::Auto);
        assert_eq!(out.command, WheelCommand::new(6.0, 6.0));
    }
}
