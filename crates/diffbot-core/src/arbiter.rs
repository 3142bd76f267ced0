//! 控制模式仲裁
//!
//! 每个 tick 在自主巡航和手动遥控之间做一次裁决。序列活动的 tick
//! 根本不会走到这里（序列独占输出），所以这里只处理三条规则：
//! 按键活动切手动、空闲超时回自主、锁定对 AUTO 的一票否决。

use std::time::{Duration, Instant};
use tracing::info;

/// 控制模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// 自主巡航：恒定前进
    Auto,
    /// 手动遥控：按键步进 + 衰减滑行
    Manual,
}

/// 模式仲裁器
///
/// 持有当前模式和最近一次按键时刻；模式只通过 `decide` /
/// `force_manual` 两个入口变化。
#[derive(Debug)]
pub struct ModeArbiter {
    mode: ControlMode,
    last_key: Option<Instant>,
}

impl ModeArbiter {
    pub fn new() -> Self {
        Self {
            mode: ControlMode::Auto,
            last_key: None,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// 锁定生效时的强制切换（不经过常规规则，且不可再回 AUTO）
    pub fn force_manual(&mut self) {
        if self.mode != ControlMode::Manual {
            info!("Mode: AUTO -> MANUAL (auto lockout)");
        }
        self.mode = ControlMode::Manual;
    }

    /// 常规仲裁规则（优先级从上到下）
    ///
    /// 1. 有按键：切手动并重置空闲时钟
    /// 2. 手动空闲满 `idle_timeout` 且未锁定：回自主
    /// 3. 已锁定：钉死在手动
    /// 4. 其余情况模式保持
    pub fn decide(
        &mut self,
        key_seen: bool,
        blocked: bool,
        now: Instant,
        idle_timeout: Duration,
    ) -> ControlMode {
        if key_seen {
            if self.mode != ControlMode::Manual {
                info!("Mode: AUTO -> MANUAL (operator input)");
            }
            self.mode = ControlMode::Manual;
            self.last_key = Some(now);
        } else if self.mode == ControlMode::Manual && !blocked && self.idle_for(now) >= idle_timeout
        {
            info!("Mode: MANUAL -> AUTO (idle {:?})", idle_timeout);
            self.mode = ControlMode::Auto;
        } else if blocked {
            self.mode = ControlMode::Manual;
        }
        self.mode
    }

    /// 距最近一次按键的时长；从未按过键视为空闲无穷久
    fn idle_for(&self, now: Instant) -> Duration {
        match self.last_key {
            Some(t) => now.duration_since(t),
            None => Duration::MAX,
        }
    }
}

impl Default for ModeArbiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: Duration = Duration::from_secs(2);

    #[test]
    fn test_starts_in_auto() {
        assert_eq!(ModeArbiter::new().mode(), ControlMode::Auto);
    }

    #[test]
    fn test_key_switches_to_manual_immediately() {
        let mut arbiter = ModeArbiter::new();
        let now = Instant::now();
        assert_eq!(arbiter.decide(true, false, now, IDLE), ControlMode::Manual);
    }

    #[test]
    fn test_idle_timeout_returns_to_auto() {
        let mut arbiter = ModeArbiter::new();
        let t0 = Instant::now();
        arbiter.decide(true, false, t0, IDLE);

        // 空闲未满：保持手动
        let t1 = t0 + Duration::from_millis(1999);
        assert_eq!(arbiter.decide(false, false, t1, IDLE), ControlMode::Manual);

        // 空闲满 2s：回自主
        let t2 = t0 + Duration::from_secs(2);
        assert_eq!(arbiter.decide(false, false, t2, IDLE), ControlMode::Auto);
    }

    #[test]
    fn test_new_key_resets_idle_clock() {
        let mut arbiter = ModeArbiter::new();
        let t0 = Instant::now();
        arbiter.decide(true, false, t0, IDLE);
        // 1.5s 后又按了一下
        let t1 = t0 + Duration::from_millis(1500);
        arbiter.decide(true, false, t1, IDLE);
        // 距 t0 已超 2s，但距 t1 没有：仍是手动
        let t2 = t0 + Duration::from_millis(2500);
        assert_eq!(arbiter.decide(false, false, t2, IDLE), ControlMode::Manual);
    }

    #[test]
    fn test_lockout_vetoes_return_to_auto() {
        let mut arbiter = ModeArbiter::new();
        let t0 = Instant::now();
        arbiter.decide(true, true, t0, IDLE);
        // 空闲再久也回不去
        let t1 = t0 + Duration::from_secs(60);
        assert_eq!(arbiter.decide(false, true, t1, IDLE), ControlMode::Manual);
    }

    #[test]
    fn test_force_manual_is_sticky_while_blocked() {
        let mut arbiter = ModeArbiter::new();
        arbiter.force_manual();
        assert_eq!(arbiter.mode(), ControlMode::Manual);
        let now = Instant::now();
        assert_eq!(
            arbiter.decide(false, true, now + Duration::from_secs(10), IDLE),
            ControlMode::Manual
        );
    }
}
