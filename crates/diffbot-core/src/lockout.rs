//! 自主巡航锁定计时器
//!
//! 首次有效触发之后经过固定时长，自主巡航被永久禁用（单向标志，
//! 绝不复位）。锁定只影响 AUTO 的可达性，对已经在执行的序列没有
//! 任何作用。

use std::time::Instant;
use tracing::info;

/// 锁定状态
///
/// `first_trigger` 只被记录一次；`blocked` 一旦翻转为 true 就保持。
#[derive(Debug, Default)]
pub struct LockoutTimer {
    first_trigger: Option<Instant>,
    blocked: bool,
}

impl LockoutTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 锁定是否已生效
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// 记录首次触发时刻（只有第一次调用生效）
    pub fn record_trigger(&mut self, now: Instant) {
        if self.first_trigger.is_none() {
            self.first_trigger = Some(now);
        }
    }

    /// 纯粹由时刻决定的锁定判定
    ///
    /// # 返回
    ///
    /// 恰好在本 tick 翻转为锁定时返回 `true`（调用方要做一次
    /// 强制清零并切到手动）；之后的 tick 返回 `false`。
    pub fn update(&mut self, now: Instant, delay: std::time::Duration) -> bool {
        if self.blocked {
            return false;
        }
        let Some(first) = self.first_trigger else {
            return false;
        };
        if now.duration_since(first) >= delay {
            self.blocked = true;
            info!("Auto lockout engaged: cruise permanently disabled, manual-only from now on");
            return true;
        }
        false
    }
}
