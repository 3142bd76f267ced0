//! 轮速命令类型
//!
//! 差速底盘的最终输出就是一对左/右轮速。所有控制源（巡航、手动、
//! 序列动作）最终都汇聚成一个 `WheelCommand`，每个 tick 恰好被
//! 修改一次，并始终钳位在 `[-max_speed, +max_speed]` 内。

use serde::{Deserialize, Serialize};

/// 左/右轮速命令
///
/// # 设计特性
///
/// - **Copy trait**：零成本复制，适合高频控制循环场景
/// - **无单位约定**：数值直接透传给传输通道（仿真端解释单位）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelCommand {
    pub left: f64,
    pub right: f64,
}

impl WheelCommand {
    /// 创建命令（不做钳位，调用方负责）
    pub const fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// 零命令（安全停止）
    pub const fn zero() -> Self {
        Self {
            left: 0.0,
            right: 0.0,
        }
    }

    /// 是否为零命令
    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }

    /// 双轮各加一个增量，然后钳位到 `[-max_speed, +max_speed]`
    pub fn offset_clamped(&self, dl: f64, dr: f64, max_speed: f64) -> Self {
        Self {
            left: (self.left + dl).clamp(-max_speed, max_speed),
            right: (self.right + dr).clamp(-max_speed, max_speed),
        }
    }

    /// 双轮各乘以衰减系数，低于 `epsilon` 时吸附到精确的 0
    ///
    /// 吸附保证无输入时轮速在有限步内到达 0 并停在 0，
    /// 而不是无限逼近。
    pub fn decayed(&self, factor: f64, epsilon: f64) -> Self {
        let snap = |v: f64| {
            let v = v * factor;
            if v.abs() < epsilon { 0.0 } else { v }
        };
        Self {
            left: snap(self.left),
            right: snap(self.right),
        }
    }

    /// 双轮是否都在界内
    pub fn within(&self, max_speed: f64) -> bool {
        self.left.abs() <= max_speed && self.right.abs() <= max_speed
    }
}
