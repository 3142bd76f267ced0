//! # Diffbot Core
//!
//! 差速底盘混合驾驶的模式仲裁与序列控制（无 I/O 依赖）
//!
//! 三个互相竞争的控制源——自主巡航、一次性规避序列、操作员手动
//! 遥控——每个 tick 被仲裁成一对轮速命令。本 crate 只做裁决本身：
//! 传输通道和键盘后端都是外部协作者，由上层注入原始载荷和逻辑
//! 按键事件。
//!
//! ## 模块
//!
//! - `command`: 轮速命令值类型
//! - `config`: 驱动参数（TOML 可覆盖）
//! - `signal`: 停止信号解析 + 去抖动上升沿检测
//! - `sequence`: 一次性 STOP→TURN→STRAIGHT 序列状态机
//! - `lockout`: 自主巡航单向锁定计时器
//! - `teleop`: 逻辑按键与轮速增量
//! - `arbiter`: AUTO/MANUAL 模式仲裁
//! - `mixer`: 巡航/衰减混合与显式 tick 周期
//! - `pilot`: 把以上全部装进一个仲裁上下文的 `HybridPilot`
//!
//! ## 时间模型
//!
//! 核心从不读墙钟：每个 `tick` 的时刻由循环驱动层显式传入，
//! 所有时序语义（去抖、序列分段、锁定、空闲回退）都可以用
//! 模拟时钟做确定性测试。

pub mod arbiter;
pub mod command;
pub mod config;
pub mod lockout;
pub mod mixer;
pub mod pilot;
pub mod sequence;
pub mod signal;
pub mod teleop;

// 重新导出常用类型
pub use arbiter::{ControlMode, ModeArbiter};
pub use command::WheelCommand;
pub use config::{ConfigError, DriveConfig};
pub use lockout::LockoutTimer;
pub use mixer::{MixOutput, mix};
pub use pilot::{HybridPilot, TickOutput};
pub use sequence::{SequenceController, SequenceState};
pub use signal::{EdgeDetector, EdgeSample, SignalError, parse_stop_vector};
pub use teleop::{Key, KeyReport, apply_key_deltas};
