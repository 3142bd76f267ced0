//! 驱动参数配置
//!
//! 所有时间参数在 TOML 里以秒（f64）表示，内部通过访问器转成
//! `Duration`。每个字段都有缺省值，配置文件只需覆盖关心的项。

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// 参数越界
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// 混合驾驶参数
///
/// 巡航、手动、序列动作三个控制源共用的全部常量。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriveConfig {
    /// 自主巡航前进速度
    pub forward_speed: f64,
    /// 自主模式 tick 周期（秒）
    pub auto_dt: f64,

    /// 轮速上限（双向）
    pub max_speed: f64,
    /// 单次按键的轮速增量
    pub step: f64,
    /// 手动模式每 tick 的衰减系数（必须在 (0, 1) 内）
    pub decay: f64,
    /// 衰减吸附阈值：低于该幅值直接归零
    pub decay_epsilon: f64,
    /// 手动模式 tick 周期（秒），比 auto_dt 短以换取手感
    pub manual_dt: f64,

    /// 手动空闲多久后切回自主巡航（秒）
    pub idle_back_to_auto: f64,

    /// 序列 STOP 段时长（秒）
    pub stop_time: f64,
    /// 序列 TURN 段时长（秒）
    pub turn_time: f64,
    /// 序列 STRAIGHT 段时长（秒）
    pub straight_time: f64,
    /// TURN 段原地转速（左轮 +，右轮 -）
    pub turn_speed: f64,
    /// STRAIGHT 段前进速度
    pub straight_speed: f64,

    /// 首个触发后多久永久禁用自主巡航（秒）
    pub lockout_after: f64,
    /// 停止信号首元素达到该值即判定为"高"
    pub trigger_threshold: f64,
    /// 两次有效上升沿之间的最小间隔（秒），抑制信号抖动
    pub debounce: f64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            forward_speed: 6.0,
            auto_dt: 0.02,
            max_speed: 7.0,
            step: 1.0,
            decay: 0.96,
            decay_epsilon: 1e-3,
            manual_dt: 0.01,
            idle_back_to_auto: 2.0,
            stop_time: 1.0,
            turn_time: 1.5,
            straight_time: 2.0,
            turn_speed: 3.0,
            straight_speed: 3.0,
            lockout_after: 6.0,
            trigger_threshold: 24.0,
            debounce: 0.2,
        }
    }
}

impl DriveConfig {
    /// 从 TOML 文本解析并校验
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// 参数合法性校验
    ///
    /// # 错误
    ///
    /// - `ConfigError::Invalid`: 任一参数越界
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_speed must be > 0, got {}",
                self.max_speed
            )));
        }
        if self.forward_speed.abs() > self.max_speed {
            return Err(ConfigError::Invalid(format!(
                "forward_speed {} exceeds max_speed {}",
                self.forward_speed, self.max_speed
            )));
        }
        if !(0.0..1.0).contains(&self.decay) || self.decay == 0.0 {
            return Err(ConfigError::Invalid(format!(
                "decay must be in (0, 1), got {}",
                self.decay
            )));
        }
        for (name, value) in [
            ("auto_dt", self.auto_dt),
            ("manual_dt", self.manual_dt),
            ("stop_time", self.stop_time),
            ("turn_time", self.turn_time),
            ("straight_time", self.straight_time),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be > 0, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("step", self.step),
            ("decay_epsilon", self.decay_epsilon),
            ("idle_back_to_auto", self.idle_back_to_auto),
            ("lockout_after", self.lockout_after),
            ("debounce", self.debounce),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be >= 0, got {}",
                    name, value
                )));
            }
        }
        if self.turn_speed.abs() > self.max_speed || self.straight_speed.abs() > self.max_speed {
            return Err(ConfigError::Invalid(
                "sequence speeds must not exceed max_speed".to_string(),
            ));
        }
        Ok(())
    }

    pub fn auto_period(&self) -> Duration {
        Duration::from_secs_f64(self.auto_dt)
    }

    pub fn manual_period(&self) -> Duration {
        Duration::from_secs_f64(self.manual_dt)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.idle_back_to_auto)
    }

    pub fn stop_leg(&self) -> Duration {
        Duration::from_secs_f64(self.stop_time)
    }

    pub fn turn_leg(&self) -> Duration {
        Duration::from_secs_f64(self.turn_time)
    }

    pub fn straight_leg(&self) -> Duration {
        Duration::from_secs_f64(self.straight_time)
    }

    pub fn lockout_delay(&self) -> Duration {
        Duration::from_secs_f64(self.lockout_after)
    }

    pub fn edge_debounce(&self) -> Duration {
        Duration::from_secs_f64(self.debounce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DriveConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = DriveConfig::from_toml_str("forward_speed = 3.5\ndecay = 0.9\n").unwrap();
        assert_eq!(config.forward_speed, 3.5);
        assert_eq!(config.decay, 0.9);
        // 未覆盖的字段保持缺省
        assert_eq!(config.max_speed, 7.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(DriveConfig::from_toml_str("cruise = 1.0\n").is_err());
    }

    #[test]
    fn test_invalid_decay_rejected() {
        let err = DriveConfig::from_toml_str("decay = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_cruise_faster_than_max_rejected() {
        let err = DriveConfig::from_toml_str("forward_speed = 9.0\n").unwrap_err();
        assert!(format!("{}", err).contains("forward_speed"));
    }

    #[test]
    fn test_period_accessors() {
        let config = DriveConfig::default();
        assert_eq!(config.auto_period(), Duration::from_millis(20));
        assert_eq!(config.manual_period(), Duration::from_millis(10));
        assert_eq!(config.lockout_delay(), Duration::from_secs(6));
    }
}
