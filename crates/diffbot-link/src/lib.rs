//! # Diffbot Link
//!
//! 命名变量传输通道的统一抽象
//!
//! 控制核心眼里的网络就是一组命名变量：`declare` 注册、`start`
//! 打开、`read` 取最近一次收到的值（可能是陈旧的）、`write` 发后
//! 即忘、`close` 幂等释放。协议细节不属于核心关心的范围，这里
//! 提供两个实现：
//!
//! - `udp`: 极简 `name=value` 文本报文的 UDP 实现
//! - `memory`: 进程内实现，测试用

use std::fmt;
use thiserror::Error;

pub mod memory;
pub mod udp;

pub use memory::MemoryLink;
pub use udp::UdpLink;

/// 链路层统一错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// 在 `start()` 之前读写
    #[error("Link not started")]
    NotStarted,

    /// 读写了未声明的变量
    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },

    /// 写入值与声明类型不符
    #[error("Type mismatch for variable {name}: expected {expected:?}")]
    TypeMismatch { name: String, expected: VarType },
}

/// 变量类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Float,
    Text,
}

/// 变量值
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Float(f64),
    Text(String),
}

impl VarValue {
    pub fn var_type(&self) -> VarType {
        match self {
            VarValue::Float(_) => VarType::Float,
            VarValue::Text(_) => VarType::Text,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            VarValue::Float(v) => Some(*v),
            VarValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VarValue::Text(s) => Some(s),
            VarValue::Float(_) => None,
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Float(v) => write!(f, "{v}"),
            VarValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// 命名变量通道
///
/// # 契约
///
/// - `declare` 必须在 `start` 之前完成
/// - `read` 返回最近一次已知值（可能陈旧），在有界时间内返回，
///   从不长阻塞
/// - `write` 发后即忘，失败视为瞬态
/// - `close` 幂等，重复调用无害
pub trait Link {
    /// 注册一个命名变量及其缺省值
    fn declare(&mut self, name: &str, var_type: VarType, default: VarValue)
    -> Result<(), LinkError>;

    /// 打开通道；必须先于任何读写
    fn start(&mut self) -> Result<(), LinkError>;

    /// 取变量的最近已知值
    fn read(&mut self, name: &str) -> Result<VarValue, LinkError>;

    /// 发布一个变量值（fire-and-forget）
    fn write(&mut self, name: &str, value: VarValue) -> Result<(), LinkError>;

    /// 释放通道（幂等）
    fn close(&mut self) -> Result<(), LinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_value_display() {
        assert_eq!(VarValue::Float(1.5).to_string(), "1.5");
        assert_eq!(VarValue::Text("[24,0,0]".into()).to_string(), "[24,0,0]");
    }

    #[test]
    fn test_var_value_accessors() {
        assert_eq!(VarValue::Float(2.0).as_float(), Some(2.0));
        assert_eq!(VarValue::Float(2.0).as_text(), None);
        assert_eq!(VarValue::Text("x".into()).as_text(), Some("x"));
        assert_eq!(VarValue::Text("x".into()).var_type(), VarType::Text);
    }
}
