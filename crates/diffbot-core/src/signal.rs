//! 停止信号解析与上升沿检测
//!
//! 传输通道里的 `stopinput` 是字符串编码的数值向量（如 `"[24,0,0]"`），
//! 首元素是触发电平。这里用严格的模式解析（只接受 `[f, f, ...]`），
//! 拒绝任何表达式求值；解析失败一律按"低电平"处理（fail-open），
//! 绝不会因为坏数据误触发序列或锁定。

use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

/// 信号解析错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignalError {
    /// 载荷为空
    #[error("Empty stop payload")]
    Empty,

    /// 缺少 `[` / `]` 包围
    #[error("Stop payload is not a bracketed vector: {0:?}")]
    NotAVector(String),

    /// 某个元素不是数值
    #[error("Non-numeric element {element:?} in stop payload")]
    NonNumeric { element: String },
}

/// 严格解析字符串编码的数值向量
///
/// 只接受 `[f, f, ...]` 形式（允许空白），其它一概拒绝。
///
/// # 错误
///
/// - `SignalError::Empty`: 空字符串（通道尚未收到任何值时的缺省）
/// - `SignalError::NotAVector`: 缺少方括号
/// - `SignalError::NonNumeric`: 元素无法按 f64 解析
pub fn parse_stop_vector(raw: &str) -> Result<Vec<f64>, SignalError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SignalError::Empty);
    }
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| SignalError::NotAVector(trimmed.to_string()))?;

    let inner = inner.trim();
    if inner.is_empty() {
        // "[]" 是合法的空向量
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|element| {
            let element = element.trim();
            element.parse::<f64>().map_err(|_| SignalError::NonNumeric {
                element: element.to_string(),
            })
        })
        .collect()
}

/// 一次采样的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSample {
    /// 当前电平（首元素 >= 阈值）
    pub high: bool,
    /// 本 tick 是否接受了一个上升沿
    pub rising: bool,
}

/// 去抖动上升沿检测器
///
/// 电平判定：向量首元素 `>= threshold` 为高。上升沿只有在距上一个
/// **被接受的**沿至少 `debounce` 时才被接受，借此抑制信号抖动。
#[derive(Debug)]
pub struct EdgeDetector {
    threshold: f64,
    debounce: Duration,
    prev_high: bool,
    last_edge: Option<Instant>,
    /// 最近一次告警过的坏载荷，避免同一条坏数据刷屏
    last_bad_payload: Option<String>,
}

impl EdgeDetector {
    pub fn new(threshold: f64, debounce: Duration) -> Self {
        Self {
            threshold,
            debounce,
            prev_high: false,
            last_edge: None,
            last_bad_payload: None,
        }
    }

    /// 解析原始载荷并更新边沿状态
    ///
    /// 解析失败按低电平处理（可恢复事件，仅记日志），因此坏数据
    /// 永远不会伪造一个上升沿。`prev_high` 每次采样都更新；
    /// `last_edge` 只在沿被接受时更新。
    pub fn sample(&mut self, raw: &str, now: Instant) -> EdgeSample {
        let high = match parse_stop_vector(raw) {
            Ok(vector) => {
                self.last_bad_payload = None;
                vector.first().is_some_and(|&v| v >= self.threshold)
            }
            Err(err) => {
                // 同一条坏载荷只告警一次
                if self.last_bad_payload.as_deref() != Some(raw) {
                    warn!(payload = raw, error = %err, "Unparseable stop payload, treating as low");
                    self.last_bad_payload = Some(raw.to_string());
                }
                false
            }
        };

        let debounced = match self.last_edge {
            None => true,
            Some(last) => now.duration_since(last) >= self.debounce,
        };
        let rising = high && !self.prev_high && debounced;

        self.prev_high = high;
        if rising {
            self.last_edge = Some(now);
        }

        EdgeSample { high, rising }
    }
}
