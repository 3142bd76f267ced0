//! 进程内链路（测试用）
//!
//! 和 UDP 实现共享同一份 `Link` 契约；测试端拿一个克隆的句柄就能
//! 注入外部变量、断言写出历史、检查关闭次数。

use crate::{Link, LinkError, VarType, VarValue};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Inner {
    started: bool,
    close_count: usize,
    types: HashMap<String, VarType>,
    values: HashMap<String, VarValue>,
    /// 全部写出的历史（按时间顺序）
    writes: Vec<(String, VarValue)>,
}

/// 进程内命名变量通道
///
/// 克隆的是同一份底层状态，测试端与被测端各持一个句柄。
#[derive(Debug, Clone, Default)]
pub struct MemoryLink {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 测试端注入：模拟对端发来一个变量值
    pub fn inject(&self, name: &str, value: VarValue) {
        self.inner.lock().values.insert(name.to_string(), value);
    }

    /// 写出历史的一份拷贝
    pub fn writes(&self) -> Vec<(String, VarValue)> {
        self.inner.lock().writes.clone()
    }

    /// 最后一次对某变量的写出
    pub fn last_write(&self, name: &str) -> Option<VarValue> {
        self.inner
            .lock()
            .writes
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn close_count(&self) -> usize {
        self.inner.lock().close_count
    }

    pub fn is_started(&self) -> bool {
        self.inner.lock().started
    }
}

impl Link for MemoryLink {
    fn declare(
        &mut self,
        name: &str,
        var_type: VarType,
        default: VarValue,
    ) -> Result<(), LinkError> {
        if default.var_type() != var_type {
            return Err(LinkError::TypeMismatch {
                name: name.to_string(),
                expected: var_type,
            });
        }
        let mut inner = self.inner.lock();
        inner.types.insert(name.to_string(), var_type);
        inner.values.entry(name.to_string()).or_insert(default);
        Ok(())
    }

    fn start(&mut self) -> Result<(), LinkError> {
        self.inner.lock().started = true;
        Ok(())
    }

    fn read(&mut self, name: &str) -> Result<VarValue, LinkError> {
        let inner = self.inner.lock();
        if !inner.started {
            return Err(LinkError::NotStarted);
        }
        inner
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| LinkError::UnknownVariable {
                name: name.to_string(),
            })
    }

    fn write(&mut self, name: &str, value: VarValue) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        if !inner.started {
            return Err(LinkError::NotStarted);
        }
        let Some(&expected) = inner.types.get(name) else {
            return Err(LinkError::UnknownVariable {
                name: name.to_string(),
            });
        };
        if value.var_type() != expected {
            return Err(LinkError::TypeMismatch {
                name: name.to_string(),
                expected,
            });
        }
        inner.values.insert(name.to_string(), value.clone());
        inner.writes.push((name.to_string(), value));
        Ok(())
    }

    fn close(&mut self) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        if inner.started {
            inner.started = false;
        }
        inner.close_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_read_write_cycle() {
        let mut link = MemoryLink::new();
        link.declare("left_speed", VarType::Float, VarValue::Float(0.0)).unwrap();
        link.start().unwrap();

        assert_eq!(link.read("left_speed").unwrap(), VarValue::Float(0.0));
        link.write("left_speed", VarValue::Float(6.0)).unwrap();
        assert_eq!(link.last_write("left_speed"), Some(VarValue::Float(6.0)));
    }

    #[test]
    fn test_inject_simulates_remote_peer() {
        let mut link = MemoryLink::new();
        link.declare("stopinput", VarType::Text, VarValue::Text(String::new())).unwrap();
        link.start().unwrap();

        let handle = link.clone();
        handle.inject("stopinput", VarValue::Text("[24,0,0]".into()));
        assert_eq!(link.read("stopinput").unwrap(), VarValue::Text("[24,0,0]".into()));
    }

    #[test]
    fn test_write_type_checked() {
        let mut link = MemoryLink::new();
        link.declare("left_speed", VarType::Float, VarValue::Float(0.0)).unwrap();
        link.start().unwrap();
        assert!(matches!(
            link.write("left_speed", VarValue::Text("fast".into())),
            Err(LinkError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_close_counts_every_call() {
        let mut link = MemoryLink::new();
        link.start().unwrap();
        link.close().unwrap();
        link.close().unwrap();
        assert_eq!(link.close_count(), 2);
        assert!(!link.is_started());
    }
}
