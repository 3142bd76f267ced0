//! UDP 命名变量链路
//!
//! 报文格式就是一行 `name=value` 文本，够仿真端用即可——协议设计
//! 明确不在本仓库范围内。socket 设为非阻塞：`read` 先把积压的
//! 报文全部排空（有界操作），再返回目标变量的最近值；`write`
//! 发给最近一次来报的对端（或显式配置的目标地址），发后即忘。

use crate::{Link, LinkError, VarType, VarValue};
use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use tracing::{debug, trace, warn};

/// 单个变量槽
#[derive(Debug, Clone)]
struct Slot {
    var_type: VarType,
    value: VarValue,
}

/// UDP 链路
///
/// # 示例
///
/// ```rust,no_run
/// use diffbot_link::{Link, UdpLink, VarType, VarValue};
///
/// # fn example() -> Result<(), diffbot_link::LinkError> {
/// let mut link = UdpLink::bind("0.0.0.0:8400".parse().unwrap());
/// link.declare("left_speed", VarType::Float, VarValue::Float(0.0))?;
/// link.declare("stopinput", VarType::Text, VarValue::Text(String::new()))?;
/// link.start()?;
/// let raw = link.read("stopinput")?;
/// link.write("left_speed", VarValue::Float(1.5))?;
/// link.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UdpLink {
    bind_addr: SocketAddr,
    /// 显式对端地址；None 时回给最近一次来报的地址
    target: Option<SocketAddr>,
    socket: Option<UdpSocket>,
    peer: Option<SocketAddr>,
    slots: HashMap<String, Slot>,
}

impl UdpLink {
    /// 创建（尚未打开 socket）
    pub fn bind(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            target: None,
            socket: None,
            peer: None,
            slots: HashMap::new(),
        }
    }

    /// 指定固定的发送目标（否则回给最近的对端）
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = Some(target);
        self
    }

    /// 实际绑定到的本地地址（`start()` 之后可用）
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// 把积压的报文全部排空，更新变量槽和对端地址
    ///
    /// 非阻塞 socket 保证这是有界操作：读到 `WouldBlock` 即止。
    fn drain(&mut self) -> Result<(), LinkError> {
        let mut buf = [0u8; 1500];
        loop {
            let (len, from) = {
                let socket = self.socket.as_ref().ok_or(LinkError::NotStarted)?;
                match socket.recv_from(&mut buf) {
                    Ok(received) => received,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                    Err(e) => return Err(LinkError::Io(e)),
                }
            };
            self.peer = Some(from);
            match std::str::from_utf8(&buf[..len]) {
                Ok(text) => self.absorb(text.trim()),
                Err(_) => warn!(%from, "Dropping non-UTF8 datagram"),
            }
        }
    }

    /// 消化一行 `name=value`
    fn absorb(&mut self, line: &str) {
        let Some((name, raw_value)) = line.split_once('=') else {
            warn!(line, "Dropping malformed datagram (expected name=value)");
            return;
        };
        let name = name.trim();
        let raw_value = raw_value.trim();
        let Some(slot) = self.slots.get_mut(name) else {
            // 未声明的变量：不报错，丢弃即可（通道可能被多方共享）
            trace!(name, "Ignoring undeclared variable");
            return;
        };
        match slot.var_type {
            VarType::Float => match raw_value.parse::<f64>() {
                Ok(v) => slot.value = VarValue::Float(v),
                // 坏数据：保留最近的好值
                Err(_) => warn!(name, raw_value, "Non-numeric payload for float variable, keeping last value"),
            },
            VarType::Text => slot.value = VarValue::Text(raw_value.to_string()),
        }
    }
}

impl Link for UdpLink {
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
        self.slots.insert(
            name.to_string(),
            Slot {
                var_type,
                value: default,
            },
        );
        Ok(())
    }

    fn start(&mut self) -> Result<(), LinkError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let socket = UdpSocket::bind(self.bind_addr)?;
        socket.set_nonblocking(true)?;
        debug!(addr = %socket.local_addr()?, "UDP link started");
        self.socket = Some(socket);
        Ok(())
    }

    fn read(&mut self, name: &str) -> Result<VarValue, LinkError> {
        self.drain()?;
        self.slots
            .get(name)
            .map(|slot| slot.value.clone())
            .ok_or_else(|| LinkError::UnknownVariable {
                name: name.to_string(),
            })
    }

    fn write(&mut self, name: &str, value: VarValue) -> Result<(), LinkError> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| LinkError::UnknownVariable {
                name: name.to_string(),
            })?;
        if value.var_type() != slot.var_type {
            return Err(LinkError::TypeMismatch {
                name: name.to_string(),
                expected: slot.var_type,
            });
        }
        slot.value = value.clone();

        let socket = self.socket.as_ref().ok_or(LinkError::NotStarted)?;
        let Some(dest) = self.target.or(self.peer) else {
            // 还没有任何对端：发不出去也不算错（fire-and-forget）
            trace!(name, "No peer yet, write dropped");
            return Ok(());
        };
        socket.send_to(format!("{name}={value}").as_bytes(), dest)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LinkError> {
        if self.socket.take().is_some() {
            debug!("UDP link closed");
        }
        Ok(())
    }
}
