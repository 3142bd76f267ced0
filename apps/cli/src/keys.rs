//! 键盘输入源
//!
//! 核心只认识逻辑按键，这里负责把终端事件翻译过去。终端进入 raw
//! 模式以便逐键读取；`drain` 用零超时的 `poll` 把积压事件一次排空，
//! 保证是有界的非阻塞操作。

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use diffbot_core::Key;
use std::io;
use std::time::Duration;

/// 按键事件源
///
/// 每个 tick 调用一次 `drain`，把当前积压的全部按键事件取走。
pub trait KeySource {
    fn drain(&mut self) -> io::Result<Vec<Key>>;
}

/// raw 模式守卫：构造时进入，Drop 时恢复终端
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// 终端键盘源（W/↑ S/↓ A/← D/→ 空格 Q）
pub struct TerminalKeys {
    _guard: RawModeGuard,
}

impl TerminalKeys {
    /// 进入 raw 模式并创建
    ///
    /// raw 模式下 Ctrl+C 不再产生 SIGINT，而是作为按键事件到达，
    /// 这里把它映射为 Quit，走同一条优雅停机路径。
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            _guard: RawModeGuard::enable()?,
        })
    }

    fn map(key: KeyEvent) -> Key {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Key::Quit;
        }
        match key.code {
            KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => Key::Forward,
            KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => Key::Back,
            KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Key::TurnLeft,
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => Key::TurnRight,
            KeyCode::Char(' ') => Key::Stop,
            KeyCode::Char('q') | KeyCode::Char('Q') => Key::Quit,
            _ => Key::Unknown,
        }
    }
}

impl KeySource for TerminalKeys {
    fn drain(&mut self) -> io::Result<Vec<Key>> {
        let mut keys = Vec::new();
        // 零超时 poll：只取已经积压的事件，绝不等待
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                // 只认按下；Release/Repeat 由按下事件覆盖
                if key.kind == KeyEventKind::Press {
                    keys.push(Self::map(key));
                }
            }
        }
        Ok(keys)
    }
}
