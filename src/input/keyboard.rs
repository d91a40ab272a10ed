// 键盘输入管理
// 只维护按键按下/释放状态，命令映射由 InputManager 的绑定表完成

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use log::debug;

// 键码定义（游戏与编辑器实际使用的子集）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    // 字母键
    A, D, E, F, P, Q, R, S, W,

    // 方向键
    Up, Down, Left, Right,

    // 特殊键
    Escape, Enter, Space, Tab, Backspace,
    PageUp, PageDown,

    // 修饰键
    LeftShift, RightShift, LeftControl, RightControl,

    Unknown(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Released,
    Pressed,
    Repeat,
}

pub struct KeyboardManager {
    key_states: HashMap<KeyCode, KeyState>,
}

impl KeyboardManager {
    pub fn new() -> Self {
        Self {
            key_states: HashMap::new(),
        }
    }

    pub fn handle_key_pressed(&mut self, key: KeyCode, is_repeat: bool) {
        let new_state = if is_repeat {
            KeyState::Repeat
        } else {
            KeyState::Pressed
        };
        self.key_states.insert(key, new_state);
        debug!("键盘按下: {:?} (重复: {})", key, is_repeat);
    }

    pub fn handle_key_released(&mut self, key: KeyCode) {
        self.key_states.insert(key, KeyState::Released);
        debug!("键盘释放: {:?}", key);
    }

    pub fn is_key_pressed(&self, key: &KeyCode) -> bool {
        matches!(
            self.key_states.get(key),
            Some(KeyState::Pressed) | Some(KeyState::Repeat)
        )
    }

    // 失去焦点或重置时释放所有按键
    pub fn release_all(&mut self) {
        self.key_states.clear();
    }
}

impl Default for KeyboardManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_release() {
        let mut keyboard = KeyboardManager::new();

        assert!(!keyboard.is_key_pressed(&KeyCode::Space));

        keyboard.handle_key_pressed(KeyCode::Space, false);
        assert!(keyboard.is_key_pressed(&KeyCode::Space));

        keyboard.handle_key_released(KeyCode::Space);
        assert!(!keyboard.is_key_pressed(&KeyCode::Space));
    }

    #[test]
    fn test_repeat_counts_as_held() {
        let mut keyboard = KeyboardManager::new();

        keyboard.handle_key_pressed(KeyCode::Right, false);
        keyboard.handle_key_pressed(KeyCode::Right, true);
        assert!(keyboard.is_key_pressed(&KeyCode::Right));

        keyboard.handle_key_released(KeyCode::Right);
        assert!(!keyboard.is_key_pressed(&KeyCode::Right));
    }

    #[test]
    fn test_release_all() {
        let mut keyboard = KeyboardManager::new();
        keyboard.handle_key_pressed(KeyCode::A, false);
        keyboard.handle_key_pressed(KeyCode::D, false);

        keyboard.release_all();
        assert!(!keyboard.is_key_pressed(&KeyCode::A));
        assert!(!keyboard.is_key_pressed(&KeyCode::D));
    }
}
