// 游戏手柄输入管理
// 维护每个已连接手柄的按键与摇杆状态，摇杆值经过死区重映射

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use log::{debug, warn};

pub type GamepadId = u32;

// 手柄按键定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadButton {
    // 面部按键
    South,      // A / X
    East,       // B / Circle
    West,       // X / Square
    North,      // Y / Triangle

    // 肩键
    LeftBumper,
    RightBumper,
    LeftTrigger2,
    RightTrigger2,

    // 中央按键
    Select,     // Back / Share
    Start,

    // 方向键
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadAxis {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
}

#[derive(Debug, Clone, Default)]
pub struct GamepadState {
    pub name: String,
    pub buttons: HashMap<GamepadButton, bool>,
    pub axes: HashMap<GamepadAxis, f32>,
}

pub struct GamepadManager {
    gamepads: HashMap<GamepadId, GamepadState>,
    dead_zone: f32,
}

impl GamepadManager {
    pub fn new(dead_zone: f32) -> Self {
        Self {
            gamepads: HashMap::new(),
            dead_zone: dead_zone.clamp(0.0, 0.9),
        }
    }

    pub fn add_gamepad(&mut self, id: GamepadId, name: String) {
        debug!("手柄连接: ID={} 名称='{}'", id, name);
        self.gamepads.insert(
            id,
            GamepadState {
                name,
                ..Default::default()
            },
        );
    }

    pub fn remove_gamepad(&mut self, id: GamepadId) {
        if self.gamepads.remove(&id).is_some() {
            debug!("手柄断开: ID={}", id);
        }
    }

    pub fn handle_button_pressed(&mut self, id: GamepadId, button: GamepadButton) {
        match self.gamepads.get_mut(&id) {
            Some(gamepad) => {
                gamepad.buttons.insert(button, true);
                debug!("手柄按键按下: ID={} 按键={:?}", id, button);
            }
            None => warn!("未连接的手柄按键事件: ID={}", id),
        }
    }

    pub fn handle_button_released(&mut self, id: GamepadId, button: GamepadButton) {
        if let Some(gamepad) = self.gamepads.get_mut(&id) {
            gamepad.buttons.insert(button, false);
            debug!("手柄按键释放: ID={} 按键={:?}", id, button);
        }
    }

    pub fn handle_axis_changed(&mut self, id: GamepadId, axis: GamepadAxis, value: f32) {
        let processed = self.apply_dead_zone(value);
        match self.gamepads.get_mut(&id) {
            Some(gamepad) => {
                gamepad.axes.insert(axis, processed);
            }
            None => warn!("未连接的手柄摇杆事件: ID={}", id),
        }
    }

    // id 为 None 时任一手柄按下即可
    pub fn is_button_pressed(&self, id: Option<GamepadId>, button: &GamepadButton) -> bool {
        self.select(id)
            .any(|g| g.buttons.get(button).copied().unwrap_or(false))
    }

    // id 为 None 时取绝对值最大的读数
    pub fn get_axis_value(&self, id: Option<GamepadId>, axis: &GamepadAxis) -> f32 {
        self.select(id)
            .map(|g| g.axes.get(axis).copied().unwrap_or(0.0))
            .fold(0.0, |best: f32, v| if v.abs() > best.abs() { v } else { best })
    }

    pub fn connected(&self) -> usize {
        self.gamepads.len()
    }

    pub fn release_all(&mut self) {
        for gamepad in self.gamepads.values_mut() {
            gamepad.buttons.clear();
            gamepad.axes.clear();
        }
    }

    fn select(&self, id: Option<GamepadId>) -> impl Iterator<Item = &GamepadState> {
        self.gamepads
            .iter()
            .filter(move |(gid, _)| id.map_or(true, |wanted| **gid == wanted))
            .map(|(_, g)| g)
    }

    // 死区内归零，死区外重映射到 [0, 1]
    fn apply_dead_zone(&self, value: f32) -> f32 {
        if value.abs() < self.dead_zone {
            0.0
        } else {
            let sign = value.signum();
            sign * ((value.abs() - self.dead_zone) / (1.0 - self.dead_zone)).min(1.0)
        }
    }
}
