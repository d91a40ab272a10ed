// 输入管理系统
// 把四类设备统一为离散命令：键盘/手柄/触摸按固定间隔轮询，体感传感器逐帧送入手势管理器
// 每次 update 先清空命令列表，再由当前活跃设备填充

pub mod gamepad;
pub mod keyboard;
pub mod touch;

pub use gamepad::{GamepadAxis, GamepadButton, GamepadId, GamepadManager};
pub use keyboard::{KeyCode, KeyState, KeyboardManager};
pub use touch::{FlickDirection, TouchConfig, TouchGesture, TouchId, TouchManager};

use crate::core::config::{InputConfig, PointerConfig};
use crate::core::math::{normalize_into, Vector2};
use crate::core::{ConfigManager, Result};
use crate::gesture::{GestureKind, GestureManager, JointFrame};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::Instant;
use log::{debug, info, trace};

// 离散输入命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputCommand {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
    Jump,
    Stand,
    Crouch,
    Run,
    Select,
    SelectAt,
    Pause,
    Exit,
    NextPage,
    PreviousPage,
    Place,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputDevice {
    #[default]
    Keyboard,
    Gamepad,
    Touch,
    MotionSensor,
}

// 输入事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyPressed { key: KeyCode, repeat: bool },
    KeyReleased { key: KeyCode },
    GamepadConnected { gamepad_id: GamepadId, name: String },
    GamepadDisconnected { gamepad_id: GamepadId },
    GamepadButtonPressed { gamepad_id: GamepadId, button: GamepadButton },
    GamepadButtonReleased { gamepad_id: GamepadId, button: GamepadButton },
    GamepadAxisChanged { gamepad_id: GamepadId, axis: GamepadAxis, value: f32 },
    TouchStarted { touch_id: TouchId, position: glam::Vec2 },
    TouchMoved { touch_id: TouchId, position: glam::Vec2 },
    TouchEnded { touch_id: TouchId, position: glam::Vec2 },
    TouchCancelled { touch_id: TouchId },
}

impl InputEvent {
    pub fn device(&self) -> InputDevice {
        match self {
            InputEvent::KeyPressed { .. } | InputEvent::KeyReleased { .. } => InputDevice::Keyboard,
            InputEvent::TouchStarted { .. }
            | InputEvent::TouchMoved { .. }
            | InputEvent::TouchEnded { .. }
            | InputEvent::TouchCancelled { .. } => InputDevice::Touch,
            _ => InputDevice::Gamepad,
        }
    }
}

// 输入绑定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputBinding {
    Key(KeyCode),
    GamepadButton { gamepad_id: Option<GamepadId>, button: GamepadButton },
    GamepadAxis { gamepad_id: Option<GamepadId>, axis: GamepadAxis, threshold: f32 },
    Combination(Vec<InputBinding>), // 组合键
}

// 一个命令及其任一即可触发的绑定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBinding {
    pub command: InputCommand,
    pub inputs: Vec<InputBinding>,
}

impl CommandBinding {
    pub fn new(command: InputCommand, inputs: Vec<InputBinding>) -> Self {
        Self { command, inputs }
    }
}

fn key(code: KeyCode) -> InputBinding {
    InputBinding::Key(code)
}

fn button(button: GamepadButton) -> InputBinding {
    InputBinding::GamepadButton { gamepad_id: None, button }
}

fn stick(axis: GamepadAxis, threshold: f32) -> InputBinding {
    InputBinding::GamepadAxis { gamepad_id: None, axis, threshold }
}

// 默认键位绑定，列表顺序即同帧命令顺序
pub fn default_bindings() -> Vec<CommandBinding> {
    use GamepadAxis::*;
    use InputCommand as C;

    vec![
        CommandBinding::new(C::Up, vec![
            key(KeyCode::Up),
            key(KeyCode::W),
            button(GamepadButton::DPadUp),
            stick(LeftStickY, 0.5),
        ]),
        CommandBinding::new(C::Down, vec![
            key(KeyCode::Down),
            key(KeyCode::S),
            button(GamepadButton::DPadDown),
            stick(LeftStickY, -0.5),
        ]),
        CommandBinding::new(C::Left, vec![
            key(KeyCode::Left),
            key(KeyCode::A),
            button(GamepadButton::DPadLeft),
            stick(LeftStickX, -0.5),
        ]),
        CommandBinding::new(C::Right, vec![
            key(KeyCode::Right),
            key(KeyCode::D),
            button(GamepadButton::DPadRight),
            stick(LeftStickX, 0.5),
        ]),
        // 向上同时产生 Up 与 Jump
        CommandBinding::new(C::Jump, vec![
            key(KeyCode::Up),
            key(KeyCode::W),
            key(KeyCode::Space),
            button(GamepadButton::South),
        ]),
        CommandBinding::new(C::Crouch, vec![
            key(KeyCode::Down),
            key(KeyCode::S),
            button(GamepadButton::DPadDown),
            stick(LeftStickY, -0.5),
        ]),
        CommandBinding::new(C::Run, vec![
            key(KeyCode::LeftShift),
            key(KeyCode::RightShift),
            button(GamepadButton::RightBumper),
        ]),
        CommandBinding::new(C::Select, vec![
            key(KeyCode::Enter),
            button(GamepadButton::East),
        ]),
        CommandBinding::new(C::Pause, vec![
            key(KeyCode::P),
            button(GamepadButton::Start),
        ]),
        CommandBinding::new(C::Exit, vec![
            key(KeyCode::Escape),
            button(GamepadButton::Select),
        ]),
        CommandBinding::new(C::NextPage, vec![
            key(KeyCode::PageDown),
            button(GamepadButton::RightTrigger2),
        ]),
        CommandBinding::new(C::PreviousPage, vec![
            key(KeyCode::PageUp),
            button(GamepadButton::LeftTrigger2),
        ]),
        CommandBinding::new(C::Place, vec![
            key(KeyCode::F),
            InputBinding::Combination(vec![key(KeyCode::LeftControl), key(KeyCode::E)]),
            button(GamepadButton::West),
        ]),
    ]
}

// 体感手势到命令的固定映射
pub fn gesture_command(gesture: GestureKind) -> InputCommand {
    match gesture {
        GestureKind::SwipeLeft => InputCommand::NextPage,
        GestureKind::SwipeRight => InputCommand::PreviousPage,
        GestureKind::SwipeUp => InputCommand::Up,
        GestureKind::SwipeDown => InputCommand::Down,
        GestureKind::Push => InputCommand::SelectAt,
        GestureKind::Crouch => InputCommand::Crouch,
        GestureKind::Stand => InputCommand::Stand,
        GestureKind::Run => InputCommand::Run,
        GestureKind::Jump => InputCommand::Jump,
    }
}

// 主要输入管理器
pub struct InputManager {
    keyboard: KeyboardManager,
    gamepad: GamepadManager,
    touch: TouchManager,
    gestures: GestureManager,

    config: InputConfig,
    active_device: InputDevice,
    commands: SmallVec<[InputCommand; 8]>,

    // 上一次产生命令的轮询时刻
    last_poll: Option<Instant>,
    crouch_held: bool,
    pending_frame: Option<JointFrame>,
    pointer: Option<Vector2>,
}

impl InputManager {
    pub fn new(config: InputConfig) -> Result<Self> {
        ConfigManager::validate_config(&config)?;
        let gestures = GestureManager::new(config.gestures.clone())?;
        info!("输入管理器初始化: {} 条命令绑定", config.bindings.len());

        Ok(Self {
            keyboard: KeyboardManager::new(),
            gamepad: GamepadManager::new(config.gamepad_deadzone),
            touch: TouchManager::new(config.touch.clone()),
            gestures,
            config,
            active_device: InputDevice::default(),
            commands: SmallVec::new(),
            last_poll: None,
            crouch_held: false,
            pending_frame: None,
            pointer: None,
        })
    }

    // 处理输入事件；非活跃设备的事件同样记录状态
    pub fn handle_event(&mut self, event: &InputEvent, now: Instant) {
        match event {
            InputEvent::KeyPressed { key, repeat } => {
                self.keyboard.handle_key_pressed(*key, *repeat);
            }
            InputEvent::KeyReleased { key } => {
                self.keyboard.handle_key_released(*key);
            }
            InputEvent::GamepadConnected { gamepad_id, name } => {
                self.gamepad.add_gamepad(*gamepad_id, name.clone());
            }
            InputEvent::GamepadDisconnected { gamepad_id } => {
                self.gamepad.remove_gamepad(*gamepad_id);
            }
            InputEvent::GamepadButtonPressed { gamepad_id, button } => {
                self.gamepad.handle_button_pressed(*gamepad_id, *button);
            }
            InputEvent::GamepadButtonReleased { gamepad_id, button } => {
                self.gamepad.handle_button_released(*gamepad_id, *button);
            }
            InputEvent::GamepadAxisChanged { gamepad_id, axis, value } => {
                self.gamepad.handle_axis_changed(*gamepad_id, *axis, *value);
            }
            InputEvent::TouchStarted { touch_id, position } => {
                self.touch.handle_touch_started(*touch_id, *position, now);
            }
            InputEvent::TouchMoved { touch_id, position } => {
                self.touch.handle_touch_moved(*touch_id, *position);
            }
            InputEvent::TouchEnded { touch_id, position } => {
                self.touch.handle_touch_ended(*touch_id, *position, now);
            }
            InputEvent::TouchCancelled { touch_id } => {
                self.touch.handle_touch_cancelled(*touch_id);
            }
        }
    }

    // 新帧覆盖尚未消费的旧帧
    pub fn submit_joint_frame(&mut self, frame: JointFrame) {
        self.pending_frame = Some(frame);
    }

    pub fn set_active_device(&mut self, device: InputDevice) {
        if device == self.active_device {
            return;
        }
        info!("活跃输入设备: {:?} -> {:?}", self.active_device, device);

        if device == InputDevice::MotionSensor {
            self.gestures.reset_gestures();
            self.pending_frame = None;
        }
        self.active_device = device;
        self.crouch_held = false;
        self.commands.clear();
    }

    pub fn active_device(&self) -> InputDevice {
        self.active_device
    }

    // 每帧调用一次，返回本帧是否产生了命令
    pub fn update(&mut self, now: Instant, allow_reset: bool, allow_edit: bool) -> Result<bool> {
        self.commands.clear();

        match self.active_device {
            InputDevice::MotionSensor => self.update_motion_sensor(now)?,
            device => self.update_polled(device, now, allow_reset, allow_edit),
        }

        if !self.commands.is_empty() {
            debug!("本帧命令: {:?}", self.commands);
        }
        Ok(!self.commands.is_empty())
    }

    pub fn commands(&self) -> &[InputCommand] {
        &self.commands
    }

    pub fn has_command(&self, command: InputCommand) -> bool {
        self.commands.contains(&command)
    }

    // 归一化屏幕坐标，原点在左上角
    pub fn pointer(&self) -> Option<Vector2> {
        self.pointer
    }

    pub fn gestures(&self) -> &GestureManager {
        &self.gestures
    }

    pub fn gestures_mut(&mut self) -> &mut GestureManager {
        &mut self.gestures
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn reset_gestures(&mut self) {
        self.gestures.reset_gestures();
        self.pending_frame = None;
    }

    pub fn reset(&mut self) {
        self.keyboard.release_all();
        self.gamepad.release_all();
        self.touch.clear();
        self.reset_gestures();
        self.commands.clear();
        self.last_poll = None;
        self.crouch_held = false;
        self.pointer = None;
        debug!("输入状态已重置");
    }

    fn update_motion_sensor(&mut self, now: Instant) -> Result<()> {
        let Some(frame) = self.pending_frame.take() else {
            return Ok(());
        };

        self.gestures.update(&frame, now)?;
        if let Some(pointer) = project_pointer(&self.config.pointer, &frame) {
            self.pointer = Some(pointer);
        }

        while let Some(gesture) = self.gestures.next_detected_gesture() {
            self.commands.push(gesture_command(gesture));
        }
        Ok(())
    }

    fn update_polled(&mut self, device: InputDevice, now: Instant, allow_reset: bool, allow_edit: bool) {
        if let Some(last) = self.last_poll {
            if now.saturating_duration_since(last) < self.config.polling.poll_delay() {
                trace!("轮询间隔未到，跳过");
                return;
            }
        }

        match device {
            InputDevice::Touch => self.poll_touch(allow_edit),
            _ => self.poll_bindings(device, allow_reset, allow_edit),
        }

        if !self.commands.is_empty() {
            self.last_poll = Some(now);
        }
    }

    fn poll_bindings(&mut self, device: InputDevice, allow_reset: bool, allow_edit: bool) {
        let mut crouch_active = false;

        for binding in &self.config.bindings {
            let active = binding
                .inputs
                .iter()
                .any(|input| self.binding_active(input, device));
            if !active {
                continue;
            }

            if binding.command == InputCommand::Crouch {
                crouch_active = true;
            }
            if command_allowed(binding.command, allow_reset, allow_edit)
                && !self.commands.contains(&binding.command)
            {
                self.commands.push(binding.command);
            }
        }

        // 松开下蹲键即站起
        if self.crouch_held && !crouch_active {
            self.commands.push(InputCommand::Stand);
        }
        self.crouch_held = crouch_active;
    }

    fn poll_touch(&mut self, allow_edit: bool) {
        let gestures: SmallVec<[TouchGesture; 4]> = self.touch.drain_gestures().collect();

        for gesture in gestures {
            let command = match gesture {
                TouchGesture::Tap { position } => {
                    self.pointer = Some(position);
                    InputCommand::SelectAt
                }
                TouchGesture::Flick { direction: FlickDirection::Left } => InputCommand::NextPage,
                TouchGesture::Flick { direction: FlickDirection::Right } => InputCommand::PreviousPage,
                TouchGesture::LongPress { position } => {
                    self.pointer = Some(position);
                    if allow_edit {
                        InputCommand::Place
                    } else {
                        InputCommand::Select
                    }
                }
            };
            self.commands.push(command);
        }
    }

    fn binding_active(&self, binding: &InputBinding, device: InputDevice) -> bool {
        match binding {
            InputBinding::Key(key) => {
                device == InputDevice::Keyboard && self.keyboard.is_key_pressed(key)
            }
            InputBinding::GamepadButton { gamepad_id, button } => {
                device == InputDevice::Gamepad && self.gamepad.is_button_pressed(*gamepad_id, button)
            }
            InputBinding::GamepadAxis { gamepad_id, axis, threshold } => {
                if device != InputDevice::Gamepad {
                    return false;
                }
                let value = self.gamepad.get_axis_value(*gamepad_id, axis);
                if threshold.is_sign_positive() {
                    value >= *threshold
                } else {
                    value <= *threshold
                }
            }
            // 组合键：所有绑定都必须激活
            InputBinding::Combination(bindings) => {
                !bindings.is_empty() && bindings.iter().all(|b| self.binding_active(b, device))
            }
        }
    }
}

fn command_allowed(command: InputCommand, allow_reset: bool, allow_edit: bool) -> bool {
    match command {
        InputCommand::Exit => allow_reset,
        InputCommand::Place => allow_edit,
        _ => true,
    }
}

// 传感器 y 轴向上，屏幕 y 轴向下
fn project_pointer(config: &PointerConfig, frame: &JointFrame) -> Option<Vector2> {
    let position = frame.tracked_position(config.joint)?;
    Some(Vector2::new(
        normalize_into(position.x, config.min_x, config.max_x),
        1.0 - normalize_into(position.y, config.min_y, config.max_y),
    ))
}
