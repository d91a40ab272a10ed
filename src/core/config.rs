/*
* 输入配置管理：
* 1. 手势检测器参数表（关节、模式、阈值、时长窗口、容量、冷却）
* 2. 轮询设备的防抖间隔、指针映射范围、触摸识别阈值、手柄死区
* 3. 命令绑定表，顺序即同一帧内命令的输出顺序
* 4. TOML 文件加载、保存、校验与热重载
*/

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use log::{debug, info};

use crate::core::error::{InputError, Result};
use crate::gesture::{GestureSettings, JointId};
use crate::input::touch::TouchConfig;
use crate::input::{default_bindings, CommandBinding, InputBinding, InputCommand};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub gestures: GestureSettings,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub pointer: PointerConfig,
    #[serde(default)]
    pub touch: TouchConfig,
    #[serde(default = "default_gamepad_deadzone")]
    pub gamepad_deadzone: f32,
    #[serde(default = "default_bindings")]
    pub bindings: Vec<CommandBinding>,
}

fn default_gamepad_deadzone() -> f32 {
    0.15
}

// 键盘/手柄/触摸两次读取之间的最短间隔
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    pub poll_delay_ms: u64,
}

impl PollingConfig {
    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { poll_delay_ms: 150 }
    }
}

// 体感指针：把某个关节在传感器空间中的可达范围映射到归一化屏幕坐标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerConfig {
    pub joint: JointId,
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            joint: JointId::HandRight,
            min_x: -0.5,
            max_x: 0.5,
            min_y: -0.2,
            max_y: 0.6,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            gestures: GestureSettings::default(),
            polling: PollingConfig::default(),
            pointer: PointerConfig::default(),
            touch: TouchConfig::default(),
            gamepad_deadzone: default_gamepad_deadzone(),
            bindings: default_bindings(),
        }
    }
}

pub struct ConfigManager {
    config: InputConfig,
    config_path: PathBuf,
    last_modified: SystemTime,
}

impl ConfigManager {
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let config = Self::load_from_file(&config_path)?;
        let last_modified = fs::metadata(&config_path)
            .and_then(|m| m.modified())
            .unwrap_or_else(|_| SystemTime::now());

        Ok(Self {
            config,
            config_path,
            last_modified,
        })
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn update_config<F>(&mut self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut InputConfig),
    {
        let mut updated = self.config.clone();
        updater(&mut updated);
        Self::validate_config(&updated)?;

        self.config = updated;
        Self::save_config_to_file(&self.config, &self.config_path)?;
        info!("配置已更新并保存");
        Ok(())
    }

    // 文件比上次加载新时重新读取
    pub fn check_reload(&mut self) -> Result<bool> {
        let modified = fs::metadata(&self.config_path)?.modified()?;

        if modified > self.last_modified {
            info!("检测到配置文件更改，重新加载");
            self.config = Self::load_from_file(&self.config_path)?;
            self.last_modified = modified;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn load_from_file(path: &Path) -> Result<InputConfig> {
        if !path.exists() {
            info!("配置文件不存在，创建默认配置: {:?}", path);
            let default_config = InputConfig::default();
            Self::save_config_to_file(&default_config, path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)?;
        let config: InputConfig = toml::from_str(&content)
            .map_err(|e| InputError::ConfigError(format!("解析配置文件失败: {}", e)))?;

        Self::validate_config(&config)?;
        info!("成功加载配置文件: {:?}", path);
        Ok(config)
    }

    pub fn save_config_to_file(config: &InputConfig, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(config)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, content)?;
        debug!("配置已保存到: {:?}", path);
        Ok(())
    }

    pub fn validate_config(config: &InputConfig) -> Result<()> {
        config.gestures.validate()?;

        let pointer = &config.pointer;
        if !(pointer.min_x < pointer.max_x) || !(pointer.min_y < pointer.max_y) {
            return Err(InputError::ConfigError("指针映射范围无效".to_string()));
        }

        if !(0.0..0.9).contains(&config.gamepad_deadzone) {
            return Err(InputError::ConfigError("手柄死区必须在0.0-0.9之间".to_string()));
        }

        let touch = &config.touch;
        if !(touch.tap_max_distance > 0.0) || !(touch.flick_min_distance > touch.tap_max_distance) {
            return Err(InputError::ConfigError("触摸距离阈值无效".to_string()));
        }
        if touch.tap_max_duration_ms >= touch.long_press_duration_ms {
            return Err(InputError::ConfigError("点击时长必须短于长按时长".to_string()));
        }

        for binding in &config.bindings {
            if binding.command == InputCommand::None {
                return Err(InputError::ConfigError("不能绑定 None 命令".to_string()));
            }
            if binding.inputs.is_empty() || binding.inputs.iter().any(is_empty_combination) {
                return Err(crate::input_error!(
                    ConfigError,
                    "命令 {:?} 的绑定为空",
                    binding.command
                ));
            }
        }

        Ok(())
    }
}

fn is_empty_combination(binding: &InputBinding) -> bool {
    match binding {
        InputBinding::Combination(inner) => {
            inner.is_empty() || inner.iter().any(is_empty_combination)
        }
        _ => false,
    }
}
