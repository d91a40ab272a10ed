// 核心模块 - 错误处理、配置管理、向量工具、时间源

pub mod config;
pub mod error;
pub mod math;
pub mod time;

// 重新导出核心类型
pub use config::{ConfigManager, InputConfig, PointerConfig, PollingConfig};
pub use error::{InputError, Result};
pub use math::{Axis, Vector2, Vector3};
pub use time::ManualClock;
