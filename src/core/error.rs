// 错误处理系统
// 输入核心只在调用方违反契约时返回错误：容量为0、时间戳倒退、阈值配置无效
// 关节未跟踪、冷却期内丢弃、尚未识别到手势都不是错误

use std::io;
use thiserror::Error;

use crate::gesture::JointId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("输入无效: {0}")]
    InvalidInput(String),

    #[error("时间戳倒退: 关节 {joint:?} 回退 {regression_ms}ms")]
    NonMonotonicTimestamp { joint: JointId, regression_ms: u64 },

    #[error("无效的历史容量: {0}")]
    InvalidCapacity(usize),

    #[error("文件错误: {0}")]
    FileError(String),

    #[error("解析错误: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, InputError>;

impl From<io::Error> for InputError {
    fn from(error: io::Error) -> Self {
        InputError::FileError(error.to_string())
    }
}

impl From<serde_json::Error> for InputError {
    fn from(error: serde_json::Error) -> Self {
        InputError::ParseError(error.to_string())
    }
}

impl From<toml::de::Error> for InputError {
    fn from(error: toml::de::Error) -> Self {
        InputError::ConfigError(error.to_string())
    }
}

impl From<toml::ser::Error> for InputError {
    fn from(error: toml::ser::Error) -> Self {
        InputError::ConfigError(error.to_string())
    }
}

// 错误创建辅助宏
#[macro_export]
macro_rules! input_error {
    ($variant:ident, $msg:expr) => {
        $crate::core::InputError::$variant($msg.to_string())
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        $crate::core::InputError::$variant(format!($fmt, $($arg)*))
    };
}
