// 体感输入库入口
// 骨骼关节帧 -> 手势检测器 -> 手势管理器 -> 输入管理器 -> 离散命令
// 键盘、手柄、触摸与体感传感器共用同一套命令词汇

pub mod core;
pub mod gesture;
pub mod input;
pub mod replay;

// 重新导出核心类型
pub use crate::core::{ConfigManager, InputConfig, InputError, Result};
pub use gesture::{GestureKind, GestureManager, JointFrame, JointId};
pub use input::{InputCommand, InputDevice, InputEvent, InputManager};

// 版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "kinetic-input";

// 初始化日志；可重复调用
pub fn init() -> Result<()> {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("kinetic_input=info"),
    )
    .try_init();

    log::info!("体感输入库初始化完成 v{}", VERSION);
    Ok(())
}

pub fn cleanup() {
    log::info!("清理输入资源");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_init() {
        assert!(init().is_ok());
        assert!(init().is_ok());
        cleanup();
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "kinetic-input");
    }
}
