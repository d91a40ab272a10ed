// 手势识别系统
// 每个检测器跟踪一个关节的滚动历史并扫描几何/时间模式
// 管理器把原始关节手势翻译为语义手势，并把左右脚踝抬起融合为奔跑/跳跃

pub mod detector;
pub mod joint;
pub mod manager;
pub mod sample;
pub mod synthetic;

pub use detector::{DetectorConfig, DirectionFilter, GestureDetector, PatternKind, ScanOutcome};
pub use joint::{JointData, JointFrame, JointId, TrackingState, JOINT_COUNT};
pub use manager::{
    GestureManager, GestureSettings, GestureStats, LegFusion, LegFusionConfig, LegSide,
};
pub use sample::{GestureSample, SampleHistory};

use serde::{Deserialize, Serialize};

// 原始手势与语义手势
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureKind {
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    Push,
    Crouch,
    Stand,
    Run,
    Jump,
}
