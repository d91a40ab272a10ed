// 数学工具
// 关节坐标为传感器空间：X 向右，Y 向上，Z 为到传感器的深度

use serde::{Deserialize, Serialize};

pub use glam::{Vec2 as Vector2, Vec3 as Vector3};

// 坐标轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn component(self, v: Vector3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    // 沿该轴从 from 到 to 的有符号位移
    pub fn delta(self, from: Vector3, to: Vector3) -> f32 {
        self.component(to) - self.component(from)
    }
}

// 把 value 从 [min, max] 线性映射到 [0, 1] 并截断
pub fn normalize_into(value: f32, min: f32, max: f32) -> f32 {
    let span = max - min;
    if span.abs() <= f32::EPSILON {
        return 0.5;
    }
    ((value - min) / span).clamp(0.0, 1.0)
}
