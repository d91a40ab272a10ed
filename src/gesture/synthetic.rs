// 合成关节轨迹
// 单元测试、基准与回放演示用它在没有传感器的情况下驱动检测器

use std::time::{Duration, Instant};

use super::joint::{JointFrame, JointId, TrackingState};
use super::sample::GestureSample;
use crate::core::math::{Axis, Vector3};

// 从 start 到 end 等距采样，共 steps + 1 个
pub fn linear_path(
    origin: Instant,
    start: Vector3,
    end: Vector3,
    duration: Duration,
    steps: usize,
) -> Vec<GestureSample> {
    if steps == 0 {
        return vec![GestureSample::new(start, origin)];
    }

    (0..=steps)
        .map(|k| {
            let t = k as f32 / steps as f32;
            let offset = duration.mul_f64(k as f64 / steps as f64);
            GestureSample::new(start + (end - start) * t, origin + offset)
        })
        .collect()
}

// 在 axis 上交替叠加正负抖动
pub fn with_jitter(mut samples: Vec<GestureSample>, axis: Axis, amplitude: f32) -> Vec<GestureSample> {
    for (k, sample) in samples.iter_mut().enumerate() {
        let offset = if k % 2 == 0 { amplitude } else { -amplitude };
        match axis {
            Axis::X => sample.position.x += offset,
            Axis::Y => sample.position.y += offset,
            Axis::Z => sample.position.z += offset,
        }
    }
    samples
}

// 按时间合并各关节轨迹，同一时间戳的采样落在同一帧，其余关节未跟踪
pub fn interleave(tracks: &[(JointId, &[GestureSample])]) -> Vec<(Instant, JointFrame)> {
    let mut points: Vec<(Instant, JointId, Vector3)> = tracks
        .iter()
        .flat_map(|(joint, samples)| {
            samples
                .iter()
                .map(move |s| (s.timestamp, *joint, s.position))
        })
        .collect();
    points.sort_by_key(|(timestamp, _, _)| *timestamp);

    let mut frames: Vec<(Instant, JointFrame)> = Vec::new();
    for (timestamp, joint, position) in points {
        match frames.last_mut() {
            Some((t, frame)) if *t == timestamp => {
                frame.set(joint, position, TrackingState::Tracked);
            }
            _ => {
                let mut frame = JointFrame::new();
                frame.set(joint, position, TrackingState::Tracked);
                frames.push((timestamp, frame));
            }
        }
    }
    frames
}
