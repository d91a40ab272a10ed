// 录制与回放
// JSON 录制文件逐帧保存骨骼关节与设备事件，回放时在手动时钟上驱动 InputManager

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use log::{debug, info};

use crate::core::error::{InputError, Result};
use crate::core::math::Vector3;
use crate::core::time::ManualClock;
use crate::gesture::synthetic::{interleave, linear_path};
use crate::gesture::{JointFrame, JointId, TrackingState};
use crate::input::{InputCommand, InputDevice, InputEvent, InputManager};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub frames: Vec<RecordedFrame>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// 相对录制起点的毫秒数
    pub t_ms: u64,
    /// 从本帧起切换活跃设备
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<InputDevice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joints: Vec<RecordedJoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<InputEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedJoint {
    pub joint: JointId,
    pub position: [f32; 3],
    #[serde(default = "tracked")]
    pub state: TrackingState,
}

fn tracked() -> TrackingState {
    TrackingState::Tracked
}

impl RecordedFrame {
    // 没有关节数据的帧不提交骨骼快照
    pub fn joint_frame(&self) -> Option<JointFrame> {
        if self.joints.is_empty() {
            return None;
        }

        let mut frame = JointFrame::new();
        for joint in &self.joints {
            frame.set(joint.joint, Vector3::from_array(joint.position), joint.state);
        }
        Some(frame)
    }
}

impl Recording {
    pub fn from_json(content: &str) -> Result<Self> {
        let recording: Recording = serde_json::from_str(content)?;
        recording.validate()?;
        Ok(recording)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let recording = Self::from_json(&content)?;
        info!("加载录制文件: {:?} ({} 帧)", path, recording.frames.len());
        Ok(recording)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        debug!("录制已保存到: {:?}", path);
        Ok(())
    }

    // 帧时间必须单调不减
    pub fn validate(&self) -> Result<()> {
        for pair in self.frames.windows(2) {
            if pair[1].t_ms < pair[0].t_ms {
                return Err(crate::input_error!(
                    InvalidInput,
                    "录制帧时间倒退: {}ms -> {}ms",
                    pair[0].t_ms,
                    pair[1].t_ms
                ));
            }
        }
        Ok(())
    }

    // 由带时间戳的骨骼帧构建录制，只保留已跟踪关节
    pub fn from_joint_frames(origin: Instant, frames: &[(Instant, JointFrame)]) -> Self {
        let frames = frames
            .iter()
            .map(|(timestamp, frame)| RecordedFrame {
                t_ms: round_millis(timestamp.saturating_duration_since(origin)),
                device: None,
                joints: JointId::ALL
                    .iter()
                    .filter_map(|&joint| {
                        frame.tracked_position(joint).map(|p| RecordedJoint {
                            joint,
                            position: p.to_array(),
                            state: TrackingState::Tracked,
                        })
                    })
                    .collect(),
                events: Vec::new(),
            })
            .collect();

        Self { frames }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.frames.last().map_or(0, |f| f.t_ms))
    }
}

fn round_millis(duration: Duration) -> u64 {
    ((duration.as_nanos() + 500_000) / 1_000_000) as u64
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    pub allow_reset: bool,
    pub allow_edit: bool,
}

// 产生命令的一帧
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayStep {
    pub t_ms: u64,
    pub commands: Vec<InputCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<[f32; 2]>,
}

pub fn replay(
    manager: &mut InputManager,
    recording: &Recording,
    options: ReplayOptions,
) -> Result<Vec<ReplayStep>> {
    recording.validate()?;

    let clock = ManualClock::new();
    let mut steps = Vec::new();

    for frame in &recording.frames {
        clock.set_elapsed(Duration::from_millis(frame.t_ms));
        let now = clock.now();

        if let Some(device) = frame.device {
            manager.set_active_device(device);
        }
        for event in &frame.events {
            manager.handle_event(event, now);
        }
        if let Some(joints) = frame.joint_frame() {
            manager.submit_joint_frame(joints);
        }

        if manager.update(now, options.allow_reset, options.allow_edit)? {
            steps.push(ReplayStep {
                t_ms: frame.t_ms,
                commands: manager.commands().to_vec(),
                pointer: manager.pointer().map(|p| p.to_array()),
            });
        }
    }

    info!(
        "回放完成: {} 帧, {} 帧产生命令",
        recording.frames.len(),
        steps.len()
    );
    Ok(steps)
}

// 演示录制：右手横扫、前推，左右脚踝交替抬起，低头
pub fn demo_recording() -> Recording {
    let origin = Instant::now();
    let at = |ms: u64| origin + Duration::from_millis(ms);
    let second = Duration::from_millis(1000);

    let mut hand = linear_path(
        at(0),
        Vector3::new(0.0, 0.1, 2.0),
        Vector3::new(0.7, 0.1, 2.0),
        second,
        20,
    );
    hand.extend(linear_path(
        at(1300),
        Vector3::new(0.0, 0.1, 2.0),
        Vector3::new(0.0, 0.1, 1.5),
        second,
        20,
    ));

    let lift = Duration::from_millis(300);
    let left_ankle = linear_path(
        at(3000),
        Vector3::new(-0.1, -0.80, 2.0),
        Vector3::new(-0.1, -0.74, 2.0),
        lift,
        10,
    );
    let right_ankle = linear_path(
        at(3400),
        Vector3::new(0.1, -0.80, 2.0),
        Vector3::new(0.1, -0.74, 2.0),
        lift,
        10,
    );

    let head = linear_path(
        at(4200),
        Vector3::new(0.0, 0.50, 2.2),
        Vector3::new(0.0, 0.13, 2.2),
        second,
        20,
    );

    let frames = interleave(&[
        (JointId::HandRight, &hand),
        (JointId::AnkleLeft, &left_ankle),
        (JointId::AnkleRight, &right_ankle),
        (JointId::Head, &head),
    ]);

    let mut recording = Recording::from_joint_frames(origin, &frames);
    if let Some(first) = recording.frames.first_mut() {
        first.device = Some(InputDevice::MotionSensor);
    }
    recording
}
