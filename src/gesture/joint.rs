// 骨骼关节帧
// 外部骨骼跟踪每帧提供一次快照，核心只读取其中状态为 Tracked 的关节

use serde::{Deserialize, Serialize};

use crate::core::math::Vector3;

pub const JOINT_COUNT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointId {
    HipCenter,
    Spine,
    ShoulderCenter,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
}

impl JointId {
    pub const ALL: [JointId; JOINT_COUNT] = [
        JointId::HipCenter,
        JointId::Spine,
        JointId::ShoulderCenter,
        JointId::Head,
        JointId::ShoulderLeft,
        JointId::ElbowLeft,
        JointId::WristLeft,
        JointId::HandLeft,
        JointId::ShoulderRight,
        JointId::ElbowRight,
        JointId::WristRight,
        JointId::HandRight,
        JointId::HipLeft,
        JointId::KneeLeft,
        JointId::AnkleLeft,
        JointId::FootLeft,
        JointId::HipRight,
        JointId::KneeRight,
        JointId::AnkleRight,
        JointId::FootRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackingState {
    #[default]
    NotTracked,
    Inferred,
    Tracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointData {
    pub position: Vector3,
    pub state: TrackingState,
}

// 单帧骨骼快照，按 JointId 下标存放
#[derive(Debug, Clone, PartialEq)]
pub struct JointFrame {
    joints: [JointData; JOINT_COUNT],
}

impl JointFrame {
    pub fn new() -> Self {
        Self {
            joints: [JointData::default(); JOINT_COUNT],
        }
    }

    pub fn set(&mut self, joint: JointId, position: Vector3, state: TrackingState) {
        self.joints[joint.index()] = JointData { position, state };
    }

    pub fn with_tracked(mut self, joint: JointId, position: Vector3) -> Self {
        self.set(joint, position, TrackingState::Tracked);
        self
    }

    pub fn get(&self, joint: JointId) -> JointData {
        self.joints[joint.index()]
    }

    // Inferred 与 NotTracked 均视为不可用
    pub fn tracked_position(&self, joint: JointId) -> Option<Vector3> {
        let data = self.get(joint);
        (data.state == TrackingState::Tracked).then_some(data.position)
    }

    pub fn tracked_count(&self) -> usize {
        self.joints
            .iter()
            .filter(|j| j.state == TrackingState::Tracked)
            .count()
    }
}

impl Default for JointFrame {
    fn default() -> Self {
        Self::new()
    }
}
