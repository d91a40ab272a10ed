// 手势管理器
// 按注册顺序驱动检测器，把原始手势翻译为语义手势并放入 FIFO 队列
// 脚踝抬起不直接入队，而是两脚交替时按间隔融合为 Jump 或 Run

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::detector::{DetectorConfig, GestureDetector, ScanOutcome};
use super::joint::{JointFrame, JointId};
use super::GestureKind;
use crate::core::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegFusionConfig {
    pub jump_time_limit_ms: u64,
    pub run_time_limit_ms: u64,
}

impl Default for LegFusionConfig {
    fn default() -> Self {
        Self {
            jump_time_limit_ms: 90,
            run_time_limit_ms: 800,
        }
    }
}

// 检测器参数表，顺序即注册顺序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSettings {
    pub detectors: Vec<DetectorConfig>,
    #[serde(default)]
    pub leg_fusion: LegFusionConfig,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            detectors: vec![
                DetectorConfig::horizontal_swipe(JointId::HandRight),
                DetectorConfig::push(JointId::HandRight),
                DetectorConfig::ankle_lift(JointId::AnkleLeft),
                DetectorConfig::ankle_lift(JointId::AnkleRight),
                DetectorConfig::head_posture(),
            ],
            leg_fusion: LegFusionConfig::default(),
        }
    }
}

impl GestureSettings {
    pub fn validate(&self) -> Result<()> {
        for detector in &self.detectors {
            detector.validate()?;
        }
        if self.leg_fusion.jump_time_limit_ms > self.leg_fusion.run_time_limit_ms {
            return Err(crate::input_error!(
                ConfigError,
                "跳跃时限 {}ms 不能大于奔跑时限 {}ms",
                self.leg_fusion.jump_time_limit_ms,
                self.leg_fusion.run_time_limit_ms
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegSide {
    Left,
    Right,
}

impl LegSide {
    pub fn from_joint(joint: JointId) -> Option<Self> {
        match joint {
            JointId::AnkleLeft => Some(LegSide::Left),
            JointId::AnkleRight => Some(LegSide::Right),
            _ => None,
        }
    }
}

// 左右脚抬起融合
// 只在交替的第二次抬起时产生事件；无论是否产生事件，每次都以本次抬起重新播种
#[derive(Debug, Clone)]
pub struct LegFusion {
    jump_time_limit: Duration,
    run_time_limit: Duration,
    last_lift: Option<(LegSide, Instant)>,
}

impl LegFusion {
    pub fn new(config: &LegFusionConfig) -> Self {
        Self {
            jump_time_limit: Duration::from_millis(config.jump_time_limit_ms),
            run_time_limit: Duration::from_millis(config.run_time_limit_ms),
            last_lift: None,
        }
    }

    pub fn on_lift(&mut self, side: LegSide, now: Instant) -> Option<GestureKind> {
        let fused = match self.last_lift {
            Some((last_side, last_time)) if last_side != side => {
                let dt = now.saturating_duration_since(last_time);
                if dt < self.jump_time_limit {
                    Some(GestureKind::Jump)
                } else if dt < self.run_time_limit {
                    Some(GestureKind::Run)
                } else {
                    None
                }
            }
            _ => None,
        };

        self.last_lift = Some((side, now));
        fused
    }

    pub fn reset(&mut self) {
        self.last_lift = None;
    }
}

// 检测统计，用于调参与日志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureStats {
    pub confirmed: u64,
    pub suppressed: u64,
    pub jumps: u64,
    pub runs: u64,
    pub unfused_lifts: u64,
}

pub struct GestureManager {
    settings: GestureSettings,
    detectors: Vec<GestureDetector>,
    queue: VecDeque<GestureKind>,
    leg_fusion: LegFusion,
    stats: GestureStats,
}

impl GestureManager {
    pub fn new(settings: GestureSettings) -> Result<Self> {
        settings.validate()?;
        let detectors = Self::build_detectors(&settings)?;
        info!("手势管理器初始化: {} 个检测器", detectors.len());

        Ok(Self {
            leg_fusion: LegFusion::new(&settings.leg_fusion),
            settings,
            detectors,
            queue: VecDeque::new(),
            stats: GestureStats::default(),
        })
    }

    fn build_detectors(settings: &GestureSettings) -> Result<Vec<GestureDetector>> {
        settings
            .detectors
            .iter()
            .cloned()
            .map(GestureDetector::new)
            .collect()
    }

    // 每帧调用一次；未跟踪的关节本帧跳过
    // 任一检测器时间戳倒退时整帧拒绝，队列与检测器状态保持不变
    pub fn update(&mut self, frame: &JointFrame, now: Instant) -> Result<()> {
        for detector in &self.detectors {
            if frame.tracked_position(detector.joint()).is_some() {
                detector.check_timestamp(now)?;
            }
        }

        for detector in &mut self.detectors {
            let joint = detector.joint();
            let Some(position) = frame.tracked_position(joint) else {
                continue;
            };

            if let ScanOutcome::Suppressed(_) = detector.add(position, now)? {
                self.stats.suppressed += 1;
            }

            let Some(kind) = detector.pending() else {
                continue;
            };
            self.stats.confirmed += 1;

            if let Some(side) = LegSide::from_joint(joint) {
                match self.leg_fusion.on_lift(side, now) {
                    Some(fused) => {
                        debug!("腿部融合: {:?} 抬起 -> {:?}", side, fused);
                        match fused {
                            GestureKind::Jump => self.stats.jumps += 1,
                            _ => self.stats.runs += 1,
                        }
                        self.queue.push_back(fused);
                    }
                    None => self.stats.unfused_lifts += 1,
                }
            } else if joint == JointId::Head {
                self.queue.push_back(head_posture(kind));
            } else {
                self.queue.push_back(kind);
            }

            detector.reset();
        }

        Ok(())
    }

    pub fn next_detected_gesture(&mut self) -> Option<GestureKind> {
        self.queue.pop_front()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    // 关卡切换时丢弃进行中的窗口与未读队列
    pub fn reset_gestures(&mut self) {
        info!("重置手势状态，丢弃 {} 个未读手势", self.queue.len());
        self.queue.clear();
        self.leg_fusion.reset();
        for detector in &mut self.detectors {
            detector.reset();
        }
    }

    // 替换参数表并重建检测器；新表无效时保持原状态
    pub fn reset_player_settings(&mut self, settings: GestureSettings) -> Result<()> {
        settings.validate()?;
        let detectors = Self::build_detectors(&settings)?;

        self.detectors = detectors;
        self.leg_fusion = LegFusion::new(&settings.leg_fusion);
        self.settings = settings;
        self.queue.clear();
        info!("已应用玩家手势参数: {} 个检测器", self.detectors.len());
        Ok(())
    }

    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    pub fn detectors(&self) -> &[GestureDetector] {
        &self.detectors
    }

    pub fn stats(&self) -> GestureStats {
        self.stats
    }
}

fn head_posture(kind: GestureKind) -> GestureKind {
    match kind {
        GestureKind::SwipeDown => GestureKind::Crouch,
        GestureKind::SwipeUp => GestureKind::Stand,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::InputError;
    use crate::core::math::{Axis, Vector3};
    use crate::gesture::sample::GestureSample;
    use crate::gesture::synthetic::{interleave, linear_path, with_jitter};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn run_frames(manager: &mut GestureManager, frames: &[(Instant, JointFrame)]) {
        for (now, frame) in frames {
            manager.update(frame, *now).unwrap();
        }
    }

    fn drain(manager: &mut GestureManager) -> Vec<GestureKind> {
        std::iter::from_fn(|| manager.next_detected_gesture()).collect()
    }

    fn ankle_lift(origin: Instant) -> Vec<GestureSample> {
        linear_path(
            origin,
            Vector3::new(0.1, -0.80, 2.0),
            Vector3::new(0.1, -0.75, 2.0),
            ms(300),
            10,
        )
    }

    #[test]
    fn test_leg_fusion_timing() {
        let origin = Instant::now();
        let config = LegFusionConfig::default();

        let mut fusion = LegFusion::new(&config);
        assert_eq!(fusion.on_lift(LegSide::Left, origin), None);
        assert_eq!(fusion.on_lift(LegSide::Right, origin + ms(50)), Some(GestureKind::Jump));

        let mut fusion = LegFusion::new(&config);
        fusion.on_lift(LegSide::Left, origin);
        assert_eq!(fusion.on_lift(LegSide::Right, origin + ms(400)), Some(GestureKind::Run));

        let mut fusion = LegFusion::new(&config);
        fusion.on_lift(LegSide::Left, origin);
        assert_eq!(fusion.on_lift(LegSide::Right, origin + ms(2000)), None);
    }

    #[test]
    fn test_same_leg_never_fuses() {
        let origin = Instant::now();
        let mut fusion = LegFusion::new(&LegFusionConfig::default());

        for dt in [0u64, 30, 80, 400, 2000] {
            fusion.on_lift(LegSide::Right, origin);
            assert_eq!(fusion.on_lift(LegSide::Right, origin + ms(dt)), None);
            fusion.reset();
        }
    }

    #[test]
    fn test_three_same_ankle_lifts_produce_nothing() {
        // 每次抬起都重新播种，连续同侧抬起不会产生事件
        let origin = Instant::now();
        let mut fusion = LegFusion::new(&LegFusionConfig::default());

        assert_eq!(fusion.on_lift(LegSide::Left, origin), None);
        assert_eq!(fusion.on_lift(LegSide::Left, origin + ms(300)), None);
        assert_eq!(fusion.on_lift(LegSide::Left, origin + ms(600)), None);

        // 之后的异侧抬起按最近一次同侧抬起计时
        assert_eq!(fusion.on_lift(LegSide::Right, origin + ms(650)), Some(GestureKind::Jump));
    }

    #[test]
    fn test_fusion_reseeds_after_unfused_lift() {
        let origin = Instant::now();
        let mut fusion = LegFusion::new(&LegFusionConfig::default());

        fusion.on_lift(LegSide::Left, origin);
        assert_eq!(fusion.on_lift(LegSide::Right, origin + ms(3000)), None);
        assert_eq!(fusion.on_lift(LegSide::Left, origin + ms(3500)), Some(GestureKind::Run));
    }

    #[test]
    fn test_alternating_ankles_make_jump() {
        let mut manager = GestureManager::new(GestureSettings::default()).unwrap();
        let origin = Instant::now();
        let left = ankle_lift(origin);
        let right = ankle_lift(origin + ms(50));

        run_frames(
            &mut manager,
            &interleave(&[(JointId::AnkleLeft, &left), (JointId::AnkleRight, &right)]),
        );

        assert_eq!(drain(&mut manager), vec![GestureKind::Jump]);
        assert_eq!(manager.stats().jumps, 1);
        assert_eq!(manager.stats().unfused_lifts, 1);
    }

    #[test]
    fn test_alternating_ankles_make_run() {
        let mut manager = GestureManager::new(GestureSettings::default()).unwrap();
        let origin = Instant::now();
        let left = ankle_lift(origin);
        let right = ankle_lift(origin + ms(400));

        run_frames(
            &mut manager,
            &interleave(&[(JointId::AnkleLeft, &left), (JointId::AnkleRight, &right)]),
        );

        assert_eq!(drain(&mut manager), vec![GestureKind::Run]);
    }

    #[test]
    fn test_regressed_frame_is_rejected_whole() {
        let mut manager = GestureManager::new(GestureSettings::default()).unwrap();
        let origin = Instant::now();
        let hand = linear_path(origin, Vector3::new(0.0, 0.0, 2.0), Vector3::new(0.70, 0.0, 2.0), ms(1000), 20);
        let frames = interleave(&[(JointId::HandRight, &hand)]);
        run_frames(&mut manager, &frames[..20]);

        let head = Vector3::new(0.0, 0.5, 2.2);
        manager
            .update(&JointFrame::new().with_tracked(JointId::Head, head), origin + ms(2000))
            .unwrap();

        // 右手本帧会完成横扫，但头部时间戳倒退
        let (last_time, last_frame) = &frames[20];
        let mixed = last_frame.clone().with_tracked(JointId::Head, head);
        let err = manager.update(&mixed, *last_time).unwrap_err();
        assert!(matches!(
            err,
            InputError::NonMonotonicTimestamp { joint: JointId::Head, .. }
        ));
        assert_eq!(manager.queued(), 0);
        assert_eq!(manager.detectors()[0].history().len(), 20);

        manager.update(last_frame, *last_time).unwrap();
        assert_eq!(drain(&mut manager), vec![GestureKind::SwipeRight]);
    }

    #[test]
    fn test_lowering_feet_never_fuse() {
        let mut manager = GestureManager::new(GestureSettings::default()).unwrap();
        let origin = Instant::now();
        let lower = |start: Instant| {
            linear_path(
                start,
                Vector3::new(0.1, -0.75, 2.0),
                Vector3::new(0.1, -0.80, 2.0),
                ms(300),
                10,
            )
        };
        let left = lower(origin);
        let right = lower(origin + ms(400));

        run_frames(
            &mut manager,
            &interleave(&[(JointId::AnkleLeft, &left), (JointId::AnkleRight, &right)]),
        );

        assert_eq!(drain(&mut manager), Vec::new());
        assert_eq!(manager.stats().confirmed, 0);
    }

    #[test]
    fn test_queue_preserves_registration_order() {
        let settings = GestureSettings {
            detectors: vec![
                DetectorConfig::horizontal_swipe(JointId::HandRight),
                DetectorConfig::horizontal_swipe(JointId::HandLeft),
                DetectorConfig::head_posture(),
            ],
            leg_fusion: LegFusionConfig::default(),
        };
        let mut manager = GestureManager::new(settings).unwrap();
        let origin = Instant::now();

        let right_hand = with_jitter(
            linear_path(origin, Vector3::new(0.0, 0.0, 2.0), Vector3::new(0.70, 0.0, 2.0), ms(1000), 20),
            Axis::Y,
            0.02,
        );
        let left_hand = linear_path(
            origin,
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(-0.70, 0.0, 2.0),
            ms(1000),
            20,
        );
        let head = linear_path(
            origin,
            Vector3::new(0.0, 0.50, 2.2),
            Vector3::new(0.0, 0.13, 2.2),
            ms(1000),
            20,
        );

        let frames = interleave(&[
            (JointId::Head, &head),
            (JointId::HandLeft, &left_hand),
            (JointId::HandRight, &right_hand),
        ]);
        let (last, rest) = frames.split_last().unwrap();
        run_frames(&mut manager, rest);
        assert_eq!(manager.queued(), 0);

        run_frames(&mut manager, std::slice::from_ref(last));
        assert_eq!(manager.queued(), 3);
        assert_eq!(manager.next_detected_gesture(), Some(GestureKind::SwipeRight));
        assert_eq!(manager.next_detected_gesture(), Some(GestureKind::SwipeLeft));
        assert_eq!(manager.next_detected_gesture(), Some(GestureKind::Crouch));
        assert_eq!(manager.next_detected_gesture(), None);
    }

    #[test]
    fn test_head_rise_maps_to_stand() {
        let mut manager = GestureManager::new(GestureSettings::default()).unwrap();
        let head = linear_path(
            Instant::now(),
            Vector3::new(0.0, 0.0, 2.2),
            Vector3::new(0.0, 0.5, 2.2),
            ms(1000),
            20,
        );
        run_frames(&mut manager, &interleave(&[(JointId::Head, &head)]));

        assert_eq!(drain(&mut manager), vec![GestureKind::Stand]);
    }

    #[test]
    fn test_detectors_rearm_after_each_gesture() {
        let mut manager = GestureManager::new(GestureSettings::default()).unwrap();
        let origin = Instant::now();
        let first = linear_path(origin, Vector3::new(0.0, 0.0, 2.0), Vector3::new(0.70, 0.0, 2.0), ms(1000), 20);
        let second = linear_path(
            origin + ms(1600),
            Vector3::new(0.70, 0.0, 2.0),
            Vector3::new(0.0, 0.0, 2.0),
            ms(1000),
            20,
        );

        run_frames(&mut manager, &interleave(&[(JointId::HandRight, &first)]));
        run_frames(&mut manager, &interleave(&[(JointId::HandRight, &second)]));

        assert_eq!(
            drain(&mut manager),
            vec![GestureKind::SwipeRight, GestureKind::SwipeLeft]
        );
        assert!(manager.detectors().iter().all(|d| d.pending().is_none()));
    }

    #[test]
    fn test_untracked_joints_are_skipped() {
        let mut manager = GestureManager::new(GestureSettings::default()).unwrap();
        let origin = Instant::now();

        let mut frame = JointFrame::new();
        frame.set(
            JointId::HandRight,
            Vector3::new(0.0, 0.0, 2.0),
            crate::gesture::TrackingState::Inferred,
        );
        manager.update(&frame, origin).unwrap();

        assert!(manager.detectors().iter().all(|d| d.history().is_empty()));
    }

    #[test]
    fn test_reset_gestures_discards_in_flight_windows() {
        let mut manager = GestureManager::new(GestureSettings::default()).unwrap();
        let origin = Instant::now();
        let path = linear_path(origin, Vector3::new(0.0, 0.0, 2.0), Vector3::new(0.70, 0.0, 2.0), ms(1000), 20);
        let frames = interleave(&[(JointId::HandRight, &path)]);

        run_frames(&mut manager, &frames[..15]);
        manager.reset_gestures();
        run_frames(&mut manager, &frames[15..]);

        assert_eq!(manager.next_detected_gesture(), None);
    }

    #[test]
    fn test_reset_player_settings() {
        let mut manager = GestureManager::new(GestureSettings::default()).unwrap();

        let mut settings = GestureSettings::default();
        settings.detectors.truncate(1);
        manager.reset_player_settings(settings).unwrap();
        assert_eq!(manager.detectors().len(), 1);

        let mut invalid = GestureSettings::default();
        invalid.leg_fusion.jump_time_limit_ms = 1000;
        assert!(manager.reset_player_settings(invalid).is_err());
        assert_eq!(manager.detectors().len(), 1);
    }
}
