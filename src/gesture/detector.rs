// 手势检测器
// 一个检测器跟踪一个关节，每次 add 后在滚动历史上执行一次线性窗口扫描
// 检测到手势后进入待确认状态，reset 之前 add 不再生效

use std::time::{Duration, Instant};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::joint::JointId;
use super::sample::{GestureSample, SampleHistory};
use super::GestureKind;
use crate::core::error::{InputError, Result};
use crate::core::math::{Axis, Vector3};
use crate::core::time::millis;

// 模式族：共用同一扫描算法，主轴与侧向约束轴不同
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    HorizontalSwipe,
    VerticalSwipe,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Positive,
    Negative,
}

impl PatternKind {
    pub fn primary_axis(self) -> Axis {
        match self {
            PatternKind::HorizontalSwipe => Axis::X,
            PatternKind::VerticalSwipe => Axis::Y,
            PatternKind::Push => Axis::Z,
        }
    }

    pub fn lateral_axes(self) -> &'static [Axis] {
        match self {
            PatternKind::HorizontalSwipe => &[Axis::Y],
            PatternKind::VerticalSwipe => &[Axis::X],
            PatternKind::Push => &[Axis::X, Axis::Y],
        }
    }

    // 扫描顺序即优先级：右先于左，上先于下
    fn candidates(self) -> &'static [(Sign, GestureKind)] {
        match self {
            PatternKind::HorizontalSwipe => &[
                (Sign::Positive, GestureKind::SwipeRight),
                (Sign::Negative, GestureKind::SwipeLeft),
            ],
            PatternKind::VerticalSwipe => &[
                (Sign::Positive, GestureKind::SwipeUp),
                (Sign::Negative, GestureKind::SwipeDown),
            ],
            // 朝向传感器即深度减小
            PatternKind::Push => &[(Sign::Negative, GestureKind::Push)],
        }
    }
}

// 主轴上两个方向各自的开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionFilter {
    pub positive: bool,
    pub negative: bool,
}

impl DirectionFilter {
    pub fn both() -> Self {
        Self { positive: true, negative: true }
    }

    pub fn positive_only() -> Self {
        Self { positive: true, negative: false }
    }

    pub fn negative_only() -> Self {
        Self { positive: false, negative: true }
    }

    fn allows(&self, sign: Sign) -> bool {
        match sign {
            Sign::Positive => self.positive,
            Sign::Negative => self.negative,
        }
    }
}

impl Default for DirectionFilter {
    fn default() -> Self {
        Self::both()
    }
}

// 单个检测器的参数表项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub joint: JointId,
    pub pattern: PatternKind,
    /// 主轴上的最小净位移
    pub min_length: f32,
    /// 每条侧向轴相对首个采样的最大漂移
    pub max_deviation: f32,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    /// 滚动历史容量
    pub capacity: usize,
    /// 两次确认手势之间的最短间隔
    pub cooldown_ms: u64,
    /// 相邻采样在主轴上允许的反向抖动
    #[serde(default = "default_direction_tolerance")]
    pub direction_tolerance: f32,
    #[serde(default)]
    pub directions: DirectionFilter,
}

fn default_direction_tolerance() -> f32 {
    0.01
}

impl DetectorConfig {
    pub fn horizontal_swipe(joint: JointId) -> Self {
        Self {
            joint,
            pattern: PatternKind::HorizontalSwipe,
            min_length: 0.65,
            max_deviation: 0.10,
            min_duration_ms: 600,
            max_duration_ms: 1800,
            capacity: 60,
            cooldown_ms: 500,
            direction_tolerance: default_direction_tolerance(),
            directions: DirectionFilter::both(),
        }
    }

    pub fn push(joint: JointId) -> Self {
        Self {
            joint,
            pattern: PatternKind::Push,
            min_length: 0.42,
            max_deviation: 0.21,
            min_duration_ms: 350,
            max_duration_ms: 3000,
            capacity: 90,
            cooldown_ms: 500,
            direction_tolerance: default_direction_tolerance(),
            directions: DirectionFilter::negative_only(),
        }
    }

    // 脚踝只报告抬起
    pub fn ankle_lift(joint: JointId) -> Self {
        Self {
            joint,
            pattern: PatternKind::VerticalSwipe,
            min_length: 0.035,
            max_deviation: 0.3,
            min_duration_ms: 100,
            max_duration_ms: 2000,
            capacity: 60,
            cooldown_ms: 0,
            direction_tolerance: default_direction_tolerance(),
            directions: DirectionFilter::positive_only(),
        }
    }

    pub fn head_posture() -> Self {
        Self {
            joint: JointId::Head,
            pattern: PatternKind::VerticalSwipe,
            min_length: 0.35,
            max_deviation: 0.2,
            min_duration_ms: 400,
            max_duration_ms: 1800,
            capacity: 60,
            cooldown_ms: 500,
            direction_tolerance: default_direction_tolerance(),
            directions: DirectionFilter::both(),
        }
    }

    pub fn min_duration(&self) -> Duration {
        Duration::from_millis(self.min_duration_ms)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(InputError::InvalidCapacity(self.capacity));
        }
        if !(self.min_length > 0.0) {
            return Err(crate::input_error!(
                ConfigError,
                "{:?} 最小位移必须为正: {}",
                self.joint,
                self.min_length
            ));
        }
        if !(self.max_deviation > 0.0) {
            return Err(crate::input_error!(
                ConfigError,
                "{:?} 最大侧向漂移必须为正: {}",
                self.joint,
                self.max_deviation
            ));
        }
        if !(self.direction_tolerance >= 0.0) {
            return Err(crate::input_error!(
                ConfigError,
                "{:?} 方向容差不能为负: {}",
                self.joint,
                self.direction_tolerance
            ));
        }
        if self.min_duration_ms > self.max_duration_ms {
            return Err(crate::input_error!(
                ConfigError,
                "{:?} 时长窗口无效: [{}ms, {}ms]",
                self.joint,
                self.min_duration_ms,
                self.max_duration_ms
            ));
        }
        let enabled = self
            .pattern
            .candidates()
            .iter()
            .any(|(sign, _)| self.directions.allows(*sign));
        if !enabled {
            return Err(crate::input_error!(
                ConfigError,
                "{:?} {:?} 没有启用任何方向",
                self.joint,
                self.pattern
            ));
        }
        Ok(())
    }
}

// add 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    // 已有待确认手势，采样被忽略
    Ignored,
    NoMatch,
    Confirmed(GestureKind),
    // 模式成立但仍在冷却期内
    Suppressed(GestureKind),
}

pub struct GestureDetector {
    config: DetectorConfig,
    history: SampleHistory,
    pending: Option<GestureKind>,
    last_fire: Option<Instant>,
}

impl GestureDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            history: SampleHistory::with_capacity(config.capacity),
            config,
            pending: None,
            last_fire: None,
        })
    }

    pub fn joint(&self) -> JointId {
        self.config.joint
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    pub fn pending(&self) -> Option<GestureKind> {
        self.pending
    }

    pub fn add(&mut self, position: Vector3, now: Instant) -> Result<ScanOutcome> {
        if self.pending.is_some() {
            return Ok(ScanOutcome::Ignored);
        }

        self.check_timestamp(now)?;
        self.history.push(GestureSample::new(position, now));

        let matched = {
            let samples = self.history.as_slice();
            self.config
                .pattern
                .candidates()
                .iter()
                .filter(|(sign, _)| self.config.directions.allows(*sign))
                .find(|(sign, _)| scan(samples, &self.config, *sign))
                .map(|(_, kind)| *kind)
        };

        Ok(match matched {
            Some(kind) => self.gesture_found(kind, now),
            None => ScanOutcome::NoMatch,
        })
    }

    // 不修改状态，只检查 now 是否早于最后一个采样
    pub fn check_timestamp(&self, now: Instant) -> Result<()> {
        match self.history.last() {
            Some(last) if now < last.timestamp => Err(InputError::NonMonotonicTimestamp {
                joint: self.config.joint,
                regression_ms: millis(last.timestamp - now),
            }),
            _ => Ok(()),
        }
    }

    // 冷却期只在两次确认之间生效，reset 不会清除
    fn gesture_found(&mut self, kind: GestureKind, now: Instant) -> ScanOutcome {
        if let Some(last) = self.last_fire {
            if now.saturating_duration_since(last) < self.config.cooldown() {
                debug!("冷却期内丢弃手势: {:?} {:?}", self.config.joint, kind);
                self.history.clear();
                return ScanOutcome::Suppressed(kind);
            }
        }

        debug!("检测到手势: {:?} {:?}", self.config.joint, kind);
        self.pending = Some(kind);
        self.last_fire = Some(now);
        ScanOutcome::Confirmed(kind)
    }

    pub fn reset(&mut self) {
        trace!("重置检测器: {:?}", self.config.joint);
        self.history.clear();
        self.pending = None;
    }
}

// 窗口重置扫描：窗口起点只在失效时前移，首个满足时长窗口的匹配即成功
fn scan(samples: &[GestureSample], config: &DetectorConfig, sign: Sign) -> bool {
    let primary = config.pattern.primary_axis();
    let lateral = config.pattern.lateral_axes();
    let first = match samples.first() {
        Some(sample) => sample.position,
        None => return false,
    };

    let mut start = 0;
    for i in 1..samples.len().saturating_sub(1) {
        let current = samples[i].position;

        let within_lateral = lateral
            .iter()
            .all(|axis| axis.delta(first, current).abs() < config.max_deviation);

        let step = primary.delta(current, samples[i + 1].position);
        let keeps_direction = match sign {
            Sign::Positive => step > -config.direction_tolerance,
            Sign::Negative => step < config.direction_tolerance,
        };

        if !within_lateral || !keeps_direction {
            start = i;
        }

        // 净位移必须朝候选方向
        let travel = primary.delta(samples[start].position, current);
        let signed_travel = match sign {
            Sign::Positive => travel,
            Sign::Negative => -travel,
        };
        if signed_travel > config.min_length {
            let elapsed = samples[i]
                .timestamp
                .saturating_duration_since(samples[start].timestamp);
            if elapsed >= config.min_duration() && elapsed <= config.max_duration() {
                return true;
            }
        }
    }

    false
}
