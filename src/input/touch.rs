// 触摸输入管理
// 跟踪活跃触摸点，在抬起时识别点击、横向滑动与长按
// 坐标为归一化屏幕坐标 [0, 1]，原点在左上角

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use log::debug;

pub type TouchId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlickDirection {
    Left,
    Right,
}

// 识别出的触摸手势
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchGesture {
    Tap { position: glam::Vec2 },
    LongPress { position: glam::Vec2 },
    Flick { direction: FlickDirection },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchConfig {
    pub tap_max_duration_ms: u64,
    pub tap_max_distance: f32,
    pub long_press_duration_ms: u64,
    pub flick_min_distance: f32,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            tap_max_duration_ms: 250,
            tap_max_distance: 0.02,
            long_press_duration_ms: 800,
            flick_min_distance: 0.15,
        }
    }
}

#[derive(Debug, Clone)]
struct TouchPoint {
    start_position: glam::Vec2,
    position: glam::Vec2,
    start_time: Instant,
}

pub struct TouchManager {
    config: TouchConfig,
    active_touches: HashMap<TouchId, TouchPoint>,
    recognized: VecDeque<TouchGesture>,
}

impl TouchManager {
    pub fn new(config: TouchConfig) -> Self {
        Self {
            config,
            active_touches: HashMap::new(),
            recognized: VecDeque::new(),
        }
    }

    pub fn handle_touch_started(&mut self, id: TouchId, position: glam::Vec2, now: Instant) {
        self.active_touches.insert(
            id,
            TouchPoint {
                start_position: position,
                position,
                start_time: now,
            },
        );
        debug!("触摸开始: ID={} 位置={:?}", id, position);
    }

    pub fn handle_touch_moved(&mut self, id: TouchId, position: glam::Vec2) {
        if let Some(touch) = self.active_touches.get_mut(&id) {
            touch.position = position;
        }
    }

    pub fn handle_touch_ended(&mut self, id: TouchId, position: glam::Vec2, now: Instant) {
        let Some(mut touch) = self.active_touches.remove(&id) else {
            return;
        };
        touch.position = position;

        if let Some(gesture) = self.classify(&touch, now) {
            debug!("触摸手势: ID={} {:?}", id, gesture);
            self.recognized.push_back(gesture);
        }
    }

    pub fn handle_touch_cancelled(&mut self, id: TouchId) {
        self.active_touches.remove(&id);
    }

    pub fn drain_gestures(&mut self) -> impl Iterator<Item = TouchGesture> + '_ {
        self.recognized.drain(..)
    }

    pub fn active_count(&self) -> usize {
        self.active_touches.len()
    }

    pub fn clear(&mut self) {
        self.active_touches.clear();
        self.recognized.clear();
    }

    fn classify(&self, touch: &TouchPoint, now: Instant) -> Option<TouchGesture> {
        let delta = touch.position - touch.start_position;
        let held = now.saturating_duration_since(touch.start_time);

        if delta.x.abs() >= self.config.flick_min_distance && delta.x.abs() > delta.y.abs() {
            let direction = if delta.x < 0.0 {
                FlickDirection::Left
            } else {
                FlickDirection::Right
            };
            return Some(TouchGesture::Flick { direction });
        }

        if delta.length() > self.config.tap_max_distance {
            return None;
        }

        if held <= Duration::from_millis(self.config.tap_max_duration_ms) {
            Some(TouchGesture::Tap { position: touch.position })
        } else if held >= Duration::from_millis(self.config.long_press_duration_ms) {
            Some(TouchGesture::LongPress { position: touch.position })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_tap() {
        let mut touch = TouchManager::new(TouchConfig::default());
        let now = Instant::now();

        touch.handle_touch_started(1, Vec2::new(0.5, 0.5), now);
        assert_eq!(touch.active_count(), 1);
        touch.handle_touch_ended(1, Vec2::new(0.505, 0.5), now + ms(100));

        let gestures: Vec<_> = touch.drain_gestures().collect();
        assert_eq!(
            gestures,
            vec![TouchGesture::Tap { position: Vec2::new(0.505, 0.5) }]
        );
        assert_eq!(touch.active_count(), 0);
    }

    #[test]
    fn test_flick_direction() {
        let mut touch = TouchManager::new(TouchConfig::default());
        let now = Instant::now();

        touch.handle_touch_started(1, Vec2::new(0.8, 0.5), now);
        touch.handle_touch_moved(1, Vec2::new(0.6, 0.52));
        touch.handle_touch_ended(1, Vec2::new(0.4, 0.52), now + ms(200));

        touch.handle_touch_started(2, Vec2::new(0.2, 0.5), now + ms(300));
        touch.handle_touch_ended(2, Vec2::new(0.6, 0.45), now + ms(450));

        let gestures: Vec<_> = touch.drain_gestures().collect();
        assert_eq!(
            gestures,
            vec![
                TouchGesture::Flick { direction: FlickDirection::Left },
                TouchGesture::Flick { direction: FlickDirection::Right },
            ]
        );
    }

    #[test]
    fn test_long_press_and_ambiguous_hold() {
        let mut touch = TouchManager::new(TouchConfig::default());
        let now = Instant::now();

        touch.handle_touch_started(1, Vec2::new(0.3, 0.3), now);
        touch.handle_touch_ended(1, Vec2::new(0.3, 0.3), now + ms(900));

        // 介于点击与长按之间的按住不产生手势
        touch.handle_touch_started(2, Vec2::new(0.3, 0.3), now + ms(1000));
        touch.handle_touch_ended(2, Vec2::new(0.3, 0.3), now + ms(1500));

        let gestures: Vec<_> = touch.drain_gestures().collect();
        assert_eq!(
            gestures,
            vec![TouchGesture::LongPress { position: Vec2::new(0.3, 0.3) }]
        );
    }

    #[test]
    fn test_cancelled_touch_produces_nothing() {
        let mut touch = TouchManager::new(TouchConfig::default());
        let now = Instant::now();

        touch.handle_touch_started(7, Vec2::new(0.1, 0.1), now);
        touch.handle_touch_cancelled(7);
        touch.handle_touch_ended(7, Vec2::new(0.1, 0.1), now + ms(50));

        assert_eq!(touch.drain_gestures().count(), 0);
    }
}
