// 时间系统模块
// 采样时间戳与冷却、融合窗口都基于单调时钟 Instant
// 测试与回放使用手动时钟，实时运行直接传入 Instant::now()

use std::cell::Cell;
use std::time::{Duration, Instant};

// 手动时钟：起点固定，偏移量由调用方推进
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
        }
    }

    pub fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    pub fn advance(&self, delta: Duration) {
        self.offset.set(self.offset.get() + delta);
    }

    // 只能向前设置，倒退时保持不变
    pub fn set_elapsed(&self, elapsed: Duration) {
        if elapsed >= self.offset.get() {
            self.offset.set(elapsed);
        }
    }

    pub fn at_millis(&self, ms: u64) -> Instant {
        self.origin + Duration::from_millis(ms)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

pub fn millis(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}

// 时间工具函数
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let milliseconds = duration.subsec_millis();

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.advance(Duration::from_millis(150));
        assert_eq!(clock.now() - start, Duration::from_millis(150));

        clock.set_elapsed(Duration::from_millis(100));
        assert_eq!(clock.elapsed(), Duration::from_millis(150));

        clock.set_elapsed(Duration::from_millis(400));
        assert_eq!(clock.now(), clock.at_millis(400));
    }

    #[test]
    fn test_millis() {
        assert_eq!(millis(Duration::from_micros(1_500)), 1);
        assert_eq!(millis(Duration::from_secs(2)), 2000);
    }

    #[test]
    fn test_format_duration() {
        let duration = Duration::from_millis(125500);
        assert_eq!(format_duration(duration), "02:05.500");
    }
}
