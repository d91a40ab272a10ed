// 采样点与有界滚动历史
// 历史按时间顺序保存，长度不超过容量，超出时淘汰最旧的采样

use std::collections::VecDeque;
use std::time::Instant;

use crate::core::math::Vector3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSample {
    pub position: Vector3,
    pub timestamp: Instant,
}

impl GestureSample {
    pub fn new(position: Vector3, timestamp: Instant) -> Self {
        Self { position, timestamp }
    }
}

#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<GestureSample>,
    capacity: usize,
}

impl SampleHistory {
    // capacity 必须大于0，由调用方保证
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: GestureSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&GestureSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureSample> {
        self.samples.iter()
    }

    // 连续切片视图，供扫描按下标访问
    pub fn as_slice(&mut self) -> &[GestureSample] {
        self.samples.make_contiguous()
    }
}
