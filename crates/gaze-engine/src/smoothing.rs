//! Moving-average filter over successive gaze predictions

use crate::types::Point2;
use std::collections::VecDeque;

/// Fixed-window moving average. No outlier rejection: one wild prediction
/// shifts the output for at most `capacity` frames.
#[derive(Debug, Clone)]
pub struct GazeSmoother {
    buffer: VecDeque<Point2>,
    capacity: usize,
}

impl GazeSmoother {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, point: Point2) {
        self.buffer.push_back(point);
        if self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }

    /// Mean of the buffered points, or the origin when empty
    pub fn current(&self) -> Point2 {
        if self.buffer.is_empty() {
            return Point2::ORIGIN;
        }
        let n = self.buffer.len() as f64;
        let (sx, sy) = self
            .buffer
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2::new(sx / n, sy / n)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for GazeSmoother {
    fn default() -> Self {
        Self::new(20)
    }
}
