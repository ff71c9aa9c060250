use serde::{Deserialize, Serialize};

use unlock_core::geometry::point_to_segment_distance;

/// The scratch-off cover, tracked only at sample points on a `stride` grid.
///
/// Coverage is judged on the grid rather than every pixel, so storing the
/// grid alone gives the same answer at a fraction of the cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverMask {
    pub width: f32,
    pub height: f32,
    pub stride: f32,
    cols: usize,
    rows: usize,
    cleared: Vec<bool>,
    cleared_count: usize,
}

impl CoverMask {
    pub fn new(width: f32, height: f32, stride: f32) -> Self {
        let cols = (width / stride).ceil().max(1.0) as usize;
        let rows = (height / stride).ceil().max(1.0) as usize;
        Self {
            width,
            height,
            stride,
            cols,
            rows,
            cleared: vec![false; cols * rows],
            cleared_count: 0,
        }
    }

    /// Grid size `new` would allocate for these dimensions.
    pub fn sample_count(width: f32, height: f32, stride: f32) -> f64 {
        let cols = (f64::from(width) / f64::from(stride)).ceil().max(1.0);
        let rows = (f64::from(height) / f64::from(stride)).ceil().max(1.0);
        cols * rows
    }

    pub fn total_samples(&self) -> usize {
        self.cleared.len()
    }

    pub fn cleared_samples(&self) -> usize {
        self.cleared_count
    }

    /// Fraction of sample points scratched away, 0.0..=1.0.
    pub fn cleared_fraction(&self) -> f32 {
        self.cleared_count as f32 / self.cleared.len() as f32
    }

    pub fn is_cleared_at(&self, x: f32, y: f32) -> bool {
        if x < 0.0 || y < 0.0 {
            return false;
        }
        let col = (x / self.stride).round() as usize;
        let row = (y / self.stride).round() as usize;
        col < self.cols && row < self.rows && self.cleared[row * self.cols + col]
    }

    /// Erase a disc of `radius` around (x, y). Returns newly cleared samples.
    pub fn dab(&mut self, x: f32, y: f32, radius: f32) -> usize {
        self.stroke(x, y, x, y, radius)
    }

    /// Erase a round-capped line of half-width `radius`. Returns newly
    /// cleared samples.
    pub fn stroke(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) -> usize {
        let min_x = x1.min(x2) - radius;
        let max_x = x1.max(x2) + radius;
        let min_y = y1.min(y2) - radius;
        let max_y = y1.max(y2) + radius;

        let Some((c0, c1)) = self.index_range(min_x, max_x, self.cols) else {
            return 0;
        };
        let Some((r0, r1)) = self.index_range(min_y, max_y, self.rows) else {
            return 0;
        };

        let mut newly = 0;
        for row in r0..=r1 {
            let sy = row as f32 * self.stride;
            for col in c0..=c1 {
                let idx = row * self.cols + col;
                if self.cleared[idx] {
                    continue;
                }
                let sx = col as f32 * self.stride;
                if point_to_segment_distance(sx, sy, x1, y1, x2, y2) <= radius {
                    self.cleared[idx] = true;
                    newly += 1;
                }
            }
        }
        self.cleared_count += newly;
        newly
    }

    /// Sample indices whose coordinate lies in [lo, hi], clamped to the grid.
    fn index_range(&self, lo: f32, hi: f32, count: usize) -> Option<(usize, usize)> {
        if hi < 0.0 {
            return None;
        }
        let first = (lo.max(0.0) / self.stride).ceil() as usize;
        let last = ((hi / self.stride).floor() as usize).min(count - 1);
        (first <= last).then_some((first, last))
    }
}
