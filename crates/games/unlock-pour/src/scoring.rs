use serde::{Deserialize, Serialize};

/// Error at or below this many percentage points grades as "Perfect".
pub const PERFECT_ERROR: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PourSide {
    Under,
    Over,
    Exact,
}

impl PourSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Under => "under",
            Self::Over => "over",
            Self::Exact => "exact",
        }
    }
}

/// Outcome of judging a released pour against the target line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PourGrade {
    /// Absolute distance from the target, in percentage points.
    pub error: f32,
    pub side: PourSide,
    pub within: bool,
}

impl PourGrade {
    pub fn label(&self) -> &'static str {
        if self.error <= PERFECT_ERROR {
            "Perfect"
        } else {
            "Close"
        }
    }
}

/// Judge a fill level (0..=100) against `target ± tolerance`. Both band
/// edges count as inside.
pub fn grade_pour(fill: f32, target: f32, tolerance: f32) -> PourGrade {
    let diff = fill - target;
    let side = if diff < 0.0 {
        PourSide::Under
    } else if diff > 0.0 {
        PourSide::Over
    } else {
        PourSide::Exact
    };
    PourGrade {
        error: diff.abs(),
        side,
        within: diff.abs() <= tolerance,
    }
}

/// Convert a legacy fractional band (`min`/`max` in 0..=1) into a percentage
/// target and tolerance.
pub fn band_from_fractions(min: f32, max: f32) -> (f32, f32) {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let lo = lo.clamp(0.0, 1.0) * 100.0;
    let hi = hi.clamp(0.0, 1.0) * 100.0;
    ((lo + hi) * 0.5, (hi - lo) * 0.5)
}
