use serde::{Deserialize, Serialize};

use unlock_core::geometry::Rect;

/// Default pond width in logical units.
pub const POND_WIDTH: f32 = 384.0;
/// Default pond height in logical units.
pub const POND_HEIGHT: f32 = 288.0;
/// Lane tops as a fraction of pond height.
pub const LANES: [f32; 3] = [0.32, 0.52, 0.70];
pub const FISH_COUNT: usize = 4;
pub const FISH_WIDTH: f32 = 70.0;
pub const FISH_HEIGHT: f32 = 36.0;
/// Fish wrap this far outside the pond edges.
const OFFSCREEN_MARGIN: f32 = 20.0;
/// Hook head hitbox edge length.
pub const HOOK_SIZE: f32 = 32.0;
/// Top of the hook head while resting.
pub const HOOK_REST_Y: f32 = 43.0;
/// Full left-right-left sway cycle (seconds).
pub const SWAY_PERIOD: f32 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwimDirection {
    Left,
    Right,
}

/// One fish looping across a lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fish {
    pub lane: usize,
    /// Seconds before the fish first enters.
    pub delay: f32,
    /// Seconds to cross the pond once.
    pub lap_secs: f32,
    pub direction: SwimDirection,
}

/// Logical pond layout. All hit-testing happens in these coordinates, so the
/// outcome does not depend on how large the pond is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pond {
    pub width: f32,
    pub height: f32,
    /// Hook sway amplitude as a fraction of half the pond width.
    pub sway: f32,
    pub fish: Vec<Fish>,
}

impl Pond {
    pub fn new(width: f32, height: f32, sway: f32) -> Self {
        let fish = (0..FISH_COUNT)
            .map(|i| Fish {
                lane: i % LANES.len(),
                delay: i as f32 * 0.6,
                lap_secs: 6.5 + (i % 2) as f32 * 0.8,
                direction: if i % 2 == 0 {
                    SwimDirection::Right
                } else {
                    SwimDirection::Left
                },
            })
            .collect();
        Self {
            width,
            height,
            sway,
            fish,
        }
    }

    fn fish_x(&self, fish: &Fish, t: f32) -> f32 {
        let start = -FISH_WIDTH - OFFSCREEN_MARGIN;
        let end = self.width + FISH_WIDTH + OFFSCREEN_MARGIN;
        let span = end - start;
        let entry = match fish.direction {
            SwimDirection::Right => start,
            SwimDirection::Left => end,
        };
        if t < fish.delay {
            return entry;
        }
        let frac = ((t - fish.delay) / fish.lap_secs).fract();
        match fish.direction {
            SwimDirection::Right => start + span * frac,
            SwimDirection::Left => end - span * frac,
        }
    }

    /// Hitbox of fish `index` at time `t`.
    pub fn fish_rect(&self, index: usize, t: f32) -> Option<Rect> {
        let fish = self.fish.get(index)?;
        let top = LANES.get(fish.lane).copied().unwrap_or(LANES[0]) * self.height;
        Some(Rect::new(
            self.fish_x(fish, t),
            top,
            FISH_WIDTH,
            FISH_HEIGHT,
        ))
    }

    /// Horizontal hook offset from the pond center at time `t`.
    pub fn hook_offset(&self, t: f32) -> f32 {
        let amplitude = self.sway * self.width * 0.5;
        if amplitude <= 0.0 {
            return 0.0;
        }
        let u = (t / SWAY_PERIOD).fract() * 2.0;
        if u < 1.0 {
            -amplitude + 2.0 * amplitude * ease_in_out(u)
        } else {
            amplitude - 2.0 * amplitude * ease_in_out(u - 1.0)
        }
    }

    /// Hook head hitbox for a given offset and drop distance.
    pub fn hook_rect(&self, offset: f32, drop: f32) -> Rect {
        Rect::new(
            self.width * 0.5 + offset - HOOK_SIZE * 0.5,
            HOOK_REST_Y + drop,
            HOOK_SIZE,
            HOOK_SIZE,
        )
    }

    /// Index of the first fish touching the padded hook at time `t`.
    pub fn catch_at(&self, t: f32, offset: f32, drop: f32, padding: f32) -> Option<usize> {
        let hook = self.hook_rect(offset, drop).expand(padding);
        (0..self.fish.len()).find(|&i| {
            self.fish_rect(i, t)
                .is_some_and(|fish| hook.touches(&fish))
        })
    }
}

fn ease_in_out(u: f32) -> f32 {
    let u = u.clamp(0.0, 1.0);
    u * u * (3.0 - 2.0 * u)
}
