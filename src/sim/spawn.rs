//! Obstacle spawning
//!
//! Gap height and placement are drawn uniformly; a tiny viewport shrinks
//! the gap range instead of producing a pipe that cannot fit.

use rand::Rng;

use super::state::{Obstacle, Viewport};
use crate::tuning::Tuning;

/// Uniform draw from `[lo, hi]`, collapsing to `lo` for an empty range
fn sample<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

/// Gap range that still leaves the spawn margin above and below
pub fn gap_range(tuning: &Tuning, viewport: Viewport) -> (f32, f32) {
    let available = (viewport.height - 2.0 * tuning.spawn_margin).max(0.0);
    let max_gap = tuning.max_gap.min(available);
    let min_gap = tuning.min_gap.min(max_gap);
    (min_gap, max_gap)
}

/// New obstacle entering at the right edge
pub fn spawn_obstacle<R: Rng>(rng: &mut R, tuning: &Tuning, viewport: Viewport) -> Obstacle {
    let (min_gap, max_gap) = gap_range(tuning, viewport);
    let gap = sample(rng, min_gap, max_gap);

    let min_top = tuning.spawn_margin;
    let max_top = viewport.height - gap - tuning.spawn_margin;
    let top = sample(rng, min_top, max_top);

    Obstacle::new(viewport.width, top, tuning.pipe_width, gap)
}
