use serde::Serialize;
use tracing::trace;

const MIN_ANCHORS: usize = 4;
const MAX_ITERATIONS: usize = 10;
const CONVERGENCE_PX: f32 = 0.5;
const MIN_CLUSTER_GAP: f32 = 30.0;
const MIN_MARGIN: f32 = 20.0;
const MARGIN_RATIO: f32 = 0.1;
const SNAP_STEP: f32 = 30.0;
const MIN_SEPARATION: f32 = 60.0;
const FALLBACK_LEFT: f32 = 0.4;
const FALLBACK_RIGHT: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Calibrated,
    Fallback,
}

/// Screen split: x <= `left_max_x` leans OTHER, x >= `right_min_x` leans ME.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdPair {
    pub left_max_x: f32,
    pub right_min_x: f32,
    pub source: ThresholdSource,
}

impl ThresholdPair {
    pub fn fallback(width: u32) -> Self {
        let width = width as f32;
        Self {
            left_max_x: width * FALLBACK_LEFT,
            right_min_x: width * FALLBACK_RIGHT,
            source: ThresholdSource::Fallback,
        }
    }

    pub fn leans_me(&self, x: f32) -> bool {
        x >= self.right_min_x
    }

    pub fn leans_other(&self, x: f32) -> bool {
        x <= self.left_max_x
    }
}

/// Splits horizontal anchors into a left and a right cluster (1-D k-means, k=2)
/// and places thresholds around the midpoint between them.
pub fn calibrate_thresholds(anchors: &[f32], width: u32) -> ThresholdPair {
    let fallback = ThresholdPair::fallback(width);
    if anchors.len() < MIN_ANCHORS {
        trace!("calibrate: {} anchors, using fallback", anchors.len());
        return fallback;
    }
    let Some((low, high)) = two_means(anchors) else {
        trace!("calibrate: degenerate anchors, using fallback");
        return fallback;
    };
    let gap = high - low;
    if gap < MIN_CLUSTER_GAP {
        trace!("calibrate: cluster gap {:.1}px too small, using fallback", gap);
        return fallback;
    }

    let mid = (low + high) / 2.0;
    let margin = (gap * MARGIN_RATIO).max(MIN_MARGIN);
    let mut left = snap_down(mid - margin);
    let mut right = snap_up(mid + margin);
    if right - left < MIN_SEPARATION {
        let expand = (MIN_SEPARATION - (right - left)) / 2.0;
        left = snap_down(left - expand);
        right = snap_up(right + expand);
    }
    let limit = width as f32;
    let left = left.clamp(0.0, limit);
    let right = right.clamp(0.0, limit);
    if left >= right {
        return fallback;
    }
    trace!(
        "calibrate: centers {:.1}/{:.1} -> thresholds {:.0}/{:.0}",
        low, high, left, right
    );
    ThresholdPair {
        left_max_x: left,
        right_min_x: right,
        source: ThresholdSource::Calibrated,
    }
}

/// Returns the ordered cluster centers, or `None` when every anchor is identical.
fn two_means(anchors: &[f32]) -> Option<(f32, f32)> {
    let min = anchors.iter().copied().fold(f32::INFINITY, f32::min);
    let max = anchors.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !min.is_finite() || !max.is_finite() || max - min < f32::EPSILON {
        return None;
    }

    let mut centers = [min, max];
    for _ in 0..MAX_ITERATIONS {
        let mut sums = [0.0f32; 2];
        let mut counts = [0usize; 2];
        for &value in anchors {
            let idx = if (value - centers[0]).abs() <= (value - centers[1]).abs() {
                0
            } else {
                1
            };
            sums[idx] += value;
            counts[idx] += 1;
        }
        let mut next = centers;
        for idx in 0..2 {
            if counts[idx] > 0 {
                next[idx] = sums[idx] / counts[idx] as f32;
            }
        }
        let moved = (next[0] - centers[0])
            .abs()
            .max((next[1] - centers[1]).abs());
        centers = next;
        if moved < CONVERGENCE_PX {
            break;
        }
    }

    let (low, high) = if centers[0] <= centers[1] {
        (centers[0], centers[1])
    } else {
        (centers[1], centers[0])
    };
    Some((low, high))
}

fn snap_down(value: f32) -> f32 {
    (value / SNAP_STEP).floor() * SNAP_STEP
}

fn snap_up(value: f32) -> f32 {
    (value / SNAP_STEP).ceil() * SNAP_STEP
}
