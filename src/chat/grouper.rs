use tracing::trace;

use super::geom::{horizontal_overlap_ratio, vertical_gap};
use super::{MessageGroup, OcrLine, Patterns};

const MAX_GAP_FACTOR: f32 = 0.9;
const MIN_OVERLAP_RATIO: f32 = 0.35;
const EDGE_ALIGN_PX: i64 = 30;

/// Groups lines sorted by (top, left) into bubbles. Chrome lines are dropped.
pub fn group_lines(lines: &[OcrLine], patterns: &Patterns) -> Vec<MessageGroup> {
    let mut groups: Vec<MessageGroup> = Vec::new();

    for line in lines {
        let text = line.text.trim();
        if text.is_empty() || patterns.is_ui_garbage(text) || patterns.is_timestamp(text) {
            trace!("group: skipping chrome line {:?}", text);
            continue;
        }
        if let Some(group) = groups.last_mut() {
            if let Some(last) = group.lines.last() {
                if belongs_to_group(last, line) {
                    group.push_line(line.clone());
                    continue;
                }
            }
        }
        groups.push(MessageGroup::from_line(line.clone()));
    }

    groups
}

fn belongs_to_group(last: &OcrLine, line: &OcrLine) -> bool {
    let gap = vertical_gap(&last.bbox, &line.bbox);
    let max_gap = MAX_GAP_FACTOR * (last.bbox.h as f32 + line.bbox.h as f32) / 2.0;
    if gap as f32 > max_gap {
        return false;
    }
    if horizontal_overlap_ratio(&last.bbox, &line.bbox) >= MIN_OVERLAP_RATIO {
        return true;
    }
    // Ragged wraps: a short last line keeps one edge aligned with the bubble.
    let left_diff = (last.bbox.x as i64 - line.bbox.x as i64).abs();
    let right_diff = (last.bbox.right() as i64 - line.bbox.right() as i64).abs();
    left_diff <= EDGE_ALIGN_PX || right_diff <= EDGE_ALIGN_PX
}
