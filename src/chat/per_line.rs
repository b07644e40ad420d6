use tracing::debug;

use super::calibrate::{ThresholdPair, calibrate_thresholds};
use super::cleanup::clean_group;
use super::labels::{Labels, NameLabel, extract_labels};
use super::{BBoxPx, Frame, MessageGroup, OcrLine, Speaker};

const NAME_RUN_RANGE_PX: f32 = 300.0;
const NAME_CONTEXT_RANGE_PX: f32 = 200.0;
const BUBBLE_MAX_WIDTH: f32 = 0.75;
const BUBBLE_EDGE_MARGIN: f32 = 0.15;
const BUBBLE_RIGHT_CENTER: f32 = 0.55;
const BUBBLE_LEFT_CENTER: f32 = 0.45;
const FIXED_RIGHT: f32 = 0.75;
const FIXED_LEFT: f32 = 0.25;
const LOWER_SCREEN: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineVerdict {
    speaker: Speaker,
    reason: &'static str,
}

impl LineVerdict {
    fn new(speaker: Speaker, reason: &'static str) -> Self {
        Self { speaker, reason }
    }
}

/// Per-line strategy: classify every line on its own, then fold runs of the
/// same speaker into groups and strip chrome from their text.
pub fn classify_lines(frame: &Frame<'_>) -> Vec<MessageGroup> {
    let patterns = frame.patterns;
    let labels = extract_labels(frame.lines, frame.height, patterns, frame.partner_name);
    let lines = frame
        .lines
        .iter()
        .filter(|line| {
            let text = line.text.trim();
            !text.is_empty() && !patterns.is_ui_garbage(text) && !patterns.is_timestamp(text)
        })
        .collect::<Vec<_>>();

    let anchors = lines.iter().map(|line| line.bbox.center_x()).collect::<Vec<_>>();
    let thresholds = calibrate_thresholds(&anchors, frame.width);
    debug!(
        "per-line: thresholds {:.0}/{:.0} ({:?})",
        thresholds.left_max_x, thresholds.right_min_x, thresholds.source
    );

    let mut classifier = LineClassifier {
        frame,
        labels: &labels,
        thresholds,
        in_partner_run: false,
    };
    let mut groups: Vec<MessageGroup> = Vec::new();
    for line in lines {
        let verdict = classifier.classify(line);
        debug!(
            "per-line: {:?} -> {} ({})",
            line.text,
            verdict.speaker.label(),
            verdict.reason
        );
        if let Some(group) = groups.last_mut()
            && group.speaker == verdict.speaker
        {
            group.push_line(line.clone());
            continue;
        }
        let mut group = MessageGroup::from_line(line.clone());
        group.speaker = verdict.speaker;
        group.reason = Some(verdict.reason.to_string());
        groups.push(group);
    }

    let partner = labels.partner_name.as_deref();
    groups
        .into_iter()
        .filter_map(|group| clean_group(group, patterns, partner))
        .collect()
}

struct LineClassifier<'a> {
    frame: &'a Frame<'a>,
    labels: &'a Labels,
    thresholds: ThresholdPair,
    in_partner_run: bool,
}

impl LineClassifier<'_> {
    fn classify(&mut self, line: &OcrLine) -> LineVerdict {
        let center = line.bbox.center_x();

        if self.is_partner_line(line) {
            self.in_partner_run = true;
            return LineVerdict::new(Speaker::Other, "partner name");
        }

        if self.in_partner_run {
            if self.thresholds.leans_me(center) {
                self.in_partner_run = false;
                return LineVerdict::new(Speaker::Me, "partner run ended: right of threshold");
            }
            if self.thresholds.leans_other(center) {
                return LineVerdict::new(Speaker::Other, "partner run: left of threshold");
            }
            return LineVerdict::new(Speaker::Other, "partner run: ambiguous middle kept as partner");
        }

        if !self.thresholds.leans_me(center)
            && nearest_name_above(&line.bbox, &self.labels.names)
                .is_some_and(|distance| distance < NAME_RUN_RANGE_PX)
        {
            return LineVerdict::new(Speaker::Other, "below name label");
        }

        self.fallback(&line.bbox)
    }

    fn is_partner_line(&self, line: &OcrLine) -> bool {
        self.labels
            .partner_name
            .as_deref()
            .is_some_and(|name| self.frame.patterns.strip_name_prefix(&line.text) == name)
    }

    fn fallback(&self, bbox: &BBoxPx) -> LineVerdict {
        let width = self.frame.width as f32;
        let height = self.frame.height as f32;
        let center = bbox.center_x();

        if let Some(speaker) = bubble_shape(bbox, width) {
            return LineVerdict::new(speaker, "bubble shape");
        }
        if center >= width * FIXED_RIGHT {
            return LineVerdict::new(Speaker::Me, "fixed position right");
        }
        if center <= width * FIXED_LEFT {
            return LineVerdict::new(Speaker::Other, "fixed position left");
        }
        if nearest_name_distance(bbox, &self.labels.names)
            .is_some_and(|distance| distance < NAME_CONTEXT_RANGE_PX)
        {
            return LineVerdict::new(Speaker::Other, "near name label");
        }
        if bbox.center_y() >= height * LOWER_SCREEN {
            return LineVerdict::new(Speaker::Me, "lower screen default");
        }
        LineVerdict::new(Speaker::Unknown, "no signal")
    }
}

/// A bubble hugs one screen edge and leaves room on the other side.
fn bubble_shape(bbox: &BBoxPx, width: f32) -> Option<Speaker> {
    if bbox.w as f32 > width * BUBBLE_MAX_WIDTH {
        return None;
    }
    let center = bbox.center_x();
    let left_margin = bbox.x as f32;
    let right_margin = (width - bbox.right() as f32).max(0.0);
    if right_margin <= width * BUBBLE_EDGE_MARGIN && center >= width * BUBBLE_RIGHT_CENTER {
        Some(Speaker::Me)
    } else if left_margin <= width * BUBBLE_EDGE_MARGIN && center <= width * BUBBLE_LEFT_CENTER {
        Some(Speaker::Other)
    } else {
        None
    }
}

fn nearest_name_above(bbox: &BBoxPx, names: &[NameLabel]) -> Option<f32> {
    names
        .iter()
        .filter(|label| label.bbox != *bbox)
        .map(|label| bbox.center_y() - label.bbox.center_y())
        .filter(|distance| *distance >= 0.0)
        .min_by(|a, b| a.total_cmp(b))
}

fn nearest_name_distance(bbox: &BBoxPx, names: &[NameLabel]) -> Option<f32> {
    names
        .iter()
        .filter(|label| label.bbox != *bbox)
        .map(|label| (bbox.center_y() - label.bbox.center_y()).abs())
        .min_by(|a, b| a.total_cmp(b))
}
