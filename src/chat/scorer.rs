use super::calibrate::ThresholdPair;
use super::labels::{NameLabel, TimeLabel};
use super::{MessageGroup, Patterns, Speaker};

pub(crate) const RIGHT_ANCHOR: f32 = 0.78;
pub(crate) const LEFT_ANCHOR: f32 = 0.22;
pub(crate) const LEFT_ANCHOR_MAX_RIGHT: f32 = 0.82;
const TIME_LABEL_RANGE_PX: f32 = 120.0;
const NAME_ABOVE_RANGE_PX: i64 = 120;

/// Everything the sender scorer looks at besides the group itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub width: u32,
    pub height: u32,
    pub patterns: &'a Patterns,
    pub partner_name: Option<&'a str>,
    pub names: &'a [NameLabel],
    pub times: &'a [TimeLabel],
    pub thresholds: Option<ThresholdPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderScore {
    pub me: u32,
    pub other: u32,
    pub signals: Vec<&'static str>,
}

impl SenderScore {
    fn me(&mut self, points: u32, signal: &'static str) {
        self.me += points;
        self.signals.push(signal);
    }

    fn other(&mut self, points: u32, signal: &'static str) {
        self.other += points;
        self.signals.push(signal);
    }

    pub fn speaker(&self) -> Speaker {
        match self.me.cmp(&self.other) {
            std::cmp::Ordering::Greater => Speaker::Me,
            std::cmp::Ordering::Less => Speaker::Other,
            std::cmp::Ordering::Equal => Speaker::Unknown,
        }
    }

    pub fn confidence(&self) -> u32 {
        self.me.abs_diff(self.other)
    }
}

/// Additive evidence for who sent `group`. Ties resolve to UNKNOWN.
pub fn score_group(group: &MessageGroup, input: &ScoreInput<'_>) -> SenderScore {
    let mut score = SenderScore::default();
    let width = input.width as f32;
    let height = input.height as f32;
    let bbox = &group.bbox;
    let left = bbox.x as f32;
    let right = bbox.right() as f32;
    let center_x = bbox.center_x();
    let center_y = bbox.center_y();

    if right >= width * RIGHT_ANCHOR {
        score.me(3, "right-anchored");
    }
    if left <= width * LEFT_ANCHOR && right < width * LEFT_ANCHOR_MAX_RIGHT {
        score.other(3, "left-anchored");
    }

    let thresholds = input
        .thresholds
        .unwrap_or_else(|| ThresholdPair::fallback(input.width));
    if thresholds.leans_me(center_x) {
        score.me(2, "center-right");
    } else if thresholds.leans_other(center_x) {
        score.other(2, "center-left");
    }

    let group_width = bbox.w as f32;
    if group_width > width * 0.6 && right >= width * 0.7 {
        score.me(2, "wide-right");
    }
    if group_width < width * 0.5 && left <= width * 0.3 {
        score.other(2, "narrow-left");
    }

    if let Some(label) = nearest_time_label(group, input.times) {
        if label.x < left {
            score.me(2, "time-left");
        } else if label.x > right {
            score.other(2, "time-right");
        }
    }

    if partner_name_above(group, input) {
        score.other(2, "partner-above");
    }

    if input.patterns.has_first_person(&group.text) {
        score.me(1, "first-person");
    }
    if input.patterns.has_second_person(&group.text) {
        score.other(1, "second-person");
    }

    if center_y >= height * 0.7 && right >= width * 0.6 {
        score.me(1, "bottom-right");
    }
    if center_y <= height * 0.3 && left <= width * 0.4 {
        score.other(1, "top-left");
    }

    score
}

fn nearest_time_label<'a>(group: &MessageGroup, times: &'a [TimeLabel]) -> Option<&'a TimeLabel> {
    let top = group.bbox.y as f32;
    let bottom = group.bbox.bottom() as f32;
    times
        .iter()
        .map(|label| {
            let distance = if label.y < top {
                top - label.y
            } else if label.y > bottom {
                label.y - bottom
            } else {
                0.0
            };
            (label, distance)
        })
        .filter(|(_, distance)| *distance <= TIME_LABEL_RANGE_PX)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(label, _)| label)
}

fn partner_name_above(group: &MessageGroup, input: &ScoreInput<'_>) -> bool {
    let Some(partner) = input.partner_name else {
        return false;
    };
    input.names.iter().any(|label| {
        if label.text != partner {
            return false;
        }
        let gap = group.bbox.y as i64 - label.bbox.bottom() as i64;
        (0..=NAME_ABOVE_RANGE_PX).contains(&gap) && label.bbox.x < group.bbox.right()
    })
}
