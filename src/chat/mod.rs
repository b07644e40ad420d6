mod calibrate;
mod cleanup;
mod context;
mod geom;
mod grouper;
mod labels;
mod merge;
pub(crate) mod patterns;
mod per_line;
mod scorer;
mod strategy;

use serde::{Deserialize, Serialize};

pub use calibrate::{ThresholdPair, ThresholdSource, calibrate_thresholds};
pub use context::{is_context_break, resolve_context};
pub use grouper::group_lines;
pub use labels::{Labels, NameLabel, TimeLabel, extract_labels};
pub use merge::merge_groups;
pub use patterns::Patterns;
pub use per_line::classify_lines;
pub use scorer::{ScoreInput, SenderScore, score_group};
pub use strategy::{ChatStrategy, GroupScoring, PerLine, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBoxPx {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBoxPx {
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.w as f32 / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.h as f32 / 2.0
    }

    pub fn union(&self, other: &BBoxPx) -> BBoxPx {
        geom::union_bbox(self, other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrLine {
    pub text: String,
    pub bbox: BBoxPx,
    pub font_size: f32,
}

impl OcrLine {
    pub fn new(text: impl Into<String>, bbox: BBoxPx) -> Self {
        let font_size = (bbox.h as f32 * 0.9).clamp(8.0, 96.0);
        Self {
            text: text.into(),
            bbox,
            font_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Speaker {
    Me,
    Other,
    Unknown,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Me => "ME",
            Speaker::Other => "OTHER",
            Speaker::Unknown => "UNKNOWN",
        }
    }
}

/// A run of OCR lines believed to form one chat bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageGroup {
    pub lines: Vec<OcrLine>,
    pub bbox: BBoxPx,
    pub text: String,
    pub speaker: Speaker,
    pub reason: Option<String>,
}

impl MessageGroup {
    pub(crate) fn from_line(line: OcrLine) -> Self {
        Self {
            bbox: line.bbox,
            text: line.text.trim().to_string(),
            lines: vec![line],
            speaker: Speaker::Unknown,
            reason: None,
        }
    }

    pub(crate) fn push_line(&mut self, line: OcrLine) {
        self.text = cleanup::join_inline(&self.text, &line.text);
        self.bbox = geom::union_bbox(&self.bbox, &line.bbox);
        self.lines.push(line);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub text: String,
    pub speaker: Speaker,
    pub bbox: BBoxPx,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<MessageGroup> for Message {
    fn from(group: MessageGroup) -> Self {
        Message {
            text: group.text,
            speaker: group.speaker,
            bbox: group.bbox,
            reason: group.reason,
        }
    }
}

/// Everything one reconstruction call sees. Built fresh per screenshot.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub lines: &'a [OcrLine],
    pub width: u32,
    pub height: u32,
    pub patterns: &'a Patterns,
    pub partner_name: Option<&'a str>,
    pub previous_groups: Option<&'a [MessageGroup]>,
}

impl<'a> Frame<'a> {
    pub fn new(lines: &'a [OcrLine], width: u32, height: u32, patterns: &'a Patterns) -> Self {
        Self {
            lines,
            width,
            height,
            patterns,
            partner_name: None,
            previous_groups: None,
        }
    }

    pub fn with_partner_name(mut self, name: Option<&'a str>) -> Self {
        self.partner_name = name.map(str::trim).filter(|name| !name.is_empty());
        self
    }

    pub fn with_previous_groups(mut self, groups: &'a [MessageGroup]) -> Self {
        self.previous_groups = Some(groups);
        self
    }
}

/// Sorts lines into reading order: top first, then left.
pub fn sort_lines(lines: &mut [OcrLine]) {
    lines.sort_by_key(|line| (line.bbox.y, line.bbox.x));
}

/// Runs the selected strategy over one frame and returns messages in screen order.
pub fn reconstruct(frame: &Frame<'_>, strategy: Strategy) -> Vec<Message> {
    if frame.lines.is_empty() || frame.width == 0 || frame.height == 0 {
        return Vec::new();
    }
    let mut lines = frame.lines.to_vec();
    sort_lines(&mut lines);
    let sorted = Frame {
        lines: &lines,
        ..frame.clone()
    };
    let groups = strategy.build().reconstruct(&sorted);
    groups
        .into_iter()
        .filter(|group| !group.text.trim().is_empty())
        .map(Message::from)
        .collect()
}
