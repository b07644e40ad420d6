use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

use super::calibrate::calibrate_thresholds;
use super::context::resolve_context;
use super::grouper::group_lines;
use super::labels::extract_labels;
use super::merge::merge_groups;
use super::per_line::classify_lines;
use super::scorer::{ScoreInput, score_group};
use super::{Frame, MessageGroup};

/// One way of turning a frame's lines into speaker-attributed groups.
pub trait ChatStrategy {
    fn name(&self) -> &'static str;
    fn reconstruct(&self, frame: &Frame<'_>) -> Vec<MessageGroup>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Group lines into bubbles, score each bubble, then apply speaker continuity.
    #[default]
    Group,
    /// Classify line by line and fold same-speaker runs.
    Line,
}

impl Strategy {
    pub fn build(self) -> Box<dyn ChatStrategy> {
        match self {
            Strategy::Group => Box::new(GroupScoring),
            Strategy::Line => Box::new(PerLine),
        }
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "group" | "groups" | "score" => Ok(Strategy::Group),
            "line" | "lines" | "per-line" => Ok(Strategy::Line),
            other => Err(anyhow::anyhow!(
                "unknown strategy: {} (expected group or line)",
                other
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Group => f.write_str("group"),
            Strategy::Line => f.write_str("line"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GroupScoring;

impl ChatStrategy for GroupScoring {
    fn name(&self) -> &'static str {
        "group"
    }

    fn reconstruct(&self, frame: &Frame<'_>) -> Vec<MessageGroup> {
        log_previous_groups(frame);
        let patterns = frame.patterns;
        let labels = extract_labels(frame.lines, frame.height, patterns, frame.partner_name);
        let groups = group_lines(frame.lines, patterns);
        if groups.is_empty() {
            return groups;
        }

        let anchors = groups
            .iter()
            .map(|group| group.bbox.center_x())
            .collect::<Vec<_>>();
        let thresholds = calibrate_thresholds(&anchors, frame.width);
        debug!(
            "group: {} groups, thresholds {:.0}/{:.0} ({:?})",
            groups.len(),
            thresholds.left_max_x,
            thresholds.right_min_x,
            thresholds.source
        );

        let input = ScoreInput {
            width: frame.width,
            height: frame.height,
            patterns,
            partner_name: labels.partner_name.as_deref(),
            names: &labels.names,
            times: &labels.times,
            thresholds: Some(thresholds),
        };
        let scores = groups
            .iter()
            .map(|group| score_group(group, &input))
            .collect::<Vec<_>>();
        let resolved = resolve_context(groups, &scores, frame.width, patterns);
        merge_groups(resolved)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerLine;

impl ChatStrategy for PerLine {
    fn name(&self) -> &'static str {
        "line"
    }

    fn reconstruct(&self, frame: &Frame<'_>) -> Vec<MessageGroup> {
        log_previous_groups(frame);
        classify_lines(frame)
    }
}

// Multi-frame reconciliation is not implemented; earlier frames are only noted.
fn log_previous_groups(frame: &Frame<'_>) {
    if let Some(previous) = frame.previous_groups {
        trace!("strategy: ignoring {} groups from previous frame", previous.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_parse() {
        assert_eq!("group".parse::<Strategy>().unwrap(), Strategy::Group);
        assert_eq!(" Per-Line ".parse::<Strategy>().unwrap(), Strategy::Line);
        assert!("bubbles".parse::<Strategy>().is_err());
        assert_eq!(Strategy::default().to_string(), "group");
    }

    #[test]
    fn built_strategies_report_their_names() {
        assert_eq!(Strategy::Group.build().name(), "group");
        assert_eq!(Strategy::Line.build().name(), "line");
    }

    #[test]
    fn previous_frame_groups_do_not_change_the_result() {
        let patterns = crate::test_util::patterns_for("ko");
        let lines = vec![
            crate::test_util::line("밥 먹었어?", 40, 800, 260, 50),
            crate::test_util::line("응 방금 먹었어", 700, 1000, 340, 50),
        ];
        let frame = Frame::new(&lines, 1080, 2340, &patterns);
        for strategy in [Strategy::Group, Strategy::Line] {
            let first = strategy.build().reconstruct(&frame);
            let again = strategy
                .build()
                .reconstruct(&frame.clone().with_previous_groups(&first));
            assert_eq!(first, again);
        }
    }
}
