use tracing::debug;

use super::patterns::NameMode;
use super::{BBoxPx, OcrLine, Patterns};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 10;

/// Anchor of a recognized chat timestamp. Never part of message text.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeLabel {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameLabel {
    pub text: String,
    pub bbox: BBoxPx,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    pub partner_name: Option<String>,
    pub names: Vec<NameLabel>,
    pub times: Vec<TimeLabel>,
}

/// Collects timestamps, infers the partner's display name (unless one is
/// supplied) and gathers the lines usable as name anchors.
pub fn extract_labels(lines: &[OcrLine], height: u32, patterns: &Patterns, partner: Option<&str>) -> Labels {
    let times = lines
        .iter()
        .filter(|line| patterns.is_timestamp(&line.text))
        .map(|line| TimeLabel {
            x: line.bbox.center_x(),
            y: line.bbox.center_y(),
            text: line.text.trim().to_string(),
        })
        .collect::<Vec<_>>();

    let partner_name = match partner {
        Some(name) => Some(name.trim().to_string()),
        None => infer_partner_name(lines, height, patterns),
    };
    if let Some(name) = &partner_name {
        debug!("labels: partner name {:?}", name);
    }

    let names = lines
        .iter()
        .filter(|line| {
            let stripped = patterns.strip_name_prefix(&line.text);
            partner_name.as_deref() == Some(stripped)
                || patterns.is_name_like(&line.text, &line.bbox, height, NameMode::Strict)
        })
        .map(|line| NameLabel {
            text: patterns.strip_name_prefix(&line.text).to_string(),
            bbox: line.bbox,
        })
        .collect::<Vec<_>>();

    debug!(
        "labels: {} time labels, {} name labels",
        times.len(),
        names.len()
    );
    Labels {
        partner_name,
        names,
        times,
    }
}

fn infer_partner_name(lines: &[OcrLine], height: u32, patterns: &Patterns) -> Option<String> {
    lines
        .iter()
        .filter(|line| patterns.is_name_like(&line.text, &line.bbox, height, NameMode::Loose))
        .map(|line| patterns.strip_name_prefix(&line.text))
        .find(|name| (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name.chars().count()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{line, patterns_for};

    #[test]
    fn timestamps_become_time_labels() {
        let patterns = patterns_for("ko");
        let lines = vec![
            line("안녕", 700, 300, 150, 40),
            line("오후 3:45", 600, 320, 80, 20),
        ];
        let labels = extract_labels(&lines, 2000, &patterns, None);
        assert_eq!(labels.times.len(), 1);
        assert_eq!(labels.times[0].x, 640.0);
        assert_eq!(labels.times[0].y, 330.0);
    }

    #[test]
    fn partner_name_is_first_top_band_name() {
        let patterns = patterns_for("ko");
        let lines = vec![
            line("< 김철수", 60, 40, 160, 40),
            line("홍길동", 60, 200, 100, 30),
            line("뭐해?", 60, 240, 120, 40),
        ];
        let labels = extract_labels(&lines, 2000, &patterns, None);
        assert_eq!(labels.partner_name.as_deref(), Some("김철수"));
        let names = labels.names.iter().map(|n| n.text.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["김철수", "홍길동"]);
    }

    #[test]
    fn long_candidates_are_skipped() {
        let patterns = patterns_for("en");
        let lines = vec![
            line("Alexandria Smith", 60, 40, 300, 40),
            line("Bob", 60, 100, 80, 40),
        ];
        let labels = extract_labels(&lines, 2000, &patterns, None);
        assert_eq!(labels.partner_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn supplied_partner_wins_and_anchors_anywhere() {
        let patterns = patterns_for("ko");
        let lines = vec![
            line("김철수", 60, 40, 160, 40),
            line("엄마", 60, 1500, 80, 30),
        ];
        let labels = extract_labels(&lines, 2000, &patterns, Some("엄마"));
        assert_eq!(labels.partner_name.as_deref(), Some("엄마"));
        assert!(labels.names.iter().any(|name| name.bbox.y == 1500));
    }

    #[test]
    fn no_candidates_means_no_partner() {
        let patterns = patterns_for("ko");
        let lines = vec![line("밥 먹었어?", 60, 1200, 200, 40)];
        let labels = extract_labels(&lines, 2000, &patterns, None);
        assert!(labels.partner_name.is_none());
        assert!(labels.names.is_empty());
    }
}
