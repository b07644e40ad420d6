use tracing::debug;

use super::scorer::{LEFT_ANCHOR, LEFT_ANCHOR_MAX_RIGHT, RIGHT_ANCHOR, SenderScore};
use super::{MessageGroup, Patterns, Speaker};

/// Verdicts below this confidence follow the running speaker.
const CONTINUITY_CONFIDENCE: u32 = 3;
const STRONG_SWITCH_CONFIDENCE: u32 = 3;

/// True when `group` carries evidence strong enough to end the current
/// speaker run instead of inheriting it.
pub fn is_context_break(
    previous: Option<Speaker>,
    group: &MessageGroup,
    score: &SenderScore,
    width: u32,
    patterns: &Patterns,
) -> bool {
    let width = width as f32;
    let left = group.bbox.x as f32;
    let right = group.bbox.right() as f32;
    let current = score.speaker();

    if previous == Some(Speaker::Other)
        && current == Speaker::Me
        && score.confidence() >= STRONG_SWITCH_CONFIDENCE
    {
        return true;
    }
    if right >= width * RIGHT_ANCHOR {
        return true;
    }
    if left <= width * LEFT_ANCHOR && right < width * LEFT_ANCHOR_MAX_RIGHT {
        return true;
    }
    if patterns.contains_date_or_time(&group.text) {
        return true;
    }
    if patterns.has_first_person(&group.text) && right >= width * 0.6 {
        return true;
    }
    if patterns.has_second_person(&group.text) && left <= width * 0.4 {
        return true;
    }
    is_very_wide_right(group, width)
}

fn is_very_wide_right(group: &MessageGroup, width: f32) -> bool {
    group.bbox.w as f32 > width * 0.7 && group.bbox.right() as f32 >= width * 0.7
}

/// Assigns the final speaker of each group in one pass over the conversation.
pub fn resolve_context(
    mut groups: Vec<MessageGroup>,
    scores: &[SenderScore],
    width: u32,
    patterns: &Patterns,
) -> Vec<MessageGroup> {
    let mut previous: Option<Speaker> = None;

    for (group, score) in groups.iter_mut().zip(scores) {
        let verdict = score.speaker();
        let weak = verdict == Speaker::Unknown || score.confidence() < CONTINUITY_CONFIDENCE;
        let resolved = match previous {
            Some(running) if weak && !is_context_break(previous, group, score, width, patterns) => {
                running
            }
            _ => verdict,
        };
        debug!(
            "context: {:?} me={} other={} [{}] -> {}",
            group.text,
            score.me,
            score.other,
            score.signals.join(","),
            resolved.label()
        );
        group.speaker = resolved;
        if resolved != Speaker::Unknown {
            previous = Some(resolved);
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{line, patterns_for};

    fn score(me: u32, other: u32) -> SenderScore {
        SenderScore {
            me,
            other,
            signals: Vec::new(),
        }
    }

    #[test]
    fn right_anchored_switch_after_other_breaks_context() {
        let patterns = patterns_for("ko");
        let group = MessageGroup::from_line(line("응 알겠어", 650, 400, 300, 40));
        assert!(is_context_break(
            Some(Speaker::Other),
            &group,
            &score(5, 0),
            1000,
            &patterns
        ));
    }

    #[test]
    fn middle_group_without_evidence_does_not_break() {
        let patterns = patterns_for("ko");
        let group = MessageGroup::from_line(line("응", 450, 400, 100, 40));
        assert!(!is_context_break(
            Some(Speaker::Other),
            &group,
            &score(1, 0),
            1000,
            &patterns
        ));
    }

    #[test]
    fn date_literal_breaks_context() {
        let patterns = patterns_for("ko");
        let group = MessageGroup::from_line(line("내일 오후 3:00", 450, 400, 100, 40));
        assert!(is_context_break(
            Some(Speaker::Me),
            &group,
            &score(0, 0),
            1000,
            &patterns
        ));
    }

    #[test]
    fn confident_switch_to_me_breaks_only_after_other() {
        let patterns = patterns_for("ko");
        let group = MessageGroup::from_line(line("응 알겠어", 450, 400, 100, 40));
        assert!(is_context_break(
            Some(Speaker::Other),
            &group,
            &score(4, 0),
            1000,
            &patterns
        ));
        assert!(!is_context_break(
            Some(Speaker::Me),
            &group,
            &score(4, 0),
            1000,
            &patterns
        ));
        assert!(!is_context_break(
            Some(Speaker::Other),
            &group,
            &score(2, 0),
            1000,
            &patterns
        ));
    }

    #[test]
    fn clear_left_anchor_breaks_context() {
        let patterns = patterns_for("ko");
        let anchored = MessageGroup::from_line(line("응 알겠어", 100, 400, 200, 40));
        assert!(is_context_break(
            Some(Speaker::Me),
            &anchored,
            &score(0, 0),
            1000,
            &patterns
        ));
        let inset = MessageGroup::from_line(line("응 알겠어", 240, 400, 200, 40));
        assert!(!is_context_break(
            Some(Speaker::Me),
            &inset,
            &score(0, 0),
            1000,
            &patterns
        ));
    }

    #[test]
    fn first_person_on_the_right_breaks_context() {
        let patterns = patterns_for("en");
        let right = MessageGroup::from_line(line("I'm home", 500, 400, 200, 40));
        assert!(is_context_break(
            Some(Speaker::Other),
            &right,
            &score(1, 0),
            1000,
            &patterns
        ));
        let middle = MessageGroup::from_line(line("I'm home", 420, 400, 150, 40));
        assert!(!is_context_break(
            Some(Speaker::Other),
            &middle,
            &score(1, 0),
            1000,
            &patterns
        ));
    }

    #[test]
    fn second_person_on_the_left_breaks_context() {
        let patterns = patterns_for("en");
        let left = MessageGroup::from_line(line("are you home", 300, 400, 200, 40));
        assert!(is_context_break(
            Some(Speaker::Me),
            &left,
            &score(0, 1),
            1000,
            &patterns
        ));
        let middle = MessageGroup::from_line(line("are you home", 450, 400, 200, 40));
        assert!(!is_context_break(
            Some(Speaker::Me),
            &middle,
            &score(0, 1),
            1000,
            &patterns
        ));
    }

    #[test]
    fn very_wide_right_group_is_detected() {
        // Any group this wide also meets one of the anchor rules, so the
        // width check is exercised on its own.
        let wide = MessageGroup::from_line(line("long message", 250, 400, 720, 40));
        assert!(is_very_wide_right(&wide, 1000.0));
        let short_of_edge = MessageGroup::from_line(line("long message", 0, 400, 690, 40));
        assert!(!is_very_wide_right(&short_of_edge, 1000.0));
        let narrow = MessageGroup::from_line(line("long message", 500, 400, 480, 40));
        assert!(!is_very_wide_right(&narrow, 1000.0));

        let patterns = patterns_for("en");
        assert!(is_context_break(
            Some(Speaker::Other),
            &wide,
            &score(0, 0),
            1000,
            &patterns
        ));
    }

    #[test]
    fn weak_verdicts_inherit_running_speaker() {
        let patterns = patterns_for("ko");
        let groups = vec![
            MessageGroup::from_line(line("뭐해", 50, 100, 150, 40)),
            MessageGroup::from_line(line("응", 450, 160, 100, 40)),
            MessageGroup::from_line(line("집이야", 700, 220, 250, 40)),
        ];
        let scores = vec![score(0, 7), score(1, 0), score(6, 0)];
        let resolved = resolve_context(groups, &scores, 1000, &patterns);
        let speakers = resolved.iter().map(|g| g.speaker).collect::<Vec<_>>();
        assert_eq!(speakers, vec![Speaker::Other, Speaker::Other, Speaker::Me]);
    }

    #[test]
    fn first_group_keeps_its_own_verdict() {
        let patterns = patterns_for("ko");
        let groups = vec![MessageGroup::from_line(line("응", 450, 160, 100, 40))];
        let resolved = resolve_context(groups, &[score(0, 0)], 1000, &patterns);
        assert_eq!(resolved[0].speaker, Speaker::Unknown);
    }
}
