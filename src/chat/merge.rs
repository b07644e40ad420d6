use super::geom::{is_near, union_bbox};
use super::{MessageGroup, Speaker};

const MERGE_GAP_PX: u32 = 20;

/// Folds same-speaker groups that touch each other into one message and
/// returns the result in screen order.
pub fn merge_groups(mut groups: Vec<MessageGroup>) -> Vec<MessageGroup> {
    groups.sort_by_key(|group| (group.speaker, group.bbox.y, group.bbox.x));
    let mut merged: Vec<MessageGroup> = Vec::new();

    for group in groups {
        if let Some(last) = merged.last_mut()
            && should_merge(last, &group)
        {
            last.text = format!("{}\n{}", last.text, group.text);
            last.bbox = union_bbox(&last.bbox, &group.bbox);
            last.lines.extend(group.lines);
            continue;
        }
        merged.push(group);
    }

    merged.sort_by_key(|group| {
        let first = group.lines.first().map(|line| line.bbox).unwrap_or(group.bbox);
        (first.y, first.x)
    });
    merged
}

fn should_merge(a: &MessageGroup, b: &MessageGroup) -> bool {
    a.speaker == b.speaker
        && a.speaker != Speaker::Unknown
        && is_near(&a.bbox, &b.bbox, MERGE_GAP_PX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::line;

    fn group(text: &str, x: u32, y: u32, w: u32, speaker: Speaker) -> MessageGroup {
        let mut group = MessageGroup::from_line(line(text, x, y, w, 40));
        group.speaker = speaker;
        group
    }

    #[test]
    fn touching_same_speaker_groups_merge() {
        let merged = merge_groups(vec![
            group("first", 600, 100, 300, Speaker::Me),
            group("second", 650, 150, 250, Speaker::Me),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "first\nsecond");
        assert_eq!(merged[0].bbox.y, 100);
        assert_eq!(merged[0].bbox.bottom(), 190);
        assert_eq!(merged[0].lines.len(), 2);
    }

    #[test]
    fn distant_or_unknown_groups_stay_apart() {
        let merged = merge_groups(vec![
            group("a", 600, 100, 300, Speaker::Me),
            group("b", 600, 400, 300, Speaker::Me),
            group("c", 450, 600, 100, Speaker::Unknown),
            group("d", 450, 650, 100, Speaker::Unknown),
        ]);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn output_follows_screen_order() {
        let merged = merge_groups(vec![
            group("me 1", 600, 100, 300, Speaker::Me),
            group("other", 50, 300, 300, Speaker::Other),
            group("me 2", 600, 500, 300, Speaker::Me),
        ]);
        let texts = merged.iter().map(|g| g.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["me 1", "other", "me 2"]);
    }
}
