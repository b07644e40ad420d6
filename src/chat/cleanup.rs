use super::geom::union_bbox;
use super::{MessageGroup, OcrLine, Patterns};

const NAME_HEADER_MAX_CHARS: usize = 10;

pub(crate) fn join_inline(left: &str, right: &str) -> String {
    let left = left.trim_end();
    let right = right.trim_start();
    if left.is_empty() {
        return right.to_string();
    }
    if right.is_empty() {
        return left.to_string();
    }
    if needs_space(left, right) {
        format!("{} {}", left, right)
    } else {
        format!("{}{}", left, right)
    }
}

fn needs_space(left: &str, right: &str) -> bool {
    let last = left.chars().rev().find(|ch| !ch.is_whitespace());
    let first = right.chars().find(|ch| !ch.is_whitespace());
    match (last, first) {
        (Some(a), Some(b)) => {
            let word_end = a.is_alphanumeric() || matches!(a, '.' | ',' | '!' | '?' | ')' | '~');
            word_end && b.is_alphanumeric()
        }
        _ => false,
    }
}

/// Removes chrome that rides inside a per-line group: the partner's name
/// header, full date dividers, and receipt lines such as "읽음". Kept lines
/// are copied as they are. Returns `None` when nothing readable is left.
pub(crate) fn clean_group(
    group: MessageGroup,
    patterns: &Patterns,
    partner_name: Option<&str>,
) -> Option<MessageGroup> {
    let mut kept: Vec<OcrLine> = Vec::new();
    let mut text = String::new();

    for line in group.lines {
        if line.text.trim().is_empty()
            || is_name_header(&line.text, patterns, partner_name)
            || patterns.is_date_divider(&line.text)
            || patterns.is_boilerplate(&line.text)
        {
            continue;
        }
        text = join_inline(&text, &line.text);
        kept.push(line);
    }

    let first = kept.first()?;
    let bbox = kept
        .iter()
        .skip(1)
        .fold(first.bbox, |acc, line| union_bbox(&acc, &line.bbox));
    Some(MessageGroup {
        lines: kept,
        bbox,
        text,
        speaker: group.speaker,
        reason: group.reason,
    })
}

fn is_name_header(text: &str, patterns: &Patterns, partner_name: Option<&str>) -> bool {
    let stripped = patterns.strip_name_prefix(text);
    if partner_name.is_some_and(|name| name == stripped) {
        return true;
    }
    patterns.starts_with_name_prefix(text)
        && (2..=NAME_HEADER_MAX_CHARS).contains(&stripped.chars().count())
        && stripped
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Speaker;
    use crate::test_util::{line, patterns_for};

    fn group_of(lines: Vec<OcrLine>) -> MessageGroup {
        let mut iter = lines.into_iter();
        let mut group = MessageGroup::from_line(iter.next().expect("line"));
        for line in iter {
            group.push_line(line);
        }
        group.speaker = Speaker::Other;
        group.reason = Some("partner name".to_string());
        group
    }

    #[test]
    fn join_inserts_space_between_words_only() {
        assert_eq!(join_inline("hello", "world"), "hello world");
        assert_eq!(join_inline("안녕", "하세요"), "안녕 하세요");
        assert_eq!(join_inline("wait", "..."), "wait...");
        assert_eq!(join_inline("", "first"), "first");
    }

    #[test]
    fn partner_header_and_dividers_are_removed() {
        let patterns = patterns_for("ko");
        let group = group_of(vec![
            line("김철수", 60, 300, 100, 30),
            line("2024년 1월 2일 화요일", 300, 340, 400, 30),
            line("밥 먹었어?", 60, 380, 200, 40),
            line("읽음", 270, 400, 40, 20),
        ]);
        let cleaned = clean_group(group, &patterns, Some("김철수")).expect("cleaned");
        assert_eq!(cleaned.text, "밥 먹었어?");
        assert_eq!(cleaned.lines.len(), 1);
        assert_eq!(cleaned.bbox.y, 380);
        assert_eq!(cleaned.speaker, Speaker::Other);
        assert_eq!(cleaned.reason.as_deref(), Some("partner name"));
    }

    #[test]
    fn prefixed_short_header_is_removed_without_partner() {
        let patterns = patterns_for("ko");
        let group = group_of(vec![
            line("< 이영희", 20, 40, 140, 40),
            line("- 우유랑 빵 사오는 거 잊지마", 60, 300, 300, 40),
        ]);
        let cleaned = clean_group(group, &patterns, None).expect("cleaned");
        assert_eq!(cleaned.text, "- 우유랑 빵 사오는 거 잊지마");
    }

    #[test]
    fn receipt_words_inside_sentences_are_kept() {
        let patterns = patterns_for("en");
        let group = group_of(vec![
            line("Have you read it yet", 700, 300, 260, 40),
            line("I sent it and it was  seen", 700, 350, 260, 40),
            line("Read", 640, 400, 50, 20),
        ]);
        let cleaned = clean_group(group, &patterns, None).expect("cleaned");
        assert_eq!(cleaned.text, "Have you read it yet I sent it and it was  seen");
        assert_eq!(cleaned.lines.len(), 2);
    }

    #[test]
    fn relative_dates_and_month_days_are_content() {
        let patterns = patterns_for("ko");
        let group = group_of(vec![
            line("내일", 700, 300, 80, 40),
            line("3월 14일", 700, 350, 120, 40),
            line("2024년 3월 14일 목요일", 300, 400, 400, 30),
        ]);
        let cleaned = clean_group(group, &patterns, None).expect("cleaned");
        assert_eq!(cleaned.text, "내일 3월 14일");
    }

    #[test]
    fn group_with_only_chrome_disappears() {
        let patterns = patterns_for("ko");
        let group = group_of(vec![line("김철수", 60, 300, 100, 30), line("읽음", 60, 340, 40, 20)]);
        assert!(clean_group(group, &patterns, Some("김철수")).is_none());
    }
}
