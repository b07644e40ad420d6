use anyhow::{Result, anyhow};
use std::collections::BTreeMap;

use crate::chat::{BBoxPx, OcrLine};

use super::Page;

const WORD_LEVEL: i32 = 5;
const PAGE_LEVEL: i32 = 1;
const MIN_COLUMNS: usize = 12;

#[derive(Clone)]
struct WordToken {
    text: String,
    bbox: BBoxPx,
}

/// Parses `tesseract ... tsv` output. Words are grouped by
/// (page, block, paragraph, line) and split again where a wide horizontal
/// gap shows two bubbles sharing one recognizer line.
pub(crate) fn parse_tsv(tsv: &str) -> Result<Page> {
    let mut word_map: BTreeMap<(i32, i32, i32, i32), Vec<WordToken>> = BTreeMap::new();
    let mut page_size: Option<(u32, u32)> = None;
    let mut rows = 0usize;

    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 || row.trim().is_empty() {
            continue;
        }
        let cols = row.split('\t').collect::<Vec<_>>();
        if cols.len() < MIN_COLUMNS - 1 {
            continue;
        }
        rows += 1;
        let level: i32 = cols[0].parse().unwrap_or(0);
        let left: u32 = cols[6].parse().unwrap_or(0);
        let top: u32 = cols[7].parse().unwrap_or(0);
        let width: u32 = cols[8].parse().unwrap_or(0);
        let height: u32 = cols[9].parse().unwrap_or(0);
        if level == PAGE_LEVEL && page_size.is_none() {
            page_size = Some((left.saturating_add(width), top.saturating_add(height)));
            continue;
        }
        if level != WORD_LEVEL || cols.len() < MIN_COLUMNS {
            continue;
        }
        let conf: f32 = cols[10].parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if text.is_empty() || conf < 0.0 || width == 0 || height == 0 {
            continue;
        }
        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        word_map.entry(key).or_default().push(WordToken {
            text: text.to_string(),
            bbox: BBoxPx {
                x: left,
                y: top,
                w: width,
                h: height,
            },
        });
    }

    if rows == 0 && !tsv.trim().is_empty() && tsv.lines().count() > 1 {
        return Err(anyhow!("no tesseract TSV rows found"));
    }

    let mut lines = Vec::new();
    for (_, mut words) in word_map {
        words.sort_by_key(|word| word.bbox.x);
        for segment in split_word_segments(words) {
            if let Some(line) = build_line(&segment) {
                lines.push(line);
            }
        }
    }
    let (width, height) = page_size.unwrap_or((0, 0));
    Ok(Page {
        width,
        height,
        lines,
    })
}

fn split_word_segments(words: Vec<WordToken>) -> Vec<Vec<WordToken>> {
    if words.len() <= 1 {
        return if words.is_empty() { Vec::new() } else { vec![words] };
    }

    let mut heights = words.iter().map(|word| word.bbox.h).collect::<Vec<_>>();
    heights.sort_unstable();
    let median_h = heights[heights.len() / 2].max(1) as f32;
    let gap_threshold = (median_h * 2.5).clamp(12.0, 120.0);

    let mut segments: Vec<Vec<WordToken>> = Vec::new();
    let mut current: Vec<WordToken> = Vec::new();
    let mut last_right = 0u32;
    for word in words {
        if !current.is_empty() && word.bbox.x.saturating_sub(last_right) as f32 > gap_threshold {
            segments.push(std::mem::take(&mut current));
        }
        last_right = if current.is_empty() {
            word.bbox.right()
        } else {
            last_right.max(word.bbox.right())
        };
        current.push(word);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn build_line(words: &[WordToken]) -> Option<OcrLine> {
    let (first, rest) = words.split_first()?;
    let mut text = first.text.clone();
    let mut bbox = first.bbox;
    for word in rest {
        text.push(' ');
        text.push_str(&word.text);
        bbox = bbox.union(&word.bbox);
    }
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(OcrLine::new(text, bbox))
}
