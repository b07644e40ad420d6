mod tsv;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::chat::{BBoxPx, OcrLine, sort_lines};

/// Recognizer output in block form, as accepted on stdin or via `--data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrInput {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub blocks: Vec<OcrBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrBlock {
    #[serde(default)]
    pub lines: Vec<OcrInputLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrInputLine {
    pub text: String,
    #[serde(default, alias = "box", alias = "bounding_box")]
    pub bbox: Option<InputBox>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InputBox {
    #[serde(alias = "left")]
    pub x: u32,
    #[serde(alias = "top")]
    pub y: u32,
    #[serde(alias = "width")]
    pub w: u32,
    #[serde(alias = "height")]
    pub h: u32,
}

/// Canvas plus the recognizer lines in (top, left) order.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub width: u32,
    pub height: u32,
    pub lines: Vec<OcrLine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Json,
    Tsv,
}

impl FromStr for InputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(InputFormat::Json),
            "tsv" | "tesseract" => Ok(InputFormat::Tsv),
            other => Err(anyhow!("unknown input format: {} (expected json or tsv)", other)),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Json => f.write_str("json"),
            InputFormat::Tsv => f.write_str("tsv"),
        }
    }
}

impl OcrInput {
    /// Flattens blocks into lines. Lines without a box or text are dropped.
    pub fn into_page(self) -> Page {
        let mut dropped = 0usize;
        let mut lines = Vec::new();
        for block in self.blocks {
            for line in block.lines {
                let text = line.text.trim();
                match line.bbox {
                    Some(bbox) if !text.is_empty() && bbox.w > 0 && bbox.h > 0 => {
                        lines.push(OcrLine::new(
                            text,
                            BBoxPx {
                                x: bbox.x,
                                y: bbox.y,
                                w: bbox.w,
                                h: bbox.h,
                            },
                        ));
                    }
                    _ => dropped += 1,
                }
            }
        }
        if dropped > 0 {
            debug!("input: dropped {} lines without text or box", dropped);
        }
        Page {
            width: self.width,
            height: self.height,
            lines,
        }
    }
}

/// Parses raw recognizer output and settles the canvas size. Explicit sizes
/// win over the ones found in the input; the line extent is the last resort.
pub fn load_page(
    raw: &str,
    format: InputFormat,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<Page> {
    let mut page = match format {
        InputFormat::Json => {
            let input: OcrInput =
                serde_json::from_str(raw).with_context(|| "failed to parse OCR JSON input")?;
            input.into_page()
        }
        InputFormat::Tsv => tsv::parse_tsv(raw).with_context(|| "failed to parse OCR TSV input")?,
    };

    if let Some(width) = width {
        page.width = width;
    }
    if let Some(height) = height {
        page.height = height;
    }
    if page.width == 0 {
        page.width = page.lines.iter().map(|line| line.bbox.right()).max().unwrap_or(0);
    }
    if page.height == 0 {
        page.height = page.lines.iter().map(|line| line.bbox.bottom()).max().unwrap_or(0);
    }
    if !page.lines.is_empty() && (page.width == 0 || page.height == 0) {
        return Err(anyhow!("canvas size is zero; pass --width and --height"));
    }

    sort_lines(&mut page.lines);
    debug!(
        "input: {} lines on {}x{} canvas",
        page.lines.len(),
        page.width,
        page.height
    );
    Ok(page)
}
