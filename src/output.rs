use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chat::Message;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(anyhow!("unknown output format: {} (expected json or text)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Text => f.write_str("text"),
        }
    }
}

pub fn render_messages(messages: &[Message], format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let rendered = if pretty {
                serde_json::to_string_pretty(messages)
            } else {
                serde_json::to_string(messages)
            };
            rendered.with_context(|| "failed to serialize messages")
        }
        OutputFormat::Text => Ok(render_text(messages)),
    }
}

/// One `[SPEAKER] text` entry per message; continuation lines are indented
/// under the first.
fn render_text(messages: &[Message]) -> String {
    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        let prefix = format!("[{}] ", message.speaker.label());
        let indent = " ".repeat(prefix.len());
        let mut lines = message.text.lines();
        let mut entry = format!("{}{}", prefix, lines.next().unwrap_or_default());
        for rest in lines {
            entry.push('\n');
            entry.push_str(&indent);
            entry.push_str(rest);
        }
        out.push(entry);
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{BBoxPx, Speaker};

    fn message(text: &str, speaker: Speaker) -> Message {
        Message {
            text: text.to_string(),
            speaker,
            bbox: BBoxPx {
                x: 10,
                y: 20,
                w: 30,
                h: 40,
            },
            reason: None,
        }
    }

    #[test]
    fn text_indents_continuation_lines() {
        let messages = vec![
            message("안녕", Speaker::Other),
            message("first\nsecond", Speaker::Me),
        ];
        let rendered = render_messages(&messages, OutputFormat::Text, true).unwrap();
        insta::assert_snapshot!(rendered, @r"
        [OTHER] 안녕
        [ME] first
             second
        ");
    }

    #[test]
    fn compact_json_skips_missing_reason() {
        let messages = vec![message("hi", Speaker::Unknown)];
        let rendered = render_messages(&messages, OutputFormat::Json, false).unwrap();
        assert_eq!(
            rendered,
            r#"[{"text":"hi","speaker":"UNKNOWN","bbox":{"x":10,"y":20,"w":30,"h":40}}]"#
        );
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
