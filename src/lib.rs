use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;
use tracing::debug;

pub mod chat;
pub mod input;
pub mod locale;
pub mod logging;
pub mod output;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use chat::{
    BBoxPx, Frame, Message, MessageGroup, OcrLine, Patterns, Speaker, Strategy, reconstruct,
};
pub use input::{InputFormat, OcrInput, Page, load_page};
pub use output::{OutputFormat, render_messages};

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path to the recognizer output; stdin is used when absent.
    pub data: Option<String>,
    pub input_format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub strategy: Option<String>,
    pub locale: Option<String>,
    pub partner_name: Option<String>,
    pub output_format: Option<String>,
    pub settings_path: Option<String>,
}

pub fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;

    if let Some(strategy) = config.strategy.as_deref() {
        settings.strategy = strategy.parse()?;
    }
    if let Some(locale) = config.locale.as_deref() {
        settings.locale = locale.trim().to_lowercase();
        settings.locale_path = None;
    }
    if let Some(name) = config.partner_name.as_deref() {
        settings.partner_name = Some(name.trim().to_string()).filter(|name| !name.is_empty());
    }
    if let Some(format) = config.output_format.as_deref() {
        settings.output_format = format.parse()?;
    }
    let input_format = match config.input_format.as_deref() {
        Some(format) => format.parse()?,
        None => InputFormat::default(),
    };

    let raw = match config.data.as_deref() {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read OCR input: {}", path))?,
        None => input.unwrap_or_default(),
    };
    if raw.trim().is_empty() {
        return Err(anyhow!(
            "no OCR input (pass --data or pipe recognizer output on stdin)"
        ));
    }

    let patterns = locale::load_patterns(
        &settings.locale,
        settings.locale_path.as_deref().map(Path::new),
    )?;
    let page = load_page(&raw, input_format, config.width, config.height)?;
    let frame = Frame::new(&page.lines, page.width, page.height, &patterns)
        .with_partner_name(settings.partner_name.as_deref());
    let messages = reconstruct(&frame, settings.strategy);
    debug!(
        "run: {} messages via {} strategy ({} locale)",
        messages.len(),
        settings.strategy,
        patterns.code()
    );

    render_messages(&messages, settings.output_format, settings.pretty)
}
