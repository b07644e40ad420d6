use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chat::Strategy;
use crate::locale::DEFAULT_LOCALE;
use crate::output::OutputFormat;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const HOME_DIR_NAME: &str = ".chat-ocr-rust";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub strategy: Strategy,
    pub locale: String,
    pub locale_path: Option<String>,
    pub partner_name: Option<String>,
    pub output_format: OutputFormat,
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            locale: DEFAULT_LOCALE.to_string(),
            locale_path: None,
            partner_name: None,
            output_format: OutputFormat::default(),
            pretty: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    chat: Option<ChatSettings>,
    output: Option<OutputSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatSettings {
    strategy: Option<String>,
    locale: Option<String>,
    locale_path: Option<String>,
    partner_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputSettings {
    format: Option<String>,
    pretty: Option<bool>,
}

/// Layers the embedded defaults, the working directory, the home directory
/// and finally `extra_path` (which must exist) into one `Settings`.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults)?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings
                .merge(parsed)
                .with_context(|| format!("invalid settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(chat) = incoming.chat {
            if let Some(strategy) = chat.strategy {
                if !strategy.trim().is_empty() {
                    self.strategy = strategy.parse()?;
                }
            }
            if let Some(locale) = chat.locale {
                if !locale.trim().is_empty() {
                    self.locale = locale.trim().to_lowercase();
                }
            }
            if let Some(path) = chat.locale_path {
                if !path.trim().is_empty() {
                    self.locale_path = Some(path);
                }
            }
            if let Some(name) = chat.partner_name {
                if !name.trim().is_empty() {
                    self.partner_name = Some(name.trim().to_string());
                }
            }
        }
        if let Some(output) = incoming.output {
            if let Some(format) = output.format {
                if !format.trim().is_empty() {
                    self.output_format = format.parse()?;
                }
            }
            if let Some(pretty) = output.pretty {
                self.pretty = pretty;
            }
        }
        Ok(())
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(HOME_DIR_NAME))
        }
    })
}
