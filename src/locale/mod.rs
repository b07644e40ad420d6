use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::chat::Patterns;

include!(concat!(env!("OUT_DIR"), "/embedded_locale_packs.rs"));

pub const DEFAULT_LOCALE: &str = "ko";

/// Literal tables for one chat UI language, as written in `src/locale/<code>.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalePack {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub ui: UiSection,
    #[serde(default)]
    pub time: TimeSection,
    #[serde(default)]
    pub pronouns: PronounSection,
    #[serde(default)]
    pub names: NameSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UiSection {
    #[serde(default)]
    pub placeholders: Vec<String>,
    #[serde(default)]
    pub boilerplate: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSection {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub time_of_day: String,
    #[serde(default)]
    pub full_date: String,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub relative_dates: Vec<String>,
    #[serde(default)]
    pub weekdays: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PronounSection {
    #[serde(default)]
    pub first_person: Vec<String>,
    #[serde(default)]
    pub second_person: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameSection {
    #[serde(default)]
    pub prefixes: Vec<String>,
}

pub fn available_locales() -> &'static [&'static str] {
    EMBEDDED_LOCALE_CODES
}

pub fn load_locale_pack(code: &str) -> Result<LocalePack> {
    let code = normalize_code(code);
    let raw = embedded_locale_pack(&code).ok_or_else(|| {
        anyhow!(
            "locale pack not found: {} (available: {})",
            code,
            available_locales().join(", ")
        )
    })?;
    parse_locale_pack(raw).with_context(|| format!("failed to parse locale pack: {}", code))
}

pub fn load_locale_pack_file(path: &Path) -> Result<LocalePack> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read locale pack: {}", path.display()))?;
    parse_locale_pack(&content)
        .with_context(|| format!("failed to parse locale pack: {}", path.display()))
}

/// Loads a pack (file path wins over code) and compiles it into matchers.
pub fn load_patterns(code: &str, path: Option<&Path>) -> Result<Patterns> {
    let pack = match path {
        Some(path) => load_locale_pack_file(path)?,
        None => load_locale_pack(code)?,
    };
    Patterns::compile(&pack)
        .with_context(|| format!("failed to compile locale pack: {}", pack.code))
}

fn parse_locale_pack(raw: &str) -> Result<LocalePack> {
    let pack: LocalePack = toml::from_str(raw)?;
    if pack.time.timestamp.trim().is_empty() {
        return Err(anyhow!("[time] timestamp pattern is empty"));
    }
    Ok(pack)
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn embedded_packs_parse_and_compile() {
        for code in available_locales() {
            let pack = load_locale_pack(code).expect("pack");
            assert_eq!(&pack.code, code);
            Patterns::compile(&pack).expect("compile");
        }
    }

    #[test]
    fn locale_codes_are_case_insensitive() {
        let pack = load_locale_pack(" KO ").expect("pack");
        assert_eq!(pack.code, "ko");
    }

    #[test]
    fn unknown_locale_is_an_error() {
        let err = load_locale_pack("xx").unwrap_err();
        assert!(err.to_string().contains("locale pack not found"));
    }

    #[test]
    fn pack_file_overrides_embedded_tables() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
code = "custom"
[ui]
placeholders = ["Write here"]
[time]
timestamp = '\d{1,2}h\d{2}'
"#,
        )
        .expect("write pack");
        let patterns = load_patterns("ko", Some(&path)).expect("patterns");
        assert!(patterns.is_ui_garbage("Write here"));
        assert!(patterns.is_timestamp("14h05"));
        assert!(!patterns.is_timestamp("오후 3:45"));
    }

    #[test]
    fn invalid_regex_surfaces_as_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "code = \"broken\"\n[time]\ntimestamp = '(unclosed'\n").expect("write");
        assert!(load_patterns("ko", Some(&path)).is_err());
    }
}
