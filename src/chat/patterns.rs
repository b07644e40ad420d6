use anyhow::{Context, Result};
use regex::Regex;

use super::BBoxPx;
use crate::locale::LocalePack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameMode {
    /// 2-15 characters, top 30% of the screen.
    Loose,
    /// 2-6 characters, top 25% of the screen.
    Strict,
}

#[derive(Debug, Clone)]
struct Matcher {
    search: Regex,
    whole: Regex,
}

impl Matcher {
    fn compile(source: &str) -> Result<Self> {
        let search =
            Regex::new(source).with_context(|| format!("invalid pattern: {}", source))?;
        let whole = Regex::new(&format!("^(?:{})$", source))
            .with_context(|| format!("invalid pattern: {}", source))?;
        Ok(Self { search, whole })
    }

    fn compile_optional(source: &str) -> Result<Option<Self>> {
        if source.trim().is_empty() {
            return Ok(None);
        }
        Self::compile(source).map(Some)
    }

    fn found_in(&self, text: &str) -> bool {
        self.search.is_match(text)
    }

    fn matches_whole(&self, text: &str) -> bool {
        self.whole.is_match(text.trim())
    }
}

/// Compiled literal rules for one locale. Read-only once built.
#[derive(Debug, Clone)]
pub struct Patterns {
    code: String,
    placeholders: Vec<String>,
    boilerplate: Vec<String>,
    timestamp: Matcher,
    time_of_day: Option<Matcher>,
    full_date: Option<Matcher>,
    dates: Vec<Matcher>,
    relative_dates: Vec<String>,
    weekdays: Vec<String>,
    first_person: Vec<String>,
    second_person: Vec<String>,
    name_prefixes: Vec<String>,
}

impl Patterns {
    pub fn compile(pack: &LocalePack) -> Result<Self> {
        let dates = pack
            .time
            .dates
            .iter()
            .filter(|source| !source.trim().is_empty())
            .map(|source| Matcher::compile(source))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            code: pack.code.clone(),
            placeholders: normalize_all(&pack.ui.placeholders),
            boilerplate: trim_all(&pack.ui.boilerplate),
            timestamp: Matcher::compile(&pack.time.timestamp)?,
            time_of_day: Matcher::compile_optional(&pack.time.time_of_day)?,
            full_date: Matcher::compile_optional(&pack.time.full_date)?,
            dates,
            relative_dates: normalize_all(&pack.time.relative_dates),
            weekdays: normalize_all(&pack.time.weekdays),
            first_person: normalize_all(&pack.pronouns.first_person),
            second_person: normalize_all(&pack.pronouns.second_person),
            name_prefixes: pack
                .names
                .prefixes
                .iter()
                .filter(|prefix| !prefix.is_empty())
                .cloned()
                .collect(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Input placeholders, bare clock readings and full date banners.
    pub fn is_ui_garbage(&self, text: &str) -> bool {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return true;
        }
        if self.placeholders.iter().any(|item| *item == normalized) {
            return true;
        }
        if let Some(matcher) = &self.time_of_day {
            if matcher.matches_whole(text) {
                return true;
            }
        }
        if let Some(matcher) = &self.full_date {
            if matcher.matches_whole(text) {
                return true;
            }
        }
        false
    }

    pub fn is_timestamp(&self, text: &str) -> bool {
        self.timestamp.matches_whole(text)
    }

    pub fn is_date(&self, text: &str) -> bool {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return false;
        }
        if self.relative_dates.iter().any(|term| *term == normalized) {
            return true;
        }
        if self
            .full_date
            .as_ref()
            .is_some_and(|matcher| matcher.matches_whole(text))
        {
            return true;
        }
        self.dates.iter().any(|matcher| matcher.matches_whole(text))
    }

    pub fn contains_date_or_time(&self, text: &str) -> bool {
        self.timestamp.found_in(text)
            || self
                .full_date
                .as_ref()
                .is_some_and(|matcher| matcher.found_in(text))
            || self.dates.iter().any(|matcher| matcher.found_in(text))
    }

    /// A divider line such as "2024년 1월 2일 화요일": a full date, or a date
    /// and a weekday with nothing else on the line. Relative terms and bare
    /// month-day fragments are message content.
    pub fn is_date_divider(&self, text: &str) -> bool {
        if self
            .full_date
            .as_ref()
            .is_some_and(|matcher| matcher.matches_whole(text))
        {
            return true;
        }
        let normalized = normalize(text);
        let has_weekday = self
            .weekdays
            .iter()
            .any(|day| normalized.contains(day.as_str()));
        if !has_weekday || !self.dates.iter().any(|matcher| matcher.found_in(&normalized)) {
            return false;
        }
        let mut residue = normalized;
        for matcher in &self.dates {
            residue = matcher.search.replace_all(&residue, "").into_owned();
        }
        for day in &self.weekdays {
            residue = residue.replace(day.as_str(), "");
        }
        !residue.chars().any(char::is_alphanumeric)
    }

    pub(crate) fn is_name_like(
        &self,
        text: &str,
        bbox: &BBoxPx,
        height: u32,
        mode: NameMode,
    ) -> bool {
        let (min_len, max_len, band) = match mode {
            NameMode::Loose => (2, 15, 0.30),
            NameMode::Strict => (2, 6, 0.25),
        };
        if (bbox.y as f32) >= height as f32 * band {
            return false;
        }
        let name = self.strip_name_prefix(text);
        let len = name.chars().count();
        if len < min_len || len > max_len {
            return false;
        }
        if !name
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        {
            return false;
        }
        if name.chars().all(|ch| ch.is_ascii_digit() || ch.is_whitespace()) {
            return false;
        }
        !(self.is_timestamp(name)
            || self.is_date(name)
            || self.is_ui_garbage(name)
            || self.is_boilerplate(name))
    }

    pub fn has_first_person(&self, text: &str) -> bool {
        self.first_person
            .iter()
            .any(|literal| contains_literal(text, literal))
    }

    pub fn has_second_person(&self, text: &str) -> bool {
        self.second_person
            .iter()
            .any(|literal| contains_literal(text, literal))
    }

    /// Read receipts and similar status text. Case-sensitive, whole text only.
    pub fn is_boilerplate(&self, text: &str) -> bool {
        let trimmed = text.trim();
        !trimmed.is_empty() && self.boilerplate.iter().any(|item| item == trimmed)
    }

    pub fn starts_with_name_prefix(&self, text: &str) -> bool {
        let trimmed = text.trim_start();
        self.name_prefixes
            .iter()
            .any(|prefix| trimmed.starts_with(prefix.as_str()))
    }

    /// Strips leading arrows, bullets and dashes.
    pub fn strip_name_prefix<'t>(&self, text: &'t str) -> &'t str {
        let mut current = text.trim();
        loop {
            let stripped = self
                .name_prefixes
                .iter()
                .find_map(|prefix| current.strip_prefix(prefix.as_str()));
            match stripped {
                Some(rest) => current = rest.trim_start(),
                None => return current.trim(),
            }
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn trim_all(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn normalize_all(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| normalize(value))
        .filter(|value| !value.is_empty())
        .collect()
}

/// ASCII literals match whole words; other scripts match as substrings
/// since Korean particles attach directly to the word.
fn contains_literal(text: &str, literal: &str) -> bool {
    if literal.is_ascii() {
        text.split(|ch: char| !(ch.is_alphanumeric() || ch == '\''))
            .any(|token| !token.is_empty() && token.to_lowercase() == literal)
    } else {
        text.to_lowercase().contains(literal)
    }
}
