use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};

/// Script section identifier.
///
/// The vocabulary is open: keys the generator invents are carried as [`SectionKey::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SectionKey {
    Hook,
    Intro,
    Love,
    Career,
    Money,
    Health,
    Remedy,
    LuckyColor,
    LuckyNumber,
    LuckyDates,
    LuckyMonths,
    Other(String),
}

impl SectionKey {
    /// Known keys in narration order.
    pub const ORDERED: &'static [SectionKey] = &[
        SectionKey::Hook,
        SectionKey::Intro,
        SectionKey::Love,
        SectionKey::Career,
        SectionKey::Money,
        SectionKey::Health,
        SectionKey::Remedy,
        SectionKey::LuckyColor,
        SectionKey::LuckyNumber,
        SectionKey::LuckyDates,
        SectionKey::LuckyMonths,
    ];

    /// Sections that survive any amount of duration pressure.
    pub const PROTECTED: &'static [SectionKey] = &[
        SectionKey::Hook,
        SectionKey::Love,
        SectionKey::Career,
        SectionKey::Remedy,
    ];

    /// Editorial drop order under duration pressure, first dropped first.
    pub const DROPPABLE: &'static [SectionKey] = &[
        SectionKey::Intro,
        SectionKey::Health,
        SectionKey::LuckyNumber,
        SectionKey::LuckyColor,
        SectionKey::Money,
        SectionKey::LuckyDates,
        SectionKey::LuckyMonths,
    ];

    /// Parse a generator key; unknown keys are kept verbatim.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hook" => Self::Hook,
            "intro" => Self::Intro,
            "love" => Self::Love,
            "career" => Self::Career,
            "money" => Self::Money,
            "health" => Self::Health,
            "remedy" => Self::Remedy,
            "lucky_color" => Self::LuckyColor,
            "lucky_number" => Self::LuckyNumber,
            "lucky_dates" => Self::LuckyDates,
            "lucky_months" => Self::LuckyMonths,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Canonical key string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hook => "hook",
            Self::Intro => "intro",
            Self::Love => "love",
            Self::Career => "career",
            Self::Money => "money",
            Self::Health => "health",
            Self::Remedy => "remedy",
            Self::LuckyColor => "lucky_color",
            Self::LuckyNumber => "lucky_number",
            Self::LuckyDates => "lucky_dates",
            Self::LuckyMonths => "lucky_months",
            Self::Other(s) => s,
        }
    }

    /// `true` for keys in [`SectionKey::ORDERED`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for SectionKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for SectionKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// One content block ready for narration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub key: SectionKey,
    /// Text handed to the narrator, normalized for pronunciation.
    pub spoken_text: String,
    /// Text shown on screen; may keep bilingual annotations.
    pub display_text: String,
}

/// Raw generator output: section key to text, in file order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    entries: Vec<(String, String)>,
}

impl Script {
    /// Build from `(key, text)` pairs; a repeated key replaces the earlier text in place.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut script = Self::default();
        for (k, v) in pairs {
            script.insert(k.into(), v.into());
        }
        script
    }

    /// Parse a generator JSON object. Numbers and booleans are stringified, arrays of
    /// scalars are joined with `", "`, nulls and nested objects are ignored.
    pub fn from_json_str(json: &str) -> ReelResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ReelError::serde(format!("script json parse failed: {e}")))?;
        let serde_json::Value::Object(map) = value else {
            return Err(ReelError::validation("script json must be an object"));
        };
        let mut script = Self::default();
        for (key, v) in map {
            if let Some(text) = scalar_text(&v) {
                script.insert(key, text);
            } else if let serde_json::Value::Array(items) = &v {
                let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
                if !parts.is_empty() {
                    script.insert(key, parts.join(", "));
                }
            }
        }
        Ok(script)
    }

    /// Read and parse a generator JSON file.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        use anyhow::Context as _;
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read script '{}'", path.display()))?;
        Self::from_json_str(&raw)
    }

    fn insert(&mut self, key: String, text: String) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = text;
        } else {
            self.entries.push((key, text));
        }
    }

    /// Text for `key`, matched case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All section texts joined, in file order; input to the mood classifier.
    pub fn corpus(&self) -> String {
        self.entries
            .iter()
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn scalar_text(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/section.rs"]
mod tests;
