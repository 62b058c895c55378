use crate::assets::store::asset_stem_key;
use crate::foundation::core::Rgb8;

/// Classical element of a sign; drives the palette family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
    Neutral,
}

/// Deterministic visual style for one category.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Theme {
    /// Canonical category key (lowercase, e.g. `mesh`).
    pub category_key: String,
    /// Human title, e.g. `मेष (Aries)`.
    pub display_name: String,
    /// Background gradient stops, top to bottom. Always at least two.
    pub color_ramp: Vec<Rgb8>,
    pub accent: Rgb8,
    pub element: Element,
    /// Default mood when the director offers none; only used for music selection.
    pub mood_label: String,
}

impl Theme {
    /// Every alias an asset file for this category may be named after.
    pub fn aliases(&self) -> Vec<&str> {
        let mut out = vec![self.category_key.as_str()];
        if let Some(entry) = SIGNS.iter().find(|s| s.key == self.category_key) {
            out.push(entry.english);
            out.push(entry.devanagari);
        }
        out
    }
}

struct SignEntry {
    key: &'static str,
    english: &'static str,
    devanagari: &'static str,
    element: Element,
    ramp: [&'static str; 3],
    accent: &'static str,
}

const SIGNS: &[SignEntry] = &[
    SignEntry { key: "mesh", english: "Aries", devanagari: "मेष", element: Element::Fire, ramp: ["#2b0a0a", "#8c1c13", "#f2542d"], accent: "#ffd166" },
    SignEntry { key: "vrishabh", english: "Taurus", devanagari: "वृषभ", element: Element::Earth, ramp: ["#0f1f12", "#2d6a4f", "#95d5b2"], accent: "#f4e285" },
    SignEntry { key: "mithun", english: "Gemini", devanagari: "मिथुन", element: Element::Air, ramp: ["#14213d", "#3a86ff", "#bde0fe"], accent: "#ffbe0b" },
    SignEntry { key: "kark", english: "Cancer", devanagari: "कर्क", element: Element::Water, ramp: ["#03045e", "#0077b6", "#90e0ef"], accent: "#e0fbfc" },
    SignEntry { key: "singh", english: "Leo", devanagari: "सिंह", element: Element::Fire, ramp: ["#3d1600", "#e85d04", "#ffba08"], accent: "#fff3b0" },
    SignEntry { key: "kanya", english: "Virgo", devanagari: "कन्या", element: Element::Earth, ramp: ["#1b1b0f", "#606c38", "#dda15e"], accent: "#fefae0" },
    SignEntry { key: "tula", english: "Libra", devanagari: "तुला", element: Element::Air, ramp: ["#240046", "#7b2cbf", "#e0aaff"], accent: "#ffd6ff" },
    SignEntry { key: "vrishchik", english: "Scorpio", devanagari: "वृश्चिक", element: Element::Water, ramp: ["#10002b", "#5a189a", "#c77dff"], accent: "#ff006e" },
    SignEntry { key: "dhanu", english: "Sagittarius", devanagari: "धनु", element: Element::Fire, ramp: ["#370617", "#9d0208", "#faa307"], accent: "#ffe8d6" },
    SignEntry { key: "makar", english: "Capricorn", devanagari: "मकर", element: Element::Earth, ramp: ["#0b090a", "#403d39", "#ccc5b9"], accent: "#eb5e28" },
    SignEntry { key: "kumbh", english: "Aquarius", devanagari: "कुंभ", element: Element::Air, ramp: ["#001219", "#005f73", "#94d2bd"], accent: "#e9d8a6" },
    SignEntry { key: "meen", english: "Pisces", devanagari: "मीन", element: Element::Water, ramp: ["#012a4a", "#2a6f97", "#a9d6e5"], accent: "#caf0f8" },
];

const DEFAULT_KEY: &str = "default";
const DEFAULT_RAMP: [Rgb8; 2] = [Rgb8::new(20, 20, 30), Rgb8::new(58, 52, 92)];
const DEFAULT_ACCENT: Rgb8 = Rgb8::new(255, 215, 0);

fn element_mood(element: Element) -> &'static str {
    match element {
        Element::Fire => "energetic",
        Element::Earth => "peaceful",
        Element::Air => "mysterious",
        Element::Water => "peaceful",
        Element::Neutral => "peaceful",
    }
}

/// Static category-to-theme table.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThemeResolver;

impl ThemeResolver {
    /// Theme for `category`.
    ///
    /// Accepts the transliterated key (`Mesh`), the English name (`aries`), the Devanagari
    /// name (`मेष`) or the combined form (`Mesh (Aries)`), ignoring case and punctuation.
    /// Anything else resolves to one fixed neutral theme.
    pub fn resolve(&self, category: &str) -> Theme {
        match find_sign(category) {
            Some(sign) => sign_theme(sign),
            None => {
                tracing::debug!(category, "unmapped category; neutral theme");
                default_theme(category)
            }
        }
    }

    /// Every mapped theme, in zodiac order.
    pub fn all(&self) -> Vec<Theme> {
        SIGNS.iter().map(sign_theme).collect()
    }
}

fn find_sign(category: &str) -> Option<&'static SignEntry> {
    let whole = asset_stem_key(category);
    if whole.is_empty() {
        return None;
    }
    let matches_whole = |s: &SignEntry| {
        whole == s.key || whole == asset_stem_key(s.english) || whole == asset_stem_key(s.devanagari)
    };
    if let Some(sign) = SIGNS.iter().find(|s| matches_whole(s)) {
        return Some(sign);
    }
    // "Mesh (Aries)": the leading word decides.
    let first = category
        .split(|c: char| !c.is_alphanumeric() && !is_devanagari_mark(c))
        .find(|w| !w.is_empty())
        .map(asset_stem_key)?;
    SIGNS.iter().find(|s| {
        first == s.key || first == asset_stem_key(s.english) || first == asset_stem_key(s.devanagari)
    })
}

// Devanagari vowel signs and virama are not alphanumeric but belong to the word.
fn is_devanagari_mark(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn sign_theme(sign: &SignEntry) -> Theme {
    let ramp = sign
        .ramp
        .iter()
        .filter_map(|h| Rgb8::parse_hex(h).ok())
        .collect::<Vec<_>>();
    let color_ramp = if ramp.len() >= 2 { ramp } else { DEFAULT_RAMP.to_vec() };
    Theme {
        category_key: sign.key.to_string(),
        display_name: format!("{} ({})", sign.devanagari, sign.english),
        color_ramp,
        accent: Rgb8::parse_hex(sign.accent).unwrap_or(DEFAULT_ACCENT),
        element: sign.element,
        mood_label: element_mood(sign.element).to_string(),
    }
}

fn default_theme(category: &str) -> Theme {
    let title = category.trim();
    Theme {
        category_key: DEFAULT_KEY.to_string(),
        display_name: if title.is_empty() { "राशिफल".to_string() } else { title.to_string() },
        color_ramp: DEFAULT_RAMP.to_vec(),
        accent: DEFAULT_ACCENT,
        element: Element::Neutral,
        mood_label: element_mood(Element::Neutral).to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/theme/resolver.rs"]
mod tests;
