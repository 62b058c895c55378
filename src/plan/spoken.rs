/// Derives narrator-friendly text from display text.
///
/// Parenthesised Latin annotations (`मेष (Aries)`) are removed so the narrator never
/// switches language mid-sentence; symbol substitutions are applied after that.
#[derive(Clone, Debug)]
pub struct SpokenNormalizer {
    substitutions: Vec<(String, String)>,
}

impl Default for SpokenNormalizer {
    fn default() -> Self {
        Self::new(default_substitutions())
    }
}

/// Hindi substitutions for symbols the narrator would otherwise spell out in English.
pub fn default_substitutions() -> Vec<(String, String)> {
    [("&", "और"), ("%", "प्रतिशत"), ("₹", "रुपये"), ("+", "प्लस")]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

impl SpokenNormalizer {
    /// Normalizer applying `substitutions` in order.
    pub fn new(substitutions: Vec<(String, String)>) -> Self {
        let substitutions = substitutions
            .into_iter()
            .filter(|(from, _)| !from.is_empty())
            .collect();
        Self { substitutions }
    }

    /// Spoken form of `display`.
    pub fn normalize(&self, display: &str) -> String {
        let mut text = strip_latin_annotations(display);
        for (from, to) in &self.substitutions {
            if text.contains(from.as_str()) {
                text = text.replace(from.as_str(), &format!(" {to} "));
            }
        }
        collapse_whitespace(&text)
    }
}

fn strip_latin_annotations(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('(') {
        let (before, after_open) = rest.split_at(open);
        out.push_str(before);
        let inner_start = &after_open[1..];
        match inner_start.find(')') {
            Some(close) if is_latin_annotation(&inner_start[..close]) => {
                rest = &inner_start[close + 1..];
            }
            _ => {
                out.push('(');
                rest = inner_start;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_latin_annotation(inner: &str) -> bool {
    let trimmed = inner.trim();
    !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_alphabetic())
        && trimmed.is_ascii()
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        // Keep punctuation attached to the preceding word.
        if !out.is_empty() && !word.starts_with(['।', ',', '.', '!', '?']) {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/plan/spoken.rs"]
mod tests;
