use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    foundation::error::{ReelError, ReelResult},
    theme::resolver::Theme,
};

/// Mood used when a configured classifier fails.
pub const FALLBACK_MOOD: &str = "Peaceful";

/// The director's reading of a script. Only `mood` drives assembly.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct Screenplay {
    pub mood: String,
    #[serde(default)]
    pub music_style: Option<String>,
}

/// External "director" that reads the whole script and names its mood.
pub trait MoodClassifier: Send + Sync {
    fn classify(&self, corpus: &str) -> ReelResult<Screenplay>;
}

/// Screenplay JSON written ahead of time by the director.
#[derive(Clone, Debug)]
pub struct ScreenplayFile {
    path: PathBuf,
}

impl ScreenplayFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MoodClassifier for ScreenplayFile {
    fn classify(&self, _corpus: &str) -> ReelResult<Screenplay> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read screenplay '{}'", self.path.display()))?;
        let play: Screenplay = serde_json::from_str(&raw)
            .map_err(|e| ReelError::serde(format!("screenplay '{}': {e}", self.path.display())))?;
        if play.mood.trim().is_empty() {
            return Err(ReelError::validation("screenplay mood is empty"));
        }
        Ok(play)
    }
}

/// Classifier that always answers with one mood.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedMood(pub String);

impl MoodClassifier for FixedMood {
    fn classify(&self, _corpus: &str) -> ReelResult<Screenplay> {
        Ok(Screenplay {
            mood: self.0.clone(),
            music_style: None,
        })
    }
}

/// Mood for music selection.
///
/// A configured classifier wins; if it fails the run continues with [`FALLBACK_MOOD`].
/// Without a classifier the theme's own mood label is used.
pub fn resolve_mood(classifier: Option<&dyn MoodClassifier>, corpus: &str, theme: &Theme) -> String {
    let Some(classifier) = classifier else {
        return theme.mood_label.clone();
    };
    match classifier.classify(corpus) {
        Ok(play) => {
            tracing::info!(mood = %play.mood, style = ?play.music_style, "director mood");
            play.mood
        }
        Err(e) => {
            tracing::warn!(error = %e, fallback = FALLBACK_MOOD, "director unavailable");
            FALLBACK_MOOD.to_string()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/mood.rs"]
mod tests;
