use rand::Rng;
use rand::seq::SliceRandom;

use crate::assets::store::MusicTrack;

/// Related moods; a track filed under any member serves the others.
pub const MOOD_FAMILIES: &[&[&str]] = &[
    &["energetic", "upbeat", "dynamic"],
    &["peaceful", "calm", "ambient", "meditation"],
    &["mysterious", "dark", "ambient drone", "cinematic"],
];

/// How a background track was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicMatch {
    Exact,
    Family,
    Random,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MusicChoice {
    pub track: MusicTrack,
    pub matched: MusicMatch,
}

/// Lowercase, trim and collapse `_`, `-` and whitespace runs to one space.
pub fn normalize_mood(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Family containing `mood` (normalized), if any.
pub fn mood_family(mood: &str) -> Option<&'static [&'static str]> {
    let mood = normalize_mood(mood);
    MOOD_FAMILIES.iter().copied().find(|f| f.contains(&mood.as_str()))
}

// Filed tracks match on their folder; loose tracks on words of their file name.
fn track_matches(track: &MusicTrack, label: &str) -> bool {
    let filed = normalize_mood(&track.mood);
    if !filed.is_empty() {
        return filed == label;
    }
    let stem = track
        .path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(normalize_mood)
        .unwrap_or_default();
    format!(" {stem} ").contains(&format!(" {label} "))
}

/// Pick a background track for `mood`: exact match, then family match, then any track.
///
/// Ties inside a tier are broken uniformly at random with `rng`.
pub fn select_track<R: Rng + ?Sized>(
    tracks: &[MusicTrack],
    mood: &str,
    rng: &mut R,
) -> Option<MusicChoice> {
    let mood = normalize_mood(mood);

    let exact: Vec<&MusicTrack> = if mood.is_empty() {
        Vec::new()
    } else {
        tracks.iter().filter(|t| track_matches(t, &mood)).collect()
    };
    if let Some(t) = exact.choose(rng) {
        return Some(MusicChoice {
            track: (*t).clone(),
            matched: MusicMatch::Exact,
        });
    }

    if let Some(family) = mood_family(&mood) {
        let related: Vec<&MusicTrack> = tracks
            .iter()
            .filter(|t| family.iter().any(|m| *m != mood && track_matches(t, m)))
            .collect();
        if let Some(t) = related.choose(rng) {
            return Some(MusicChoice {
                track: (*t).clone(),
                matched: MusicMatch::Family,
            });
        }
    }

    tracks.choose(rng).map(|t| MusicChoice {
        track: t.clone(),
        matched: MusicMatch::Random,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/music.rs"]
mod tests;
