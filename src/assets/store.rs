use std::path::{Path, PathBuf};

/// One candidate background-music file and the mood it was filed under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MusicTrack {
    /// Audio file path.
    pub path: PathBuf,
    /// Mood label (lowercase); empty when the track is not filed under a mood.
    pub mood: String,
}

/// Lookup of optional imagery and music.
///
/// Absence is never an error: an empty result only means "no optional layer".
pub trait AssetStore: Send + Sync {
    /// Foreground images for a category, best match first.
    fn category_images(&self, aliases: &[&str]) -> Vec<PathBuf>;
    /// Every background track in the library.
    fn music_tracks(&self) -> Vec<MusicTrack>;
}

const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "webp"];
const AUDIO_EXTS: &[&str] = &["mp3", "wav", "m4a", "aac", "ogg", "flac"];

/// Filesystem asset store.
///
/// - images: `<images_root>/<alias>.<ext>` where the stem matches an alias ignoring case and
///   punctuation (`Mesh (Aries).png` matches `mesh`, `aries` and `Mesh (Aries)`).
/// - music: `<music_root>/<mood>/<track>` or loose files directly under `<music_root>`.
#[derive(Clone, Debug, Default)]
pub struct FsAssetStore {
    images_root: Option<PathBuf>,
    music_root: Option<PathBuf>,
}

impl FsAssetStore {
    /// Store over the given roots; `None` disables that asset kind.
    pub fn new(images_root: Option<PathBuf>, music_root: Option<PathBuf>) -> Self {
        Self {
            images_root,
            music_root,
        }
    }
}

impl AssetStore for FsAssetStore {
    fn category_images(&self, aliases: &[&str]) -> Vec<PathBuf> {
        let Some(root) = &self.images_root else {
            return Vec::new();
        };
        let wanted: Vec<String> = aliases.iter().map(|a| asset_stem_key(a)).collect();
        let mut exact = Vec::new();
        let mut partial = Vec::new();
        for path in sorted_files(root, IMAGE_EXTS) {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = asset_stem_key(stem);
            if wanted.iter().any(|w| *w == key) {
                exact.push(path);
            } else if stem_words(stem).any(|word| wanted.iter().any(|w| *w == word)) {
                partial.push(path);
            }
        }
        exact.extend(partial);
        exact
    }

    fn music_tracks(&self) -> Vec<MusicTrack> {
        let Some(root) = &self.music_root else {
            return Vec::new();
        };
        let mut out: Vec<MusicTrack> = sorted_files(root, AUDIO_EXTS)
            .into_iter()
            .map(|path| MusicTrack {
                path,
                mood: String::new(),
            })
            .collect();
        for dir in sorted_dirs(root) {
            let mood = dir
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_lowercase();
            out.extend(
                sorted_files(&dir, AUDIO_EXTS)
                    .into_iter()
                    .map(|path| MusicTrack {
                        path,
                        mood: mood.clone(),
                    }),
            );
        }
        out
    }
}

/// Lowercase alphanumeric key for a file stem or alias.
pub(crate) fn asset_stem_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn stem_words(stem: &str) -> impl Iterator<Item = String> + '_ {
    stem.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(asset_stem_key)
}

fn sorted_files(dir: &Path, exts: &[&str]) -> Vec<PathBuf> {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = rd
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
        })
        .collect();
    out.sort();
    out
}

fn sorted_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = rd
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    out.sort();
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
