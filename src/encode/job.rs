use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use crate::{
    compose::layer::VisualLayer,
    foundation::{
        core::{Canvas, Fps},
        error::{ReelError, ReelResult},
    },
};

/// Output parameters handed to the media compiler unchanged.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeSettings {
    pub canvas: Canvas,
    pub fps: Fps,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub audio_bitrate: String,
    pub overwrite: bool,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas::PORTRAIT_HD,
            fps: Fps { num: 24, den: 1 },
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            audio_bitrate: "192k".to_string(),
            overwrite: true,
        }
    }
}

impl EncodeSettings {
    pub fn validate(&self) -> ReelResult<()> {
        self.canvas.validate()?;
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(ReelError::validation("encode fps must be non-zero"));
        }
        for (name, v) in [
            ("video_codec", &self.video_codec),
            ("audio_codec", &self.audio_codec),
            ("preset", &self.preset),
        ] {
            if v.trim().is_empty() {
                return Err(ReelError::validation(format!("encode {name} must not be empty")));
            }
        }
        Ok(())
    }
}

/// One concatenated piece of the output, already fitted to the timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct JobSegment {
    pub label: String,
    pub layers: Vec<VisualLayer>,
    pub duration_secs: f64,
    /// Narration; `None` is rendered as silence.
    pub audio: Option<PathBuf>,
    pub fade_in_secs: f64,
}

/// Background music looped or trimmed under the narration.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MusicBed {
    pub path: PathBuf,
    /// Linear gain relative to narration.
    pub gain: f64,
}

/// Persistent text mark over the whole timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Watermark {
    pub text: String,
    pub font_family: String,
    pub font_size: u32,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "Noto Sans".to_string(),
            font_size: 36,
            opacity: 0.6,
        }
    }
}

/// Tail fade applied to both video and audio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FadeOut {
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// Everything needed to produce the final artifact.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MediaJob {
    pub segments: Vec<JobSegment>,
    pub music: Option<MusicBed>,
    pub watermark: Option<Watermark>,
    pub fade_out: Option<FadeOut>,
    pub settings: EncodeSettings,
    pub out_path: PathBuf,
}

impl MediaJob {
    /// Runtime of the concatenated segments.
    pub fn total_secs(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }
}

/// Encodes a [`MediaJob`] into one output file.
pub trait MediaCompiler: Send + Sync {
    fn compile(&self, job: &MediaJob) -> ReelResult<PathBuf>;
}

/// Compiler that records jobs instead of encoding. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingCompiler {
    jobs: Mutex<Vec<MediaJob>>,
    fail_with: Option<String>,
}

impl RecordingCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A compiler whose every call fails with `msg`.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            fail_with: Some(msg.into()),
        }
    }

    pub fn jobs(&self) -> Vec<MediaJob> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MediaCompiler for RecordingCompiler {
    fn compile(&self, job: &MediaJob) -> ReelResult<PathBuf> {
        if let Some(msg) = &self.fail_with {
            return Err(ReelError::compiler(msg.clone()));
        }
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(job.clone());
        Ok(job.out_path.clone())
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/job.rs"]
mod tests;
