//! Run configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a valid
//! configuration for 1080x1920 shorts at 24 fps under a 58 s budget.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    assemble::assembler::AssemblerSettings,
    compose::{
        caption::CaptionStyle,
        composer::{BackendKind, ComposerSettings},
    },
    encode::job::{EncodeSettings, Watermark},
    foundation::{
        core::{Canvas, Fps},
        error::{ReelError, ReelResult},
    },
    narration::narrator::NarratorCommand,
    plan::{
        planner::PlannerPolicy,
        section::SectionKey,
        spoken::{SpokenNormalizer, default_substitutions},
    },
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Sample rate of the frame-simulation backend.
    pub sample_fps: Fps,
    /// Planner budget for the whole video, title card included.
    pub duration_ceiling_secs: f64,
    /// Absolute maximum enforced by the assembler.
    pub hard_max_secs: f64,
    pub fade_out_secs: f64,
    pub breath_pause_secs: f64,
    pub min_section_chars: usize,
    pub title_scene: bool,
    pub title_secs: f64,
    /// Second line of the title card, e.g. a date.
    pub title_subline: String,
    pub scene_fade_in_secs: f64,
    pub music_gain: f64,
    pub caption: CaptionStyle,
    pub backend: BackendKind,
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub preset: String,
    pub parallel: bool,
    pub threads: Option<usize>,
    pub images_dir: Option<PathBuf>,
    pub music_dir: Option<PathBuf>,
    /// Parent of the per-run scratch directory; system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    pub keep_scratch: bool,
    pub watermark: Option<Watermark>,
    /// Narrators tried in order; the next one takes over on rate limiting.
    pub narrators: Vec<NarratorCommand>,
    /// Replaces the default droppable order.
    pub droppable: Option<Vec<SectionKey>>,
    /// Replaces the default spoken-text substitutions, as `[from, to]` pairs.
    pub substitutions: Option<Vec<(String, String)>>,
    /// Seed for music selection; random per run when unset.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let encode = EncodeSettings::default();
        let composer = ComposerSettings::default();
        Self {
            canvas: Canvas::PORTRAIT_HD,
            fps: encode.fps,
            sample_fps: composer.sample_fps,
            duration_ceiling_secs: 58.0,
            hard_max_secs: 59.0,
            fade_out_secs: 0.5,
            breath_pause_secs: 0.5,
            min_section_chars: 5,
            title_scene: true,
            title_secs: composer.title_secs,
            title_subline: String::new(),
            scene_fade_in_secs: composer.fade_in_secs,
            music_gain: 0.15,
            caption: CaptionStyle::default(),
            backend: BackendKind::Direct,
            video_codec: encode.video_codec,
            audio_codec: encode.audio_codec,
            audio_bitrate: encode.audio_bitrate,
            preset: encode.preset,
            parallel: false,
            threads: None,
            images_dir: None,
            music_dir: None,
            scratch_dir: None,
            keep_scratch: false,
            watermark: None,
            narrators: Vec::new(),
            droppable: None,
            substitutions: None,
            seed: None,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> ReelResult<Self> {
        serde_json::from_str(json).map_err(|e| ReelError::serde(format!("config: {e}")))
    }

    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Reject impossible settings. `require_narrators` is set when the run will narrate
    /// through configured commands rather than injected narrators.
    pub fn validate(&self, require_narrators: bool) -> ReelResult<()> {
        self.encode_settings().validate()?;
        if self.sample_fps.num == 0 || self.sample_fps.den == 0 {
            return Err(ReelError::validation("sample_fps must be non-zero"));
        }
        for (name, v) in [
            ("duration_ceiling_secs", self.duration_ceiling_secs),
            ("hard_max_secs", self.hard_max_secs),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ReelError::validation(format!("{name} must be positive")));
            }
        }
        if self.duration_ceiling_secs > self.hard_max_secs {
            return Err(ReelError::validation(format!(
                "duration_ceiling_secs ({}) exceeds hard_max_secs ({})",
                self.duration_ceiling_secs, self.hard_max_secs
            )));
        }
        for (name, v) in [
            ("fade_out_secs", self.fade_out_secs),
            ("breath_pause_secs", self.breath_pause_secs),
            ("scene_fade_in_secs", self.scene_fade_in_secs),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ReelError::validation(format!("{name} must be >= 0")));
            }
        }
        if !(0.0..=1.0).contains(&self.music_gain) {
            return Err(ReelError::validation("music_gain must be within [0, 1]"));
        }
        if self.title_scene {
            if !self.title_secs.is_finite() || self.title_secs <= 0.0 {
                return Err(ReelError::validation("title_secs must be positive"));
            }
            if self.title_secs >= self.duration_ceiling_secs {
                return Err(ReelError::validation(
                    "title_secs leaves no room for sections under the ceiling",
                ));
            }
        }
        if self.threads == Some(0) {
            return Err(ReelError::validation("threads must be >= 1 when set"));
        }
        if self.caption.font_size <= 0.0 || self.caption.max_chars_per_line == 0 {
            return Err(ReelError::validation(
                "caption font_size and max_chars_per_line must be positive",
            ));
        }
        if require_narrators && self.narrators.is_empty() {
            return Err(ReelError::validation(
                "at least one narrator command is required",
            ));
        }
        self.planner_policy().validate()
    }

    /// Planner policy; the title card's length is reserved from the ceiling.
    pub fn planner_policy(&self) -> PlannerPolicy {
        let reserve = if self.title_scene { self.title_secs } else { 0.0 };
        let mut policy = PlannerPolicy {
            min_chars: self.min_section_chars,
            ..PlannerPolicy::default()
        }
        .with_ceiling(self.duration_ceiling_secs - reserve);
        if let Some(order) = &self.droppable {
            policy.droppable = order.clone();
        }
        policy
    }

    pub fn normalizer(&self) -> SpokenNormalizer {
        SpokenNormalizer::new(
            self.substitutions
                .clone()
                .unwrap_or_else(default_substitutions),
        )
    }

    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            canvas: self.canvas,
            fps: self.fps,
            video_codec: self.video_codec.clone(),
            audio_codec: self.audio_codec.clone(),
            preset: self.preset.clone(),
            audio_bitrate: self.audio_bitrate.clone(),
            overwrite: true,
        }
    }

    pub fn composer_settings(&self) -> ComposerSettings {
        ComposerSettings {
            canvas: self.canvas,
            sample_fps: self.sample_fps,
            backend: self.backend,
            caption: self.caption.clone(),
            fade_in_secs: self.scene_fade_in_secs,
            title_secs: self.title_secs,
            parallel: self.parallel,
            threads: self.threads,
        }
    }

    pub fn assembler_settings(&self) -> AssemblerSettings {
        AssemblerSettings {
            fade_out_secs: self.fade_out_secs,
            music_gain: self.music_gain,
            encode: self.encode_settings(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
