//! Reelwright turns a keyed script of short text sections into a narrated vertical video
//! that never runs past its duration budget.
//!
//! A run goes through five stages:
//!
//! - [`SectionPlanner`] selects and orders sections, then trims them to the budget
//! - [`NarrationTimingAdapter`] narrates each section and derives word timings
//! - [`ThemeResolver`] maps the category to colours, element and mood
//! - [`SceneComposer`] builds one captioned scene per section
//! - [`Assembler`] concatenates scenes, adds music and enforces the hard maximum
//!
//! [`run`] drives all of them for one [`RunRequest`].
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod assemble;
pub(crate) mod assets;
pub(crate) mod compose;
/// Run configuration.
pub mod config;
/// Per-run state.
pub mod context;
pub(crate) mod encode;
pub(crate) mod narration;
/// End-to-end orchestration.
pub mod pipeline;
pub(crate) mod plan;
pub(crate) mod theme;

pub use crate::foundation::core::{Canvas, Fps, Rgb8, TimeWindow};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::assemble::assembler::{Assembled, Assembler, AssemblerSettings};
pub use crate::assemble::mood::{
    FALLBACK_MOOD, FixedMood, MoodClassifier, Screenplay, ScreenplayFile, resolve_mood,
};
pub use crate::assemble::music::{MusicChoice, MusicMatch, select_track};
pub use crate::assemble::timeline::{AssemblyPlan, Timeline, fit_timeline};
pub use crate::assets::media::{AudioProbe, FfprobeAudio, is_ffmpeg_on_path, is_ffprobe_on_path};
pub use crate::assets::store::{AssetStore, FsAssetStore, MusicTrack};
pub use crate::assets::svg_raster::SvgRasterizer;
pub use crate::compose::caption::CaptionStyle;
pub use crate::compose::composer::{BackendKind, Composed, ComposerSettings, SceneComposer};
pub use crate::compose::cache::ThemeArtCache;
pub use crate::compose::layer::{CaptionMode, LayerKind, Scene, VisualLayer, VisualSource};
pub use crate::compose::simulate::{FrameRenderer, SvgFrameRenderer};
pub use crate::config::RunConfig;
pub use crate::context::{RunContext, ScratchDir};
pub use crate::encode::ffmpeg::{FfmpegCompiler, build_ffmpeg_args};
pub use crate::encode::job::{
    EncodeSettings, FadeOut, JobSegment, MediaCompiler, MediaJob, MusicBed, RecordingCompiler,
    Watermark,
};
pub use crate::narration::adapter::{NarrationTimingAdapter, NarratorChain, TimedSection};
pub use crate::narration::narrator::{
    CommandNarrator, Narrator, NarratorCommand, NarratorFault, NarratorOutput,
};
pub use crate::narration::provider::{ChainState, ProviderChain};
pub use crate::narration::timing::WordTiming;
pub use crate::pipeline::{
    Collaborators, DropStage, DroppedSection, PlanReport, RunReport, RunRequest, plan, run,
};
pub use crate::plan::planner::{
    PlannerPolicy, Prefiltered, Rejected, SectionPlanner, Timed, Trimmed,
};
pub use crate::plan::section::{Script, Section, SectionKey};
pub use crate::plan::spoken::SpokenNormalizer;
pub use crate::theme::resolver::{Element, Theme, ThemeResolver};
