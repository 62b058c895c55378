use std::path::{Path, PathBuf};

use rand::Rng;

use crate::{
    assemble::{
        music::{self, MusicChoice},
        timeline::{self, AssemblyPlan, Timeline},
    },
    assets::store::AssetStore,
    encode::job::{EncodeSettings, MediaCompiler, MediaJob, MusicBed},
    foundation::error::{ReelError, ReelResult},
};

#[derive(Clone, Debug)]
pub struct AssemblerSettings {
    /// Tail fade applied when the hard maximum truncates the timeline.
    pub fade_out_secs: f64,
    /// Music level relative to narration.
    pub music_gain: f64,
    pub encode: EncodeSettings,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            fade_out_secs: 0.5,
            music_gain: 0.15,
            encode: EncodeSettings::default(),
        }
    }
}

/// Result of a successful assembly.
#[derive(Clone, Debug)]
pub struct Assembled {
    pub output: PathBuf,
    pub timeline: Timeline,
    pub music: Option<MusicChoice>,
}

/// Concatenates scenes, picks music, enforces the hard maximum and hands off to the
/// media compiler.
pub struct Assembler<'a> {
    settings: AssemblerSettings,
    compiler: &'a dyn MediaCompiler,
    store: &'a dyn AssetStore,
}

impl<'a> Assembler<'a> {
    pub fn new(
        settings: AssemblerSettings,
        compiler: &'a dyn MediaCompiler,
        store: &'a dyn AssetStore,
    ) -> Self {
        Self {
            settings,
            compiler,
            store,
        }
    }

    /// Build the media job for `plan` without encoding it.
    pub fn prepare<R: Rng + ?Sized>(
        &self,
        plan: AssemblyPlan,
        rng: &mut R,
        out_path: &Path,
    ) -> ReelResult<(MediaJob, Timeline, Option<MusicChoice>)> {
        let timeline = timeline::fit_timeline(
            &plan.scenes,
            plan.duration_ceiling_secs,
            self.settings.fade_out_secs,
        )?;

        let choice = music::select_track(&self.store.music_tracks(), &plan.mood_label, rng);
        match &choice {
            Some(c) => tracing::info!(
                mood = %plan.mood_label,
                track = %c.track.path.display(),
                matched = ?c.matched,
                "background music selected"
            ),
            None => tracing::info!(mood = %plan.mood_label, "no background music available"),
        }

        let job = MediaJob {
            segments: timeline.segments.clone(),
            music: choice.as_ref().map(|c| MusicBed {
                path: c.track.path.clone(),
                gain: self.settings.music_gain,
            }),
            watermark: plan.watermark,
            fade_out: timeline.fade_out,
            settings: self.settings.encode.clone(),
            out_path: out_path.to_path_buf(),
        };
        Ok((job, timeline, choice))
    }

    /// Assemble and encode. Only an empty plan or a compiler error fails.
    #[tracing::instrument(skip_all, fields(scenes = plan.scenes.len(), out = %out_path.display()))]
    pub fn assemble<R: Rng + ?Sized>(
        &self,
        plan: AssemblyPlan,
        rng: &mut R,
        out_path: &Path,
    ) -> ReelResult<Assembled> {
        let (job, timeline, music) = self.prepare(plan, rng, out_path)?;
        tracing::info!(
            segments = job.segments.len(),
            nominal_secs = timeline.nominal_secs,
            final_secs = timeline.final_secs,
            "handing timeline to media compiler"
        );
        let output = self.compiler.compile(&job).map_err(|e| match e {
            ReelError::CompilerFailure(_) => e,
            other => ReelError::compiler(other.to_string()),
        })?;
        Ok(Assembled {
            output,
            timeline,
            music,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/assembler.rs"]
mod tests;
