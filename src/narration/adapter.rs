use std::path::{Path, PathBuf};

use crate::{
    assets::media::AudioProbe,
    foundation::error::{ReelError, ReelResult},
    narration::narrator::{Narrator, NarratorFault},
    narration::provider::ProviderChain,
    narration::timing::{self, WordTiming},
    plan::planner::{Rejected, Timed},
    plan::section::{Section, SectionKey},
};

/// Narrator chain owned by a run.
pub type NarratorChain = ProviderChain<Box<dyn Narrator>>;

/// A section with its narration attached.
#[derive(Clone, Debug)]
pub struct TimedSection {
    pub section: Section,
    pub audio_path: PathBuf,
    /// Measured length of the narration audio.
    pub audio_secs: f64,
    /// `audio_secs` plus the breath pause; the scene length.
    pub total_secs: f64,
    /// Word timings; empty means static captions for this section.
    pub timings: Vec<WordTiming>,
}

impl TimedSection {
    /// `true` when karaoke captions can be built.
    pub fn has_word_timings(&self) -> bool {
        !self.timings.is_empty()
    }
}

impl Timed for TimedSection {
    fn key(&self) -> &SectionKey {
        &self.section.key
    }

    fn duration_secs(&self) -> f64 {
        self.total_secs
    }
}

/// Runs the narrator per section and turns its output into timing data.
pub struct NarrationTimingAdapter<'a> {
    probe: &'a dyn AudioProbe,
    breath_pause_secs: f64,
    out_dir: PathBuf,
}

impl<'a> NarrationTimingAdapter<'a> {
    /// Adapter writing narration artifacts under `out_dir`.
    pub fn new(probe: &'a dyn AudioProbe, breath_pause_secs: f64, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            probe,
            breath_pause_secs: breath_pause_secs.max(0.0),
            out_dir: out_dir.into(),
        }
    }

    /// Narrate every section in order; failures drop only the failing section.
    #[tracing::instrument(skip_all, fields(sections = sections.len()))]
    pub fn time_all(
        &self,
        chain: &mut NarratorChain,
        sections: Vec<Section>,
    ) -> (Vec<TimedSection>, Vec<Rejected>) {
        let mut timed = Vec::with_capacity(sections.len());
        let mut rejected = Vec::new();
        for (idx, section) in sections.into_iter().enumerate() {
            let key = section.key.clone();
            match self.time_section(chain, idx, section) {
                Ok(t) => {
                    tracing::info!(
                        section = %key,
                        total_secs = t.total_secs,
                        words = t.timings.len(),
                        "section narrated"
                    );
                    timed.push(t);
                }
                Err(reason) => {
                    tracing::warn!(section = %key, error = %reason, "skipping section");
                    rejected.push(Rejected { key, reason });
                }
            }
        }
        (timed, rejected)
    }

    /// Narrate one section. `idx` keeps artifact names unique and ordered.
    pub fn time_section(
        &self,
        chain: &mut NarratorChain,
        idx: usize,
        section: Section,
    ) -> ReelResult<TimedSection> {
        let stem = format!("{idx:02}_{}", file_stem_for(section.key.as_str()));
        let audio_out = self.out_dir.join(format!("{stem}.mp3"));
        let timings_out = self.out_dir.join(format!("{stem}.words.json"));

        let output = loop {
            let Some(narrator) = chain.current() else {
                return Err(ReelError::synthesis("every narrator in the chain is exhausted"));
            };
            match narrator.synthesize(&section.spoken_text, &audio_out, &timings_out) {
                Ok(out) => break out,
                Err(NarratorFault::RateLimited(msg)) => {
                    tracing::warn!(narrator = narrator.name(), reason = %msg, "narrator rate limited");
                    chain.advance();
                }
                Err(NarratorFault::Failed(msg)) => return Err(ReelError::synthesis(msg)),
            }
        };

        if !output.audio_path.is_file() {
            return Err(ReelError::synthesis(format!(
                "narrator reported success but '{}' is missing",
                output.audio_path.display()
            )));
        }

        let timings = match &output.timings_path {
            Some(path) => read_timings(path),
            None => Vec::new(),
        };
        debug_assert!(timing::is_well_formed(&timings));

        let audio_secs = match self.probe.duration_secs(&output.audio_path) {
            Ok(secs) => secs,
            Err(e) if !timings.is_empty() => {
                let secs = timing::span_end_secs(&timings);
                tracing::warn!(error = %e, fallback_secs = secs, "audio probe failed; using word span");
                secs
            }
            Err(e) => return Err(ReelError::synthesis(format!("audio length unknown: {e}"))),
        };

        Ok(TimedSection {
            section,
            audio_path: output.audio_path,
            audio_secs,
            total_secs: audio_secs + self.breath_pause_secs,
            timings,
        })
    }
}

fn read_timings(path: &Path) -> Vec<WordTiming> {
    match timing::load_sidecar(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable timing sidecar; static captions");
            Vec::new()
        }
    }
}

/// File-system safe stem for a section key.
pub(crate) fn file_stem_for(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "section".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/adapter.rs"]
mod tests;
