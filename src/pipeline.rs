//! End-to-end run: plan, narrate, trim, compose, assemble.
//!
//! Section-local failures at any stage drop that section and are recorded in the
//! [`RunReport`]; only an empty assembly, a compiler failure or bad configuration fail
//! the run.

use std::{path::PathBuf, sync::Arc};

use crate::{
    assemble::{
        assembler::Assembler,
        mood::{self, MoodClassifier},
        music::MusicMatch,
        timeline::AssemblyPlan,
    },
    assets::{media::AudioProbe, store::AssetStore, svg_raster::SvgRasterizer},
    compose::{cache::ThemeArtCache, composer::SceneComposer},
    config::RunConfig,
    context::RunContext,
    encode::job::MediaCompiler,
    foundation::error::{ReelError, ReelResult},
    narration::adapter::NarrationTimingAdapter,
    plan::{
        planner::{Rejected, SectionPlanner},
        section::{Script, SectionKey},
    },
    theme::resolver::{Theme, ThemeResolver},
};

/// External services a run talks to.
pub struct Collaborators<'a> {
    pub probe: &'a dyn AudioProbe,
    pub store: &'a dyn AssetStore,
    pub compiler: &'a dyn MediaCompiler,
    /// Director mood source; the theme's mood is used when absent.
    pub classifier: Option<&'a dyn MoodClassifier>,
    pub rasterizer: Arc<SvgRasterizer>,
}

#[derive(Clone, Debug)]
pub struct RunRequest {
    pub script: Script,
    pub category: String,
    pub out_path: PathBuf,
}

/// Stage at which a section left the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropStage {
    Prefilter,
    Narrate,
    Budget,
    Compose,
    Truncate,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct DroppedSection {
    pub key: SectionKey,
    pub stage: DropStage,
    /// [`ReelError::kind`] of the cause, or `over_budget` / `truncated`.
    pub kind: String,
    pub reason: String,
}

impl DroppedSection {
    fn rejected(stage: DropStage, r: &Rejected) -> Self {
        Self {
            key: r.key.clone(),
            stage,
            kind: r.reason.kind().to_string(),
            reason: r.reason.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MusicReport {
    pub path: PathBuf,
    pub mood: String,
    pub matched: MusicMatch,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub category: String,
    pub mood: String,
    /// Scene labels in playback order, title included.
    pub scenes: Vec<String>,
    pub dropped: Vec<DroppedSection>,
    /// Narrated length of the kept sections plus the title, before truncation.
    pub planned_secs: f64,
    pub final_secs: f64,
    pub truncated: bool,
    pub music: Option<MusicReport>,
    pub output: PathBuf,
}

/// Sections that would be narrated, without narrating them.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlanReport {
    pub category: String,
    pub sections: Vec<PlannedSection>,
    pub dropped: Vec<DroppedSection>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlannedSection {
    pub key: SectionKey,
    pub spoken_text: String,
    pub display_text: String,
}

/// Prefilter `script` for `category` and report what would be narrated.
pub fn plan(config: &RunConfig, script: &Script, category: &str) -> ReelResult<PlanReport> {
    let theme = ThemeResolver.resolve(category);
    let planner = SectionPlanner::new(config.planner_policy())?;
    let pre = planner.prefilter(script, &config.normalizer());
    Ok(PlanReport {
        category: theme.category_key,
        sections: pre
            .sections
            .into_iter()
            .map(|s| PlannedSection {
                key: s.key,
                spoken_text: s.spoken_text,
                display_text: s.display_text,
            })
            .collect(),
        dropped: pre
            .rejected
            .iter()
            .map(|r| DroppedSection::rejected(DropStage::Prefilter, r))
            .collect(),
    })
}

/// Produce one video for `request`.
#[tracing::instrument(skip_all, fields(run_id = %ctx.run_id(), category = %request.category))]
pub fn run(
    config: &RunConfig,
    ctx: &mut RunContext,
    collab: &Collaborators<'_>,
    request: &RunRequest,
) -> ReelResult<RunReport> {
    config.validate(false)?;
    let theme = ThemeResolver.resolve(&request.category);
    tracing::info!(theme = %theme.category_key, element = ?theme.element, "theme resolved");

    let mut dropped = Vec::new();

    let planner = SectionPlanner::new(config.planner_policy())?;
    let pre = planner.prefilter(&request.script, &config.normalizer());
    dropped.extend(
        pre.rejected
            .iter()
            .map(|r| DroppedSection::rejected(DropStage::Prefilter, r)),
    );
    tracing::info!(
        sections = pre.sections.len(),
        rejected = pre.rejected.len(),
        "script prefiltered"
    );

    let adapter = NarrationTimingAdapter::new(
        collab.probe,
        config.breath_pause_secs,
        ctx.scratch().subdir("narration")?,
    );
    let (timed, failed) = adapter.time_all(&mut ctx.chain, pre.sections);
    dropped.extend(
        failed
            .iter()
            .map(|r| DroppedSection::rejected(DropStage::Narrate, r)),
    );

    let trimmed = planner.trim(timed);
    for t in &trimmed.dropped {
        dropped.push(DroppedSection {
            key: t.section.key.clone(),
            stage: DropStage::Budget,
            kind: "over_budget".to_string(),
            reason: format!(
                "{:.2}s section dropped to fit {:.2}s ceiling",
                t.total_secs,
                planner.policy().ceiling_secs
            ),
        });
    }
    if !trimmed.dropped.is_empty() {
        tracing::info!(
            before_secs = trimmed.total_before_secs,
            after_secs = trimmed.total_after_secs,
            dropped = trimmed.dropped.len(),
            "trimmed to duration ceiling"
        );
    }

    let cache = ThemeArtCache::new(ctx.scratch().subdir("art")?, config.canvas);
    let composer = SceneComposer::new(
        config.composer_settings(),
        Arc::clone(&collab.rasterizer),
        &cache,
        collab.store,
        ctx.scratch().subdir("scenes")?,
    );
    let composed = composer.compose_all(&theme, &trimmed.kept)?;
    dropped.extend(
        composed
            .rejected
            .iter()
            .map(|r| DroppedSection::rejected(DropStage::Compose, r)),
    );

    if composed.scenes.is_empty() {
        tracing::error!(dropped = dropped.len(), "no section survived to assembly");
        return Err(ReelError::assembly_empty(format!(
            "no section of '{}' survived ({} dropped)",
            theme.category_key,
            dropped.len()
        )));
    }

    let mut scenes = Vec::with_capacity(composed.scenes.len() + 1);
    if config.title_scene {
        match composer.compose_title(&theme, &config.title_subline) {
            Ok(title) => scenes.push(title),
            Err(e) => tracing::warn!(error = %e, "title card skipped"),
        }
    }
    scenes.extend(composed.scenes);

    let mood = mood::resolve_mood(collab.classifier, &request.script.corpus(), &theme);
    let plan = AssemblyPlan {
        scenes,
        watermark: config.watermark.clone(),
        mood_label: mood.clone(),
        duration_ceiling_secs: config.hard_max_secs,
    };

    let assembler = Assembler::new(config.assembler_settings(), collab.compiler, collab.store);
    let assembled = assembler.assemble(plan, &mut ctx.rng, &request.out_path)?;
    let timeline = &assembled.timeline;

    for label in &timeline.cut {
        dropped.push(DroppedSection {
            key: SectionKey::parse(label),
            stage: DropStage::Truncate,
            kind: "truncated".to_string(),
            reason: format!("cut by the {:.2}s hard maximum", config.hard_max_secs),
        });
    }

    let report = RunReport {
        run_id: ctx.run_id().to_string(),
        category: theme.category_key.clone(),
        mood: mood.clone(),
        scenes: timeline.segments.iter().map(|s| s.label.clone()).collect(),
        dropped,
        planned_secs: timeline.nominal_secs,
        final_secs: timeline.final_secs,
        truncated: timeline.truncated,
        music: assembled.music.map(|m| MusicReport {
            path: m.track.path,
            mood: m.track.mood,
            matched: m.matched,
        }),
        output: assembled.output,
    };
    log_summary(&theme, &report);
    Ok(report)
}

fn log_summary(theme: &Theme, report: &RunReport) {
    tracing::info!(
        category = %theme.display_name,
        scenes = report.scenes.len(),
        dropped = report.dropped.len(),
        final_secs = report.final_secs,
        truncated = report.truncated,
        output = %report.output.display(),
        "video assembled"
    );
}
