use crate::{
    compose::layer::{Scene, VisualLayer},
    encode::job::{FadeOut, JobSegment, Watermark},
    foundation::error::{ReelError, ReelResult},
};

/// Input to the assembler: built once, consumed once.
#[derive(Clone, Debug)]
pub struct AssemblyPlan {
    /// Scenes in playback order.
    pub scenes: Vec<Scene>,
    pub watermark: Option<Watermark>,
    pub mood_label: String,
    /// Absolute maximum runtime of the output.
    pub duration_ceiling_secs: f64,
}

/// Scenes laid end to end and fitted under the hard maximum.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    pub segments: Vec<JobSegment>,
    /// Sum of scene durations before truncation.
    pub nominal_secs: f64,
    pub final_secs: f64,
    pub truncated: bool,
    pub fade_out: Option<FadeOut>,
    /// Labels of scenes cut entirely by truncation.
    pub cut: Vec<String>,
}

/// Concatenate `scenes`, truncating the tail at `max_secs` with a `fade_secs` fade-out.
///
/// Zero scenes is [`ReelError::AssemblyEmpty`]. Under the maximum nothing is altered and no
/// fade is applied.
pub fn fit_timeline(scenes: &[Scene], max_secs: f64, fade_secs: f64) -> ReelResult<Timeline> {
    if scenes.is_empty() {
        return Err(ReelError::assembly_empty("no scenes survived to assembly"));
    }
    if !max_secs.is_finite() || max_secs <= 0.0 {
        return Err(ReelError::validation(format!(
            "hard maximum must be positive, got {max_secs}"
        )));
    }

    let nominal: f64 = scenes.iter().map(|s| s.duration_secs).sum();
    let truncated = nominal > max_secs;

    let mut segments = Vec::with_capacity(scenes.len());
    let mut cut = Vec::new();
    let mut elapsed = 0.0;
    for scene in scenes {
        let remaining = max_secs - elapsed;
        if remaining <= 0.0 {
            cut.push(scene.label.clone());
            continue;
        }
        let duration = scene.duration_secs.min(remaining);
        segments.push(segment_for(scene, duration));
        elapsed += duration;
    }

    let final_secs = if truncated { max_secs } else { nominal };
    let fade_out = truncated.then(|| {
        let d = fade_secs.clamp(0.0, final_secs);
        FadeOut {
            start_secs: final_secs - d,
            duration_secs: d,
        }
    });
    if truncated {
        tracing::warn!(
            nominal_secs = nominal,
            final_secs,
            cut = ?cut,
            "runtime over hard maximum; tail truncated with fade"
        );
    }

    Ok(Timeline {
        segments,
        nominal_secs: nominal,
        final_secs,
        truncated,
        fade_out,
        cut,
    })
}

fn segment_for(scene: &Scene, duration: f64) -> JobSegment {
    let layers: Vec<VisualLayer> = scene
        .layers
        .iter()
        .filter_map(|l| {
            l.window.clipped_to(duration).map(|window| VisualLayer {
                window,
                ..l.clone()
            })
        })
        .collect();
    JobSegment {
        label: scene.label.clone(),
        layers,
        duration_secs: duration,
        audio: scene.audio.clone(),
        fade_in_secs: scene.fade_in_secs.min(duration),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/timeline.rs"]
mod tests;
