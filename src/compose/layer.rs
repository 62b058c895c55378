use std::path::PathBuf;

use crate::foundation::{
    core::{Fps, TimeWindow},
    error::{ReelError, ReelResult},
};

/// What a layer depicts; also its fixed z-rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Background,
    CategoryImage,
    Caption,
}

/// Pixels behind a layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisualSource {
    /// One pre-rendered image shown for the layer's window.
    Still { path: PathBuf },
    /// Numbered frames (`pattern` is printf-style, e.g. `frame_%05d.png`) sampled at `fps`.
    Sequence {
        dir: PathBuf,
        pattern: String,
        fps: Fps,
        frames: u64,
    },
}

impl VisualSource {
    pub fn still(path: impl Into<PathBuf>) -> Self {
        Self::Still { path: path.into() }
    }
}

/// One composited element of a scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VisualLayer {
    pub kind: LayerKind,
    pub source: VisualSource,
    /// Visibility window relative to the scene start.
    pub window: TimeWindow,
    /// Top-left placement on the canvas.
    pub x: u32,
    pub y: u32,
}

/// Caption strategy a scene was built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionMode {
    /// Word-synchronized highlight from narration timings.
    Karaoke,
    /// Whole display text for the full scene.
    Static,
    /// Category title card.
    Title,
}

/// A fully composed, self-contained segment of the final video.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Scene {
    /// Section key, or `title` for the title card.
    pub label: String,
    /// Layers in render order.
    pub layers: Vec<VisualLayer>,
    pub duration_secs: f64,
    /// Narration attached to this scene; `None` plays silence.
    pub audio: Option<PathBuf>,
    pub caption_mode: CaptionMode,
    /// Fade-in from black at the scene start.
    pub fade_in_secs: f64,
}

impl Scene {
    /// Check layer z-order and that every window fits inside the scene.
    pub fn validate(&self) -> ReelResult<()> {
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(ReelError::render(format!(
                "scene '{}' has non-positive duration {}",
                self.label, self.duration_secs
            )));
        }
        if !self.layers.windows(2).all(|w| w[0].kind <= w[1].kind) {
            return Err(ReelError::render(format!(
                "scene '{}' layers are out of z-order",
                self.label
            )));
        }
        // Tolerate float noise from summed timings.
        let limit = self.duration_secs + 1e-6;
        if let Some(l) = self.layers.iter().find(|l| l.window.end > limit) {
            return Err(ReelError::render(format!(
                "scene '{}' {:?} layer ends at {} past duration {}",
                self.label, l.kind, l.window.end, self.duration_secs
            )));
        }
        Ok(())
    }

    /// Total time during which any caption layer is visible.
    pub fn caption_display_secs(&self) -> f64 {
        let mut windows: Vec<TimeWindow> = self
            .layers
            .iter()
            .filter(|l| l.kind == LayerKind::Caption)
            .map(|l| l.window)
            .collect();
        windows.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut total = 0.0;
        let mut cursor = f64::NEG_INFINITY;
        for w in windows {
            let start = w.start.max(cursor);
            if w.end > start {
                total += w.end - start;
            }
            cursor = cursor.max(w.end);
        }
        total
    }

    /// Caption layers in time order.
    pub fn caption_layers(&self) -> impl Iterator<Item = &VisualLayer> {
        self.layers.iter().filter(|l| l.kind == LayerKind::Caption)
    }

    /// `true` when every layer is visible for the whole scene, e.g. static or title scenes.
    pub fn is_time_invariant(&self) -> bool {
        self.layers
            .iter()
            .all(|l| l.window.start <= 0.0 && l.window.end >= self.duration_secs - 1e-6)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layer.rs"]
mod tests;
