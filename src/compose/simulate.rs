//! Frame-accurate scene simulation.
//!
//! A [`FrameRenderer`] holds one mutable timeline. The driver loads it once, then for every
//! sample issues `seek` followed by `capture_frame`, strictly in order. Any error aborts the
//! whole scene and removes its partial frames.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::svg_raster::{SvgRasterizer, save_png},
    compose::{
        caption::{self, CaptionStyle, KaraokePage},
        category_image::PlacedImage,
        layer::VisualSource,
    },
    foundation::{
        core::{Canvas, Fps, Rgb8},
        error::{ReelError, ReelResult},
    },
    narration::timing::{self, WordTiming},
};

/// Printf-style name of simulated frames.
pub const FRAME_PATTERN: &str = "frame_%05d.png";

/// Caption content driven by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum SimCaptions {
    Karaoke { words: Vec<WordTiming>, highlight: Rgb8 },
    Static { text: String },
}

/// Everything a renderer needs to build a scene's timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    pub canvas: Canvas,
    pub background: PathBuf,
    pub category_image: Option<PlacedImage>,
    pub captions: SimCaptions,
}

/// Remote-controlled renderer with a single mutable timeline.
pub trait FrameRenderer: Send {
    /// Build the timeline. Called exactly once, before any seek.
    fn load(&mut self, params: &SimulationParams) -> ReelResult<()>;
    /// Move the timeline to `t`, with `active_word` highlighted (karaoke only).
    fn seek(&mut self, t: f64, active_word: Option<usize>) -> ReelResult<()>;
    /// Still image of the current state.
    fn capture_frame(&mut self) -> ReelResult<image::RgbaImage>;
}

/// Creates one renderer per simulated scene.
pub type RendererFactory = dyn Fn() -> Box<dyn FrameRenderer> + Send + Sync;

fn as_render_failure(e: ReelError) -> ReelError {
    match e {
        ReelError::RenderFailure(_) => e,
        other => ReelError::render(other.to_string()),
    }
}

/// Drive `renderer` across `[0, duration)` at `sample_fps`, writing frames to `out_dir`.
#[tracing::instrument(skip(renderer, params), fields(dir = %out_dir.display()))]
pub fn simulate_scene(
    renderer: &mut dyn FrameRenderer,
    params: &SimulationParams,
    duration_secs: f64,
    sample_fps: Fps,
    out_dir: &Path,
) -> ReelResult<VisualSource> {
    let result = drive(renderer, params, duration_secs, sample_fps, out_dir);
    if result.is_err() {
        let _ = std::fs::remove_dir_all(out_dir);
    }
    result.map_err(as_render_failure)
}

fn drive(
    renderer: &mut dyn FrameRenderer,
    params: &SimulationParams,
    duration_secs: f64,
    sample_fps: Fps,
    out_dir: &Path,
) -> ReelResult<VisualSource> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(ReelError::render(format!(
            "cannot simulate a scene of {duration_secs}s"
        )));
    }
    let words: &[WordTiming] = match &params.captions {
        SimCaptions::Karaoke { words, .. } => words,
        SimCaptions::Static { .. } => &[],
    };

    renderer.load(params)?;
    let frames = sample_fps.secs_to_frames_ceil(duration_secs);
    for i in 0..frames {
        let t = sample_fps.frames_to_secs(i);
        renderer.seek(t, timing::active_word_index(words, t))?;
        let frame = renderer.capture_frame()?;
        if frame.dimensions() != (params.canvas.width, params.canvas.height) {
            return Err(ReelError::render(format!(
                "frame {i} is {:?}, expected {}x{}",
                frame.dimensions(),
                params.canvas.width,
                params.canvas.height
            )));
        }
        save_png(&frame, &out_dir.join(format!("frame_{i:05}.png")))?;
    }
    tracing::debug!(frames, "simulated scene");

    Ok(VisualSource::Sequence {
        dir: out_dir.to_path_buf(),
        pattern: FRAME_PATTERN.to_string(),
        fps: sample_fps,
        frames,
    })
}

struct Overlay {
    img: image::RgbaImage,
    x: u32,
    y: u32,
}

struct Loaded {
    canvas: Canvas,
    base: image::RgbaImage,
    captions: SimCaptions,
    pages: Vec<KaraokePage>,
    // Rasterized caption per (page, highlighted word); states repeat across samples.
    overlays: HashMap<(usize, Option<usize>), Overlay>,
    static_overlay: Option<Overlay>,
    t: f64,
    active: Option<usize>,
}

/// Software renderer: background + category image, with captions drawn from SVG.
pub struct SvgFrameRenderer {
    rasterizer: Arc<SvgRasterizer>,
    style: CaptionStyle,
    state: Option<Loaded>,
}

impl SvgFrameRenderer {
    pub fn new(rasterizer: Arc<SvgRasterizer>, style: CaptionStyle) -> Self {
        Self {
            rasterizer,
            style,
            state: None,
        }
    }

    fn loaded(&mut self) -> ReelResult<&mut Loaded> {
        self.state
            .as_mut()
            .ok_or_else(|| ReelError::render("renderer used before load"))
    }
}

fn open_rgba(path: &Path) -> ReelResult<image::RgbaImage> {
    Ok(image::open(path)
        .map_err(|e| ReelError::render(format!("failed to open '{}': {e}", path.display())))?
        .to_rgba8())
}

impl FrameRenderer for SvgFrameRenderer {
    fn load(&mut self, params: &SimulationParams) -> ReelResult<()> {
        let mut base = open_rgba(&params.background)?;
        if base.dimensions() != (params.canvas.width, params.canvas.height) {
            base = image::imageops::resize(
                &base,
                params.canvas.width,
                params.canvas.height,
                image::imageops::FilterType::Triangle,
            );
        }
        if let Some(cat) = &params.category_image {
            let img = open_rgba(&cat.path)?;
            image::imageops::overlay(&mut base, &img, i64::from(cat.x), i64::from(cat.y));
        }

        let (pages, static_overlay) = match &params.captions {
            SimCaptions::Karaoke { words, .. } => (caption::paginate(words, &self.style), None),
            SimCaptions::Static { text } => {
                let doc = caption::static_caption(text, &self.style, params.canvas);
                let img = doc.rasterize(&self.rasterizer)?;
                (
                    Vec::new(),
                    Some(Overlay {
                        img,
                        x: doc.x,
                        y: doc.y,
                    }),
                )
            }
        };

        self.state = Some(Loaded {
            canvas: params.canvas,
            base,
            captions: params.captions.clone(),
            pages,
            overlays: HashMap::new(),
            static_overlay,
            t: 0.0,
            active: None,
        });
        Ok(())
    }

    fn seek(&mut self, t: f64, active_word: Option<usize>) -> ReelResult<()> {
        let state = self.loaded()?;
        state.t = t;
        state.active = active_word;
        Ok(())
    }

    fn capture_frame(&mut self) -> ReelResult<image::RgbaImage> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let style = self.style.clone();
        let state = self.loaded()?;
        let mut frame = state.base.clone();

        match &state.captions {
            SimCaptions::Static { .. } => {
                if let Some(o) = &state.static_overlay {
                    image::imageops::overlay(&mut frame, &o.img, i64::from(o.x), i64::from(o.y));
                }
            }
            SimCaptions::Karaoke { words, highlight } => {
                let page = match state.active {
                    Some(idx) => caption::page_of_word(&state.pages, idx),
                    None => caption::page_at(&state.pages, words, state.t),
                };
                if let Some(p) = page {
                    let key = (p, state.active);
                    if !state.overlays.contains_key(&key) {
                        let doc = caption::karaoke_caption(
                            words,
                            &state.pages[p],
                            state.active,
                            *highlight,
                            &style,
                            state.canvas,
                        );
                        let img = doc.rasterize(&rasterizer)?;
                        state.overlays.insert(
                            key,
                            Overlay {
                                img,
                                x: doc.x,
                                y: doc.y,
                            },
                        );
                    }
                    if let Some(o) = state.overlays.get(&key) {
                        image::imageops::overlay(&mut frame, &o.img, i64::from(o.x), i64::from(o.y));
                    }
                }
            }
        }
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/simulate.rs"]
mod tests;
