use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use rayon::prelude::*;

use crate::{
    assets::{
        store::AssetStore,
        svg_raster::{SvgRasterizer, save_png},
    },
    compose::{
        cache::ThemeArtCache,
        caption::{self, CaptionDoc, CaptionStyle},
        layer::{CaptionMode, LayerKind, Scene, VisualLayer, VisualSource},
        simulate::{
            self, FrameRenderer, RendererFactory, SimCaptions, SimulationParams, SvgFrameRenderer,
        },
    },
    foundation::{
        core::{Canvas, Fps, TimeWindow},
        error::{ReelError, ReelResult},
    },
    narration::{
        adapter::{TimedSection, file_stem_for},
        timing::WordTiming,
    },
    plan::planner::Rejected,
    theme::resolver::Theme,
};

/// How scene pixels are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Pre-rendered stills with time windows; the media compiler does the overlaying.
    #[default]
    Direct,
    /// Frame-by-frame capture from a [`FrameRenderer`].
    Simulate,
}

#[derive(Clone, Debug)]
pub struct ComposerSettings {
    pub canvas: Canvas,
    /// Sample rate of the simulation backend.
    pub sample_fps: Fps,
    pub backend: BackendKind,
    pub caption: CaptionStyle,
    pub fade_in_secs: f64,
    pub title_secs: f64,
    pub parallel: bool,
    pub threads: Option<usize>,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas::PORTRAIT_HD,
            sample_fps: Fps { num: 30, den: 1 },
            backend: BackendKind::Direct,
            caption: CaptionStyle::default(),
            fade_in_secs: 0.3,
            title_secs: 2.0,
            parallel: false,
            threads: None,
        }
    }
}

/// Scenes that survived composition plus the sections that did not.
#[derive(Debug, Default)]
pub struct Composed {
    pub scenes: Vec<Scene>,
    pub rejected: Vec<Rejected>,
}

/// Builds one [`Scene`] per timed section.
pub struct SceneComposer<'a> {
    settings: ComposerSettings,
    rasterizer: Arc<SvgRasterizer>,
    cache: &'a ThemeArtCache,
    store: &'a dyn AssetStore,
    out_dir: PathBuf,
    renderer_factory: Box<RendererFactory>,
}

impl<'a> SceneComposer<'a> {
    pub fn new(
        settings: ComposerSettings,
        rasterizer: Arc<SvgRasterizer>,
        cache: &'a ThemeArtCache,
        store: &'a dyn AssetStore,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        let factory_raster = Arc::clone(&rasterizer);
        let style = settings.caption.clone();
        Self {
            settings,
            rasterizer,
            cache,
            store,
            out_dir: out_dir.into(),
            renderer_factory: Box::new(move || -> Box<dyn FrameRenderer> {
                Box::new(SvgFrameRenderer::new(Arc::clone(&factory_raster), style.clone()))
            }),
        }
    }

    /// Replace the renderer used by the simulation backend.
    pub fn with_renderer_factory(
        mut self,
        factory: impl Fn() -> Box<dyn FrameRenderer> + Send + Sync + 'static,
    ) -> Self {
        self.renderer_factory = Box::new(factory);
        self
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    /// Silent title card for the category.
    #[tracing::instrument(skip(self, theme), fields(category = %theme.category_key))]
    pub fn compose_title(&self, theme: &Theme, date_line: &str) -> ReelResult<Scene> {
        let duration = self.settings.title_secs;
        let whole = TimeWindow::whole(duration)?;
        let mut layers = self.base_layers(theme, whole)?;

        let doc = caption::title_card(
            &theme.display_name,
            date_line,
            theme.accent,
            &self.settings.caption,
            self.settings.canvas,
        );
        let path = self.out_dir.join("title").join("title.png");
        layers.push(self.still_caption(&doc, &path, whole)?);

        let scene = Scene {
            label: "title".to_string(),
            layers,
            duration_secs: duration,
            audio: None,
            caption_mode: CaptionMode::Title,
            fade_in_secs: self.settings.fade_in_secs.min(duration),
        };
        scene.validate()?;
        Ok(scene)
    }

    /// Scene for one narrated section. `idx` keeps artifact directories unique.
    pub fn compose_section(&self, idx: usize, theme: &Theme, timed: &TimedSection) -> ReelResult<Scene> {
        let duration = timed.total_secs;
        let whole = TimeWindow::whole(duration)?;
        let dir = self
            .out_dir
            .join(format!("{idx:02}_{}", file_stem_for(timed.section.key.as_str())));
        let mode = if timed.has_word_timings() {
            CaptionMode::Karaoke
        } else {
            CaptionMode::Static
        };

        let layers = match self.settings.backend {
            BackendKind::Direct => {
                let mut layers = self.base_layers(theme, whole)?;
                match mode {
                    CaptionMode::Karaoke => {
                        layers.extend(self.karaoke_layers(&timed.timings, theme, duration, &dir)?)
                    }
                    _ => {
                        let doc = caption::static_caption(
                            &timed.section.display_text,
                            &self.settings.caption,
                            self.settings.canvas,
                        );
                        layers.push(self.still_caption(&doc, &dir.join("caption.png"), whole)?);
                    }
                }
                layers
            }
            BackendKind::Simulate => vec![self.simulated_layer(theme, timed, mode, whole, &dir)?],
        };

        let scene = Scene {
            label: timed.section.key.as_str().to_string(),
            layers,
            duration_secs: duration,
            audio: Some(timed.audio_path.clone()),
            caption_mode: mode,
            fade_in_secs: self.settings.fade_in_secs.min(duration),
        };
        scene.validate()?;
        tracing::debug!(
            section = %scene.label,
            layers = scene.layers.len(),
            mode = ?scene.caption_mode,
            "composed scene"
        );
        Ok(scene)
    }

    /// Compose every section, in order. Failing sections are rejected, not fatal.
    ///
    /// Category artwork is rendered up front so parallel workers only read it.
    #[tracing::instrument(skip_all, fields(sections = sections.len(), parallel = self.settings.parallel))]
    pub fn compose_all(&self, theme: &Theme, sections: &[TimedSection]) -> ReelResult<Composed> {
        if let Err(e) = self.cache.prewarm(theme, self.store) {
            tracing::warn!(error = %e, "background prewarm failed");
        }

        let results: Vec<ReelResult<Scene>> = if self.settings.parallel && sections.len() > 1 {
            let pool = build_thread_pool(self.settings.threads)?;
            pool.install(|| {
                sections
                    .par_iter()
                    .enumerate()
                    .map(|(i, s)| self.compose_section(i, theme, s))
                    .collect()
            })
        } else {
            sections
                .iter()
                .enumerate()
                .map(|(i, s)| self.compose_section(i, theme, s))
                .collect()
        };

        let mut out = Composed::default();
        for (timed, result) in sections.iter().zip(results) {
            match result {
                Ok(scene) => out.scenes.push(scene),
                Err(e) => {
                    let reason = if e.is_section_local() {
                        e
                    } else {
                        ReelError::render(e.to_string())
                    };
                    tracing::warn!(section = %timed.section.key, error = %reason, "skipping section");
                    out.rejected.push(Rejected {
                        key: timed.section.key.clone(),
                        reason,
                    });
                }
            }
        }
        Ok(out)
    }

    fn base_layers(&self, theme: &Theme, whole: TimeWindow) -> ReelResult<Vec<VisualLayer>> {
        let bg = self.cache.background(theme)?;
        let mut layers = vec![VisualLayer {
            kind: LayerKind::Background,
            source: VisualSource::still(bg),
            window: whole,
            x: 0,
            y: 0,
        }];
        if let Some(img) = self.cache.category_image(theme, self.store) {
            layers.push(VisualLayer {
                kind: LayerKind::CategoryImage,
                source: VisualSource::still(img.path),
                window: whole,
                x: img.x,
                y: img.y,
            });
        }
        Ok(layers)
    }

    fn still_caption(&self, doc: &CaptionDoc, path: &Path, window: TimeWindow) -> ReelResult<VisualLayer> {
        let img = doc.rasterize(&self.rasterizer)?;
        save_png(&img, path)?;
        Ok(VisualLayer {
            kind: LayerKind::Caption,
            source: VisualSource::still(path),
            window,
            x: doc.x,
            y: doc.y,
        })
    }

    /// One still per highlight state. Each word's still is visible exactly during its own
    /// timing window; gaps inside a page show the page without a highlight.
    fn karaoke_layers(
        &self,
        words: &[WordTiming],
        theme: &Theme,
        duration: f64,
        dir: &Path,
    ) -> ReelResult<Vec<VisualLayer>> {
        let style = &self.settings.caption;
        let canvas = self.settings.canvas;
        let pages = caption::paginate(words, style);
        let mut layers = Vec::new();

        for (p, page) in pages.iter().enumerate() {
            let (page_start, page_end) = page.span(words);
            let mut gaps = Vec::new();
            let mut cursor = page_start;
            for i in page.words.clone() {
                let w = &words[i];
                if w.start_secs > cursor {
                    gaps.push((cursor, w.start_secs));
                }
                cursor = cursor.max(w.end_secs());

                let Some(window) = clip_window(w.start_secs, w.end_secs(), duration)? else {
                    continue;
                };
                let doc = caption::karaoke_caption(words, page, Some(i), theme.accent, style, canvas);
                let path = dir.join(format!("p{p:02}_w{i:04}.png"));
                layers.push(self.still_caption(&doc, &path, window)?);
            }
            if cursor < page_end {
                gaps.push((cursor, page_end));
            }

            let gap_windows = gaps
                .into_iter()
                .map(|(s, e)| clip_window(s, e, duration))
                .collect::<ReelResult<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();
            if let Some((first, rest)) = gap_windows.split_first() {
                let doc = caption::karaoke_caption(words, page, None, theme.accent, style, canvas);
                let base = self.still_caption(&doc, &dir.join(format!("p{p:02}_base.png")), *first)?;
                for w in rest {
                    layers.push(VisualLayer {
                        window: *w,
                        ..base.clone()
                    });
                }
                layers.push(base);
            }
        }

        layers.sort_by(|a, b| a.window.start.total_cmp(&b.window.start));
        Ok(layers)
    }

    fn simulated_layer(
        &self,
        theme: &Theme,
        timed: &TimedSection,
        mode: CaptionMode,
        whole: TimeWindow,
        dir: &Path,
    ) -> ReelResult<VisualLayer> {
        let params = SimulationParams {
            canvas: self.settings.canvas,
            background: self.cache.background(theme)?,
            category_image: self.cache.category_image(theme, self.store),
            captions: match mode {
                CaptionMode::Karaoke => SimCaptions::Karaoke {
                    words: timed.timings.clone(),
                    highlight: theme.accent,
                },
                _ => SimCaptions::Static {
                    text: timed.section.display_text.clone(),
                },
            },
        };
        let mut renderer = (self.renderer_factory)();
        let source = simulate::simulate_scene(
            renderer.as_mut(),
            &params,
            whole.len_secs(),
            self.settings.sample_fps,
            &dir.join("frames"),
        )?;
        // The sequence is the whole composited frame, so it sits at the bottom of the stack.
        Ok(VisualLayer {
            kind: LayerKind::Background,
            source,
            window: whole,
            x: 0,
            y: 0,
        })
    }
}

fn clip_window(start: f64, end: f64, limit: f64) -> ReelResult<Option<TimeWindow>> {
    if end <= start {
        return Ok(None);
    }
    Ok(TimeWindow::new(start, end)?.clipped_to(limit))
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation(
            "composition 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/compose/composer.rs"]
mod tests;
