use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::Context;

use crate::{
    assets::store::AssetStore,
    compose::{
        background::render_gradient,
        category_image::{self, PlacedImage},
    },
    foundation::{core::Canvas, error::ReelResult},
    theme::resolver::Theme,
};

/// Per-run cache of category artwork, keyed by category (never by section).
///
/// Entries are created at most once; afterwards every section reads the same files.
#[derive(Debug)]
pub struct ThemeArtCache {
    dir: PathBuf,
    canvas: Canvas,
    backgrounds: Mutex<HashMap<String, PathBuf>>,
    images: Mutex<HashMap<String, Option<PlacedImage>>>,
    background_renders: AtomicUsize,
}

impl ThemeArtCache {
    pub fn new(dir: impl Into<PathBuf>, canvas: Canvas) -> Self {
        Self {
            dir: dir.into(),
            canvas,
            backgrounds: Mutex::new(HashMap::new()),
            images: Mutex::new(HashMap::new()),
            background_renders: AtomicUsize::new(0),
        }
    }

    /// Gradient background for `theme`, rendered on first request.
    pub fn background(&self, theme: &Theme) -> ReelResult<PathBuf> {
        let mut map = self
            .backgrounds
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = map.get(&theme.category_key) {
            return Ok(path.clone());
        }

        let path = self.dir.join(format!("bg_{}.png", theme.category_key));
        let img = render_gradient(self.canvas, &theme.color_ramp)?;
        write_rgb_png(&img, &path)?;
        self.background_renders.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(category = %theme.category_key, path = %path.display(), "rendered background");
        map.insert(theme.category_key.clone(), path.clone());
        Ok(path)
    }

    /// Prepared foreground image for `theme`, if the store has one that decodes.
    ///
    /// A miss is cached too, so a broken asset is only tried once per run.
    pub fn category_image(&self, theme: &Theme, store: &dyn AssetStore) -> Option<PlacedImage> {
        let mut map = self.images.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = map.get(&theme.category_key) {
            return entry.clone();
        }

        let out = self.dir.join(format!("cat_{}.png", theme.category_key));
        let mut placed = None;
        for candidate in store.category_images(&theme.aliases()) {
            match category_image::prepare(&candidate, self.canvas, &out) {
                Ok(p) => {
                    placed = Some(p);
                    break;
                }
                Err(e) => tracing::warn!(path = %candidate.display(), error = %e, "skipping category image"),
            }
        }
        if placed.is_none() {
            tracing::info!(category = %theme.category_key, "no category image; layer omitted");
        }
        map.insert(theme.category_key.clone(), placed.clone());
        placed
    }

    /// Populate both entries for `theme` so later readers never render.
    pub fn prewarm(&self, theme: &Theme, store: &dyn AssetStore) -> ReelResult<()> {
        self.background(theme)?;
        self.category_image(theme, store);
        Ok(())
    }

    /// How many backgrounds were actually rendered (cache misses).
    pub fn background_renders(&self) -> usize {
        self.background_renders.load(Ordering::Relaxed)
    }
}

fn write_rgb_png(img: &image::RgbImage, path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/cache.rs"]
mod tests;
