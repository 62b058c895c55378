use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    assets::svg_raster::save_png,
    foundation::{
        core::Canvas,
        error::{ReelError, ReelResult},
    },
};

/// Width of the image as a fraction of the canvas width.
pub const WIDTH_FRACTION: f64 = 0.6;
/// Height cap as a fraction of the canvas height.
pub const HEIGHT_FRACTION: f64 = 0.35;
/// Top edge of the image as a fraction of the canvas height.
pub const TOP_FRACTION: f64 = 0.14;

const SHADOW_OFFSET: u32 = 14;
const SHADOW_SIGMA: f32 = 12.0;
const SHADOW_OPACITY: f32 = 0.55;

/// A prepared foreground image and where it goes on the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedImage {
    pub path: PathBuf,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Scale `(w, h)` to `max_w` wide, capping the height at `max_h`, aspect preserved.
pub fn fit_size(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if w == 0 || h == 0 {
        return (0, 0);
    }
    let scale = (f64::from(max_w) / f64::from(w)).min(f64::from(max_h) / f64::from(h));
    let fw = (f64::from(w) * scale).round().max(1.0) as u32;
    let fh = (f64::from(h) * scale).round().max(1.0) as u32;
    (fw, fh)
}

/// Soft drop shadow behind `img`; the result is larger by the blur margin.
pub fn with_drop_shadow(img: &image::RgbaImage) -> image::RgbaImage {
    let margin = (SHADOW_SIGMA * 3.0).ceil() as u32;
    let (w, h) = img.dimensions();
    let out_w = w + 2 * margin + SHADOW_OFFSET;
    let out_h = h + 2 * margin + SHADOW_OFFSET;

    let mut shadow = image::RgbaImage::new(out_w, out_h);
    for (x, y, px) in img.enumerate_pixels() {
        let a = (f32::from(px.0[3]) * SHADOW_OPACITY).round() as u8;
        shadow.put_pixel(
            x + margin + SHADOW_OFFSET,
            y + margin + SHADOW_OFFSET,
            image::Rgba([0, 0, 0, a]),
        );
    }
    let mut out = image::imageops::blur(&shadow, SHADOW_SIGMA);
    image::imageops::overlay(&mut out, img, i64::from(margin), i64::from(margin));
    out
}

/// Load `src`, scale it for `canvas`, add the shadow and write it to `out`.
///
/// Any failure is [`ReelError::AssetUnavailable`]; the caller simply omits the layer.
pub fn prepare(src: &Path, canvas: Canvas, out: &Path) -> ReelResult<PlacedImage> {
    let decoded = image::ImageReader::open(src)
        .and_then(|r| r.with_guessed_format())
        .with_context(|| format!("open category image '{}'", src.display()))
        .map_err(|e| ReelError::asset(format!("{e:#}")))?
        .decode()
        .map_err(|e| ReelError::asset(format!("decode '{}': {e}", src.display())))?
        .to_rgba8();

    let max_w = (f64::from(canvas.width) * WIDTH_FRACTION).round() as u32;
    let max_h = (f64::from(canvas.height) * HEIGHT_FRACTION).round() as u32;
    let (w, h) = fit_size(decoded.width(), decoded.height(), max_w, max_h);
    if w == 0 || h == 0 {
        return Err(ReelError::asset(format!(
            "category image '{}' is empty",
            src.display()
        )));
    }
    let scaled = image::imageops::resize(&decoded, w, h, image::imageops::FilterType::Lanczos3);
    let shadowed = with_drop_shadow(&scaled);

    let margin = (SHADOW_SIGMA * 3.0).ceil() as u32;
    let x = (canvas.width.saturating_sub(w) / 2).saturating_sub(margin);
    let y = ((f64::from(canvas.height) * TOP_FRACTION).round() as u32).saturating_sub(margin);
    // Keep the padded image on the canvas.
    let shadowed = crop_to_canvas(shadowed, x, y, canvas);

    save_png(&shadowed, out).map_err(|e| ReelError::asset(e.to_string()))?;
    tracing::debug!(src = %src.display(), w, h, x, y, "prepared category image");
    Ok(PlacedImage {
        path: out.to_path_buf(),
        x,
        y,
        width: shadowed.width(),
        height: shadowed.height(),
    })
}

fn crop_to_canvas(img: image::RgbaImage, x: u32, y: u32, canvas: Canvas) -> image::RgbaImage {
    let max_w = canvas.width.saturating_sub(x);
    let max_h = canvas.height.saturating_sub(y);
    if img.width() <= max_w && img.height() <= max_h {
        return img;
    }
    let w = img.width().min(max_w);
    let h = img.height().min(max_h);
    image::imageops::crop_imm(&img, 0, 0, w, h).to_image()
}

#[cfg(test)]
#[path = "../../tests/unit/compose/category_image.rs"]
mod tests;
