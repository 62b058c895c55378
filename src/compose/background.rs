use crate::foundation::{
    core::{Canvas, Rgb8},
    error::{ReelError, ReelResult},
};

/// Vertical gradient through `ramp` (top to bottom), evenly spaced stops.
pub fn render_gradient(canvas: Canvas, ramp: &[Rgb8]) -> ReelResult<image::RgbImage> {
    canvas.validate()?;
    let (first, rest) = ramp
        .split_first()
        .ok_or_else(|| ReelError::asset("empty colour ramp"))?;
    if rest.is_empty() {
        return Ok(image::RgbImage::from_pixel(
            canvas.width,
            canvas.height,
            image::Rgb([first.r, first.g, first.b]),
        ));
    }

    let segments = (ramp.len() - 1) as f64;
    let max_y = f64::from(canvas.height.saturating_sub(1).max(1));
    let mut img = image::RgbImage::new(canvas.width, canvas.height);
    for y in 0..canvas.height {
        let c = gradient_at(ramp, segments, f64::from(y) / max_y);
        let px = image::Rgb([c.r, c.g, c.b]);
        for x in 0..canvas.width {
            img.put_pixel(x, y, px);
        }
    }
    Ok(img)
}

fn gradient_at(ramp: &[Rgb8], segments: f64, t: f64) -> Rgb8 {
    let pos = t.clamp(0.0, 1.0) * segments;
    let idx = (pos.floor() as usize).min(ramp.len() - 2);
    ramp[idx].lerp(ramp[idx + 1], pos - idx as f64)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/background.rs"]
mod tests;
