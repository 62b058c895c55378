use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};

// Guard against pathological allocations from a bad canvas setting.
const MAX_DIM: u32 = 16_384;

/// Rasterizes generated SVG documents (captions, titles) with system fonts.
///
/// Font discovery is expensive, so one rasterizer is built per run and shared read-only.
pub struct SvgRasterizer {
    options: usvg::Options<'static>,
}

impl std::fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRasterizer")
            .field("font_faces", &self.options.fontdb.len())
            .finish()
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::with_system_fonts()
    }
}

impl SvgRasterizer {
    /// Rasterizer with every system font loaded.
    pub fn with_system_fonts() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self {
            options: usvg::Options {
                fontdb: std::sync::Arc::new(db),
                ..Default::default()
            },
        }
    }

    /// Rasterizer without fonts; text nodes render as nothing. Used by shape-only tests.
    pub fn without_fonts() -> Self {
        Self {
            options: usvg::Options::default(),
        }
    }

    /// Number of font faces available to text nodes.
    pub fn font_face_count(&self) -> usize {
        self.options.fontdb.len()
    }

    /// Render `svg` into a straight-alpha RGBA image of `width` x `height`.
    ///
    /// The document is scaled to fill the target size.
    pub fn render(&self, svg: &str, width: u32, height: u32) -> ReelResult<image::RgbaImage> {
        if width == 0 || height == 0 || width > MAX_DIM || height > MAX_DIM {
            return Err(ReelError::render(format!(
                "svg raster size out of range: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
            )));
        }
        let tree = usvg::Tree::from_str(svg, &self.options)
            .map_err(|e| ReelError::render(format!("svg parse failed: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| ReelError::render("failed to allocate svg pixmap"))?;
        let sx = (width as f32) / tree.size().width();
        let sy = (height as f32) / tree.size().height();
        let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
        resvg::render(&tree, xform, &mut pixmap.as_mut());

        let straight = premul_to_straight_rgba8(pixmap.data());
        image::RgbaImage::from_raw(width, height, straight)
            .ok_or_else(|| ReelError::render("svg pixmap size mismatch"))
    }
}

/// Convert premultiplied RGBA8 (tiny-skia's layout) to straight alpha for PNG output.
pub fn premul_to_straight_rgba8(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    for px in src.chunks_exact(4) {
        let a = px[3];
        if a == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if a == 255 {
            out.extend_from_slice(px);
            continue;
        }
        let unmul = |c: u8| -> u8 {
            ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8
        };
        out.extend_from_slice(&[unmul(px[0]), unmul(px[1]), unmul(px[2]), a]);
    }
    out
}

/// Write `img` as PNG, creating parent directories as needed.
pub fn save_png(img: &image::RgbaImage, path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| ReelError::render(format!("failed to write '{}': {e}", path.display())))
}

/// Escape text for inclusion in SVG character data or attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/svg_raster.rs"]
mod tests;
