//! Caption and title card documents.
//!
//! Captions are generated as small SVG documents and rasterized with the shared
//! [`SvgRasterizer`]. The same page layout feeds both backends: direct compositing renders
//! one still per highlight state, the frame simulation renders the state for each sample.

use std::ops::Range;

use crate::{
    assets::svg_raster::{SvgRasterizer, escape_xml},
    foundation::{
        core::{Canvas, Rgb8},
        error::ReelResult,
    },
    narration::timing::WordTiming,
};

/// Caption box opacity (0..=255) behind the text.
pub const BOX_ALPHA: u8 = 180;

/// Text layout parameters shared by every caption in a run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionStyle {
    pub font_family: String,
    pub font_size: f32,
    /// Soft wrap limit in characters per line.
    pub max_chars_per_line: usize,
    /// Lines per karaoke page.
    pub karaoke_lines: usize,
    /// Lines before a static block starts shrinking its font.
    pub static_max_lines: usize,
    pub text_color: Rgb8,
    /// Vertical centre of the caption box, as a fraction of the canvas height.
    pub anchor_y: f64,
    /// Horizontal margin between the caption box and the canvas edge, in pixels.
    pub margin_px: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_family: "Noto Sans Devanagari".to_string(),
            font_size: 64.0,
            max_chars_per_line: 22,
            karaoke_lines: 2,
            static_max_lines: 7,
            text_color: Rgb8::new(255, 255, 255),
            anchor_y: 0.72,
            margin_px: 60,
        }
    }
}

impl CaptionStyle {
    fn line_height(&self, font_size: f32) -> f32 {
        font_size * 1.35
    }

    fn padding(&self, font_size: f32) -> f32 {
        font_size * 0.6
    }

    fn box_height(&self, lines: usize, font_size: f32) -> u32 {
        let lines = lines.max(1) as f32;
        let h = 2.0 * self.padding(font_size) + self.line_height(font_size) * (lines - 1.0)
            + font_size * 1.3;
        h.ceil() as u32
    }

    fn box_width(&self, canvas: Canvas) -> u32 {
        canvas.width.saturating_sub(2 * self.margin_px).max(2)
    }
}

/// A caption document plus where it lands on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionDoc {
    pub svg: String,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl CaptionDoc {
    /// Rasterize to straight-alpha RGBA.
    pub fn rasterize(&self, rasterizer: &SvgRasterizer) -> ReelResult<image::RgbaImage> {
        rasterizer.render(&self.svg, self.width, self.height)
    }
}

/// Greedy word wrap by character count. Returns word index ranges, one per line.
///
/// A single word longer than the limit gets a line of its own.
pub fn wrap_words<S: AsRef<str>>(words: &[S], max_chars: usize) -> Vec<Range<usize>> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut start = 0;
    let mut len = 0usize;
    for (i, w) in words.iter().enumerate() {
        let n = w.as_ref().chars().count();
        if i > start && len + 1 + n > max_chars {
            lines.push(start..i);
            start = i;
            len = n;
        } else if i == start {
            len = n;
        } else {
            len += 1 + n;
        }
    }
    if start < words.len() {
        lines.push(start..words.len());
    }
    lines
}

/// Wrap free text into display lines.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    wrap_words(&words, max_chars)
        .into_iter()
        .map(|r| words[r].join(" "))
        .collect()
}

/// A group of consecutive words shown together in karaoke mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KaraokePage {
    /// Global word indices on this page.
    pub words: Range<usize>,
    /// Global word indices per line.
    pub lines: Vec<Range<usize>>,
}

impl KaraokePage {
    /// `[first word start, last word end)` of the page.
    pub fn span(&self, words: &[WordTiming]) -> (f64, f64) {
        let start = words[self.words.start].start_secs;
        let end = words[self.words.end - 1].end_secs();
        (start, end)
    }
}

/// Split timed words into pages of at most `style.karaoke_lines` lines.
pub fn paginate(words: &[WordTiming], style: &CaptionStyle) -> Vec<KaraokePage> {
    let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
    let lines = wrap_words(&texts, style.max_chars_per_line);
    lines
        .chunks(style.karaoke_lines.max(1))
        .map(|chunk| KaraokePage {
            words: chunk[0].start..chunk[chunk.len() - 1].end,
            lines: chunk.to_vec(),
        })
        .collect()
}

/// Page that owns word `idx`.
pub fn page_of_word(pages: &[KaraokePage], idx: usize) -> Option<usize> {
    pages.iter().position(|p| p.words.contains(&idx))
}

/// Page visible at `t`: the one whose span contains it, if any.
pub fn page_at(pages: &[KaraokePage], words: &[WordTiming], t: f64) -> Option<usize> {
    pages.iter().position(|p| {
        let (s, e) = p.span(words);
        s <= t && t < e
    })
}

fn open_doc(out: &mut String, w: u32, h: u32) {
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    ));
}

fn caption_box(out: &mut String, w: u32, h: u32, radius: f32) {
    out.push_str(&format!(
        r##"<rect x="0" y="0" width="{w}" height="{h}" rx="{radius:.1}" fill="#000000" fill-opacity="{:.4}"/>"##,
        f32::from(BOX_ALPHA) / 255.0
    ));
}

fn text_open(out: &mut String, cx: f32, baseline: f32, style: &CaptionStyle, size: f32, fill: Rgb8) {
    out.push_str(&format!(
        r#"<text x="{cx:.1}" y="{baseline:.1}" text-anchor="middle" font-family="{}" font-size="{size:.1}" fill="{}" xml:space="preserve">"#,
        escape_xml(&style.font_family),
        fill.to_hex()
    ));
}

fn place_y(canvas: Canvas, anchor: f64, h: u32) -> u32 {
    let centre = (f64::from(canvas.height) * anchor.clamp(0.0, 1.0)).round() as u32;
    centre
        .saturating_sub(h / 2)
        .min(canvas.height.saturating_sub(h))
}

/// Static caption: the full display text wrapped into one block.
///
/// Long texts shrink the font so the block stays within `static_max_lines` worth of height.
pub fn static_caption(text: &str, style: &CaptionStyle, canvas: Canvas) -> CaptionDoc {
    let mut size = style.font_size;
    let mut max_chars = style.max_chars_per_line;
    let mut lines = wrap_text(text, max_chars);
    if lines.len() > style.static_max_lines.max(1) {
        let scale = (style.static_max_lines.max(1) as f32 / lines.len() as f32).sqrt();
        size = (size * scale).max(style.font_size * 0.5);
        max_chars = ((max_chars as f32) * style.font_size / size).floor() as usize;
        lines = wrap_text(text, max_chars);
    }

    let width = style.box_width(canvas);
    let height = style.box_height(lines.len(), size);
    let mut svg = String::new();
    open_doc(&mut svg, width, height);
    caption_box(&mut svg, width, height, size * 0.4);
    let cx = width as f32 / 2.0;
    for (i, line) in lines.iter().enumerate() {
        let baseline = style.padding(size) + size + style.line_height(size) * i as f32;
        text_open(&mut svg, cx, baseline, style, size, style.text_color);
        svg.push_str(&escape_xml(line));
        svg.push_str("</text>");
    }
    svg.push_str("</svg>");

    CaptionDoc {
        svg,
        width,
        height,
        x: style.margin_px.min(canvas.width.saturating_sub(width)),
        y: place_y(canvas, style.anchor_y, height),
    }
}

/// Karaoke caption for `page` with `active` (a global word index) highlighted.
///
/// Every page is laid out at the full `karaoke_lines` height so the box does not jump.
pub fn karaoke_caption(
    words: &[WordTiming],
    page: &KaraokePage,
    active: Option<usize>,
    highlight: Rgb8,
    style: &CaptionStyle,
    canvas: Canvas,
) -> CaptionDoc {
    let size = style.font_size;
    let width = style.box_width(canvas);
    let height = style.box_height(style.karaoke_lines, size);
    let mut svg = String::new();
    open_doc(&mut svg, width, height);
    caption_box(&mut svg, width, height, size * 0.4);
    let cx = width as f32 / 2.0;
    for (i, line) in page.lines.iter().enumerate() {
        let baseline = style.padding(size) + size + style.line_height(size) * i as f32;
        text_open(&mut svg, cx, baseline, style, size, style.text_color);
        for idx in line.clone() {
            if idx > line.start {
                svg.push(' ');
            }
            let text = escape_xml(&words[idx].text);
            if Some(idx) == active {
                svg.push_str(&format!(
                    r#"<tspan fill="{}">{text}</tspan>"#,
                    highlight.to_hex()
                ));
            } else {
                svg.push_str(&format!("<tspan>{text}</tspan>"));
            }
        }
        svg.push_str("</text>");
    }
    svg.push_str("</svg>");

    CaptionDoc {
        svg,
        width,
        height,
        x: style.margin_px.min(canvas.width.saturating_sub(width)),
        y: place_y(canvas, style.anchor_y, height),
    }
}

/// Title card: category name over a date line, centred on the canvas.
pub fn title_card(
    display_name: &str,
    date_line: &str,
    accent: Rgb8,
    style: &CaptionStyle,
    canvas: Canvas,
) -> CaptionDoc {
    let big = style.font_size * 1.6;
    let small = style.font_size * 0.85;
    let width = style.box_width(canvas);
    let pad = style.padding(big);
    let height = (2.0 * pad + big * 1.3 + small * 1.8).ceil() as u32;

    let mut svg = String::new();
    open_doc(&mut svg, width, height);
    caption_box(&mut svg, width, height, big * 0.3);
    let cx = width as f32 / 2.0;
    text_open(&mut svg, cx, pad + big, style, big, accent);
    svg.push_str(&escape_xml(display_name));
    svg.push_str("</text>");
    if !date_line.trim().is_empty() {
        text_open(&mut svg, cx, pad + big * 1.3 + small * 1.2, style, small, style.text_color);
        svg.push_str(&escape_xml(date_line));
        svg.push_str("</text>");
    }
    svg.push_str("</svg>");

    CaptionDoc {
        svg,
        width,
        height,
        x: style.margin_px.min(canvas.width.saturating_sub(width)),
        y: place_y(canvas, 0.5, height),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/caption.rs"]
mod tests;
