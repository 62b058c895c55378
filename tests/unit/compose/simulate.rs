use super::*;
use std::sync::Mutex;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "reelwright_sim_{name}_{}_{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const SMALL: Canvas = Canvas {
    width: 32,
    height: 64,
};

fn word(text: &str, start: f64, dur: f64) -> WordTiming {
    WordTiming {
        text: text.to_string(),
        start_secs: start,
        duration_secs: dur,
    }
}

fn params(dir: &Path, captions: SimCaptions) -> SimulationParams {
    let bg = dir.join("bg.png");
    image::RgbaImage::from_pixel(SMALL.width, SMALL.height, image::Rgba([10, 20, 30, 255]))
        .save(&bg)
        .unwrap();
    SimulationParams {
        canvas: SMALL,
        background: bg,
        category_image: None,
        captions,
    }
}

#[derive(Default)]
struct Recording {
    calls: Arc<Mutex<Vec<String>>>,
    fail_capture_at: Option<usize>,
    captures: usize,
}

impl FrameRenderer for Recording {
    fn load(&mut self, _params: &SimulationParams) -> ReelResult<()> {
        self.calls.lock().unwrap().push("load".to_string());
        Ok(())
    }

    fn seek(&mut self, t: f64, active_word: Option<usize>) -> ReelResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("seek {t:.2} {active_word:?}"));
        Ok(())
    }

    fn capture_frame(&mut self) -> ReelResult<image::RgbaImage> {
        if self.fail_capture_at == Some(self.captures) {
            return Err(ReelError::Other(anyhow::anyhow!("renderer crashed")));
        }
        self.captures += 1;
        self.calls.lock().unwrap().push("capture".to_string());
        Ok(image::RgbaImage::new(SMALL.width, SMALL.height))
    }
}

#[test]
fn calls_are_strictly_ordered_and_use_exact_word_windows() {
    let dir = temp_dir("order");
    let p = params(
        &dir,
        SimCaptions::Karaoke {
            words: vec![word("a", 0.0, 0.5), word("b", 0.75, 0.25)],
            highlight: Rgb8::new(255, 0, 0),
        },
    );
    let mut r = Recording::default();
    let fps = Fps::new(4, 1).unwrap();
    let src = simulate_scene(&mut r, &p, 1.0, fps, &dir.join("frames")).unwrap();

    let calls = r.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            "load",
            "seek 0.00 Some(0)",
            "capture",
            "seek 0.25 Some(0)",
            "capture",
            "seek 0.50 None",
            "capture",
            "seek 0.75 Some(1)",
            "capture",
        ]
    );
    match src {
        VisualSource::Sequence { frames, pattern, .. } => {
            assert_eq!(frames, 4);
            assert_eq!(pattern, FRAME_PATTERN);
        }
        other => panic!("unexpected source {other:?}"),
    }
    assert!(dir.join("frames/frame_00003.png").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn any_renderer_error_fails_the_scene_and_clears_frames() {
    let dir = temp_dir("fail");
    let p = params(&dir, SimCaptions::Static { text: "x".into() });
    let mut r = Recording {
        fail_capture_at: Some(2),
        ..Recording::default()
    };
    let out = dir.join("frames");
    let err = simulate_scene(&mut r, &p, 1.0, Fps::new(4, 1).unwrap(), &out).unwrap_err();
    assert!(matches!(err, ReelError::RenderFailure(_)));
    assert!(!out.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn seek_before_load_is_a_render_failure() {
    let mut r = SvgFrameRenderer::new(Arc::new(SvgRasterizer::without_fonts()), CaptionStyle::default());
    assert!(matches!(r.seek(0.0, None), Err(ReelError::RenderFailure(_))));
    assert!(r.capture_frame().is_err());
}

#[test]
fn svg_renderer_draws_caption_box_over_background() {
    let dir = temp_dir("svg");
    let style = CaptionStyle {
        margin_px: 2,
        font_size: 6.0,
        ..CaptionStyle::default()
    };
    let p = params(
        &dir,
        SimCaptions::Karaoke {
            words: vec![word("a", 0.0, 0.5)],
            highlight: Rgb8::new(255, 0, 0),
        },
    );
    let mut r = SvgFrameRenderer::new(Arc::new(SvgRasterizer::without_fonts()), style.clone());
    r.load(&p).unwrap();

    r.seek(0.1, Some(0)).unwrap();
    let during = r.capture_frame().unwrap();
    r.seek(0.9, None).unwrap();
    let after = r.capture_frame().unwrap();

    let doc = caption::karaoke_caption(
        &[word("a", 0.0, 0.5)],
        &caption::paginate(&[word("a", 0.0, 0.5)], &style)[0],
        Some(0),
        Rgb8::new(255, 0, 0),
        &style,
        SMALL,
    );
    let (x, y) = (doc.x + doc.width / 2, doc.y + doc.height / 2);
    assert_ne!(during.get_pixel(x, y), after.get_pixel(x, y));
    assert_eq!(after.get_pixel(x, y).0, [10, 20, 30, 255]);
    let _ = std::fs::remove_dir_all(&dir);
}
