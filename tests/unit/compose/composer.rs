use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    assets::store::FsAssetStore,
    plan::section::{Section, SectionKey},
    theme::resolver::ThemeResolver,
};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "reelwright_composer_{name}_{}_{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const SMALL: Canvas = Canvas {
    width: 96,
    height: 160,
};

fn settings(backend: BackendKind) -> ComposerSettings {
    ComposerSettings {
        canvas: SMALL,
        sample_fps: Fps::new(4, 1).unwrap(),
        backend,
        caption: CaptionStyle {
            font_size: 8.0,
            margin_px: 4,
            ..CaptionStyle::default()
        },
        ..ComposerSettings::default()
    }
}

fn word(text: &str, start: f64, dur: f64) -> WordTiming {
    WordTiming {
        text: text.to_string(),
        start_secs: start,
        duration_secs: dur,
    }
}

fn timed(key: &str, total: f64, timings: Vec<WordTiming>) -> TimedSection {
    TimedSection {
        section: Section {
            key: SectionKey::parse(key),
            spoken_text: "आज का दिन".to_string(),
            display_text: "आज का दिन (today)".to_string(),
        },
        audio_path: PathBuf::from(format!("/tmp/{key}.mp3")),
        audio_secs: total - 0.5,
        total_secs: total,
        timings,
    }
}

fn raster() -> Arc<SvgRasterizer> {
    Arc::new(SvgRasterizer::without_fonts())
}

#[test]
fn static_caption_spans_whole_scene() {
    let dir = temp_dir("static");
    let cache = ThemeArtCache::new(dir.join("art"), SMALL);
    let store = FsAssetStore::default();
    let composer = SceneComposer::new(settings(BackendKind::Direct), raster(), &cache, &store, &dir);
    let theme = ThemeResolver.resolve("mesh");

    let scene = composer.compose_section(0, &theme, &timed("love", 7.25, vec![])).unwrap();
    assert_eq!(scene.caption_mode, CaptionMode::Static);
    assert_eq!(scene.caption_display_secs(), 7.25);
    assert_eq!(scene.duration_secs, 7.25);
    assert_eq!(scene.audio, Some(PathBuf::from("/tmp/love.mp3")));
    assert_eq!(scene.layers[0].kind, LayerKind::Background);
    assert!(scene.is_time_invariant());
    assert!((scene.fade_in_secs - 0.3).abs() < 1e-9);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn karaoke_layers_reuse_word_offsets_exactly() {
    let dir = temp_dir("karaoke");
    let cache = ThemeArtCache::new(dir.join("art"), SMALL);
    let store = FsAssetStore::default();
    let composer = SceneComposer::new(settings(BackendKind::Direct), raster(), &cache, &store, &dir);
    let theme = ThemeResolver.resolve("mesh");
    let words = vec![word("एक", 0.1, 0.4), word("दो", 0.7, 0.3), word("तीन", 1.0, 0.5)];

    let scene = composer
        .compose_section(1, &theme, &timed("career", 2.0, words.clone()))
        .unwrap();
    assert_eq!(scene.caption_mode, CaptionMode::Karaoke);

    let captions: Vec<&VisualLayer> = scene.caption_layers().collect();
    for w in &words {
        assert!(
            captions
                .iter()
                .any(|l| l.window.start == w.start_secs && l.window.end == w.end_secs()),
            "no layer for {}",
            w.text
        );
    }
    // Gap between the first two words shows the unhighlighted page.
    assert!(captions.iter().any(|l| l.window.start == 0.5 && l.window.end == 0.7));
    // Caption layers never overlap in time.
    for pair in captions.windows(2) {
        assert!(pair[0].window.end <= pair[1].window.start);
    }
    assert!((scene.caption_display_secs() - 1.4).abs() < 1e-9);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn title_scene_is_silent_and_fixed_length() {
    let dir = temp_dir("title");
    let cache = ThemeArtCache::new(dir.join("art"), SMALL);
    let store = FsAssetStore::default();
    let composer = SceneComposer::new(settings(BackendKind::Direct), raster(), &cache, &store, &dir);
    let scene = composer
        .compose_title(&ThemeResolver.resolve("meen"), "17 अक्टूबर")
        .unwrap();
    assert_eq!(scene.label, "title");
    assert_eq!(scene.audio, None);
    assert_eq!(scene.duration_secs, 2.0);
    assert_eq!(scene.caption_mode, CaptionMode::Title);
    let _ = std::fs::remove_dir_all(&dir);
}

struct ScriptedRenderer {
    fail: bool,
}

impl simulate::FrameRenderer for ScriptedRenderer {
    fn load(&mut self, _params: &SimulationParams) -> ReelResult<()> {
        Ok(())
    }

    fn seek(&mut self, _t: f64, _active_word: Option<usize>) -> ReelResult<()> {
        Ok(())
    }

    fn capture_frame(&mut self) -> ReelResult<image::RgbaImage> {
        if self.fail {
            return Err(ReelError::render("renderer lost its page"));
        }
        Ok(image::RgbaImage::new(SMALL.width, SMALL.height))
    }
}

#[test]
fn renderer_failure_skips_only_that_section() {
    let dir = temp_dir("simfail");
    let cache = ThemeArtCache::new(dir.join("art"), SMALL);
    let store = FsAssetStore::default();
    let made = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&made);
    let composer = SceneComposer::new(settings(BackendKind::Simulate), raster(), &cache, &store, &dir)
        .with_renderer_factory(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Box::new(ScriptedRenderer { fail: n == 1 })
        });
    let theme = ThemeResolver.resolve("tula");
    let sections = vec![
        timed("hook", 1.0, vec![word("a", 0.0, 0.5)]),
        timed("love", 1.0, vec![]),
        timed("remedy", 0.5, vec![]),
    ];

    let out = composer.compose_all(&theme, &sections).unwrap();
    assert_eq!(
        out.scenes.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
        vec!["hook", "remedy"]
    );
    assert_eq!(out.rejected.len(), 1);
    assert_eq!(out.rejected[0].key, SectionKey::Love);
    assert!(matches!(out.rejected[0].reason, ReelError::RenderFailure(_)));
    match &out.scenes[0].layers[0].source {
        VisualSource::Sequence { frames, .. } => assert_eq!(*frames, 4),
        other => panic!("unexpected source {other:?}"),
    }
    assert!(!dir.join("01_love/frames").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn parallel_composition_keeps_order_and_renders_background_once() {
    let dir = temp_dir("parallel");
    let cache = ThemeArtCache::new(dir.join("art"), SMALL);
    let store = FsAssetStore::default();
    let mut s = settings(BackendKind::Direct);
    s.parallel = true;
    s.threads = Some(3);
    let composer = SceneComposer::new(s, raster(), &cache, &store, &dir);
    let theme = ThemeResolver.resolve("singh");
    let keys = ["hook", "love", "career", "money", "remedy"];
    let sections: Vec<TimedSection> = keys.iter().map(|k| timed(k, 1.5, vec![])).collect();

    let out = composer.compose_all(&theme, &sections).unwrap();
    assert!(out.rejected.is_empty());
    assert_eq!(
        out.scenes.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
        keys.to_vec()
    );
    assert_eq!(cache.background_renders(), 1);
    let first_bg = &out.scenes[0].layers[0].source;
    assert!(out.scenes.iter().all(|s| &s.layers[0].source == first_bg));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn zero_threads_is_rejected() {
    let dir = temp_dir("threads");
    let cache = ThemeArtCache::new(dir.join("art"), SMALL);
    let store = FsAssetStore::default();
    let mut s = settings(BackendKind::Direct);
    s.parallel = true;
    s.threads = Some(0);
    let composer = SceneComposer::new(s, raster(), &cache, &store, &dir);
    let sections = vec![timed("hook", 1.0, vec![]), timed("love", 1.0, vec![])];
    assert!(matches!(
        composer.compose_all(&ThemeResolver.resolve("x"), &sections),
        Err(ReelError::Validation(_))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}
