use super::*;
use crate::{
    compose::layer::{CaptionMode, LayerKind, VisualSource},
    foundation::core::TimeWindow,
};

fn scene(label: &str, secs: f64) -> Scene {
    Scene {
        label: label.to_string(),
        layers: vec![
            VisualLayer {
                kind: LayerKind::Background,
                source: VisualSource::still("/bg.png"),
                window: TimeWindow::whole(secs).unwrap(),
                x: 0,
                y: 0,
            },
            VisualLayer {
                kind: LayerKind::Caption,
                source: VisualSource::still("/late.png"),
                window: TimeWindow::new(secs * 0.9, secs).unwrap(),
                x: 0,
                y: 0,
            },
        ],
        duration_secs: secs,
        audio: Some(format!("/{label}.mp3").into()),
        caption_mode: CaptionMode::Static,
        fade_in_secs: 0.3,
    }
}

#[test]
fn under_the_maximum_nothing_changes() {
    let scenes = vec![scene("title", 2.0), scene("hook", 6.0), scene("love", 8.0)];
    let t = fit_timeline(&scenes, 59.0, 0.5).unwrap();
    assert!(!t.truncated);
    assert_eq!(t.final_secs, 16.0);
    assert_eq!(t.nominal_secs, 16.0);
    assert!(t.fade_out.is_none());
    assert_eq!(t.segments.len(), 3);
    assert_eq!(t.segments[2].layers, scenes[2].layers);
}

#[test]
fn over_the_maximum_truncates_to_exactly_max_with_tail_fade() {
    let scenes: Vec<Scene> = (0..7).map(|i| scene(&format!("s{i}"), 10.0)).collect();
    let t = fit_timeline(&scenes, 59.0, 0.5).unwrap();
    assert!(t.truncated);
    assert_eq!(t.nominal_secs, 70.0);
    assert_eq!(t.final_secs, 59.0);
    let sum: f64 = t.segments.iter().map(|s| s.duration_secs).sum();
    assert!((sum - 59.0).abs() < 1e-9);
    assert_eq!(t.segments.len(), 6);
    assert_eq!(t.cut, vec!["s6".to_string()]);
    assert_eq!(
        t.fade_out,
        Some(FadeOut {
            start_secs: 58.5,
            duration_secs: 0.5
        })
    );

    // The shortened scene loses the layer that started after the cut.
    let last = &t.segments[5];
    assert_eq!(last.duration_secs, 9.0);
    assert_eq!(last.layers.len(), 1);
    assert_eq!(last.layers[0].window.end, 9.0);
}

#[test]
fn exactly_at_the_maximum_is_not_truncated() {
    let scenes = vec![scene("a", 29.5), scene("b", 29.5)];
    let t = fit_timeline(&scenes, 59.0, 0.5).unwrap();
    assert!(!t.truncated);
    assert!(t.fade_out.is_none());
}

#[test]
fn zero_scenes_is_assembly_empty() {
    assert!(matches!(
        fit_timeline(&[], 59.0, 0.5),
        Err(ReelError::AssemblyEmpty(_))
    ));
    assert!(matches!(
        fit_timeline(&[scene("a", 1.0)], 0.0, 0.5),
        Err(ReelError::Validation(_))
    ));
}
