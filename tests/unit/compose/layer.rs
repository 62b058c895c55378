use super::*;

fn layer(kind: LayerKind, start: f64, end: f64) -> VisualLayer {
    VisualLayer {
        kind,
        source: VisualSource::still(format!("/tmp/{kind:?}.png")),
        window: TimeWindow::new(start, end).unwrap(),
        x: 0,
        y: 0,
    }
}

fn scene(layers: Vec<VisualLayer>, duration: f64) -> Scene {
    Scene {
        label: "love".to_string(),
        layers,
        duration_secs: duration,
        audio: None,
        caption_mode: CaptionMode::Static,
        fade_in_secs: 0.0,
    }
}

#[test]
fn z_order_is_enforced() {
    let ok = scene(
        vec![
            layer(LayerKind::Background, 0.0, 4.0),
            layer(LayerKind::CategoryImage, 0.0, 4.0),
            layer(LayerKind::Caption, 0.0, 4.0),
        ],
        4.0,
    );
    ok.validate().unwrap();
    assert!(ok.is_time_invariant());

    let bad = scene(
        vec![
            layer(LayerKind::Caption, 0.0, 4.0),
            layer(LayerKind::Background, 0.0, 4.0),
        ],
        4.0,
    );
    assert!(matches!(bad.validate(), Err(ReelError::RenderFailure(_))));
}

#[test]
fn layer_past_scene_end_is_rejected() {
    let s = scene(vec![layer(LayerKind::Background, 0.0, 5.0)], 4.0);
    assert!(s.validate().is_err());
    let zero = scene(vec![], 0.0);
    assert!(zero.validate().is_err());
}

#[test]
fn caption_display_time_merges_overlaps_and_skips_gaps() {
    let s = scene(
        vec![
            layer(LayerKind::Background, 0.0, 6.0),
            layer(LayerKind::Caption, 0.5, 1.0),
            layer(LayerKind::Caption, 1.0, 2.0),
            layer(LayerKind::Caption, 1.5, 2.5),
            layer(LayerKind::Caption, 4.0, 5.0),
        ],
        6.0,
    );
    assert!((s.caption_display_secs() - 3.0).abs() < 1e-9);
    assert_eq!(s.caption_layers().count(), 4);
    assert!(!s.is_time_invariant());
}
