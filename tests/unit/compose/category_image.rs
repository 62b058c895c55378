use super::*;

fn temp_dir(name: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "reelwright_catimg_{name}_{}_{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn fit_size_preserves_aspect_and_caps_height() {
    // Wide image: width-limited.
    assert_eq!(fit_size(400, 200, 600, 600), (600, 300));
    // Tall image: height cap wins.
    assert_eq!(fit_size(200, 800, 600, 400), (100, 400));
    assert_eq!(fit_size(0, 10, 600, 400), (0, 0));
}

#[test]
fn drop_shadow_pads_and_keeps_source_on_top() {
    let img = image::RgbaImage::from_pixel(10, 10, image::Rgba([200, 10, 10, 255]));
    let out = with_drop_shadow(&img);
    assert!(out.width() > 10 && out.height() > 10);
    let margin = (SHADOW_SIGMA * 3.0).ceil() as u32;
    assert_eq!(out.get_pixel(margin + 2, margin + 2).0, [200, 10, 10, 255]);
    // Shadow below-right of the image is dark and partially transparent.
    let s = out.get_pixel(margin + 10 + SHADOW_OFFSET / 2, margin + 10 + SHADOW_OFFSET / 2);
    assert!(s.0[3] > 0 && s.0[3] < 255);
    assert_eq!(&s.0[..3], &[0, 0, 0]);
}

#[test]
fn prepare_writes_a_placed_png() {
    let dir = temp_dir("prepare");
    let src = dir.join("Mesh (Aries).png");
    image::RgbaImage::from_pixel(50, 100, image::Rgba([1, 2, 3, 255]))
        .save(&src)
        .unwrap();
    let canvas = Canvas {
        width: 200,
        height: 400,
    };
    let placed = prepare(&src, canvas, &dir.join("out/cat.png")).unwrap();
    assert!(placed.path.exists());
    assert!(placed.x + placed.width <= canvas.width);
    assert!(placed.y + placed.height <= canvas.height);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unreadable_image_is_an_asset_error() {
    let dir = temp_dir("bad");
    let src = dir.join("broken.png");
    std::fs::write(&src, b"not an image").unwrap();
    let canvas = Canvas::PORTRAIT_HD;
    assert!(matches!(
        prepare(&src, canvas, &dir.join("o.png")),
        Err(ReelError::AssetUnavailable(_))
    ));
    assert!(matches!(
        prepare(&dir.join("missing.png"), canvas, &dir.join("o.png")),
        Err(ReelError::AssetUnavailable(_))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}
