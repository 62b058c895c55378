use super::*;
use crate::theme::resolver::ThemeResolver;

fn temp_file(name: &str, body: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "reelwright_mood_{name}_{}_{}.json",
        std::process::id(),
        nanos
    ));
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn screenplay_mood_wins_and_extra_fields_are_ignored() {
    let path = temp_file(
        "ok",
        r#"{"mood": "Mysterious", "music_style": "Ambient Drone", "scenes": {"love": "sunset"}}"#,
    );
    let theme = ThemeResolver.resolve("mesh");
    let file = ScreenplayFile::new(&path);
    assert_eq!(resolve_mood(Some(&file), "corpus", &theme), "Mysterious");
    assert_eq!(
        file.classify("").unwrap().music_style.as_deref(),
        Some("Ambient Drone")
    );
    let _ = std::fs::remove_file(&path);
}

#[test]
fn broken_or_missing_screenplay_falls_back_to_peaceful() {
    let theme = ThemeResolver.resolve("mesh");
    let broken = temp_file("broken", "{not json");
    assert_eq!(
        resolve_mood(Some(&ScreenplayFile::new(&broken)), "", &theme),
        FALLBACK_MOOD
    );
    let empty = temp_file("empty", r#"{"mood": "  "}"#);
    assert_eq!(
        resolve_mood(Some(&ScreenplayFile::new(&empty)), "", &theme),
        FALLBACK_MOOD
    );
    let missing = ScreenplayFile::new("/nonexistent/screenplay.json");
    assert!(missing.classify("").is_err());
    assert_eq!(resolve_mood(Some(&missing), "", &theme), FALLBACK_MOOD);
    let _ = std::fs::remove_file(&broken);
    let _ = std::fs::remove_file(&empty);
}

#[test]
fn without_classifier_the_theme_mood_is_used() {
    let theme = ThemeResolver.resolve("singh");
    assert_eq!(resolve_mood(None, "", &theme), theme.mood_label);
    let fixed = FixedMood("Dark".into());
    assert_eq!(resolve_mood(Some(&fixed), "", &theme), "Dark");
}
