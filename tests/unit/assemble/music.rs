use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

fn track(path: &str, mood: &str) -> MusicTrack {
    MusicTrack {
        path: PathBuf::from(path),
        mood: mood.to_string(),
    }
}

fn library() -> Vec<MusicTrack> {
    vec![
        track("/m/upbeat/drums.mp3", "upbeat"),
        track("/m/calm/flute.mp3", "calm"),
        track("/m/ambient_drone/hum.mp3", "ambient drone"),
        track("/m/Deep_Meditation.mp3", ""),
    ]
}

#[test]
fn exact_beats_family_beats_random() {
    let mut rng = StdRng::seed_from_u64(7);
    let lib = library();

    let c = select_track(&lib, "Upbeat", &mut rng).unwrap();
    assert_eq!(c.matched, MusicMatch::Exact);
    assert_eq!(c.track.path, PathBuf::from("/m/upbeat/drums.mp3"));

    let c = select_track(&lib, "Energetic", &mut rng).unwrap();
    assert_eq!(c.matched, MusicMatch::Family);
    assert_eq!(c.track.path, PathBuf::from("/m/upbeat/drums.mp3"));

    let c = select_track(&lib, "Dark", &mut rng).unwrap();
    assert_eq!(c.matched, MusicMatch::Family);
    assert_eq!(c.track.mood, "ambient drone");

    let c = select_track(&lib, "Romantic", &mut rng).unwrap();
    assert_eq!(c.matched, MusicMatch::Random);
}

#[test]
fn loose_tracks_match_on_file_name_words() {
    let mut rng = StdRng::seed_from_u64(1);
    let c = select_track(&library(), "meditation", &mut rng).unwrap();
    assert_eq!(c.matched, MusicMatch::Exact);
    assert_eq!(c.track.path, PathBuf::from("/m/Deep_Meditation.mp3"));
}

#[test]
fn random_fallback_is_uniform_over_the_library() {
    let lib = library();
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..200 {
        let c = select_track(&lib, "unknown", &mut rng).unwrap();
        assert_eq!(c.matched, MusicMatch::Random);
        seen.insert(c.track.path);
    }
    assert_eq!(seen.len(), lib.len());
}

#[test]
fn empty_library_yields_nothing() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(select_track(&[], "calm", &mut rng).is_none());
}

#[test]
fn moods_normalize_and_find_their_family() {
    assert_eq!(normalize_mood("  Ambient_Drone "), "ambient drone");
    assert_eq!(mood_family("Calm").unwrap()[0], "peaceful");
    assert!(mood_family("romantic").is_none());
}
