use super::*;

#[test]
fn keys_round_trip_through_strings() {
    for key in SectionKey::ORDERED {
        assert_eq!(&SectionKey::parse(key.as_str()), key);
    }
    assert_eq!(SectionKey::parse(" Love "), SectionKey::Love);
    assert_eq!(
        SectionKey::parse("mantra"),
        SectionKey::Other("mantra".to_string())
    );
    assert!(!SectionKey::parse("mantra").is_known());
}

#[test]
fn protected_and_droppable_are_disjoint() {
    for key in SectionKey::PROTECTED {
        assert!(!SectionKey::DROPPABLE.contains(key));
    }
}

#[test]
fn script_json_keeps_file_order_and_stringifies_scalars() {
    let script = Script::from_json_str(
        r#"{"zeta": "custom block", "hook": "सावधान रहें!", "lucky_number": 7,
            "lucky_dates": [3, 12, 21], "notes": null, "meta": {"x": 1}}"#,
    )
    .unwrap();
    let keys: Vec<&str> = script.entries().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["zeta", "hook", "lucky_number", "lucky_dates"]);
    assert_eq!(script.get("lucky_number"), Some("7"));
    assert_eq!(script.get("lucky_dates"), Some("3, 12, 21"));
    assert_eq!(script.get("HOOK"), Some("सावधान रहें!"));
}

#[test]
fn script_json_must_be_an_object() {
    assert!(matches!(
        Script::from_json_str("[1, 2]").unwrap_err(),
        ReelError::Validation(_)
    ));
    assert!(matches!(
        Script::from_json_str("{").unwrap_err(),
        ReelError::Serde(_)
    ));
}

#[test]
fn repeated_keys_replace_in_place() {
    let script = Script::from_pairs([("a", "1"), ("b", "2"), ("a", "3")]);
    let entries: Vec<(&str, &str)> = script.entries().collect();
    assert_eq!(entries, vec![("a", "3"), ("b", "2")]);
    assert_eq!(script.corpus(), "3 2");
}
