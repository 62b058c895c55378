use super::*;

#[derive(Debug, Clone, PartialEq)]
struct Item(SectionKey, f64);

impl Timed for Item {
    fn key(&self) -> &SectionKey {
        &self.0
    }
    fn duration_secs(&self) -> f64 {
        self.1
    }
}

fn items(rows: &[(&str, f64)]) -> Vec<Item> {
    rows.iter()
        .map(|(k, d)| Item(SectionKey::parse(k), *d))
        .collect()
}

fn keys(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.0.as_str()).collect()
}

fn planner(ceiling: f64) -> SectionPlanner {
    SectionPlanner::new(PlannerPolicy::default().with_ceiling(ceiling)).unwrap()
}

#[test]
fn under_ceiling_is_untouched() {
    let input = items(&[("hook", 6.0), ("love", 8.0), ("career", 10.0), ("remedy", 7.0)]);
    let out = planner(58.0).trim(input.clone());
    assert_eq!(out.kept, input);
    assert!(out.dropped.is_empty());
    assert!((out.total_after_secs - 31.0).abs() < 1e-9);
}

#[test]
fn drops_in_editorial_order_until_within_ceiling() {
    let input = items(&[
        ("intro", 5.0),
        ("hook", 6.0),
        ("love", 9.0),
        ("career", 8.0),
        ("money", 7.0),
        ("health", 6.0),
        ("remedy", 9.0),
        ("lucky_color", 4.0),
        ("lucky_number", 3.0),
    ]);
    let out = planner(40.0).trim(input);
    assert_eq!(
        keys(&out.dropped),
        vec!["intro", "health", "lucky_number", "lucky_color"]
    );
    assert_eq!(keys(&out.kept), vec!["hook", "love", "career", "money", "remedy"]);
    assert!((out.total_before_secs - 57.0).abs() < 1e-9);
    assert!((out.total_after_secs - 39.0).abs() < 1e-9);
    assert!(out.within(40.0));
}

#[test]
fn protected_sections_survive_any_pressure() {
    let input = items(&[
        ("hook", 20.0),
        ("intro", 5.0),
        ("love", 20.0),
        ("career", 20.0),
        ("remedy", 20.0),
        ("money", 5.0),
    ]);
    let out = planner(10.0).trim(input);
    assert_eq!(keys(&out.kept), vec!["hook", "love", "career", "remedy"]);
    assert_eq!(keys(&out.dropped), vec!["intro", "money"]);
    assert!(!out.within(10.0));
    assert!(out.total_after_secs <= out.total_before_secs);
}

#[test]
fn unknown_keys_are_never_trimmed() {
    let input = items(&[("hook", 30.0), ("mantra", 30.0)]);
    let out = planner(10.0).trim(input);
    assert_eq!(keys(&out.kept), vec!["hook", "mantra"]);
}

#[test]
fn policy_rejects_protected_droppable_overlap() {
    let mut policy = PlannerPolicy::default();
    policy.droppable.push(SectionKey::Love);
    assert!(SectionPlanner::new(policy).is_err());
    assert!(SectionPlanner::new(PlannerPolicy::default().with_ceiling(0.0)).is_err());
}

#[test]
fn prefilter_orders_known_then_unknown_in_encounter_order() {
    let script = Script::from_pairs([
        ("zodiac_tip", "आज ध्यान करें"),
        ("remedy", "गाय को गुड़ खिलाएं"),
        ("hook", "आज का दिन खास है!"),
        ("love", "प्रेम में मिठास"),
        ("aside", "एक और बात"),
        ("money", "धन"),
        ("health", ""),
    ]);
    let out = planner(58.0).prefilter(&script, &SpokenNormalizer::default());
    let order: Vec<&str> = out.sections.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(order, vec!["hook", "love", "remedy", "zodiac_tip", "aside"]);

    let rejected: Vec<&str> = out.rejected.iter().map(|r| r.key.as_str()).collect();
    assert!(rejected.contains(&"money"));
    assert!(rejected.contains(&"health"));
    assert!(rejected.contains(&"career"));
    assert!(
        out.rejected
            .iter()
            .all(|r| matches!(r.reason, ReelError::ContentMissing(_)))
    );
}

#[test]
fn prefilter_splits_spoken_and_display_text() {
    let script = Script::from_pairs([("hook", "  मेष (Aries) राशि वालों सावधान!  ")]);
    let out = planner(58.0).prefilter(&script, &SpokenNormalizer::default());
    let hook = &out.sections[0];
    assert_eq!(hook.display_text, "मेष (Aries) राशि वालों सावधान!");
    assert_eq!(hook.spoken_text, "मेष राशि वालों सावधान!");
}

#[test]
fn stringified_numbers_face_the_minimum_length() {
    let script = Script::from_json_str(
        r#"{"hook": "आज का दिन खास है!", "lucky_number": 7, "lucky_dates": [5, 14, 23]}"#,
    )
    .unwrap();
    let out = planner(58.0).prefilter(&script, &SpokenNormalizer::default());

    let order: Vec<&str> = out.sections.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(order, vec!["hook", "lucky_dates"]);
    assert_eq!(out.sections[1].display_text, "5, 14, 23");
    let number = out
        .rejected
        .iter()
        .find(|r| r.key == SectionKey::LuckyNumber)
        .unwrap();
    assert!(matches!(number.reason, ReelError::ContentMissing(_)));
}
