use super::*;

#[test]
fn strips_latin_annotations_but_keeps_native_parentheses() {
    let n = SpokenNormalizer::new(Vec::new());
    assert_eq!(n.normalize("मेष (Aries) राशि"), "मेष राशि");
    assert_eq!(n.normalize("उपाय (गुड़ का दान) करें"), "उपाय (गुड़ का दान) करें");
    assert_eq!(n.normalize("अंक (7) शुभ"), "अंक (7) शुभ");
}

#[test]
fn unbalanced_parenthesis_is_left_alone() {
    let n = SpokenNormalizer::new(Vec::new());
    assert_eq!(n.normalize("शुभ (Lucky"), "शुभ (Lucky");
}

#[test]
fn default_substitutions_apply() {
    let n = SpokenNormalizer::default();
    assert_eq!(n.normalize("प्रेम & करियर"), "प्रेम और करियर");
    assert_eq!(n.normalize("लाभ 20%"), "लाभ 20 प्रतिशत");
}

#[test]
fn whitespace_collapses_and_danda_attaches() {
    let n = SpokenNormalizer::new(Vec::new());
    assert_eq!(n.normalize("  आज   दिन (Today) ।  "), "आज दिन।");
}
