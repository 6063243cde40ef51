use super::*;

const SENTENCE: usize = 0;
const TRANSLATION: usize = 1;
const BREAKDOWN: usize = 2;

#[test]
fn test_a_line_sentence_and_translation() {
    let buffer = "A: 彼は走った。\tHe ran.#ID=12345\n";
    let lines = parse(DictionaryKind::Examples, buffer);
    assert_eq!(
        column_texts(buffer, &lines[0], SENTENCE),
        vec!["彼は走った。"]
    );
    assert_eq!(column_texts(buffer, &lines[0], TRANSLATION), vec!["He ran."]);
}

#[test]
fn test_a_line_without_id_marker() {
    let buffer = "A: こんにちは\tHello.\n";
    let lines = parse(DictionaryKind::Examples, buffer);
    assert_eq!(column_texts(buffer, &lines[0], TRANSLATION), vec!["Hello."]);
}

#[test]
fn test_b_line_breakdown_tokens() {
    let buffer = "B: 彼(かれ)[01] は 走る{走った}\n";
    let lines = parse(DictionaryKind::Examples, buffer);
    assert!(lines[0].column(SENTENCE).is_empty());
    assert_eq!(
        column_texts(buffer, &lines[0], BREAKDOWN),
        vec!["彼(かれ)[01]", "は", "走る{走った}"]
    );
}

#[test]
fn test_unprefixed_line_is_empty() {
    let buffer = "#comment\n";
    let lines = parse(DictionaryKind::Examples, buffer);
    assert!(lines[0].columns.iter().all(|c| c.is_empty()));
}

#[test]
fn test_pair_keeps_line_ids() {
    let buffer = "A: 水\tWater.#ID=1\nB: 水\n";
    let lines = parse(DictionaryKind::Examples, buffer);
    assert_eq!(lines.len(), 2);
    assert_eq!(column_texts(buffer, &lines[0], SENTENCE), vec!["水"]);
    assert_eq!(column_texts(buffer, &lines[1], BREAKDOWN), vec!["水"]);
}
