use super::*;

const KANJI: usize = 0;
const READINGS: usize = 1;
const MEANINGS: usize = 2;
const STROKES: usize = 3;
const RADICAL: usize = 4;
const GRADE: usize = 5;
const FREQUENCY: usize = 6;

const ASIA: &str = "亜 3021 U4e9c B7 C1 G8 S7 F1509 ア つ.ぐ {Asia} {rank next}\n";

#[test]
fn test_kanji_field() {
    let lines = parse(DictionaryKind::Kanji, ASIA);
    assert_eq!(column_texts(ASIA, &lines[0], KANJI), vec!["亜"]);
}

#[test]
fn test_coded_numeric_fields() {
    let lines = parse(DictionaryKind::Kanji, ASIA);
    assert_eq!(column_texts(ASIA, &lines[0], RADICAL), vec!["7"]);
    assert_eq!(column_texts(ASIA, &lines[0], GRADE), vec!["8"]);
    assert_eq!(column_texts(ASIA, &lines[0], STROKES), vec!["7"]);
    assert_eq!(column_texts(ASIA, &lines[0], FREQUENCY), vec!["1509"]);
}

#[test]
fn test_kana_readings() {
    let lines = parse(DictionaryKind::Kanji, ASIA);
    assert_eq!(
        column_texts(ASIA, &lines[0], READINGS),
        vec!["ア", "つ.ぐ"]
    );
}

#[test]
fn test_braced_meanings_keep_spaces() {
    let lines = parse(DictionaryKind::Kanji, ASIA);
    assert_eq!(
        column_texts(ASIA, &lines[0], MEANINGS),
        vec!["Asia", "rank next"]
    );
}

#[test]
fn test_uncoded_fields_are_dropped() {
    // JIS code, codepoint, and the classical-radical C field match no column.
    let lines = parse(DictionaryKind::Kanji, ASIA);
    let total: usize = lines[0].columns.iter().map(|c| c.len()).sum();
    assert_eq!(total, 1 + 2 + 2 + 4);
}

#[test]
fn test_non_numeric_code_is_not_a_field() {
    // "Sx" has no digits; it is neither a stroke count nor a reading.
    let buffer = "火 Sx S4 ひ {fire}\n";
    let lines = parse(DictionaryKind::Kanji, buffer);
    assert_eq!(column_texts(buffer, &lines[0], STROKES), vec!["4"]);
    assert_eq!(column_texts(buffer, &lines[0], READINGS), vec!["ひ"]);
}
