use super::*;

const WORD: usize = 0;
const READING: usize = 1;
const DEFINITION: usize = 2;
const TAGS: usize = 3;

#[test]
fn test_standard_entry() {
    let buffer = "食べる [たべる] /(v1) to eat/to live on/\n";
    let lines = parse(DictionaryKind::Edict, buffer);
    assert_eq!(lines.len(), 1);
    assert_eq!(column_texts(buffer, &lines[0], WORD), vec!["食べる"]);
    assert_eq!(column_texts(buffer, &lines[0], READING), vec!["たべる"]);
    assert_eq!(
        column_texts(buffer, &lines[0], DEFINITION),
        vec!["to eat", "to live on"]
    );
    assert_eq!(column_texts(buffer, &lines[0], TAGS), vec!["v1"]);
}

#[test]
fn test_multiple_leading_tags() {
    let buffer = "走る [はしる] /(v5r)(vi) to run/\n";
    let lines = parse(DictionaryKind::Edict, buffer);
    assert_eq!(column_texts(buffer, &lines[0], TAGS), vec!["v5r", "vi"]);
    assert_eq!(column_texts(buffer, &lines[0], DEFINITION), vec!["to run"]);
}

#[test]
fn test_missing_reading_bracket() {
    // Kana headwords are written without a reading bracket.
    let buffer = "ねこ /(n) cat/\n";
    let lines = parse(DictionaryKind::Edict, buffer);
    assert_eq!(column_texts(buffer, &lines[0], WORD), vec!["ねこ"]);
    assert!(lines[0].column(READING).is_empty());
    assert_eq!(column_texts(buffer, &lines[0], DEFINITION), vec!["cat"]);
}

#[test]
fn test_tab_separated_fallback_reading() {
    // Word lists without slashes still populate word and reading.
    let buffer = "cat\tneko\nfeline\tneko\n";
    let lines = parse(DictionaryKind::Edict, buffer);
    assert_eq!(lines.len(), 2);
    assert_eq!(column_texts(buffer, &lines[0], WORD), vec!["cat"]);
    assert_eq!(column_texts(buffer, &lines[0], READING), vec!["neko"]);
    assert_eq!(column_texts(buffer, &lines[1], WORD), vec!["feline"]);
    assert_eq!(column_texts(buffer, &lines[1], READING), vec!["neko"]);
}

#[test]
fn test_malformed_line_degrades() {
    let buffer = "///\n";
    let lines = parse(DictionaryKind::Edict, buffer);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].column(DEFINITION).is_empty());
}

#[test]
fn test_blank_lines_keep_positions() {
    let buffer = "a /(n) first/\n\nb /(n) second/\n";
    let lines = parse(DictionaryKind::Edict, buffer);
    assert_eq!(lines.len(), 3);
    assert!(lines[1].columns.iter().all(|c| c.is_empty()));
    assert_eq!(column_texts(buffer, &lines[2], WORD), vec!["b"]);
}

#[test]
fn test_spans_point_into_buffer() {
    let buffer = "単語 [たんご] /(n) word/vocabulary/\n";
    let lines = parse(DictionaryKind::Edict, buffer);
    for column in &lines[0].columns {
        for span in column {
            let end = (span.start + span.len) as usize;
            assert!(end <= buffer.len());
            assert!(buffer.is_char_boundary(span.start as usize));
            assert!(buffer.is_char_boundary(end));
        }
    }
}
