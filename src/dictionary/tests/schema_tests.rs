use super::*;
use std::path::Path;

#[test]
fn test_kind_names_round_trip() {
    for kind in [
        DictionaryKind::Edict,
        DictionaryKind::Kanji,
        DictionaryKind::Radicals,
        DictionaryKind::Examples,
        DictionaryKind::Unknown,
    ] {
        assert_eq!(DictionaryKind::parse_name(kind.name()), Some(kind));
    }
    assert_eq!(DictionaryKind::parse_name("kanjidic"), Some(DictionaryKind::Kanji));
    assert_eq!(DictionaryKind::parse_name("bogus"), None);
}

#[test]
fn test_guess_from_path() {
    assert_eq!(
        DictionaryKind::guess_from_path(Path::new("/data/edict2")),
        DictionaryKind::Edict
    );
    assert_eq!(
        DictionaryKind::guess_from_path(Path::new("kanjidic.utf8")),
        DictionaryKind::Kanji
    );
    assert_eq!(
        DictionaryKind::guess_from_path(Path::new("radkfile")),
        DictionaryKind::Radicals
    );
    assert_eq!(
        DictionaryKind::guess_from_path(Path::new("examples.utf")),
        DictionaryKind::Examples
    );
    assert_eq!(
        DictionaryKind::guess_from_path(Path::new("wordlist.txt")),
        DictionaryKind::Unknown
    );
}

#[test]
fn test_column_id_lookup() {
    let kind = DictionaryKind::Edict;
    assert_eq!(kind.column_id("word"), Some(0));
    assert_eq!(kind.column_id("tags"), Some(3));
    assert_eq!(kind.column_id("nope"), None);
}

#[test]
fn test_parse_produces_one_line_per_source_line() {
    let buffer = "a /(n) x/\n\nb /(n) y/\n";
    for kind in [
        DictionaryKind::Edict,
        DictionaryKind::Kanji,
        DictionaryKind::Radicals,
        DictionaryKind::Examples,
        DictionaryKind::Unknown,
    ] {
        let lines = kind.parse(buffer);
        assert_eq!(lines.len(), 3, "kind {}", kind.name());
        for line in &lines {
            assert_eq!(line.columns.len(), kind.schema().len());
        }
    }
}

#[test]
fn test_indexed_and_searched_policies() {
    assert!(ColumnHandling::IndexAndSearch.is_indexed());
    assert!(ColumnHandling::FilterOnly.is_indexed());
    assert!(!ColumnHandling::SearchOnly.is_indexed());
    assert!(!ColumnHandling::Unused.is_indexed());

    assert!(ColumnHandling::SearchOnly.is_searched(false));
    assert!(!ColumnHandling::FilterOnly.is_searched(false));
    assert!(ColumnHandling::FilterOnly.is_searched(true));
    assert!(!ColumnHandling::Unused.is_searched(true));
}
