//! Morphological analysis collaborator contract.
//!
//! The engine never implements linguistic stemming or spellchecking itself.
//! It consumes a [`MorphologyEngine`], which turns a piece of text into a
//! sequence of [`MorphToken`]s carrying the raw word, an optional stemmed
//! form, a normalization-insensitive variant, and an optional spelling
//! suggestion. Indexing and query compilation only ever match against the
//! insensitive and stemmed variants.
//!
//! [`BasicMorphology`] is the built-in engine: NFKC normalization, optional
//! case folding, optional katakana-to-hiragana folding, and a trivial
//! plural-stripping stemmer. Applications with a real analyzer plug it in
//! through the trait.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Which insensitivity folds are applied when text is normalized.
///
/// Each distinct flag combination produces its own cache artifact set, so
/// the flags participate in cache directory naming via [`suffix`].
///
/// [`suffix`]: NormalizationFlags::suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizationFlags {
    /// Fold ASCII and Unicode uppercase to lowercase.
    pub case_fold: bool,
    /// Fold katakana to hiragana so readings match either script.
    pub kana_fold: bool,
}

impl Default for NormalizationFlags {
    fn default() -> Self {
        Self {
            case_fold: true,
            kana_fold: true,
        }
    }
}

impl NormalizationFlags {
    /// No folding at all; NFKC normalization still applies.
    pub const NONE: Self = Self {
        case_fold: false,
        kana_fold: false,
    };

    /// Stable directory-name suffix identifying this flag combination.
    pub fn suffix(&self) -> &'static str {
        match (self.case_fold, self.kana_fold) {
            (true, true) => "ck",
            (true, false) => "c",
            (false, true) => "k",
            (false, false) => "plain",
        }
    }
}

/// One analyzed word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphToken {
    /// The word as it appeared in the input.
    pub raw: String,
    /// Dictionary base form, when the analyzer could derive one.
    pub stemmed: Option<String>,
    /// Case- and kana-folded variant used for index lookups.
    pub insensitive: String,
    /// Spelling suggestion, when the analyzer offers one.
    pub suggestion: Option<String>,
}

impl MorphToken {
    /// All match-eligible variants of this token, insensitive form first.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.insensitive.as_str()).chain(self.stemmed.as_deref())
    }
}

/// Tokenizes and stems text for indexing and query matching.
pub trait MorphologyEngine: Send + Sync {
    /// Splits `text` into analyzed words.
    ///
    /// Implementations must be deterministic: the same input always yields
    /// the same token sequence, since index contents and query compilation
    /// both depend on it.
    fn analyze(&self, text: &str) -> Vec<MorphToken>;
}

/// Characters that separate words inside a dictionary column.
///
/// Covers the punctuation that appears inside EDICT sense strings and
/// kanji-dictionary meaning fields in addition to whitespace.
const WORD_SEPARATORS: &[char] = &[
    '/', ',', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'', '!', '?', '.', '~', '・', '、',
    '。', '「', '」',
];

fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || WORD_SEPARATORS.contains(&c)
}

/// Regex character class equivalent to [`is_word_separator`].
///
/// Query leaves anchor on this class instead of `\b` so that match
/// granularity is exactly the tokenization granularity; the inverted index
/// built from the same tokenizer then never misses a scan match.
pub(crate) const SEPARATOR_CLASS: &str = r#"[\s/,;:()\[\]{}"'!?.~・、。「」]"#;

/// Folds one character of katakana to its hiragana counterpart.
///
/// The fold covers the contiguous U+30A1..=U+30F6 block; prolonged sound
/// marks and half-width forms are left alone (NFKC has already widened the
/// latter).
fn kata_to_hira(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

/// Applies NFKC plus the requested folds to a whole string.
///
/// Line structure is preserved: the fold is per-character and never inserts
/// or removes newlines, so line numbers in folded text map one-to-one onto
/// the original source.
pub fn normalize_text(text: &str, flags: NormalizationFlags) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfkc() {
        let c = if flags.kana_fold { kata_to_hira(c) } else { c };
        if flags.case_fold {
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Built-in morphology engine.
///
/// Splitting is separator based, folding follows the configured
/// [`NormalizationFlags`], and stemming is limited to stripping a plural
/// `s` from longer Latin-script words. It exists so the engine is usable
/// standalone; a real analyzer should replace it wherever linguistic
/// quality matters.
#[derive(Debug, Clone, Default)]
pub struct BasicMorphology {
    flags: NormalizationFlags,
}

impl BasicMorphology {
    pub fn new(flags: NormalizationFlags) -> Self {
        Self { flags }
    }

    fn stem(word: &str) -> Option<String> {
        // "cats" -> "cat", but leave "is", "was", "glass" alone.
        if word.len() > 3
            && word.ends_with('s')
            && !word.ends_with("ss")
            && word.chars().all(|c| c.is_ascii_alphabetic())
        {
            Some(word[..word.len() - 1].to_string())
        } else {
            None
        }
    }
}

impl MorphologyEngine for BasicMorphology {
    fn analyze(&self, text: &str) -> Vec<MorphToken> {
        text.split(is_word_separator)
            .filter(|word| !word.is_empty())
            .map(|word| {
                let insensitive = normalize_text(word, self.flags);
                let stemmed = Self::stem(&insensitive).filter(|s| *s != insensitive);
                MorphToken {
                    raw: word.to_string(),
                    stemmed,
                    insensitive,
                    suggestion: None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_kana() {
        let flags = NormalizationFlags::default();
        assert_eq!(normalize_text("NeKo", flags), "neko");
        assert_eq!(normalize_text("ネコ", flags), "ねこ");
        // NFKC widens half-width katakana before the kana fold.
        assert_eq!(normalize_text("ﾈｺ", flags), "ねこ");
    }

    #[test]
    fn normalize_respects_flags() {
        assert_eq!(normalize_text("NeKo", NormalizationFlags::NONE), "NeKo");
        let case_only = NormalizationFlags {
            case_fold: true,
            kana_fold: false,
        };
        assert_eq!(normalize_text("ネコ", case_only), "ネコ");
    }

    #[test]
    fn normalize_preserves_line_count() {
        let text = "CAT\tネコ\nDOG\tイヌ\n";
        let folded = normalize_text(text, NormalizationFlags::default());
        assert_eq!(
            text.lines().count(),
            folded.lines().count(),
        );
    }

    #[test]
    fn analyze_splits_sense_strings() {
        let morph = BasicMorphology::default();
        let tokens = morph.analyze("cat (animal)/feline");
        let raw: Vec<&str> = tokens.iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(raw, vec!["cat", "animal", "feline"]);
    }

    #[test]
    fn analyze_stems_simple_plurals() {
        let morph = BasicMorphology::default();
        let tokens = morph.analyze("cats glass");
        assert_eq!(tokens[0].stemmed.as_deref(), Some("cat"));
        assert_eq!(tokens[1].stemmed, None);
    }

    #[test]
    fn separator_class_covers_separator_set() {
        let class = regex::Regex::new(SEPARATOR_CLASS).unwrap();
        for &c in WORD_SEPARATORS {
            assert!(class.is_match(&c.to_string()), "missing {c:?}");
        }
        assert!(class.is_match(" "));
        assert!(class.is_match("\t"));
        assert!(!class.is_match("a"));
        assert!(!class.is_match("ね"));
    }

    #[test]
    fn flag_suffixes_are_distinct() {
        use std::collections::HashSet;
        let all = [
            NormalizationFlags::default(),
            NormalizationFlags::NONE,
            NormalizationFlags { case_fold: true, kana_fold: false },
            NormalizationFlags { case_fold: false, kana_fold: true },
        ];
        let suffixes: HashSet<_> = all.iter().map(|f| f.suffix()).collect();
        assert_eq!(suffixes.len(), all.len());
    }
}
