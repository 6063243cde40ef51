//! Dictionary formats, column schemas, and the `Dictionary` handle.
//!
//! Each supported source format is one variant of the closed
//! [`DictionaryKind`] enum. A kind fixes two things: an ordered column
//! schema (names plus a [`ColumnHandling`] policy per column) and a
//! deterministic, total line parser that fills those columns with token
//! spans. Malformed lines degrade to whatever columns could be populated;
//! they never abort a parse.
//!
//! A [`Dictionary`] ties one source file to its kind and to the
//! [`DictionaryCache`](crate::cache::DictionaryCache) holding the parsed
//! and indexed snapshot for that file's current checksum.

mod edict;
mod examples_fmt;
mod kanjidic;
mod radicals;
mod unknown;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::cache_file::Checksum;
use crate::cache::dictionary_cache::{CacheRegistry, CacheSnapshot, DictionaryCache};
use crate::cache::parsed::ParsedLine;
use crate::error::Result;
use crate::morphology::MorphologyEngine;
use crate::progress::Progress;

/// How a column participates in searching and indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnHandling {
    /// Stored in the schema for completeness but never populated or matched.
    Unused,
    /// Matched during scans but not added to the inverted index; a query
    /// constrained to such a column always takes the full-scan path.
    SearchOnly,
    /// Indexed and matched; the normal case.
    IndexAndSearch,
    /// Indexed, but only matched when a search opts in to filter columns.
    FilterOnly,
}

impl ColumnHandling {
    /// Whether tokens of this column enter the inverted index.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::IndexAndSearch | Self::FilterOnly)
    }

    /// Whether this column participates in match evaluation.
    pub fn is_searched(&self, include_filter_columns: bool) -> bool {
        match self {
            Self::Unused => false,
            Self::SearchOnly | Self::IndexAndSearch => true,
            Self::FilterOnly => include_filter_columns,
        }
    }
}

/// One named column of a dictionary schema.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub handling: ColumnHandling,
}

const fn col(name: &'static str, handling: ColumnHandling) -> ColumnDef {
    ColumnDef { name, handling }
}

use ColumnHandling::{FilterOnly, IndexAndSearch, SearchOnly, Unused};

static EDICT_SCHEMA: &[ColumnDef] = &[
    col("word", IndexAndSearch),
    col("reading", IndexAndSearch),
    col("definition", IndexAndSearch),
    col("tags", FilterOnly),
];

static KANJI_SCHEMA: &[ColumnDef] = &[
    col("kanji", IndexAndSearch),
    col("readings", IndexAndSearch),
    col("meanings", IndexAndSearch),
    col("strokes", FilterOnly),
    col("radical", FilterOnly),
    col("grade", FilterOnly),
    col("frequency", FilterOnly),
    col("references", Unused),
];

static RADICALS_SCHEMA: &[ColumnDef] = &[
    col("kanji", IndexAndSearch),
    col("radicals", IndexAndSearch),
];

static EXAMPLES_SCHEMA: &[ColumnDef] = &[
    col("sentence", IndexAndSearch),
    col("translation", IndexAndSearch),
    col("breakdown", SearchOnly),
];

static UNKNOWN_SCHEMA: &[ColumnDef] = &[col("text", IndexAndSearch)];

/// The closed set of supported dictionary formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DictionaryKind {
    /// EDICT-style word dictionary: `WORD [READING] /sense/sense/.../`.
    Edict,
    /// KANJIDIC-style kanji dictionary: fixed leading kanji plus coded fields.
    Kanji,
    /// Radical decomposition dictionary: `KANJI : RAD RAD ...`.
    Radicals,
    /// Example-sentence corpus with paired `A:`/`B:` lines.
    Examples,
    /// Fallback: each line is one searchable text column.
    Unknown,
}

impl DictionaryKind {
    /// Stable lowercase name, used in logs and the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Edict => "edict",
            Self::Kanji => "kanji",
            Self::Radicals => "radicals",
            Self::Examples => "examples",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a kind name as accepted by the CLI's `--kind` flag.
    pub fn parse_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "edict" => Some(Self::Edict),
            "kanji" | "kanjidic" => Some(Self::Kanji),
            "radicals" => Some(Self::Radicals),
            "examples" => Some(Self::Examples),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Guesses the format from a dictionary filename.
    ///
    /// Recognizes the conventional distribution names (`edict`, `kanjidic`,
    /// `radkfile`, `examples`); anything else falls back to
    /// [`DictionaryKind::Unknown`].
    pub fn guess_from_path(path: &Path) -> Self {
        let basename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if basename.contains("kanjidic") || basename.contains("kanjd") {
            Self::Kanji
        } else if basename.contains("radk") || basename.contains("radical") {
            Self::Radicals
        } else if basename.contains("example") || basename.contains("tanaka") {
            Self::Examples
        } else if basename.contains("edict") {
            Self::Edict
        } else {
            Self::Unknown
        }
    }

    /// The ordered column schema of this format.
    pub fn schema(&self) -> &'static [ColumnDef] {
        match self {
            Self::Edict => EDICT_SCHEMA,
            Self::Kanji => KANJI_SCHEMA,
            Self::Radicals => RADICALS_SCHEMA,
            Self::Examples => EXAMPLES_SCHEMA,
            Self::Unknown => UNKNOWN_SCHEMA,
        }
    }

    /// Resolves a schema column name to its id.
    pub fn column_id(&self, name: &str) -> Option<usize> {
        self.schema().iter().position(|c| c.name == name)
    }

    /// Parses a whole normalized buffer into per-line column spans.
    ///
    /// One `ParsedLine` is produced per source line, including blank lines
    /// (which parse to all-empty columns), so line ids map one-to-one onto
    /// the source text.
    pub fn parse(&self, buffer: &str) -> Vec<ParsedLine> {
        let column_count = self.schema().len();
        let mut lines = Vec::new();
        let mut offset = 0usize;

        for segment in buffer.split_inclusive('\n') {
            let line = segment.trim_end_matches(['\n', '\r']);
            let base = offset as u32;
            let parsed = if line.is_empty() {
                ParsedLine::with_columns(column_count)
            } else {
                match self {
                    Self::Edict => edict::parse_line(line, base),
                    Self::Kanji => kanjidic::parse_line(line, base),
                    Self::Radicals => radicals::parse_line(line, base),
                    Self::Examples => examples_fmt::parse_line(line, base),
                    Self::Unknown => unknown::parse_line(line, base),
                }
            };
            debug_assert_eq!(parsed.columns.len(), column_count);
            lines.push(parsed);
            offset += segment.len();
        }
        lines
    }
}

/// One dictionary source file bound to its format and cache.
pub struct Dictionary {
    kind: DictionaryKind,
    name: String,
    contents_path: PathBuf,
    checksum: Checksum,
    cache: Arc<DictionaryCache>,
}

impl Dictionary {
    /// Opens a dictionary file: computes its content checksum and attaches
    /// the shared [`DictionaryCache`] for (name, normalization flags).
    ///
    /// The file is read once here to hash it; its contents are re-read only
    /// when a cache rebuild is needed.
    pub async fn open(
        path: &Path,
        kind: DictionaryKind,
        registry: &CacheRegistry,
    ) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let checksum = Checksum::of(&bytes);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dictionary")
            .to_string();
        let cache = registry.get_or_create(&name);
        tracing::debug!(
            dictionary = %name,
            kind = kind.name(),
            checksum = %checksum.short_hex(),
            "opened dictionary"
        );
        Ok(Self {
            kind,
            name,
            contents_path: path.to_path_buf(),
            checksum,
            cache,
        })
    }

    pub fn kind(&self) -> DictionaryKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents_path(&self) -> &Path {
        &self.contents_path
    }

    /// Checksum of the source content as of [`Dictionary::open`].
    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn cache(&self) -> &Arc<DictionaryCache> {
        &self.cache
    }

    /// Returns the READY snapshot for this dictionary, building it when the
    /// on-disk cache is missing or stale.
    ///
    /// The index build is on the critical path of first use only; later
    /// calls for the same checksum load the persisted artifacts without
    /// reparsing.
    pub async fn ensure_cache(
        &self,
        morphology: &Arc<dyn MorphologyEngine>,
        progress: &Arc<Progress>,
    ) -> Result<Arc<CacheSnapshot>> {
        if let Some(snapshot) = self.cache.read(&self.checksum).await? {
            return Ok(snapshot);
        }
        let raw = tokio::fs::read(&self.contents_path).await?;
        self.cache
            .write(
                &self.checksum,
                raw,
                self.kind,
                Arc::clone(morphology),
                Arc::clone(progress),
            )
            .await
    }
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
