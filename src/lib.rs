//! Jiten - Japanese Dictionary Indexing and Search
//!
//! A library for turning flat-file Japanese dictionaries (EDICT word
//! lists, KANJIDIC kanji records, radical decompositions, example-sentence
//! corpora) into checksum-gated on-disk caches and searching them with
//! boolean queries over an inverted index.
//!
//! # Overview
//!
//! This library provides:
//! - **Format-aware parsing**: per-format column schemas with total,
//!   degrade-and-continue line parsers
//! - **Checksum-gated caches**: normalized text, parsed span table, and
//!   inverted index persisted per dictionary, invalidated only by source
//!   content changes
//! - **Insensitive matching**: case folding and katakana-to-hiragana
//!   folding through a pluggable morphology engine
//! - **Boolean queries**: AND/OR trees with parentheses and per-column
//!   restriction, index-prefiltered and regex-verified
//! - **Responsive searches**: worker-thread scans with cooperative
//!   cancellation, rate-limited progress, and live partial results
//!
//! # Quick Start
//!
//! ```no_run
//! use jiten::{build_cache, search, EngineConfig, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> jiten::Result<()> {
//!     let config = EngineConfig::default();
//!
//!     // Build (or refresh) the cache for a dictionary file
//!     let info = build_cache("edict2".as_ref(), None, &config).await?;
//!     println!("{} lines, {} index tokens", info.lines, info.index_tokens);
//!
//!     // Search it
//!     let hits = search(
//!         "edict2".as_ref(),
//!         "word:食べる OR definition:eat",
//!         None,
//!         SearchOptions::default(),
//!         &config,
//!     )
//!     .await?;
//!     for hit in hits {
//!         println!("{}: {}", hit.line, hit.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod morphology;
pub mod progress;
pub mod search;
#[cfg(test)]
pub mod unit_tests;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

pub use crate::cache::{CacheRegistry, CacheSnapshot, Checksum, DictionaryCache};
pub use crate::config::{EngineConfig, Preferences};
pub use crate::dictionary::{ColumnHandling, Dictionary, DictionaryKind};
pub use crate::error::{JitenError, Result};
pub use crate::morphology::{
    BasicMorphology, MorphToken, MorphologyEngine, NormalizationFlags,
};
pub use crate::progress::{CancelToken, Progress};
pub use crate::search::{
    LineRef, Query, QueryNode, Results, Search, SearchIterator, SearchOptions, SearchStatus,
};

/// Metadata about one dictionary's cache.
#[derive(Debug, Clone)]
pub struct CacheInfo {
    pub name: String,
    pub kind: DictionaryKind,
    /// Checksum of the dictionary source, abbreviated hex.
    pub checksum: String,
    pub lines: usize,
    pub tokens: usize,
    pub index_tokens: usize,
    /// Total artifact size on disk, when the artifacts exist.
    pub disk_size: Option<u64>,
    pub cache_dir: std::path::PathBuf,
}

fn resolve_kind(path: &Path, kind: Option<DictionaryKind>) -> DictionaryKind {
    kind.unwrap_or_else(|| DictionaryKind::guess_from_path(path))
}

async fn open_with_config(
    path: &Path,
    kind: Option<DictionaryKind>,
    config: &EngineConfig,
) -> Result<(Arc<Dictionary>, Arc<dyn MorphologyEngine>)> {
    let registry = CacheRegistry::new(&config.cache_dir, config.normalization);
    let kind = resolve_kind(path, kind);
    let dictionary = Arc::new(Dictionary::open(path, kind, &registry).await?);
    let morphology: Arc<dyn MorphologyEngine> =
        Arc::new(BasicMorphology::new(config.normalization));
    Ok((dictionary, morphology))
}

fn snapshot_info(dictionary: &Dictionary, snapshot: &CacheSnapshot) -> CacheInfo {
    CacheInfo {
        name: dictionary.name().to_string(),
        kind: snapshot.kind,
        checksum: dictionary.checksum().short_hex(),
        lines: snapshot.parsed.line_count(),
        tokens: snapshot.parsed.token_count(),
        index_tokens: snapshot.indexed.token_count(),
        disk_size: dictionary.cache().disk_size(),
        cache_dir: dictionary.cache().dir().to_path_buf(),
    }
}

/// Build (or refresh) the cache for one dictionary file and report on it.
///
/// A warm, matching cache is loaded rather than rebuilt; the returned
/// [`CacheInfo`] describes whichever snapshot ended up READY.
pub async fn build_cache(
    path: &Path,
    kind: Option<DictionaryKind>,
    config: &EngineConfig,
) -> Result<CacheInfo> {
    let (dictionary, morphology) = open_with_config(path, kind, config).await?;
    let progress = Arc::new(Progress::new());
    let snapshot = dictionary.ensure_cache(&morphology, &progress).await?;
    Ok(snapshot_info(&dictionary, &snapshot))
}

/// One row of a completed convenience search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Zero-based source line number.
    pub line: u32,
    /// The raw source line, for display.
    pub text: String,
}

/// Run a query against one dictionary file to completion.
///
/// Covers the common one-shot case; construct a [`Search`] directly for
/// cancellation, progress observation, or live iteration over partial
/// results.
pub async fn search(
    path: &Path,
    query: &str,
    kind: Option<DictionaryKind>,
    options: SearchOptions,
    config: &EngineConfig,
) -> Result<Vec<SearchHit>> {
    let (dictionary, morphology) = open_with_config(path, kind, config).await?;
    let search = Search::new(Arc::clone(&dictionary), query, morphology, options);
    let status = search.run().await?;
    if status == SearchStatus::Errored {
        if let Some(error) = search.take_error() {
            return Err(error);
        }
    }

    // Display text comes from the original source so folding never leaks
    // into what the user sees.
    let raw = tokio::fs::read_to_string(dictionary.contents_path()).await?;
    let source_lines: Vec<&str> = raw
        .split_inclusive('\n')
        .map(|l| l.trim_end_matches(['\n', '\r']))
        .collect();

    let mut hits = Vec::new();
    let mut iter = search.iter();
    while let Some(row) = iter.next() {
        let text = source_lines
            .get(row.line as usize)
            .copied()
            .unwrap_or_default()
            .to_string();
        hits.push(SearchHit {
            line: row.line,
            text,
        });
    }
    Ok(hits)
}

/// Whether complete cache artifacts exist for the file's current contents.
pub async fn cache_exists(
    path: &Path,
    kind: Option<DictionaryKind>,
    config: &EngineConfig,
) -> Result<bool> {
    let (dictionary, _) = open_with_config(path, kind, config).await?;
    Ok(dictionary.cache().exists_for(dictionary.checksum()))
}

/// Fully load and validate the on-disk cache for a dictionary file.
///
/// `Ok(true)` means every artifact loaded and passed span validation;
/// `Ok(false)` is any flavor of miss (absent, checksum mismatch, corrupt).
pub async fn validate_cache(
    path: &Path,
    kind: Option<DictionaryKind>,
    config: &EngineConfig,
) -> Result<bool> {
    let (dictionary, _) = open_with_config(path, kind, config).await?;
    Ok(dictionary
        .cache()
        .read(dictionary.checksum())
        .await?
        .is_some())
}

/// Cache metadata without forcing a build.
///
/// Returns `Ok(None)` when no READY cache exists for the file's current
/// contents.
pub async fn cache_info(
    path: &Path,
    kind: Option<DictionaryKind>,
    config: &EngineConfig,
) -> Result<Option<CacheInfo>> {
    let (dictionary, _) = open_with_config(path, kind, config).await?;
    let Some(snapshot) = dictionary.cache().read(dictionary.checksum()).await? else {
        return Ok(None);
    };
    Ok(Some(snapshot_info(&dictionary, &snapshot)))
}
