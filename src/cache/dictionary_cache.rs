//! Per-dictionary cache lifecycle and the process-wide cache registry.
//!
//! Each dictionary file owns one [`DictionaryCache`] per normalization
//! setting. A cache is a directory of three checksum-tagged artifacts:
//!
//! ```text
//! <cache_root>/<name>-<flags>/
//!     normalized.bin   folded source text
//!     parsed.rkyv      token span table
//!     index.rkyv       inverted index
//! ```
//!
//! The cache moves from EMPTY to READY exactly once per source checksum.
//! [`DictionaryCache::read`] serves the in-memory snapshot when it matches,
//! falls back to loading the artifacts from disk, and reports a miss when
//! any artifact is absent, tagged with a different checksum, or fails
//! validation. [`DictionaryCache::write`] rebuilds everything from the raw
//! source and persists the artifacts before publishing the new snapshot.
//!
//! Caches are handed out by a [`CacheRegistry`], one shared handle per
//! dictionary name, so concurrent searches over the same dictionary share
//! one snapshot and one rebuild.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use rkyv::rancor::Error as RkyvError;
use rkyv::{Archive, Archived, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

use crate::cache::cache_file::{CacheFile, Checksum};
use crate::cache::indexed::Indexed;
use crate::cache::parsed::{Parsed, ParsedTable};
use crate::dictionary::DictionaryKind;
use crate::error::{JitenError, Result};
use crate::morphology::{normalize_text, MorphologyEngine, NormalizationFlags};
use crate::progress::Progress;

const NORMALIZED_FILE: &str = "normalized.bin";
const PARSED_FILE: &str = "parsed.rkyv";
const INDEX_FILE: &str = "index.rkyv";

/// An immutable READY cache state: everything a search needs.
pub struct CacheSnapshot {
    pub checksum: Checksum,
    pub kind: DictionaryKind,
    pub parsed: Parsed,
    pub indexed: Indexed,
}

enum CacheState {
    Empty,
    Ready(Arc<CacheSnapshot>),
}

/// Cache handle for one dictionary at one normalization setting.
pub struct DictionaryCache {
    name: String,
    dir: PathBuf,
    flags: NormalizationFlags,
    normalized: CacheFile,
    parsed: CacheFile,
    index: CacheFile,
    state: Mutex<CacheState>,
    /// Serializes disk loads and rebuilds; readers with a matching
    /// in-memory snapshot never touch it.
    rebuild: tokio::sync::Mutex<()>,
}

impl DictionaryCache {
    pub fn new(cache_root: &Path, name: &str, flags: NormalizationFlags) -> Self {
        let dir = cache_root.join(format!("{name}-{}", flags.suffix()));
        Self {
            name: name.to_string(),
            normalized: CacheFile::new(dir.join(NORMALIZED_FILE)),
            parsed: CacheFile::new(dir.join(PARSED_FILE)),
            index: CacheFile::new(dir.join(INDEX_FILE)),
            dir,
            flags,
            state: Mutex::new(CacheState::Empty),
            rebuild: tokio::sync::Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn flags(&self) -> NormalizationFlags {
        self.flags
    }

    fn memory_snapshot(&self, checksum: &Checksum) -> Option<Arc<CacheSnapshot>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match &*state {
            CacheState::Ready(snapshot) if snapshot.checksum == *checksum => {
                Some(Arc::clone(snapshot))
            }
            _ => None,
        }
    }

    fn publish(&self, snapshot: Arc<CacheSnapshot>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = CacheState::Ready(snapshot);
    }

    /// Returns the READY snapshot for `checksum`, loading the on-disk
    /// artifacts when needed. `Ok(None)` means a miss: the caller must
    /// rebuild through [`write`].
    ///
    /// [`write`]: DictionaryCache::write
    pub async fn read(
        self: &Arc<Self>,
        checksum: &Checksum,
    ) -> Result<Option<Arc<CacheSnapshot>>> {
        if let Some(snapshot) = self.memory_snapshot(checksum) {
            return Ok(Some(snapshot));
        }

        let _guard = self.rebuild.lock().await;
        // Another task may have finished loading while we waited.
        if let Some(snapshot) = self.memory_snapshot(checksum) {
            return Ok(Some(snapshot));
        }

        let this = Arc::clone(self);
        let expected = *checksum;
        let loaded = tokio::task::spawn_blocking(move || this.load_from_disk(&expected))
            .await
            .map_err(|e| JitenError::WorkerPanic(e.to_string()))??;

        match loaded {
            Some(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.publish(Arc::clone(&snapshot));
                tracing::debug!(
                    dictionary = %self.name,
                    checksum = %expected.short_hex(),
                    tokens = snapshot.indexed.token_count(),
                    "cache loaded from disk"
                );
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn load_from_disk(&self, expected: &Checksum) -> Result<Option<CacheSnapshot>> {
        let Some(normalized) = self.normalized.read(expected)? else {
            return Ok(None);
        };
        let Some(parsed_bytes) = self.parsed.read(expected)? else {
            return Ok(None);
        };
        let Some(index_bytes) = self.index.read(expected)? else {
            return Ok(None);
        };

        let buffer = match std::str::from_utf8(&normalized) {
            Ok(text) => Arc::<str>::from(text),
            Err(_) => {
                tracing::warn!(dictionary = %self.name, "normalized artifact is not utf-8, rebuilding");
                return Ok(None);
            }
        };

        // kind travels inside the parsed artifact.
        let archived =
            rkyv::access::<Archived<PersistedTable>, RkyvError>(&parsed_bytes)?;
        let persisted: PersistedTable = rkyv::deserialize::<_, RkyvError>(archived)?;
        let Some(kind) = DictionaryKind::parse_name(&persisted.kind) else {
            tracing::warn!(dictionary = %self.name, kind = %persisted.kind, "unknown format tag in parsed artifact, rebuilding");
            return Ok(None);
        };
        let parsed = match Parsed::from_table(buffer, persisted.table) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(dictionary = %self.name, error = %err, "parsed artifact rejected, rebuilding");
                return Ok(None);
            }
        };

        let archived = rkyv::access::<Archived<Indexed>, RkyvError>(&index_bytes)?;
        let mut indexed: Indexed = rkyv::deserialize::<_, RkyvError>(archived)?;
        indexed.rebuild_lookup();

        Ok(Some(CacheSnapshot {
            checksum: *expected,
            kind,
            parsed,
            indexed,
        }))
    }

    /// Rebuilds the cache from the raw source bytes: normalize, parse,
    /// index, persist, publish. Returns the new READY snapshot.
    ///
    /// The whole pipeline runs on a blocking worker, like the read path,
    /// so the calling task's executor stays responsive during the build.
    /// Cancellation through `progress` aborts between stages and between
    /// indexed lines; a cancelled rebuild leaves the previous on-disk
    /// artifacts untouched.
    pub async fn write(
        self: &Arc<Self>,
        checksum: &Checksum,
        raw: Vec<u8>,
        kind: DictionaryKind,
        morphology: Arc<dyn MorphologyEngine>,
        progress: Arc<Progress>,
    ) -> Result<Arc<CacheSnapshot>> {
        let _guard = self.rebuild.lock().await;
        if let Some(snapshot) = self.memory_snapshot(checksum) {
            return Ok(snapshot);
        }

        let this = Arc::clone(self);
        let expected = *checksum;
        let snapshot = tokio::task::spawn_blocking(move || {
            this.rebuild_blocking(&expected, &raw, kind, morphology.as_ref(), &progress)
        })
        .await
        .map_err(|e| JitenError::WorkerPanic(e.to_string()))??;
        let snapshot = Arc::new(snapshot);
        self.publish(Arc::clone(&snapshot));
        tracing::info!(
            dictionary = %self.name,
            kind = kind.name(),
            checksum = %checksum.short_hex(),
            lines = snapshot.parsed.line_count(),
            tokens = snapshot.indexed.token_count(),
            "cache rebuilt"
        );
        Ok(snapshot)
    }

    fn rebuild_blocking(
        &self,
        checksum: &Checksum,
        raw: &[u8],
        kind: DictionaryKind,
        morphology: &dyn MorphologyEngine,
        progress: &Progress,
    ) -> Result<CacheSnapshot> {
        progress.set_message(format!("normalizing {}", self.name));
        let text = String::from_utf8_lossy(raw);
        let normalized = normalize_text(&text, self.flags);
        if progress.is_cancelled() {
            return Err(JitenError::Cancelled);
        }

        progress.set_message(format!("parsing {}", self.name));
        let lines = kind.parse(&normalized);
        let buffer: Arc<str> = Arc::from(normalized.as_str());
        let parsed = Parsed::new(Arc::clone(&buffer), lines);
        if progress.is_cancelled() {
            return Err(JitenError::Cancelled);
        }

        progress.set_message(format!("indexing {}", self.name));
        let indexed = Indexed::build(&parsed, kind, morphology, progress)?;

        progress.set_message(format!("writing cache for {}", self.name));
        std::fs::create_dir_all(&self.dir)?;
        self.normalized.write(checksum, buffer.as_bytes())?;
        let persisted = PersistedTable {
            kind: kind.name().to_string(),
            table: parsed.to_table(),
        };
        let parsed_bytes = rkyv::to_bytes::<RkyvError>(&persisted)?;
        self.parsed.write(checksum, &parsed_bytes)?;
        let index_bytes = rkyv::to_bytes::<RkyvError>(&indexed)?;
        self.index.write(checksum, &index_bytes)?;

        Ok(CacheSnapshot {
            checksum: *checksum,
            kind,
            parsed,
            indexed,
        })
    }

    /// Deletes the on-disk artifacts and resets the state to EMPTY.
    pub fn clear(&self) -> Result<()> {
        self.normalized.remove()?;
        self.parsed.remove()?;
        self.index.remove()?;
        if self.dir.exists() {
            // Only remove the directory when nothing foreign lives in it.
            let _ = std::fs::remove_dir(&self.dir);
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = CacheState::Empty;
        Ok(())
    }

    /// Whether complete artifacts for `checksum` exist on disk.
    pub fn exists_for(&self, checksum: &Checksum) -> bool {
        [&self.normalized, &self.parsed, &self.index]
            .iter()
            .all(|f| matches!(f.stored_checksum(), Ok(Some(c)) if c == *checksum))
    }

    /// Total on-disk artifact size in bytes, when any artifact exists.
    pub fn disk_size(&self) -> Option<u64> {
        let sizes: Vec<u64> = [&self.normalized, &self.parsed, &self.index]
            .iter()
            .filter_map(|f| f.size())
            .collect();
        if sizes.is_empty() {
            None
        } else {
            Some(sizes.iter().sum())
        }
    }
}

/// Parsed-table artifact payload: the span table plus the format tag it
/// was parsed with, so a loaded cache knows its schema.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct PersistedTable {
    pub kind: String,
    pub table: ParsedTable,
}

/// Hands out one shared [`DictionaryCache`] per dictionary name.
///
/// All caches created by one registry share its root directory and
/// normalization flags.
pub struct CacheRegistry {
    root: PathBuf,
    flags: NormalizationFlags,
    caches: DashMap<String, Arc<DictionaryCache>>,
}

impl CacheRegistry {
    pub fn new<P: Into<PathBuf>>(root: P, flags: NormalizationFlags) -> Self {
        Self {
            root: root.into(),
            flags,
            caches: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn flags(&self) -> NormalizationFlags {
        self.flags
    }

    /// The shared cache handle for `name`, created on first use.
    pub fn get_or_create(&self, name: &str) -> Arc<DictionaryCache> {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(DictionaryCache::new(&self.root, name, self.flags)))
            .clone()
    }

    /// All cache handles created so far.
    pub fn all(&self) -> Vec<Arc<DictionaryCache>> {
        self.caches.iter().map(|e| Arc::clone(e.value())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::BasicMorphology;

    fn registry(dir: &Path) -> CacheRegistry {
        CacheRegistry::new(dir, NormalizationFlags::default())
    }

    #[tokio::test]
    async fn write_then_read_round_trips_without_reparsing() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(tmp.path());
        let cache = registry.get_or_create("edict-test");
        let source = b"cat\tneko\nfeline\tneko\n";
        let checksum = Checksum::of(source);
        let morph = BasicMorphology::default();

        let built = cache
            .write(
                &checksum,
                source.to_vec(),
                DictionaryKind::Edict,
                Arc::new(morph),
                Arc::new(Progress::default()),
            )
            .await
            .unwrap();
        assert_eq!(built.parsed.line_count(), 2);

        // A fresh handle has no in-memory snapshot and must load from disk.
        let fresh = Arc::new(DictionaryCache::new(
            tmp.path(),
            "edict-test",
            NormalizationFlags::default(),
        ));
        let loaded = fresh.read(&checksum).await.unwrap().unwrap();
        assert_eq!(loaded.kind, DictionaryKind::Edict);
        assert_eq!(loaded.parsed.line_count(), 2);
        assert_eq!(
            loaded.indexed.candidate_lines(["neko"], None),
            built.indexed.candidate_lines(["neko"], None)
        );
    }

    #[tokio::test]
    async fn checksum_mismatch_is_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(tmp.path());
        let cache = registry.get_or_create("edict-test");
        let source = b"cat\tneko\n";
        let checksum = Checksum::of(source);
        cache
            .write(
                &checksum,
                source.to_vec(),
                DictionaryKind::Edict,
                Arc::new(BasicMorphology::default()),
                Arc::new(Progress::default()),
            )
            .await
            .unwrap();

        let fresh = Arc::new(DictionaryCache::new(
            tmp.path(),
            "edict-test",
            NormalizationFlags::default(),
        ));
        let other = Checksum::of(b"different contents");
        assert!(fresh.read(&other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_cache_reads_as_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(tmp.path());
        let cache = registry.get_or_create("nothing");
        assert!(cache.read(&Checksum::of(b"x")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_resets_to_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(tmp.path());
        let cache = registry.get_or_create("edict-test");
        let source = b"cat\tneko\n";
        let checksum = Checksum::of(source);
        cache
            .write(
                &checksum,
                source.to_vec(),
                DictionaryKind::Edict,
                Arc::new(BasicMorphology::default()),
                Arc::new(Progress::default()),
            )
            .await
            .unwrap();
        assert!(cache.exists_for(&checksum));

        cache.clear().unwrap();
        assert!(!cache.exists_for(&checksum));
        assert!(cache.read(&checksum).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn normalization_flags_separate_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let folded = registry(tmp.path()).get_or_create("dict");
        let plain = CacheRegistry::new(tmp.path(), NormalizationFlags::NONE).get_or_create("dict");
        assert_ne!(folded.dir(), plain.dir());
    }

    #[tokio::test]
    async fn rebuild_runs_off_the_executor_thread() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let tmp = tempfile::tempdir().unwrap();
        let cache = registry(tmp.path()).get_or_create("big-edict");
        let source: Vec<u8> = (0..50_000)
            .map(|i| format!("word{i} [よみ{i}] /(n) sense number {i}/\n"))
            .collect::<String>()
            .into_bytes();
        let checksum = Checksum::of(&source);

        // On this current-thread runtime the ticker can only advance while
        // the rebuild yields the executor to it.
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let ticker = tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        cache
            .write(
                &checksum,
                source,
                DictionaryKind::Edict,
                Arc::new(BasicMorphology::default()),
                Arc::new(Progress::default()),
            )
            .await
            .unwrap();
        ticker.abort();

        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn registry_shares_handles_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(tmp.path());
        let a = registry.get_or_create("same");
        let b = registry.get_or_create("same");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.all().len(), 1);
    }
}
