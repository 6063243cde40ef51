//! Single on-disk cache artifact with checksum validation.
//!
//! A [`CacheFile`] wraps one file holding a header plus an opaque body. The
//! header carries a magic string, the format version, and the SHA-256
//! checksum of the *original dictionary source* the body was derived from.
//! Reading validates the header before returning a single fully-loaded body;
//! a missing file, a foreign format, a version bump, or a checksum mismatch
//! are all reported as a cache miss, never as partial data.
//!
//! Writes go through a temporary file in the same directory followed by an
//! atomic rename, so readers never observe a half-written artifact.
//!
//! # Layout
//!
//! ```text
//! offset 0   magic: b"jiten cache 1\n" + 2 padding bytes
//! offset 16  sha256 of the original dictionary source (32 bytes)
//! offset 48  body (16-byte aligned for zero-copy rkyv access)
//! ```

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use rkyv::util::AlignedVec;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Magic bytes identifying a jiten cache artifact.
///
/// The version digit is part of the magic; incompatible layout changes bump
/// it, which makes every older artifact an automatic cache miss.
pub const CACHE_MAGIC: &[u8] = b"jiten cache 1\n";

const MAGIC_LEN: usize = CACHE_MAGIC.len();
const ALIGNMENT: usize = 16;
const MAGIC_PADDING: usize = (ALIGNMENT - (MAGIC_LEN % ALIGNMENT)) % ALIGNMENT;
const CHECKSUM_LEN: usize = 32;
// Header is 48 bytes, keeping the body 16-byte aligned.
const BODY_START: usize = MAGIC_LEN + MAGIC_PADDING + CHECKSUM_LEN;

/// SHA-256 digest of dictionary source content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum(pub [u8; CHECKSUM_LEN]);

impl Checksum {
    /// Hashes a byte buffer.
    pub fn of(contents: &[u8]) -> Self {
        let digest = Sha256::digest(contents);
        Self(digest.into())
    }

    /// Short hex prefix for log messages.
    pub fn short_hex(&self) -> String {
        self.0[..6].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({self})")
    }
}

/// Handle to one checksum-gated artifact on disk.
///
/// The handle itself holds no body; callers share loaded bodies behind
/// `Arc`s and may hold any number of `CacheFile` handles for the same path.
#[derive(Debug, Clone)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically persists `body` tagged with `checksum`.
    ///
    /// The parent directory is created as needed. On any error the previous
    /// artifact, if one existed, is left untouched.
    pub fn write(&self, checksum: &Checksum, body: &[u8]) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(CACHE_MAGIC)?;
        tmp.write_all(&[0u8; MAGIC_PADDING])?;
        tmp.write_all(&checksum.0)?;
        tmp.write_all(body)?;
        tmp.flush()?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    /// Loads the body if the artifact exists and matches `expected`.
    ///
    /// Returns `Ok(None)` on a cache miss: file absent, too short, foreign
    /// magic, or checksum mismatch. Only genuine I/O failures propagate as
    /// errors. The body is returned in a 16-byte aligned buffer suitable
    /// for zero-copy rkyv access.
    pub fn read(&self, expected: &Checksum) -> Result<Option<AlignedVec<ALIGNMENT>>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if bytes.len() < BODY_START || &bytes[..MAGIC_LEN] != CACHE_MAGIC {
            tracing::debug!(path = %self.path.display(), "cache artifact has foreign or truncated header");
            return Ok(None);
        }

        let stored = &bytes[MAGIC_LEN + MAGIC_PADDING..BODY_START];
        if stored != expected.0 {
            tracing::debug!(
                path = %self.path.display(),
                expected = %expected.short_hex(),
                "cache artifact checksum mismatch, treating as miss"
            );
            return Ok(None);
        }

        let mut body = AlignedVec::<ALIGNMENT>::with_capacity(bytes.len() - BODY_START);
        body.extend_from_slice(&bytes[BODY_START..]);
        Ok(Some(body))
    }

    /// The checksum recorded in the artifact header, if the artifact exists
    /// and carries a valid header. Used by cache validation tooling.
    pub fn stored_checksum(&self) -> Result<Option<Checksum>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.len() < BODY_START || &bytes[..MAGIC_LEN] != CACHE_MAGIC {
            return Ok(None);
        }
        let mut digest = [0u8; CHECKSUM_LEN];
        digest.copy_from_slice(&bytes[MAGIC_LEN + MAGIC_PADDING..BODY_START]);
        Ok(Some(Checksum(digest)))
    }

    /// Size of the artifact on disk in bytes, `None` when absent.
    pub fn size(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }

    /// Removes the artifact. Absence is not an error.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = CacheFile::new(dir.path().join("normalized.bin"));
        let checksum = Checksum::of(b"source content");

        file.write(&checksum, b"normalized body").unwrap();
        let body = file.read(&checksum).unwrap().expect("cache hit");
        assert_eq!(&body[..], b"normalized body");
    }

    #[test]
    fn mismatched_checksum_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let file = CacheFile::new(dir.path().join("parsed.rkyv"));
        file.write(&Checksum::of(b"v1"), b"body").unwrap();

        assert!(file.read(&Checksum::of(b"v2")).unwrap().is_none());
        // The artifact is still valid for the original checksum.
        assert!(file.read(&Checksum::of(b"v1")).unwrap().is_some());
    }

    #[test]
    fn missing_file_is_a_miss_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = CacheFile::new(dir.path().join("absent.bin"));
        assert!(file.read(&Checksum::of(b"x")).unwrap().is_none());
        assert!(file.stored_checksum().unwrap().is_none());
    }

    #[test]
    fn truncated_or_foreign_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"not a cache file").unwrap();
        let file = CacheFile::new(&path);
        assert!(file.read(&Checksum::of(b"x")).unwrap().is_none());
    }

    #[test]
    fn stored_checksum_reports_header_value() {
        let dir = tempfile::tempdir().unwrap();
        let file = CacheFile::new(dir.path().join("indexed.rkyv"));
        let checksum = Checksum::of(b"abc");
        file.write(&checksum, b"").unwrap();
        assert_eq!(file.stored_checksum().unwrap(), Some(checksum));
    }

    #[test]
    fn checksum_hex_is_stable() {
        let c = Checksum::of(b"hello");
        assert_eq!(c.to_string().len(), 64);
        assert!(c.to_string().starts_with(&c.short_hex()));
    }
}
