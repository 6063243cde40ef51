//! Filesystem path decomposition and the dictionary search path.
//!
//! [`FilePath`] splits a path string into its basename, suffix, and
//! suffixless stem once at construction time; the pieces are immutable
//! afterwards. [`dictionary_search_path`] resolves the ordered list of
//! directories scanned for dictionary files: an explicit override string,
//! then the `JITEN_DICTIONARY_PATH` environment variable, then a single
//! compiled-in default directory.

use std::env;
use std::path::PathBuf;

/// Environment variable holding a platform-separator-delimited list of
/// dictionary directories.
pub const DICTIONARY_PATH_ENV: &str = "JITEN_DICTIONARY_PATH";

/// Directory scanned when no override and no environment variable is set.
pub const DEFAULT_DICTIONARY_DIR: &str = "/usr/share/jiten/dictionaries";

/// A path decomposed into basename, suffix, and suffixless stem.
///
/// The suffix is the substring after the last dot of the basename; a
/// basename without a dot (or with only a leading dot) has an empty suffix.
/// For a non-empty suffix, `suffixless + "." + suffix` reconstructs the
/// original path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePath {
    path: String,
    basename: String,
    suffix: String,
    suffixless: String,
}

impl FilePath {
    /// Decomposes `path`. Never fails; unusual inputs simply produce empty
    /// components.
    pub fn new(path: &str) -> Self {
        let basename = path
            .rsplit(['/', std::path::MAIN_SEPARATOR])
            .next()
            .unwrap_or("")
            .to_string();

        // A dot at position 0 of the basename marks a hidden file, not a
        // suffix separator.
        let suffix = match basename.rfind('.') {
            Some(idx) if idx > 0 => basename[idx + 1..].to_string(),
            _ => String::new(),
        };

        let suffixless = if suffix.is_empty() {
            path.to_string()
        } else {
            path[..path.len() - suffix.len() - 1].to_string()
        };

        Self {
            path: path.to_string(),
            basename,
            suffix,
            suffixless,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Extension after the last dot, empty when there is none.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The full path with the suffix (and its dot) removed.
    pub fn suffixless(&self) -> &str {
        &self.suffixless
    }
}

/// Resolves the ordered list of directories to scan for dictionary files.
///
/// `override_path`, when given, wins over the environment variable; both are
/// split on the platform path separator (`:` on Unix, `;` on Windows). When
/// neither source is present the list is exactly `[DEFAULT_DICTIONARY_DIR]`.
pub fn dictionary_search_path(override_path: Option<&str>) -> Vec<PathBuf> {
    if let Some(raw) = override_path {
        return env::split_paths(raw).collect();
    }
    if let Some(raw) = env::var_os(DICTIONARY_PATH_ENV) {
        return env::split_paths(&raw).collect();
    }
    vec![PathBuf::from(DEFAULT_DICTIONARY_DIR)]
}
