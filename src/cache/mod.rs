//! Checksum-gated persistence of derived dictionary data.
//!
//! ```text
//! raw source --normalize--> normalized.bin
//!                               |
//!                             parse
//!                               v
//!                           parsed.rkyv  (token span table)
//!                               |
//!                             index
//!                               v
//!                           index.rkyv   (inverted index)
//! ```
//!
//! Every artifact header carries the checksum of the raw source it was
//! derived from; a source edit invalidates all three at once.

pub mod cache_file;
pub mod dictionary_cache;
pub mod indexed;
pub mod parsed;

pub use cache_file::{CacheFile, Checksum};
pub use dictionary_cache::{CacheRegistry, CacheSnapshot, DictionaryCache};
pub use indexed::{Indexed, Posting, PostingList};
pub use parsed::{Parsed, ParsedLine, ParsedTable, TokenSpan};
