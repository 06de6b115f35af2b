pub mod error;
pub mod index;
pub mod page;
pub mod tokenizer;
pub mod trie;
pub mod wikitext;

pub use error::{PageError, StoreError};

use std::time::Duration;

/// Weight applied to postings flagged as exact (non-stemmed) matches.
pub const EXACT_MATCH_MULTIPLIER: u64 = 3;

/// Number of candidates kept from the index scan for full-text rescoring.
pub const MAX_RESULTS: usize = 100;

/// Result snippets are cut to this many bytes, plus a trailing ellipsis.
pub const SNIPPET_MAX: usize = 300;

/// Minimum spacing between two article ingests.
pub const RATE_INTERVAL: Duration = Duration::from_millis(150);

/// Hard cap on a single line of the dump; a longer line aborts the scan.
pub const SCANNER_BUFFER: usize = 100 * 1024 * 1024;

/// Folder under the save path holding raw `<page>` files.
pub const PAGE_DIR: &str = "pages";

/// Folder under the save path holding per-term shard files.
pub const INDEX_DIR: &str = "index";
