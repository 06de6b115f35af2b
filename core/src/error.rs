use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures touching the on-disk page store or index.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create shard directory {path}: {source}")]
    Path { path: PathBuf, source: io::Error },
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path) -> impl Fn(io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A raw `<page>` block that could not be decoded.
#[derive(Debug, Error)]
#[error("failed to decode page xml: {0}")]
pub struct PageError(#[from] quick_xml::DeError);
