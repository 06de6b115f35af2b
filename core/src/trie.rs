use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// First two characters of a term, right-padded with `_` when the term is
/// shorter than two characters.
pub fn shard_components(term: &str) -> (char, char) {
    let mut chars = term.chars();
    let first = chars.next().unwrap_or('_');
    let second = chars.next().unwrap_or('_');
    (first, second)
}

/// Two-level shard directory for a term: `<root>/<c1>/<c2>`. Purely a path
/// computation; nothing is created.
pub fn term_dir(root: &Path, term: &str) -> PathBuf {
    let (first, second) = shard_components(term);
    root.join(first.to_string()).join(second.to_string())
}

/// Resolves the shard directory for a term, creating it (and parents) if
/// missing. Repeat calls are no-ops.
pub fn make_term_dir(root: &Path, term: &str) -> Result<PathBuf, StoreError> {
    let dir = term_dir(root, term);
    fs::create_dir_all(&dir).map_err(|source| StoreError::Path {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_char_terms_split_into_both_levels() {
        assert_eq!(term_dir(Path::new("/idx"), "hello"), Path::new("/idx/h/e"));
        assert_eq!(term_dir(Path::new("/idx"), "ab"), Path::new("/idx/a/b"));
    }

    #[test]
    fn short_terms_pad_with_underscores() {
        assert_eq!(term_dir(Path::new("/idx"), "a"), Path::new("/idx/a/_"));
        assert_eq!(term_dir(Path::new("/idx"), ""), Path::new("/idx/_/_"));
    }

    #[test]
    fn make_term_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let first = make_term_dir(tmp.path(), "word").unwrap();
        let second = make_term_dir(tmp.path(), "word").unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }
}
