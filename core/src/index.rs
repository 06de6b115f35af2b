use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::StoreError;
use crate::page::slugify;
use crate::tokenizer::{stemmed_frequency, word_frequency};
use crate::trie::{make_term_dir, shard_components, term_dir};
use crate::{INDEX_DIR, PAGE_DIR};

/// One row of a shard file: `<freq>,<exact>,<relPath>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub word_freq: u64,
    pub exact: bool,
    pub rel_path: String,
}

/// Path of the shard file for a term. Purely a path computation.
pub fn shard_path(index_root: &Path, term: &str) -> PathBuf {
    term_dir(index_root, term).join(format!("{term}.idx"))
}

/// Writes a raw `<page>` block verbatim under `pages/<c1>/<c2>/<slug>.xml` and
/// returns the file's path relative to `pages/`.
pub fn save_page(save_path: &Path, title: &str, raw_xml: &[u8]) -> Result<String, StoreError> {
    let slug = slugify(title);
    let page_root = save_path.join(PAGE_DIR);
    let dir = make_term_dir(&page_root, &slug)?;
    let file_path = dir.join(format!("{slug}.xml"));
    fs::write(&file_path, raw_xml).map_err(StoreError::io(&file_path))?;

    let (first, second) = shard_components(&slug);
    Ok(format!("{first}/{second}/{slug}.xml"))
}

/// Appends one posting row to a shard file, creating the file if missing.
pub fn append_posting(
    shard_path: &Path,
    freq: u64,
    exact: bool,
    rel_path: &str,
) -> Result<(), StoreError> {
    let mut fh = OpenOptions::new()
        .create(true)
        .append(true)
        .open(shard_path)
        .map_err(StoreError::io(shard_path))?;
    fh.seek(SeekFrom::End(0)).map_err(StoreError::io(shard_path))?;
    writeln!(fh, "{freq},{exact},{rel_path}").map_err(StoreError::io(shard_path))?;
    Ok(())
}

/// Indexes an article's text: one exact posting per distinct non-stopword
/// token, plus one posting per distinct stem accumulating the frequencies of
/// the tokens that share it.
pub fn index_article(save_path: &Path, rel_path: &str, text: &str) -> Result<(), StoreError> {
    let word_freqs = word_frequency(text);
    let stemmed_freqs = stemmed_frequency(&word_freqs);
    let index_root = save_path.join(INDEX_DIR);

    for (word, freq) in &word_freqs {
        let dir = make_term_dir(&index_root, word)?;
        append_posting(&dir.join(format!("{word}.idx")), *freq, true, rel_path)?;
    }
    for (stem, freq) in &stemmed_freqs {
        let dir = make_term_dir(&index_root, stem)?;
        append_posting(&dir.join(format!("{stem}.idx")), *freq, false, rel_path)?;
    }
    Ok(())
}

/// Reads a shard file into posting rows, or `None` when the shard does not
/// exist. Rows that do not split into exactly three fields, or whose frequency
/// is not a decimal integer, are logged and skipped.
pub fn load_postings(shard_path: &Path) -> Result<Option<Vec<Posting>>, StoreError> {
    let fh = match File::open(shard_path) {
        Ok(fh) => fh,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: shard_path.to_path_buf(),
                source,
            })
        }
    };

    let mut rows = Vec::new();
    for line in BufReader::new(fh).lines() {
        let line = line.map_err(StoreError::io(shard_path))?;
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != 3 {
            warn!(path = %shard_path.display(), %line, "malformed posting row");
            continue;
        }
        let Ok(word_freq) = parts[0].parse::<u64>() else {
            warn!(path = %shard_path.display(), %line, "malformed posting frequency");
            continue;
        };
        rows.push(Posting {
            word_freq,
            exact: parts[1] == "true",
            rel_path: parts[2].trim_end().to_string(),
        });
    }
    Ok(Some(rows))
}
