use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, warn};

use wikiseek_core::index::{load_postings, shard_path};
use wikiseek_core::page::Page;
use wikiseek_core::tokenizer::word_frequency;
use wikiseek_core::{EXACT_MATCH_MULTIPLIER, INDEX_DIR, MAX_RESULTS, PAGE_DIR, SNIPPET_MAX};

/// Everything the results template needs for one query.
#[derive(Clone, Debug, Default)]
pub struct SearchPageData {
    pub query: String,
    pub search_time: String,
    pub files_returned: usize,
    pub results: Vec<SearchResult>,
    pub use_ollama: bool,
    pub cache_key: String,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub abstract_: String,
}

struct Match {
    rel_path: String,
    index_score: u64,
    text_score: u64,
}

/// Runs the full query pipeline: plan against the shard files, pick the top
/// candidates by index score, rescore them against the full article text in
/// parallel, and assemble display results in rank order.
pub fn search(save_path: &Path, q: &str) -> Result<SearchPageData> {
    let start = Instant::now();
    let index_root = save_path.join(INDEX_DIR);
    let page_root = save_path.join(PAGE_DIR);

    let load_start = Instant::now();
    let page_scores = index_scores(&index_root, q)?;
    debug!(elapsed = ?load_start.elapsed(), pages = page_scores.len(), "loaded shards");

    let select_start = Instant::now();
    let top_results = select_candidates(&page_scores);
    debug!(elapsed = ?select_start.elapsed(), candidates = top_results.len(), "selected candidates");

    let rescore_start = Instant::now();
    let mut matches = rescore(&page_root, q, &page_scores, &top_results);
    matches.sort_by(|a, b| {
        (b.index_score + b.text_score, b.index_score)
            .cmp(&(a.index_score + a.text_score, a.index_score))
    });
    debug!(elapsed = ?rescore_start.elapsed(), "rescored candidates");

    let assemble_start = Instant::now();
    let mut results = Vec::new();
    for m in &matches {
        match assemble_result(&page_root, m) {
            Ok(result) => results.push(result),
            Err(err) => warn!(rel_path = %m.rel_path, %err, "failed to load result page"),
        }
    }
    debug!(elapsed = ?assemble_start.elapsed(), "assembled results");

    let elapsed = start.elapsed();
    Ok(SearchPageData {
        query: q.to_string(),
        search_time: format!("{:?}", truncate_to_10ms(elapsed)),
        files_returned: page_scores.len(),
        results,
        use_ollama: false,
        cache_key: String::new(),
    })
}

/// Aggregates per-article scores from the shard file of every non-stopword
/// query term. Missing shards contribute nothing; exact rows weigh triple.
fn index_scores(index_root: &Path, q: &str) -> Result<HashMap<String, u64>> {
    let mut page_scores = HashMap::new();
    for word in word_frequency(q).keys() {
        let Some(rows) = load_postings(&shard_path(index_root, word))? else {
            continue;
        };
        for row in rows {
            let weight = if row.exact {
                EXACT_MATCH_MULTIPLIER * row.word_freq
            } else {
                row.word_freq
            };
            *page_scores.entry(row.rel_path).or_insert(0) += weight;
        }
    }
    Ok(page_scores)
}

/// Buckets articles by index score and walks the buckets from the highest
/// score down, keeping up to `MAX_RESULTS` paths. Order within a bucket
/// follows map iteration and is unspecified.
fn select_candidates(page_scores: &HashMap<String, u64>) -> Vec<String> {
    let mut score_buckets: BTreeMap<u64, Vec<&String>> = BTreeMap::new();
    for (rel_path, score) in page_scores {
        score_buckets.entry(*score).or_default().push(rel_path);
    }

    let mut top_results = Vec::new();
    'buckets: for (_score, bucket) in score_buckets.iter().rev() {
        for rel_path in bucket {
            top_results.push((*rel_path).clone());
            if top_results.len() >= MAX_RESULTS {
                break 'buckets;
            }
        }
    }
    top_results
}

/// Counts each whitespace-split word of the lowercased query over every
/// candidate's article file. Candidates fan out across the thread pool; a
/// candidate that fails to read is logged and dropped.
fn rescore(
    page_root: &Path,
    q: &str,
    page_scores: &HashMap<String, u64>,
    top_results: &[String],
) -> Vec<Match> {
    let query_words: Vec<String> = q.to_lowercase().split_whitespace().map(str::to_string).collect();
    let matches = Mutex::new(Vec::with_capacity(top_results.len()));

    top_results.par_iter().for_each(|rel_path| {
        match text_score(&page_root.join(rel_path), &query_words) {
            Ok(text_score) => matches.lock().push(Match {
                rel_path: rel_path.clone(),
                index_score: page_scores[rel_path],
                text_score,
            }),
            Err(err) => warn!(%rel_path, %err, "failed to rescore candidate"),
        }
    });

    matches.into_inner()
}

/// Non-overlapping occurrences of the query words over the lowercased lines of
/// one article file.
fn text_score(page_path: &Path, query_words: &[String]) -> Result<u64> {
    let fh = File::open(page_path)
        .with_context(|| format!("failed to open page file {}", page_path.display()))?;
    let mut score = 0u64;
    for line in BufReader::new(fh).lines() {
        let line = line?.to_lowercase();
        for word in query_words {
            score += line.matches(word.as_str()).count() as u64;
        }
    }
    Ok(score)
}

fn assemble_result(page_root: &Path, m: &Match) -> Result<SearchResult> {
    let path = page_root.join(&m.rel_path);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read page file {}", path.display()))?;
    let page = Page::from_xml(&raw)?;
    let (abstract_, body) = page.render();

    let snippet_src = if abstract_.is_empty() { &body } else { &abstract_ };
    Ok(SearchResult {
        title: page.title,
        url: format!("/page/{}", m.rel_path),
        snippet: truncate_snippet(snippet_src),
        abstract_,
    })
}

/// Cuts a snippet to `SNIPPET_MAX` bytes, backing up to the last space, and
/// appends an ellipsis. Shorter snippets pass through untouched.
fn truncate_snippet(text: &str) -> String {
    if text.len() <= SNIPPET_MAX {
        return text.to_string();
    }
    let cut = match text.as_bytes()[..SNIPPET_MAX].iter().rposition(|b| *b == b' ') {
        Some(pos) => pos,
        None => {
            let mut i = SNIPPET_MAX;
            while !text.is_char_boundary(i) {
                i -= 1;
            }
            i
        }
    };
    format!("{}...", &text[..cut])
}

fn truncate_to_10ms(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64 / 10 * 10)
}
