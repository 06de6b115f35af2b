use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref WORD_RE: Regex = Regex::new("[a-zA-Z]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "the", "be", "to", "and", "a", "an", "of", "i", "in", "that", "you", "have",
            "it", "is", "do", "for", "on", "with", "he", "this", "as", "we", "but", "not",
            "they", "what", "at", "my", "his", "get", "go", "from", "will", "say", "can",
            "by", "or", "all", "me", "she", "so", "there", "about", "your", "one", "if",
            "her", "out", "just", "when", "like", "up", "who", "make", "would", "no",
            "their", "time", "see", "more", "know", "come", "think", "take", "him", "how",
            "them", "want", "other", "could", "now", "year", "look", "right", "into",
            "people", "our", "which", "then", "here", "back", "work", "than", "some",
            "way", "only", "tell", "because", "good", "over", "thing", "use", "need",
            "two", "day", "even", "these", "where", "give", "man", "find", "after",
            "well", "us", "also", "much", "new", "life", "any", "first", "should",
            "call", "down", "most", "those", "very", "too", "why", "feel", "really",
            "through", "try", "never", "before", "something", "many", "let", "help",
            "little", "off", "long", "may", "child", "mean", "woman", "still", "love",
            "ask", "great", "show", "leave", "around", "talk", "start", "last",
            "school", "keep", "own", "put", "home", "while", "place", "oh", "another",
            "big", "turn", "same", "such", "three", "family", "again", "change", "play",
            "both", "each", "always", "high", "old", "every", "point", "hear", "run",
            "state", "away", "happen", "might", "better", "house", "move", "become",
            "seem", "hand", "between", "end", "yeah", "friend", "live", "name", "few",
            "sure", "believe", "night", "since", "problem", "best", "part", "yes",
            "guy", "bad", "far", "hold", "stop", "next", "bring", "week", "ever",
            "head", "without",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Splits text into maximal ASCII-letter runs, lowercased, in encounter order.
/// Digits, punctuation, whitespace, and anything non-ASCII act as separators and
/// never appear inside a token.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// Frequency of every non-stopword token in `text`.
pub fn word_frequency(text: &str) -> HashMap<String, u64> {
    let mut freqs = HashMap::new();
    for token in tokenize(text) {
        if is_stopword(&token) {
            continue;
        }
        *freqs.entry(token).or_insert(0) += 1;
    }
    freqs
}

/// Folds exact-token frequencies into per-stem totals. The stemmer's output is
/// lowercased before it becomes a key.
pub fn stemmed_frequency(word_freqs: &HashMap<String, u64>) -> HashMap<String, u64> {
    let mut stemmed = HashMap::new();
    for (word, freq) in word_freqs {
        let stem = STEMMER.stem(word).to_lowercase();
        *stemmed.entry(stem).or_insert(0) += freq;
    }
    stemmed
}
