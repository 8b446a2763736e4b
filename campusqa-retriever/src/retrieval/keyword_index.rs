//! Sparse TF-IDF keyword index.
//!
//! [`TfidfModel`] is the fitted state: a capped vocabulary of stopword-free
//! 1..3-grams with smoothed inverse document frequencies. Fitting scans the
//! whole chunk corpus; transforming turns any text into an L2-normalized
//! sparse vector over that vocabulary, so cosine similarity reduces to a
//! sparse dot product. The model must be refit whenever the chunk set
//! changes; transform-only reuse is valid solely when a fingerprint proves
//! the corpus identical, which is how snapshot restore works.
//!
//! Everything here is deterministic: vocabulary selection orders terms by
//! corpus frequency with an alphabetical tie-break, and columns are assigned
//! in sorted-term order.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Tokens shorter than this never enter the vocabulary.
const MIN_TOKEN_LEN: usize = 2;

/// Sizing for TF-IDF fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfConfig {
    /// Vocabulary cap; the most frequent terms win, ties alphabetical
    pub max_terms: usize,
    /// Longest n-gram formed from adjacent non-stopword tokens
    pub max_ngram: usize,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            max_terms: 5000,
            max_ngram: 3,
        }
    }
}

impl TfidfConfig {
    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = max_terms;
        self
    }

    pub fn with_max_ngram(mut self, max_ngram: usize) -> Self {
        self.max_ngram = max_ngram;
        self
    }
}

/// Sparse vector over vocabulary columns, sorted by column.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    fn new(entries: Vec<(u32, f32)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Dot product by merging the two sorted column lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let mut sum = 0.0;
        let mut a = self.entries.iter().peekable();
        let mut b = other.entries.iter().peekable();
        while let (Some(&&(ca, va)), Some(&&(cb, vb))) = (a.peek(), b.peek()) {
            match ca.cmp(&cb) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => {
                    sum += va * vb;
                    a.next();
                    b.next();
                }
            }
        }
        sum
    }
}

/// Fitted TF-IDF state: vocabulary columns plus per-column IDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfModel {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
    config: TfidfConfig,
}

impl TfidfModel {
    /// Fit over a corpus of texts.
    ///
    /// IDF uses the smoothed form `ln((1 + n) / (1 + df)) + 1`, so every
    /// retained term keeps a positive weight even when it appears in every
    /// document.
    pub fn fit(texts: &[String], config: TfidfConfig) -> Self {
        let n_docs = texts.len();
        let mut corpus_freq: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let grams = extract_ngrams(text, config.max_ngram);
            let mut seen: HashSet<&str> = HashSet::new();
            for gram in &grams {
                *corpus_freq.entry(gram.clone()).or_insert(0) += 1;
                if seen.insert(gram.as_str()) {
                    *doc_freq.entry(gram.clone()).or_insert(0) += 1;
                }
            }
        }

        let selected: Vec<String> = corpus_freq
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .take(config.max_terms)
            .map(|(term, _)| term)
            .sorted()
            .collect();

        let mut vocabulary = HashMap::with_capacity(selected.len());
        let mut idf = Vec::with_capacity(selected.len());
        for (column, term) in selected.into_iter().enumerate() {
            let df = doc_freq.get(&term).copied().unwrap_or(0);
            idf.push(((1 + n_docs) as f32 / (1 + df) as f32).ln() + 1.0);
            vocabulary.insert(term, column as u32);
        }

        tracing::debug!(
            documents = n_docs,
            vocabulary = vocabulary.len(),
            "fitted tf-idf model"
        );
        Self {
            vocabulary,
            idf,
            config,
        }
    }

    /// Transform text into an L2-normalized sparse tf-idf vector.
    ///
    /// Terms outside the fitted vocabulary are silently ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<u32, f32> = HashMap::new();
        for gram in extract_ngrams(text, self.config.max_ngram) {
            if let Some(&column) = self.vocabulary.get(&gram) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(column, tf)| (column, tf * self.idf[column as usize]))
            .collect();
        entries.sort_by_key(|(column, _)| *column);

        let norm: f32 = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }
        SparseVector::new(entries)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn config(&self) -> &TfidfConfig {
        &self.config
    }
}

/// Keyword index: the fitted model plus one row per chunk.
#[derive(Debug, Clone)]
pub struct KeywordIndex {
    model: TfidfModel,
    rows: Vec<SparseVector>,
}

impl KeywordIndex {
    /// Fit a fresh model over `texts` and index every row.
    pub fn build(texts: &[String], config: TfidfConfig) -> Self {
        let model = TfidfModel::fit(texts, config);
        let rows = texts.iter().map(|t| model.transform(t)).collect();
        Self { model, rows }
    }

    /// Re-index `texts` under an existing fitted model.
    ///
    /// Only sound when `texts` is the exact corpus the model was fitted on;
    /// callers prove that with a corpus fingerprint before using this.
    pub fn from_model(model: TfidfModel, texts: &[String]) -> Self {
        let rows = texts.iter().map(|t| model.transform(t)).collect();
        Self { model, rows }
    }

    pub fn model(&self) -> &TfidfModel {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `limit` highest-scoring rows with nonzero cosine to the query.
    ///
    /// Results are `(ordinal, score)` sorted by score descending; equal
    /// scores keep ascending ordinal order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(usize, f32)> {
        let query_vector = self.model.transform(query);
        if query_vector.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f32)> = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(ordinal, row)| {
                let score = query_vector.dot(row);
                (score > 0.0).then_some((ordinal, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }
}

/// Stopword-filtered 1..=`max_ngram`-grams of the lowercased text.
///
/// Stopwords are removed before n-gram formation, so "fee for the hostel"
/// yields the bigram "fee hostel".
fn extract_ngrams(text: &str, max_ngram: usize) -> Vec<String> {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(|t| t.to_lowercase())
        .filter(|t| !is_stop_word(t))
        .collect();

    let mut grams = Vec::new();
    for n in 1..=max_ngram {
        if tokens.len() < n {
            break;
        }
        for window in tokens.windows(n) {
            grams.push(window.join(" "));
        }
    }
    grams
}

fn is_stop_word(token: &str) -> bool {
    ENGLISH_STOPWORDS.binary_search(&token).is_ok()
}

/// Sorted so membership is a binary search.
const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your", "yours", "yourself", "yourselves",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "Tuition fee payment is due before classes start.".to_string(),
            "The hostel provides furnished rooms and a mess.".to_string(),
            "Placement drives bring companies to campus every winter.".to_string(),
        ]
    }

    #[test]
    fn test_ngrams_skip_stopwords_before_joining() {
        let grams = extract_ngrams("fee for the hostel", 2);
        assert!(grams.contains(&"fee".to_string()));
        assert!(grams.contains(&"hostel".to_string()));
        assert!(grams.contains(&"fee hostel".to_string()));
        assert!(!grams.iter().any(|g| g.contains("the")));
    }

    #[test]
    fn test_stopword_list_is_sorted() {
        assert!(ENGLISH_STOPWORDS.windows(2).all(|w| w[0] < w[1]));
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("tuition"));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let texts = corpus();
        let a = TfidfModel::fit(&texts, TfidfConfig::default());
        let b = TfidfModel::fit(&texts, TfidfConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_vocabulary_cap_keeps_most_frequent() {
        let texts = vec![
            "alpha alpha alpha beta".to_string(),
            "alpha beta gamma".to_string(),
        ];
        let model = TfidfModel::fit(&texts, TfidfConfig::default().with_max_terms(2).with_max_ngram(1));
        assert_eq!(model.vocabulary_len(), 2);
        // "alpha" (4 occurrences) and "beta" (2) beat "gamma" (1).
        assert!(!model.transform("alpha beta").is_empty());
        assert!(model.transform("gamma").is_empty());
    }

    #[test]
    fn test_transform_rows_are_unit_length() {
        let texts = corpus();
        let model = TfidfModel::fit(&texts, TfidfConfig::default());
        for text in &texts {
            let row = model.transform(text);
            let norm: f32 = row.dot(&row);
            assert!((norm - 1.0).abs() < 1e-4, "norm^2 was {norm}");
        }
    }

    #[test]
    fn test_search_ranks_matching_document_first() {
        let index = KeywordIndex::build(&corpus(), TfidfConfig::default());
        let results = index.search("tuition fee payment", 10);
        assert!(!results.is_empty());
        assert_eq!(results[0].0, 0);
        assert!(results[0].1 > 0.0);
    }

    #[test]
    fn test_search_drops_zero_scores() {
        let index = KeywordIndex::build(&corpus(), TfidfConfig::default());
        let results = index.search("quantum entanglement", 10);
        assert!(results.is_empty());
    }

    #[test]
    fn test_query_of_only_stopwords_matches_nothing() {
        let index = KeywordIndex::build(&corpus(), TfidfConfig::default());
        assert!(index.search("the and of", 10).is_empty());
    }

    #[test]
    fn test_model_survives_serde_roundtrip() {
        let texts = corpus();
        let model = TfidfModel::fit(&texts, TfidfConfig::default());
        let json = serde_json::to_string(&model).unwrap();
        let restored: TfidfModel = serde_json::from_str(&json).unwrap();

        assert_eq!(model, restored);
        for text in &texts {
            assert_eq!(model.transform(text), restored.transform(text));
        }
    }

    #[test]
    fn test_empty_corpus_fits_empty_model() {
        let index = KeywordIndex::build(&[], TfidfConfig::default());
        assert!(index.is_empty());
        assert!(index.search("anything", 10).is_empty());
    }

    #[test]
    fn test_term_frequency_weights_repeats() {
        let texts = vec!["tuition".to_string(), "hostel".to_string()];
        let model = TfidfModel::fit(&texts, TfidfConfig::default().with_max_ngram(1));
        let mixed = model.transform("tuition tuition hostel");
        assert_eq!(mixed.len(), 2);

        // tf 2 on "tuition" vs tf 1 on "hostel" with equal idf: projecting
        // onto each unit axis must show a 2:1 weight ratio.
        let tuition_weight = mixed.dot(&model.transform("tuition"));
        let hostel_weight = mixed.dot(&model.transform("hostel"));
        assert!(
            (tuition_weight / hostel_weight - 2.0).abs() < 1e-3,
            "weights {tuition_weight} / {hostel_weight}"
        );
    }
}
