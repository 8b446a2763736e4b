//! Passage assembly for indexing.
//!
//! [`PassageBuilder`] greedily packs sentences into passages of roughly
//! `target_words` words. When a passage closes, its trailing `overlap_words`
//! words seed the next passage so answers spanning a boundary survive
//! retrieval. Standalone passages at or under `min_chars` characters are
//! dropped; sequence numbers are assigned after that filter, so surviving
//! passages are numbered contiguously from zero.
//!
//! The same input always yields the same passages. A single sentence longer
//! than the target still becomes one passage; sentences are never split
//! mid-way.

use serde::Serialize;

use crate::sentence::SentenceSplitter;

/// Default passage size in words.
pub const DEFAULT_TARGET_WORDS: usize = 500;
/// Default trailing-word overlap seeded into the next passage.
pub const DEFAULT_OVERLAP_WORDS: usize = 50;
/// Passages at or under this many trimmed characters are dropped.
pub const DEFAULT_MIN_CHARS: usize = 20;

/// A contiguous, sentence-aligned slice of one source document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passage {
    /// Filename of the document this passage came from
    pub source: String,
    /// Category of the source document, e.g. "fees"
    pub category: String,
    /// Position among the document's surviving passages
    pub sequence: usize,
    /// Passage text: sentences joined by single spaces
    pub text: String,
}

/// Builds overlapping passages from one document's raw text.
#[derive(Debug, Clone)]
pub struct PassageBuilder {
    source: String,
    category: String,
    target_words: usize,
    overlap_words: usize,
    min_chars: usize,
    splitter: SentenceSplitter,
}

impl PassageBuilder {
    /// Create a builder for one document with default sizing.
    pub fn new(source: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            category: category.into(),
            target_words: DEFAULT_TARGET_WORDS,
            overlap_words: DEFAULT_OVERLAP_WORDS,
            min_chars: DEFAULT_MIN_CHARS,
            splitter: SentenceSplitter::new(),
        }
    }

    pub fn with_target_words(mut self, target_words: usize) -> Self {
        self.target_words = target_words;
        self
    }

    pub fn with_overlap_words(mut self, overlap_words: usize) -> Self {
        self.overlap_words = overlap_words;
        self
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Assemble passages from `text`.
    pub fn get_passages(&self, text: &str) -> Vec<Passage> {
        let sentences = self.splitter.split(text);
        let mut drafts: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_words = 0usize;

        for sentence in sentences {
            let sentence_words = count_words(sentence);
            if current_words + sentence_words <= self.target_words {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(sentence);
                current_words += sentence_words;
            } else {
                if !current.is_empty() {
                    drafts.push(std::mem::take(&mut current));
                }
                match drafts.last() {
                    Some(previous) if self.overlap_words > 0 => {
                        let tail = trailing_words(previous, self.overlap_words);
                        current = format!("{tail} {sentence}");
                        // Recount over the combined text; the seed may push
                        // this passage past the target on its own.
                        current_words = count_words(&current);
                    }
                    _ => {
                        current = sentence.to_string();
                        current_words = sentence_words;
                    }
                }
            }
        }
        if !current.is_empty() {
            drafts.push(current);
        }

        drafts
            .into_iter()
            .filter(|draft| draft.trim().len() > self.min_chars)
            .enumerate()
            .map(|(sequence, text)| Passage {
                source: self.source.clone(),
                category: self.category.clone(),
                sequence,
                text,
            })
            .collect()
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The last `count` whitespace-separated words of `text`, space-joined.
fn trailing_words(text: &str, count: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(count);
    words[start..].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PassageBuilder {
        PassageBuilder::new("doc.txt", "general")
    }

    #[test]
    fn test_single_passage_under_target() {
        let passages =
            builder().get_passages("The campus has a central library. It opens at eight.");
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].sequence, 0);
        assert_eq!(
            passages[0].text,
            "The campus has a central library. It opens at eight."
        );
        assert_eq!(passages[0].source, "doc.txt");
        assert_eq!(passages[0].category, "general");
    }

    #[test]
    fn test_empty_input_yields_no_passages() {
        assert!(builder().get_passages("").is_empty());
        assert!(builder().get_passages("  \n ").is_empty());
    }

    #[test]
    fn test_overlap_seeds_next_passage() {
        let builder = builder()
            .with_target_words(8)
            .with_overlap_words(3)
            .with_min_chars(0);
        let text = "Alpha beta gamma delta epsilon one. Zeta eta theta iota kappa two. \
                    Lambda mu nu xi omicron three.";
        let passages = builder.get_passages(text);
        assert!(passages.len() >= 2);

        let first_words: Vec<&str> = passages[0].text.split_whitespace().collect();
        let seed = first_words[first_words.len() - 3..].join(" ");
        assert!(
            passages[1].text.starts_with(&seed),
            "expected overlap seed {seed:?} at the start of {:?}",
            passages[1].text
        );
    }

    #[test]
    fn test_deterministic() {
        let text = "Admissions open in June. Apply online through the portal. \
                    Merit lists are published in July. Classes begin in August.";
        let a = builder()
            .with_target_words(6)
            .with_overlap_words(2)
            .get_passages(text);
        let b = builder()
            .with_target_words(6)
            .with_overlap_words(2)
            .get_passages(text);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_short_standalone_dropped_but_short_sentence_kept() {
        // "Yes." alone is under the minimum; inside a larger passage it survives.
        assert!(builder().get_passages("Yes.").is_empty());

        let text = "Yes. The hostel provides meals three times a day to all resident students.";
        let passages = builder().get_passages(text);
        assert_eq!(passages.len(), 1);
        assert!(passages[0].text.contains("Yes."));
    }

    #[test]
    fn test_oversized_sentence_stays_whole() {
        let long_sentence = format!("{} end.", ["word"; 30].join(" "));
        let builder = builder()
            .with_target_words(8)
            .with_overlap_words(2)
            .with_min_chars(0);
        let passages = builder.get_passages(&long_sentence);
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, long_sentence);
    }

    #[test]
    fn test_zero_overlap_reconstructs_sentence_stream() {
        let text = "One is here. Two is here. Three is here. Four is here. Five is here.";
        let builder = builder()
            .with_target_words(6)
            .with_overlap_words(0)
            .with_min_chars(0);
        let passages = builder.get_passages(text);
        let joined = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(joined, text);

        let sequences: Vec<usize> = passages.iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, (0..passages.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_serializes_with_metadata() {
        let passages =
            builder().get_passages("The placement cell hosts company drives every winter.");
        let json = serde_json::to_string(&passages[0]).unwrap();
        assert!(json.contains("\"source\":\"doc.txt\""));
        assert!(json.contains("\"category\":\"general\""));
    }
}
