//! Sentence boundary detection.
//!
//! Splits text on terminal punctuation (`.`, `!`, `?`), allowing closing
//! quotes or brackets after the terminator, with the following whitespace
//! consumed into the boundary. Text after the last terminator still counts as
//! a sentence, so no input is ever lost. Abbreviation handling is
//! deliberately simple; brochure prose is forgiving.

use regex::Regex;

/// End-of-sentence pattern: terminal punctuation, optional closing
/// quotes/brackets, then whitespace.
pub const SENTENCE_BOUNDARY_PATTERN: &str = r#"[.!?]+["')\]]*\s+"#;

/// Splits text into sentences on terminal punctuation.
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    boundary: Regex,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSplitter {
    /// Create a splitter with the default boundary pattern.
    ///
    /// # Panics
    /// Panics if the built-in pattern fails to compile, which would be a bug
    /// in this crate.
    pub fn new() -> Self {
        Self {
            boundary: Regex::new(SENTENCE_BOUNDARY_PATTERN).unwrap(),
        }
    }

    /// Split `text` into trimmed, non-empty sentences.
    ///
    /// Each sentence keeps its terminal punctuation; terminator runs
    /// (`"Really?!"`) stay attached to their sentence.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for boundary in self.boundary.find_iter(text) {
            let sentence = text[start..boundary.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = boundary.end();
        }
        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail);
        }
        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic() {
        let splitter = SentenceSplitter::new();
        let sentences = splitter.split("First sentence. Second sentence! Third?");
        assert_eq!(
            sentences,
            vec!["First sentence.", "Second sentence!", "Third?"]
        );
    }

    #[test]
    fn test_trailing_text_without_terminator() {
        let splitter = SentenceSplitter::new();
        let sentences = splitter.split("Complete sentence. trailing fragment");
        assert_eq!(sentences, vec!["Complete sentence.", "trailing fragment"]);
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        let splitter = SentenceSplitter::new();
        let sentences = splitter.split("He said \"apply early.\" Fees follow.");
        assert_eq!(sentences, vec!["He said \"apply early.\"", "Fees follow."]);
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        let splitter = SentenceSplitter::new();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\t ").is_empty());
    }

    #[test]
    fn test_repeated_terminators() {
        let splitter = SentenceSplitter::new();
        let sentences = splitter.split("Wait?! Really... yes.");
        assert_eq!(sentences, vec!["Wait?!", "Really...", "yes."]);
    }
}
