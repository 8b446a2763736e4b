//! Extractive answer provider contract and a lexical implementation
//!
//! [`AnswerProvider`] abstracts the question-answering model that turns a
//! question plus retrieved context into a short answer span with a
//! confidence. [`LexicalAnswerProvider`] is the in-process implementation:
//! it splits the context into sentences and returns the one sharing the most
//! content terms with the question, scored by the fraction of question terms
//! it covers. A sentence matching half the question terms reports
//! confidence 0.5.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::{ModelError, Result};

/// Answer span extracted from retrieved context.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedAnswer {
    /// The extracted answer text
    pub text: String,
    /// Extraction confidence in [0, 1]
    pub confidence: f32,
}

/// Service that extracts an answer span from context for a question.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Extract the best answer to `question` from `context`.
    ///
    /// Errors signal the service itself failed; "nothing relevant in the
    /// context" is a low confidence, not an error.
    async fn extract_answer(&self, question: &str, context: &str) -> Result<ExtractedAnswer>;

    /// Short identifier for logs.
    fn provider_name(&self) -> &str;
}

/// Function words stripped from questions before overlap scoring.
const QUESTION_STOPWORDS: &[&str] = &[
    "about", "and", "are", "can", "could", "did", "does", "for", "how", "many", "much", "please",
    "should", "tell", "the", "was", "were", "what", "when", "where", "which", "who", "whom",
    "whose", "why", "will", "would", "you",
];

/// Extractive QA by question-term overlap against context sentences.
#[derive(Debug, Clone, Default)]
pub struct LexicalAnswerProvider;

impl LexicalAnswerProvider {
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(&self, question: &str, context: &str) -> Result<ExtractedAnswer> {
        let sentences = split_sentences(context);
        if sentences.is_empty() {
            return Err(ModelError::answer_extraction(
                "context contains no sentences",
            ));
        }

        let question_terms = content_terms(question);
        if question_terms.is_empty() {
            // Nothing to match against: hand back the leading sentence,
            // flagged as a guess.
            return Ok(ExtractedAnswer {
                text: sentences[0].to_string(),
                confidence: 0.0,
            });
        }

        let mut best_sentence = sentences[0];
        let mut best_score = 0.0f32;
        for sentence in &sentences {
            let tokens: HashSet<String> = tokenize(sentence).into_iter().collect();
            let overlap = question_terms.iter().filter(|t| tokens.contains(*t)).count();
            let score = overlap as f32 / question_terms.len() as f32;
            if score > best_score {
                best_score = score;
                best_sentence = sentence;
            }
        }

        tracing::debug!(confidence = best_score, "extracted answer sentence");
        Ok(ExtractedAnswer {
            text: best_sentence.to_string(),
            confidence: best_score.clamp(0.0, 1.0),
        })
    }
}

#[async_trait]
impl AnswerProvider for LexicalAnswerProvider {
    async fn extract_answer(&self, question: &str, context: &str) -> Result<ExtractedAnswer> {
        self.extract_sync(question, context)
    }

    fn provider_name(&self) -> &str {
        "lexical-overlap"
    }
}

/// Split text into sentences on `.`/`!`/`?` followed by whitespace or end.
///
/// Terminator runs (`?!`) stay attached to their sentence; fragments of two
/// characters or fewer are discarded.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let end = i + c.len_utf8();
            let at_boundary = match chars.peek() {
                Some((_, next)) => next.is_whitespace(),
                None => true,
            };
            if at_boundary {
                let sentence = text[start..end].trim();
                if sentence.len() > 2 {
                    sentences.push(sentence);
                }
                start = end;
            }
        }
    }
    let tail = text[start..].trim();
    if tail.len() > 2 {
        sentences.push(tail);
    }
    sentences
}

/// Lowercased alphanumeric tokens of length >= 3.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Question tokens minus function words, deduplicated in order.
fn content_terms(question: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for token in tokenize(question) {
        if QUESTION_STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        if !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}
