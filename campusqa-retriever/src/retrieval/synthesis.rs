//! Extractive answer synthesis over retrieval candidates.
//!
//! The synthesizer turns ranked chunks into a single [`AnswerRecord`]: it
//! assembles a bounded context window from the top candidates, asks an
//! [`AnswerProvider`] for the best span, and decorates low-confidence
//! answers with the categories the information came from. Provider failure
//! degrades to a templated summary instead of an error, so `chat` always
//! has something to say.

use std::sync::Arc;

use campusqa_models::AnswerProvider;
use itertools::Itertools;
use serde::Serialize;

use super::scoring::RetrievalResult;

/// Returned when retrieval produced no candidates at all.
pub const NOT_FOUND_ANSWER: &str = "I don't have specific information about that topic in my knowledge base. Could you please rephrase your question or ask about admissions, courses, fees, hostel, or placement information?";

/// Returned by the engine when the embedding service fails at query time.
pub const SERVICE_UNAVAILABLE_ANSWER: &str =
    "The answer service is temporarily unavailable. Please try again in a few moments.";

/// How many top candidates feed the context window and the source list.
const CONTEXT_CANDIDATES: usize = 3;
/// How many candidates the degraded answer cites.
const FALLBACK_CANDIDATES: usize = 2;

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSource {
    pub filename: String,
    pub category: String,
    pub relevance: f32,
}

/// A complete answer with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    pub answer: String,
    pub confidence: f32,
    pub sources: Vec<AnswerSource>,
    /// Number of retrieval candidates that were available
    pub context_chunks: usize,
}

impl AnswerRecord {
    pub fn not_found() -> Self {
        Self {
            answer: NOT_FOUND_ANSWER.to_string(),
            confidence: 0.0,
            sources: Vec::new(),
            context_chunks: 0,
        }
    }

    pub fn service_unavailable() -> Self {
        Self {
            answer: SERVICE_UNAVAILABLE_ANSWER.to_string(),
            confidence: 0.0,
            sources: Vec::new(),
            context_chunks: 0,
        }
    }
}

/// Builds answers from ranked retrieval candidates.
pub struct AnswerSynthesizer {
    provider: Arc<dyn AnswerProvider>,
    max_context_chars: usize,
    low_confidence: f32,
}

impl AnswerSynthesizer {
    pub fn new(provider: Arc<dyn AnswerProvider>) -> Self {
        Self {
            provider,
            max_context_chars: 1000,
            low_confidence: 0.5,
        }
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    /// Produce an answer for `query` from ranked `candidates`.
    ///
    /// Never returns an error: provider failure falls back to a templated
    /// summary naming the strongest candidate's category and file.
    pub async fn synthesize(&self, query: &str, candidates: &[RetrievalResult]) -> AnswerRecord {
        if candidates.is_empty() {
            return AnswerRecord::not_found();
        }

        let context = candidates
            .iter()
            .take(CONTEXT_CANDIDATES)
            .map(|c| c.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let context = truncate_chars(&context, self.max_context_chars);

        match self.provider.extract_answer(query, &context).await {
            Ok(extracted) => {
                let mut answer = extracted.text;
                if extracted.confidence < self.low_confidence {
                    let categories = candidates
                        .iter()
                        .map(|c| c.chunk.category.as_str())
                        .unique()
                        .join(", ");
                    answer.push_str(&format!("\n\nThis information is related to: {categories}"));
                }
                AnswerRecord {
                    answer,
                    confidence: extracted.confidence,
                    sources: distinct_sources(candidates, CONTEXT_CANDIDATES),
                    context_chunks: candidates.len(),
                }
            }
            Err(e) => {
                tracing::warn!("answer extraction failed, degrading to a summary: {e}");
                let top = &candidates[0].chunk;
                AnswerRecord {
                    answer: format!(
                        "I found some relevant information, but I'm having trouble processing it right now. The information seems to be related to {} from {}.",
                        top.category, top.source_filename
                    ),
                    confidence: 0.3,
                    sources: distinct_sources(candidates, FALLBACK_CANDIDATES),
                    context_chunks: candidates.len(),
                }
            }
        }
    }
}

/// First `limit` candidates with distinct filenames, in rank order.
fn distinct_sources(candidates: &[RetrievalResult], limit: usize) -> Vec<AnswerSource> {
    let mut sources: Vec<AnswerSource> = Vec::new();
    for candidate in candidates.iter().take(limit) {
        if sources
            .iter()
            .any(|s| s.filename == candidate.chunk.source_filename)
        {
            continue;
        }
        sources.push(AnswerSource {
            filename: candidate.chunk.source_filename.clone(),
            category: candidate.chunk.category.clone(),
            relevance: candidate.hybrid_score,
        });
    }
    sources
}

/// Cut at a character boundary, appending `...` only when text was dropped.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::chunker::Chunk;
    use crate::retrieval::scoring::SearchType;
    use async_trait::async_trait;
    use campusqa_models::{ExtractedAnswer, LexicalAnswerProvider, ModelError};
    use chrono::Utc;

    struct FailingAnswerProvider;

    #[async_trait]
    impl AnswerProvider for FailingAnswerProvider {
        async fn extract_answer(
            &self,
            _question: &str,
            _context: &str,
        ) -> campusqa_models::Result<ExtractedAnswer> {
            Err(ModelError::answer_extraction("no sentences in context"))
        }

        fn provider_name(&self) -> &str {
            "failing"
        }
    }

    struct FixedAnswerProvider {
        confidence: f32,
    }

    #[async_trait]
    impl AnswerProvider for FixedAnswerProvider {
        async fn extract_answer(
            &self,
            _question: &str,
            context: &str,
        ) -> campusqa_models::Result<ExtractedAnswer> {
            Ok(ExtractedAnswer {
                text: format!("context held {} chars", context.chars().count()),
                confidence: self.confidence,
            })
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    fn candidate(filename: &str, category: &str, text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            chunk: Chunk {
                source_filename: filename.to_string(),
                category: category.to_string(),
                chunk_index: 0,
                text: text.to_string(),
                created_at: Utc::now(),
            },
            semantic_score: Some(score),
            keyword_score: None,
            hybrid_score: score,
            search_type: SearchType::Semantic,
        }
    }

    #[tokio::test]
    async fn test_no_candidates_yields_not_found() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(LexicalAnswerProvider::new()));
        let record = synthesizer.synthesize("what is the fee", &[]).await;
        assert_eq!(record.answer, NOT_FOUND_ANSWER);
        assert_eq!(record.confidence, 0.0);
        assert!(record.sources.is_empty());
        assert_eq!(record.context_chunks, 0);
    }

    #[tokio::test]
    async fn test_extracts_best_sentence_with_sources() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(LexicalAnswerProvider::new()));
        let candidates = vec![
            candidate(
                "fees.txt",
                "fees",
                "The campus has many trees. The tuition fee is eighty thousand rupees per year.",
                0.9,
            ),
            candidate("hostel.txt", "hostel", "Hostel rooms are furnished.", 0.4),
        ];
        let record = synthesizer.synthesize("what is the tuition fee", &candidates).await;

        assert!(record.answer.contains("eighty thousand"));
        assert!(record.confidence > 0.5);
        assert_eq!(record.sources.len(), 2);
        assert_eq!(record.sources[0].filename, "fees.txt");
        assert_eq!(record.sources[0].category, "fees");
        assert!((record.sources[0].relevance - 0.9).abs() < 1e-6);
        assert_eq!(record.context_chunks, 2);
    }

    #[tokio::test]
    async fn test_low_confidence_appends_category_disclaimer() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(FixedAnswerProvider {
            confidence: 0.2,
        }));
        let candidates = vec![
            candidate("fees.txt", "fees", "text one", 0.9),
            candidate("hostel.txt", "hostel", "text two", 0.8),
            candidate("more_fees.txt", "fees", "text three", 0.7),
        ];
        let record = synthesizer.synthesize("question", &candidates).await;

        assert!(
            record
                .answer
                .ends_with("\n\nThis information is related to: fees, hostel")
        );
        assert_eq!(record.confidence, 0.2);
    }

    #[tokio::test]
    async fn test_confident_answer_has_no_disclaimer() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(FixedAnswerProvider {
            confidence: 0.9,
        }));
        let candidates = vec![candidate("fees.txt", "fees", "text", 0.9)];
        let record = synthesizer.synthesize("question", &candidates).await;
        assert!(!record.answer.contains("related to"));
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_summary() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(FailingAnswerProvider));
        let candidates = vec![
            candidate("fees.txt", "fees", "text one", 0.9),
            candidate("hostel.txt", "hostel", "text two", 0.8),
            candidate("placement.txt", "placement", "text three", 0.7),
        ];
        let record = synthesizer.synthesize("question", &candidates).await;

        assert!(record.answer.contains("having trouble processing"));
        assert!(record.answer.contains("fees from fees.txt"));
        assert_eq!(record.confidence, 0.3);
        // Degraded answers cite at most the top two candidates.
        assert_eq!(record.sources.len(), 2);
        assert_eq!(record.sources[1].filename, "hostel.txt");
        assert_eq!(record.context_chunks, 3);
    }

    #[tokio::test]
    async fn test_sources_deduplicate_by_filename() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(FixedAnswerProvider {
            confidence: 0.9,
        }));
        let candidates = vec![
            candidate("fees.txt", "fees", "chunk one", 0.9),
            candidate("fees.txt", "fees", "chunk two", 0.8),
            candidate("hostel.txt", "hostel", "chunk three", 0.7),
        ];
        let record = synthesizer.synthesize("question", &candidates).await;

        assert_eq!(record.sources.len(), 2);
        assert_eq!(record.sources[0].filename, "fees.txt");
        assert_eq!(record.sources[1].filename, "hostel.txt");
    }

    #[tokio::test]
    async fn test_context_is_truncated_at_the_character_limit() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(FixedAnswerProvider {
            confidence: 0.9,
        }))
        .with_max_context_chars(10);
        let candidates = vec![candidate("fees.txt", "fees", "abcdefghijklmnop", 0.9)];
        let record = synthesizer.synthesize("question", &candidates).await;
        // 10 kept characters plus the ellipsis.
        assert_eq!(record.answer, "context held 13 chars");
    }

    #[test]
    fn test_truncate_chars_respects_multibyte_boundaries() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 4), "héll...");
        assert_eq!(truncate_chars(text, 100), text);
    }
}
