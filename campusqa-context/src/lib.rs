//! Text segmentation for the campusqa knowledge base.
//!
//! Turns raw brochure and handbook text into overlapping, sentence-aligned
//! passages sized for embedding and TF-IDF indexing. Deliberately free of
//! model and storage concerns: input is text, output is [`Passage`] records.
//!
//! ## Key Components
//! - [`SentenceSplitter`]: boundary detection on terminal punctuation
//! - [`PassageBuilder`]: greedy passage assembly with a word-count target and
//!   trailing-word overlap between consecutive passages
//!
//! ## Quick Start
//! ```
//! use campusqa_context::PassageBuilder;
//!
//! let builder = PassageBuilder::new("fees.txt", "fees");
//! let passages = builder.get_passages("Tuition is due in July. Hostel fees are separate.");
//! assert_eq!(passages.len(), 1);
//! assert_eq!(passages[0].sequence, 0);
//! ```

pub mod sentence;
pub mod text;

pub use sentence::{SENTENCE_BOUNDARY_PATTERN, SentenceSplitter};
pub use text::{
    DEFAULT_MIN_CHARS, DEFAULT_OVERLAP_WORDS, DEFAULT_TARGET_WORDS, Passage, PassageBuilder,
};
