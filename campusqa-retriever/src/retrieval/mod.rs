//! Hybrid retrieval pipeline: corpus loading through answer synthesis.
//!
//! The modules here follow the data path. [`corpus`] loads and sanitizes
//! source documents, [`chunker`] cuts them into sentence-aligned chunks,
//! [`vector_index`] and [`keyword_index`] score them on the dense and sparse
//! legs, [`scoring`] fuses the two legs, [`search_index`] holds one built
//! generation, [`snapshot`] persists it, [`synthesis`] turns candidates into
//! answers, and [`engine`] orchestrates the lot.

pub mod chunker;
pub mod corpus;
pub mod engine;
pub mod keyword_index;
pub mod scoring;
pub mod search_index;
pub mod snapshot;
pub mod synthesis;
pub mod vector_index;
