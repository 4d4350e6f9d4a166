//! Core library: corpus loading, fingerprints, TF-IDF vector space, ranking
//! and match explanations.

pub mod cache;
pub mod config;
pub mod corpus;
pub mod error;
pub mod explain;
pub mod extractor;
pub mod fingerprint;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod scanner;
pub mod similarity;
pub mod text;
pub mod vectorspace;

pub use error::{MatchError, Result};
