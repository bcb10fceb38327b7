//! Candidate and vacancy profiles consumed by the scoring engine.

pub mod extractor;
pub mod handlers;
pub mod models;
pub mod prompts;

pub use extractor::ProfileExtractor;
pub use models::{Candidate, Vacancy};
