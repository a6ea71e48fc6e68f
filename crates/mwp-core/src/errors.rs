//! Error types for the analysis core

use thiserror::Error;

/// Function-level analysis errors. Algebraic operations are total and never
/// fail; only the pre-pass can reject a function.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("function {name} uses unsupported syntax: {construct}")]
    NotAnalyzable { name: String, construct: String },
}
