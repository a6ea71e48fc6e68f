//! Driver pieces for the mwp analyzer
//!
//! The engine in `mwp-core` only consumes the AST vocabulary; this crate
//! provides the surrounding plumbing: a C-subset parser adapter, optional
//! preprocessor invocation and result persistence, shared by the `mwp`
//! binary and the integration tests.

pub mod cpp;
pub mod error;
pub mod file_io;
pub mod parser;

pub use error::ParseError;
