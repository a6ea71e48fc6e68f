//! mwp-flow analysis engine
//!
//! Decides whether each variable of an imperative program admits a
//! polynomial growth bound in the initial values of the inputs, and
//! constructs an explicit bound when one exists. The calculus is
//! parametric over derivation choices: every non-deterministic rule
//! instance is encoded symbolically as a delta, and the resulting choice
//! space is searched for a witness avoiding ∞.
//!
//! Layering, leaves first: the scalar [`semiring`], [`monomial`]s and
//! [`polynomial`]s over deltas, variable-labeled [`relation`] matrices and
//! their non-deterministic [`relation_list`] bags, the [`delta_graph`] of
//! infinity witnesses, the [`choice`] space, the syntax-directed
//! [`analysis`] over the [`ast`] vocabulary, [`bound`] reconstruction and
//! [`result`] aggregation.

pub mod analysis;
pub mod ast;
pub mod bound;
pub mod choice;
pub mod delta_graph;
pub mod errors;
pub mod matrix;
pub mod monomial;
pub mod polynomial;
pub mod relation;
pub mod relation_list;
pub mod result;
pub mod semiring;

pub use analysis::{analyze_function, analyze_loop, run, run_loops, CHOICE_DOMAIN};
pub use bound::{Bound, MwpBound};
pub use choice::Choices;
pub use delta_graph::DeltaGraph;
pub use errors::AnalysisError;
pub use monomial::{Delta, Monomial};
pub use polynomial::Polynomial;
pub use relation::{Relation, ScalarRelation};
pub use relation_list::RelationList;
pub use result::{AnalysisResult, FuncResult, LoopResult};
pub use semiring::Scalar;
