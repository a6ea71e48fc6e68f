//! Relations: variable-labeled matrices of polynomials
//!
//! Cell `(row x, column y)` holds the polynomial contribution of the input
//! value of `x` to the output value of `y`. Binary operations align the two
//! axes first by taking the ordered union of the variable lists and padding
//! each matrix with identity rows and columns for the variables it lacks.

use crate::choice::Choices;
use crate::delta_graph::{Clause, DeltaGraph};
use crate::matrix::{self, Matrix, ScalarMatrix};
use crate::polynomial::Polynomial;
use crate::semiring::Scalar;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub variables: Vec<String>,
    pub matrix: Matrix,
}

/// A relation whose cells were evaluated at a fixed choice vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScalarRelation {
    pub variables: Vec<String>,
    pub matrix: ScalarMatrix,
}

impl Relation {
    /// Identity relation over the given variables.
    pub fn identity(variables: &[String]) -> Self {
        Relation {
            variables: variables.to_vec(),
            matrix: matrix::identity(variables.len()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    fn var_index(&self, variable: &str) -> usize {
        self.variables
            .iter()
            .position(|v| v == variable)
            .unwrap_or_else(|| panic!("variable {variable} is not on the relation axis"))
    }

    /// Identity over this axis with the column of `variable` replaced by
    /// the given vector (one polynomial per row, in axis order).
    pub fn replace_column(&self, vector: &[Polynomial], variable: &str) -> Relation {
        debug_assert_eq!(vector.len(), self.variables.len());
        let j = self.var_index(variable);
        let mut out = Relation::identity(&self.variables);
        for (i, poly) in vector.iter().enumerate() {
            out.matrix[i][j] = poly.clone();
        }
        out
    }

    /// Ordered union of two axes: self's variables first, then the
    /// variables only the other relation knows.
    fn union_axis(&self, other: &Relation) -> Vec<String> {
        let mut axis = self.variables.clone();
        for v in &other.variables {
            if !axis.contains(v) {
                axis.push(v.clone());
            }
        }
        axis
    }

    /// Extend this relation to a larger axis, acting as the identity on
    /// every variable it does not mention.
    fn extended(&self, axis: &[String]) -> Relation {
        if axis == self.variables.as_slice() {
            return self.clone();
        }
        let positions: Vec<Option<usize>> = axis
            .iter()
            .map(|v| self.variables.iter().position(|w| w == v))
            .collect();
        let n = axis.len();
        let mut out = matrix::zero(n);
        for i in 0..n {
            for j in 0..n {
                out[i][j] = match (positions[i], positions[j]) {
                    (Some(oi), Some(oj)) => self.matrix[oi][oj].clone(),
                    _ if i == j => Polynomial::unit(),
                    _ => Polynomial::zero(),
                };
            }
        }
        Relation { variables: axis.to_vec(), matrix: out }
    }

    /// Relation composition over the aligned axes.
    pub fn composition(&self, other: &Relation) -> Relation {
        let axis = self.union_axis(other);
        let left = self.extended(&axis);
        let right = other.extended(&axis);
        Relation {
            matrix: matrix::prod(&left.matrix, &right.matrix),
            variables: axis,
        }
    }

    /// Elementwise sum over the aligned axes.
    pub fn sum(&self, other: &Relation) -> Relation {
        let axis = self.union_axis(other);
        let left = self.extended(&axis);
        let right = other.extended(&axis);
        Relation {
            matrix: matrix::sum(&left.matrix, &right.matrix),
            variables: axis,
        }
    }

    pub fn equal(&self, other: &Relation) -> bool {
        self.variables == other.variables && matrix::equal(&self.matrix, &other.matrix)
    }

    /// Star of the relation: `I ⊕ M ⊕ M² ⊕ …`, saturated. The semiring has
    /// finite height and the delta-index set is finite, so the sequence
    /// stabilizes.
    pub fn fixpoint(&self) -> Relation {
        debug!("computing fixpoint over {} variables", self.variables.len());
        let mut fix = Relation::identity(&self.variables);
        let mut current = Relation::identity(&self.variables);
        loop {
            let previous = fix.clone();
            current = current.composition(self);
            fix = fix.sum(&current);
            if fix.equal(&previous) {
                debug!("fixpoint reached");
                return fix;
            }
        }
    }

    /// Side condition of the while rule: a self-dependence stronger than
    /// `m` cannot survive iteration. Offending diagonal monomials become ∞
    /// and their delta conjunction is recorded as an infinity clause.
    pub fn while_correction(&mut self, dg: &mut DeltaGraph) {
        for i in 0..self.variables.len() {
            for mono in &mut self.matrix[i][i].monomials {
                if matches!(mono.scalar, Scalar::Weak | Scalar::Poly) {
                    dg.insert(&mono.deltas);
                    mono.scalar = Scalar::Infty;
                }
            }
        }
    }

    /// Side condition of the loop rule: in addition to the while-style
    /// diagonal check, the body must not feed polynomial growth into the
    /// controlling variable.
    pub fn loop_correction(&mut self, controller: &str, dg: &mut DeltaGraph) {
        self.while_correction(dg);
        let j = self.var_index(controller);
        for i in 0..self.variables.len() {
            for mono in &mut self.matrix[i][j].monomials {
                if mono.scalar == Scalar::Poly {
                    dg.insert(&mono.deltas);
                    mono.scalar = Scalar::Infty;
                }
            }
        }
    }

    /// Evaluate every cell at the given choice vector.
    pub fn apply_choice(&self, choices: &[usize]) -> ScalarRelation {
        ScalarRelation {
            variables: self.variables.clone(),
            matrix: self
                .matrix
                .iter()
                .map(|row| row.iter().map(|p| p.eval(choices)).collect())
                .collect(),
        }
    }

    /// Delta conjunctions that evaluate some cell to ∞.
    fn infinity_clauses(&self) -> BTreeSet<Clause> {
        let mut clauses = BTreeSet::new();
        for row in &self.matrix {
            for poly in row {
                for mono in &poly.monomials {
                    if mono.scalar.is_infty() {
                        clauses.insert(mono.deltas.clone());
                    }
                }
            }
        }
        clauses
    }

    /// Choice vectors over `domain` and indices `0..index` that keep every
    /// cell below ∞.
    pub fn eval(&self, domain: &[usize], index: usize) -> Choices {
        Choices::generate(domain, index, &self.infinity_clauses())
    }

    /// Per-variable choice sets: for each output variable, the choices
    /// keeping its column free of ∞ and of every scalar listed in
    /// `floors`.
    pub fn var_eval(
        &self,
        domain: &[usize],
        index: usize,
        floors: &[Scalar],
    ) -> BTreeMap<String, Choices> {
        let mut result = BTreeMap::new();
        for (j, var) in self.variables.iter().enumerate() {
            let mut clauses = BTreeSet::new();
            for row in &self.matrix {
                for mono in &row[j].monomials {
                    if mono.scalar.is_infty() || floors.contains(&mono.scalar) {
                        clauses.insert(mono.deltas.clone());
                    }
                }
            }
            result.insert(var.clone(), Choices::generate(domain, index, &clauses));
        }
        result
    }

    /// Input variables whose cell toward each failing output carries an ∞
    /// monomial, as (input, output) pairs.
    pub fn infty_pairs(&self, failing: &[String]) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for target in failing {
            let j = self.var_index(target);
            for (i, row) in self.matrix.iter().enumerate() {
                if row[j].some_infty() {
                    pairs.push((self.variables[i].clone(), target.clone()));
                }
            }
        }
        pairs
    }
}

impl ScalarRelation {
    /// True when any cell evaluated to ∞.
    pub fn some_infty(&self) -> bool {
        self.matrix.iter().flatten().any(|s| s.is_infty())
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.variables.iter().map(|v| v.len()).max().unwrap_or(1);
        for (i, var) in self.variables.iter().enumerate() {
            write!(f, "{var:>width$} |")?;
            for cell in &self.matrix[i] {
                write!(f, "  {cell}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ScalarRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.variables.iter().map(|v| v.len()).max().unwrap_or(1);
        for (i, var) in self.variables.iter().enumerate() {
            write!(f, "{var:>width$} |")?;
            for cell in &self.matrix[i] {
                write!(f, "  {cell}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::Scalar::*;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// x = y over axis [x, y]: x's column becomes (o, m).
    fn assign_x_from_y() -> Relation {
        Relation::identity(&vars(&["x", "y"]))
            .replace_column(&[Polynomial::zero(), Polynomial::unit()], "x")
    }

    #[test]
    fn test_identity_is_composition_unit() {
        let r = assign_x_from_y();
        let id = Relation::identity(&vars(&["x", "y"]));
        assert!(r.composition(&id).equal(&r));
        assert!(id.composition(&r).equal(&r));
    }

    #[test]
    fn test_composition_is_associative() {
        let a = assign_x_from_y();
        let b = Relation::identity(&vars(&["y", "z"]))
            .replace_column(&[Polynomial::zero(), Polynomial::unit()], "y");
        let c = Relation::identity(&vars(&["z"]));
        let left = a.composition(&b).composition(&c);
        let right = a.composition(&b.composition(&c));
        assert!(left.equal(&right));
    }

    #[test]
    fn test_composition_aligns_disjoint_axes() {
        let a = Relation::identity(&vars(&["x"]));
        let b = assign_x_from_y();
        let composed = a.composition(&b);
        assert_eq!(composed.variables, vars(&["x", "y"]));
        assert!(composed.equal(&b));
    }

    #[test]
    fn test_chained_assignments_compose() {
        // x = y then y = x: y's final value comes from the original y.
        let first = assign_x_from_y();
        let second = Relation::identity(&vars(&["x", "y"]))
            .replace_column(&[Polynomial::unit(), Polynomial::zero()], "y");
        let composed = first.composition(&second);
        assert_eq!(composed.matrix[1][0], Polynomial::unit()); // y -> x
        assert_eq!(composed.matrix[1][1], Polynomial::unit()); // y -> y
        assert!(composed.matrix[0][0].is_zero()); // x overwritten
        assert!(composed.matrix[0][1].is_zero());
    }

    #[test]
    fn test_fixpoint_is_a_fixed_point() {
        let col = [
            Polynomial::from_scalars(0, &[Unit, Poly, Weak]),
            Polynomial::from_scalars(0, &[Poly, Unit, Weak]),
        ];
        let r = Relation::identity(&vars(&["x", "y"])).replace_column(&col, "x");
        let star = r.fixpoint();
        assert!(star.composition(&star).equal(&star));
        // the star dominates both I and M
        assert!(star.sum(&Relation::identity(&vars(&["x", "y"]))).equal(&star));
        assert!(star.sum(&r).equal(&star));
    }

    #[test]
    fn test_while_correction_records_clauses() {
        let col = [
            Polynomial::from_scalars(0, &[Weak, Weak, Weak]),
            Polynomial::from_scalars(0, &[Weak, Weak, Weak]),
        ];
        let mut r = Relation::identity(&vars(&["x", "y"]))
            .replace_column(&col, "x")
            .fixpoint();
        let mut dg = DeltaGraph::new(&[0, 1, 2]);
        r.while_correction(&mut dg);
        // every diagonal w at index 0 became an infinity clause, and the
        // three values cover the whole domain
        dg.fusion();
        assert!(dg.unavoidable());
        assert!(r.matrix[0][0].some_infty());
    }

    #[test]
    fn test_loop_correction_forbids_poly_into_controller() {
        let col = [
            Polynomial::zero(),
            Polynomial::from_scalar(Poly),
        ];
        let mut r = Relation::identity(&vars(&["i", "y"])).replace_column(&col, "i");
        let mut dg = DeltaGraph::new(&[0, 1, 2]);
        r.loop_correction("i", &mut dg);
        assert!(r.matrix[1][0].some_infty());
        dg.fusion();
        assert!(dg.unavoidable()); // the p monomial had no deltas
    }

    #[test]
    fn test_eval_and_apply_choice_agree() {
        let col = [
            Polynomial::from_scalars(0, &[Infty, Unit, Unit]),
            Polynomial::unit(),
        ];
        let r = Relation::identity(&vars(&["x", "y"])).replace_column(&col, "x");
        let choices = r.eval(&[0, 1, 2], 1);
        assert!(!choices.infinite());
        let first = choices.first().expect("finite choices have a witness");
        assert!(!r.apply_choice(&first).some_infty());
        // choice 0 at index 0 hits the ∞ monomial
        assert!(r.apply_choice(&[0]).some_infty());
    }

    #[test]
    fn test_infty_pairs_lists_sources() {
        let col = [
            Polynomial::from_scalar(Infty),
            Polynomial::unit(),
        ];
        let r = Relation::identity(&vars(&["x", "y"])).replace_column(&col, "x");
        let pairs = r.infty_pairs(&vars(&["x"]));
        assert_eq!(pairs, vec![("x".to_string(), "x".to_string())]);
    }
}
