//! Monomials: a scalar times an ordered product of deltas
//!
//! A delta `δ(v, i)` asserts that the derivation choice at index `i` equals
//! `v`. Monomials keep their deltas sorted by index with distinct indices;
//! inserting a delta that contradicts an existing one at the same index
//! collapses the monomial to the scalar zero.

use crate::semiring::Scalar;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A `(value, index)` pair: the choice at `index` equals `value`.
pub type Delta = (usize, usize);

/// Outcome of comparing two monomials for absorption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inclusion {
    /// Self subsumes the other monomial (the other is redundant).
    Subsumes,
    /// Self is subsumed by the other monomial.
    SubsumedBy,
    /// Neither subsumes the other.
    Neither,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Monomial {
    pub scalar: Scalar,
    pub deltas: Vec<Delta>,
}

impl Monomial {
    /// Monomial with no deltas.
    pub fn new(scalar: Scalar) -> Self {
        Monomial { scalar, deltas: Vec::new() }
    }

    /// Monomial with the given deltas, normalized through conflict-aware
    /// insertion. A conflicting pair of deltas yields the zero monomial.
    pub fn with_deltas(scalar: Scalar, deltas: &[Delta]) -> Self {
        let mut mono = Monomial::new(scalar);
        for &delta in deltas {
            mono.insert_delta(delta);
            if mono.scalar.is_zero() {
                break;
            }
        }
        mono
    }

    /// Insert one delta, keeping the list sorted by index. A different
    /// value at an occupied index zeroes the monomial.
    pub fn insert_delta(&mut self, delta: Delta) {
        if self.scalar.is_zero() {
            return;
        }
        let (value, index) = delta;
        let pos = self.deltas.partition_point(|&(_, i)| i < index);
        match self.deltas.get(pos) {
            Some(&(v, i)) if i == index => {
                if v != value {
                    self.scalar = Scalar::Zero;
                    self.deltas.clear();
                }
            }
            _ => self.deltas.insert(pos, delta),
        }
    }

    /// Product of two monomials: scalars multiply in the semiring, delta
    /// lists merge by index. Conflicting deltas produce the zero monomial.
    pub fn prod(&self, other: &Monomial) -> Monomial {
        let scalar = self.scalar.prod(other.scalar);
        if scalar.is_zero() {
            return Monomial::new(Scalar::Zero);
        }
        let mut result = Monomial { scalar, deltas: self.deltas.clone() };
        for &delta in &other.deltas {
            result.insert_delta(delta);
            if result.scalar.is_zero() {
                break;
            }
        }
        result
    }

    /// Evaluate against a choice vector: the scalar if every delta matches
    /// the vector at its index, zero otherwise.
    pub fn eval(&self, choices: &[usize]) -> Scalar {
        for &(value, index) in &self.deltas {
            if choices.get(index) != Some(&value) {
                return Scalar::Zero;
            }
        }
        self.scalar
    }

    /// Absorption comparison per the inclusion order: `a` subsumes `b` when
    /// `a`'s delta set is a subset of `b`'s and `a`'s scalar is at least as
    /// strong. Equal monomials count as `Subsumes`.
    pub fn inclusion(&self, other: &Monomial) -> Inclusion {
        let fwd = is_subset(&self.deltas, &other.deltas) && self.scalar >= other.scalar;
        if fwd {
            return Inclusion::Subsumes;
        }
        let bwd = is_subset(&other.deltas, &self.deltas) && other.scalar >= self.scalar;
        if bwd {
            return Inclusion::SubsumedBy;
        }
        Inclusion::Neither
    }
}

/// Subset test on index-sorted delta lists.
fn is_subset(small: &[Delta], large: &[Delta]) -> bool {
    small.iter().all(|d| large.contains(d))
}

/// Total order on delta lists: at the first differing position, the delta
/// with the smaller index wins, ties broken by the smaller value; on a
/// common prefix the shorter list is smaller.
pub fn compare_deltas(a: &[Delta], b: &[Delta]) -> Ordering {
    for (&(v1, i1), &(v2, i2)) in a.iter().zip(b.iter()) {
        if (v1, i1) != (v2, i2) {
            return match i1.cmp(&i2) {
                Ordering::Equal => v1.cmp(&v2),
                other => other,
            };
        }
    }
    a.len().cmp(&b.len())
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scalar)?;
        for (value, index) in &self.deltas {
            write!(f, ".d({value},{index})")?;
        }
        Ok(())
    }
}

impl Serialize for Monomial {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Monomial", 2)?;
        st.serialize_field("scalar", &self.scalar)?;
        st.serialize_field("deltas", &self.deltas)?;
        st.end()
    }
}
