//! Polynomials over the mwp semiring
//!
//! A polynomial is an ordered list of monomials in absorbed normal form: no
//! zero monomials, no two monomials with the same delta list, and no
//! monomial subsumed by another. Sum and product both re-establish the
//! normal form through a single normalization pass (sort, merge equal delta
//! lists under ⊕, then filter by inclusion).

use crate::monomial::{compare_deltas, Inclusion, Monomial};
use crate::semiring::Scalar;
use serde::{Serialize, Serializer};
use std::fmt;

/// An ordered, absorbed list of monomials. The zero polynomial is the
/// empty list.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Polynomial {
    pub monomials: Vec<Monomial>,
}

impl Polynomial {
    /// The zero polynomial.
    pub fn zero() -> Self {
        Polynomial { monomials: Vec::new() }
    }

    /// The multiplicative unit: scalar `m` with no deltas.
    pub fn unit() -> Self {
        Polynomial::from_scalar(Scalar::Unit)
    }

    /// Single-monomial polynomial with no deltas.
    pub fn from_scalar(scalar: Scalar) -> Self {
        if scalar.is_zero() {
            return Polynomial::zero();
        }
        Polynomial { monomials: vec![Monomial::new(scalar)] }
    }

    /// One scalar per choice value at a single derivation index:
    /// `s₀·δ(0,k) + s₁·δ(1,k) + …`.
    pub fn from_scalars(index: usize, scalars: &[Scalar]) -> Self {
        let monomials = scalars
            .iter()
            .enumerate()
            .map(|(value, &s)| Monomial::with_deltas(s, &[(value, index)]))
            .collect();
        normalize(monomials)
    }

    pub fn is_zero(&self) -> bool {
        self.monomials.is_empty()
    }

    /// True when some monomial carries the ∞ scalar.
    pub fn some_infty(&self) -> bool {
        self.monomials.iter().any(|m| m.scalar.is_infty())
    }

    /// Polynomial sum with absorption.
    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let mut monomials = self.monomials.clone();
        monomials.extend(other.monomials.iter().cloned());
        normalize(monomials)
    }

    /// Polynomial product: all pairwise monomial products, renormalized.
    pub fn times(&self, other: &Polynomial) -> Polynomial {
        let mut monomials = Vec::with_capacity(self.monomials.len() * other.monomials.len());
        for m1 in &self.monomials {
            for m2 in &other.monomials {
                let prod = m1.prod(m2);
                if !prod.scalar.is_zero() {
                    monomials.push(prod);
                }
            }
        }
        normalize(monomials)
    }

    /// Evaluate against a choice vector, short-circuiting once the sum
    /// reaches ∞.
    pub fn eval(&self, choices: &[usize]) -> Scalar {
        let mut result = Scalar::Zero;
        for mono in &self.monomials {
            result = result.sum(mono.eval(choices));
            if result.is_infty() {
                break;
            }
        }
        result
    }
}

/// Restore the normal form: drop zeroes, sort by the delta order, merge
/// equal delta lists with ⊕, then remove every subsumed monomial.
fn normalize(mut monomials: Vec<Monomial>) -> Polynomial {
    monomials.retain(|m| !m.scalar.is_zero());
    monomials.sort_by(|a, b| compare_deltas(&a.deltas, &b.deltas));

    let mut merged: Vec<Monomial> = Vec::with_capacity(monomials.len());
    for mono in monomials {
        match merged.last_mut() {
            Some(last) if last.deltas == mono.deltas => {
                last.scalar = last.scalar.sum(mono.scalar);
            }
            _ => merged.push(mono),
        }
    }

    let mut kept: Vec<Monomial> = Vec::with_capacity(merged.len());
    'next: for mono in merged {
        let mut i = 0;
        while i < kept.len() {
            match kept[i].inclusion(&mono) {
                Inclusion::Subsumes => continue 'next,
                Inclusion::SubsumedBy => {
                    kept.remove(i);
                }
                Inclusion::Neither => i += 1,
            }
        }
        kept.push(mono);
    }
    Polynomial { monomials: kept }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.monomials.is_empty() {
            return write!(f, "{}", Scalar::Zero);
        }
        for (i, mono) in self.monomials.iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            write!(f, "{mono}")?;
        }
        Ok(())
    }
}

impl Serialize for Polynomial {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.monomials.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::Scalar::*;

    fn poly(monos: &[(Scalar, &[(usize, usize)])]) -> Polynomial {
        let mut p = Polynomial::zero();
        for (s, d) in monos {
            p = p.add(&Polynomial { monomials: vec![Monomial::with_deltas(*s, d)] });
        }
        p
    }

    #[test]
    fn test_add_zero_is_identity() {
        let p = Polynomial::from_scalars(0, &[Unit, Poly, Weak]);
        assert_eq!(p.add(&Polynomial::zero()), p);
        assert_eq!(Polynomial::zero().add(&p), p);
    }

    #[test]
    fn test_times_unit_is_identity() {
        let p = Polynomial::from_scalars(1, &[Weak, Weak, Weak]);
        assert_eq!(p.times(&Polynomial::unit()), p);
        assert_eq!(Polynomial::unit().times(&p), p);
    }

    #[test]
    fn test_add_merges_equal_delta_lists() {
        let a = poly(&[(Unit, &[(0, 0)])]);
        let b = poly(&[(Poly, &[(0, 0)])]);
        let sum = a.add(&b);
        assert_eq!(sum.monomials.len(), 1);
        assert_eq!(sum.monomials[0].scalar, Poly);
    }

    #[test]
    fn test_add_absorbs_subsumed_monomials() {
        // p with no deltas subsumes anything weaker under it
        let general = poly(&[(Poly, &[])]);
        let special = poly(&[(Weak, &[(1, 0)]), (Unit, &[(0, 1)])]);
        let sum = general.add(&special);
        assert_eq!(sum, general);
        // and in the lattice sense the sum is idempotent
        assert_eq!(sum.add(&special), sum);
    }

    #[test]
    fn test_add_keeps_incomparable_monomials() {
        let a = poly(&[(Weak, &[(0, 0)])]);
        let b = poly(&[(Poly, &[(1, 0)])]);
        assert_eq!(a.add(&b).monomials.len(), 2);
    }

    #[test]
    fn test_add_commutes_and_associates() {
        let a = Polynomial::from_scalars(0, &[Unit, Poly, Weak]);
        let b = Polynomial::from_scalars(1, &[Poly, Unit, Weak]);
        let c = poly(&[(Weak, &[])]);
        assert_eq!(a.add(&b), b.add(&a));
        assert_eq!(a.add(&b).add(&c), a.add(&b.add(&c)));
    }

    #[test]
    fn test_times_commutes_and_associates() {
        let a = Polynomial::from_scalars(0, &[Unit, Poly, Weak]);
        let b = Polynomial::from_scalars(1, &[Poly, Unit, Weak]);
        let c = poly(&[(Weak, &[(2, 2)])]);
        assert_eq!(a.times(&b), b.times(&a));
        assert_eq!(a.times(&b).times(&c), a.times(&b.times(&c)));
    }

    #[test]
    fn test_times_drops_conflicting_products() {
        let a = poly(&[(Poly, &[(0, 0)])]);
        let b = poly(&[(Poly, &[(1, 0)])]);
        assert!(a.times(&b).is_zero());
    }

    #[test]
    fn test_eval_is_a_homomorphism() {
        let a = Polynomial::from_scalars(0, &[Unit, Poly, Weak]);
        let b = Polynomial::from_scalars(1, &[Poly, Unit, Weak]);
        for v0 in 0..3 {
            for v1 in 0..3 {
                let vector = [v0, v1];
                assert_eq!(
                    a.add(&b).eval(&vector),
                    a.eval(&vector).sum(b.eval(&vector))
                );
                assert_eq!(
                    a.times(&b).eval(&vector),
                    a.eval(&vector).prod(b.eval(&vector))
                );
            }
        }
    }

    #[test]
    fn test_eval_zero_polynomial() {
        assert_eq!(Polynomial::zero().eval(&[0, 1, 2]), Zero);
    }
}
