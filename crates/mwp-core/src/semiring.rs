//! The mwp scalar semiring
//!
//! Five scalars ordered by growth strength: 0 < m < w < p < ∞. Sum is the
//! join (max); product is the join except that 0 annihilates and ∞ absorbs
//! every nonzero operand.

use serde::{Serialize, Serializer};
use std::fmt;

/// A growth-class scalar of the mwp semiring.
///
/// The derived `Ord` follows declaration order, which is the strength
/// order used by both semiring operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    /// No contribution (also written `o`): the value is overwritten.
    Zero,
    /// Maximum of inputs; the multiplicative identity.
    Unit,
    /// Weak polynomial contribution.
    Weak,
    /// Polynomial contribution.
    Poly,
    /// No polynomial bound exists.
    Infty,
}

impl Scalar {
    /// Semiring sum: the stronger of the two scalars.
    pub fn sum(self, other: Scalar) -> Scalar {
        self.max(other)
    }

    /// Semiring product: 0 annihilates, ∞ absorbs nonzero, otherwise max.
    pub fn prod(self, other: Scalar) -> Scalar {
        if self == Scalar::Zero || other == Scalar::Zero {
            return Scalar::Zero;
        }
        self.max(other)
    }

    pub fn is_zero(self) -> bool {
        self == Scalar::Zero
    }

    pub fn is_infty(self) -> bool {
        self == Scalar::Infty
    }

    /// One-letter symbol used in logs and serialized results.
    pub fn symbol(self) -> &'static str {
        match self {
            Scalar::Zero => "o",
            Scalar::Unit => "m",
            Scalar::Weak => "w",
            Scalar::Poly => "p",
            Scalar::Infty => "i",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::Scalar::*;

    #[test]
    fn test_sum_is_join() {
        assert_eq!(Zero.sum(Unit), Unit);
        assert_eq!(Unit.sum(Weak), Weak);
        assert_eq!(Weak.sum(Poly), Poly);
        assert_eq!(Poly.sum(Infty), Infty);
        assert_eq!(Poly.sum(Poly), Poly);
    }

    #[test]
    fn test_zero_annihilates_product() {
        for s in [Zero, Unit, Weak, Poly, Infty] {
            assert_eq!(Zero.prod(s), Zero);
            assert_eq!(s.prod(Zero), Zero);
        }
    }

    #[test]
    fn test_infty_absorbs_nonzero() {
        for s in [Unit, Weak, Poly, Infty] {
            assert_eq!(Infty.prod(s), Infty);
            assert_eq!(s.prod(Infty), Infty);
        }
    }

    #[test]
    fn test_unit_is_multiplicative_identity() {
        for s in [Zero, Unit, Weak, Poly, Infty] {
            assert_eq!(Unit.prod(s), s);
            assert_eq!(s.prod(Unit), s);
        }
    }

    #[test]
    fn test_product_commutes() {
        let all = [Zero, Unit, Weak, Poly, Infty];
        for a in all {
            for b in all {
                assert_eq!(a.prod(b), b.prod(a));
                assert_eq!(a.sum(b), b.sum(a));
            }
        }
    }
}
