//! Square matrices of polynomials
//!
//! Plain grid operations; variable bookkeeping lives in [`crate::relation`].

use crate::polynomial::Polynomial;
use crate::semiring::Scalar;

/// A square grid of polynomials, row major.
pub type Matrix = Vec<Vec<Polynomial>>;

/// A square grid of scalars, produced by applying a choice vector.
pub type ScalarMatrix = Vec<Vec<Scalar>>;

/// Matrix with `m` on the diagonal and zero elsewhere.
pub fn identity(size: usize) -> Matrix {
    (0..size)
        .map(|i| {
            (0..size)
                .map(|j| if i == j { Polynomial::unit() } else { Polynomial::zero() })
                .collect()
        })
        .collect()
}

/// Matrix filled with the zero polynomial.
pub fn zero(size: usize) -> Matrix {
    vec![vec![Polynomial::zero(); size]; size]
}

/// Elementwise sum. Panics on mismatched sizes: callers align axes first.
pub fn sum(a: &Matrix, b: &Matrix) -> Matrix {
    assert_eq!(a.len(), b.len(), "matrix sum requires aligned operands");
    a.iter()
        .zip(b.iter())
        .map(|(ra, rb)| ra.iter().zip(rb.iter()).map(|(x, y)| x.add(y)).collect())
        .collect()
}

/// Matrix product over the polynomial algebra:
/// `out[i][j] = Σₖ a[i][k] · b[k][j]`.
pub fn prod(a: &Matrix, b: &Matrix) -> Matrix {
    let n = a.len();
    assert_eq!(n, b.len(), "matrix product requires aligned operands");
    let mut out = zero(n);
    for i in 0..n {
        for j in 0..n {
            let mut cell = Polynomial::zero();
            for k in 0..n {
                let term = a[i][k].times(&b[k][j]);
                if !term.is_zero() {
                    cell = cell.add(&term);
                }
            }
            out[i][j] = cell;
        }
    }
    out
}

pub fn equal(a: &Matrix, b: &Matrix) -> bool {
    a == b
}
