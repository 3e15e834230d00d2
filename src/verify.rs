//! Driver-side helpers: test-matrix generation and residual checking
//!
//! Neither function participates in the factorization itself; they exist
//! for the CLI driver and the test suite. The residual check follows the
//! classic LAPACK testing recipe: ‖L·Lᵗ − A‖∞ / (‖A‖∞ · n · ε) must stay
//! below a small constant for a healthy factorization.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::element::Element;

/// Acceptance threshold for the scaled residual ratio.
pub const RESIDUAL_THRESHOLD: f64 = 60.0;

/// Generate a dense row-major symmetric positive-definite n×n matrix.
///
/// Random entries in (0, 1) are symmetrized (A + Aᵗ) and `n` is added to
/// the diagonal, which makes the matrix strictly diagonally dominant and
/// therefore positive definite. Deterministic for a given seed.
pub fn generate_spd<T: Element>(n: usize, seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut m: Vec<T> = (0..n * n)
        .map(|_| T::from_f64(rng.random::<f64>()))
        .collect();
    for i in 0..n {
        for j in 0..=i {
            let s = m[i * n + j] + m[j * n + i];
            m[i * n + j] = s;
            m[j * n + i] = s;
        }
    }
    for d in 0..n {
        m[d * n + d] = m[d * n + d] + T::from_f64(n as f64);
    }
    m
}

/// Scaled residual of a factorization: ‖L·Lᵗ − A‖∞ / (‖A‖∞ · n · ε).
///
/// `original` is the matrix that was factorized, `factored` the dense
/// result whose lower triangle holds L; both are row-major n×n. Only the
/// lower triangles are read. The residual is accumulated in f64 so the
/// check itself adds no precision loss; ε is the machine epsilon of `T`.
pub fn residual_ratio<T: Element>(original: &[T], factored: &[T], n: usize) -> f64 {
    assert_eq!(original.len(), n * n);
    assert_eq!(factored.len(), n * n);

    // Row sums of |L·Lᵗ − A| and |A|, using symmetry to read lower parts only.
    let mut rnorm = 0.0f64;
    let mut anorm = 0.0f64;
    for i in 0..n {
        let mut rrow = 0.0f64;
        let mut arow = 0.0f64;
        for j in 0..n {
            let mut llt = 0.0f64;
            for p in 0..=i.min(j) {
                llt += factored[i * n + p].to_f64() * factored[j * n + p].to_f64();
            }
            let a = if j <= i {
                original[i * n + j].to_f64()
            } else {
                original[j * n + i].to_f64()
            };
            rrow += (llt - a).abs();
            arow += a.abs();
        }
        // f64::max ignores NaN, which would let a NaN factor slip through
        // as ratio 0; surface it instead.
        if rrow.is_nan() {
            return f64::NAN;
        }
        rnorm = rnorm.max(rrow);
        anorm = anorm.max(arow);
    }

    rnorm / (anorm * n as f64 * T::epsilon_val())
}

/// True when the factorization passes the residual check.
///
/// A non-finite ratio (NaN or infinity in the factor) counts as failure.
pub fn check_factorization<T: Element>(original: &[T], factored: &[T], n: usize) -> bool {
    let ratio = residual_ratio::<T>(original, factored, n);
    ratio.is_finite() && ratio <= RESIDUAL_THRESHOLD
}
