//! Tile-level numerical kernels
//!
//! The four operations of the blocked Cholesky algorithm, each acting on
//! one, two, or three row-major ts×ts tiles. All kernels accumulate with
//! the innermost loop over the reduction index, so for a given input the
//! result is bit-for-bit identical no matter how the scheduler interleaves
//! independent tiles.
//!
//! These are the portable reference implementations; the scheduler calls
//! them through plain function seams, so an accelerated backend can slot in
//! behind the same signatures.

use crate::element::Element;
use crate::error::{Error, Result};

/// In-place Cholesky factorization of a diagonal tile: A = L·Lᵗ.
///
/// On return the lower triangle of `a` (including the diagonal) holds L;
/// the strict upper triangle is left untouched. `tile` is the block index
/// of the diagonal tile, used only for error reporting.
///
/// Fails with [`Error::NotPositiveDefinite`] at the first non-positive
/// pivot and [`Error::KernelFailure`] if a pivot turns non-finite.
pub fn factorize_tile<T: Element>(a: &mut [T], ts: usize, tile: usize) -> Result<()> {
    debug_assert_eq!(a.len(), ts * ts);
    for j in 0..ts {
        let mut d = a[j * ts + j];
        for p in 0..j {
            d = d - a[j * ts + p] * a[j * ts + p];
        }
        if !d.is_finite_val() {
            return Err(Error::KernelFailure {
                node: "factorize",
                detail: format!("non-finite pivot {d:?} in diagonal tile {tile}, column {j}"),
            });
        }
        if d <= T::zero() {
            return Err(Error::NotPositiveDefinite { tile, column: j });
        }
        let ljj = d.sqrt_val();
        a[j * ts + j] = ljj;

        for i in (j + 1)..ts {
            let mut s = a[i * ts + j];
            for p in 0..j {
                s = s - a[i * ts + p] * a[j * ts + p];
            }
            a[i * ts + j] = s / ljj;
        }
    }
    Ok(())
}

/// Triangular solve from the right: B := B·L⁻ᵗ.
///
/// `l` is a completed diagonal factor (lower triangular, produced by
/// [`factorize_tile`]); the scheduler guarantees it is final before any
/// solve reads it, so validity is not re-checked here. Each row of `b` is
/// solved independently by forward substitution.
pub fn triangular_solve<T: Element>(l: &[T], b: &mut [T], ts: usize) {
    debug_assert_eq!(l.len(), ts * ts);
    debug_assert_eq!(b.len(), ts * ts);
    for r in 0..ts {
        let row = &mut b[r * ts..(r + 1) * ts];
        for j in 0..ts {
            let mut s = row[j];
            for p in 0..j {
                s = s - row[p] * l[j * ts + p];
            }
            row[j] = s / l[j * ts + j];
        }
    }
}

/// Symmetric rank-ts update of a diagonal tile: B := B − A·Aᵗ.
///
/// Only the lower triangle of `b` is updated; the strict upper triangle is
/// left untouched (it is never read downstream).
pub fn update_symmetric<T: Element>(a: &[T], b: &mut [T], ts: usize) {
    debug_assert_eq!(a.len(), ts * ts);
    debug_assert_eq!(b.len(), ts * ts);
    for i in 0..ts {
        for j in 0..=i {
            let mut s = b[i * ts + j];
            for p in 0..ts {
                s = s - a[i * ts + p] * a[j * ts + p];
            }
            b[i * ts + j] = s;
        }
    }
}

/// General update of an off-diagonal tile: C := C − A·Bᵗ, full tile.
pub fn update_general<T: Element>(a: &[T], b: &[T], c: &mut [T], ts: usize) {
    debug_assert_eq!(a.len(), ts * ts);
    debug_assert_eq!(b.len(), ts * ts);
    debug_assert_eq!(c.len(), ts * ts);
    for i in 0..ts {
        for j in 0..ts {
            let mut s = c[i * ts + j];
            for p in 0..ts {
                s = s - a[i * ts + p] * b[j * ts + p];
            }
            c[i * ts + j] = s;
        }
    }
}
