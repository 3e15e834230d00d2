//! Tiled matrix storage
//!
//! A [`TileGrid`] owns the lower triangle of an n×n symmetric matrix as a
//! packed grid of row-major ts×ts tiles inside a single contiguous arena.
//! Tiles above the diagonal are never stored: the factorization only reads
//! and writes coordinates (i, j) with j ≤ i.

use crate::element::Element;
use crate::error::{Error, Result};

/// Lower-triangular grid of square tiles backed by one arena allocation.
///
/// Tile (i, j) with `0 <= j <= i < nt` lives at arena offset
/// `(i * (i + 1) / 2 + j) * ts * ts`. Each slot exclusively owns its tile
/// for the lifetime of the grid; no two slots alias.
#[derive(Debug, Clone)]
pub struct TileGrid<T> {
    arena: Vec<T>,
    n: usize,
    ts: usize,
    nt: usize,
}

/// Arena offset of tile (i, j) in the packed lower-triangular layout.
#[inline]
pub(crate) fn packed_offset(i: usize, j: usize, ts: usize) -> usize {
    (i * (i + 1) / 2 + j) * ts * ts
}

/// Validate matrix/tile geometry, rejecting it before any allocation.
pub fn validate_geometry(n: usize, ts: usize) -> Result<usize> {
    if n == 0 {
        return Err(Error::invalid_configuration(
            n,
            ts,
            "matrix size must be nonzero",
        ));
    }
    if ts == 0 {
        return Err(Error::invalid_configuration(
            n,
            ts,
            "tile size must be nonzero",
        ));
    }
    if n % ts != 0 {
        return Err(Error::invalid_configuration(
            n,
            ts,
            "matrix size must be an exact multiple of the tile size",
        ));
    }
    Ok(n / ts)
}

impl<T: Element> TileGrid<T> {
    /// Create a zero-filled grid for an n×n matrix split into ts×ts tiles.
    ///
    /// Fails with [`Error::InvalidConfiguration`] unless `ts` divides `n`
    /// exactly and both are nonzero.
    pub fn new(n: usize, ts: usize) -> Result<Self> {
        let nt = validate_geometry(n, ts)?;
        let tiles = nt * (nt + 1) / 2;
        Ok(Self {
            arena: vec![T::zero(); tiles * ts * ts],
            n,
            ts,
            nt,
        })
    }

    /// Gather the lower triangle of a dense row-major n×n matrix into tiles.
    ///
    /// Pure data movement; tiles strictly above the diagonal are never
    /// loaded, and the in-tile upper entries of diagonal tiles are copied
    /// but never read by any kernel.
    pub fn from_dense(dense: &[T], n: usize, ts: usize) -> Result<Self> {
        let mut grid = Self::new(n, ts)?;
        if dense.len() != n * n {
            return Err(Error::DenseSizeMismatch {
                expected: n * n,
                got: dense.len(),
            });
        }
        for i in 0..grid.nt {
            for j in 0..=i {
                let tile = grid.tile_mut(i, j);
                for r in 0..ts {
                    let src = (i * ts + r) * n + j * ts;
                    tile[r * ts..(r + 1) * ts].copy_from_slice(&dense[src..src + ts]);
                }
            }
        }
        Ok(grid)
    }

    /// Scatter the tiles back into a dense row-major n×n matrix.
    ///
    /// Only the lower triangle of `dense` is written; the strict upper
    /// triangle keeps whatever the caller supplied.
    pub fn to_dense(&self, dense: &mut [T]) -> Result<()> {
        if dense.len() != self.n * self.n {
            return Err(Error::DenseSizeMismatch {
                expected: self.n * self.n,
                got: dense.len(),
            });
        }
        let ts = self.ts;
        for i in 0..self.nt {
            for j in 0..=i {
                let tile = self.tile(i, j);
                for r in 0..ts {
                    let dst = (i * ts + r) * self.n + j * ts;
                    if i == j {
                        // Diagonal tiles: only the in-tile lower triangle is
                        // meaningful after factorization.
                        dense[dst..dst + r + 1].copy_from_slice(&tile[r * ts..r * ts + r + 1]);
                    } else {
                        dense[dst..dst + ts].copy_from_slice(&tile[r * ts..(r + 1) * ts]);
                    }
                }
            }
        }
        Ok(())
    }

    /// Matrix dimension n
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Tile dimension ts
    #[inline]
    pub fn ts(&self) -> usize {
        self.ts
    }

    /// Tile-grid dimension nt = n / ts
    #[inline]
    pub fn nt(&self) -> usize {
        self.nt
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(j <= i && i < self.nt, "tile ({i}, {j}) outside lower triangle");
        packed_offset(i, j, self.ts)
    }

    /// Borrow tile (i, j). Valid only for `j <= i`.
    #[inline]
    pub fn tile(&self, i: usize, j: usize) -> &[T] {
        let off = self.offset(i, j);
        &self.arena[off..off + self.ts * self.ts]
    }

    /// Mutably borrow tile (i, j). Valid only for `j <= i`.
    #[inline]
    pub fn tile_mut(&mut self, i: usize, j: usize) -> &mut [T] {
        let off = self.offset(i, j);
        &mut self.arena[off..off + self.ts * self.ts]
    }

    /// Arena offset of tile (i, j), for the scheduler's raw tile views.
    #[inline]
    pub(crate) fn tile_offset(&self, i: usize, j: usize) -> usize {
        self.offset(i, j)
    }

    /// Raw base pointer of the arena, for the scheduler's raw tile views.
    #[inline]
    pub(crate) fn arena_mut_ptr(&mut self) -> *mut T {
        self.arena.as_mut_ptr()
    }
}
