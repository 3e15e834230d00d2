//! Common test utilities
#![allow(dead_code)]

use cholr::prelude::*;
use cholr::verify;

/// Generate an SPD matrix, factorize it tiled, and return (input, output)
/// as dense row-major buffers. The output's strict upper triangle carries
/// the input values, untouched by `to_dense`.
pub fn factorize_dense<T: Element>(
    n: usize,
    ts: usize,
    seed: u64,
    parallelism: Parallelism,
) -> Result<(Vec<T>, Vec<T>)> {
    let a = verify::generate_spd::<T>(n, seed);
    let mut grid = TileGrid::from_dense(&a, n, ts)?;
    factorize(&mut grid, parallelism)?;
    let mut l = a.clone();
    grid.to_dense(&mut l)?;
    Ok((a, l))
}

/// Assert two f64 slices are identical bit for bit.
pub fn assert_bits_equal_f64(a: &[f64], b: &[f64], msg: &str) {
    assert_eq!(a.len(), b.len(), "{msg}: length mismatch");
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert_eq!(
            x.to_bits(),
            y.to_bits(),
            "{msg}: element {i} differs: {x} vs {y}"
        );
    }
}
