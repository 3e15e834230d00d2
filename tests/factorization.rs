//! Integration tests for the tiled factorization engine

mod common;

use cholr::prelude::*;
use cholr::verify;
use common::{assert_bits_equal_f64, factorize_dense};

#[test]
fn test_residual_f64_multiple_shapes() {
    for &(n, ts) in &[(32, 8), (48, 16), (64, 32), (40, 8)] {
        let (a, l) = factorize_dense::<f64>(n, ts, 11, Parallelism::None).unwrap();
        let ratio = verify::residual_ratio::<f64>(&a, &l, n);
        assert!(
            ratio.is_finite() && ratio <= verify::RESIDUAL_THRESHOLD,
            "n={n} ts={ts}: residual ratio {ratio}"
        );
    }
}

#[test]
fn test_residual_f32() {
    let n = 64;
    let (a, l) = factorize_dense::<f32>(n, 16, 5, Parallelism::None).unwrap();
    assert!(verify::check_factorization::<f32>(&a, &l, n));
}

#[test]
fn test_residual_parallel() {
    let n = 96;
    let (a, l) = factorize_dense::<f64>(n, 16, 3, Parallelism::Rayon(4)).unwrap();
    assert!(verify::check_factorization::<f64>(&a, &l, n));
}

#[test]
fn test_worker_count_does_not_change_bits() {
    let n = 96;
    let ts = 16;
    let (_, sequential) = factorize_dense::<f64>(n, ts, 9, Parallelism::None).unwrap();
    for workers in [2, 4] {
        let (_, parallel) = factorize_dense::<f64>(n, ts, 9, Parallelism::Rayon(workers)).unwrap();
        assert_bits_equal_f64(
            &sequential,
            &parallel,
            &format!("sequential vs {workers} workers"),
        );
    }
}

#[test]
fn test_ambient_pool_matches_sequential_bits() {
    let n = 64;
    let ts = 8;
    let (_, sequential) = factorize_dense::<f64>(n, ts, 21, Parallelism::None).unwrap();
    let (_, ambient) = factorize_dense::<f64>(n, ts, 21, Parallelism::Rayon(0)).unwrap();
    assert_bits_equal_f64(&sequential, &ambient, "sequential vs ambient pool");
}

#[test]
fn test_single_tile_degenerate() {
    // ts = n: the schedule is exactly one factorize node.
    let n = 24;
    let (a, l) = factorize_dense::<f64>(n, n, 2, Parallelism::None).unwrap();
    assert!(verify::check_factorization::<f64>(&a, &l, n));
}

#[test]
fn test_upper_triangle_passes_through_untouched() {
    let n = 32;
    let (a, l) = factorize_dense::<f64>(n, 8, 13, Parallelism::None).unwrap();
    for i in 0..n {
        for j in (i + 1)..n {
            assert_eq!(l[i * n + j], a[i * n + j], "upper entry ({i}, {j}) changed");
        }
    }
}

#[test]
fn test_invalid_configuration_is_rejected_up_front() {
    let a = verify::generate_spd::<f64>(30, 0);
    let err = TileGrid::from_dense(&a, 30, 8).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
}

#[test]
fn test_not_positive_definite_reported_with_location() {
    let n = 8;
    let ts = 4;
    let mut a = verify::generate_spd::<f64>(n, 17);
    // Make the second diagonal tile indefinite.
    a[5 * n + 5] = -1000.0;
    let mut grid = TileGrid::from_dense(&a, n, ts).unwrap();
    let err = factorize(&mut grid, Parallelism::None).unwrap_err();
    match err {
        Error::NotPositiveDefinite { tile, column } => {
            assert_eq!(tile, 1);
            assert_eq!(column, 1);
        }
        other => panic!("expected NotPositiveDefinite, got {other:?}"),
    }
}

#[test]
fn test_failure_stops_scheduling_later_steps() {
    let n = 12;
    let ts = 4;
    let mut a = verify::generate_spd::<f64>(n, 23);
    a[0] = -1.0; // first pivot fails immediately
    let mut grid = TileGrid::from_dense(&a, n, ts).unwrap();
    let before: Vec<f64> = grid.tile(2, 2).to_vec();

    let err = factorize(&mut grid, Parallelism::Rayon(4)).unwrap_err();
    assert_eq!(err, Error::NotPositiveDefinite { tile: 0, column: 0 });

    // The factorize node was the only root; nothing downstream ran, so the
    // trailing diagonal tile is exactly as loaded.
    assert_eq!(grid.tile(2, 2), &before[..]);
}

#[test]
fn test_nan_input_reports_kernel_failure() {
    let n = 8;
    let mut a = verify::generate_spd::<f64>(n, 29);
    a[0] = f64::NAN;
    let mut grid = TileGrid::from_dense(&a, n, 4).unwrap();
    let err = factorize(&mut grid, Parallelism::None).unwrap_err();
    assert!(matches!(err, Error::KernelFailure { .. }));
}

#[test]
fn test_first_error_wins_under_parallelism() {
    // Two indefinite diagonal tiles; whichever factorize observes its bad
    // pivot first is surfaced, and it is always a NotPositiveDefinite.
    let n = 16;
    let mut a = verify::generate_spd::<f64>(n, 31);
    a[0] = -1.0;
    a[9 * n + 9] = -1.0;
    let mut grid = TileGrid::from_dense(&a, n, 4).unwrap();
    let err = factorize(&mut grid, Parallelism::Rayon(4)).unwrap_err();
    assert!(matches!(err, Error::NotPositiveDefinite { .. }));
}
