//! # cholr
//!
//! **Task-parallel tiled Cholesky factorization.**
//!
//! cholr factorizes a symmetric positive-definite matrix A into L·Lᵗ by
//! splitting it into a grid of square tiles and scheduling the four tile
//! kernels of the blocked algorithm (factorize, triangular solve,
//! symmetric update, general update) across a worker pool, running every
//! tile operation as soon as its data dependencies are met.
//!
//! ## Why cholr?
//!
//! - **Explicit dependency graph**: the tile-operation DAG is a first-class
//!   object, not a side effect of a pragma-based runtime
//! - **Deterministic numerics**: fixed accumulation order makes the result
//!   bit-for-bit identical for 1 worker or N
//! - **Single arena**: all tiles live in one packed lower-triangular
//!   allocation addressed by (row, col)
//! - **Portable kernels**: plain-loop reference kernels behind function
//!   seams an accelerated backend could replace
//!
//! ## Quick Start
//!
//! ```rust
//! use cholr::prelude::*;
//!
//! let n = 256;
//! let ts = 32;
//! let a = cholr::verify::generate_spd::<f64>(n, 1);
//!
//! let mut grid = TileGrid::from_dense(&a, n, ts)?;
//! factorize(&mut grid, Parallelism::default())?;
//!
//! let mut l = a.clone();
//! grid.to_dense(&mut l)?;
//! assert!(cholr::verify::check_factorization(&a, &l, n));
//! # Ok::<(), cholr::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded scheduling; without it only
//!   [`Parallelism::None`] is available
//! - `cli` (default): the `cholr` driver binary

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod element;
pub mod error;
pub mod graph;
pub mod kernels;
pub mod scheduler;
pub mod tile;
pub mod verify;

pub use element::Element;
pub use error::{Error, Result};
pub use scheduler::{factorize, parallelism_degree, Parallelism};
pub use tile::TileGrid;

/// Commonly used items
pub mod prelude {
    pub use crate::element::Element;
    pub use crate::error::{Error, Result};
    pub use crate::scheduler::{factorize, Parallelism};
    pub use crate::tile::TileGrid;
}
